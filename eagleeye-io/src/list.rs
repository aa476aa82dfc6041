//! Whitespace-separated coordinate lists: `x y z [r g b]`, one point per line

use eagleeye_core::{channel_from_f64, CloudPoint, PointSet, DEFAULT_POINT_COLOR};
use std::fmt::Write;

/// Parse a coordinate list.
///
/// Lines with fewer than three tokens, or whose first three tokens are not
/// finite numbers, are dropped. Colour is read from tokens four to six when a
/// line has at least six tokens; a colour token that is not a number leaves
/// the point white.
pub fn parse_list(text: &str) -> PointSet {
    let mut points = Vec::new();
    let mut dropped = 0usize;

    for line in text.trim().lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        match parse_line(&tokens) {
            Some(point) => points.push(point),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        log::warn!("Skipped {} malformed coordinate lines", dropped);
    }
    PointSet::from_points(points)
}

fn parse_line(tokens: &[&str]) -> Option<CloudPoint> {
    if tokens.len() < 3 {
        return None;
    }

    let x = parse_finite(tokens[0])?;
    let y = parse_finite(tokens[1])?;
    let z = parse_finite(tokens[2])?;

    let color = if tokens.len() >= 6 {
        parse_color(&tokens[3..6]).unwrap_or(DEFAULT_POINT_COLOR)
    } else {
        DEFAULT_POINT_COLOR
    };

    Some(CloudPoint::with_color(x, y, z, color))
}

fn parse_finite(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_color(tokens: &[&str]) -> Option<[u8; 3]> {
    let channel = |t: &str| t.parse::<f64>().ok().and_then(channel_from_f64);
    Some([channel(tokens[0])?, channel(tokens[1])?, channel(tokens[2])?])
}

/// Serialise points as `x y z r g b` lines joined by `\n`, with no trailing
/// newline. Coordinates use the shortest representation that parses back to
/// the same `f64`.
pub fn serialize_list(points: &PointSet) -> String {
    let mut out = String::with_capacity(points.len() * 32);
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        write_record(&mut out, p);
    }
    out
}

/// Append one `x y z r g b` record without a line terminator.
pub(crate) fn write_record(out: &mut String, p: &CloudPoint) {
    // Writing into a String cannot fail
    let _ = write!(
        out,
        "{} {} {} {} {} {}",
        p.x(),
        p.y(),
        p.z(),
        p.color[0],
        p.color[1],
        p.color[2]
    );
}
