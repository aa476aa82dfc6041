//! ASCII PLY support (vertex positions and optional byte colours)

use crate::error::FormatError;
use crate::list::write_record;
use eagleeye_core::{channel_from_f64, CloudPoint, PointSet, DEFAULT_POINT_COLOR};
use ply_rs::{
    parser::Parser,
    ply::{DefaultElement, ElementDef, Encoding, Header, PropertyType, ScalarType},
};

const VERTEX_ELEMENT: &str = "vertex";

/// Column positions of the properties the viewer reads from a vertex record.
#[derive(Debug, Clone, PartialEq)]
struct VertexLayout {
    position: [usize; 3],
    color: Option<ColorColumns>,
    width: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct ColorColumns {
    index: [usize; 3],
    /// Float-typed colour channels are stored in `[0, 1]`
    normalized: bool,
}

impl VertexLayout {
    fn from_element(element: &ElementDef) -> Result<Self, FormatError> {
        let mut position = [None; 3];
        let mut color = [None; 3];
        let mut normalized = false;

        for (i, prop) in element.properties.values().enumerate() {
            let scalar = match &prop.data_type {
                PropertyType::Scalar(s) => s,
                PropertyType::List(_, _) => {
                    return Err(FormatError::ListProperty {
                        property: prop.name.clone(),
                    })
                }
            };
            match prop.name.as_str() {
                "x" => position[0] = Some(i),
                "y" => position[1] = Some(i),
                "z" => position[2] = Some(i),
                "red" | "r" | "diffuse_red" => color[0] = Some(i),
                "green" | "g" | "diffuse_green" => color[1] = Some(i),
                "blue" | "b" | "diffuse_blue" => color[2] = Some(i),
                _ => continue,
            }
            if matches!(prop.name.as_str(), "red" | "r" | "diffuse_red") {
                normalized = matches!(scalar, ScalarType::Float | ScalarType::Double);
            }
        }

        let mut pos = [0usize; 3];
        for (axis, name) in ["x", "y", "z"].iter().enumerate() {
            pos[axis] = position[axis].ok_or_else(|| FormatError::MissingPositionProperty {
                property: name.to_string(),
            })?;
        }

        let color = match color {
            [Some(r), Some(g), Some(b)] => Some(ColorColumns {
                index: [r, g, b],
                normalized,
            }),
            _ => None,
        };

        Ok(Self {
            position: pos,
            color,
            width: element.properties.len(),
        })
    }

    /// Decode one record. `None` when the position columns are missing or
    /// not finite.
    fn read(&self, tokens: &[&str]) -> Option<CloudPoint> {
        let coord = |i: usize| {
            tokens
                .get(i)
                .and_then(|t| t.parse::<f64>().ok())
                .filter(|v| v.is_finite())
        };
        let x = coord(self.position[0])?;
        let y = coord(self.position[1])?;
        let z = coord(self.position[2])?;

        let color = self
            .color
            .as_ref()
            .and_then(|c| {
                let scale = if c.normalized { 255.0 } else { 1.0 };
                let channel = |i: usize| {
                    tokens
                        .get(i)
                        .and_then(|t| t.parse::<f64>().ok())
                        .and_then(|v| channel_from_f64(v * scale))
                };
                Some([channel(c.index[0])?, channel(c.index[1])?, channel(c.index[2])?])
            })
            .unwrap_or(DEFAULT_POINT_COLOR);

        Some(CloudPoint::with_color(x, y, z, color))
    }
}

fn read_header(reader: &mut &[u8]) -> Result<Header, FormatError> {
    let parser = Parser::<DefaultElement>::new();
    parser
        .read_header(reader)
        .map_err(|e| FormatError::InvalidHeader {
            message: e.to_string(),
        })
}

/// Parse an ASCII PLY document into a point set.
///
/// Exactly the declared number of vertex records is read. A record whose
/// position fields do not parse is skipped (it still consumes its slot);
/// running out of records before the declared count is an error. Elements
/// declared ahead of `vertex` are skipped one line per record, and anything
/// after the vertex records is ignored.
pub fn parse_mesh(bytes: &[u8]) -> Result<PointSet, FormatError> {
    let mut reader = bytes;
    let header = read_header(&mut reader)?;

    match header.encoding {
        Encoding::Ascii => {}
        Encoding::BinaryBigEndian => {
            return Err(FormatError::BinaryEncoding {
                encoding: "binary_big_endian".to_string(),
            })
        }
        Encoding::BinaryLittleEndian => {
            return Err(FormatError::BinaryEncoding {
                encoding: "binary_little_endian".to_string(),
            })
        }
    }

    let mut preceding = Vec::new();
    let mut vertex = None;
    for element in header.elements.values() {
        if element.name == VERTEX_ELEMENT {
            vertex = Some(element);
            break;
        }
        preceding.push(element);
    }
    let vertex = vertex.ok_or(FormatError::MissingVertexElement)?;
    let layout = VertexLayout::from_element(vertex)?;

    let body = String::from_utf8_lossy(reader);
    let mut records = body.lines().map(str::trim).filter(|l| !l.is_empty());

    for element in preceding {
        for found in 0..element.count {
            if records.next().is_none() {
                return Err(FormatError::TruncatedBody {
                    element: element.name.clone(),
                    expected: element.count,
                    found,
                });
            }
        }
    }

    // The declared count is untrusted; a record needs at least "x y z\n"
    let mut points = Vec::with_capacity(vertex.count.min(body.len() / 6));
    let mut skipped = 0usize;
    for found in 0..vertex.count {
        let line = records.next().ok_or_else(|| FormatError::TruncatedBody {
            element: VERTEX_ELEMENT.to_string(),
            expected: vertex.count,
            found,
        })?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < layout.width {
            log::debug!(
                "PLY vertex {} has {} fields, header declares {}",
                found,
                tokens.len(),
                layout.width
            );
        }
        match layout.read(&tokens) {
            Some(p) => points.push(p),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {} malformed PLY vertex records", skipped);
    }
    Ok(PointSet::from_points(points))
}

/// The fixed ASCII header written for `count` vertices.
pub fn mesh_header(count: usize) -> String {
    format!(
        "ply\n\
         format ascii 1.0\n\
         element vertex {}\n\
         property float x\n\
         property float y\n\
         property float z\n\
         property uchar red\n\
         property uchar green\n\
         property uchar blue\n\
         end_header\n",
        count
    )
}

/// Serialise points as an ASCII PLY document: the fixed header followed by
/// one `x y z r g b` line per point, joined by `\n`.
pub fn serialize_mesh(points: &PointSet) -> Vec<u8> {
    let mut out = mesh_header(points.len());
    out.reserve(points.len() * 32);
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        write_record(&mut out, p);
    }
    out.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = "ply\n\
        format ascii 1.0\n\
        comment written by hand\n\
        element vertex 3\n\
        property float x\n\
        property float y\n\
        property float z\n\
        property uchar red\n\
        property uchar green\n\
        property uchar blue\n\
        end_header\n\
        0 0 0 255 0 0\n\
        1.5 2 -3 0 255 0\n\
        4 5 6 0 0 255\n";

    #[test]
    fn test_parse_simple() {
        let set = parse_mesh(SIMPLE.as_bytes()).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set[1], CloudPoint::with_color(1.5, 2.0, -3.0, [0, 255, 0]));
        assert_eq!(set[2].color, [0, 0, 255]);
    }

    #[test]
    fn test_parse_positions_only_defaults_white() {
        let text = "ply\nformat ascii 1.0\nelement vertex 2\nproperty double x\nproperty double y\nproperty double z\nend_header\n1 2 3\n4 5 6\n";
        let set = parse_mesh(text.as_bytes()).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.iter().all(|p| p.color == DEFAULT_POINT_COLOR));
    }

    #[test]
    fn test_parse_colour_by_name_and_float_channels() {
        let text = "ply\nformat ascii 1.0\nelement vertex 1\nproperty float red\nproperty float green\nproperty float blue\nproperty float nx\nproperty float x\nproperty float y\nproperty float z\nend_header\n1 0.5 0 0 7 8 9\n";
        let set = parse_mesh(text.as_bytes()).unwrap();
        assert_eq!(set[0], CloudPoint::with_color(7.0, 8.0, 9.0, [255, 128, 0]));
    }

    #[test]
    fn test_parse_skips_preceding_elements_and_ignores_faces() {
        let text = "ply\nformat ascii 1.0\nelement camera 1\nproperty float fov\nelement vertex 2\nproperty float x\nproperty float y\nproperty float z\nelement face 1\nproperty list uchar int vertex_indices\nend_header\n60\n1 1 1\n2 2 2\n3 0 1 1\n";
        let set = parse_mesh(text.as_bytes()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set[1].x(), 2.0);
    }

    #[test]
    fn test_malformed_record_is_skipped() {
        let text = "ply\nformat ascii 1.0\nelement vertex 3\nproperty float x\nproperty float y\nproperty float z\nend_header\n1 1 1\nnan 0 0\n3 3 3\n";
        let set = parse_mesh(text.as_bytes()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set[1].x(), 3.0);
    }

    #[test]
    fn test_truncated_body_is_error() {
        let text = "ply\nformat ascii 1.0\nelement vertex 5\nproperty float x\nproperty float y\nproperty float z\nend_header\n1 1 1\n";
        assert_eq!(
            parse_mesh(text.as_bytes()),
            Err(FormatError::TruncatedBody {
                element: "vertex".to_string(),
                expected: 5,
                found: 1
            })
        );
    }

    #[test]
    fn test_header_errors() {
        assert!(matches!(
            parse_mesh(b"not a ply file\n"),
            Err(FormatError::InvalidHeader { .. })
        ));

        let no_vertex = "ply\nformat ascii 1.0\nelement face 0\nproperty list uchar int vertex_indices\nend_header\n";
        assert_eq!(
            parse_mesh(no_vertex.as_bytes()),
            Err(FormatError::MissingVertexElement)
        );

        let no_z = "ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\nproperty float y\nend_header\n1 2\n";
        assert_eq!(
            parse_mesh(no_z.as_bytes()),
            Err(FormatError::MissingPositionProperty {
                property: "z".to_string()
            })
        );

        let binary = "ply\nformat binary_little_endian 1.0\nelement vertex 1\nproperty float x\nproperty float y\nproperty float z\nend_header\n";
        assert!(matches!(
            parse_mesh(binary.as_bytes()),
            Err(FormatError::BinaryEncoding { .. })
        ));
    }

    #[test]
    fn test_serialize_header_is_fixed() {
        let set = PointSet::from_points(vec![CloudPoint::with_color(1.0, 2.0, 3.0, [4, 5, 6])]);
        let text = String::from_utf8(serialize_mesh(&set)).unwrap();
        assert_eq!(
            text,
            "ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\nproperty float y\nproperty float z\nproperty uchar red\nproperty uchar green\nproperty uchar blue\nend_header\n1 2 3 4 5 6"
        );
    }

    #[test]
    fn test_round_trip() {
        let set = PointSet::from_points(vec![
            CloudPoint::with_color(0.25, -1.0 / 7.0, 42.0, [9, 99, 199]),
            CloudPoint::new(-5.5, 0.0, 1e-3),
        ]);
        let back = parse_mesh(&serialize_mesh(&set)).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn test_oversized_vertex_count_is_truncation() {
        for count in ["4294967295", "18446744073709551615"] {
            let text = format!(
                "ply\nformat ascii 1.0\nelement vertex {}\nproperty float x\nproperty float y\nproperty float z\nend_header\n1 2 3\n",
                count
            );
            match parse_mesh(text.as_bytes()) {
                Err(FormatError::TruncatedBody { element, found, .. }) => {
                    assert_eq!(element, "vertex");
                    assert_eq!(found, 1);
                }
                other => panic!("expected truncated body for count {}, got {:?}", count, other),
            }
        }
    }

    #[test]
    fn test_header_without_format_line_is_rejected() {
        let text = "ply\nelement vertex 1\nproperty float x\nproperty float y\nproperty float z\nend_header\n1 2 3\n";
        assert!(matches!(
            parse_mesh(text.as_bytes()),
            Err(FormatError::InvalidHeader { .. })
        ));
    }
}
