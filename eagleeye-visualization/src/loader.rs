//! Point cloud acquisition and export
//!
//! [`DataLoader`] owns the current point set and the viewer parameters. Loads
//! are fetched and parsed on a tokio runtime; results come back over a channel
//! and are applied by [`DataLoader::poll`] on the thread that owns the scene,
//! once per frame. Each request carries a generation number so a slow earlier
//! request can never overwrite a later one.

use eagleeye_core::{CloudPoint, Error, PointSet, Result, ViewerParameters};
use eagleeye_io::Format;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Where the loaded cloud currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Empty,
    Loading,
    Ready,
    Failed,
}

/// Something a point cloud can be loaded from
#[derive(Debug, Clone, PartialEq)]
pub enum LoadSource {
    File(PathBuf),
    Url(String),
    /// Raw file contents; `name` selects the codec by suffix
    Bytes { name: String, bytes: Vec<u8> },
    /// Points handed over directly, without parsing
    Points(Vec<CloudPoint>),
}

impl LoadSource {
    /// Treat `location` as a URL when it has an http(s) scheme, otherwise as a path.
    pub fn from_location(location: &str) -> Self {
        let lower = location.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            LoadSource::Url(location.to_string())
        } else {
            LoadSource::File(PathBuf::from(location))
        }
    }

    /// Display name, also used for suffix dispatch
    pub fn name(&self) -> String {
        match self {
            LoadSource::File(path) => path.display().to_string(),
            LoadSource::Url(url) => url.clone(),
            LoadSource::Bytes { name, .. } => name.clone(),
            LoadSource::Points(points) => format!("<{} points>", points.len()),
        }
    }
}

impl fmt::Display for LoadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Fetch and decode a source.
pub async fn resolve(source: LoadSource, client: &reqwest::Client) -> Result<PointSet> {
    match source {
        LoadSource::File(path) => {
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| Error::Load(format!("Failed to read {}: {}", path.display(), e)))?;
            Format::from_path(&path).parse(&bytes)
        }
        LoadSource::Url(url) => {
            let bytes = fetch(client, &url).await?;
            Format::from_name(&url).parse(&bytes)
        }
        LoadSource::Bytes { name, bytes } => Format::from_name(&name).parse(&bytes),
        LoadSource::Points(points) => Ok(PointSet::from_points(points)),
    }
}

async fn fetch(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::Load(format!("Failed to fetch {}: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Load(format!("Failed to fetch {}: HTTP {}", url, status)));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| Error::Load(format!("Failed to read body of {}: {}", url, e)))?;
    Ok(body.to_vec())
}

/// Target format of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExportFormat {
    #[default]
    Txt,
    Ply,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        self.codec().extension()
    }

    fn codec(&self) -> Format {
        match self {
            ExportFormat::Txt => Format::List,
            ExportFormat::Ply => Format::Mesh,
        }
    }
}

impl From<&str> for ExportFormat {
    /// Unrecognised names export as TXT.
    fn from(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("ply") {
            ExportFormat::Ply
        } else {
            ExportFormat::Txt
        }
    }
}

/// A serialised point cloud ready to be written out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// Write into `dir` under the artifact's own file name.
    pub fn save_in<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let path = dir.as_ref().join(&self.file_name);
        self.save_as(&path)?;
        Ok(path)
    }

    pub fn save_as<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path.as_ref(), &self.bytes)?;
        log::info!("Exported {} bytes to {}", self.bytes.len(), path.as_ref().display());
        Ok(())
    }
}

/// JSON returned by the stereo reconstruction backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub depth_url: String,
    pub cloud_url: String,
}

impl UploadResponse {
    pub fn cloud_source(&self, backend: &str) -> LoadSource {
        LoadSource::Url(join_url(backend, &self.cloud_url))
    }

    pub fn depth_url_for(&self, backend: &str) -> String {
        join_url(backend, &self.depth_url)
    }
}

fn join_url(base: &str, path: &str) -> String {
    let lower = path.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

type LoadResult = (u64, Result<PointSet>);

/// Load state machine plus the user-adjustable viewer parameters.
pub struct DataLoader {
    runtime: Handle,
    client: reqwest::Client,
    sender: UnboundedSender<LoadResult>,
    receiver: UnboundedReceiver<LoadResult>,
    generation: u64,
    state: LoadState,
    points: PointSet,
    point_count: Option<usize>,
    error: Option<String>,
    params: ViewerParameters,
}

impl DataLoader {
    /// Create a loader that runs fetches on `runtime`.
    pub fn new(runtime: Handle, params: ViewerParameters) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            runtime,
            client: reqwest::Client::new(),
            sender,
            receiver,
            generation: 0,
            state: LoadState::Empty,
            points: PointSet::new(),
            point_count: None,
            error: None,
            params,
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    /// The current point set; empty unless the last load succeeded
    pub fn points(&self) -> &PointSet {
        &self.points
    }

    /// Number of points from the last successful load
    pub fn point_count(&self) -> Option<usize> {
        self.point_count
    }

    /// User-facing message from the last failed load
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn params(&self) -> &ViewerParameters {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut ViewerParameters {
        &mut self.params
    }

    /// Generation of the most recent request
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn begin(&mut self, source: &LoadSource) -> u64 {
        self.generation += 1;
        self.state = LoadState::Loading;
        self.error = None;
        self.point_count = None;
        log::info!("Loading {}", source);
        self.generation
    }

    /// Start loading in the background. The previous cloud stays visible
    /// until [`poll`](Self::poll) applies the result.
    pub fn request(&mut self, source: LoadSource) -> u64 {
        let generation = self.begin(&source);
        let client = self.client.clone();
        self.spawn_load(generation, async move { resolve(source, &client).await });
        generation
    }

    /// Run `load` on the runtime and report its outcome for `generation`.
    /// A load that panics is reported as a parse failure.
    fn spawn_load<F>(&self, generation: u64, load: F)
    where
        F: Future<Output = Result<PointSet>> + Send + 'static,
    {
        let sender = self.sender.clone();
        let runtime = self.runtime.clone();
        self.runtime.spawn(async move {
            let result = match runtime.spawn(load).await {
                Ok(result) => result,
                Err(e) => Err(Error::Parse(format!("Loader task failed: {}", e))),
            };
            // The receiver only disappears with the loader itself
            let _ = sender.send((generation, result));
        });
    }

    /// Apply finished loads. Returns true when the state changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok((generation, result)) = self.receiver.try_recv() {
            changed |= self.apply(generation, result);
        }
        changed
    }

    /// Wait for the most recent request to finish and apply it.
    pub async fn settle(&mut self) -> LoadState {
        while self.state == LoadState::Loading {
            match self.receiver.recv().await {
                Some((generation, result)) => {
                    self.apply(generation, result);
                }
                None => break,
            }
        }
        self.state
    }

    /// Load on the current task, bypassing the background channel.
    pub async fn load(&mut self, source: LoadSource) -> LoadState {
        let generation = self.begin(&source);
        let result = resolve(source, &self.client).await;
        self.apply(generation, result);
        self.state
    }

    fn apply(&mut self, generation: u64, result: Result<PointSet>) -> bool {
        if generation != self.generation {
            log::warn!(
                "Dropping stale load result {} (current request is {})",
                generation,
                self.generation
            );
            return false;
        }

        match result {
            Ok(points) => {
                log::info!("Loaded {} points", points.len());
                self.point_count = Some(points.len());
                self.points = points;
                self.state = LoadState::Ready;
            }
            Err(e) => {
                log::error!("Load failed: {}", e);
                self.points = PointSet::new();
                self.point_count = None;
                self.error = Some(e.to_string());
                self.state = LoadState::Failed;
            }
        }
        true
    }

    /// Serialise the current points. Nothing is produced for an empty cloud.
    pub fn export(&self, format: ExportFormat, base_name: &str) -> Option<ExportArtifact> {
        if self.points.is_empty() {
            log::warn!("Nothing to export");
            return None;
        }
        let artifact = ExportArtifact {
            file_name: format!("{}.{}", base_name, format.extension()),
            bytes: format.codec().serialize(&self.points),
        };
        log::info!("Prepared {} with {} points", artifact.file_name, self.points.len());
        Some(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader() -> DataLoader {
        DataLoader::new(Handle::current(), ViewerParameters::default())
    }

    fn bytes(name: &str, text: &str) -> LoadSource {
        LoadSource::Bytes {
            name: name.to_string(),
            bytes: text.as_bytes().to_vec(),
        }
    }

    #[tokio::test]
    async fn test_initial_state() {
        let loader = loader();
        assert_eq!(loader.state(), LoadState::Empty);
        assert!(loader.points().is_empty());
        assert_eq!(loader.point_count(), None);
        assert_eq!(loader.error(), None);
    }

    #[tokio::test]
    async fn test_list_bytes_load() {
        let mut loader = loader();
        let state = loader.load(bytes("cloud.txt", "1 2 3\n4 5 6 10 20 30\nbad line\n")).await;
        assert_eq!(state, LoadState::Ready);
        assert_eq!(loader.point_count(), Some(2));
        assert_eq!(loader.points()[1].color, [10, 20, 30]);
    }

    #[tokio::test]
    async fn test_suffix_dispatch_to_ply() {
        let mut loader = loader();
        let ply = "ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\nproperty float y\nproperty float z\nend_header\n1 2 3\n";
        assert_eq!(loader.load(bytes("scan.PLY", ply)).await, LoadState::Ready);
        assert_eq!(loader.point_count(), Some(1));

        // The same text without a .ply suffix is read as a coordinate list
        assert_eq!(loader.load(bytes("scan.txt", ply)).await, LoadState::Ready);
        assert_eq!(loader.point_count(), Some(1));
    }

    #[tokio::test]
    async fn test_parse_failure_clears_points() {
        let mut loader = loader();
        loader.load(LoadSource::Points(vec![CloudPoint::new(0.0, 0.0, 0.0)])).await;
        assert_eq!(loader.points().len(), 1);

        let state = loader.load(bytes("broken.ply", "not a ply file")).await;
        assert_eq!(state, LoadState::Failed);
        assert!(loader.points().is_empty());
        assert!(loader.error().is_some_and(|m| m.starts_with("Parse error")));
    }

    #[tokio::test]
    async fn test_missing_file_is_load_error() {
        let mut loader = loader();
        let state = loader
            .load(LoadSource::File(PathBuf::from("/definitely/not/here.txt")))
            .await;
        assert_eq!(state, LoadState::Failed);
        assert!(loader.error().is_some_and(|m| m.starts_with("Load error")));
    }

    #[tokio::test]
    async fn test_new_request_clears_previous_error() {
        let mut loader = loader();
        loader.load(LoadSource::File(PathBuf::from("/definitely/not/here.txt"))).await;
        assert!(loader.error().is_some());

        loader.request(LoadSource::Points(vec![CloudPoint::new(1.0, 1.0, 1.0)]));
        assert_eq!(loader.state(), LoadState::Loading);
        assert_eq!(loader.error(), None);
        assert_eq!(loader.settle().await, LoadState::Ready);
    }

    #[tokio::test]
    async fn test_stale_results_are_dropped() {
        let mut loader = loader();
        let first = loader.request(LoadSource::Points(vec![CloudPoint::new(1.0, 0.0, 0.0)]));
        let second = loader.request(LoadSource::Points(vec![
            CloudPoint::new(1.0, 0.0, 0.0),
            CloudPoint::new(2.0, 0.0, 0.0),
        ]));
        assert!(second > first);

        loader.settle().await;
        assert_eq!(loader.point_count(), Some(2));

        // A late result for the first request changes nothing
        assert!(!loader.apply(first, Ok(PointSet::new())));
        assert_eq!(loader.point_count(), Some(2));
    }

    #[tokio::test]
    async fn test_panicking_load_fails_instead_of_hanging() {
        let mut loader = loader();
        loader.load(LoadSource::Points(vec![CloudPoint::new(0.0, 0.0, 0.0)])).await;

        let generation = loader.begin(&LoadSource::Url("http://host/evil.ply".to_string()));
        loader.spawn_load(generation, async { panic!("decoder blew up") });

        let state = tokio::time::timeout(std::time::Duration::from_secs(5), loader.settle())
            .await
            .expect("load never settled");
        assert_eq!(state, LoadState::Failed);
        assert!(loader.points().is_empty());
        assert!(loader.error().is_some_and(|m| m.starts_with("Parse error")));
    }

    #[tokio::test]
    async fn test_oversized_ply_request_fails() {
        let mut loader = loader();
        let header = "ply\nformat ascii 1.0\nelement vertex 18446744073709551615\nproperty float x\nproperty float y\nproperty float z\nend_header\n1 2 3\n";
        loader.request(bytes("evil.ply", header));
        assert_eq!(loader.settle().await, LoadState::Failed);
        assert!(loader.error().is_some_and(|m| m.contains("PLY body ended")));
    }

    #[tokio::test]
    async fn test_export() {
        let mut loader = loader();
        assert_eq!(loader.export(ExportFormat::Txt, "pointcloud"), None);

        loader
            .load(LoadSource::Points(vec![CloudPoint::with_color(1.0, 2.0, 3.0, [4, 5, 6])]))
            .await;
        let txt = loader.export(ExportFormat::Txt, "pointcloud").unwrap();
        assert_eq!(txt.file_name, "pointcloud.txt");
        assert_eq!(txt.bytes, b"1 2 3 4 5 6");

        let ply = loader.export(ExportFormat::from("PLY"), "pointcloud").unwrap();
        assert_eq!(ply.file_name, "pointcloud.ply");
        assert!(ply.bytes.starts_with(b"ply\n"));
    }

    #[test]
    fn test_export_format_fallback() {
        assert_eq!(ExportFormat::from("ply"), ExportFormat::Ply);
        assert_eq!(ExportFormat::from("txt"), ExportFormat::Txt);
        assert_eq!(ExportFormat::from("obj"), ExportFormat::Txt);
    }

    #[test]
    fn test_source_from_location() {
        assert_eq!(
            LoadSource::from_location("https://host/cloud.ply"),
            LoadSource::Url("https://host/cloud.ply".to_string())
        );
        assert_eq!(
            LoadSource::from_location("data/cloud.txt"),
            LoadSource::File(PathBuf::from("data/cloud.txt"))
        );
    }

    #[test]
    fn test_upload_response_urls() {
        let response: UploadResponse = serde_json::from_str(
            r#"{"depth_url": "/outputs/vis.png", "cloud_url": "/outputs/cloud.txt"}"#,
        )
        .unwrap();
        assert_eq!(
            response.cloud_source("http://localhost:5000/"),
            LoadSource::Url("http://localhost:5000/outputs/cloud.txt".to_string())
        );
        assert_eq!(
            response.depth_url_for("http://localhost:5000"),
            "http://localhost:5000/outputs/vis.png"
        );

        let absolute = UploadResponse {
            depth_url: "https://cdn/vis.png".to_string(),
            cloud_url: "https://cdn/cloud.ply".to_string(),
        };
        assert_eq!(
            absolute.cloud_source("http://localhost:5000"),
            LoadSource::Url("https://cdn/cloud.ply".to_string())
        );
    }

    #[test]
    fn test_artifact_save_in() {
        let dir = std::env::temp_dir().join(format!("eagleeye-export-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let artifact = ExportArtifact {
            file_name: "pointcloud.txt".to_string(),
            bytes: b"0 0 0 255 255 255".to_vec(),
        };
        let path = artifact.save_in(&dir).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), artifact.bytes);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
