use crate::cubemap::{CubeFace, FaceImage};
use crate::model::ModelData;
use crate::store::AssetId;
use crate::AssetError;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::thread::JoinHandle;

/// Directory that asset URLs resolve against.
///
/// URLs are written the way a web page would reference them
/// (`/model/model.gltf`); the leading slash means "the root", not the
/// filesystem root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRoot {
    dir: PathBuf,
}

impl AssetRoot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn resolve(&self, url: &str) -> Result<PathBuf, AssetError> {
        let relative = Path::new(url.trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || relative.as_os_str().is_empty() {
            return Err(AssetError::OutsideRoot(url.to_string()));
        }
        Ok(self.dir.join(relative))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Model,
    CubeFace(CubeFace),
}

/// One resource to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    pub url: String,
    pub kind: AssetKind,
}

#[derive(Debug, Clone)]
pub enum AssetPayload {
    Model(ModelData),
    CubeFace(CubeFace, FaceImage),
}

/// A fetched and decoded resource.
#[derive(Debug, Clone)]
pub struct LoadedAsset {
    pub id: AssetId,
    pub url: String,
    pub byte_len: usize,
    pub payload: AssetPayload,
}

impl AssetRequest {
    pub fn model(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: AssetKind::Model,
        }
    }

    pub fn cube_face(face: CubeFace, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: AssetKind::CubeFace(face),
        }
    }

    /// Fetch and decode synchronously.
    pub fn load(&self, root: &AssetRoot) -> Result<LoadedAsset, AssetError> {
        let path = root.resolve(&self.url)?;
        let bytes = std::fs::read(&path).map_err(|source| AssetError::Io {
            path: path.clone(),
            source,
        })?;
        let payload = match self.kind {
            AssetKind::Model => AssetPayload::Model(ModelData::import(&bytes, path.parent())?),
            AssetKind::CubeFace(face) => AssetPayload::CubeFace(face, FaceImage::decode(&bytes)?),
        };
        Ok(LoadedAsset {
            id: AssetId::of(&bytes),
            url: self.url.clone(),
            byte_len: bytes.len(),
            payload,
        })
    }
}

/// Load every request on its own worker thread.
///
/// `on_settled` runs on the worker once per request with the outcome;
/// callers typically forward it to the thread that owns the scene.
pub fn dispatch<F>(
    root: &AssetRoot,
    requests: &[AssetRequest],
    on_settled: F,
) -> Result<Vec<JoinHandle<()>>, AssetError>
where
    F: Fn(AssetRequest, Result<LoadedAsset, AssetError>) + Send + Clone + 'static,
{
    let mut handles = Vec::with_capacity(requests.len());
    for (i, request) in requests.iter().enumerate() {
        let request = request.clone();
        let root = root.clone();
        let on_settled = on_settled.clone();
        let handle = std::thread::Builder::new()
            .name(format!("asset-loader-{i}"))
            .spawn(move || {
                let _span = tracing::debug_span!("load_asset", url = %request.url).entered();
                let result = request.load(&root);
                if let Err(e) = &result {
                    tracing::debug!("load failed: {e}");
                }
                on_settled(request, result);
            })
            .map_err(AssetError::Spawn)?;
        handles.push(handle);
    }
    Ok(handles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::write_triangle_model;
    use std::sync::mpsc;

    fn write_face(dir: &Path, name: &str, size: u32) {
        image::RgbaImage::from_pixel(size, size, image::Rgba([200, 200, 200, 255]))
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn resolve_strips_leading_slash() {
        let root = AssetRoot::new("/srv/static");
        assert_eq!(
            root.resolve("/model/model.gltf").unwrap(),
            PathBuf::from("/srv/static/model/model.gltf")
        );
    }

    #[test]
    fn resolve_rejects_parent_components() {
        let root = AssetRoot::new("static");
        assert!(matches!(
            root.resolve("/../secret.txt"),
            Err(AssetError::OutsideRoot(_))
        ));
        assert!(matches!(root.resolve("/"), Err(AssetError::OutsideRoot(_))));
    }

    #[test]
    fn load_model_request() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("model")).unwrap();
        write_triangle_model(&dir.path().join("model"));
        let root = AssetRoot::new(dir.path());
        let loaded = AssetRequest::model("/model/model.gltf").load(&root).unwrap();
        assert!(loaded.byte_len > 0);
        assert!(matches!(loaded.payload, AssetPayload::Model(ref m) if m.nodes.len() == 4));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let root = AssetRoot::new(dir.path());
        let err = AssetRequest::cube_face(CubeFace::Px, "/px.jpg")
            .load(&root)
            .unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    #[test]
    fn dispatch_settles_every_request() {
        let dir = tempfile::tempdir().unwrap();
        write_face(dir.path(), "px.png", 2);
        write_face(dir.path(), "nx.png", 2);
        let root = AssetRoot::new(dir.path());
        let requests = vec![
            AssetRequest::cube_face(CubeFace::Px, "/px.png"),
            AssetRequest::cube_face(CubeFace::Nx, "/nx.png"),
            AssetRequest::cube_face(CubeFace::Py, "/py.png"),
        ];

        let (tx, rx) = mpsc::channel();
        let handles = dispatch(&root, &requests, move |request, result| {
            tx.send((request.url, result.is_ok())).unwrap();
        })
        .unwrap();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut outcomes: Vec<(String, bool)> = rx.iter().collect();
        outcomes.sort();
        assert_eq!(
            outcomes,
            vec![
                ("/nx.png".to_string(), true),
                ("/px.png".to_string(), true),
                ("/py.png".to_string(), false),
            ]
        );
    }
}
