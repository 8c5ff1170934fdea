use crate::request::{AssetKind, LoadedAsset};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Content-addressed asset ID computed from the fetched bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u64);

impl AssetId {
    pub fn of(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        Self(u64::from_le_bytes(prefix))
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// What the registry remembers about a loaded asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
    pub urls: Vec<String>,
    pub kind: AssetKind,
    pub byte_len: usize,
}

/// Registry of loaded assets, indexed by content hash.
///
/// Identical bytes served under different URLs share one entry.
#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    records: BTreeMap<AssetId, AssetRecord>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a loaded asset. Returns `true` if its content was not seen before.
    pub fn record(&mut self, asset: &LoadedAsset) -> bool {
        let kind = match &asset.payload {
            crate::AssetPayload::Model(_) => AssetKind::Model,
            crate::AssetPayload::CubeFace(face, _) => AssetKind::CubeFace(*face),
        };
        match self.records.get_mut(&asset.id) {
            Some(record) => {
                if !record.urls.contains(&asset.url) {
                    record.urls.push(asset.url.clone());
                }
                false
            }
            None => {
                self.records.insert(
                    asset.id,
                    AssetRecord {
                        urls: vec![asset.url.clone()],
                        kind,
                        byte_len: asset.byte_len,
                    },
                );
                true
            }
        }
    }

    pub fn get(&self, id: AssetId) -> Option<&AssetRecord> {
        self.records.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AssetId, &AssetRecord)> {
        self.records.iter()
    }

    /// Number of distinct assets.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.records.values().map(|r| r.byte_len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AssetPayload, CubeFace, FaceImage};

    fn face_asset(url: &str, bytes: &[u8]) -> LoadedAsset {
        LoadedAsset {
            id: AssetId::of(bytes),
            url: url.into(),
            byte_len: bytes.len(),
            payload: AssetPayload::CubeFace(CubeFace::Px, FaceImage::solid(1, [0; 4])),
        }
    }

    #[test]
    fn ids_are_content_addressed() {
        assert_eq!(AssetId::of(b"abc"), AssetId::of(b"abc"));
        assert_ne!(AssetId::of(b"abc"), AssetId::of(b"abd"));
        assert_eq!(format!("{}", AssetId(255)), "00000000000000ff");
    }

    #[test]
    fn identical_content_dedups() {
        let mut store = AssetStore::new();
        assert!(store.record(&face_asset("/a.jpg", b"same")));
        assert!(!store.record(&face_asset("/b.jpg", b"same")));
        assert_eq!(store.len(), 1);
        let record = store.get(AssetId::of(b"same")).unwrap();
        assert_eq!(record.urls, vec!["/a.jpg".to_string(), "/b.jpg".to_string()]);
        assert_eq!(record.kind, AssetKind::CubeFace(CubeFace::Px));
    }

    #[test]
    fn totals_count_distinct_content() {
        let mut store = AssetStore::new();
        store.record(&face_asset("/a.jpg", b"1234"));
        store.record(&face_asset("/b.jpg", b"12"));
        store.record(&face_asset("/c.jpg", b"12"));
        assert_eq!(store.total_bytes(), 6);
        assert!(!store.is_empty());
    }
}
