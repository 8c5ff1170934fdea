use crate::AssetError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cube-map face, in GPU array-layer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CubeFace {
    Px,
    Nx,
    Py,
    Ny,
    Pz,
    Nz,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::Px,
        CubeFace::Nx,
        CubeFace::Py,
        CubeFace::Ny,
        CubeFace::Pz,
        CubeFace::Nz,
    ];

    pub fn layer(self) -> usize {
        self as usize
    }

    pub fn stem(self) -> &'static str {
        match self {
            CubeFace::Px => "px",
            CubeFace::Nx => "nx",
            CubeFace::Py => "py",
            CubeFace::Ny => "ny",
            CubeFace::Pz => "pz",
            CubeFace::Nz => "nz",
        }
    }
}

impl fmt::Display for CubeFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stem())
    }
}

/// Decoded RGBA8 pixels of one face.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl FaceImage {
    /// Decode a PNG or JPEG into RGBA8.
    pub fn decode(bytes: &[u8]) -> Result<Self, AssetError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            width,
            height,
            rgba: rgba.into_raw(),
        })
    }

    pub fn solid(size: u32, pixel: [u8; 4]) -> Self {
        Self {
            width: size,
            height: size,
            rgba: pixel.repeat((size * size) as usize),
        }
    }
}

/// Six square faces of equal size.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeMap {
    size: u32,
    faces: [FaceImage; 6],
}

impl CubeMap {
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn face(&self, face: CubeFace) -> &FaceImage {
        &self.faces[face.layer()]
    }

    /// Faces in layer order.
    pub fn faces(&self) -> &[FaceImage; 6] {
        &self.faces
    }
}

/// Collects faces as they arrive, in any order.
#[derive(Debug, Default)]
pub struct CubeMapBuilder {
    faces: [Option<FaceImage>; 6],
}

impl CubeMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a face. A face arriving twice replaces the earlier image.
    pub fn insert(&mut self, face: CubeFace, image: FaceImage) -> Result<(), AssetError> {
        if image.width != image.height {
            return Err(AssetError::CubeFaceNotSquare {
                face,
                width: image.width,
                height: image.height,
            });
        }
        let expected = self
            .faces
            .iter()
            .enumerate()
            .filter(|(layer, _)| *layer != face.layer())
            .find_map(|(_, f)| f.as_ref().map(|f| f.width));
        if let Some(expected) = expected {
            if expected != image.width {
                return Err(AssetError::CubeFaceSizeMismatch {
                    face,
                    expected,
                    actual: image.width,
                });
            }
        }
        self.faces[face.layer()] = Some(image);
        Ok(())
    }

    pub fn missing(&self) -> Vec<CubeFace> {
        CubeFace::ALL
            .into_iter()
            .filter(|face| self.faces[face.layer()].is_none())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.faces.iter().all(Option::is_some)
    }

    pub fn build(self) -> Result<CubeMap, AssetError> {
        let missing = self.missing();
        match self.faces {
            [Some(px), Some(nx), Some(py), Some(ny), Some(pz), Some(nz)] => Ok(CubeMap {
                size: px.width,
                faces: [px, nx, py, ny, pz, nz],
            }),
            _ => Err(AssetError::MissingCubeFaces(missing)),
        }
    }
}
