use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for one scene instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SceneId(pub Uuid);

impl SceneId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, enough to tell instances apart in logs.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for SceneId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short())
    }
}

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Identity transform with the same scale on every axis.
    pub fn uniform_scale(factor: f32) -> Self {
        Self {
            scale: Vec3::splat(factor),
            ..Self::default()
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorError {
    #[error("color must start with '#': {0:?}")]
    MissingHash(String),
    #[error("color must have 3 or 6 hex digits: {0:?}")]
    BadLength(String),
    #[error("invalid hex digit in color: {0:?}")]
    BadDigit(String),
}

/// An sRGB color with straight alpha, components in `[0, 1]`.
///
/// Serialized as a CSS-style hex string (`"#b4b4b4"`), which is how scene
/// colors are written in config files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parse `#rgb` or `#rrggbb`.
    pub fn from_hex(s: &str) -> Result<Self, ColorError> {
        let digits = s
            .strip_prefix('#')
            .ok_or_else(|| ColorError::MissingHash(s.to_string()))?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorError::BadDigit(s.to_string()));
        }
        let channel = |hex: &str| -> Result<f32, ColorError> {
            u8::from_str_radix(hex, 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|_| ColorError::BadDigit(s.to_string()))
        };
        match digits.len() {
            6 => Ok(Self::rgb(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            3 => {
                let doubled: String = digits.chars().flat_map(|c| [c, c]).collect();
                Self::from_hex(&format!("#{doubled}"))
            }
            _ => Err(ColorError::BadLength(s.to_string())),
        }
    }

    pub fn to_hex(&self) -> String {
        let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", byte(self.r), byte(self.g), byte(self.b))
    }

    /// Components converted to linear light, alpha untouched.
    pub fn to_linear(&self) -> [f32; 4] {
        fn decode(c: f32) -> f32 {
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        [decode(self.r), decode(self.g), decode(self.b), self.a]
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl FromStr for Color {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_id_uniqueness() {
        let a = SceneId::new();
        let b = SceneId::new();
        assert_ne!(a, b);
        assert_eq!(a.short().len(), 8);
    }

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.to_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn uniform_scale_scales_points() {
        let m = Transform::uniform_scale(5.0).to_matrix();
        assert_eq!(m.transform_point3(Vec3::ONE), Vec3::splat(5.0));
    }

    #[test]
    fn parse_long_hex() {
        let c = Color::from_hex("#b4b4b4").unwrap();
        assert!((c.r - 180.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.r, c.g);
        assert_eq!(c.a, 1.0);
        assert_eq!(c.to_hex(), "#b4b4b4");
    }

    #[test]
    fn parse_short_hex() {
        let c: Color = "#fff".parse().unwrap();
        assert_eq!(c, Color::WHITE);
    }

    #[test]
    fn reject_malformed_hex() {
        assert_eq!(
            Color::from_hex("b4b4b4"),
            Err(ColorError::MissingHash("b4b4b4".into()))
        );
        assert!(matches!(Color::from_hex("#b4b4"), Err(ColorError::BadLength(_))));
        assert!(matches!(Color::from_hex("#zzzzzz"), Err(ColorError::BadDigit(_))));
    }

    #[test]
    fn linear_conversion_endpoints() {
        assert_eq!(Color::BLACK.to_linear(), [0.0, 0.0, 0.0, 1.0]);
        let white = Color::WHITE.to_linear();
        assert!((white[0] - 1.0).abs() < 1e-6);
        let grey = Color::from_hex("#b4b4b4").unwrap().to_linear();
        assert!(grey[0] < 180.0 / 255.0);
    }
}
