//! Material configuration shared by both renderers.

use serde::{Deserialize, Serialize};

/// Phong reflection coefficients applied scene-wide.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhongValues {
    /// Ambient coefficient (kA)
    pub ambient: f32,
    /// Diffuse coefficient (kD)
    pub diffuse: f32,
    /// Specular coefficient (kS)
    pub specular: f32,
    /// Specular exponent
    pub shininess: f32,
}

impl Default for PhongValues {
    fn default() -> Self {
        Self {
            ambient: 0.8,
            diffuse: 0.5,
            specular: 0.5,
            shininess: 10.0,
        }
    }
}

impl PhongValues {
    pub fn new(ambient: f32, diffuse: f32, specular: f32, shininess: f32) -> Self {
        Self {
            ambient,
            diffuse,
            specular,
            shininess,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phong_defaults() {
        let phong = PhongValues::default();
        assert_eq!(phong.ambient, 0.8);
        assert_eq!(phong.diffuse, 0.5);
        assert_eq!(phong.specular, 0.5);
        assert_eq!(phong.shininess, 10.0);
    }

    #[test]
    fn test_phong_partial_json_uses_defaults() {
        let phong: PhongValues = serde_json::from_str(r#"{ "shininess": 32.0 }"#).unwrap();
        assert_eq!(phong.shininess, 32.0);
        assert_eq!(phong.ambient, 0.8);
    }

    #[test]
    fn test_phong_rejects_unknown_keys() {
        let result: Result<PhongValues, _> = serde_json::from_str(r#"{ "gloss": 1.0 }"#);
        assert!(result.is_err());
    }
}
