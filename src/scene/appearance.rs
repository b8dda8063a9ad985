use crate::media::TextureId;

/// Opacity of the hover hologram.
pub const HOLOGRAM_OPACITY: f32 = 0.5;

/// Surface appearance of a scene object. Swapped wholesale, never patched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Appearance {
    /// Opaque, lit by the scene lights.
    Standard {
        color: [f32; 3],
        metalness: f32,
        roughness: f32,
    },
    /// Translucent, unlit highlight.
    Hologram { color: [f32; 3], opacity: f32 },
    /// Opaque, unlit, sampled from a texture in the texture store.
    Textured { texture: TextureId },
}

impl Appearance {
    /// The appearance every mesh is reset to when a highlight is removed.
    pub fn default_standard() -> Self {
        Self::Standard {
            color: rgb_from_hex(0x0000ff),
            metalness: 1.0,
            roughness: 0.0,
        }
    }

    pub fn hologram(color: [f32; 3]) -> Self {
        Self::Hologram {
            color,
            opacity: HOLOGRAM_OPACITY,
        }
    }

    pub fn textured(texture: TextureId) -> Self {
        Self::Textured { texture }
    }

    pub fn texture(&self) -> Option<TextureId> {
        match self {
            Self::Textured { texture } => Some(*texture),
            _ => None,
        }
    }
}

pub fn rgb_from_hex(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xFF) as f32 / 255.0,
        ((hex >> 8) & 0xFF) as f32 / 255.0,
        (hex & 0xFF) as f32 / 255.0,
    ]
}

#[cfg(test)]
mod tests {
    use super::{rgb_from_hex, Appearance, HOLOGRAM_OPACITY};

    #[test]
    fn default_is_metallic_blue() {
        let appearance = Appearance::default_standard();
        assert_eq!(
            appearance,
            Appearance::Standard {
                color: [0.0, 0.0, 1.0],
                metalness: 1.0,
                roughness: 0.0,
            }
        );
        assert!(!matches!(appearance, Appearance::Hologram { .. }));
        assert!(appearance.texture().is_none());
    }

    #[test]
    fn hologram_is_translucent() {
        let appearance = Appearance::hologram(rgb_from_hex(0xff0000));
        assert!(matches!(appearance, Appearance::Hologram { .. }));
        match appearance {
            Appearance::Hologram { color, opacity } => {
                assert_eq!(color, [1.0, 0.0, 0.0]);
                assert_eq!(opacity, HOLOGRAM_OPACITY);
            }
            _ => panic!("Expected Hologram"),
        }
    }
}
