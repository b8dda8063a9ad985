use crate::scene::rgb_from_hex;
use std::path::{Path, PathBuf};

/// Settings file looked up in the working directory at start-up.
pub const DEFAULT_CONFIG_FILE: &str = "holoscene.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// The two hologram palette choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum HighlightColor {
    #[default]
    Red,
    Blue,
}

impl HighlightColor {
    pub const ALL: [HighlightColor; 2] = [HighlightColor::Red, HighlightColor::Blue];

    pub fn rgb(self) -> [f32; 3] {
        match self {
            HighlightColor::Red => rgb_from_hex(0xff0000),
            HighlightColor::Blue => rgb_from_hex(0x0000ff),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HighlightColor::Red => "Red",
            HighlightColor::Blue => "Blue",
        }
    }
}

/// Intensities of the three scene lights, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LightIntensities {
    pub hemisphere: f32,
    pub directional: f32,
    pub back: f32,
}

impl Default for LightIntensities {
    fn default() -> Self {
        Self {
            hemisphere: 0.5,
            directional: 0.5,
            back: 0.2,
        }
    }
}

impl LightIntensities {
    pub fn clamped(self) -> Self {
        Self {
            hemisphere: self.hemisphere.clamp(0.0, 1.0),
            directional: self.directional.clamp(0.0, 1.0),
            back: self.back.clamp(0.0, 1.0),
        }
    }
}

/// Everything the control panel can change, plus start-up inputs.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub model_path: PathBuf,
    /// Program used to decode dropped video files.
    pub ffmpeg_path: PathBuf,
    pub lights: LightIntensities,
    /// Model rotation offsets in radians (X, Y, Z), each in [-π, π].
    pub rotation: [f32; 3],
    pub animate: bool,
    pub highlight: HighlightColor,
    pub window_size: [u32; 2],
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("level5.glb"),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            lights: LightIntensities::default(),
            rotation: [0.0; 3],
            animate: true,
            highlight: HighlightColor::Red,
            window_size: [1280, 720],
        }
    }
}

impl ViewerConfig {
    /// Clamp slider-backed values into their ranges.
    pub fn sanitized(mut self) -> Self {
        use std::f32::consts::PI;
        self.lights = self.lights.clamped();
        for angle in &mut self.rotation {
            *angle = if angle.is_finite() {
                angle.clamp(-PI, PI)
            } else {
                0.0
            };
        }
        self.window_size = [self.window_size[0].max(1), self.window_size[1].max(1)];
        self
    }
}

pub fn save_config_to_file(config: &ViewerConfig, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_config_from_file(path: &Path) -> Result<ViewerConfig> {
    let json = std::fs::read_to_string(path)?;
    let config: ViewerConfig = serde_json::from_str(&json)?;
    Ok(config.sanitized())
}

/// Settings for this run: the default file if present, then the optional
/// model path from the command line.
pub fn startup_config(model_arg: Option<PathBuf>) -> ViewerConfig {
    let path = Path::new(DEFAULT_CONFIG_FILE);
    let mut config = if path.exists() {
        match load_config_from_file(path) {
            Ok(config) => {
                log::info!("Loaded settings from {}", path.display());
                config
            }
            Err(err) => {
                log::warn!("Ignoring {}: {}", path.display(), err);
                ViewerConfig::default()
            }
        }
    } else {
        ViewerConfig::default()
    };
    if let Some(model) = model_arg {
        config.model_path = model;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        path.push(format!("holoscene_{}_{}_{}.json", name, std::process::id(), nonce));
        path
    }

    #[test]
    fn empty_object_uses_defaults() {
        let config: ViewerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.lights.hemisphere, 0.5);
        assert_eq!(config.lights.directional, 0.5);
        assert_eq!(config.lights.back, 0.2);
        assert!(config.animate);
        assert_eq!(config.highlight, HighlightColor::Red);
    }

    #[test]
    fn partial_lights_keep_other_defaults() {
        let config: ViewerConfig =
            serde_json::from_str(r#"{ "lights": { "back": 0.9 }, "highlight": "Blue" }"#).unwrap();
        assert_eq!(config.lights.back, 0.9);
        assert_eq!(config.lights.hemisphere, 0.5);
        assert_eq!(config.highlight, HighlightColor::Blue);
    }

    #[test]
    fn save_load_roundtrip_via_file() {
        let path = temp_path("settings");
        let config = ViewerConfig {
            model_path: PathBuf::from("assets/level.glb"),
            lights: LightIntensities {
                hemisphere: 0.1,
                directional: 0.9,
                back: 0.0,
            },
            rotation: [0.5, -1.0, 3.0],
            animate: false,
            highlight: HighlightColor::Blue,
            ..ViewerConfig::default()
        };
        save_config_to_file(&config, &path).unwrap();
        let loaded = load_config_from_file(&path).unwrap();
        assert_eq!(loaded, config);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn loading_clamps_out_of_range_values() {
        let path = temp_path("clamp");
        std::fs::write(
            &path,
            r#"{ "lights": { "hemisphere": 4.0, "back": -1.0 }, "rotation": [10.0, -10.0, 0.25] }"#,
        )
        .unwrap();
        let loaded = load_config_from_file(&path).unwrap();
        assert_eq!(loaded.lights.hemisphere, 1.0);
        assert_eq!(loaded.lights.back, 0.0);
        assert_eq!(loaded.rotation[0], std::f32::consts::PI);
        assert_eq!(loaded.rotation[1], -std::f32::consts::PI);
        assert_eq!(loaded.rotation[2], 0.25);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = load_config_from_file(Path::new("/nonexistent/holoscene.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn highlight_palette() {
        assert_eq!(HighlightColor::Red.rgb(), [1.0, 0.0, 0.0]);
        assert_eq!(HighlightColor::Blue.rgb(), [0.0, 0.0, 1.0]);
    }
}
