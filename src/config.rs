use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// User-configurable marking parameters.
/// Stored in the platform config directory (`$XDG_CONFIG_HOME/sheetmark/` or `%APPDATA%\sheetmark\`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root holding `sheets/<id>.pdf` and `papers/<id>.json`.
    pub data_dir: PathBuf,
    /// Longest edge of a rendered page, in raster pixels.
    pub raster_target_size: u32,
    /// Pen width in raster pixels.
    pub stroke_width: f32,
    /// Pen, check, cross and text colour (RGB).
    pub stroke_colour: [u8; 3],
    /// Edge length of check and cross glyphs in raster pixels.
    pub glyph_size: f32,
    /// Text annotation size in raster pixels.
    pub text_size: f32,
    /// Score annotation colour (RGB).
    pub number_colour: [u8; 3],
    /// UI font scale multiplier (0.75–2.0). Scales all egui text sizes.
    pub ui_font_scale: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("sheetmark"),
            raster_target_size: 1600,
            stroke_width: 3.0,
            stroke_colour: [214, 40, 40],
            glyph_size: 36.0,
            text_size: 28.0,
            number_colour: [25, 90, 220],
            ui_font_scale: 1.0,
        }
    }
}

impl Config {
    /// Load config from `config.json` in the platform config directory, or return defaults.
    pub fn load() -> Self {
        let path = config_path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!(
                    "No config file at {}, using defaults. Creating default config.",
                    path.display()
                );
                let config = Self::default();
                config.save();
                config
            }
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let mut config: Self = serde_json::from_str(json)?;
        config.ui_font_scale = config.ui_font_scale.clamp(0.75, 2.0);
        config.raster_target_size = config.raster_target_size.clamp(400, 6000);
        Ok(config)
    }

    /// Save current config to `config.json`.
    pub fn save(&self) {
        let path = config_path();
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    log::warn!("Failed to write config to {}: {}", path.display(), e);
                }
            }
            Err(e) => {
                log::warn!("Failed to serialize config: {}", e);
            }
        }
    }

    pub fn sheet_path(&self, sheet_id: &str) -> PathBuf {
        self.data_dir.join("sheets").join(format!("{}.pdf", sheet_id))
    }

    pub fn paper_path(&self, paper_id: &str) -> PathBuf {
        self.data_dir.join("papers").join(format!("{}.json", paper_id))
    }
}

fn config_path() -> PathBuf {
    let dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sheetmark");
    if !dir.exists() {
        std::fs::create_dir_all(&dir).ok();
    }
    dir.join("config.json")
}
