use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Thumbnail edge length in logical pixels, before DPI scaling.
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 18;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ThumbnailOptions {
    /// Edge length of the square the thumbnail is fitted into
    pub thumbnail_size: u32,
    /// Display scale factor (1.0 = 100%)
    pub dpi_scale: f32,
    /// Decoder threads, 0 lets the runtime decide
    pub worker_threads: usize,
    /// Render thumbnails fully opaque
    pub strip_alpha: bool,
}

impl Default for ThumbnailOptions {
    fn default() -> Self {
        Self {
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
            dpi_scale: 1.0,
            worker_threads: 0,
            strip_alpha: true,
        }
    }
}

impl ThumbnailOptions {
    /// Thumbnail size in device pixels.
    pub fn scaled_size(&self) -> u32 {
        let scale = if self.dpi_scale.is_finite() && self.dpi_scale > 0.0 { self.dpi_scale } else { 1.0 };
        ((self.thumbnail_size as f32 * scale).round() as u32).max(1)
    }

    pub fn from_toml_str(txt: &str) -> crate::Result<Self> {
        Ok(toml::from_str(txt)?)
    }

    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let txt = fs::read_to_string(path)?;
        Self::from_toml_str(&txt)
    }

    pub fn load_options() -> Self {
        if let Some(proj_dirs) = directories::ProjectDirs::from("com", "GitHub", "texture_list") {
            let options_file = proj_dirs.config_dir().join("thumbnails.toml");
            if options_file.exists() {
                match Self::load_from(&options_file) {
                    Ok(options) => return options,
                    Err(err) => log::error!("Error reading options file {:?}: {}", options_file, err),
                }
            }
        }
        Self::default()
    }

    pub fn store_options(&self) {
        if let Some(proj_dirs) = directories::ProjectDirs::from("com", "GitHub", "texture_list") {
            if !proj_dirs.config_dir().exists() && fs::create_dir_all(proj_dirs.config_dir()).is_err() {
                log::error!("Can't create configuration directory {:?}", proj_dirs.config_dir());
                return;
            }
            let file_name = proj_dirs.config_dir().join("thumbnails.toml");
            match toml::to_string(self) {
                Ok(text) => {
                    if let Err(err) = fs::write(file_name, text) {
                        log::error!("Error writing options file: {}", err);
                    }
                }
                Err(err) => log::error!("Error writing options file: {}", err),
            }
        }
    }
}
