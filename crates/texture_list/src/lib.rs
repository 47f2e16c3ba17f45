//! View model for a texture resource browser.
//!
//! The browser shows the textures bound at a selected point of a captured command
//! stream. Every row gets a small preview image that is decoded in the background:
//! - `row` / `texture_info` - Row identity and texture metadata
//! - `source` - Image source descriptors and decoded bitmaps
//! - `decoder` - The thumbnail decode service and its default implementation
//! - `loader` - Background decoding on a tokio runtime
//! - `cache` - The identity keyed thumbnail cache driven by row visibility
//! - `list` / `column` - Refresh cycles, sorting, filtering and selection

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ThumbnailError>;

pub mod cache;
pub mod column;
pub mod decoder;
pub mod list;
pub mod loader;
pub mod options;
pub mod row;
pub mod source;
pub mod texture_info;

pub use cache::{CacheStats, EntryState, ThumbnailCache};
pub use column::Column;
pub use decoder::{BlobStore, ImageThumbnailer, MemoryBlobStore, ThumbnailDecoder};
pub use list::{ListState, ListStatus, RefreshId, TextureList};
pub use loader::{DecodeResult, RepaintSink, RequestToken, ThumbnailLoader, ThumbnailRequest};
pub use options::ThumbnailOptions;
pub use row::{ResourceEntry, RowId, TextureRow};
pub use source::{Bitmap, ImageSource, PixelFormat};
pub use texture_info::{CubemapLevel, LevelInfo, TextureDescriptor, TextureInfo, TextureKind};

#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error("No image data stored for id: {0}")]
    MissingData(String),

    #[error("Invalid pixel data size: expected {expected} bytes, got {actual} bytes")]
    InvalidDataSize { expected: usize, actual: usize },

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid options file: {0}")]
    InvalidOptions(#[from] toml::de::Error),

    #[error("Decode task failed: {0}")]
    TaskFailed(String),
}
