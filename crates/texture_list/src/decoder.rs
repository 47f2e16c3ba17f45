use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use image::{imageops::FilterType, DynamicImage, RgbaImage};
use parking_lot::RwLock;

use crate::source::{Bitmap, ImageSource, PixelFormat};
use crate::{Result, ThumbnailError};

/// Turns an [`ImageSource`] into a small bitmap.
///
/// Implementations run on the loader runtime, never on the UI context.
#[async_trait]
pub trait ThumbnailDecoder: Send + Sync {
    /// Decode `source` so that it fits into a `size` x `size` square.
    async fn decode(&self, source: &ImageSource, size: u32) -> Result<Bitmap>;
}

/// Storage of the raw image bytes an [`ImageSource`] refers to.
pub trait BlobStore: Send + Sync {
    fn fetch(&self, data_id: &str) -> Result<Arc<Vec<u8>>>;
}

/// Thread safe in-memory blob store
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Arc<Vec<u8>>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, data_id: impl Into<String>, data: Vec<u8>) {
        self.blobs.write().insert(data_id.into(), Arc::new(data));
    }

    pub fn remove(&self, data_id: &str) -> bool {
        self.blobs.write().remove(data_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

impl BlobStore for MemoryBlobStore {
    fn fetch(&self, data_id: &str) -> Result<Arc<Vec<u8>>> {
        self.blobs
            .read()
            .get(data_id)
            .cloned()
            .ok_or_else(|| ThumbnailError::MissingData(data_id.to_string()))
    }
}

/// Default decode service: fetches the bytes from a [`BlobStore`] and scales them
/// down with the `image` crate.
pub struct ImageThumbnailer<S: BlobStore> {
    store: Arc<S>,
    strip_alpha: bool,
}

impl<S: BlobStore> ImageThumbnailer<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store, strip_alpha: true }
    }

    pub fn with_strip_alpha(mut self, strip_alpha: bool) -> Self {
        self.strip_alpha = strip_alpha;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

#[async_trait]
impl<S: BlobStore + 'static> ThumbnailDecoder for ImageThumbnailer<S> {
    async fn decode(&self, source: &ImageSource, size: u32) -> Result<Bitmap> {
        let data = self.store.fetch(&source.data_id)?;
        let source = source.clone();
        let strip_alpha = self.strip_alpha;

        // CPU-bound part
        tokio::task::spawn_blocking(move || render_thumbnail(&source, &data, size, strip_alpha))
            .await
            .map_err(|err| ThumbnailError::TaskFailed(err.to_string()))?
    }
}

/// Decode and scale `data` so that it fits into `size` x `size`, never upscaling.
pub fn render_thumbnail(source: &ImageSource, data: &[u8], size: u32, strip_alpha: bool) -> Result<Bitmap> {
    if size == 0 {
        return Err(ThumbnailError::InvalidDimensions { width: 0, height: 0 });
    }

    let img = match source.format {
        PixelFormat::Rgba8 => {
            let (width, height) = (source.width, source.height);
            if width == 0 || height == 0 {
                return Err(ThumbnailError::InvalidDimensions { width, height });
            }
            // Every depth slice must be present, only the first one is shown
            let slice = width as usize * height as usize * 4;
            let expected = slice * source.depth.max(1) as usize;
            if data.len() < expected {
                return Err(ThumbnailError::InvalidDataSize {
                    expected,
                    actual: data.len(),
                });
            }
            let buffer = RgbaImage::from_raw(width, height, data[..slice].to_vec()).ok_or(ThumbnailError::InvalidDimensions { width, height })?;
            DynamicImage::ImageRgba8(buffer)
        }
        PixelFormat::Encoded => image::load_from_memory(data)?,
    };

    let (orig_width, orig_height) = (img.width(), img.height());
    if orig_width == 0 || orig_height == 0 {
        return Err(ThumbnailError::InvalidDimensions {
            width: orig_width,
            height: orig_height,
        });
    }

    let scale = (size as f32 / orig_width as f32).min(size as f32 / orig_height as f32).min(1.0);
    let new_width = ((orig_width as f32 * scale) as u32).max(1);
    let new_height = ((orig_height as f32 * scale) as u32).max(1);

    let resized = if scale < 1.0 {
        img.resize_exact(new_width, new_height, FilterType::Triangle)
    } else {
        img
    };

    let mut rgba = resized.to_rgba8();
    if strip_alpha {
        for pixel in rgba.pixels_mut() {
            pixel.0[3] = 255;
        }
    }
    let (width, height) = rgba.dimensions();
    Ok(Bitmap::new(rgba.into_raw(), width, height))
}
