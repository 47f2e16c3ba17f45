use std::sync::Arc;

/// How the bytes behind an [`ImageSource`] are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Tightly packed 8 bit RGBA, `width * height * 4` bytes for the first slice
    Rgba8,
    /// Any container format the `image` crate can sniff (PNG, JPEG, ...)
    Encoded,
}

/// Everything needed to request the thumbnail of one texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    /// Key of the image data in the blob store
    pub data_id: String,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub format: PixelFormat,
}

impl ImageSource {
    pub fn new(data_id: impl Into<String>, width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            data_id: data_id.into(),
            width,
            height,
            depth: 1,
            format,
        }
    }
}

/// Decoded RGBA thumbnail
#[derive(Debug, Clone)]
pub struct Bitmap {
    /// Raw RGBA pixel data (Arc for cheap cloning)
    pub data: Arc<Vec<u8>>,
    pub width: u32,
    pub height: u32,
}

impl Bitmap {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        let expected_size = 4 * width as usize * height as usize;
        let actual_size = data.len();

        let valid_data = if actual_size != expected_size {
            log::warn!(
                "Bitmap size mismatch: expected {} bytes ({}x{}x4), got {} bytes. Padding/truncating.",
                expected_size,
                width,
                height,
                actual_size
            );
            let mut fixed = vec![0u8; expected_size];
            let copy_size = actual_size.min(expected_size);
            fixed[..copy_size].copy_from_slice(&data[..copy_size]);
            fixed
        } else {
            data
        };

        Self {
            data: Arc::new(valid_data),
            width,
            height,
        }
    }

    pub fn byte_size(&self) -> usize {
        self.data.len()
    }
}

impl PartialEq for Bitmap {
    fn eq(&self, other: &Self) -> bool {
        // Same Arc = same pixels
        Arc::ptr_eq(&self.data, &other.data) && self.width == other.width && self.height == other.height
    }
}

impl Eq for Bitmap {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitmap_pads_short_data() {
        let bitmap = Bitmap::new(vec![255; 6], 2, 1);
        assert_eq!(bitmap.byte_size(), 8);
        assert_eq!(&bitmap.data[..], &[255, 255, 255, 255, 255, 255, 0, 0]);
    }

    #[test]
    fn test_bitmap_equality_is_by_identity() {
        let a = Bitmap::new(vec![1, 2, 3, 4], 1, 1);
        let b = Bitmap::new(vec![1, 2, 3, 4], 1, 1);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
