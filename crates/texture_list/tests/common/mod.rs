#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use texture_list::{Bitmap, ImageSource, PixelFormat, RepaintSink, Result, ThumbnailCache, ThumbnailDecoder, ThumbnailError};

/// Decoder returning prepared bitmaps by data id. With a gate every decode waits for a permit.
pub struct TestDecoder {
    bitmaps: HashMap<String, Bitmap>,
    gate: Option<Arc<Semaphore>>,
    calls: AtomicUsize,
}

impl TestDecoder {
    pub fn new(bitmaps: &[(&str, Bitmap)]) -> Self {
        Self {
            bitmaps: bitmaps.iter().map(|(id, bitmap)| (id.to_string(), bitmap.clone())).collect(),
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn gated(bitmaps: &[(&str, Bitmap)], gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(bitmaps)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ThumbnailDecoder for TestDecoder {
    async fn decode(&self, source: &ImageSource, _size: u32) -> Result<Bitmap> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await.map_err(|e| ThumbnailError::TaskFailed(e.to_string()))?.forget();
        }
        self.bitmaps
            .get(&source.data_id)
            .cloned()
            .ok_or_else(|| ThumbnailError::MissingData(source.data_id.clone()))
    }
}

/// Repaint sink that reports every request on a channel.
pub fn repaint_channel() -> (Arc<dyn RepaintSink>, Receiver<()>) {
    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    let sink: Arc<dyn RepaintSink> = Arc::new(move || {
        let _ = tx.lock().send(());
    });
    (sink, rx)
}

pub fn source(data_id: &str) -> ImageSource {
    ImageSource::new(data_id, 4, 4, PixelFormat::Rgba8)
}

pub fn bitmap() -> Bitmap {
    Bitmap::new(vec![200; 2 * 2 * 4], 2, 2)
}

/// Poll the cache until `expected` results were applied or a few seconds passed.
pub fn wait_for_results(cache: &mut ThumbnailCache, repaints: &Receiver<()>, expected: usize) -> usize {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut applied = 0;
    while applied < expected && Instant::now() < deadline {
        let _ = repaints.recv_timeout(Duration::from_millis(20));
        applied += cache.poll_results();
    }
    applied
}

/// Give the loader time to (not) deliver anything, then poll once.
pub fn settle(cache: &mut ThumbnailCache) -> usize {
    std::thread::sleep(Duration::from_millis(200));
    cache.poll_results()
}
