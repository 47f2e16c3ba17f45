use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, warn};
use tokio::runtime::{Handle, Runtime};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::decoder::ThumbnailDecoder;
use crate::row::RowId;
use crate::source::{Bitmap, ImageSource};

static REQUEST_TOKEN_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Receives "redraw when convenient" requests. Coalescing is up to the view.
pub trait RepaintSink: Send + Sync {
    fn request_repaint(&self);
}

impl<F> RepaintSink for F
where
    F: Fn() + Send + Sync,
{
    fn request_repaint(&self) {
        self()
    }
}

/// Identifies one decode request. A result is only accepted by the entry that
/// still waits for exactly this token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn next() -> Self {
        RequestToken(REQUEST_TOKEN_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Request to decode a thumbnail
pub struct ThumbnailRequest {
    pub row: RowId,
    pub token: RequestToken,
    pub source: ImageSource,
    /// Target edge length in device pixels
    pub size: u32,
    /// Child of the loader token, cancelled on unload or reset
    pub cancel: CancellationToken,
}

/// Result sent back to the UI context
#[derive(Debug)]
pub struct DecodeResult {
    pub row: RowId,
    pub token: RequestToken,
    /// `None` if decoding failed
    pub bitmap: Option<Bitmap>,
}

/// Decodes thumbnails on a tokio runtime and hands the results back through a channel.
pub struct ThumbnailLoader {
    decoder: Arc<dyn ThumbnailDecoder>,
    repaint: Arc<dyn RepaintSink>,
    /// Sender for results
    result_tx: mpsc::UnboundedSender<DecodeResult>,
    /// Current cancellation token
    cancel_token: CancellationToken,
    /// Keeps an owned runtime alive, `None` when running on a borrowed handle
    runtime: Option<Arc<Runtime>>,
    handle: Handle,
}

impl ThumbnailLoader {
    /// Spawn a loader with its own multi-threaded runtime.
    /// Returns the loader and the result receiver.
    ///
    /// The loader must not be dropped from within an async context since that drops the runtime.
    pub fn spawn(
        decoder: Arc<dyn ThumbnailDecoder>,
        repaint: Arc<dyn RepaintSink>,
        worker_threads: usize,
    ) -> std::io::Result<(Self, mpsc::UnboundedReceiver<DecodeResult>)> {
        let mut builder = tokio::runtime::Builder::new_multi_thread();
        builder.thread_name("thumbnail-loader").enable_all();
        if worker_threads > 0 {
            builder.worker_threads(worker_threads);
        }
        let runtime = Arc::new(builder.build()?);
        let handle = runtime.handle().clone();
        Ok(Self::create(decoder, repaint, Some(runtime), handle))
    }

    /// Create a loader that spawns its tasks on an existing runtime.
    pub fn with_handle(
        handle: Handle,
        decoder: Arc<dyn ThumbnailDecoder>,
        repaint: Arc<dyn RepaintSink>,
    ) -> (Self, mpsc::UnboundedReceiver<DecodeResult>) {
        Self::create(decoder, repaint, None, handle)
    }

    fn create(
        decoder: Arc<dyn ThumbnailDecoder>,
        repaint: Arc<dyn RepaintSink>,
        runtime: Option<Arc<Runtime>>,
        handle: Handle,
    ) -> (Self, mpsc::UnboundedReceiver<DecodeResult>) {
        let (result_tx, result_rx) = mpsc::unbounded_channel();
        (
            Self {
                decoder,
                repaint,
                result_tx,
                cancel_token: CancellationToken::new(),
                runtime,
                handle,
            },
            result_rx,
        )
    }

    /// Token for a new request, cancelled together with the loader generation.
    pub fn child_token(&self) -> CancellationToken {
        self.cancel_token.child_token()
    }

    /// Queue a thumbnail for decoding (async task)
    pub fn load(&self, request: ThumbnailRequest) {
        let result_tx = self.result_tx.clone();
        let decoder = self.decoder.clone();
        let repaint = self.repaint.clone();
        let ThumbnailRequest {
            row,
            token,
            source,
            size,
            cancel,
        } = request;

        debug!("[ThumbnailLoader] Spawning task for {:?} ({})", row, source.data_id);
        self.handle.spawn(async move {
            if cancel.is_cancelled() {
                debug!("[ThumbnailLoader] Task cancelled before start: {:?}", row);
                return;
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = decoder.decode(&source, size) => Some(result),
            };

            let bitmap = match outcome {
                Some(Ok(bitmap)) => Some(bitmap),
                Some(Err(err)) => {
                    debug!("[ThumbnailLoader] Decode failed for {:?} ({}): {}", row, source.data_id, err);
                    None
                }
                None => {
                    debug!("[ThumbnailLoader] Cancelled during decode: {:?}", row);
                    return;
                }
            };

            if cancel.is_cancelled() {
                debug!("[ThumbnailLoader] Discarding cancelled result: {:?}", row);
                return;
            }

            if let Err(e) = result_tx.send(DecodeResult { row, token, bitmap }) {
                warn!("[ThumbnailLoader] Failed to send result: {}", e);
                return;
            }
            repaint.request_repaint();
        });
    }

    /// Cancels every running request and starts a new generation.
    pub fn cancel_loading(&mut self) {
        self.cancel_token.cancel();
        self.cancel_token = CancellationToken::new();
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn owns_runtime(&self) -> bool {
        self.runtime.is_some()
    }
}

impl Drop for ThumbnailLoader {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
