//! Identity keyed thumbnail cache.
//!
//! The cache lives on the UI context. Lookups never block: a miss schedules a decode on
//! the [`ThumbnailLoader`] and returns `None`, the result comes back through a channel that
//! is drained by [`ThumbnailCache::poll_results`] on the next UI tick.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::decoder::ThumbnailDecoder;
use crate::loader::{DecodeResult, RepaintSink, RequestToken, ThumbnailLoader, ThumbnailRequest};
use crate::options::ThumbnailOptions;
use crate::row::RowId;
use crate::source::{Bitmap, ImageSource};

/// Externally visible state of a cache entry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryState {
    /// Entry exists but no decode is running (initial state or after unload)
    NotRequested,
    /// Decode is running
    Loading,
    /// Bitmap is available
    Loaded,
    /// Definitively no image: no source or decoding failed. Sticky until reset.
    Absent,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries_created: usize,
    pub decodes_requested: usize,
    pub decodes_completed: usize,
    pub decodes_failed: usize,
    pub stale_discarded: usize,
}

enum Slot {
    NotRequested,
    Loading { token: RequestToken, cancel: CancellationToken },
    Loaded(Bitmap),
    Absent,
}

struct CacheEntry {
    /// Captured on creation, later `set_sources` calls don't change it
    source: Option<ImageSource>,
    slot: Slot,
}

impl CacheEntry {
    fn state(&self) -> EntryState {
        match self.slot {
            Slot::NotRequested => EntryState::NotRequested,
            Slot::Loading { .. } => EntryState::Loading,
            Slot::Loaded(_) => EntryState::Loaded,
            Slot::Absent => EntryState::Absent,
        }
    }

    fn release(&mut self) {
        if let Slot::Loading { cancel, .. } = &self.slot {
            cancel.cancel();
        }
        if matches!(self.slot, Slot::Loading { .. } | Slot::Loaded(_)) {
            self.slot = Slot::NotRequested;
        }
    }
}

pub struct ThumbnailCache {
    sources: HashMap<RowId, ImageSource>,
    entries: HashMap<RowId, CacheEntry>,
    loader: ThumbnailLoader,
    result_rx: mpsc::UnboundedReceiver<DecodeResult>,
    repaint: Arc<dyn RepaintSink>,
    /// Thumbnail edge length in device pixels
    size: u32,
    stats: CacheStats,
}

impl ThumbnailCache {
    pub fn new(loader: ThumbnailLoader, result_rx: mpsc::UnboundedReceiver<DecodeResult>, repaint: Arc<dyn RepaintSink>, size: u32) -> Self {
        Self {
            sources: HashMap::new(),
            entries: HashMap::new(),
            loader,
            result_rx,
            repaint,
            size,
            stats: CacheStats::default(),
        }
    }

    /// Create a cache with its own loader runtime.
    pub fn spawn(options: &ThumbnailOptions, decoder: Arc<dyn ThumbnailDecoder>, repaint: Arc<dyn RepaintSink>) -> crate::Result<Self> {
        let (loader, result_rx) = ThumbnailLoader::spawn(decoder, repaint.clone(), options.worker_threads)?;
        Ok(Self::new(loader, result_rx, repaint, options.scaled_size()))
    }

    /// Create a cache that decodes on an existing runtime.
    pub fn with_handle(handle: Handle, options: &ThumbnailOptions, decoder: Arc<dyn ThumbnailDecoder>, repaint: Arc<dyn RepaintSink>) -> Self {
        let (loader, result_rx) = ThumbnailLoader::with_handle(handle, decoder, repaint.clone());
        Self::new(loader, result_rx, repaint, options.scaled_size())
    }

    /// Replace the known image sources. Existing entries keep the source they were created with.
    pub fn set_sources(&mut self, sources: HashMap<RowId, ImageSource>) {
        debug!("[ThumbnailCache] {} image sources available", sources.len());
        self.sources = sources;
        self.repaint.request_repaint();
    }

    /// Image to draw for `row`, `None` while loading or if there is none.
    pub fn display_image(&mut self, row: RowId) -> Option<Bitmap> {
        if self.sources.is_empty() {
            return None;
        }

        let entry = self.entries.entry(row).or_insert_with(|| {
            self.stats.entries_created += 1;
            match self.sources.get(&row) {
                Some(source) => CacheEntry {
                    source: Some(source.clone()),
                    slot: Slot::NotRequested,
                },
                None => CacheEntry {
                    source: None,
                    slot: Slot::Absent,
                },
            }
        });

        if matches!(entry.slot, Slot::NotRequested) {
            start_decode(&self.loader, &mut self.stats, self.size, row, entry);
        }

        match &entry.slot {
            Slot::Loaded(bitmap) => Some(bitmap.clone()),
            _ => None,
        }
    }

    /// Row became visible.
    pub fn load(&mut self, row: RowId) {
        if let Some(entry) = self.entries.get_mut(&row) {
            if matches!(entry.slot, Slot::NotRequested) {
                start_decode(&self.loader, &mut self.stats, self.size, row, entry);
            }
        }
    }

    /// Row became hidden, drop its bitmap.
    pub fn unload(&mut self, row: RowId) {
        if let Some(entry) = self.entries.get_mut(&row) {
            entry.release();
        }
    }

    /// Drop all entries and sources. Decodes still in flight are cancelled and their
    /// results ignored.
    pub fn reset(&mut self) {
        for entry in self.entries.values_mut() {
            entry.release();
        }
        self.entries.clear();
        self.sources.clear();
        self.loader.cancel_loading();
    }

    /// Apply finished decodes. Returns the number of entries that changed.
    pub fn poll_results(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(result) = self.result_rx.try_recv() {
            if self.apply_result(result) {
                applied += 1;
            }
        }
        if applied > 0 {
            self.repaint.request_repaint();
        }
        applied
    }

    /// Apply one decode result if its entry still waits for it.
    pub fn apply_result(&mut self, result: DecodeResult) -> bool {
        let entry = match self.entries.get_mut(&result.row) {
            Some(entry) if matches!(&entry.slot, Slot::Loading { token, .. } if *token == result.token) => entry,
            _ => {
                debug!("[ThumbnailCache] Discarding stale result for {:?}", result.row);
                self.stats.stale_discarded += 1;
                return false;
            }
        };

        entry.slot = match result.bitmap {
            Some(bitmap) => {
                self.stats.decodes_completed += 1;
                Slot::Loaded(bitmap)
            }
            None => {
                self.stats.decodes_failed += 1;
                Slot::Absent
            }
        };
        true
    }

    pub fn entry_state(&self, row: RowId) -> Option<EntryState> {
        self.entries.get(&row).map(CacheEntry::state)
    }

    pub fn source(&self, row: RowId) -> Option<&ImageSource> {
        self.sources.get(&row)
    }

    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn thumbnail_size(&self) -> u32 {
        self.size
    }
}

fn start_decode(loader: &ThumbnailLoader, stats: &mut CacheStats, size: u32, row: RowId, entry: &mut CacheEntry) {
    let Some(source) = entry.source.clone() else {
        entry.slot = Slot::Absent;
        return;
    };
    let token = RequestToken::next();
    let cancel = loader.child_token();
    entry.slot = Slot::Loading {
        token,
        cancel: cancel.clone(),
    };
    stats.decodes_requested += 1;
    loader.load(ThumbnailRequest {
        row,
        token,
        source,
        size,
        cancel,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::PixelFormat;
    use crate::Result;
    use async_trait::async_trait;

    /// Never finishes, results are injected by hand
    struct PendingDecoder;

    #[async_trait]
    impl ThumbnailDecoder for PendingDecoder {
        async fn decode(&self, _source: &ImageSource, _size: u32) -> Result<Bitmap> {
            std::future::pending().await
        }
    }

    fn cache() -> ThumbnailCache {
        ThumbnailCache::spawn(&ThumbnailOptions::default(), Arc::new(PendingDecoder), Arc::new(|| {})).unwrap()
    }

    fn sources(rows: &[RowId]) -> HashMap<RowId, ImageSource> {
        rows.iter()
            .map(|row| (*row, ImageSource::new(format!("data-{}", row.value()), 4, 4, PixelFormat::Rgba8)))
            .collect()
    }

    fn loading_token(cache: &ThumbnailCache, row: RowId) -> RequestToken {
        match &cache.entries[&row].slot {
            Slot::Loading { token, .. } => *token,
            _ => panic!("entry is not loading"),
        }
    }

    #[test]
    fn test_result_for_current_token_is_applied() {
        let mut cache = cache();
        let row = RowId::next();
        cache.set_sources(sources(&[row]));
        assert_eq!(cache.display_image(row), None);

        let bitmap = Bitmap::new(vec![0; 16], 2, 2);
        let token = loading_token(&cache, row);
        assert!(cache.apply_result(DecodeResult {
            row,
            token,
            bitmap: Some(bitmap.clone())
        }));
        assert_eq!(cache.display_image(row), Some(bitmap));
        assert_eq!(cache.stats().decodes_completed, 1);
    }

    #[test]
    fn test_result_after_unload_reload_is_stale() {
        let mut cache = cache();
        let row = RowId::next();
        cache.set_sources(sources(&[row]));
        cache.display_image(row);
        let old_token = loading_token(&cache, row);

        cache.unload(row);
        cache.load(row);
        assert_ne!(loading_token(&cache, row), old_token);

        assert!(!cache.apply_result(DecodeResult {
            row,
            token: old_token,
            bitmap: Some(Bitmap::new(vec![0; 4], 1, 1))
        }));
        assert_eq!(cache.entry_state(row), Some(EntryState::Loading));
        assert_eq!(cache.stats().stale_discarded, 1);
        assert_eq!(cache.stats().decodes_requested, 2);
    }

    #[test]
    fn test_failed_result_is_absent() {
        let mut cache = cache();
        let row = RowId::next();
        cache.set_sources(sources(&[row]));
        cache.display_image(row);
        let token = loading_token(&cache, row);
        assert!(cache.apply_result(DecodeResult { row, token, bitmap: None }));
        assert_eq!(cache.entry_state(row), Some(EntryState::Absent));

        // no retry, not even after an unload/load cycle
        cache.unload(row);
        cache.load(row);
        assert_eq!(cache.display_image(row), None);
        assert_eq!(cache.entry_state(row), Some(EntryState::Absent));
        assert_eq!(cache.stats().decodes_requested, 1);
    }

    #[test]
    fn test_unload_cancels_in_flight_request() {
        let mut cache = cache();
        let row = RowId::next();
        cache.set_sources(sources(&[row]));
        cache.display_image(row);
        let cancel = match &cache.entries[&row].slot {
            Slot::Loading { cancel, .. } => cancel.clone(),
            _ => panic!("entry is not loading"),
        };
        cache.unload(row);
        assert!(cancel.is_cancelled());
        assert_eq!(cache.entry_state(row), Some(EntryState::NotRequested));
    }
}
