//! Refresh cycles of the texture table.
//!
//! Every refresh mints new rows and a new [`RefreshId`]. The metadata and thumbnail
//! batches that answer a refresh are tagged with its id, batches of an older refresh
//! are dropped.

use std::collections::HashMap;

use log::{debug, warn};

use crate::cache::ThumbnailCache;
use crate::column::Column;
use crate::row::{ResourceEntry, RowId, TextureRow};
use crate::source::{Bitmap, ImageSource};
use crate::texture_info::{TextureDescriptor, TextureInfo};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefreshId(u64);

/// What the capture currently offers for the selected command.
#[derive(Clone, Debug)]
pub enum ListState {
    /// A capture is being opened
    CaptureLoading,
    /// The capture could not be opened
    CaptureLoadFailed,
    /// Resource list isn't available yet
    ResourcesLoading,
    /// Resources are loaded but no command is selected
    NoCommandSelected,
    /// Textures bound at the selected command, in listing order
    Ready(Vec<ResourceEntry>),
}

/// Message the view shows instead of (or above) the table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListStatus {
    LoadingCapture,
    CaptureLoadFailed,
    Loading,
    SelectCommand,
    NoTextures,
    Ready,
}

pub struct TextureList {
    cache: ThumbnailCache,
    rows: Vec<TextureRow>,
    /// resource id -> index into `rows`
    by_resource: HashMap<String, usize>,
    /// indices into `rows` after filtering and sorting
    view: Vec<usize>,
    sort: Option<(Column, bool)>,
    filter: String,
    show_deleted: bool,
    selected: Option<String>,
    refresh: RefreshId,
    status: ListStatus,
}

impl TextureList {
    pub fn new(cache: ThumbnailCache) -> Self {
        Self {
            cache,
            rows: Vec::new(),
            by_resource: HashMap::new(),
            view: Vec::new(),
            sort: None,
            filter: String::new(),
            show_deleted: true,
            selected: None,
            refresh: RefreshId(0),
            status: ListStatus::Loading,
        }
    }

    /// Start a new refresh cycle. All rows and thumbnails of the previous cycle are dropped.
    pub fn update(&mut self, state: ListState) -> RefreshId {
        self.clear();

        self.status = match state {
            ListState::CaptureLoading => ListStatus::LoadingCapture,
            ListState::CaptureLoadFailed => ListStatus::CaptureLoadFailed,
            ListState::ResourcesLoading => ListStatus::Loading,
            ListState::NoCommandSelected => ListStatus::SelectCommand,
            ListState::Ready(resources) if resources.is_empty() => ListStatus::NoTextures,
            ListState::Ready(resources) => {
                for entry in resources {
                    if self.by_resource.contains_key(&entry.resource_id) {
                        warn!("[TextureList] Skipping duplicate resource {}", entry.resource_id);
                        continue;
                    }
                    let row = TextureRow::new(entry);
                    self.by_resource.insert(row.resource_id.clone(), self.rows.len());
                    self.rows.push(row);
                }
                ListStatus::Ready
            }
        };

        if let Some(selected) = &self.selected {
            if !self.by_resource.contains_key(selected) {
                self.selected = None;
            }
        }
        self.rebuild_view();
        debug!("[TextureList] Refresh {:?}: {} textures ({:?})", self.refresh, self.rows.len(), self.status);
        self.refresh
    }

    /// Drop all rows and thumbnails. Batches of the current refresh are ignored afterwards.
    pub fn clear(&mut self) {
        self.refresh = RefreshId(self.refresh.0 + 1);
        self.cache.reset();
        self.rows.clear();
        self.by_resource.clear();
        self.view.clear();
    }

    /// Apply the metadata batch of `refresh`. Failed entries get empty metadata.
    /// Returns the number of rows updated.
    pub fn apply_metadata(&mut self, refresh: RefreshId, batch: HashMap<String, Result<TextureDescriptor, String>>) -> usize {
        if refresh != self.refresh {
            debug!("[TextureList] Ignoring metadata of stale refresh {:?}", refresh);
            return 0;
        }

        let mut updated = 0;
        for (resource_id, result) in batch {
            let Some(&index) = self.by_resource.get(&resource_id) else {
                continue;
            };
            self.rows[index].info = match result {
                Ok(descriptor) => TextureInfo::from_descriptor(&descriptor),
                Err(err) => {
                    debug!("[TextureList] No metadata for {}: {}", resource_id, err);
                    TextureInfo::none()
                }
            };
            updated += 1;
        }

        if updated > 0 {
            self.rebuild_view();
        }
        updated
    }

    /// Apply the thumbnail source batch of `refresh`. Failed entries are dropped, those
    /// rows render without an image. Returns the number of sources handed to the cache.
    pub fn apply_thumbnails(&mut self, refresh: RefreshId, batch: HashMap<String, Result<ImageSource, String>>) -> usize {
        if refresh != self.refresh {
            debug!("[TextureList] Ignoring thumbnails of stale refresh {:?}", refresh);
            return 0;
        }

        let mut sources = HashMap::new();
        for (resource_id, result) in batch {
            let Ok(source) = result else {
                continue;
            };
            if let Some(&index) = self.by_resource.get(&resource_id) {
                sources.insert(self.rows[index].id, source);
            }
        }

        let count = sources.len();
        self.cache.set_sources(sources);
        count
    }

    /// Row scrolled into view
    pub fn on_show(&mut self, row: RowId) {
        self.cache.load(row);
    }

    /// Row scrolled out of view
    pub fn on_hide(&mut self, row: RowId) {
        self.cache.unload(row);
    }

    pub fn thumbnail(&mut self, row: RowId) -> Option<Bitmap> {
        self.cache.display_image(row)
    }

    /// Apply finished thumbnail decodes, call on every UI tick.
    pub fn poll(&mut self) -> usize {
        self.cache.poll_results()
    }

    pub fn sort_by(&mut self, column: Column, ascending: bool) {
        self.sort = Some((column, ascending));
        self.rebuild_view();
    }

    pub fn clear_sort(&mut self) {
        self.sort = None;
        self.rebuild_view();
    }

    pub fn sort(&self) -> Option<(Column, bool)> {
        self.sort
    }

    pub fn set_filter(&mut self, filter: &str) {
        if self.filter == filter {
            return;
        }
        self.filter = filter.to_string();
        self.rebuild_view();
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Deleted textures are shown unless turned off here.
    pub fn set_show_deleted(&mut self, show: bool) {
        if self.show_deleted == show {
            return;
        }
        self.show_deleted = show;
        self.rebuild_view();
    }

    pub fn show_deleted(&self) -> bool {
        self.show_deleted
    }

    fn rebuild_view(&mut self) {
        let filter = self.filter.to_lowercase();
        let show_deleted = self.show_deleted;
        let rows = &self.rows;
        self.view = (0..rows.len())
            .filter(|&i| show_deleted || !rows[i].deleted)
            .filter(|&i| filter.is_empty() || rows[i].label.to_lowercase().contains(&filter) || rows[i].handle.to_lowercase().contains(&filter))
            .collect();

        if let Some((column, ascending)) = self.sort {
            self.view.sort_by(|&a, &b| {
                let ordering = column.compare(&rows[a], &rows[b]);
                if ascending { ordering } else { ordering.reverse() }
            });
        }
    }

    /// Rows in display order (filtered and sorted)
    pub fn visible_rows(&self) -> impl Iterator<Item = &TextureRow> {
        self.view.iter().map(|&i| &self.rows[i])
    }

    pub fn visible_count(&self) -> usize {
        self.view.len()
    }

    /// Rows in listing order
    pub fn rows(&self) -> &[TextureRow] {
        &self.rows
    }

    pub fn row(&self, id: RowId) -> Option<&TextureRow> {
        self.rows.iter().find(|row| row.id == id)
    }

    pub fn row_by_resource(&self, resource_id: &str) -> Option<&TextureRow> {
        self.by_resource.get(resource_id).map(|&i| &self.rows[i])
    }

    /// Select the row at `index` of the visible rows.
    pub fn select(&mut self, index: usize) -> Option<&TextureRow> {
        let row = &self.rows[*self.view.get(index)?];
        self.selected = Some(row.resource_id.clone());
        Some(row)
    }

    /// Select by resource id, kept across refreshes while the resource exists.
    pub fn select_resource(&mut self, resource_id: &str) -> bool {
        if self.by_resource.contains_key(resource_id) {
            self.selected = Some(resource_id.to_string());
            true
        } else {
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&TextureRow> {
        self.selected.as_deref().and_then(|id| self.row_by_resource(id))
    }

    /// Index of the selected row within the visible rows
    pub fn selected_index(&self) -> Option<usize> {
        let selected = self.selected.as_deref()?;
        self.view.iter().position(|&i| self.rows[i].resource_id == selected)
    }

    pub fn status(&self) -> ListStatus {
        self.status
    }

    pub fn current_refresh(&self) -> RefreshId {
        self.refresh
    }

    pub fn cache(&self) -> &ThumbnailCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ThumbnailCache {
        &mut self.cache
    }
}
