use std::sync::atomic::{AtomicU64, Ordering};

use crate::texture_info::TextureInfo;

static ROW_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identity of a row within one refresh cycle.
///
/// Ids are never reused, so a row created by a later refresh can't alias a cache
/// entry of an earlier one even if both describe the same resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(u64);

impl RowId {
    pub fn next() -> Self {
        RowId(ROW_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// A texture resource as listed by the capture, before any metadata arrives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceEntry {
    /// Key used by the metadata and thumbnail batches
    pub resource_id: String,
    /// Handle shown in the ID column
    pub handle: String,
    pub label: String,
    /// Creation order, used for sorting the ID column
    pub order: u64,
    /// Resource was already deleted at the selected command
    pub deleted: bool,
}

impl ResourceEntry {
    pub fn new(resource_id: impl Into<String>, handle: impl Into<String>, label: impl Into<String>, order: u64) -> Self {
        Self {
            resource_id: resource_id.into(),
            handle: handle.into(),
            label: label.into(),
            order,
            deleted: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TextureRow {
    pub id: RowId,
    pub resource_id: String,
    pub handle: String,
    pub label: String,
    pub order: u64,
    pub deleted: bool,
    /// Filled in once the metadata batch arrives
    pub info: TextureInfo,
}

impl TextureRow {
    pub fn new(entry: ResourceEntry) -> Self {
        Self {
            id: RowId::next(),
            resource_id: entry.resource_id,
            handle: entry.handle,
            label: entry.label,
            order: entry.order,
            deleted: entry.deleted,
            info: TextureInfo::none(),
        }
    }
}
