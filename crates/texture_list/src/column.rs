use std::cmp::Ordering;

use crate::row::TextureRow;

/// Columns of the texture table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    Name,
    Type,
    Width,
    Height,
    Depth,
    Layers,
    Levels,
    Format,
}

impl Column {
    pub const ALL: [Column; 9] = [
        Column::Id,
        Column::Name,
        Column::Type,
        Column::Width,
        Column::Height,
        Column::Depth,
        Column::Layers,
        Column::Levels,
        Column::Format,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Column::Id => "ID",
            Column::Name => "Name",
            Column::Type => "Type",
            Column::Width => "Width",
            Column::Height => "Height",
            Column::Depth => "Depth",
            Column::Layers => "Layers",
            Column::Levels => "Levels",
            Column::Format => "Format",
        }
    }

    /// Whether the column shows the row thumbnail next to its text
    pub fn has_image(&self) -> bool {
        matches!(self, Column::Id)
    }

    pub fn text(&self, row: &TextureRow) -> String {
        match self {
            Column::Id => row.handle.clone(),
            Column::Name => row.label.clone(),
            Column::Type => row.info.type_label().to_string(),
            Column::Width => row.info.width_text(),
            Column::Height => row.info.height_text(),
            Column::Depth => row.info.depth_text(),
            Column::Layers => row.info.layers_text(),
            Column::Levels => row.info.levels_text(),
            Column::Format => row.info.format_text(),
        }
    }

    pub fn compare(&self, a: &TextureRow, b: &TextureRow) -> Ordering {
        match self {
            Column::Id => a.order.cmp(&b.order),
            Column::Name => a.label.cmp(&b.label),
            Column::Type => a.info.type_label().cmp(b.info.type_label()),
            Column::Width => a.info.sort_width().cmp(&b.info.sort_width()),
            Column::Height => a.info.sort_height().cmp(&b.info.sort_height()),
            Column::Depth => a.info.sort_depth().cmp(&b.info.sort_depth()),
            Column::Layers => a.info.layer_count.cmp(&b.info.layer_count),
            Column::Levels => a.info.level_count.cmp(&b.info.level_count),
            Column::Format => a.info.format_text().cmp(&b.info.format_text()),
        }
    }
}
