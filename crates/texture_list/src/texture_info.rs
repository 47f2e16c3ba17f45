/// Dimensionality of a texture resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum TextureKind {
    /// Unknown type or metadata not (yet) available.
    #[default]
    Unknown,
    Texture1D,
    Texture1DArray,
    Texture2D,
    Texture2DMultisampled,
    Texture2DArray,
    Texture2DMultisampledArray,
    Texture3D,
    Cubemap,
    CubemapArray,
}

impl TextureKind {
    pub fn label(&self) -> &'static str {
        match self {
            TextureKind::Unknown => "",
            TextureKind::Texture1D => "1D",
            TextureKind::Texture1DArray => "1D Array",
            TextureKind::Texture2D => "2D",
            TextureKind::Texture2DMultisampled => "2D Multisampled",
            TextureKind::Texture2DArray => "2D Array",
            TextureKind::Texture2DMultisampledArray => "2D Multisampled Array",
            TextureKind::Texture3D => "3D",
            TextureKind::Cubemap => "Cubemap",
            TextureKind::CubemapArray => "Cubemap Array",
        }
    }
}

/// Size and format of a single mip level.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelInfo {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub format: String,
}

impl LevelInfo {
    pub fn new(width: u32, height: u32, depth: u32, format: impl Into<String>) -> Self {
        Self {
            width,
            height,
            depth,
            format: format.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CubemapLevel {
    pub negative_x: LevelInfo,
    pub positive_x: LevelInfo,
    pub negative_y: LevelInfo,
    pub positive_y: LevelInfo,
    pub negative_z: LevelInfo,
    pub positive_z: LevelInfo,
}

/// Texture resource data as reported by the capture service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextureDescriptor {
    Texture1D { levels: Vec<LevelInfo> },
    Texture1DArray { layers: Vec<Vec<LevelInfo>> },
    Texture2D { levels: Vec<LevelInfo>, multisampled: bool },
    Texture2DArray { layers: Vec<Vec<LevelInfo>>, multisampled: bool },
    Texture3D { levels: Vec<LevelInfo> },
    Cubemap { levels: Vec<CubemapLevel> },
    CubemapArray,
    Other,
}

/// Metadata shown in the texture table.
///
/// `level0` is the first mip level of the first layer. A `layer_count` of zero means
/// there is nothing to show besides the kind, all size columns render empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextureInfo {
    pub kind: TextureKind,
    pub level0: Option<LevelInfo>,
    pub layer_count: u32,
    pub level_count: u32,
}

impl TextureInfo {
    /// Placeholder for rows without metadata (not loaded yet or failed).
    pub fn none() -> Self {
        Self::default()
    }

    pub fn kind_only(kind: TextureKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    fn with_level(kind: TextureKind, level0: &LevelInfo, layer_count: usize, level_count: usize) -> Self {
        Self {
            kind,
            level0: Some(level0.clone()),
            layer_count: layer_count as u32,
            level_count: level_count as u32,
        }
    }

    pub fn from_descriptor(descriptor: &TextureDescriptor) -> Self {
        match descriptor {
            TextureDescriptor::Texture1D { levels } => Self::from_levels(TextureKind::Texture1D, levels),
            TextureDescriptor::Texture1DArray { layers } => Self::from_layers(TextureKind::Texture1DArray, layers),
            TextureDescriptor::Texture2D { levels, multisampled } => {
                let kind = if *multisampled { TextureKind::Texture2DMultisampled } else { TextureKind::Texture2D };
                Self::from_levels(kind, levels)
            }
            TextureDescriptor::Texture2DArray { layers, multisampled } => {
                let kind = if *multisampled {
                    TextureKind::Texture2DMultisampledArray
                } else {
                    TextureKind::Texture2DArray
                };
                Self::from_layers(kind, layers)
            }
            TextureDescriptor::Texture3D { levels } => Self::from_levels(TextureKind::Texture3D, levels),
            TextureDescriptor::Cubemap { levels } => match levels.first() {
                Some(level) => Self::with_level(TextureKind::Cubemap, &level.negative_x, 1, levels.len()),
                None => Self::kind_only(TextureKind::Cubemap),
            },
            // TODO: expose layer and level counts once cubemap arrays carry per-layer data.
            TextureDescriptor::CubemapArray => Self::kind_only(TextureKind::CubemapArray),
            TextureDescriptor::Other => Self::none(),
        }
    }

    fn from_levels(kind: TextureKind, levels: &[LevelInfo]) -> Self {
        match levels.first() {
            Some(level0) => Self::with_level(kind, level0, 1, levels.len()),
            None => Self::kind_only(kind),
        }
    }

    fn from_layers(kind: TextureKind, layers: &[Vec<LevelInfo>]) -> Self {
        match layers.first().and_then(|levels| levels.first().map(|level0| (level0, levels.len()))) {
            Some((level0, level_count)) => Self::with_level(kind, level0, layers.len(), level_count),
            None => Self::kind_only(kind),
        }
    }

    pub fn type_label(&self) -> &'static str {
        self.kind.label()
    }

    fn has_data(&self) -> bool {
        self.layer_count != 0
    }

    fn level_text(&self, f: impl Fn(&LevelInfo) -> String) -> String {
        match &self.level0 {
            Some(level0) if self.has_data() => f(level0),
            _ => String::new(),
        }
    }

    pub fn width_text(&self) -> String {
        self.level_text(|l| l.width.to_string())
    }

    pub fn height_text(&self) -> String {
        self.level_text(|l| l.height.to_string())
    }

    pub fn depth_text(&self) -> String {
        self.level_text(|l| l.depth.to_string())
    }

    pub fn format_text(&self) -> String {
        self.level_text(|l| l.format.clone())
    }

    pub fn layers_text(&self) -> String {
        if self.has_data() { self.layer_count.to_string() } else { String::new() }
    }

    pub fn levels_text(&self) -> String {
        if self.has_data() { self.level_count.to_string() } else { String::new() }
    }

    pub fn sort_width(&self) -> u32 {
        self.level0.as_ref().map_or(0, |l| l.width)
    }

    pub fn sort_height(&self) -> u32 {
        self.level0.as_ref().map_or(0, |l| l.height)
    }

    pub fn sort_depth(&self) -> u32 {
        self.level0.as_ref().map_or(0, |l| l.depth)
    }
}
