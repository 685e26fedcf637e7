use serde::{Deserialize, Serialize};
use std::fmt;

/// One decoded record from a symbol's tag range.
///
/// Records are produced by the (external) byte decoder in stream order. The
/// JSON form is internally tagged on `"type"`, e.g.
/// `{"type": "place", "depth": 1, "character_id": 4}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tag {
    /// Places a new object at a depth, replacing any occupant.
    Place(PlaceObject),
    /// Modifies the object already occupying a depth.
    PlaceUpdate(PlaceUpdate),
    Remove {
        depth: i32,
    },
    FrameLabel {
        name: String,
        #[serde(default)]
        anchor: bool,
    },
    ShowFrame,
    SoundStreamBlock(StreamBlockRef),
    StartSound(SoundEvent),
    SceneAndFrameLabelData(SceneLabelData),
    End,
    /// A record the timeline does not interpret (definitions, actions, ...).
    Unknown {
        code: u16,
    },
}

impl Tag {
    /// The tag code this record was decoded from.
    pub fn code(&self) -> u16 {
        match self {
            Tag::End => 0,
            Tag::ShowFrame => 1,
            Tag::StartSound(_) => 15,
            Tag::SoundStreamBlock(_) => 19,
            Tag::Place(_) | Tag::PlaceUpdate(_) => 26,
            Tag::Remove { .. } => 28,
            Tag::FrameLabel { .. } => 43,
            Tag::SceneAndFrameLabelData(_) => 86,
            Tag::Unknown { code } => *code,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tag::Place(_) => "Place",
            Tag::PlaceUpdate(_) => "PlaceUpdate",
            Tag::Remove { .. } => "Remove",
            Tag::FrameLabel { .. } => "FrameLabel",
            Tag::ShowFrame => "ShowFrame",
            Tag::SoundStreamBlock(_) => "SoundStreamBlock",
            Tag::StartSound(_) => "StartSound",
            Tag::SceneAndFrameLabelData(_) => "SceneAndFrameLabelData",
            Tag::End => "End",
            Tag::Unknown { .. } => "Unknown",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

/// A new placement. The character is mandatory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceObject {
    pub depth: i32,
    pub character_id: u16,
    #[serde(default)]
    pub matrix: Option<Matrix>,
    #[serde(default)]
    pub color_transform: Option<ColorTransform>,
    #[serde(default)]
    pub ratio: Option<u16>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub clip_depth: Option<i32>,
    #[serde(default)]
    pub blend_mode: Option<BlendMode>,
    #[serde(default)]
    pub filters: Option<Vec<Filter>>,
    #[serde(default)]
    pub cache_as_bitmap: Option<bool>,
}

impl PlaceObject {
    pub fn new(depth: i32, character_id: u16) -> Self {
        Self {
            depth,
            character_id,
            matrix: None,
            color_transform: None,
            ratio: None,
            name: None,
            clip_depth: None,
            blend_mode: None,
            filters: None,
            cache_as_bitmap: None,
        }
    }

    pub fn with_matrix(mut self, matrix: Matrix) -> Self {
        self.matrix = Some(matrix);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// An in-place modification of an existing occupant ("move" placement).
///
/// Every field left as `None` keeps the occupant's current value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaceUpdate {
    pub depth: i32,
    #[serde(default)]
    pub character_id: Option<u16>,
    #[serde(default)]
    pub matrix: Option<Matrix>,
    #[serde(default)]
    pub color_transform: Option<ColorTransform>,
    #[serde(default)]
    pub ratio: Option<u16>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub clip_depth: Option<i32>,
    #[serde(default)]
    pub blend_mode: Option<BlendMode>,
    #[serde(default)]
    pub filters: Option<Vec<Filter>>,
    #[serde(default)]
    pub cache_as_bitmap: Option<bool>,
}

impl PlaceUpdate {
    pub fn new(depth: i32) -> Self {
        Self {
            depth,
            ..Default::default()
        }
    }

    pub fn with_matrix(mut self, matrix: Matrix) -> Self {
        self.matrix = Some(matrix);
        self
    }
}

/// 2x3 affine matrix as stored in the file: `x' = a*x + c*y + tx`,
/// `y' = b*x + d*y + ty`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self {
            tx,
            ty,
            ..Self::IDENTITY
        }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    /// Coefficients in `[a, b, c, d, tx, ty]` order.
    pub fn coefficients(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.tx, self.ty]
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Per-channel multiply and add terms, RGBA order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorTransform {
    pub mul: [f32; 4],
    pub add: [f32; 4],
}

impl ColorTransform {
    pub const IDENTITY: ColorTransform = ColorTransform {
        mul: [1.0; 4],
        add: [0.0; 4],
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for ColorTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    Normal,
    Layer,
    Multiply,
    Screen,
    Lighten,
    Darken,
    Difference,
    Add,
    Subtract,
    Invert,
    Alpha,
    Erase,
    Overlay,
    HardLight,
}

impl BlendMode {
    /// Maps the on-disk blend code. Codes 0 and 1 both mean normal; unknown
    /// codes fall back to normal as players do.
    pub fn from_code(code: u8) -> Self {
        match code {
            2 => BlendMode::Layer,
            3 => BlendMode::Multiply,
            4 => BlendMode::Screen,
            5 => BlendMode::Lighten,
            6 => BlendMode::Darken,
            7 => BlendMode::Difference,
            8 => BlendMode::Add,
            9 => BlendMode::Subtract,
            10 => BlendMode::Invert,
            11 => BlendMode::Alpha,
            12 => BlendMode::Erase,
            13 => BlendMode::Overlay,
            14 => BlendMode::HardLight,
            _ => BlendMode::Normal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "filter", rename_all = "snake_case")]
pub enum Filter {
    Blur {
        blur_x: f32,
        blur_y: f32,
        #[serde(default = "default_passes")]
        passes: u8,
    },
    DropShadow {
        color: [u8; 4],
        blur_x: f32,
        blur_y: f32,
        angle: f32,
        distance: f32,
        strength: f32,
        #[serde(default)]
        inner: bool,
        #[serde(default)]
        knockout: bool,
        #[serde(default = "default_passes")]
        passes: u8,
    },
    Glow {
        color: [u8; 4],
        blur_x: f32,
        blur_y: f32,
        strength: f32,
        #[serde(default)]
        inner: bool,
        #[serde(default)]
        knockout: bool,
        #[serde(default = "default_passes")]
        passes: u8,
    },
    ColorMatrix {
        matrix: [f32; 20],
    },
}

fn default_passes() -> u8 {
    1
}

/// Reference to the block of streamed audio that plays with a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamBlockRef {
    pub stream_id: u16,
    pub block_index: u32,
}

/// An event sound started (or stopped) when a frame is reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundEvent {
    pub sound_id: u16,
    #[serde(default)]
    pub stop: bool,
    #[serde(default)]
    pub no_multiple: bool,
    #[serde(default)]
    pub loop_count: u16,
}

/// Scene and frame-label metadata of a top-level timeline.
///
/// Offsets and frame numbers are 0-based.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneLabelData {
    pub scenes: Vec<SceneOffset>,
    #[serde(default)]
    pub frame_labels: Vec<FrameLabelOffset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneOffset {
    pub offset: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameLabelOffset {
    pub frame: u32,
    pub label: String,
}
