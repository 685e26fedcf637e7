use crate::sparse::SparseTable;
use kurbo::{Affine, Rect};
use reel_data::model::{BlendMode, ColorTransform, Filter, Matrix, PlaceObject, PlaceUpdate};

/// The display list of one frame: depth -> placed object.
pub type PlacementTable = SparseTable<PlacedObject>;

/// A character instance on the display list.
///
/// Placed objects are immutable and shared between frames by `Arc`. An
/// update to a depth produces a new `PlacedObject`; frames that saw the old
/// one keep it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedObject {
    pub depth: i32,
    /// Library identifier of the character, resolved through the owning
    /// movie's library.
    pub character_id: u16,
    pub transform: Affine,
    pub color_transform: Option<ColorTransform>,
    pub blend_mode: BlendMode,
    pub filters: Vec<Filter>,
    /// Instance name, if the placement was given one.
    pub name: Option<String>,
    /// Highest depth masked by this object, if it is a mask.
    pub clip_depth: Option<i32>,
    /// Morph ratio (0..=65535).
    pub ratio: Option<u16>,
    pub cache_as_bitmap: bool,
    /// 1-based index of the frame in which this occupant was first placed.
    pub placed_in_frame: usize,
}

fn affine_of(matrix: &Matrix) -> Affine {
    Affine::new(matrix.coefficients())
}

impl PlacedObject {
    /// Builds a fresh occupant from a `Place` tag.
    pub fn from_place(place: PlaceObject, frame_index1: usize) -> Self {
        Self {
            depth: place.depth,
            character_id: place.character_id,
            transform: place.matrix.as_ref().map(affine_of).unwrap_or(Affine::IDENTITY),
            color_transform: place.color_transform,
            blend_mode: place.blend_mode.unwrap_or_default(),
            filters: place.filters.unwrap_or_default(),
            name: place.name,
            clip_depth: place.clip_depth,
            ratio: place.ratio,
            cache_as_bitmap: place.cache_as_bitmap.unwrap_or(false),
            placed_in_frame: frame_index1,
        }
    }

    /// Returns a copy with the fields present in `update` applied.
    pub fn updated(&self, update: PlaceUpdate) -> Self {
        Self {
            depth: self.depth,
            character_id: update.character_id.unwrap_or(self.character_id),
            transform: update.matrix.as_ref().map(affine_of).unwrap_or(self.transform),
            color_transform: update.color_transform.or(self.color_transform),
            blend_mode: update.blend_mode.unwrap_or(self.blend_mode),
            filters: update.filters.unwrap_or_else(|| self.filters.clone()),
            name: update.name.or_else(|| self.name.clone()),
            clip_depth: update.clip_depth.or(self.clip_depth),
            ratio: update.ratio.or(self.ratio),
            cache_as_bitmap: update.cache_as_bitmap.unwrap_or(self.cache_as_bitmap),
            placed_in_frame: self.placed_in_frame,
        }
    }

    pub fn is_mask(&self) -> bool {
        self.clip_depth.is_some()
    }

    /// Maps the character's own bounds into the parent's space.
    pub fn bounds_in_parent(&self, local: Rect) -> Rect {
        self.transform.transform_rect_bbox(local)
    }
}
