use crate::timeline::SpriteTimeline;
use kurbo::Rect;
use std::collections::HashMap;
use std::sync::Arc;

/// Character lookup provided by the owning movie.
///
/// Timelines refer to characters by library identifier only. The library is
/// passed in wherever a definition must be resolved and is never retained,
/// so a timeline cannot keep its movie alive.
pub trait CharacterLibrary {
    /// Bounds of the character in its own coordinate space, or `None` when
    /// the character is unknown or has no extent.
    fn character_bounds(&self, character_id: u16) -> Option<Rect>;
}

/// A character definition as far as timelines are concerned.
#[derive(Debug, Clone)]
pub enum Character {
    /// Any leaf definition (shape, text, bitmap, ...) with fixed bounds.
    Shape { bounds: Rect },
    Sprite(Arc<SpriteTimeline>),
}

impl Character {
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            Character::Shape { bounds } => Some(*bounds),
            Character::Sprite(sprite) => sprite.render_bounds(),
        }
    }
}

/// In-memory character table keyed by library identifier.
#[derive(Debug, Default)]
pub struct Library {
    characters: HashMap<u16, Character>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, character_id: u16, character: Character) -> Option<Character> {
        self.characters.insert(character_id, character)
    }

    pub fn insert_shape(&mut self, character_id: u16, bounds: Rect) {
        self.insert(character_id, Character::Shape { bounds });
    }

    /// Registers a built sprite under its own library identifier.
    pub fn insert_sprite(&mut self, sprite: Arc<SpriteTimeline>) {
        self.insert(sprite.library_id(), Character::Sprite(sprite));
    }

    pub fn get(&self, character_id: u16) -> Option<&Character> {
        self.characters.get(&character_id)
    }

    pub fn sprite(&self, character_id: u16) -> Option<&Arc<SpriteTimeline>> {
        match self.characters.get(&character_id)? {
            Character::Sprite(sprite) => Some(sprite),
            Character::Shape { .. } => None,
        }
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}

impl CharacterLibrary for Library {
    fn character_bounds(&self, character_id: u16) -> Option<Rect> {
        self.characters.get(&character_id)?.bounds()
    }
}
