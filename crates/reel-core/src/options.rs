//! Construction policies.
//!
//! The format leaves a few situations up to the player. Each one is a field
//! of [`TimelineOptions`], so callers can match whichever player they need to
//! agree with. Options deserialize from JSON with every field optional.

use serde::{Deserialize, Serialize};

/// What to do when a frame label is used by more than one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateLabelPolicy {
    /// The label resolves to the last frame that carries it.
    #[default]
    LastWins,
    /// The label resolves to the first frame that carries it.
    FirstWins,
    /// Construction fails with `SemanticError::DuplicateLabel`.
    Reject,
}

/// What to do when a `PlaceUpdate` targets an empty depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingDepthPolicy {
    /// Construction fails with `SemanticError::MissingDepth`.
    #[default]
    Error,
    /// The update is skipped with a warning.
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineOptions {
    pub duplicate_labels: DuplicateLabelPolicy,
    pub missing_depth: MissingDepthPolicy,
    /// Name of the scene synthesized for a top-level timeline without scene
    /// metadata.
    pub implicit_scene_name: String,
}

impl Default for TimelineOptions {
    fn default() -> Self {
        Self {
            duplicate_labels: DuplicateLabelPolicy::default(),
            missing_depth: MissingDepthPolicy::default(),
            implicit_scene_name: "Scene 1".to_string(),
        }
    }
}

impl TimelineOptions {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
