//! Scene partitioning for top-level timelines.
//!
//! Scene metadata lists each scene's name and 0-based starting frame. The
//! indexer turns that into contiguous ranges that tile the whole frame
//! sequence, and rejects metadata that leaves gaps or overlaps.

use crate::error::SemanticError;
use reel_data::model::SceneLabelData;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::ops::Range;

/// A named, contiguous range of frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scene {
    name: String,
    index: usize,
    first_frame: usize,
    frame_count: usize,
}

impl Scene {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position of the scene in the movie's scene list.
    pub fn index(&self) -> usize {
        self.index
    }

    /// 1-based number of the scene's first frame.
    pub fn start_index1(&self) -> usize {
        self.first_frame + 1
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// 0-based frame positions covered by the scene.
    pub fn range(&self) -> Range<usize> {
        self.first_frame..self.first_frame + self.frame_count
    }
}

/// Scenes in order plus the name lookup.
#[derive(Debug, Default)]
pub struct SceneIndex {
    pub(crate) scenes: Vec<Scene>,
    pub(crate) by_name: HashMap<String, usize>,
}

impl SceneIndex {
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn get(&self, name: &str) -> Option<&Scene> {
        self.by_name.get(name).map(|&i| &self.scenes[i])
    }

    /// The scene containing the 0-based frame position.
    pub fn scene_at(&self, index: usize) -> Option<&Scene> {
        let after = self.scenes.partition_point(|scene| scene.first_frame <= index);
        after
            .checked_sub(1)
            .map(|i| &self.scenes[i])
            .filter(|scene| scene.range().contains(&index))
    }
}

pub struct SceneIndexer;

impl SceneIndexer {
    /// Partitions `frame_count` frames according to `data`.
    ///
    /// Offsets must start at 0, increase strictly and stay below
    /// `frame_count`; each scene then runs up to the next one's start, the
    /// last to the end of the timeline.
    pub fn index(data: &SceneLabelData, frame_count: usize) -> Result<SceneIndex, SemanticError> {
        Self::check_names(data)?;
        let mut index = SceneIndex::default();
        let mut expected_start = 0usize;

        for (i, entry) in data.scenes.iter().enumerate() {
            let start = entry.offset as usize;
            let valid = if i == 0 {
                start == 0
            } else {
                start > expected_start
            };
            if !valid || start >= frame_count {
                return Err(SemanticError::SceneOffset {
                    name: entry.name.clone(),
                    offset: entry.offset,
                    frame_count,
                });
            }
            expected_start = start;

            let end = data
                .scenes
                .get(i + 1)
                .map(|next| (next.offset as usize).min(frame_count))
                .unwrap_or(frame_count);

            index.by_name.insert(entry.name.clone(), i);
            index.scenes.push(Scene {
                name: entry.name.clone(),
                index: i,
                first_frame: start,
                frame_count: end.saturating_sub(start),
            });
        }

        Ok(index)
    }

    /// Rejects metadata naming the same scene twice. Independent of the
    /// frame count, so it also applies to timelines without frames.
    pub fn check_names(data: &SceneLabelData) -> Result<(), SemanticError> {
        let mut seen = HashSet::with_capacity(data.scenes.len());
        for entry in &data.scenes {
            if !seen.insert(entry.name.as_str()) {
                return Err(SemanticError::DuplicateScene(entry.name.clone()));
            }
        }
        Ok(())
    }

    /// A single scene spanning every frame.
    pub fn single(name: &str, frame_count: usize) -> SceneIndex {
        let mut index = SceneIndex::default();
        index.by_name.insert(name.to_string(), 0);
        index.scenes.push(Scene {
            name: name.to_string(),
            index: 0,
            first_frame: 0,
            frame_count,
        });
        index
    }
}
