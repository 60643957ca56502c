#![forbid(unsafe_code)]

//! Location resolution for drag events.
//!
//! Called once or twice per pointer-move and pointer-up, so the scan is a
//! plain stage-by-stage walk that stops at the first match. Not finding an
//! id is an ordinary outcome (the deal may have been filtered away or
//! replaced by a reload) and is reported as `None`.

use crate::filter::normalize_stage_name;
use crate::model::{DealId, StageCollection};

/// Position of a deal on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub stage_index: usize,
    pub item_index: usize,
}

impl Location {
    #[must_use]
    pub const fn new(stage_index: usize, item_index: usize) -> Self {
        Self {
            stage_index,
            item_index,
        }
    }
}

/// Find the stage and position of `id`.
#[must_use]
pub fn locate(collection: &StageCollection, id: &DealId) -> Option<Location> {
    collection
        .stages()
        .iter()
        .enumerate()
        .find_map(|(stage_index, stage)| {
            stage
                .position(id)
                .map(|item_index| Location::new(stage_index, item_index))
        })
}

/// Resolve a column drop target by stage name: exact match first, then the
/// normalized comparison.
#[must_use]
pub fn locate_stage(collection: &StageCollection, name: &str) -> Option<usize> {
    let stages = collection.stages();
    if let Some(index) = stages.iter().position(|stage| stage.name == name) {
        return Some(index);
    }
    let wanted = normalize_stage_name(name);
    stages
        .iter()
        .position(|stage| normalize_stage_name(&stage.name) == wanted)
}
