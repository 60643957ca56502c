#![forbid(unsafe_code)]

//! Optimistic reducer: preview (drag-over) and commit (drag-end).
//!
//! Every operation is a pure function from one [`StageCollection`] snapshot
//! to the next and is built on the single primitive [`move_item`]. Only the
//! source and destination stages are rebuilt; all other stages are shared
//! with the input.
//!
//! # Preview rules
//!
//! | target | same stage as source | other stage |
//! |---|---|---|
//! | column | no change | append to end |
//! | card | no change (reorder deferred to commit) | insert before card |
//!
//! # Commit rules
//!
//! The source is resolved against the *pre-drag* ground truth so the final
//! move is classified by where the deal started, not by where the preview
//! left it.
//!
//! | target | same stage as origin | other stage |
//! |---|---|---|
//! | column | unchanged | append to end |
//! | card | move within array | insert before card |
//!
//! When the pointer ends over the dragged card itself (its previewed slot),
//! the destination is the slot it occupies in the working copy.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::locate::{Location, locate, locate_stage};
use crate::model::{DealId, StageCollection};

/// What the pointer is over when a drag event fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum DropTarget {
    /// A column's empty area or header, identified by stage name.
    Column(String),
    /// Another card, identified by deal id.
    Card(DealId),
}

impl DropTarget {
    #[must_use]
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column(name.into())
    }

    #[must_use]
    pub fn card(id: impl Into<DealId>) -> Self {
        Self::Card(id.into())
    }
}

/// Classification of a committed move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    /// The collection is deep-equal to the ground truth.
    Unchanged,
    /// Same stage, different position. Never persisted.
    Reordered,
    /// The deal changed stage. Persisted.
    CrossStage,
}

impl fmt::Display for MoveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unchanged => "unchanged",
            Self::Reordered => "reordered",
            Self::CrossStage => "cross_stage",
        })
    }
}

/// Result of a drag-end.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitOutcome {
    pub collection: StageCollection,
    pub deal_id: DealId,
    /// Stage name the deal occupied in the pre-drag ground truth.
    pub original_stage: String,
    pub destination_stage: String,
    pub kind: MoveKind,
}

impl CommitOutcome {
    /// Only stage changes reach the persistence gateway.
    #[must_use]
    pub fn needs_persistence(&self) -> bool {
        self.original_stage != self.destination_stage
    }
}

/// Move the deal at `from` to `to_index` within stage `to_stage`.
///
/// Within one stage the index is interpreted after removal (array-move
/// semantics): moving index 2 to index 0 in `[a, b, c]` yields `[c, a, b]`,
/// and moving index 0 to index 2 yields `[b, c, a]`. Insertion indices past
/// the end append. Returns `None` if `from` or `to_stage` do not exist.
#[must_use]
pub fn move_item(
    collection: &StageCollection,
    from: Location,
    to_stage: usize,
    to_index: usize,
) -> Option<StageCollection> {
    let source = collection.stage(from.stage_index)?;
    let destination = collection.stage(to_stage)?;
    if from.item_index >= source.len() {
        return None;
    }

    let mut source_deals = source.deals().to_vec();
    let deal = source_deals.remove(from.item_index);

    if from.stage_index == to_stage {
        if from.item_index == to_index.min(source_deals.len()) {
            return Some(collection.clone());
        }
        let at = to_index.min(source_deals.len());
        source_deals.insert(at, deal);
        let stage = source.with_deals(source_deals);
        return Some(collection.replace_stages([(to_stage, stage)]));
    }

    let mut destination_deals = destination.deals().to_vec();
    let at = to_index.min(destination_deals.len());
    destination_deals.insert(at, deal);
    let source = source.with_deals(source_deals);
    let destination = destination.with_deals(destination_deals);
    Some(collection.replace_stages([(from.stage_index, source), (to_stage, destination)]))
}

/// Compute the preview collection for a drag-over tick.
///
/// `None` means "keep the current working collection": the target is in the
/// same stage, or something could not be resolved.
#[must_use]
pub fn preview(
    working: &StageCollection,
    active: &DealId,
    target: &DropTarget,
) -> Option<StageCollection> {
    let from = locate(working, active)?;
    let next = match target {
        DropTarget::Column(name) => {
            let destination = locate_stage(working, name)?;
            if destination == from.stage_index {
                return None;
            }
            let end = working.stage(destination)?.len();
            move_item(working, from, destination, end)?
        }
        DropTarget::Card(over) => {
            if over == active {
                return None;
            }
            let to = locate(working, over)?;
            if to.stage_index == from.stage_index {
                return None;
            }
            move_item(working, from, to.stage_index, to.item_index)?
        }
    };

    tracing::trace!(
        target: "dealflow.reducer",
        deal_id = %active,
        from_stage = from.stage_index,
        "preview moved deal across stages"
    );
    Some(next)
}

/// Compute the committed collection for a drag-end.
///
/// `ground_truth` is the collection as it was when the drag started;
/// `working` is the live preview. Returns `None` to abort (no target, or the
/// dragged deal or target cannot be resolved): the caller keeps the ground
/// truth and makes no network call.
#[must_use]
pub fn commit(
    ground_truth: &StageCollection,
    working: &StageCollection,
    active: &DealId,
    target: Option<&DropTarget>,
) -> Option<CommitOutcome> {
    let target = target?;
    let from = locate(ground_truth, active)?;
    let original_stage = ground_truth.stage(from.stage_index)?.name.clone();

    let (to_stage, to_index) = match target {
        DropTarget::Column(name) => {
            let destination = locate_stage(ground_truth, name)?;
            if destination == from.stage_index {
                return Some(CommitOutcome {
                    collection: ground_truth.clone(),
                    deal_id: active.clone(),
                    destination_stage: original_stage.clone(),
                    original_stage,
                    kind: MoveKind::Unchanged,
                });
            }
            (destination, ground_truth.stage(destination)?.len())
        }
        DropTarget::Card(over) if over == active => {
            let slot = locate(working, active)?;
            let stage_id = &working.stage(slot.stage_index)?.id;
            (ground_truth.stage_index(stage_id)?, slot.item_index)
        }
        DropTarget::Card(over) => {
            let to = locate(ground_truth, over)?;
            (to.stage_index, to.item_index)
        }
    };

    let collection = move_item(ground_truth, from, to_stage, to_index)?;
    let destination_stage = collection.stage(to_stage)?.name.clone();
    let kind = if to_stage != from.stage_index {
        MoveKind::CrossStage
    } else if collection == *ground_truth {
        MoveKind::Unchanged
    } else {
        MoveKind::Reordered
    };

    tracing::debug!(
        target: "dealflow.reducer",
        deal_id = %active,
        from_stage = %original_stage,
        to_stage = %destination_stage,
        to_index = to_index,
        kind = %kind,
        "drag committed"
    );

    Some(CommitOutcome {
        collection,
        deal_id: active.clone(),
        original_stage,
        destination_stage,
        kind,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::{Deal, Stage};

    fn scenario_a() -> StageCollection {
        StageCollection::new(vec![
            Stage::new(
                "s1",
                "Prospect",
                vec![Deal::new("D1", "one", 100.0), Deal::new("D2", "two", 200.0)],
            ),
            Stage::new("s2", "Qualified", vec![Deal::new("D3", "three", 50.0)]),
            Stage::new("s3", "Won", Vec::new()),
        ])
    }

    fn scenario_b() -> StageCollection {
        StageCollection::new(vec![Stage::new(
            "s1",
            "Prospect",
            vec![
                Deal::new("D1", "one", 1.0),
                Deal::new("D2", "two", 2.0),
                Deal::new("D3", "three", 3.0),
            ],
        )])
    }

    fn ids(collection: &StageCollection, stage: usize) -> Vec<String> {
        collection
            .stage(stage)
            .unwrap()
            .deals()
            .iter()
            .map(|deal| deal.id.to_string())
            .collect()
    }

    // --- move_item ---------------------------------------------------------

    #[test]
    fn move_within_stage_handles_index_shift() {
        let board = scenario_b();
        let back = move_item(&board, Location::new(0, 2), 0, 0).unwrap();
        assert_eq!(ids(&back, 0), ["D3", "D1", "D2"]);
        let forward = move_item(&board, Location::new(0, 0), 0, 2).unwrap();
        assert_eq!(ids(&forward, 0), ["D2", "D3", "D1"]);
        let middle = move_item(&board, Location::new(0, 0), 0, 1).unwrap();
        assert_eq!(ids(&middle, 0), ["D2", "D1", "D3"]);
    }

    #[test]
    fn move_to_same_slot_is_deep_equal() {
        let board = scenario_b();
        let same = move_item(&board, Location::new(0, 1), 0, 1).unwrap();
        assert_eq!(same, board);
    }

    #[test]
    fn move_across_stages_clamps_insert_index() {
        let board = scenario_a();
        let moved = move_item(&board, Location::new(0, 0), 1, 99).unwrap();
        assert_eq!(ids(&moved, 0), ["D2"]);
        assert_eq!(ids(&moved, 1), ["D3", "D1"]);
    }

    #[test]
    fn move_item_rejects_invalid_locations() {
        let board = scenario_a();
        assert!(move_item(&board, Location::new(9, 0), 1, 0).is_none());
        assert!(move_item(&board, Location::new(0, 5), 1, 0).is_none());
        assert!(move_item(&board, Location::new(0, 0), 9, 0).is_none());
    }

    #[test]
    fn move_item_shares_untouched_stages() {
        let board = scenario_a();
        let moved = move_item(&board, Location::new(0, 0), 1, 0).unwrap();
        assert!(Arc::ptr_eq(&board.stages()[2], &moved.stages()[2]));
        assert!(!Arc::ptr_eq(&board.stages()[0], &moved.stages()[0]));
        assert!(!Arc::ptr_eq(&board.stages()[1], &moved.stages()[1]));
    }

    // --- preview -----------------------------------------------------------

    #[test]
    fn preview_column_appends() {
        let board = scenario_a();
        let next = preview(&board, &"D1".into(), &DropTarget::column("Qualified")).unwrap();
        assert_eq!(ids(&next, 0), ["D2"]);
        assert_eq!(ids(&next, 1), ["D3", "D1"]);
    }

    #[test]
    fn preview_card_in_other_stage_inserts_before() {
        let board = scenario_a();
        let next = preview(&board, &"D2".into(), &DropTarget::card("D3")).unwrap();
        assert_eq!(ids(&next, 0), ["D1"]);
        assert_eq!(ids(&next, 1), ["D2", "D3"]);
    }

    #[test]
    fn preview_same_stage_is_noop() {
        let board = scenario_b();
        assert!(preview(&board, &"D3".into(), &DropTarget::card("D1")).is_none());
        assert!(preview(&board, &"D3".into(), &DropTarget::column("Prospect")).is_none());
        assert!(preview(&board, &"D3".into(), &DropTarget::card("D3")).is_none());
    }

    #[test]
    fn preview_unresolvable_is_noop() {
        let board = scenario_a();
        assert!(preview(&board, &"ghost".into(), &DropTarget::column("Won")).is_none());
        assert!(preview(&board, &"D1".into(), &DropTarget::column("Lost")).is_none());
        assert!(preview(&board, &"D1".into(), &DropTarget::card("ghost")).is_none());
    }

    // --- commit ------------------------------------------------------------

    #[test]
    fn scenario_a_column_drop_appends_and_updates_totals() {
        let board = scenario_a();
        let target = DropTarget::column("Qualified");
        let outcome = commit(&board, &board, &"D1".into(), Some(&target)).unwrap();
        assert_eq!(ids(&outcome.collection, 0), ["D2"]);
        assert_eq!(ids(&outcome.collection, 1), ["D3", "D1"]);
        assert_eq!(outcome.collection.stage(0).unwrap().aggregate_value(), 200.0);
        assert_eq!(outcome.collection.stage(1).unwrap().aggregate_value(), 150.0);
        assert_eq!(outcome.kind, MoveKind::CrossStage);
        assert_eq!(outcome.original_stage, "Prospect");
        assert_eq!(outcome.destination_stage, "Qualified");
        assert!(outcome.needs_persistence());
    }

    #[test]
    fn scenario_b_card_drop_reorders_without_persistence() {
        let board = scenario_b();
        let target = DropTarget::card("D1");
        let outcome = commit(&board, &board, &"D3".into(), Some(&target)).unwrap();
        assert_eq!(ids(&outcome.collection, 0), ["D3", "D1", "D2"]);
        assert_eq!(outcome.kind, MoveKind::Reordered);
        assert!(!outcome.needs_persistence());
    }

    #[test]
    fn commit_without_target_aborts() {
        let board = scenario_a();
        assert!(commit(&board, &board, &"D1".into(), None).is_none());
    }

    #[test]
    fn commit_on_own_column_is_unchanged() {
        let board = scenario_a();
        let target = DropTarget::column("Prospect");
        let outcome = commit(&board, &board, &"D2".into(), Some(&target)).unwrap();
        assert_eq!(outcome.kind, MoveKind::Unchanged);
        assert_eq!(outcome.collection, board);
        assert!(!outcome.needs_persistence());
    }

    #[test]
    fn commit_classifies_against_ground_truth_after_preview() {
        let truth = scenario_a();
        // Preview moved D1 into Qualified; the pointer ends over D1's new slot.
        let working = preview(&truth, &"D1".into(), &DropTarget::card("D3")).unwrap();
        let target = DropTarget::card("D1");
        let outcome = commit(&truth, &working, &"D1".into(), Some(&target)).unwrap();
        assert_eq!(outcome.kind, MoveKind::CrossStage);
        assert_eq!(outcome.collection, working);
        assert_eq!(outcome.original_stage, "Prospect");
        assert_eq!(outcome.destination_stage, "Qualified");
    }

    #[test]
    fn commit_on_own_card_without_preview_is_identity() {
        let board = scenario_b();
        let target = DropTarget::card("D2");
        let outcome = commit(&board, &board, &"D2".into(), Some(&target)).unwrap();
        assert_eq!(outcome.kind, MoveKind::Unchanged);
        assert_eq!(outcome.collection, board);
    }

    #[test]
    fn commit_card_in_other_stage_inserts_before() {
        let board = scenario_a();
        let target = DropTarget::card("D3");
        let outcome = commit(&board, &board, &"D2".into(), Some(&target)).unwrap();
        assert_eq!(ids(&outcome.collection, 0), ["D1"]);
        assert_eq!(ids(&outcome.collection, 1), ["D2", "D3"]);
        assert_eq!(outcome.kind, MoveKind::CrossStage);
    }

    #[test]
    fn commit_onto_empty_column() {
        let board = scenario_a();
        let target = DropTarget::column("won");
        let outcome = commit(&board, &board, &"D3".into(), Some(&target)).unwrap();
        assert_eq!(ids(&outcome.collection, 2), ["D3"]);
        assert!(outcome.collection.stage(1).unwrap().is_empty());
        assert_eq!(outcome.collection.stage(1).unwrap().aggregate_value(), 0.0);
        assert_eq!(outcome.destination_stage, "Won");
    }

    #[test]
    fn commit_with_vanished_deal_aborts() {
        let board = scenario_a();
        let target = DropTarget::column("Won");
        assert!(commit(&board, &board, &"ghost".into(), Some(&target)).is_none());
        let target = DropTarget::card("ghost");
        assert!(commit(&board, &board, &"D1".into(), Some(&target)).is_none());
    }

    #[test]
    fn drop_target_serializes_tagged() {
        let json = serde_json::to_string(&DropTarget::column("Won")).unwrap();
        assert_eq!(json, r#"{"kind":"column","id":"Won"}"#);
        let parsed: DropTarget = serde_json::from_str(r#"{"kind":"card","id":"D1"}"#).unwrap();
        assert_eq!(parsed, DropTarget::card("D1"));
    }
}
