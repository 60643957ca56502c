#![forbid(unsafe_code)]

//! Drag session lifecycle.
//!
//! ```text
//!   Idle ──start──▶ Dragging ──finish──▶ Idle
//!                    │   ▲
//!                    └───┘ set_working / rebase
//! ```
//!
//! While dragging, the session owns two snapshots: the *ground truth* taken
//! at drag start (the rollback point for an abort and the reference for
//! commit classification) and the *working* collection the previews mutate.
//! At most one drag exists at a time. Hovers that name a different deal than
//! the active one are ignored by the caller via [`DragSession::is_active`];
//! a release always ends the session.

use crate::locate::{Location, locate};
use crate::model::{DealId, StageCollection};

/// State captured for the duration of one drag gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveDrag {
    pub deal: DealId,
    /// Where the deal was when the drag started.
    pub origin: Location,
    /// Snapshot at drag start (or at the last rebase).
    pub ground_truth: StageCollection,
    /// Preview state shown while the pointer moves.
    pub working: StageCollection,
}

/// At most one in-flight drag.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragSession {
    #[default]
    Idle,
    Dragging(ActiveDrag),
}

impl DragSession {
    #[must_use]
    pub fn new() -> Self {
        Self::Idle
    }

    /// Begin dragging `deal` from the `committed` collection.
    ///
    /// A start while already dragging replaces the previous gesture. Returns
    /// `false` (and stays idle) if the deal is not on the board.
    pub fn start(&mut self, deal: DealId, committed: &StageCollection) -> bool {
        let Some(origin) = locate(committed, &deal) else {
            tracing::debug!(
                target: "dealflow.session",
                deal_id = %deal,
                "drag start ignored: deal not on board"
            );
            *self = Self::Idle;
            return false;
        };
        if let Self::Dragging(previous) = self {
            tracing::debug!(
                target: "dealflow.session",
                previous = %previous.deal,
                deal_id = %deal,
                "drag restarted"
            );
        }
        *self = Self::Dragging(ActiveDrag {
            deal,
            origin,
            ground_truth: committed.clone(),
            working: committed.clone(),
        });
        true
    }

    #[must_use]
    pub fn active(&self) -> Option<&ActiveDrag> {
        match self {
            Self::Dragging(drag) => Some(drag),
            Self::Idle => None,
        }
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging(_))
    }

    #[must_use]
    pub fn dragged_id(&self) -> Option<&DealId> {
        self.active().map(|drag| &drag.deal)
    }

    /// Whether `deal` is the deal currently being dragged.
    #[must_use]
    pub fn is_active(&self, deal: &DealId) -> bool {
        self.dragged_id() == Some(deal)
    }

    /// Collection to render: the working copy while dragging, else `committed`.
    #[must_use]
    pub fn visible<'a>(&'a self, committed: &'a StageCollection) -> &'a StageCollection {
        match self {
            Self::Dragging(drag) => &drag.working,
            Self::Idle => committed,
        }
    }

    /// Replace the working collection. No-op when idle.
    pub fn set_working(&mut self, working: StageCollection) {
        if let Self::Dragging(drag) = self {
            drag.working = working;
        }
    }

    /// End the gesture unconditionally, returning what was captured.
    pub fn finish(&mut self) -> Option<ActiveDrag> {
        match std::mem::take(self) {
            Self::Dragging(drag) => Some(drag),
            Self::Idle => None,
        }
    }

    /// A fresh collection replaced the committed one mid-drag.
    ///
    /// Both snapshots restart from `fresh`, discarding the preview. If the
    /// dragged deal is gone from `fresh` the session ends.
    pub fn rebase(&mut self, fresh: &StageCollection) {
        let Self::Dragging(drag) = self else {
            return;
        };
        match locate(fresh, &drag.deal) {
            Some(origin) => {
                drag.origin = origin;
                drag.ground_truth = fresh.clone();
                drag.working = fresh.clone();
            }
            None => {
                tracing::debug!(
                    target: "dealflow.session",
                    deal_id = %drag.deal,
                    "drag cancelled: deal vanished on reload"
                );
                *self = Self::Idle;
            }
        }
    }
}
