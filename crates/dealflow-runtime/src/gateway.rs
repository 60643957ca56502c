#![forbid(unsafe_code)]

//! Remote store contracts and an in-memory implementation.
//!
//! [`PersistenceGateway`] is the only write path: one call per cross-stage
//! move, carrying the destination stage *name*. [`PipelineSource`] is the
//! read path used for the initial load, manual reloads, and rollback.
//! Both are blocking; the board runs them inside `Cmd::Task`.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use thiserror::Error;

use dealflow_core::{DealId, StageCollection, locate, locate_stage, move_item};

/// Failures reported by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("stage update rejected for deal {deal_id}: {reason}")]
    Rejected { deal_id: DealId, reason: String },

    #[error("unknown deal: {0}")]
    UnknownDeal(DealId),

    #[error("unknown stage: {0}")]
    UnknownStage(String),

    #[error("pipeline fetch failed: {0}")]
    FetchFailed(String),
}

/// Write path: move a deal to a stage by name.
pub trait PersistenceGateway: Send + Sync {
    fn update_stage(&self, deal_id: &DealId, stage: &str) -> Result<(), GatewayError>;
}

/// Read path: the full pipeline as the server sees it.
pub trait PipelineSource: Send + Sync {
    fn fetch_pipeline(&self) -> Result<StageCollection, GatewayError>;
}

/// A recorded `update_stage` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageUpdate {
    pub deal_id: DealId,
    pub stage: String,
    pub accepted: bool,
}

#[derive(Debug, Default)]
struct StoreState {
    pipeline: StageCollection,
    reject_deals: HashSet<DealId>,
    reject_all: bool,
    fail_fetches: bool,
    updates: Vec<StageUpdate>,
    fetches: usize,
}

/// Server stand-in with failure injection and call recording.
///
/// Accepted updates are applied to the stored pipeline (the deal is
/// appended to the destination stage), so a later fetch reflects them.
#[derive(Debug, Default)]
pub struct InMemoryPipelineStore {
    state: Mutex<StoreState>,
}

impl InMemoryPipelineStore {
    #[must_use]
    pub fn new(pipeline: StageCollection) -> Self {
        Self {
            state: Mutex::new(StoreState {
                pipeline,
                ..StoreState::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reject every future update for `deal_id`.
    pub fn reject_updates_for(&self, deal_id: impl Into<DealId>) {
        self.state().reject_deals.insert(deal_id.into());
    }

    /// Reject (or stop rejecting) every future update.
    pub fn reject_all_updates(&self, reject: bool) {
        self.state().reject_all = reject;
    }

    /// Make future fetches fail (or succeed again).
    pub fn fail_fetches(&self, fail: bool) {
        self.state().fail_fetches = fail;
    }

    /// Replace the server-side pipeline, as another client would.
    pub fn set_pipeline(&self, pipeline: StageCollection) {
        self.state().pipeline = pipeline;
    }

    #[must_use]
    pub fn pipeline(&self) -> StageCollection {
        self.state().pipeline.clone()
    }

    /// Every `update_stage` call in arrival order.
    #[must_use]
    pub fn updates(&self) -> Vec<StageUpdate> {
        self.state().updates.clone()
    }

    #[must_use]
    pub fn update_count(&self) -> usize {
        self.state().updates.len()
    }

    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.state().fetches
    }
}

impl PersistenceGateway for InMemoryPipelineStore {
    fn update_stage(&self, deal_id: &DealId, stage: &str) -> Result<(), GatewayError> {
        let mut state = self.state();
        let rejected = state.reject_all || state.reject_deals.contains(deal_id);
        let result = if rejected {
            Err(GatewayError::Rejected {
                deal_id: deal_id.clone(),
                reason: "injected failure".into(),
            })
        } else {
            apply_update(&state.pipeline, deal_id, stage).map(|next| {
                state.pipeline = next;
            })
        };
        state.updates.push(StageUpdate {
            deal_id: deal_id.clone(),
            stage: stage.to_string(),
            accepted: result.is_ok(),
        });
        result
    }
}

impl PipelineSource for InMemoryPipelineStore {
    fn fetch_pipeline(&self) -> Result<StageCollection, GatewayError> {
        let mut state = self.state();
        state.fetches += 1;
        if state.fail_fetches {
            return Err(GatewayError::FetchFailed("injected failure".into()));
        }
        Ok(state.pipeline.clone())
    }
}

fn apply_update(
    pipeline: &StageCollection,
    deal_id: &DealId,
    stage: &str,
) -> Result<StageCollection, GatewayError> {
    let from = locate(pipeline, deal_id).ok_or_else(|| GatewayError::UnknownDeal(deal_id.clone()))?;
    let to = locate_stage(pipeline, stage).ok_or_else(|| GatewayError::UnknownStage(stage.into()))?;
    if from.stage_index == to {
        return Ok(pipeline.clone());
    }
    let end = pipeline.stage(to).map_or(0, |stage| stage.len());
    move_item(pipeline, from, to, end).ok_or_else(|| GatewayError::UnknownDeal(deal_id.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealflow_core::{Deal, Stage};

    fn store() -> InMemoryPipelineStore {
        InMemoryPipelineStore::new(StageCollection::new(vec![
            Stage::new("s1", "Prospect", vec![Deal::new("D1", "one", 10.0)]),
            Stage::new("s2", "Qualified", Vec::new()),
        ]))
    }

    #[test]
    fn accepted_update_moves_deal_server_side() {
        let store = store();
        store.update_stage(&"D1".into(), "Qualified").unwrap();
        let pipeline = store.fetch_pipeline().unwrap();
        assert!(pipeline.stage(0).unwrap().is_empty());
        assert_eq!(pipeline.stage(1).unwrap().aggregate_value(), 10.0);
        assert_eq!(store.update_count(), 1);
        assert!(store.updates()[0].accepted);
        assert_eq!(store.fetch_count(), 1);
    }

    #[test]
    fn rejected_update_is_recorded_and_leaves_pipeline() {
        let store = store();
        store.reject_updates_for("D1");
        let err = store.update_stage(&"D1".into(), "Qualified").unwrap_err();
        assert!(matches!(err, GatewayError::Rejected { .. }));
        assert_eq!(store.pipeline().stage(0).unwrap().len(), 1);
        assert!(!store.updates()[0].accepted);
    }

    #[test]
    fn unknown_deal_and_stage_are_errors() {
        let store = store();
        assert_eq!(
            store.update_stage(&"D9".into(), "Qualified"),
            Err(GatewayError::UnknownDeal("D9".into()))
        );
        assert_eq!(
            store.update_stage(&"D1".into(), "Lost"),
            Err(GatewayError::UnknownStage("Lost".into()))
        );
    }

    #[test]
    fn fetch_failure_injection() {
        let store = store();
        store.fail_fetches(true);
        assert!(store.fetch_pipeline().is_err());
        store.fail_fetches(false);
        assert!(store.fetch_pipeline().is_ok());
        assert_eq!(store.fetch_count(), 2);
    }
}
