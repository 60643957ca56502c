#![forbid(unsafe_code)]

//! Reload orchestration.
//!
//! Every wholesale replacement of the board (initial load, manual reload,
//! rollback after a rejected move) goes through [`RollbackController`]. Each
//! request bumps a load generation; only the result of the newest request is
//! applied, so a slow fetch can never overwrite a fresher one.

use std::fmt;
use std::sync::Arc;

use dealflow_core::{DealId, StageCollection};

use crate::gateway::{GatewayError, PipelineSource};
use crate::program::Cmd;

/// Why a fetch was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadReason {
    Initial,
    Manual,
    /// The remote store rejected a move of this deal.
    Rollback { deal_id: DealId },
}

impl fmt::Display for ReloadReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initial => f.write_str("initial"),
            Self::Manual => f.write_str("manual"),
            Self::Rollback { deal_id } => write!(f, "rollback({deal_id})"),
        }
    }
}

/// Outcome of one fetch, tagged with the generation that issued it.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    pub generation: u64,
    pub reason: ReloadReason,
    pub result: Result<StageCollection, GatewayError>,
}

/// Issues fetches and filters out stale results.
pub struct RollbackController {
    source: Arc<dyn PipelineSource>,
    generation: u64,
    applied: u64,
}

impl fmt::Debug for RollbackController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RollbackController")
            .field("generation", &self.generation)
            .field("applied", &self.applied)
            .finish_non_exhaustive()
    }
}

impl RollbackController {
    pub fn new(source: Arc<dyn PipelineSource>) -> Self {
        Self {
            source,
            generation: 0,
            applied: 0,
        }
    }

    /// Generation of the newest request.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a request newer than the last accepted result is outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.generation > self.applied
    }

    /// Issue a fetch. `wrap` turns the result into the model's message.
    pub fn request<M, F>(&mut self, reason: ReloadReason, wrap: F) -> Cmd<M>
    where
        M: Send + 'static,
        F: FnOnce(FetchResult) -> M + Send + 'static,
    {
        self.generation += 1;
        let generation = self.generation;
        let source = Arc::clone(&self.source);
        tracing::debug!(
            target: "dealflow.rollback",
            generation,
            reason = %reason,
            "pipeline fetch requested"
        );
        Cmd::task_named("fetch-pipeline", move || {
            wrap(FetchResult {
                generation,
                reason,
                result: source.fetch_pipeline(),
            })
        })
    }

    /// Decide whether a result should be applied. Stale generations are
    /// rejected.
    pub fn accept(&mut self, fetched: &FetchResult) -> bool {
        if fetched.generation != self.generation {
            tracing::debug!(
                target: "dealflow.rollback",
                generation = fetched.generation,
                latest = self.generation,
                reason = %fetched.reason,
                "stale pipeline fetch discarded"
            );
            return false;
        }
        self.applied = fetched.generation;
        true
    }
}
