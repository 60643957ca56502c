#![forbid(unsafe_code)]

//! Scripted gesture replay against an in-memory store.
//!
//! A script is a JSON document listing board events:
//!
//! ```json
//! {
//!   "steps": [
//!     { "op": "drag", "deal": "D1", "hover": [{ "kind": "column", "id": "Won" }],
//!       "drop": { "kind": "column", "id": "Won" } },
//!     { "op": "filter", "filter": { "search": "acme" } },
//!     { "op": "load_more", "stage": "prospect" },
//!     { "op": "settle" }
//!   ]
//! }
//! ```
//!
//! With `deferred` set, background tasks stay parked until a `settle` or
//! `run_task` step, which makes the optimistic window and out-of-order
//! resolution observable in the report.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use dealflow_core::{BoardConfig, BoardFilter, DealId, DropTarget, StageCollection, StageId};
use dealflow_runtime::{
    BoardView, InMemoryPipelineStore, Msg, Notification, NotificationLog, PipelineBoard,
    ProgramSimulator, StageUpdate, TaskMode,
};

use crate::error::{Error, Result};

/// One scripted action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// A whole gesture: start, hover each target in turn, then release.
    Drag {
        deal: DealId,
        #[serde(default)]
        hover: Vec<DropTarget>,
        #[serde(default)]
        drop: Option<DropTarget>,
    },
    Start {
        deal: DealId,
    },
    Over {
        deal: DealId,
        #[serde(default)]
        target: Option<DropTarget>,
    },
    End {
        deal: DealId,
        #[serde(default)]
        target: Option<DropTarget>,
    },
    Cancel,
    LoadMore {
        stage: StageId,
    },
    Filter {
        #[serde(default)]
        filter: BoardFilter,
    },
    Reload,
    /// Run every parked task.
    Settle,
    /// Run one parked task by position (0 = oldest).
    RunTask {
        index: usize,
    },
}

impl Step {
    fn into_msgs(self) -> Vec<Msg> {
        match self {
            Self::Drag { deal, hover, drop } => {
                let mut msgs = vec![Msg::DragStart(deal.clone())];
                msgs.extend(hover.into_iter().map(|target| Msg::DragOver {
                    active: deal.clone(),
                    over: Some(target),
                }));
                msgs.push(Msg::DragEnd {
                    active: deal,
                    over: drop,
                });
                msgs
            }
            Self::Start { deal } => vec![Msg::DragStart(deal)],
            Self::Over { deal, target } => vec![Msg::DragOver {
                active: deal,
                over: target,
            }],
            Self::End { deal, target } => vec![Msg::DragEnd {
                active: deal,
                over: target,
            }],
            Self::Cancel => vec![Msg::DragCancel],
            Self::LoadMore { stage } => vec![Msg::LoadMore(stage)],
            Self::Filter { filter } => vec![Msg::SetFilter(filter)],
            Self::Reload => vec![Msg::Reload],
            Self::Settle | Self::RunTask { .. } => Vec::new(),
        }
    }
}

/// A replay script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

/// Store behavior for a replay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayOptions {
    /// Deals whose stage updates the store rejects.
    pub reject: Vec<DealId>,
    pub fail_fetches: bool,
    /// Park background tasks until `settle` / `run_task`.
    pub deferred: bool,
}

/// Final state after a replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub board: BoardView,
    pub committed: StageCollection,
    pub server: StageCollection,
    pub notifications: Vec<Notification>,
    pub updates: Vec<StageUpdate>,
    pub fetches: usize,
    /// Tasks still parked when the script ended.
    pub pending_tasks: Vec<String>,
}

/// Run `script` against a store seeded with `pipeline`.
pub fn replay(
    pipeline: StageCollection,
    config: BoardConfig,
    script: Script,
    options: &ReplayOptions,
) -> Result<ReplayReport> {
    let store = Arc::new(InMemoryPipelineStore::new(pipeline));
    for deal in &options.reject {
        store.reject_updates_for(deal.clone());
    }
    let log = Arc::new(NotificationLog::new());
    let board = PipelineBoard::with_config(store.clone(), store.clone(), log.clone(), config);

    let mut sim = ProgramSimulator::new(board);
    // The initial load always completes so the script starts from data.
    sim.init();
    store.fail_fetches(options.fail_fetches);
    if options.deferred {
        sim.set_task_mode(TaskMode::Deferred);
    }

    for (position, step) in script.steps.into_iter().enumerate() {
        tracing::debug!(target: "dealflow.replay", position, step = ?step, "replaying step");
        match step {
            Step::Settle => {
                sim.run_pending();
            }
            Step::RunTask { index } => {
                if !sim.run_task(index) {
                    return Err(Error::script(format!(
                        "step {position}: no parked task at index {index} ({} parked)",
                        sim.pending_count()
                    )));
                }
            }
            other => sim.send_all(other.into_msgs()),
        }
    }

    let pending_tasks = sim.pending_tasks().into_iter().map(String::from).collect();
    let board = sim.model();
    Ok(ReplayReport {
        board: board.view(),
        committed: board.committed().clone(),
        server: store.pipeline(),
        notifications: log.entries(),
        updates: store.updates(),
        fetches: store.fetch_count(),
        pending_tasks,
    })
}

/// Read and parse a JSON file.
pub(crate) fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })
}
