#![forbid(unsafe_code)]

//! Dealflow public facade crate.
//!
//! Re-exports the board model, reducer, and runtime from the internal
//! crates, and ships the `dealflow-replay` tool for scripted gesture runs.

pub mod cli;
pub mod error;
pub mod replay;

// --- Core re-exports -------------------------------------------------------

pub use dealflow_core::{
    BoardConfig, BoardFilter, CommitOutcome, ConfigError, DateRange, Deal, DealId, DragSession,
    DropTarget, Location, MoveKind, NotificationConfig, Stage, StageCollection, StageId,
    VisibilityConfig, VisibilityWindow, locate, locate_stage, move_item,
};

// --- Runtime re-exports ----------------------------------------------------

pub use dealflow_runtime::{
    BoardView, Cmd, ColumnView, GatewayError, InMemoryPipelineStore, Model, Msg, Notification,
    NotificationLevel, NotificationLog, NotificationSink, PersistenceGateway,
    PipelineBoard, PipelineSource, ProgramSimulator, TaskMode,
};

// --- Errors ---------------------------------------------------------------

pub use error::{Error, Result};

pub use cli::run_from_env;

pub mod prelude {
    pub use crate::{
        BoardConfig, BoardFilter, Deal, DealId, DropTarget, Error, Model, Msg, PipelineBoard,
        ProgramSimulator, Result, Stage, StageCollection,
    };

    pub use crate::{core, runtime};
}

pub use dealflow_core as core;
pub use dealflow_runtime as runtime;
