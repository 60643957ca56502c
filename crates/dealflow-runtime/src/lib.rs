#![forbid(unsafe_code)]

//! Dealflow Runtime
//!
//! Runs a pipeline board: applies drag events optimistically, syncs
//! cross-stage moves to a remote store, and rolls back by reloading when
//! the store rejects a move.
//!
//! # Key Components
//!
//! - [`PipelineBoard`] - The board [`Model`] and its [`Msg`] events
//! - [`Cmd`] - Side effects returned from `update`
//! - [`ProgramSimulator`] - Deterministic driver with deferrable tasks
//! - [`PersistenceGateway`] / [`PipelineSource`] - Remote store contracts
//! - [`RollbackController`] - Generation-tracked reloads
//! - [`NotificationSink`] - Where user-facing messages go
//! - [`logging::init`] - Subscriber setup for binaries

pub mod board;
pub mod gateway;
pub mod logging;
pub mod notify;
pub mod program;
pub mod rollback;
pub mod simulator;
pub mod view;

pub use board::{Msg, PipelineBoard};
pub use gateway::{
    GatewayError, InMemoryPipelineStore, PersistenceGateway, PipelineSource, StageUpdate,
};
pub use logging::LogFormat;
pub use notify::{Notification, NotificationLevel, NotificationLog, NotificationSink};
pub use program::{Cmd, Model, TaskSpec};
pub use rollback::{FetchResult, ReloadReason, RollbackController};
pub use simulator::{ProgramSimulator, TaskMode};
pub use view::{BoardView, ColumnView};
