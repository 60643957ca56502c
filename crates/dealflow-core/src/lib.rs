#![forbid(unsafe_code)]

//! Dealflow Core
//!
//! Pure data and transitions for a drag-and-drop sales pipeline board.
//!
//! # Key Components
//!
//! - [`StageCollection`] - Immutable, copy-on-write snapshot of the board
//! - [`locate`] / [`locate_stage`] - Resolve deals and columns for drag events
//! - [`DragSession`] - Idle/dragging lifecycle with ground-truth capture
//! - [`reducer::preview`] / [`reducer::commit`] - Optimistic transitions
//! - [`BoardFilter`] - Read-only filter composition for rendering
//! - [`VisibilityWindow`] - Per-stage lazy-rendering caps
//! - [`BoardConfig`] - Serde-backed configuration
//!
//! # Role in Dealflow
//! Nothing here performs I/O beyond config loading. `dealflow-runtime`
//! threads these functions through its update loop and owns persistence,
//! notifications, and rollback.

pub mod config;
pub mod error;
pub mod filter;
pub mod locate;
pub mod model;
pub mod reducer;
pub mod session;
pub mod visibility;

pub use config::{BoardConfig, NotificationConfig, VisibilityConfig};
pub use error::ConfigError;
pub use filter::{BoardFilter, DateRange, FilteredStage, normalize_stage_name};
pub use locate::{Location, locate, locate_stage};
pub use model::{Deal, DealId, Stage, StageCollection, StageId, sum_amounts};
pub use reducer::{CommitOutcome, DropTarget, MoveKind, move_item};
pub use session::{ActiveDrag, DragSession};
pub use visibility::{RenderSet, VisibilityWindow};
