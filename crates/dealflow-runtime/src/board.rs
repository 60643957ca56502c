#![forbid(unsafe_code)]

//! The pipeline board model.
//!
//! [`PipelineBoard`] owns the committed [`StageCollection`], the drag
//! session, the active filter, and the visibility caps. It is driven by
//! [`Msg`] values from the gesture layer and by the results of its own
//! background tasks.
//!
//! # Lifecycle of a move
//!
//! 1. `DragStart` captures the committed collection as ground truth.
//! 2. `DragOver` replaces the session's working copy with a preview.
//! 3. `DragEnd` commits against ground truth and renders the result
//!    immediately. A cross-stage move returns one `update-stage` task.
//! 4. `Persisted(Ok)` notifies success; nothing else changes.
//! 5. `Persisted(Err)` notifies failure and requests a fetch through the
//!    [`RollbackController`]; the fetched pipeline replaces local state
//!    wholesale when it arrives.
//!
//! Overlapping moves of the same deal are not serialized: whichever request
//! the server processes last wins, even if the board shows the other one.

use std::sync::Arc;

use dealflow_core::{
    BoardConfig, BoardFilter, DealId, DragSession, DropTarget, MoveKind, StageCollection,
    StageId, VisibilityWindow, reducer,
};

use crate::gateway::{GatewayError, PersistenceGateway, PipelineSource};
use crate::notify::{Notification, NotificationSink};
use crate::program::{Cmd, Model};
use crate::rollback::{FetchResult, ReloadReason, RollbackController};
use crate::view::{self, BoardView};

/// Board events.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Pointer pressed on a card.
    DragStart(DealId),
    /// Pointer moved over a target (or over nothing).
    DragOver {
        active: DealId,
        over: Option<DropTarget>,
    },
    /// Pointer released. `None` means no valid drop target.
    DragEnd {
        active: DealId,
        over: Option<DropTarget>,
    },
    /// Gesture abandoned (Escape, focus loss).
    DragCancel,
    /// A stage update finished.
    Persisted {
        deal_id: DealId,
        stage: String,
        result: Result<(), GatewayError>,
    },
    /// A pipeline fetch finished.
    Fetched(FetchResult),
    /// Show more deals in a stage.
    LoadMore(StageId),
    /// Filter inputs changed.
    SetFilter(BoardFilter),
    /// Discard local state and fetch again.
    Reload,
}

impl Msg {
    fn name(&self) -> &'static str {
        match self {
            Self::DragStart(_) => "drag_start",
            Self::DragOver { .. } => "drag_over",
            Self::DragEnd { .. } => "drag_end",
            Self::DragCancel => "drag_cancel",
            Self::Persisted { .. } => "persisted",
            Self::Fetched(_) => "fetched",
            Self::LoadMore(_) => "load_more",
            Self::SetFilter(_) => "set_filter",
            Self::Reload => "reload",
        }
    }
}

/// Board state plus its collaborators.
pub struct PipelineBoard {
    committed: StageCollection,
    session: DragSession,
    filter: BoardFilter,
    window: VisibilityWindow,
    config: BoardConfig,
    gateway: Arc<dyn PersistenceGateway>,
    rollback: RollbackController,
    notifier: Arc<dyn NotificationSink>,
    in_flight: usize,
}

impl std::fmt::Debug for PipelineBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBoard")
            .field("stages", &self.committed.len())
            .field("deals", &self.committed.deal_count())
            .field("session", &self.session.dragged_id())
            .field("in_flight", &self.in_flight)
            .field("rollback", &self.rollback)
            .finish_non_exhaustive()
    }
}

impl PipelineBoard {
    /// An empty board; `init` fetches the pipeline from `source`.
    pub fn new(
        gateway: Arc<dyn PersistenceGateway>,
        source: Arc<dyn PipelineSource>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self::with_config(gateway, source, notifier, BoardConfig::default())
    }

    pub fn with_config(
        gateway: Arc<dyn PersistenceGateway>,
        source: Arc<dyn PipelineSource>,
        notifier: Arc<dyn NotificationSink>,
        config: BoardConfig,
    ) -> Self {
        Self {
            committed: StageCollection::default(),
            session: DragSession::new(),
            filter: BoardFilter::new(),
            window: VisibilityWindow::new(&config.visibility),
            config,
            gateway,
            rollback: RollbackController::new(source),
            notifier,
            in_flight: 0,
        }
    }

    /// Last committed collection (what the server should converge to).
    #[must_use]
    pub fn committed(&self) -> &StageCollection {
        &self.committed
    }

    /// What is on screen: the preview while dragging, else committed.
    #[must_use]
    pub fn visible(&self) -> &StageCollection {
        self.session.visible(&self.committed)
    }

    #[must_use]
    pub fn session(&self) -> &DragSession {
        &self.session
    }

    #[must_use]
    pub fn filter(&self) -> &BoardFilter {
        &self.filter
    }

    #[must_use]
    pub fn window(&self) -> &VisibilityWindow {
        &self.window
    }

    #[must_use]
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Stage updates issued but not yet resolved.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.rollback.is_loading()
    }

    /// Render snapshot of the current state.
    #[must_use]
    pub fn view(&self) -> BoardView {
        view::render(
            self.visible(),
            &self.filter,
            &self.window,
            self.session.dragged_id(),
        )
    }

    fn reload(&mut self, reason: ReloadReason) -> Cmd<Msg> {
        self.rollback.request(reason, Msg::Fetched)
    }

    fn drag_start(&mut self, deal_id: DealId) -> Cmd<Msg> {
        if self.session.start(deal_id.clone(), &self.committed) {
            tracing::debug!(target: "dealflow.board", deal_id = %deal_id, "drag started");
        }
        Cmd::none()
    }

    fn drag_over(&mut self, active: &DealId, over: Option<&DropTarget>) -> Cmd<Msg> {
        if !self.session.is_active(active) {
            return Cmd::none();
        }
        let Some(target) = over else {
            return Cmd::none();
        };
        let next = self
            .session
            .active()
            .and_then(|drag| reducer::preview(&drag.working, active, target));
        if let Some(next) = next {
            self.session.set_working(next);
        }
        Cmd::none()
    }

    fn drag_end(&mut self, active: &DealId, over: Option<&DropTarget>) -> Cmd<Msg> {
        // Any release ends the gesture; the committed collection is the
        // ground truth, so dropping the session is the abort.
        let Some(drag) = self.session.finish() else {
            return Cmd::none();
        };
        if &drag.deal != active {
            tracing::debug!(
                target: "dealflow.board",
                deal_id = %drag.deal,
                released = %active,
                "drag aborted: release names another deal"
            );
            return Cmd::none();
        }

        let Some(outcome) = reducer::commit(&drag.ground_truth, &drag.working, &drag.deal, over)
        else {
            tracing::debug!(target: "dealflow.board", deal_id = %drag.deal, "drag aborted");
            return Cmd::none();
        };

        self.committed = outcome.collection;
        if outcome.kind != MoveKind::CrossStage {
            return Cmd::none();
        }

        self.in_flight += 1;
        let gateway = Arc::clone(&self.gateway);
        let deal_id = outcome.deal_id;
        let stage = outcome.destination_stage;
        tracing::debug!(
            target: "dealflow.sync",
            deal_id = %deal_id,
            from_stage = %outcome.original_stage,
            to_stage = %stage,
            in_flight = self.in_flight,
            "stage update issued"
        );
        Cmd::task_named("update-stage", move || {
            let result = gateway.update_stage(&deal_id, &stage);
            Msg::Persisted {
                deal_id,
                stage,
                result,
            }
        })
    }

    fn persisted(
        &mut self,
        deal_id: DealId,
        stage: String,
        result: Result<(), GatewayError>,
    ) -> Cmd<Msg> {
        self.in_flight = self.in_flight.saturating_sub(1);
        match result {
            Ok(()) => {
                tracing::info!(
                    target: "dealflow.sync",
                    deal_id = %deal_id,
                    to_stage = %stage,
                    "stage update persisted"
                );
                self.notifier.notify(Notification::success(
                    self.config.notifications.success_message(&stage),
                ));
                Cmd::none()
            }
            Err(err) => {
                tracing::warn!(
                    target: "dealflow.sync",
                    deal_id = %deal_id,
                    to_stage = %stage,
                    error = %err,
                    "stage update failed, rolling back"
                );
                self.notifier.notify(Notification::error(
                    self.config.notifications.failure_message.clone(),
                ));
                self.reload(ReloadReason::Rollback { deal_id })
            }
        }
    }

    fn fetched(&mut self, fetched: FetchResult) -> Cmd<Msg> {
        if !self.rollback.accept(&fetched) {
            return Cmd::none();
        }
        match fetched.result {
            Ok(fresh) => {
                tracing::info!(
                    target: "dealflow.rollback",
                    reason = %fetched.reason,
                    stages = fresh.len(),
                    deals = fresh.deal_count(),
                    "pipeline replaced"
                );
                self.committed = fresh;
                self.session.rebase(&self.committed);
                self.window.reset();
            }
            Err(err) => {
                tracing::error!(
                    target: "dealflow.rollback",
                    reason = %fetched.reason,
                    error = %err,
                    "pipeline fetch failed, keeping current state"
                );
                self.notifier.notify(Notification::error(
                    self.config.notifications.reload_failure_message.clone(),
                ));
            }
        }
        Cmd::none()
    }

    fn load_more(&mut self, stage_id: &StageId) -> Cmd<Msg> {
        let collection = self.session.visible(&self.committed);
        let Some(index) = collection.stage_index(stage_id) else {
            return Cmd::none();
        };
        let total = collection
            .stage(index)
            .map_or(0, |stage| self.filter.filter_stage(stage).len());
        if self.window.load_more(stage_id, total) {
            tracing::debug!(
                target: "dealflow.board",
                stage = %stage_id,
                cap = self.window.cap(stage_id),
                "visibility cap raised"
            );
        }
        Cmd::none()
    }

    fn set_filter(&mut self, filter: BoardFilter) -> Cmd<Msg> {
        if filter != self.filter {
            self.filter = filter;
            self.window.reset();
            tracing::debug!(target: "dealflow.board", "filter changed, caps reset");
        }
        Cmd::none()
    }
}

impl Model for PipelineBoard {
    type Message = Msg;

    fn init(&mut self) -> Cmd<Msg> {
        self.reload(ReloadReason::Initial)
    }

    fn update(&mut self, msg: Msg) -> Cmd<Msg> {
        let _span = tracing::debug_span!(target: "dealflow.board", "board.update", msg = msg.name())
            .entered();
        match msg {
            Msg::DragStart(deal_id) => self.drag_start(deal_id),
            Msg::DragOver { active, over } => self.drag_over(&active, over.as_ref()),
            Msg::DragEnd { active, over } => self.drag_end(&active, over.as_ref()),
            Msg::DragCancel => {
                if let Some(drag) = self.session.finish() {
                    tracing::debug!(target: "dealflow.board", deal_id = %drag.deal, "drag cancelled");
                }
                Cmd::none()
            }
            Msg::Persisted {
                deal_id,
                stage,
                result,
            } => self.persisted(deal_id, stage, result),
            Msg::Fetched(fetched) => self.fetched(fetched),
            Msg::LoadMore(stage_id) => self.load_more(&stage_id),
            Msg::SetFilter(filter) => self.set_filter(filter),
            Msg::Reload => self.reload(ReloadReason::Manual),
        }
    }
}
