#![forbid(unsafe_code)]

//! Deterministic, thread-free program driver.
//!
//! The simulator executes [`Cmd`] trees on the calling thread. In
//! [`TaskMode::Immediate`] a task runs as soon as it is produced, which is
//! what a fast network looks like. In [`TaskMode::Deferred`] tasks are parked
//! until the test releases them with [`ProgramSimulator::run_next_task`],
//! [`ProgramSimulator::run_task`], or [`ProgramSimulator::run_pending`]. That
//! opens the optimistic window (state committed, request still in flight)
//! and lets a test resolve requests out of order.

use std::collections::VecDeque;

use crate::program::{Cmd, Model, TaskSpec};

/// When tasks produced by `update` are executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskMode {
    #[default]
    Immediate,
    Deferred,
}

struct PendingTask<M> {
    spec: TaskSpec,
    run: Box<dyn FnOnce() -> M + Send>,
}

/// Drives a [`Model`] without threads or timers.
pub struct ProgramSimulator<M: Model> {
    model: M,
    mode: TaskMode,
    pending: VecDeque<PendingTask<M::Message>>,
    messages_processed: usize,
    tasks_run: usize,
}

impl<M: Model> ProgramSimulator<M> {
    /// Simulator that runs tasks inline.
    pub fn new(model: M) -> Self {
        Self {
            model,
            mode: TaskMode::Immediate,
            pending: VecDeque::new(),
            messages_processed: 0,
            tasks_run: 0,
        }
    }

    /// Simulator that parks tasks until released.
    pub fn deferred(model: M) -> Self {
        let mut sim = Self::new(model);
        sim.mode = TaskMode::Deferred;
        sim
    }

    pub fn set_task_mode(&mut self, mode: TaskMode) {
        self.mode = mode;
    }

    #[must_use]
    pub fn task_mode(&self) -> TaskMode {
        self.mode
    }

    /// Run the model's startup commands.
    pub fn init(&mut self) {
        let cmd = self.model.init();
        self.execute(cmd);
    }

    /// Deliver one message and execute the resulting commands.
    pub fn send(&mut self, msg: M::Message) {
        self.messages_processed += 1;
        let cmd = self.model.update(msg);
        self.execute(cmd);
    }

    /// Deliver messages in order.
    pub fn send_all(&mut self, msgs: impl IntoIterator<Item = M::Message>) {
        for msg in msgs {
            self.send(msg);
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    /// Names of parked tasks, oldest first.
    #[must_use]
    pub fn pending_tasks(&self) -> Vec<&str> {
        self.pending.iter().map(|task| task.spec.name.as_str()).collect()
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn messages_processed(&self) -> usize {
        self.messages_processed
    }

    #[must_use]
    pub fn tasks_run(&self) -> usize {
        self.tasks_run
    }

    /// Run the oldest parked task. Returns `false` if none was parked.
    pub fn run_next_task(&mut self) -> bool {
        self.run_task(0)
    }

    /// Run the parked task at `index` (0 = oldest), leaving the others parked.
    pub fn run_task(&mut self, index: usize) -> bool {
        let Some(task) = self.pending.remove(index) else {
            return false;
        };
        self.run(task);
        true
    }

    /// Drop a parked task without running it (a request that never returns).
    pub fn drop_task(&mut self, index: usize) -> bool {
        self.pending.remove(index).is_some()
    }

    /// Run parked tasks, including any they produce, until none remain.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while self.run_next_task() {
            ran += 1;
        }
        ran
    }

    fn run(&mut self, task: PendingTask<M::Message>) {
        tracing::trace!(target: "dealflow.runtime", task = %task.spec.name, "running task");
        self.tasks_run += 1;
        let msg = (task.run)();
        self.send(msg);
    }

    fn execute(&mut self, cmd: Cmd<M::Message>) {
        match cmd {
            Cmd::None => {}
            Cmd::Msg(msg) => self.send(msg),
            Cmd::Batch(cmds) | Cmd::Sequence(cmds) => {
                for cmd in cmds {
                    self.execute(cmd);
                }
            }
            Cmd::Task(spec, run) => {
                let task = PendingTask { spec, run };
                match self.mode {
                    TaskMode::Immediate => self.run(task),
                    TaskMode::Deferred => {
                        tracing::trace!(
                            target: "dealflow.runtime",
                            task = %task.spec.name,
                            pending = self.pending.len() + 1,
                            "task parked"
                        );
                        self.pending.push_back(task);
                    }
                }
            }
        }
    }
}
