#![forbid(unsafe_code)]

//! Elm-style model/update contract.
//!
//! A [`Model`] owns all board state and reacts to messages by returning a
//! [`Cmd`] describing side effects. The runtime (see
//! [`ProgramSimulator`](crate::simulator::ProgramSimulator)) executes commands
//! and feeds resulting messages back into `update`. Network calls are
//! expressed as [`Cmd::Task`] so the model itself never blocks or owns a
//! thread.

use std::fmt;

/// Application state and behavior.
pub trait Model: Sized {
    /// The message type for this model.
    type Message: Send + 'static;

    /// Called once when the program starts. Return commands for startup
    /// side effects such as the initial data fetch.
    fn init(&mut self) -> Cmd<Self::Message> {
        Cmd::none()
    }

    /// The core state transition function.
    fn update(&mut self, msg: Self::Message) -> Cmd<Self::Message>;
}

/// Metadata attached to a background task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub name: String,
}

impl TaskSpec {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for TaskSpec {
    fn default() -> Self {
        Self::named("task")
    }
}

type TaskFn<M> = Box<dyn FnOnce() -> M + Send>;

/// Side effects to be executed by the runtime.
pub enum Cmd<M> {
    /// No operation.
    None,
    /// Execute multiple commands; order is not significant.
    Batch(Vec<Cmd<M>>),
    /// Execute commands in order.
    Sequence(Vec<Cmd<M>>),
    /// Send a message to the model.
    Msg(M),
    /// Run a blocking closure off the update path and deliver its result.
    Task(TaskSpec, TaskFn<M>),
}

impl<M> Cmd<M> {
    #[inline]
    pub fn none() -> Self {
        Self::None
    }

    #[inline]
    pub fn msg(m: M) -> Self {
        Self::Msg(m)
    }

    /// Create a batch of commands, collapsing trivial cases.
    pub fn batch(cmds: Vec<Self>) -> Self {
        let mut cmds: Vec<Self> = cmds.into_iter().filter(|cmd| !cmd.is_none()).collect();
        match cmds.len() {
            0 => Self::None,
            1 => cmds.pop().unwrap_or(Self::None),
            _ => Self::Batch(cmds),
        }
    }

    /// Create a sequence of commands, collapsing trivial cases.
    pub fn sequence(cmds: Vec<Self>) -> Self {
        let mut cmds: Vec<Self> = cmds.into_iter().filter(|cmd| !cmd.is_none()).collect();
        match cmds.len() {
            0 => Self::None,
            1 => cmds.pop().unwrap_or(Self::None),
            _ => Self::Sequence(cmds),
        }
    }

    /// Background task with a default name.
    pub fn task<F>(f: F) -> Self
    where
        F: FnOnce() -> M + Send + 'static,
    {
        Self::Task(TaskSpec::default(), Box::new(f))
    }

    /// Background task with a name for logs and simulator inspection.
    pub fn task_named<F>(name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce() -> M + Send + 'static,
    {
        Self::Task(TaskSpec::named(name), Box::new(f))
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Names of every task in this command tree, depth first.
    #[must_use]
    pub fn task_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_task_names(&mut names);
        names
    }

    fn collect_task_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Task(spec, _) => out.push(&spec.name),
            Self::Batch(cmds) | Self::Sequence(cmds) => {
                for cmd in cmds {
                    cmd.collect_task_names(out);
                }
            }
            Self::None | Self::Msg(_) => {}
        }
    }
}

impl<M> Default for Cmd<M> {
    fn default() -> Self {
        Self::None
    }
}

impl<M: fmt::Debug> fmt::Debug for Cmd<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Batch(cmds) => f.debug_tuple("Batch").field(cmds).finish(),
            Self::Sequence(cmds) => f.debug_tuple("Sequence").field(cmds).finish(),
            Self::Msg(m) => f.debug_tuple("Msg").field(m).finish(),
            Self::Task(spec, _) => f.debug_tuple("Task").field(&spec.name).finish(),
        }
    }
}
