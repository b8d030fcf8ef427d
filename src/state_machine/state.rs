//! State representation

use crate::Result;
use crate::state_machine::OutputSink;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

pub type StateId = String;

/// Side effect executed once per tick while a state is current.
///
/// Closures returning `Result<()>` implement this trait directly, so most
/// states can be declared inline:
///
/// ```
/// use moore_fsm::state_machine::State;
///
/// let idle = State::from_fn("Idle", || {
///     println!("waiting");
///     Ok(())
/// });
/// assert_eq!(idle.name(), "Idle");
/// ```
#[async_trait]
pub trait StateAction: Send + Sync {
    async fn run(&self) -> Result<()>;
}

#[async_trait]
impl<F> StateAction for F
where
    F: Fn() -> Result<()> + Send + Sync,
{
    async fn run(&self) -> Result<()> {
        self()
    }
}

/// Action that writes a fixed output value to a sink
pub struct Emit {
    sink: Arc<dyn OutputSink>,
    output: String,
}

impl Emit {
    pub fn new(sink: Arc<dyn OutputSink>, output: impl Into<String>) -> Self {
        Self {
            sink,
            output: output.into(),
        }
    }
}

#[async_trait]
impl StateAction for Emit {
    async fn run(&self) -> Result<()> {
        self.sink.emit(&self.output).await
    }
}

struct Silent;

#[async_trait]
impl StateAction for Silent {
    async fn run(&self) -> Result<()> {
        Ok(())
    }
}

/// A state in the machine: a unique name plus its output action
#[derive(Clone)]
pub struct State {
    name: StateId,
    action: Arc<dyn StateAction>,
}

impl State {
    pub fn new(name: impl Into<StateId>, action: impl StateAction + 'static) -> Self {
        Self {
            name: name.into(),
            action: Arc::new(action),
        }
    }

    /// A state whose action is a plain closure
    pub fn from_fn<F>(name: impl Into<StateId>, action: F) -> Self
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        Self::new(name, action)
    }

    /// A state whose action emits `output` to `sink`
    pub fn emitting(
        name: impl Into<StateId>,
        sink: Arc<dyn OutputSink>,
        output: impl Into<String>,
    ) -> Self {
        Self::new(name, Emit::new(sink, output))
    }

    /// A state with no observable output
    pub fn silent(name: impl Into<StateId>) -> Self {
        Self::new(name, Silent)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execute the output action, tagging failures with this state's name
    pub async fn run(&self) -> Result<()> {
        self.action
            .run()
            .await
            .map_err(|e| crate::Error::action(self.name.clone(), e))
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for State {}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State").field("name", &self.name).finish()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
