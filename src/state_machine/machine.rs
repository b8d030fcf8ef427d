//! Moore machine and its run loop

use crate::state_machine::{PendingInput, State, StateId, TransitionFunction};
use crate::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Timing knobs for the run loop. They affect pacing only, never which
/// states are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// One-time delay before the first tick
    pub delay: Duration,
    /// Pause after every tick
    pub interval: Duration,
    /// Latency between noticing pending input and consuming it
    pub consume_delay: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            delay: Duration::ZERO,
            interval: Duration::ZERO,
            consume_delay: Duration::from_secs(1),
        }
    }
}

/// A Moore machine: output depends only on the current state, the next
/// state on the current state and the consumed input symbol.
///
/// Alphabet, state set, initial state and transition function are fixed at
/// construction. The machine is meant to be shared behind an `Arc`: one
/// task drives [`run`](Self::run) while producers call
/// [`set_input`](Self::set_input).
pub struct MooreMachine<T> {
    alphabet: Vec<T>,
    states: Vec<State>,
    /// Position of each state in `states`, by name
    index: HashMap<StateId, usize>,
    initial: State,
    delta: Box<dyn TransitionFunction<T>>,
    pending: PendingInput<T>,
    pacing: RwLock<Pacing>,
}

impl<T> MooreMachine<T>
where
    T: PartialEq + fmt::Debug + Send + Sync,
{
    /// Build a machine, rejecting duplicate state names, duplicate symbols
    /// and an initial state outside the state set.
    pub fn new(
        alphabet: Vec<T>,
        states: Vec<State>,
        initial: State,
        delta: impl TransitionFunction<T> + 'static,
    ) -> Result<Self> {
        let mut index = HashMap::with_capacity(states.len());
        for (i, state) in states.iter().enumerate() {
            if index.insert(state.name().to_string(), i).is_some() {
                return Err(Error::DuplicateState(state.name().to_string()));
            }
        }

        // Symbols are only PartialEq, so this check stays pairwise
        for (i, symbol) in alphabet.iter().enumerate() {
            if alphabet[..i].contains(symbol) {
                return Err(Error::DuplicateSymbol(format!("{:?}", symbol)));
            }
        }

        let initial = index
            .get(initial.name())
            .map(|&i| states[i].clone())
            .ok_or_else(|| Error::UnknownInitialState(initial.name().to_string()))?;

        tracing::debug!(
            states = states.len(),
            symbols = alphabet.len(),
            initial = %initial,
            "Built Moore machine"
        );

        Ok(Self {
            alphabet,
            states,
            index,
            initial,
            delta: Box::new(delta),
            pending: PendingInput::new(),
            pacing: RwLock::new(Pacing::default()),
        })
    }

    pub fn with_pacing(self, pacing: Pacing) -> Self {
        *self.pacing.write() = pacing;
        self
    }

    pub fn alphabet(&self) -> &[T] {
        &self.alphabet
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn initial(&self) -> &State {
        &self.initial
    }

    /// Whether `symbol` belongs to the declared alphabet
    pub fn accepts(&self, symbol: &T) -> bool {
        self.alphabet.contains(symbol)
    }

    /// Look up a member of the state set by name
    pub fn state(&self, name: &str) -> Option<&State> {
        self.index.get(name).map(|&i| &self.states[i])
    }

    /// Query the transition function.
    ///
    /// The destination is always the declared member with the returned
    /// name. A destination outside the state set counts as undefined.
    pub fn resolve(&self, state: &State, symbol: &T) -> Option<&State> {
        let next = self.delta.resolve(state, symbol)?;
        let member = self.state(next.name());
        if member.is_none() {
            tracing::warn!(
                from = %state,
                to = %next,
                input = ?symbol,
                "Transition leads outside the state set, treating as undefined"
            );
        }
        member
    }

    /// Submit a symbol for the run loop to consume.
    ///
    /// An unconsumed symbol is overwritten and returned.
    pub fn set_input(&self, symbol: T) -> Option<T> {
        let displaced = self.pending.replace(symbol);
        if let Some(old) = &displaced {
            tracing::debug!(displaced = ?old, "Overwrote unconsumed input");
        }
        displaced
    }

    pub fn has_pending_input(&self) -> bool {
        self.pending.is_pending()
    }

    pub fn pacing(&self) -> Pacing {
        *self.pacing.read()
    }

    pub fn set_delay(&self, delay: Duration) {
        self.pacing.write().delay = delay;
    }

    pub fn set_interval(&self, interval: Duration) {
        self.pacing.write().interval = interval;
    }

    pub fn set_consume_delay(&self, consume_delay: Duration) {
        self.pacing.write().consume_delay = consume_delay;
    }

    /// Perform one tick from `current` and return the state to occupy next.
    ///
    /// Runs the current state's action, then, if input is pending, waits the
    /// consume delay, takes the symbol and resolves it. Undefined pairs leave
    /// the state unchanged. The slot is empty afterwards either way.
    pub async fn step(&self, current: &State) -> Result<State> {
        tracing::trace!(state = %current, "Tick");
        current.run().await?;

        if !self.pending.is_pending() {
            return Ok(current.clone());
        }

        let consume_delay = self.pacing().consume_delay;
        if !consume_delay.is_zero() {
            tokio::time::sleep(consume_delay).await;
        }

        let Some(symbol) = self.pending.take() else {
            return Ok(current.clone());
        };
        tracing::debug!(state = %current, input = ?symbol, "Got input");

        match self.resolve(current, &symbol) {
            Some(next) => {
                tracing::debug!(from = %current, to = %next, input = ?symbol, "Transition");
                Ok(next.clone())
            }
            None => {
                tracing::debug!(state = %current, input = ?symbol, "Undefined transition, staying");
                Ok(current.clone())
            }
        }
    }

    /// Drive the machine from its initial state until `shutdown` completes.
    ///
    /// The shutdown future is polled at every suspension point: the startup
    /// delay, each tick and each interval. Returns `Ok(())` once cancelled,
    /// or the first output-action error.
    pub async fn run<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut current = self.initial.clone();
        let mut ticks: u64 = 0;
        tracing::info!(initial = %current, "Starting Moore machine");

        let delay = self.pacing().delay;
        if !delay.is_zero() {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!("Moore machine cancelled before first tick");
                    return Ok(());
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        loop {
            let next = tokio::select! {
                biased;
                _ = &mut shutdown => break,
                next = self.step(&current) => next?,
            };
            current = next;
            ticks += 1;

            let interval = self.pacing().interval;
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        tracing::info!(ticks, state = %current, "Moore machine stopped");
        Ok(())
    }
}

impl<T: fmt::Debug> fmt::Debug for MooreMachine<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MooreMachine")
            .field("alphabet", &self.alphabet)
            .field("states", &self.states)
            .field("initial", &self.initial)
            .field("pacing", &*self.pacing.read())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::state_machine::{MemorySink, TransitionTable};
    use std::sync::Arc;

    /// alphabet {a, b}, states {S0, S1}, (S0, a) -> S1, (S1, b) -> S0
    pub(crate) fn example_machine(sink: Arc<MemorySink>) -> MooreMachine<char> {
        let s0 = State::emitting("S0", sink.clone(), "s0");
        let s1 = State::emitting("S1", sink, "s1");
        let table = TransitionTable::new()
            .define(&s0, 'a', &s1)
            .unwrap()
            .define(&s1, 'b', &s0)
            .unwrap();

        MooreMachine::new(vec!['a', 'b'], vec![s0.clone(), s1], s0, table).unwrap()
    }

    fn no_wait() -> Pacing {
        Pacing {
            delay: Duration::ZERO,
            interval: Duration::ZERO,
            consume_delay: Duration::ZERO,
        }
    }

    #[test]
    fn test_initial_state_must_be_member() {
        let s0 = State::silent("S0");
        let stray = State::silent("S9");
        let result = MooreMachine::new(
            vec!['a'],
            vec![s0],
            stray,
            TransitionTable::<char>::new(),
        );

        assert!(matches!(result, Err(Error::UnknownInitialState(name)) if name == "S9"));
    }

    #[test]
    fn test_duplicate_state_names_rejected() {
        let result = MooreMachine::new(
            vec!['a'],
            vec![State::silent("S0"), State::silent("S0")],
            State::silent("S0"),
            TransitionTable::<char>::new(),
        );

        assert!(matches!(result, Err(Error::DuplicateState(name)) if name == "S0"));
    }

    #[test]
    fn test_duplicate_symbols_rejected() {
        let result = MooreMachine::new(
            vec!['a', 'b', 'a'],
            vec![State::silent("S0")],
            State::silent("S0"),
            TransitionTable::<char>::new(),
        );

        assert!(matches!(result, Err(Error::DuplicateSymbol(_))));
    }

    #[tokio::test]
    async fn test_step_follows_defined_and_ignores_undefined() {
        let sink = Arc::new(MemorySink::new());
        let machine = example_machine(sink.clone()).with_pacing(no_wait());
        let s0 = machine.initial().clone();

        machine.set_input('a');
        let current = machine.step(&s0).await.unwrap();
        assert_eq!(current.name(), "S1");
        assert!(!machine.has_pending_input());

        // (S1, a) is undefined
        machine.set_input('a');
        let current = machine.step(&current).await.unwrap();
        assert_eq!(current.name(), "S1");
        assert!(!machine.has_pending_input());

        machine.set_input('b');
        let current = machine.step(&current).await.unwrap();
        assert_eq!(current.name(), "S0");

        // Output belongs to the state occupied during the tick
        assert_eq!(sink.outputs(), vec!["s0", "s1", "s1"]);
    }

    #[tokio::test]
    async fn test_input_consumed_at_most_once() {
        let sink = Arc::new(MemorySink::new());
        let machine = example_machine(sink.clone()).with_pacing(no_wait());
        let mut current = machine.initial().clone();

        machine.set_input('a');
        for _ in 0..3 {
            current = machine.step(&current).await.unwrap();
        }

        assert_eq!(current.name(), "S1");
        assert_eq!(sink.outputs(), vec!["s0", "s1", "s1"]);
    }

    #[tokio::test]
    async fn test_set_input_overwrites_pending() {
        let sink = Arc::new(MemorySink::new());
        let machine = example_machine(sink).with_pacing(no_wait());

        assert_eq!(machine.set_input('b'), None);
        assert_eq!(machine.set_input('a'), Some('b'));

        let current = machine.step(machine.initial()).await.unwrap();
        assert_eq!(current.name(), "S1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_emits_once_per_tick() {
        let sink = Arc::new(MemorySink::new());
        let machine = example_machine(sink.clone()).with_pacing(no_wait());
        machine.set_interval(Duration::from_millis(100));

        // Ticks at 0, 100, 200 and 300 ms
        machine
            .run(tokio::time::sleep(Duration::from_millis(350)))
            .await
            .unwrap();

        assert_eq!(sink.outputs(), vec!["s0"; 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_consumes_input_after_consume_delay() {
        let sink = Arc::new(MemorySink::new());
        let machine = example_machine(sink.clone()).with_pacing(Pacing {
            delay: Duration::ZERO,
            interval: Duration::from_millis(100),
            consume_delay: Duration::from_millis(1000),
        });
        machine.set_input('a');

        // Tick at 0 ms sees the input, consumes it at 1000 ms, next tick at 1100 ms
        machine
            .run(tokio::time::sleep(Duration::from_millis(1150)))
            .await
            .unwrap();

        assert_eq!(sink.outputs(), vec!["s0", "s1"]);
        assert!(!machine.has_pending_input());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_startup_delay() {
        let sink = Arc::new(MemorySink::new());
        let machine = example_machine(sink.clone()).with_pacing(Pacing {
            delay: Duration::from_millis(500),
            ..no_wait()
        });

        machine
            .run(tokio::time::sleep(Duration::from_millis(250)))
            .await
            .unwrap();

        assert!(sink.outputs().is_empty());
    }

    #[tokio::test]
    async fn test_destinations_resolve_to_declared_states() {
        let sink = Arc::new(MemorySink::new());
        let s0 = State::emitting("S0", sink.clone(), "s0");
        let s1 = State::emitting("S1", sink.clone(), "s1");
        let impostor = State::emitting("S1", sink.clone(), "impostor");
        let ghost = State::emitting("Ghost", sink.clone(), "ghost");
        let table = TransitionTable::new()
            .define(&s0, 'a', &impostor)
            .unwrap()
            .define(&s0, 'b', &ghost)
            .unwrap()
            .define(&s1, 'b', &s0)
            .unwrap();
        let machine = MooreMachine::new(vec!['a', 'b'], vec![s0.clone(), s1], s0, table)
            .unwrap()
            .with_pacing(no_wait());

        machine.set_input('a');
        let current = machine.step(machine.initial()).await.unwrap();
        assert_eq!(current.name(), "S1");

        machine.set_input('b');
        let current = machine.step(&current).await.unwrap();
        assert_eq!(current.name(), "S0");

        // Ghost is not a member: stay in S0
        machine.set_input('b');
        let current = machine.step(&current).await.unwrap();
        assert_eq!(current.name(), "S0");
        machine.step(&current).await.unwrap();

        assert_eq!(sink.outputs(), vec!["s0", "s1", "s0", "s0"]);
        assert!(machine.resolve(machine.initial(), &'b').is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_startup_delay_applies_once() {
        let sink = Arc::new(MemorySink::new());
        let machine = example_machine(sink.clone()).with_pacing(Pacing {
            delay: Duration::from_millis(500),
            interval: Duration::from_millis(100),
            consume_delay: Duration::ZERO,
        });

        // Ticks at 500, 600 and 700 ms
        let run = machine.run(tokio::time::sleep(Duration::from_millis(750)));
        let observe = async {
            tokio::time::sleep(Duration::from_millis(450)).await;
            assert!(sink.outputs().is_empty());
        };
        let (result, ()) = tokio::join!(run, observe);
        result.unwrap();

        assert_eq!(sink.outputs(), vec!["s0"; 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_change_applies_to_running_loop() {
        let sink = Arc::new(MemorySink::new());
        let machine = example_machine(sink.clone()).with_pacing(Pacing {
            delay: Duration::ZERO,
            interval: Duration::from_millis(100),
            consume_delay: Duration::ZERO,
        });

        // Ticks at 0, 100 and 200 ms, then 600 ms once the new interval applies
        let run = machine.run(tokio::time::sleep(Duration::from_millis(650)));
        let retune = async {
            tokio::time::sleep(Duration::from_millis(150)).await;
            machine.set_interval(Duration::from_millis(400));
        };
        let (result, ()) = tokio::join!(run, retune);
        result.unwrap();

        assert_eq!(sink.outputs(), vec!["s0"; 4]);
    }

    #[test]
    fn test_debug_lists_states() {
        let machine = example_machine(Arc::new(MemorySink::new()));
        let debug = format!("{:?}", machine);

        assert!(debug.starts_with("MooreMachine {"));
        assert!(debug.contains("State { name: \"S1\" }"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_producer_on_another_task() {
        let sink = Arc::new(MemorySink::new());
        let machine = Arc::new(example_machine(sink.clone()).with_pacing(Pacing {
            delay: Duration::ZERO,
            interval: Duration::from_millis(100),
            consume_delay: Duration::ZERO,
        }));
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

        let worker = {
            let machine = machine.clone();
            tokio::spawn(async move {
                machine
                    .run(async {
                        let _ = stop_rx.await;
                    })
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(150)).await;
        machine.set_input('a');
        tokio::time::sleep(Duration::from_millis(200)).await;
        stop_tx.send(()).unwrap();
        worker.await.unwrap().unwrap();

        // Ticks at 0 and 100 in S0; the tick at 200 consumes 'a'; 300 is in S1
        assert_eq!(sink.outputs(), vec!["s0", "s0", "s0", "s1"]);
    }

    #[tokio::test]
    async fn test_action_failure_stops_run() {
        let s0 = State::from_fn("S0", || Err(Error::sink("disconnected")));
        let machine = MooreMachine::new(
            vec!['a'],
            vec![s0.clone()],
            s0,
            TransitionTable::<char>::new(),
        )
        .unwrap();

        let err = machine.run(std::future::pending::<()>()).await.unwrap_err();
        assert!(matches!(err, Error::Action { ref state, .. } if state == "S0"));
    }

    #[test]
    fn test_pacing_knobs() {
        let machine = example_machine(Arc::new(MemorySink::new()));
        assert_eq!(machine.pacing(), Pacing::default());

        machine.set_delay(Duration::from_millis(10));
        machine.set_interval(Duration::from_millis(20));
        machine.set_consume_delay(Duration::from_millis(30));

        let pacing = machine.pacing();
        assert_eq!(pacing.delay, Duration::from_millis(10));
        assert_eq!(pacing.interval, Duration::from_millis(20));
        assert_eq!(pacing.consume_delay, Duration::from_millis(30));
    }

    #[test]
    fn test_accepts() {
        let machine = example_machine(Arc::new(MemorySink::new()));
        assert!(machine.accepts(&'a'));
        assert!(!machine.accepts(&'z'));
    }
}
