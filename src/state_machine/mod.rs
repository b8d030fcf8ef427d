//! State machine module - Moore machines, their run loop and completeness analysis

pub mod analyzer;
pub mod graph;
pub mod input;
pub mod machine;
pub mod sink;
pub mod state;
pub mod transition;

// Re-export key types
pub use analyzer::{AnalysisReport, ReportSink, TextReport, Verdict};
pub use graph::{GraphStats, StateGraph};
pub use input::PendingInput;
pub use machine::{MooreMachine, Pacing};
pub use sink::{MemorySink, OutputSink, StdoutSink, TracingSink};
pub use state::{Emit, State, StateAction, StateId};
pub use transition::{Transition, TransitionFunction, TransitionTable};
