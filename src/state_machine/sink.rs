//! Output sinks
//!
//! States never write to the console directly; their output goes through an
//! [`OutputSink`] injected when the state is built.

use crate::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;

/// Destination for the values emitted by states
#[async_trait]
pub trait OutputSink: Send + Sync {
    async fn emit(&self, output: &str) -> Result<()>;
}

/// Writes each output as a line on stdout
#[derive(Debug, Default)]
pub struct StdoutSink;

#[async_trait]
impl OutputSink for StdoutSink {
    async fn emit(&self, output: &str) -> Result<()> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(output.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
        Ok(())
    }
}

/// Logs each output as a tracing event
#[derive(Debug, Default)]
pub struct TracingSink;

#[async_trait]
impl OutputSink for TracingSink {
    async fn emit(&self, output: &str) -> Result<()> {
        tracing::info!(target: "moore_fsm::output", "{}", output);
        Ok(())
    }
}

/// Keeps every output in memory, in emission order
#[derive(Debug, Default)]
pub struct MemorySink {
    outputs: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far
    pub fn outputs(&self) -> Vec<String> {
        self.outputs.lock().clone()
    }
}

#[async_trait]
impl OutputSink for MemorySink {
    async fn emit(&self, output: &str) -> Result<()> {
        self.outputs.lock().push(output.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_sink_keeps_order() {
        let sink = MemorySink::new();
        sink.emit("red").await.unwrap();
        sink.emit("green").await.unwrap();

        assert_eq!(sink.outputs(), vec!["red", "green"]);
    }
}
