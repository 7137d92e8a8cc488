pub mod journal;
pub mod log;

use async_trait::async_trait;

pub use journal::JournalSink;
pub use log::LogSink;

use crate::signal::Alert;

/// Alert delivery boundary. Formatting for humans happens behind this trait;
/// the detector only hands over the structured `Alert`.
///
/// A failing sink is logged by the caller and never blocks the others.
#[async_trait]
pub trait AlertSink: Send + Sync {
    fn name(&self) -> &str;

    async fn deliver(&self, alert: &Alert) -> anyhow::Result<()>;
}
