//! Summary command handler.
//!
//! Produces a 24-hour situation summary for one zone.

use clap::Args;
use veye_core::{AppConfig, AppResult};

/// Summarize the last 24 hours for one zone
#[derive(Args, Debug)]
pub struct SummaryCommand {
    /// Zone name (e.g., "Delmas", "Carrefour Feuilles")
    pub location: String,

    /// Treat the zone as a whole commune, covering numbered subzones
    #[arg(long)]
    pub general: bool,
}

impl SummaryCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!(location = %self.location, general = self.general, "Executing summary command");

        let engine = super::build_engine(config)?;
        let summary = engine.summarize_location(&self.location, self.general).await?;

        println!("{}", summary);
        Ok(())
    }
}
