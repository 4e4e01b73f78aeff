use anyhow::Result;

use super::{AppContext, Command};
use crate::cli::CustomerCommand;

/// Stands in for the customer app when working against the local store.
pub struct CustomerDecisionCommand {
    pub decision: CustomerCommand,
}

impl Command for CustomerDecisionCommand {
    async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let job = ctx
            .store()
            .record_customer_decision(
                &ctx.engine(),
                self.decision.booking_id(),
                self.decision.decision(),
            )
            .await?;
        println!("👤 {} is now {}", job.id, job.status());
        Ok(())
    }
}
