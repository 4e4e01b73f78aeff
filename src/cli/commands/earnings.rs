use anyhow::Result;
use chrono::{Duration, Utc};

use super::{AppContext, Command};
use crate::earnings::EarningsSummary;

pub struct EarningsCommand {
    pub days: Option<i64>,
    pub json: bool,
}

impl Command for EarningsCommand {
    async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let jobs = ctx.dispatcher().my_jobs().await?;
        let since = self.days.map(|days| Utc::now() - Duration::days(days));
        let summary =
            EarningsSummary::from_jobs(&jobs, ctx.config.workflow.platform_fee_percent, since)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            return Ok(());
        }

        println!("💰 EARNINGS");
        println!("==========");
        if let Some(days) = self.days {
            println!("   Last {} day(s)", days);
        }
        println!("   Settled jobs:  {}", summary.completed_jobs);
        println!("   Gross:         {}", summary.gross);
        println!(
            "   Platform fee:  {} ({}%)",
            summary.platform_fee, summary.fee_percent
        );
        println!("   Your payout:   {}", summary.payout);

        if !summary.entries.is_empty() {
            println!();
            for entry in &summary.entries {
                println!(
                    "   {:<12} {:<14} {:>10} → {:>10}",
                    entry.booking_id, entry.category, entry.final_cost, entry.payout
                );
            }
        }
        Ok(())
    }
}
