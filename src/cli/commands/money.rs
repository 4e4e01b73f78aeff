use anyhow::{anyhow, Result};
use rust_decimal::Decimal;

use super::{AppContext, Command};
use crate::gateway::JobStore;
use crate::payment::upi_link;

pub struct PayoutCommand {
    pub final_cost: Decimal,
}

impl Command for PayoutCommand {
    async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let payout = ctx.engine().payout(self.final_cost)?;
        println!(
            "💰 Final cost {} at {}% platform fee → payout {}",
            self.final_cost, ctx.config.workflow.platform_fee_percent, payout
        );
        Ok(())
    }
}

pub struct UpiLinkCommand {
    pub booking_id: String,
    pub amount: Option<Decimal>,
}

impl Command for UpiLinkCommand {
    async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let amount = match self.amount {
            Some(amount) => amount,
            None => {
                let job = ctx.store().fetch_job(&self.booking_id).await?;
                job.stage
                    .final_cost()
                    .or_else(|| job.stage.inspection().map(|i| i.fee))
                    .ok_or_else(|| {
                        anyhow!("no amount is due yet on {}; pass --amount", self.booking_id)
                    })?
            }
        };

        println!("{}", upi_link(&ctx.config.payment, amount, &self.booking_id)?);
        Ok(())
    }
}
