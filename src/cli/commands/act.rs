use anyhow::Result;

use super::{AppContext, Command};
use crate::cli::ActionCommand;
use crate::payment::upi_link;
use crate::workflow::{JobStatus, TransitionDecision};

pub struct ActCommand {
    pub booking_id: String,
    pub action: ActionCommand,
}

impl Command for ActCommand {
    async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let dispatcher = ctx.dispatcher();
        let mut session = dispatcher.open_session(&self.booking_id).await?;
        let outcome = dispatcher
            .perform(&mut session, self.action.clone().into_action())
            .await;
        dispatcher.metrics().log_stats();

        report(ctx, &self.booking_id, &outcome?)
    }
}

/// Print what happened and what the technician should do next.
pub(crate) fn report(ctx: &AppContext, booking_id: &str, decision: &TransitionDecision) -> Result<()> {
    println!(
        "✅ {}: {} → {}",
        booking_id,
        decision.previous,
        decision.next_status()
    );

    match decision.next_status() {
        JobStatus::CodeSent => {
            println!("🔐 A completion code was sent to the customer.");
            println!("   Ask them to read it out, then run: fieldfix verify-code {booking_id} <code>");
        }
        JobStatus::PaymentPending => {
            if let Some(amount) = decision.next.final_cost() {
                println!("💵 Amount due: {}", amount);
                println!("   UPI: {}", upi_link(&ctx.config.payment, amount, booking_id)?);
            }
        }
        JobStatus::RepairCompleted => {
            if let Some(final_cost) = decision.next.settlement().map(|s| s.final_cost()) {
                let payout = ctx.engine().payout(final_cost)?;
                println!("🎉 Job settled. Your payout: {}", payout);
            }
        }
        _ => {}
    }
    Ok(())
}
