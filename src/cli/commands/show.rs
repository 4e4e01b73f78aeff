use anyhow::Result;

use super::{AppContext, Command};
use crate::gateway::JobStore;
use crate::workflow::{Job, JobWorkflowEngine};

pub struct ShowCommand {
    pub booking_id: String,
    pub json: bool,
}

impl Command for ShowCommand {
    async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let job = ctx.store().fetch_job(&self.booking_id).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&job)?);
            return Ok(());
        }

        print_job(&job);
        Ok(())
    }
}

pub(crate) fn print_job(job: &Job) {
    println!("🔧 {} ({})", job.id, job.order_id);
    println!("   Status:   {}", job.status());
    println!("   Customer: {} • {}", job.customer.name, job.customer.phone);
    println!("   Address:  {}", job.customer.address);
    println!("   Issue:    {} - {}", job.category, job.issue);

    if let Some(inspection) = job.stage.inspection() {
        println!();
        println!("🔍 Inspection (fee {}):", inspection.fee);
        for finding in &inspection.findings {
            println!("   • {}", finding);
        }
        if let Some(notes) = &inspection.notes {
            println!("   Notes: {}", notes);
        }
    }

    if let Some(quote) = job.stage.quote() {
        println!();
        println!(
            "🧾 Quote: labor {} + parts {} = {}",
            quote.labor_cost(),
            quote.parts_cost(),
            quote.total_amount()
        );
    }

    if let Some(final_cost) = job.stage.final_cost() {
        println!("💵 Final cost: {}", final_cost);
    }

    if let Some(settlement) = job.stage.settlement() {
        let payment = settlement.payment();
        println!("✅ Paid {} by {}", payment.amount, payment.method.label());
    }

    let actions = JobWorkflowEngine::allowed_actions(job.status());
    println!();
    if actions.is_empty() {
        println!("⏳ Nothing to do right now");
    } else {
        let names: Vec<&str> = actions.iter().map(|a| a.as_str()).collect();
        println!("▶️  Next: {}", names.join(", "));
    }
}
