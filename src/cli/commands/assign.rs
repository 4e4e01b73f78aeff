use anyhow::Result;

use super::{AppContext, Command};
use crate::workflow::{Customer, Job};

pub struct AssignCommand {
    pub id: String,
    pub order_id: String,
    pub technician: Option<String>,
    pub customer: Customer,
    pub category: String,
    pub issue: String,
}

impl Command for AssignCommand {
    async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let technician = self
            .technician
            .clone()
            .unwrap_or_else(|| ctx.config.session.user_id.clone());
        let job = Job::assigned(
            &self.id,
            &self.order_id,
            technician,
            self.customer.clone(),
            &self.category,
            &self.issue,
        );
        let store = ctx.store();
        store.insert(&job).await?;
        println!("📥 {} assigned to {}", job.id, job.technician_id);
        println!("   Stored in {}", store.path().display());
        Ok(())
    }
}
