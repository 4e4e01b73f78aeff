use anyhow::Result;

use super::{AppContext, Command};

pub struct JobsCommand {
    pub json: bool,
}

impl Command for JobsCommand {
    async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let jobs = ctx.dispatcher().my_jobs().await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&jobs)?);
            return Ok(());
        }

        if jobs.is_empty() {
            println!("📋 No jobs assigned to {}", ctx.config.session.user_id);
            return Ok(());
        }

        println!("📋 {} job(s) for {}:", jobs.len(), ctx.config.session.user_id);
        for job in &jobs {
            println!(
                "   {:<12} {:<22} {} - {} ({})",
                job.id,
                job.status(),
                job.category,
                job.issue,
                job.customer.name
            );
        }
        Ok(())
    }
}
