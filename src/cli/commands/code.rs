use anyhow::Result;

use super::act::report;
use super::{AppContext, Command};

pub struct VerifyCodeCommand {
    pub booking_id: String,
    pub code: String,
}

impl Command for VerifyCodeCommand {
    async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let dispatcher = ctx.dispatcher();
        let mut session = dispatcher.open_session(&self.booking_id).await?;
        let outcome = dispatcher
            .verify_completion_code(&mut session, self.code.trim())
            .await;
        dispatcher.metrics().log_stats();
        report(ctx, &self.booking_id, &outcome?)
    }
}

pub struct ResendCodeCommand {
    pub booking_id: String,
}

impl Command for ResendCodeCommand {
    async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let dispatcher = ctx.dispatcher();
        let session = dispatcher.open_session(&self.booking_id).await?;
        dispatcher.resend_completion_code(&session).await?;
        println!("📨 Completion code resent for {}", self.booking_id);
        Ok(())
    }
}
