use anyhow::Result;

use crate::config::FieldFixConfig;
use crate::dispatch::JobDispatcher;
use crate::gateway::{LogNotifier, StaticAuthProvider};
use crate::store::JsonFileJobStore;
use crate::workflow::JobWorkflowEngine;

pub mod act;
pub mod assign;
pub mod code;
pub mod customer;
pub mod earnings;
pub mod jobs;
pub mod money;
pub mod show;

pub type LocalDispatcher = JobDispatcher<JsonFileJobStore, LogNotifier, StaticAuthProvider>;

/// Everything a command needs, built from the loaded configuration.
pub struct AppContext {
    pub config: FieldFixConfig,
}

impl AppContext {
    pub fn new(config: FieldFixConfig) -> Self {
        Self { config }
    }

    pub fn engine(&self) -> JobWorkflowEngine {
        JobWorkflowEngine::new(self.config.workflow.clone())
    }

    pub fn store(&self) -> JsonFileJobStore {
        JsonFileJobStore::new(
            &self.config.store.path,
            self.config.workflow.completion_code_length,
        )
    }

    pub fn dispatcher(&self) -> LocalDispatcher {
        JobDispatcher::new(
            self.engine(),
            self.store(),
            LogNotifier,
            StaticAuthProvider::from_config(&self.config.session),
        )
    }
}

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self, ctx: &AppContext) -> Result<()>;
}

pub async fn show_how_to_get_work() -> Result<()> {
    println!("🔧 fieldfix - repair job workflow for technicians");
    println!();
    println!("Day to day:");
    println!("  📋 fieldfix jobs                      # Jobs assigned to you");
    println!("  🔍 fieldfix show <booking>            # Job details and next steps");
    println!("  ▶️  fieldfix act <booking> <action>    # Move a job forward");
    println!("  🔐 fieldfix verify-code <booking> <code>");
    println!("  💰 fieldfix earnings                  # What you have earned");
    println!();
    println!("💡 Run 'fieldfix act --help' to list the actions.");
    Ok(())
}
