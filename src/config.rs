use anyhow::Result;
use config::{Config, Environment, File};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::gateway::Role;

/// Main configuration structure for fieldfix
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FieldFixConfig {
    /// Workflow rules shared by every job
    pub workflow: WorkflowConfig,
    /// Where customers pay
    pub payment: PaymentConfig,
    /// Signed-in technician for the command-line front end
    pub session: SessionConfig,
    /// JSON job store location
    pub store: StoreConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Share of the final cost kept by the marketplace, in percent
    pub platform_fee_percent: Decimal,
    /// Number of digits in the customer completion code
    pub completion_code_length: usize,
    /// Failed code entries allowed per issued code; unlimited when unset
    pub max_code_attempts: Option<u32>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            platform_fee_percent: Decimal::from(18),
            completion_code_length: 4,
            max_code_attempts: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PaymentConfig {
    /// UPI virtual payment address receiving customer payments
    pub upi_vpa: String,
    /// Payee name shown in the customer's UPI app
    pub payee_name: String,
    /// ISO currency code
    pub currency: String,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            upi_vpa: "payments@fieldfix".to_string(),
            payee_name: "FieldFix".to_string(),
            currency: "INR".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Technician user id (can be set via env var)
    pub user_id: String,
    pub role: Role,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_id: "technician".to_string(),
            role: Role::Technician,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the JSON job document
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: ".fieldfix/jobs.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}

impl FieldFixConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (fieldfix.toml, or `path` when given)
    /// 3. Environment variables (FIELDFIX__SECTION__KEY)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        match path {
            Some(path) => {
                builder = builder.add_source(File::from(path));
            }
            None if Path::new("fieldfix.toml").exists() => {
                builder = builder.add_source(File::with_name("fieldfix"));
            }
            None => {}
        }

        builder = builder.add_source(
            Environment::with_prefix("FIELDFIX")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let fieldfix_config: FieldFixConfig = config.try_deserialize()?;
        Ok(fieldfix_config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}
