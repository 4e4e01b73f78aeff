use anyhow::Result;
use clap::Parser;

use fieldfix::cli::commands::act::ActCommand;
use fieldfix::cli::commands::assign::AssignCommand;
use fieldfix::cli::commands::code::{ResendCodeCommand, VerifyCodeCommand};
use fieldfix::cli::commands::customer::CustomerDecisionCommand;
use fieldfix::cli::commands::earnings::EarningsCommand;
use fieldfix::cli::commands::jobs::JobsCommand;
use fieldfix::cli::commands::money::{PayoutCommand, UpiLinkCommand};
use fieldfix::cli::commands::show::ShowCommand;
use fieldfix::cli::commands::{show_how_to_get_work, AppContext, Command};
use fieldfix::cli::{Cli, Commands};
use fieldfix::config::FieldFixConfig;
use fieldfix::telemetry::init_telemetry;
use fieldfix::workflow::Customer;

fn main() -> Result<()> {
    let cli = Cli::parse();

    FieldFixConfig::load_env_file()?;
    let config = FieldFixConfig::load(cli.config.as_deref())?;
    init_telemetry(&config.observability)?;
    let ctx = AppContext::new(config);

    tokio::runtime::Runtime::new()?.block_on(async { run(cli.command, &ctx).await })
}

async fn run(command: Option<Commands>, ctx: &AppContext) -> Result<()> {
    match command {
        None => show_how_to_get_work().await,
        Some(Commands::Jobs { json }) => JobsCommand { json }.execute(ctx).await,
        Some(Commands::Show { booking_id, json }) => {
            ShowCommand { booking_id, json }.execute(ctx).await
        }
        Some(Commands::Act { booking_id, action }) => {
            ActCommand { booking_id, action }.execute(ctx).await
        }
        Some(Commands::VerifyCode { booking_id, code }) => {
            VerifyCodeCommand { booking_id, code }.execute(ctx).await
        }
        Some(Commands::ResendCode { booking_id }) => {
            ResendCodeCommand { booking_id }.execute(ctx).await
        }
        Some(Commands::Customer { decision }) => {
            CustomerDecisionCommand { decision }.execute(ctx).await
        }
        Some(Commands::Assign {
            id,
            order_id,
            technician,
            customer_name,
            phone,
            address,
            category,
            issue,
        }) => {
            AssignCommand {
                id,
                order_id,
                technician,
                customer: Customer {
                    name: customer_name,
                    phone,
                    address,
                },
                category,
                issue,
            }
            .execute(ctx)
            .await
        }
        Some(Commands::Earnings { days, json }) => EarningsCommand { days, json }.execute(ctx).await,
        Some(Commands::Payout { final_cost }) => PayoutCommand { final_cost }.execute(ctx).await,
        Some(Commands::UpiLink { booking_id, amount }) => {
            UpiLinkCommand { booking_id, amount }.execute(ctx).await
        }
    }
}
