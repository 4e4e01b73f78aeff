use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

use crate::payment::PaymentMethod;
use crate::workflow::{CustomerDecision, JobAction};

pub mod commands;

#[derive(Parser)]
#[command(name = "fieldfix")]
#[command(about = "Technician-side workflow for on-site repair jobs")]
#[command(long_about = "fieldfix walks a repair job from assignment through inspection, quote, \
                       repair, completion-code check and payment, writing each step to the job store. \
                       Start with 'fieldfix jobs' to see what is assigned to you.")]
pub struct Cli {
    /// Configuration file to load instead of ./fieldfix.toml
    #[arg(long, global = true, help = "Path to a fieldfix.toml configuration file")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List jobs assigned to you, newest first
    Jobs {
        #[arg(long, help = "Print the jobs as JSON")]
        json: bool,
    },
    /// Show one job and the actions available on it
    Show {
        booking_id: String,
        #[arg(long, help = "Print the job as JSON")]
        json: bool,
    },
    /// Move a job to its next status
    Act {
        booking_id: String,
        #[command(subcommand)]
        action: ActionCommand,
    },
    /// Check the code the customer read out and move the job to payment
    VerifyCode { booking_id: String, code: String },
    /// Send the completion code to the customer again
    ResendCode { booking_id: String },
    /// Record the customer's answer to a shared quotation
    Customer {
        #[command(subcommand)]
        decision: CustomerCommand,
    },
    /// Add a newly dispatched job to the local store
    Assign {
        #[arg(long)]
        id: String,
        #[arg(long)]
        order_id: String,
        /// Technician receiving the job
        #[arg(long, help = "Technician id (defaults to the signed-in technician)")]
        technician: Option<String>,
        #[arg(long)]
        customer_name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        issue: String,
    },
    /// Summarise earnings from settled jobs
    Earnings {
        #[arg(long, help = "Only count jobs assigned in the last N days")]
        days: Option<i64>,
        #[arg(long, help = "Print the summary as JSON")]
        json: bool,
    },
    /// Show the technician payout for a final cost
    Payout { final_cost: Decimal },
    /// Print the UPI payment link for a job
    UpiLink {
        booking_id: String,
        #[arg(long, help = "Amount to request (defaults to the job's final cost)")]
        amount: Option<Decimal>,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ActionCommand {
    /// Take the job
    Accept,
    /// Turn the job down
    Reject {
        #[arg(long)]
        reason: Option<String>,
    },
    /// Leave for the customer's address
    StartTravel,
    /// Arrived; begin the on-site assessment
    StartInspection,
    /// Record inspection findings and the inspection fee
    SubmitInspection {
        #[arg(long = "finding", required = true, help = "One finding; repeat for more")]
        findings: Vec<String>,
        #[arg(long)]
        fee: Decimal,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        photo_url: Option<String>,
    },
    /// Send the customer a quotation
    ShareQuote {
        #[arg(long)]
        labor: Decimal,
        #[arg(long)]
        parts: Decimal,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Take payment after inspection when no repair follows
    CollectDirectPayment {
        #[arg(long)]
        amount: Decimal,
        #[arg(long, default_value = "cash", help = "cash or upi")]
        method: PaymentMethod,
        #[arg(long)]
        transaction_ref: Option<String>,
    },
    /// Begin the approved repair
    StartRepair,
    /// Record the finished repair; the customer is sent a completion code
    SubmitRepair {
        #[arg(long)]
        final_cost: Decimal,
        #[arg(long)]
        spare_parts: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Take the final payment
    CollectPayment {
        #[arg(long)]
        amount: Decimal,
        #[arg(long, default_value = "cash", help = "cash or upi")]
        method: PaymentMethod,
        #[arg(long)]
        transaction_ref: Option<String>,
    },
}

impl ActionCommand {
    pub fn into_action(self) -> JobAction {
        match self {
            ActionCommand::Accept => JobAction::Accept,
            ActionCommand::Reject { reason } => JobAction::Reject { reason },
            ActionCommand::StartTravel => JobAction::StartTravel,
            ActionCommand::StartInspection => JobAction::StartInspection,
            ActionCommand::SubmitInspection {
                findings,
                fee,
                notes,
                photo_url,
            } => JobAction::SubmitInspection {
                findings,
                fee,
                notes,
                photo_url,
            },
            ActionCommand::ShareQuote {
                labor,
                parts,
                notes,
            } => JobAction::ShareQuote {
                labor_cost: labor,
                parts_cost: parts,
                notes,
            },
            ActionCommand::CollectDirectPayment {
                amount,
                method,
                transaction_ref,
            } => JobAction::CollectDirectPayment {
                amount,
                method: with_reference(method, transaction_ref),
            },
            ActionCommand::StartRepair => JobAction::StartRepair,
            ActionCommand::SubmitRepair {
                final_cost,
                spare_parts,
                notes,
            } => JobAction::SubmitRepair {
                final_cost,
                spare_parts_used: spare_parts,
                technician_notes: notes,
            },
            ActionCommand::CollectPayment {
                amount,
                method,
                transaction_ref,
            } => JobAction::CollectPayment {
                amount,
                method: with_reference(method, transaction_ref),
            },
        }
    }
}

fn with_reference(method: PaymentMethod, transaction_ref: Option<String>) -> PaymentMethod {
    match method {
        PaymentMethod::Upi { .. } => PaymentMethod::Upi { transaction_ref },
        PaymentMethod::Cash => PaymentMethod::Cash,
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CustomerCommand {
    /// The customer accepted the quotation
    Approve { booking_id: String },
    /// The customer declined the quotation
    Reject { booking_id: String },
}

impl CustomerCommand {
    pub fn booking_id(&self) -> &str {
        match self {
            CustomerCommand::Approve { booking_id } | CustomerCommand::Reject { booking_id } => {
                booking_id
            }
        }
    }

    pub fn decision(&self) -> CustomerDecision {
        match self {
            CustomerCommand::Approve { .. } => CustomerDecision::Approve,
            CustomerCommand::Reject { .. } => CustomerDecision::Reject,
        }
    }
}
