use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::workflow::{compute_payout, Job, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EarningsEntry {
    pub booking_id: String,
    pub category: String,
    pub assigned_at: DateTime<Utc>,
    pub final_cost: Decimal,
    pub platform_fee: Decimal,
    pub payout: Decimal,
}

/// What a technician has earned from settled jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EarningsSummary {
    pub fee_percent: Decimal,
    pub completed_jobs: usize,
    pub gross: Decimal,
    pub platform_fee: Decimal,
    pub payout: Decimal,
    pub entries: Vec<EarningsEntry>,
}

impl EarningsSummary {
    /// Summarise `jobs`, counting only those whose payment has been taken.
    /// `since` keeps jobs assigned at or after that instant.
    pub fn from_jobs(
        jobs: &[Job],
        fee_percent: Decimal,
        since: Option<DateTime<Utc>>,
    ) -> Result<Self, ValidationError> {
        let mut entries = Vec::new();
        for job in jobs {
            if since.is_some_and(|since| job.assigned_at < since) {
                continue;
            }
            let Some(final_cost) = job.stage.settlement().map(|s| s.final_cost()) else {
                continue;
            };
            let payout = compute_payout(final_cost, fee_percent)?;
            entries.push(EarningsEntry {
                booking_id: job.id.clone(),
                category: job.category.clone(),
                assigned_at: job.assigned_at,
                final_cost,
                platform_fee: final_cost - payout,
                payout,
            });
        }

        let total = |field: &'static str, value: fn(&EarningsEntry) -> Decimal| {
            entries
                .iter()
                .try_fold(Decimal::ZERO, |acc, e| acc.checked_add(value(e)))
                .ok_or(ValidationError::AmountOutOfRange { field })
        };
        let gross = total("gross", |e| e.final_cost)?;
        let platform_fee = total("platform_fee", |e| e.platform_fee)?;
        let payout = total("payout", |e| e.payout)?;

        Ok(Self {
            fee_percent,
            completed_jobs: entries.len(),
            gross,
            platform_fee,
            payout,
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::engine::fixtures::job_in;
    use crate::workflow::JobStatus;
    use chrono::Duration;

    #[test]
    fn test_only_settled_jobs_count() {
        let jobs = vec![
            job_in(JobStatus::RepairCompleted),
            job_in(JobStatus::PaymentPending),
            job_in(JobStatus::Cancelled),
            job_in(JobStatus::Completed),
        ];
        let summary = EarningsSummary::from_jobs(&jobs, Decimal::from(18), None).unwrap();

        assert_eq!(summary.completed_jobs, 2);
        assert_eq!(summary.gross, Decimal::from(3400));
        // 1700 * 0.82 = 1394 per job
        assert_eq!(summary.payout, Decimal::from(2788));
        assert_eq!(summary.platform_fee, Decimal::from(612));
    }

    #[test]
    fn test_since_filter() {
        let mut old = job_in(JobStatus::Completed);
        old.assigned_at = Utc::now() - Duration::days(40);
        let recent = job_in(JobStatus::Completed);

        let summary = EarningsSummary::from_jobs(
            &[old, recent],
            Decimal::from(18),
            Some(Utc::now() - Duration::days(30)),
        )
        .unwrap();
        assert_eq!(summary.completed_jobs, 1);
    }

    #[test]
    fn test_bad_fee_is_an_error() {
        let jobs = vec![job_in(JobStatus::Completed)];
        assert!(EarningsSummary::from_jobs(&jobs, Decimal::from(101), None).is_err());
    }

    #[test]
    fn test_empty() {
        let summary = EarningsSummary::from_jobs(&[], Decimal::from(18), None).unwrap();
        assert_eq!(summary.completed_jobs, 0);
        assert_eq!(summary.payout, Decimal::ZERO);
    }
}
