use async_trait::async_trait;
use tracing::info;

use super::{NotifierError, NotifierGateway};
use crate::workflow::Customer;

/// Records the delivery request in the log. Push and SMS transport live
/// outside this crate.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotifierGateway for LogNotifier {
    async fn send_completion_code(
        &self,
        booking_id: &str,
        customer: &Customer,
    ) -> Result<(), NotifierError> {
        if customer.phone.trim().is_empty() {
            return Err(NotifierError::Undeliverable {
                phone: customer.phone.clone(),
                reason: "no phone number on file".to_string(),
            });
        }
        info!(
            booking_id = %booking_id,
            customer = %customer.name,
            "Completion code delivery requested"
        );
        Ok(())
    }
}
