//! Sequential activity publishing.

use std::sync::Arc;

use tracing::{error, info};

use gistpipe_core::{Activity, PublishOutcome};

use crate::destination::ActivityApi;

/// Submits activities one at a time and keeps the accepted ones.
pub struct DestinationPublisher {
    api: Arc<dyn ActivityApi>,
}

impl DestinationPublisher {
    pub fn new(api: Arc<dyn ActivityApi>) -> Self {
        DestinationPublisher { api }
    }

    /// Publishes every activity in order.
    ///
    /// The result is the order-preserving subset the destination accepted.
    /// Rejections are logged and skipped.
    pub async fn publish(&self, activities: &[Activity]) -> Vec<PublishOutcome> {
        let mut outcomes = Vec::with_capacity(activities.len());

        for activity in activities {
            match self.api.create_activity(activity).await {
                Ok(outcome) => {
                    info!(
                        id = outcome.id,
                        subject = %outcome.subject,
                        "Activity created"
                    );
                    outcomes.push(outcome);
                }
                Err(e) => {
                    error!(subject = %activity.subject, error = %e, "Failed to create activity");
                }
            }
        }

        outcomes
    }
}
