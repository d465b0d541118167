use std::time::Duration;

use urlcheck_core::NotificationRequest;
use urlcheck_logging::{check_info, check_warn};

use crate::fetch::map_reqwest_error;
use crate::{FailureKind, FetchError, Task};

/// What the queue should do with a notification task once delivery finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Ack,
    Bury,
}

/// POSTs notification payloads to their `callback_url`.
#[derive(Debug, Clone)]
pub struct Deliverer {
    client: reqwest::Client,
    timeout: Duration,
}

impl Deliverer {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// A transport failure buries the task. Any response the receiver sends
    /// back, whatever its status, acks it.
    pub async fn deliver(&self, task: &Task) -> Decision {
        let request = match NotificationRequest::from_payload(&task.payload) {
            Ok(request) => request,
            Err(err) => {
                check_warn!("Unusable notification task={} error={}", task.id, err);
                return Decision::Bury;
            }
        };
        let id = request.id.as_ref().map(ToString::to_string).unwrap_or_default();

        let sent = self
            .client
            .post(request.callback_url.as_str())
            .json(&task.payload)
            .send()
            .await;

        match sent {
            Ok(response) => {
                check_info!(
                    "Delivered id={} callback_url={} status={}",
                    id,
                    request.callback_url,
                    response.status().as_u16()
                );
                Decision::Ack
            }
            Err(err) => {
                let err = map_reqwest_error(err);
                check_warn!(
                    "Delivery failed id={} callback_url={} kind={} error={}",
                    id,
                    request.callback_url,
                    err.kind,
                    err.message
                );
                Decision::Bury
            }
        }
    }
}
