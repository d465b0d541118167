use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use urlcheck_logging::{check_debug, check_error, check_info, check_warn};

use crate::{Decision, Deliverer, Task, TaskQueue};

#[derive(Debug, Clone)]
pub struct PusherSettings {
    pub worker_pool_size: usize,
    pub queue_take_timeout: Duration,
    /// Pause between batches.
    pub sleep: Duration,
    pub sleep_on_fail: Duration,
    pub shutdown_timeout: Duration,
}

impl Default for PusherSettings {
    fn default() -> Self {
        Self {
            worker_pool_size: 10,
            queue_take_timeout: Duration::from_millis(100),
            sleep: Duration::from_millis(100),
            sleep_on_fail: Duration::from_secs(1),
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

type Delivery = (Task, Decision);

/// Runs up to `worker_pool_size` deliveries at once. Finished deliveries are
/// settled on the queue before the next batch is taken.
pub async fn run_pusher(
    queue: Arc<dyn TaskQueue>,
    deliverer: Arc<Deliverer>,
    settings: PusherSettings,
    cancel: CancellationToken,
) {
    let mut in_flight: JoinSet<Delivery> = JoinSet::new();
    check_info!("Notification pusher started pool={}", settings.worker_pool_size);

    while !cancel.is_cancelled() {
        let free = settings.worker_pool_size.saturating_sub(in_flight.len());
        for _ in 0..free {
            if cancel.is_cancelled() {
                break;
            }
            // Runs to completion even if `cancel` fires meanwhile.
            match queue.take(settings.queue_take_timeout).await {
                Ok(Some(task)) => {
                    check_debug!("Took notification task={}", task.id);
                    let deliverer = deliverer.clone();
                    in_flight.spawn(async move {
                        let decision = deliverer.deliver(&task).await;
                        (task, decision)
                    });
                }
                Ok(None) => break,
                Err(err) => {
                    check_error!("Take failed error={}", err);
                    tokio::select! {
                        _ = cancel.cancelled() => {}
                        _ = tokio::time::sleep(settings.sleep_on_fail) => {}
                    }
                    break;
                }
            }
        }

        while let Some(joined) = in_flight.try_join_next() {
            settle(queue.as_ref(), joined).await;
        }

        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(settings.sleep) => {}
        }
    }

    check_info!("Notification pusher stopping, {} deliveries in flight", in_flight.len());
    let drained = tokio::time::timeout(settings.shutdown_timeout, async {
        while let Some(joined) = in_flight.join_next().await {
            settle(queue.as_ref(), joined).await;
        }
    })
    .await;
    if drained.is_err() {
        check_warn!(
            "Shutdown timeout hit, abandoning {} deliveries",
            in_flight.len()
        );
        in_flight.abort_all();
    }
}

async fn settle(queue: &dyn TaskQueue, joined: Result<Delivery, JoinError>) {
    let (task, decision) = match joined {
        Ok(delivery) => delivery,
        Err(err) => {
            check_error!("Delivery task crashed: {}", err);
            return;
        }
    };
    let settled = match decision {
        Decision::Ack => queue.ack(&task).await,
        Decision::Bury => queue.bury(&task).await,
    };
    if let Err(err) = settled {
        check_error!("Settling task={} as {:?} failed: {}", task.id, decision, err);
    }
}
