use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use urlcheck_core::{CheckOutcome, CheckRequest};
use urlcheck_logging::{check_debug, check_error, check_info, check_warn};

use crate::{Decision, FailureKind, FetchError, HistoryWalker, QueueConnector, Task, TaskQueue};

#[derive(Debug, Clone)]
pub struct CheckerSettings {
    pub queue_take_timeout: Duration,
    pub sleep_on_fail: Duration,
    pub input_tube: String,
    pub output_tube: String,
}

impl Default for CheckerSettings {
    fn default() -> Self {
        Self {
            queue_take_timeout: Duration::from_secs(1),
            sleep_on_fail: Duration::from_secs(1),
            input_tube: "check_urls".to_string(),
            output_tube: "check_urls_results".to_string(),
        }
    }
}

/// Pull, walk, report, ack. A task whose result cannot be queued is buried
/// instead. Returns once `cancel` fires; a take already started, and the task
/// it yields, are finished first.
pub async fn run_checker_worker(
    queue: Arc<dyn TaskQueue>,
    walker: Arc<HistoryWalker>,
    settings: CheckerSettings,
    cancel: CancellationToken,
) {
    check_debug!("Checker worker started on tube={}", settings.input_tube);
    while !cancel.is_cancelled() {
        // A take is never abandoned halfway; the queue may already hold the
        // entry as taken by this worker.
        match queue.take(settings.queue_take_timeout).await {
            Ok(Some(task)) => process_task(queue.as_ref(), &walker, &settings, &task).await,
            Ok(None) => {}
            Err(err) => {
                check_error!("Take failed tube={} error={}", settings.input_tube, err);
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(settings.sleep_on_fail) => {}
                }
            }
        }
    }
    check_debug!("Checker worker stopped on tube={}", settings.input_tube);
}

async fn process_task(
    queue: &dyn TaskQueue,
    walker: &HistoryWalker,
    settings: &CheckerSettings,
    task: &Task,
) {
    let decision = match CheckRequest::from_payload(&task.payload) {
        Ok(request) => {
            let history = walker.walk(&request.url).await;
            let (tube, payload) = match request.outcome(&history) {
                CheckOutcome::Recheck(payload) => {
                    check_info!("Requeueing url={} for a recheck", request.url);
                    (settings.input_tube.as_str(), payload)
                }
                CheckOutcome::Report(payload) => (settings.output_tube.as_str(), payload),
            };
            match queue.put(tube, payload).await {
                Ok(()) => Decision::Ack,
                Err(err) => {
                    check_error!("Put failed task={} tube={} error={}", task.id, tube, err);
                    Decision::Bury
                }
            }
        }
        Err(err) => {
            check_warn!("Dropping malformed task={} error={}", task.id, err);
            Decision::Ack
        }
    };

    let settled = match decision {
        Decision::Ack => queue.ack(task).await,
        Decision::Bury => queue.bury(task).await,
    };
    if let Err(err) = settled {
        check_error!("Settling task={} as {:?} failed: {}", task.id, decision, err);
    }
}

/// True when `check_url` answers at all, whatever the status.
pub async fn check_network_status(
    client: &reqwest::Client,
    check_url: &str,
    timeout: Duration,
) -> bool {
    match client.get(check_url).timeout(timeout).send().await {
        Ok(_) => true,
        Err(err) => {
            check_warn!("Network check failed url={} error={}", check_url, err);
            false
        }
    }
}

#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    pub worker_pool_size: usize,
    pub check_url: String,
    pub probe_timeout: Duration,
    /// Pause between network checks.
    pub sleep: Duration,
    pub worker: CheckerSettings,
}

/// Keeps `worker_pool_size` checker workers running while the network is up.
///
/// When the network check fails the current workers are told to stop after
/// their in-flight task, and new ones are started once it succeeds again.
pub async fn run_checker_supervisor(
    connector: Arc<dyn QueueConnector>,
    walker: Arc<HistoryWalker>,
    settings: SupervisorSettings,
    cancel: CancellationToken,
) -> Result<(), FetchError> {
    let probe = reqwest::Client::builder()
        .connect_timeout(settings.probe_timeout)
        .build()
        .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
    let mut workers = JoinSet::new();
    let mut generation: Option<CancellationToken> = None;

    check_info!(
        "Checker supervisor started pool={} check_url={}",
        settings.worker_pool_size,
        settings.check_url
    );
    while !cancel.is_cancelled() {
        while let Some(joined) = workers.try_join_next() {
            if let Err(err) = joined {
                check_error!("Checker worker crashed: {}", err);
            }
        }

        if check_network_status(&probe, &settings.check_url, settings.probe_timeout).await {
            let token = generation.get_or_insert_with(|| cancel.child_token()).clone();
            while workers.len() < settings.worker_pool_size {
                let queue = match connector.connect().await {
                    Ok(queue) => queue,
                    Err(err) => {
                        check_error!("Could not open queue for a worker: {}", err);
                        break;
                    }
                };
                workers.spawn(run_checker_worker(
                    queue,
                    walker.clone(),
                    settings.worker.clone(),
                    token.clone(),
                ));
            }
        } else if let Some(token) = generation.take() {
            check_warn!("Network is down, stopping {} workers", workers.len());
            token.cancel();
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(settings.sleep) => {}
        }
    }

    check_info!("Checker supervisor stopping, waiting for {} workers", workers.len());
    while let Some(joined) = workers.join_next().await {
        if let Err(err) = joined {
            check_error!("Checker worker crashed: {}", err);
        }
    }
    Ok(())
}
