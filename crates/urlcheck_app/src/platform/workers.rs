//! Turns parsed configs into running worker loops.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use urlcheck_core::{CounterRegistry, DomainRules};
use urlcheck_engine::{
    run_checker_supervisor, run_pusher, CheckerSettings, Deliverer, FetchSettings,
    HistoryWalker, PusherSettings, RedirectClassifier, RedisConnector, RedisQueue,
    ReqwestFetcher, SupervisorSettings,
};
use urlcheck_logging::check_info;

use super::config::{CheckerConfig, PusherConfig};

/// Builds the fetcher, classifier and walker a checker pool shares.
pub fn build_walker(config: &CheckerConfig) -> anyhow::Result<Arc<HistoryWalker>> {
    let fetcher = ReqwestFetcher::new(FetchSettings {
        timeout: config.http_timeout(),
        user_agent: config.user_agent.clone(),
        ..FetchSettings::default()
    })?;
    let domains = DomainRules::new(
        config.domains.terminal_redirects.as_slice(),
        config.domains.self_terminal.as_slice(),
    )
    .context("invalid domain pattern")?;

    let mut counters = CounterRegistry::builtin().context("invalid builtin counter pattern")?;
    for extra in &config.extra_counters {
        counters = counters
            .with_signature(&extra.name, &extra.pattern)
            .context("invalid counter pattern")?;
    }

    let classifier = RedirectClassifier::new(Arc::new(fetcher), Arc::new(domains));
    Ok(Arc::new(HistoryWalker::new(
        classifier,
        Arc::new(counters),
        config.max_redirects,
    )))
}

pub fn supervisor_settings(config: &CheckerConfig) -> SupervisorSettings {
    SupervisorSettings {
        worker_pool_size: config.worker_pool_size,
        check_url: config.check_url.clone(),
        probe_timeout: config.http_timeout(),
        sleep: Duration::from_secs(config.sleep_secs),
        worker: CheckerSettings {
            queue_take_timeout: Duration::from_secs(config.queue_take_timeout_secs),
            sleep_on_fail: Duration::from_secs(config.sleep_on_fail_secs),
            input_tube: config.queue.input_tube.clone(),
            output_tube: config.queue.output_tube.clone(),
        },
    }
}

pub fn pusher_settings(config: &PusherConfig) -> PusherSettings {
    PusherSettings {
        worker_pool_size: config.worker_pool_size,
        queue_take_timeout: Duration::from_secs(config.queue_take_timeout_secs),
        sleep: Duration::from_secs(config.sleep_secs),
        sleep_on_fail: Duration::from_secs(config.sleep_on_fail_secs),
        shutdown_timeout: Duration::from_secs(config.shutdown_timeout_secs),
    }
}

pub async fn run_redirect_checker(
    config: CheckerConfig,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let walker = build_walker(&config)?;
    let connector = Arc::new(RedisConnector {
        redis_url: config.queue.redis_url(),
        prefix: config.queue.prefix.clone(),
        tube: config.queue.input_tube.clone(),
    });
    check_info!(
        "Redirect checker reading {} from {}",
        config.queue.input_tube,
        connector.redis_url
    );
    run_checker_supervisor(connector, walker, supervisor_settings(&config), cancel).await?;
    Ok(())
}

pub async fn run_notification_pusher(
    config: PusherConfig,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let redis_url = config.queue.redis_url();
    let queue = RedisQueue::connect(
        &redis_url,
        config.queue.prefix.clone(),
        config.queue.input_tube.clone(),
    )
    .await
    .with_context(|| format!("cannot connect to queue at {redis_url}"))?;
    let deliverer = Deliverer::new(Duration::from_secs(config.http_timeout_secs))?;

    run_pusher(
        Arc::new(queue),
        Arc::new(deliverer),
        pusher_settings(&config),
        cancel,
    )
    .await;
    Ok(())
}
