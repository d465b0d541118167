//! Urlcheck engine: fetching, chain resolution, queues and the worker loops.
mod checker;
mod classify;
mod decode;
mod deliver;
mod fetch;
mod pusher;
mod queue;
mod types;
mod walk;

pub use checker::{
    check_network_status, run_checker_supervisor, run_checker_worker, CheckerSettings,
    SupervisorSettings,
};
pub use classify::{Classification, RedirectClassifier};
pub use decode::{decode_body, DecodedBody};
pub use deliver::{Decision, Deliverer};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use pusher::{run_pusher, PusherSettings};
pub use queue::{
    MemoryQueue, QueueConnector, QueueError, RedisConnector, RedisQueue, Task, TaskQueue,
};
pub use types::{FailureKind, FetchError, FetchOutput};
pub use walk::{HistoryWalker, DEFAULT_MAX_HOPS};
