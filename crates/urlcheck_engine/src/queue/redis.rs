use std::sync::Arc;
use std::time::Duration;

use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use urlcheck_logging::{check_info, check_warn};

use super::{QueueConnector, QueueError, Task, TaskQueue};

/// What is stored in the Redis lists.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    id: String,
    data: Map<String, Value>,
}

/// Redis-list queue.
///
/// `<prefix>:<tube>` holds ready entries, `<prefix>:<tube>:taken` entries being
/// worked on and `<prefix>:<tube>:buried` dead letters. Ids come from
/// `<prefix>:<tube>:seq`.
#[derive(Clone)]
pub struct RedisQueue {
    conn: ConnectionManager,
    prefix: String,
    tube: String,
}

impl RedisQueue {
    pub async fn connect(
        redis_url: &str,
        prefix: impl Into<String>,
        tube: impl Into<String>,
    ) -> Result<Self, QueueError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        let queue = Self {
            conn,
            prefix: prefix.into(),
            tube: tube.into(),
        };
        check_info!("Connected to queue {}", queue.key(&queue.tube, ""));
        Ok(queue)
    }

    fn key(&self, tube: &str, suffix: &str) -> String {
        if suffix.is_empty() {
            format!("{}:{}", self.prefix, tube)
        } else {
            format!("{}:{}:{}", self.prefix, tube, suffix)
        }
    }

    /// Drop one copy of `receipt` from the taken list; false if none was there.
    async fn remove_taken(&self, tube: &str, receipt: &str) -> Result<bool, QueueError> {
        let mut conn = self.conn.clone();
        let removed: i64 = redis::cmd("LREM")
            .arg(self.key(tube, "taken"))
            .arg(1)
            .arg(receipt)
            .query_async(&mut conn)
            .await?;
        Ok(removed > 0)
    }

    async fn push_buried(&self, tube: &str, receipt: &str) -> Result<(), QueueError> {
        let mut conn = self.conn.clone();
        let _: i64 = redis::cmd("LPUSH")
            .arg(self.key(tube, "buried"))
            .arg(receipt)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }
}

fn parse_entry(tube: &str, raw: String) -> Result<Task, serde_json::Error> {
    let envelope: Envelope = serde_json::from_str(&raw)?;
    Ok(Task::new(envelope.id, tube, envelope.data).with_receipt(raw))
}

#[async_trait::async_trait]
impl TaskQueue for RedisQueue {
    async fn take(&self, timeout: Duration) -> Result<Option<Task>, QueueError> {
        let mut conn = self.conn.clone();
        let ready = self.key(&self.tube, "");
        let taken = self.key(&self.tube, "taken");

        // BLMOVE treats a zero timeout as "block forever".
        let raw: Option<String> = if timeout.is_zero() {
            redis::cmd("LMOVE")
                .arg(&ready)
                .arg(&taken)
                .arg("RIGHT")
                .arg("LEFT")
                .query_async(&mut conn)
                .await?
        } else {
            redis::cmd("BLMOVE")
                .arg(&ready)
                .arg(&taken)
                .arg("RIGHT")
                .arg("LEFT")
                .arg(timeout.as_secs_f64())
                .query_async(&mut conn)
                .await?
        };

        let Some(raw) = raw else {
            return Ok(None);
        };
        match parse_entry(&self.tube, raw.clone()) {
            Ok(task) => Ok(Some(task)),
            Err(err) => {
                // No consumer can settle an entry it cannot read.
                check_warn!("Burying unreadable entry on {}: {}", ready, err);
                self.remove_taken(&self.tube, &raw).await?;
                self.push_buried(&self.tube, &raw).await?;
                Err(err.into())
            }
        }
    }

    async fn ack(&self, task: &Task) -> Result<(), QueueError> {
        if !self.remove_taken(&task.tube, task.receipt()).await? {
            return Err(QueueError::NotTaken(task.id.clone()));
        }
        Ok(())
    }

    async fn bury(&self, task: &Task) -> Result<(), QueueError> {
        self.ack(task).await?;
        self.push_buried(&task.tube, task.receipt()).await
    }

    async fn put(&self, tube: &str, payload: Map<String, Value>) -> Result<(), QueueError> {
        let mut conn = self.conn.clone();
        let id: u64 = redis::cmd("INCR")
            .arg(self.key(tube, "seq"))
            .query_async(&mut conn)
            .await?;
        let envelope = Envelope {
            id: id.to_string(),
            data: payload,
        };
        let _: i64 = redis::cmd("LPUSH")
            .arg(self.key(tube, ""))
            .arg(serde_json::to_string(&envelope)?)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }
}

/// Opens one [`RedisQueue`] per worker on the same tube.
#[derive(Debug, Clone)]
pub struct RedisConnector {
    pub redis_url: String,
    pub prefix: String,
    pub tube: String,
}

#[async_trait::async_trait]
impl QueueConnector for RedisConnector {
    async fn connect(&self) -> Result<Arc<dyn TaskQueue>, QueueError> {
        let queue =
            RedisQueue::connect(&self.redis_url, self.prefix.clone(), self.tube.clone()).await?;
        Ok(Arc::new(queue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entry_keeps_raw_text_as_receipt() {
        let raw = r#"{"id":"5","data":{"callback_url":"http://cb.ru"}}"#.to_string();
        let task = parse_entry("notifications", raw.clone()).unwrap();
        assert_eq!(task.id, "5");
        assert_eq!(task.tube, "notifications");
        assert_eq!(task.receipt(), raw);
    }

    #[test]
    fn entry_without_envelope_is_rejected() {
        assert!(parse_entry("notifications", r#"{"url":"http://url.ru"}"#.into()).is_err());
        assert!(parse_entry("notifications", "not json".into()).is_err());
    }

    /// Needs a scratch Redis, e.g. `REDIS_URL=redis://127.0.0.1/15`.
    #[tokio::test]
    #[ignore = "needs a Redis server at REDIS_URL"]
    async fn unreadable_entry_is_buried_not_stranded() {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/15".into());
        let prefix = format!("urlcheck-test-{}", std::process::id());
        let queue = RedisQueue::connect(&url, prefix.clone(), "broken").await.unwrap();
        let mut conn = queue.conn.clone();
        let _: i64 = redis::cmd("LPUSH")
            .arg(queue.key("broken", ""))
            .arg("not json")
            .query_async(&mut conn)
            .await
            .unwrap();

        let err = queue.take(Duration::from_millis(100)).await.unwrap_err();
        assert!(matches!(err, QueueError::Serialization(_)));

        let taken: Vec<String> = redis::cmd("LRANGE")
            .arg(queue.key("broken", "taken"))
            .arg(0)
            .arg(-1)
            .query_async(&mut conn)
            .await
            .unwrap();
        let buried: Vec<String> = redis::cmd("LRANGE")
            .arg(queue.key("broken", "buried"))
            .arg(0)
            .arg(-1)
            .query_async(&mut conn)
            .await
            .unwrap();
        assert!(taken.is_empty());
        assert_eq!(buried, vec!["not json".to_string()]);

        let _: i64 = redis::cmd("DEL")
            .arg(queue.key("broken", ""))
            .arg(queue.key("broken", "taken"))
            .arg(queue.key("broken", "buried"))
            .query_async(&mut conn)
            .await
            .unwrap();
    }

    #[test]
    fn envelope_round_trips_task_payload() {
        let raw = r#"{"id":"42","data":{"url":"http://url.ru","url_id":7}}"#;
        let envelope: Envelope = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.id, "42");
        assert_eq!(envelope.data.get("url_id"), Some(&json!(7)));
        assert_eq!(serde_json::to_string(&envelope).unwrap(), raw);
    }
}
