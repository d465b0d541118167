use serde_json::{Map, Value};

use crate::{PayloadError, RedirectHistory};

pub const CHECK_TYPE_NORMAL: &str = "normal";

/// A URL-check task as read from the input tube:
/// `{url, url_id, recheck?, suspicious?}`.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckRequest {
    pub url: String,
    pub url_id: Value,
    pub recheck: bool,
    pub suspicious: Option<Value>,
    payload: Map<String, Value>,
}

/// What the checker worker should do with a resolved chain.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// Put this payload back on the input tube for a second attempt.
    Recheck(Map<String, Value>),
    /// Put this result on the output tube.
    Report(Map<String, Value>),
}

impl CheckRequest {
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, PayloadError> {
        let url = match payload.get("url") {
            Some(Value::String(url)) => url.clone(),
            Some(_) => return Err(PayloadError::InvalidField("url")),
            None => return Err(PayloadError::MissingField("url")),
        };
        let url_id = payload
            .get("url_id")
            .cloned()
            .ok_or(PayloadError::MissingField("url_id"))?;
        let recheck = payload.get("recheck").is_some_and(is_truthy);
        let suspicious = payload.get("suspicious").filter(|v| is_truthy(v)).cloned();

        Ok(Self {
            url,
            url_id,
            recheck,
            suspicious,
            payload: payload.clone(),
        })
    }

    /// A failed chain gets exactly one recheck; everything else is reported.
    pub fn outcome(&self, history: &RedirectHistory) -> CheckOutcome {
        if history.has_error() && !self.recheck {
            let mut payload = self.payload.clone();
            payload.insert("recheck".to_string(), Value::Bool(true));
            return CheckOutcome::Recheck(payload);
        }

        let mut report = Map::new();
        report.insert("url_id".to_string(), self.url_id.clone());
        report.insert("result".to_string(), history.to_result_value());
        report.insert(
            "check_type".to_string(),
            Value::String(CHECK_TYPE_NORMAL.to_string()),
        );
        if let Some(suspicious) = &self.suspicious {
            report.insert("suspicious".to_string(), suspicious.clone());
        }
        CheckOutcome::Report(report)
    }
}

/// A notification task as read from the pusher tube: `{callback_url, id, ..}`.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRequest {
    pub callback_url: String,
    pub id: Option<Value>,
}

impl NotificationRequest {
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, PayloadError> {
        let callback_url = match payload.get("callback_url") {
            Some(Value::String(url)) => url.clone(),
            Some(_) => return Err(PayloadError::InvalidField("callback_url")),
            None => return Err(PayloadError::MissingField("callback_url")),
        };
        Ok(Self {
            callback_url,
            id: payload.get("id").cloned(),
        })
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}
