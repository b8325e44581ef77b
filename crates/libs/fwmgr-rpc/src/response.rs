//! Reply classification.
//!
//! Replies go through two independent checks. The HTTP status comes first and
//! is never skipped: anything other than 200 is an [`ClientError::Http`]
//! regardless of the body. Only then is the body held to the `result` array
//! contract, where the entry count must match the number of parameter objects
//! sent before any per-entry status is trusted.

use crate::config::ResultMode;
use crate::error::{BatchFailure, ClientError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub const HTTP_OK: u16 = 200;

/// What the transport hands back for one POST.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
    pub json: Option<JsonValue>,
}

impl HttpReply {
    /// Keeps the raw body and decodes it when it is valid JSON.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let json = serde_json::from_str(&body).ok();
        Self { status, body, json }
    }

    pub fn from_json(status: u16, value: &JsonValue) -> Self {
        Self { status, body: value.to_string(), json: Some(value.clone()) }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultStatus {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ResultEntry {
    #[serde(default)]
    pub url: String,
    pub status: ResultStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

impl ResultEntry {
    pub fn is_success(&self) -> bool {
        self.status.code == 0
    }

    fn as_failure(&self) -> BatchFailure {
        BatchFailure {
            url: self.url.clone(),
            code: self.status.code,
            message: self.status.message.clone(),
        }
    }
}

/// A reply that passed both stages.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedReply {
    /// Whole decoded body; login reads its top-level `session` from here.
    pub body: JsonValue,
    /// `None` only when a lenient reply carried no `result` at all.
    pub entries: Option<Vec<ResultEntry>>,
}

pub fn validate(reply: &HttpReply, expected: usize, mode: ResultMode) -> Result<ValidatedReply> {
    if reply.status != HTTP_OK {
        return Err(ClientError::Http { code: reply.status, body: reply.body.clone() });
    }

    let body = match &reply.json {
        Some(body @ JsonValue::Object(_)) => body.clone(),
        _ => return Err(ClientError::malformed(reply.body.as_str())),
    };

    let Some(raw_result) = body.get("result") else {
        return match mode {
            ResultMode::Lenient => Ok(ValidatedReply { body, entries: None }),
            ResultMode::Strict => Err(ClientError::malformed(reply.body.as_str())),
        };
    };

    let entries = parse_entries(raw_result, expected)
        .ok_or_else(|| ClientError::malformed(reply.body.as_str()))?;

    if expected == 1 {
        let entry = &entries[0];
        if !entry.is_success() {
            return Err(ClientError::Rpc {
                code: entry.status.code,
                message: entry.status.message.clone(),
            });
        }
    } else {
        let failures = entries
            .iter()
            .filter(|entry| !entry.is_success())
            .map(ResultEntry::as_failure)
            .collect::<Vec<_>>();
        if !failures.is_empty() {
            return Err(ClientError::RpcBatch { failures });
        }
    }

    Ok(ValidatedReply { body, entries: Some(entries) })
}

fn parse_entries(raw: &JsonValue, expected: usize) -> Option<Vec<ResultEntry>> {
    let items = raw.as_array()?;
    if items.len() != expected || expected == 0 {
        return None;
    }
    items
        .iter()
        .map(|item| {
            if !item.is_object() {
                return None;
            }
            serde_json::from_value::<ResultEntry>(item.clone()).ok()
        })
        .collect()
}
