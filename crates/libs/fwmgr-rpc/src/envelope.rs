//! Request framing.
//!
//! One envelope carries one verb and 1..N parameter objects. The reply is
//! expected to hold exactly one result entry per parameter object, so the
//! envelope remembers how many it sent.

use crate::error::{ClientError, Result};
use crate::sequencer::TransactionSequencer;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::fmt;

const REDACTED: &str = "<redacted>";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Get,
    Set,
    Add,
    Update,
    Delete,
    Exec,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::Add => "add",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Exec => "exec",
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "get" => Ok(Self::Get),
            "set" => Ok(Self::Set),
            "add" => Ok(Self::Add),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "exec" => Ok(Self::Exec),
            other => Err(ClientError::invalid_argument(format!("unknown rpc method '{other}'"))),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `params` entry: a `url` plus optional `data` and free-form
/// method-specific fields such as `fields`, `filter` or `option`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamObject(JsonMap<String, JsonValue>);

impl ParamObject {
    pub fn new(url: impl Into<String>) -> Self {
        let mut map = JsonMap::new();
        map.insert("url".to_owned(), JsonValue::String(url.into()));
        Self(map)
    }

    /// Merges `extra` under `url`. The explicit url always wins over any
    /// `url` key in `extra`.
    pub fn from_parts(url: impl Into<String>, extra: Option<JsonMap<String, JsonValue>>) -> Self {
        let mut map = extra.unwrap_or_default();
        map.insert("url".to_owned(), JsonValue::String(url.into()));
        Self(map)
    }

    pub fn with_data(self, data: JsonValue) -> Self {
        self.with_field("data", data)
    }

    pub fn with_fields<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = fields.into_iter().map(|field| JsonValue::String(field.into())).collect();
        self.with_field("fields", JsonValue::Array(fields))
    }

    pub fn with_field(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn url(&self) -> Option<&str> {
        self.0.get("url").and_then(JsonValue::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    pub fn into_value(self) -> JsonValue {
        JsonValue::Object(self.0)
    }
}

impl From<ParamObject> for JsonValue {
    fn from(value: ParamObject) -> Self {
        value.into_value()
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct CallEnvelope {
    pub id: u64,
    pub method: Method,
    pub params: Vec<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<u8>,
}

impl CallEnvelope {
    /// Frames `params` under a fresh id from `sequencer`.
    ///
    /// `params` must be a non-empty array of objects. The id is drawn only
    /// after the shape check passes, so a rejected envelope leaves no gap in
    /// the id sequence.
    pub fn build(
        sequencer: &mut TransactionSequencer,
        method: Method,
        params: JsonValue,
        session: Option<&str>,
        verbose: bool,
    ) -> Result<Self> {
        let JsonValue::Array(params) = params else {
            return Err(ClientError::invalid_argument(
                "rpc params must be an array of parameter objects",
            ));
        };
        if params.is_empty() {
            return Err(ClientError::invalid_argument("rpc params must not be empty"));
        }
        if let Some(index) = params.iter().position(|entry| !entry.is_object()) {
            return Err(ClientError::invalid_argument(format!(
                "rpc params entry {index} is not an object"
            )));
        }

        Ok(Self {
            id: sequencer.next_id(),
            method,
            params,
            session: session.map(str::to_owned),
            verbose: verbose.then_some(1),
        })
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn is_batch(&self) -> bool {
        self.params.len() > 1
    }

    pub fn urls(&self) -> Vec<&str> {
        self.params
            .iter()
            .filter_map(|param| param.get("url").and_then(JsonValue::as_str))
            .collect()
    }

    pub fn to_value(&self) -> Result<JsonValue> {
        serde_json::to_value(self)
            .map_err(|err| ClientError::invalid_argument(format!("envelope encode failed: {err}")))
    }

    /// Wire form with the session token and any `passwd` replaced, for logs.
    pub fn redacted(&self) -> JsonValue {
        let mut value = self.to_value().unwrap_or(JsonValue::Null);
        redact_value(&mut value);
        value
    }
}

pub(crate) fn redact_value(value: &mut JsonValue) {
    match value {
        JsonValue::Object(map) => {
            for (key, entry) in map.iter_mut() {
                if matches!(key.as_str(), "passwd" | "session") && !entry.is_null() {
                    *entry = JsonValue::String(REDACTED.to_owned());
                } else {
                    redact_value(entry);
                }
            }
        }
        JsonValue::Array(items) => items.iter_mut().for_each(redact_value),
        _ => {}
    }
}
