use super::Transport;
use crate::error::{ClientError, Result};
use crate::response::HttpReply;
use serde_json::{json, Value as JsonValue};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays queued replies and records every posted body.
#[derive(Default)]
pub(crate) struct MockTransport {
    replies: Mutex<VecDeque<Result<HttpReply>>>,
    sent: Mutex<Vec<(String, JsonValue)>>,
}

impl MockTransport {
    pub(crate) fn new(replies: Vec<Result<HttpReply>>) -> Self {
        Self { replies: Mutex::new(VecDeque::from(replies)), sent: Mutex::new(Vec::new()) }
    }

    pub(crate) fn push(&self, reply: Result<HttpReply>) {
        self.replies.lock().expect("replies mutex poisoned").push_back(reply);
    }

    pub(crate) fn sent(&self) -> Vec<(String, JsonValue)> {
        self.sent.lock().expect("sent mutex poisoned").clone()
    }

    pub(crate) fn sent_bodies(&self) -> Vec<JsonValue> {
        self.sent().into_iter().map(|(_, body)| body).collect()
    }

    pub(crate) fn last_body(&self) -> JsonValue {
        self.sent_bodies().pop().expect("nothing was sent")
    }

    pub(crate) fn remaining(&self) -> usize {
        self.replies.lock().expect("replies mutex poisoned").len()
    }
}

impl Transport for MockTransport {
    fn post(&self, path: &str, body: &JsonValue) -> Result<HttpReply> {
        self.sent.lock().expect("sent mutex poisoned").push((path.to_owned(), body.clone()));
        self.replies
            .lock()
            .expect("replies mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Transport("no reply queued".into())))
    }
}

pub(crate) fn ok_entry(url: &str, data: Option<JsonValue>) -> JsonValue {
    let mut entry = json!({"url": url, "status": {"code": 0, "message": "OK"}});
    if let Some(data) = data {
        entry["data"] = data;
    }
    entry
}

pub(crate) fn failed_entry(url: &str, code: i64, message: &str) -> JsonValue {
    json!({"url": url, "status": {"code": code, "message": message}})
}

pub(crate) fn reply(entries: Vec<JsonValue>) -> Result<HttpReply> {
    Ok(HttpReply::from_json(200, &json!({ "result": entries })))
}

pub(crate) fn login_reply(token: &str) -> Result<HttpReply> {
    Ok(HttpReply::from_json(
        200,
        &json!({"session": token, "result": [ok_entry("/sys/login/user", None)]}),
    ))
}

pub(crate) fn domains_reply(names: &[&str]) -> Result<HttpReply> {
    let data = names.iter().map(|name| json!({ "name": name })).collect::<Vec<_>>();
    reply(vec![ok_entry("/dvmdb/adom", Some(JsonValue::Array(data)))])
}
