//! The seam between the session layer and whatever actually moves bytes.
//!
//! A transport posts one JSON document and hands back the status, the raw
//! body and the decoded body. It never interprets the reply: non-2xx statuses
//! come back as [`HttpReply`]s, and only failures to complete the exchange at
//! all (connect, DNS, timeouts) are errors.

#[cfg(feature = "http")]
mod http;
#[cfg(test)]
pub(crate) mod mock;

#[cfg(feature = "http")]
pub use http::HttpTransport;

use crate::error::Result;
use crate::response::HttpReply;
use serde_json::Value as JsonValue;

pub trait Transport {
    fn post(&self, path: &str, body: &JsonValue) -> Result<HttpReply>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn post(&self, path: &str, body: &JsonValue) -> Result<HttpReply> {
        (**self).post(path, body)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn post(&self, path: &str, body: &JsonValue) -> Result<HttpReply> {
        (**self).post(path, body)
    }
}
