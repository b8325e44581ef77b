use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ADOM: &str = "root";
pub const DEFAULT_RPC_PATH: &str = "/jsonrpc";

/// How strictly a reply body is held to the `result` array contract.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResultMode {
    /// A body without `result` is malformed.
    #[default]
    Strict,
    /// A decodable object body without `result` counts as a bare success.
    Lenient,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
#[non_exhaustive]
pub struct ProtocolOptions {
    /// Send `"verbose": 1` so enum fields come back as symbolic strings
    /// instead of numeric ids.
    pub verbose: bool,
    pub result_mode: ResultMode,
}

impl Default for ProtocolOptions {
    fn default() -> Self {
        Self { verbose: true, result_mode: ResultMode::Strict }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
#[non_exhaustive]
pub struct SessionConfig {
    pub adom: String,
    /// Path every envelope is posted to.
    pub rpc_path: String,
    pub protocol: ProtocolOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            adom: DEFAULT_ADOM.to_owned(),
            rpc_path: DEFAULT_RPC_PATH.to_owned(),
            protocol: ProtocolOptions::default(),
        }
    }
}

impl SessionConfig {
    pub fn with_adom(mut self, adom: impl Into<String>) -> Self {
        self.adom = adom.into();
        self
    }

    pub fn with_protocol(mut self, protocol: ProtocolOptions) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.adom.trim().is_empty() {
            return Err(ClientError::invalid_argument("adom must not be empty"));
        }
        if !self.rpc_path.starts_with('/') {
            return Err(ClientError::invalid_argument(format!(
                "rpc_path must start with '/': {}",
                self.rpc_path
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
#[non_exhaustive]
pub struct HttpTransportConfig {
    pub base_url: String,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub write_timeout_ms: u64,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            connect_timeout_ms: 3_000,
            read_timeout_ms: 30_000,
            write_timeout_ms: 10_000,
        }
    }
}

impl HttpTransportConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), ..Self::default() }
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(ClientError::invalid_argument("base_url must not be empty"));
        }
        if self.connect_timeout_ms == 0 || self.read_timeout_ms == 0 || self.write_timeout_ms == 0
        {
            return Err(ClientError::invalid_argument("transport timeouts must be greater than zero"));
        }
        Ok(())
    }

    /// `host:port` defaults to https; trailing slashes are dropped.
    pub fn normalized_base_url(&self) -> String {
        let trimmed = self.base_url.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", trimmed.trim_end_matches('/'))
        }
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.normalized_base_url(), path)
    }
}
