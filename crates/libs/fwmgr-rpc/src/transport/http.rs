use super::Transport;
use crate::config::HttpTransportConfig;
use crate::error::{ClientError, Result};
use crate::response::HttpReply;
use serde_json::Value as JsonValue;
use std::io::Read;
use std::time::Duration;
use ureq::ErrorKind;

/// Blocking HTTP(S) transport over a shared `ureq` agent.
#[derive(Debug)]
pub struct HttpTransport {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new(config: &HttpTransportConfig) -> Result<Self> {
        config.validate()?;
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_millis(config.connect_timeout_ms))
            .timeout_read(Duration::from_millis(config.read_timeout_ms))
            .timeout_write(Duration::from_millis(config.write_timeout_ms))
            .build();
        Ok(Self { base_url: config.normalized_base_url(), agent })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Transport for HttpTransport {
    fn post(&self, path: &str, body: &JsonValue) -> Result<HttpReply> {
        let url = format!("{}{}", self.base_url, path);
        let payload = serde_json::to_string(body)
            .map_err(|err| ClientError::invalid_argument(format!("request encode failed: {err}")))?;

        let response = match self
            .agent
            .post(&url)
            .set("Content-Type", "application/json")
            .set("Accept", "application/json")
            .send_string(&payload)
        {
            Ok(response) => response,
            // Status errors still carry a reply; the validator classifies them.
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(transport)) => {
                return Err(ClientError::Transport(format!(
                    "rpc request to {url} failed: {}",
                    describe_transport_error(&transport)
                )));
            }
        };

        let status = response.status();
        let body = read_body(response)?;
        log::trace!("rpc: << http {status} from {url} ({} bytes)", body.len());
        Ok(HttpReply::new(status, body))
    }
}

/// Bodies that are not UTF-8 are kept lossily so the status and the body
/// contract are still judged by the validator.
fn read_body(response: ureq::Response) -> Result<String> {
    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .map_err(|err| ClientError::Transport(format!("failed to read rpc response: {err}")))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn describe_transport_error(transport: &ureq::Transport) -> String {
    let category = match transport.kind() {
        ErrorKind::ConnectionFailed => "connection refused or appliance unreachable",
        ErrorKind::Dns => "dns lookup failed",
        ErrorKind::Io => "network i/o error",
        ErrorKind::InvalidUrl => "invalid appliance url",
        ErrorKind::UnknownScheme => "unsupported url scheme",
        ErrorKind::TooManyRedirects => "too many redirects",
        ErrorKind::ProxyConnect => "proxy connect failed",
        ErrorKind::ProxyUnauthorized => "proxy authentication failed",
        ErrorKind::InvalidProxyUrl => "invalid proxy url",
        ErrorKind::BadStatus => "appliance did not return a valid http status line",
        ErrorKind::BadHeader => "bad header from appliance",
        ErrorKind::InsecureRequestHttpsOnly => "plain http request blocked by https-only setting",
        ErrorKind::HTTP => "http status error",
    };

    let mut details: Vec<String> = Vec::new();
    let mut push_detail = |text: &str| {
        let text = strip_noise(text);
        if !text.is_empty() && !details.iter().any(|seen| seen == &text) {
            details.push(text);
        }
    };
    if let Some(message) = transport.message() {
        push_detail(message);
    }
    if let Some(source) = std::error::Error::source(transport) {
        push_detail(&source.to_string());
    }

    if details.is_empty() {
        category.to_string()
    } else {
        format!("{category}: {}", details.join(": "))
    }
}

/// Drops the generic prefixes ureq stacks in front of the useful part.
fn strip_noise(input: &str) -> String {
    const PREFIXES: [&str; 5] = [
        "network error:",
        "connection failed:",
        "error encountered in the status line:",
        "error encountered while reading response:",
        "error encountered:",
    ];
    let mut text = input.trim();
    while let Some(prefix) =
        PREFIXES.iter().find(|prefix| text.to_ascii_lowercase().starts_with(**prefix))
    {
        text = text[prefix.len()..].trim_start();
    }
    text.to_string()
}
