use crate::config::SessionConfig;
use crate::envelope::{CallEnvelope, Method, ParamObject};
use crate::error::{ClientError, Result};
use crate::response::{self, ResultEntry, ValidatedReply};
use crate::sequencer::TransactionSequencer;
use crate::transport::Transport;
use serde_json::{json, Map as JsonMap, Value as JsonValue};
use std::collections::BTreeSet;
use std::fmt;
use zeroize::Zeroizing;

pub const LOGIN_PATH: &str = "/sys/login/user";
pub const LOGOUT_PATH: &str = "/sys/logout";
pub const DOMAIN_DIRECTORY_PATH: &str = "/dvmdb/adom";


pub struct Credentials {
    username: String,
    password: Zeroizing<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: Zeroizing::new(password.into()) }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
}

/// Unwrapped result of a single call.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The entry's `data` payload.
    Data(JsonValue),
    /// The call succeeded without returning data.
    Done,
}

impl Outcome {
    pub fn data(&self) -> Option<&JsonValue> {
        match self {
            Self::Data(data) => Some(data),
            Self::Done => None,
        }
    }

    pub fn into_data(self) -> Option<JsonValue> {
        match self {
            Self::Data(data) => Some(data),
            Self::Done => None,
        }
    }
}

/// Result of a batched call: every entry in submission order.
#[derive(Clone, Debug, PartialEq)]
pub enum BatchOutcome {
    Results(Vec<ResultEntry>),
    Done,
}

impl BatchOutcome {
    pub fn entries(&self) -> &[ResultEntry] {
        match self {
            Self::Results(entries) => entries.as_slice(),
            Self::Done => &[],
        }
    }
}

/// One logical session against the appliance.
///
/// Every call takes the session exclusively, which keeps exactly one request
/// in flight and the transaction ids strictly sequential. The session token
/// is only ever set by a successful [`Session::login`] and is dropped by
/// [`Session::logout`] whatever the server answers.
pub struct Session<T: Transport> {
    transport: T,
    config: SessionConfig,
    credentials: Option<Credentials>,
    token: Option<String>,
    sequencer: TransactionSequencer,
    active_domain: String,
    known_domains: Vec<String>,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let active_domain = config.adom.clone();
        Ok(Self {
            transport,
            config,
            credentials: None,
            token: None,
            sequencer: TransactionSequencer::new(),
            active_domain,
            known_domains: Vec::new(),
        })
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.set_credentials(username, password);
        self
    }

    pub fn set_credentials(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.credentials = Some(Credentials::new(username, password));
    }

    pub fn clear_credentials(&mut self) {
        self.credentials = None;
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.credentials.as_ref().map(Credentials::username)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        if self.token.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    pub fn session_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn last_transaction_id(&self) -> Option<u64> {
        self.sequencer.last_id()
    }

    pub fn active_domain(&self) -> &str {
        &self.active_domain
    }

    pub fn known_domains(&self) -> &[String] {
        &self.known_domains
    }

    /// Switches the domain object paths are built against. Once login has
    /// populated the domain list the name has to be one of them.
    pub fn select_domain(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::invalid_argument("domain name must not be empty"));
        }
        if !self.known_domains.is_empty() && !self.known_domains.iter().any(|known| known == name)
        {
            return Err(ClientError::invalid_argument(format!("unknown domain '{name}'")));
        }
        log::debug!("session: active domain {} -> {name}", self.active_domain);
        self.active_domain = name.to_owned();
        Ok(())
    }

    /// Authenticates and loads the domain directory.
    ///
    /// A configured domain that the appliance does not list is kept as is;
    /// calls against it will fail on the server side.
    pub fn login(&mut self) -> Result<()> {
        let (username, login_params) = {
            let credentials = self.credentials.as_ref().ok_or(ClientError::MissingCredentials)?;
            let param = ParamObject::new(LOGIN_PATH).with_data(json!({
                "user": credentials.username,
                "passwd": credentials.password.as_str(),
            }));
            (credentials.username.clone(), JsonValue::Array(vec![param.into_value()]))
        };

        self.token = None;
        self.known_domains.clear();

        let reply = self.dispatch(Method::Exec, login_params, false)?;
        let token = reply
            .body
            .get("session")
            .and_then(JsonValue::as_str)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ClientError::malformed(reply.body.to_string()))?;
        self.token = Some(token.to_owned());
        log::debug!("session: logged in as {username}");

        self.known_domains = self.list_domains()?;
        if !self.known_domains.iter().any(|domain| domain == &self.active_domain) {
            log::warn!(
                "session: domain '{}' is not among the {} domains visible to {username}",
                self.active_domain,
                self.known_domains.len()
            );
        }
        Ok(())
    }

    /// Ends the session on the server and always forgets it locally, even
    /// when the logout call itself fails.
    pub fn logout(&mut self) -> Result<()> {
        let params = JsonValue::Array(vec![ParamObject::new(LOGOUT_PATH).into_value()]);
        let result = self.dispatch(Method::Exec, params, true);

        self.token = None;
        self.sequencer.clear();
        self.known_domains.clear();

        match result {
            Ok(_) => {
                log::debug!("session: logged out");
                Ok(())
            }
            Err(err) => {
                log::warn!("session: logout failed, local session cleared anyway: {err}");
                Err(err)
            }
        }
    }

    /// Names from the domain directory, deduplicated and sorted. Does not
    /// touch session state.
    pub fn list_domains(&mut self) -> Result<Vec<String>> {
        let param = ParamObject::new(DOMAIN_DIRECTORY_PATH).with_fields(["name"]);
        let outcome = self.exec_param(Method::Get, param)?;
        let entries = match outcome {
            Outcome::Data(JsonValue::Array(entries)) => entries,
            Outcome::Data(entry @ JsonValue::Object(_)) => vec![entry],
            Outcome::Data(other) => return Err(ClientError::malformed(other.to_string())),
            Outcome::Done => Vec::new(),
        };
        let names = entries
            .iter()
            .filter_map(|entry| entry.get("name").and_then(JsonValue::as_str))
            .map(str::to_owned)
            .collect::<BTreeSet<_>>();
        Ok(names.into_iter().collect())
    }

    /// One call against `path`. `params` is merged in next to the `url`.
    pub fn exec_single(
        &mut self,
        method: Method,
        path: &str,
        params: Option<JsonMap<String, JsonValue>>,
    ) -> Result<Outcome> {
        self.exec_param(method, ParamObject::from_parts(path, params))
    }

    pub fn exec_param(&mut self, method: Method, param: ParamObject) -> Result<Outcome> {
        let reply = self.dispatch(method, JsonValue::Array(vec![param.into_value()]), true)?;
        let data = reply.entries.and_then(|mut entries| entries.pop()).and_then(|entry| entry.data);
        Ok(data.map_or(Outcome::Done, Outcome::Data))
    }

    /// Several calls sharing one verb in one envelope. The server runs each
    /// entry on its own; any failed entry fails the whole call and every
    /// failure is reported.
    pub fn exec_batch(&mut self, method: Method, params: Vec<ParamObject>) -> Result<BatchOutcome> {
        let params = params.into_iter().map(ParamObject::into_value).collect();
        self.exec_batch_json(method, JsonValue::Array(params))
    }

    /// Like [`Session::exec_batch`] for caller-assembled JSON. `params` must
    /// be a non-empty array of objects.
    pub fn exec_batch_json(&mut self, method: Method, params: JsonValue) -> Result<BatchOutcome> {
        let reply = self.dispatch(method, params, true)?;
        Ok(reply.entries.map_or(BatchOutcome::Done, BatchOutcome::Results))
    }

    fn dispatch(
        &mut self,
        method: Method,
        params: JsonValue,
        attach_session: bool,
    ) -> Result<ValidatedReply> {
        let session = if attach_session { self.token.as_deref() } else { None };
        let envelope = CallEnvelope::build(
            &mut self.sequencer,
            method,
            params,
            session,
            self.config.protocol.verbose,
        )?;
        log::debug!(
            "rpc: >> id={} {} {}",
            envelope.id,
            envelope.method,
            envelope.urls().join(",")
        );
        log::trace!("rpc: >> {}", envelope.redacted());

        let body = envelope.to_value()?;
        let reply = self.transport.post(&self.config.rpc_path, &body)?;
        let validated =
            response::validate(&reply, envelope.param_count(), self.config.protocol.result_mode);
        if let Err(err) = &validated {
            log::debug!("rpc: << id={} {err}", envelope.id);
        }
        validated
    }
}

impl<T: Transport> fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .field("credentials", &self.credentials)
            .field("last_transaction_id", &self.sequencer.last_id())
            .field("active_domain", &self.active_domain)
            .field("known_domains", &self.known_domains)
            .finish_non_exhaustive()
    }
}
