//! Client for the firewall manager JSON-RPC API.
//!
//! [`Session`] owns the login lifecycle, transaction numbering and reply
//! validation; [`Transport`] moves the JSON documents. The object helpers in
//! [`objects`] build the well-known configuration paths on top of a session.

pub mod config;
pub mod envelope;
mod error;
pub mod objects;
pub mod response;
mod sequencer;
mod session;
pub mod transport;

pub use config::{
    HttpTransportConfig, ProtocolOptions, ResultMode, SessionConfig, DEFAULT_ADOM,
    DEFAULT_RPC_PATH,
};
pub use envelope::{CallEnvelope, Method, ParamObject};
pub use error::{BatchFailure, ClientError, Result};
pub use objects::{ObjectKind, ObjectTarget};
pub use response::{validate, HttpReply, ResultEntry, ResultStatus, ValidatedReply};
pub use sequencer::TransactionSequencer;
pub use session::{
    BatchOutcome, Credentials, Outcome, Session, SessionState, DOMAIN_DIRECTORY_PATH, LOGIN_PATH,
    LOGOUT_PATH,
};
#[cfg(feature = "http")]
pub use transport::HttpTransport;
pub use transport::Transport;
