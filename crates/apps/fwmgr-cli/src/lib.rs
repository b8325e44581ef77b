//! `fwmgr`: operator CLI over the firewall manager JSON-RPC client.

pub mod app;
pub mod commands_call;
pub mod commands_login;
pub mod commands_object;
pub mod commands_profile;
pub mod output;
pub mod profile;

pub use app::{run_cli, Cli, Command};
