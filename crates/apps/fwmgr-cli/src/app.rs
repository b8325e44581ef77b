use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use fwmgr_rpc::{HttpTransport, Session};

use crate::commands_call;
use crate::commands_login;
use crate::commands_object;
use crate::commands_profile;
use crate::output::Output;
use crate::profile::{load_profile_settings, profile_exists, ProfileSettings};

#[derive(Debug, Clone, Parser)]
#[command(name = "fwmgr", about = "Firewall manager JSON-RPC operator CLI", version)]
pub struct Cli {
    #[arg(long, global = true, default_value = "default")]
    pub profile: String,
    /// Appliance address, `host[:port]` or a full URL.
    #[arg(long, global = true)]
    pub url: Option<String>,
    #[arg(long, global = true)]
    pub user: Option<String>,
    #[arg(long, global = true)]
    pub adom: Option<String>,
    #[arg(long, global = true)]
    pub json: bool,
    #[arg(long, global = true)]
    pub quiet: bool,
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    Profile(ProfileCommand),
    /// Log in, report the session and the visible domains, log out.
    Login,
    /// Run one raw call.
    Call(CallArgs),
    Object(ObjectCommand),
}

#[derive(Debug, Clone, Args)]
pub struct ProfileCommand {
    #[command(subcommand)]
    pub action: ProfileAction,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ProfileAction {
    Init {
        name: String,
    },
    List,
    Show {
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct CallArgs {
    /// get, set, add, update, delete or exec
    pub method: String,
    pub url: String,
    /// JSON value sent as `data`.
    #[arg(long)]
    pub data: Option<String>,
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Args)]
pub struct ObjectCommand {
    #[command(subcommand)]
    pub action: ObjectAction,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ObjectAction {
    List {
        kind: String,
        #[arg(long)]
        package: Option<String>,
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
    },
    Show {
        kind: String,
        name: String,
        #[arg(long)]
        package: Option<String>,
    },
    Delete {
        kind: String,
        #[arg(required = true)]
        names: Vec<String>,
        #[arg(long)]
        package: Option<String>,
    },
}

pub struct RuntimeContext {
    pub profile_name: String,
    pub settings: ProfileSettings,
    pub session: Session<HttpTransport>,
    pub output: Output,
}

impl RuntimeContext {
    pub fn load(cli: &Cli) -> Result<Self> {
        let settings = resolve_settings(cli)?;
        if settings.url.trim().is_empty() {
            return Err(anyhow!(
                "no appliance url for profile '{}'; pass --url or set `url` in the profile",
                settings.name
            ));
        }

        let transport = HttpTransport::new(&settings.transport_config())
            .context("invalid transport settings")?;
        let mut session = Session::new(transport, settings.session_config())
            .context("invalid session settings")?;
        if let (Some(user), Some(password)) = (settings.user.clone(), settings.resolved_password())
        {
            session.set_credentials(user, password);
        }

        Ok(Self {
            profile_name: settings.name.clone(),
            settings,
            session,
            output: Output::new(cli.json, cli.quiet),
        })
    }

    /// Runs `op` inside a logged-in session. Logout is attempted whenever a
    /// token was obtained, including when login itself failed afterwards.
    pub fn with_login<R>(&mut self, op: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        let result = self
            .session
            .login()
            .with_context(|| format!("login to {} failed", self.settings.url))
            .and_then(|()| op(self));
        if self.session.is_authenticated() {
            if let Err(err) = self.session.logout() {
                log::warn!("fwmgr: logout failed: {err}");
            }
        }
        result
    }
}

/// Profile file first, then command-line overrides. A missing `default`
/// profile is fine when `--url` is given.
pub fn resolve_settings(cli: &Cli) -> Result<ProfileSettings> {
    let mut settings = if profile_exists(&cli.profile)? {
        load_profile_settings(&cli.profile)?
    } else if cli.profile == "default" && cli.url.is_some() {
        ProfileSettings::default()
    } else {
        return Err(anyhow!(
            "profile '{}' does not exist; run `fwmgr profile init {}` first",
            cli.profile,
            cli.profile
        ));
    };

    if let Some(url) = &cli.url {
        settings.url = url.clone();
    }
    if let Some(user) = &cli.user {
        settings.user = Some(user.clone());
    }
    if let Some(adom) = &cli.adom {
        settings.adom = adom.clone();
    }
    Ok(settings)
}

pub fn run_cli(cli: Cli) -> Result<()> {
    let output = Output::new(cli.json, cli.quiet);
    match &cli.command {
        Command::Profile(command) => commands_profile::run(&cli, command, &output),
        Command::Login => {
            let mut ctx = RuntimeContext::load(&cli)?;
            commands_login::run(&mut ctx)
        }
        Command::Call(args) => {
            let mut ctx = RuntimeContext::load(&cli)?;
            commands_call::run(&mut ctx, args)
        }
        Command::Object(command) => {
            let mut ctx = RuntimeContext::load(&cli)?;
            commands_object::run(&mut ctx, command)
        }
    }
}

pub fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    }
}
