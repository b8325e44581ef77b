use crate::app::{Cli, ProfileAction, ProfileCommand};
use crate::output::Output;
use crate::profile::{
    init_profile, list_profiles, load_profile_settings, profile_exists, profile_path, PASSWORD_ENV,
};
use anyhow::{anyhow, Result};
use serde_json::json;

pub fn run(cli: &Cli, command: &ProfileCommand, output: &Output) -> Result<()> {
    match &command.action {
        ProfileAction::Init { name } => {
            if profile_exists(name)? {
                return Err(anyhow!("profile '{name}' already exists"));
            }
            let profile = init_profile(name, cli.url.clone(), cli.user.clone(), cli.adom.clone())?;
            output.emit_status(&json!({
                "created": true,
                "name": name,
                "url": profile.url,
                "user": profile.user,
                "adom": profile.adom,
                "path": profile_path(name)?.display().to_string(),
            }))
        }
        ProfileAction::List => {
            let profiles = list_profiles()?;
            if cli.json {
                output.emit_status(&json!({ "profiles": profiles }))
            } else {
                let lines = profiles
                    .iter()
                    .map(|name| {
                        if name == &cli.profile {
                            format!("* {name}")
                        } else {
                            format!("  {name}")
                        }
                    })
                    .collect::<Vec<_>>();
                output.emit_lines(&lines);
                Ok(())
            }
        }
        ProfileAction::Show { name } => {
            let name = name.as_deref().unwrap_or(&cli.profile);
            let profile = load_profile_settings(name)?;
            let password = if std::env::var_os(PASSWORD_ENV).is_some() {
                "from environment"
            } else if profile.password.is_some() {
                "stored"
            } else {
                "not set"
            };
            output.emit_status(&json!({
                "name": name,
                "url": profile.url,
                "user": profile.user,
                "password": password,
                "adom": profile.adom,
                "verbose": profile.verbose,
                "lenient": profile.lenient,
                "path": profile_path(name)?.display().to_string(),
            }))
        }
    }
}
