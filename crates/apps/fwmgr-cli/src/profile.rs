use anyhow::{anyhow, Context, Result};
use fwmgr_rpc::{HttpTransportConfig, ProtocolOptions, ResultMode, SessionConfig, DEFAULT_ADOM};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;

pub const PASSWORD_ENV: &str = "FWMGR_PASSWORD";
const CONFIG_ROOT_ENV: &str = "FWMGR_CONFIG_ROOT";

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProfileSettings {
    #[serde(skip)]
    pub name: String,
    pub url: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub adom: String,
    pub verbose: bool,
    pub lenient: bool,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        let transport = HttpTransportConfig::default();
        Self {
            name: "default".into(),
            url: String::new(),
            user: None,
            password: None,
            adom: DEFAULT_ADOM.into(),
            verbose: true,
            lenient: false,
            connect_timeout_ms: transport.connect_timeout_ms,
            read_timeout_ms: transport.read_timeout_ms,
        }
    }
}

impl fmt::Debug for ProfileSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileSettings")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("adom", &self.adom)
            .field("verbose", &self.verbose)
            .field("lenient", &self.lenient)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("read_timeout_ms", &self.read_timeout_ms)
            .finish()
    }
}

impl ProfileSettings {
    pub fn session_config(&self) -> SessionConfig {
        let mut protocol = ProtocolOptions::default();
        protocol.verbose = self.verbose;
        protocol.result_mode = if self.lenient { ResultMode::Lenient } else { ResultMode::Strict };
        SessionConfig::default().with_adom(self.adom.clone()).with_protocol(protocol)
    }

    pub fn transport_config(&self) -> HttpTransportConfig {
        let mut config = HttpTransportConfig::new(self.url.clone());
        config.connect_timeout_ms = self.connect_timeout_ms;
        config.read_timeout_ms = self.read_timeout_ms;
        config
    }

    /// `FWMGR_PASSWORD` wins over the stored password.
    pub fn resolved_password(&self) -> Option<String> {
        std::env::var(PASSWORD_ENV)
            .ok()
            .filter(|value| !value.is_empty())
            .or_else(|| self.password.clone())
    }
}

pub fn config_root() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ROOT_ENV) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    let base = dirs::config_dir().ok_or_else(|| anyhow!("failed to resolve config directory"))?;
    Ok(base.join("fwmgr"))
}

pub fn profiles_root() -> Result<PathBuf> {
    Ok(config_root()?.join("profiles"))
}

pub fn profile_path(name: &str) -> Result<PathBuf> {
    validate_profile_name(name)?;
    Ok(profiles_root()?.join(format!("{name}.toml")))
}

pub fn profile_exists(name: &str) -> Result<bool> {
    Ok(profile_path(name)?.exists())
}

pub fn init_profile(
    name: &str,
    url: Option<String>,
    user: Option<String>,
    adom: Option<String>,
) -> Result<ProfileSettings> {
    let mut settings = ProfileSettings { name: name.to_string(), ..ProfileSettings::default() };
    if let Some(url) = url {
        settings.url = url;
    }
    settings.user = user;
    if let Some(adom) = adom {
        settings.adom = adom;
    }
    save_profile_settings(&settings)?;
    Ok(settings)
}

pub fn list_profiles() -> Result<Vec<String>> {
    let root = profiles_root()?;
    if !root.exists() {
        return Ok(Vec::new());
    }

    let mut profiles = Vec::new();
    for entry in fs::read_dir(&root)
        .with_context(|| format!("failed to list profiles in {}", root.display()))?
    {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "toml") {
            if let Some(stem) = path.file_stem() {
                profiles.push(stem.to_string_lossy().to_string());
            }
        }
    }
    profiles.sort();
    Ok(profiles)
}

pub fn load_profile_settings(name: &str) -> Result<ProfileSettings> {
    let path = profile_path(name)?;
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read profile settings {}", path.display()))?;
    let mut settings: ProfileSettings = toml::from_str(&contents)
        .with_context(|| format!("invalid profile settings in {}", path.display()))?;
    settings.name = name.to_string();
    Ok(settings)
}

pub fn save_profile_settings(settings: &ProfileSettings) -> Result<()> {
    let path = profile_path(&settings.name)?;
    let root = profiles_root()?;
    fs::create_dir_all(&root).with_context(|| format!("failed to create {}", root.display()))?;
    let encoded = toml::to_string_pretty(settings).context("failed to encode profile")?;
    fs::write(&path, encoded).with_context(|| format!("failed to write {}", path.display()))
}

fn validate_profile_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.chars().all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
        && !name.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(anyhow!("invalid profile name '{name}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_profile_keeps_defaults() {
        let settings: ProfileSettings = toml::from_str("url = \"fwm.lab:8443\"\n").unwrap();
        assert_eq!(settings.url, "fwm.lab:8443");
        assert_eq!(settings.adom, "root");
        assert!(settings.verbose);
        assert!(!settings.lenient);
    }

    #[test]
    fn settings_map_onto_library_configs() {
        let settings = ProfileSettings {
            url: "fwm.lab".into(),
            adom: "lab".into(),
            lenient: true,
            verbose: false,
            ..ProfileSettings::default()
        };

        let session = settings.session_config();
        assert_eq!(session.adom, "lab");
        assert_eq!(session.protocol.result_mode, ResultMode::Lenient);
        assert!(!session.protocol.verbose);
        assert_eq!(settings.transport_config().normalized_base_url(), "https://fwm.lab");
    }

    #[test]
    fn debug_hides_the_password() {
        let settings =
            ProfileSettings { password: Some("hunter2".into()), ..ProfileSettings::default() };
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn profile_names_are_restricted() {
        assert!(validate_profile_name("lab-1").is_ok());
        assert!(validate_profile_name("../etc").is_err());
        assert!(validate_profile_name("").is_err());
    }
}
