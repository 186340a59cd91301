//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming the root folder
pub const ENV_ROOT_FOLDER: &str = "CALTRACK_ROOT_FOLDER";
/// Environment variable overriding the login username
pub const ENV_USERNAME: &str = "CALTRACK_USERNAME";
/// Environment variable overriding the login password
pub const ENV_PASSWORD: &str = "CALTRACK_PASSWORD";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "password123";

/// Optional settings read from `config.toml`
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub open_browser: Option<bool>,
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Load the TOML config.
///
/// An explicitly named file must exist and parse. Otherwise the platform
/// default location is tried, and a missing file yields empty settings.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        return TomlConfig::load(path);
    }

    match default_config_path() {
        Some(path) => {
            debug!("Loading config file {}", path.display());
            TomlConfig::load(&path)
        }
        None => Ok(TomlConfig::default()),
    }
}

/// Get default configuration file path for the platform, if one exists
fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("caltrack").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/caltrack/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Root folder resolution, priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. Directory of the running executable (fallback)
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml_config: &TomlConfig,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    // Priority 4: installation directory
    get_default_root_folder()
}

/// Directory holding the executable, else the working directory
fn get_default_root_folder() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Database file location under the root folder
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join("instance").join("calibration.db")
}

/// Login credentials for the single-user session gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
        }
    }
}

impl Credentials {
    /// Resolve credentials: environment, then TOML, then compiled defaults
    pub fn resolve(toml_config: &TomlConfig) -> Self {
        let defaults = Self::default();
        let username = non_empty_env(ENV_USERNAME)
            .or_else(|| toml_config.username.clone())
            .unwrap_or(defaults.username);
        let password = non_empty_env(ENV_PASSWORD)
            .or_else(|| toml_config.password.clone())
            .unwrap_or(defaults.password);

        Self { username, password }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Values supplied on the command line (clap also folds in their env vars)
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub root_folder: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub no_browser: bool,
}

/// Fully resolved server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub root_folder: PathBuf,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub open_browser: bool,
    pub credentials: Credentials,
}

impl ServerConfig {
    /// Merge command line, environment and TOML settings over the defaults
    pub fn resolve(overrides: Overrides, toml_config: TomlConfig) -> Self {
        let root_folder = resolve_root_folder(
            overrides.root_folder.as_deref(),
            ENV_ROOT_FOLDER,
            &toml_config,
        );
        let credentials = Credentials::resolve(&toml_config);
        if credentials.is_default() {
            warn!("Using built-in default login credentials; set CALTRACK_USERNAME/CALTRACK_PASSWORD or config.toml");
        }

        Self {
            db_path: database_path(&root_folder),
            root_folder,
            host: overrides
                .host
                .or(toml_config.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: overrides.port.or(toml_config.port).unwrap_or(DEFAULT_PORT),
            open_browser: !overrides.no_browser && toml_config.open_browser.unwrap_or(true),
            credentials,
        }
    }

    /// Address the HTTP listener binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Loopback URL opened in the browser on startup
    pub fn local_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn parses_partial_toml() {
        let config = TomlConfig::parse("port = 8080\nusername = \"tech\"\n").unwrap();
        assert_eq!(config.port, Some(8080));
        assert_eq!(config.username.as_deref(), Some("tech"));
        assert_eq!(config.host, None);
        assert_eq!(config.open_browser, None);
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(TomlConfig::parse("port = \"eighty\"").is_err());
    }

    #[test]
    fn database_lives_under_instance() {
        let path = database_path(Path::new("/opt/caltrack"));
        assert_eq!(path, PathBuf::from("/opt/caltrack/instance/calibration.db"));
    }

    #[test]
    #[serial]
    fn cli_root_folder_beats_env_and_toml() {
        std::env::set_var(ENV_ROOT_FOLDER, "/from/env");
        let toml_config = TomlConfig {
            root_folder: Some(PathBuf::from("/from/toml")),
            ..Default::default()
        };

        let resolved = resolve_root_folder(Some(Path::new("/from/cli")), ENV_ROOT_FOLDER, &toml_config);
        assert_eq!(resolved, PathBuf::from("/from/cli"));

        let resolved = resolve_root_folder(None, ENV_ROOT_FOLDER, &toml_config);
        assert_eq!(resolved, PathBuf::from("/from/env"));

        std::env::remove_var(ENV_ROOT_FOLDER);
        let resolved = resolve_root_folder(None, ENV_ROOT_FOLDER, &toml_config);
        assert_eq!(resolved, PathBuf::from("/from/toml"));
    }

    #[test]
    #[serial]
    fn credentials_env_overrides_toml() {
        let toml_config = TomlConfig {
            username: Some("toml-user".to_string()),
            password: Some("toml-pass".to_string()),
            ..Default::default()
        };

        std::env::remove_var(ENV_USERNAME);
        std::env::remove_var(ENV_PASSWORD);
        let creds = Credentials::resolve(&toml_config);
        assert_eq!(creds.username, "toml-user");
        assert_eq!(creds.password, "toml-pass");

        std::env::set_var(ENV_PASSWORD, "env-pass");
        let creds = Credentials::resolve(&toml_config);
        assert_eq!(creds.username, "toml-user");
        assert_eq!(creds.password, "env-pass");
        std::env::remove_var(ENV_PASSWORD);

        let creds = Credentials::resolve(&TomlConfig::default());
        assert!(creds.is_default());
    }

    #[test]
    #[serial]
    fn server_config_defaults() {
        std::env::remove_var(ENV_ROOT_FOLDER);
        let config = ServerConfig::resolve(
            Overrides {
                root_folder: Some(PathBuf::from("/srv/cal")),
                ..Default::default()
            },
            TomlConfig::default(),
        );

        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.open_browser);
        assert_eq!(config.db_path, PathBuf::from("/srv/cal/instance/calibration.db"));
        assert_eq!(config.bind_addr(), "0.0.0.0:5000");
        assert_eq!(config.local_url(), "http://127.0.0.1:5000");
    }

    #[test]
    #[serial]
    fn cli_overrides_toml_values() {
        let toml_config = TomlConfig {
            host: Some("127.0.0.1".to_string()),
            port: Some(7000),
            open_browser: Some(true),
            ..Default::default()
        };
        let config = ServerConfig::resolve(
            Overrides {
                root_folder: Some(PathBuf::from("/srv/cal")),
                port: Some(7100),
                no_browser: true,
                ..Default::default()
            },
            toml_config,
        );

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 7100);
        assert!(!config.open_browser);
    }
}
