use anyhow::{Context, Result};
use relhook_core::{Credential, MirrorConfig, RepositoryRef, SelectMode};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "relhook.toml";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_HOOK_PATH: &str = "/rels/hook";

/// The relhook configuration file structure (relhook.toml)
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RelhookConfig {
    /// Repository and download settings
    pub github: GithubConfig,

    /// Webhook listener settings
    pub server: ServerConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// Repository as owner/name
    pub repository: Option<String>,

    /// API token; prefer RELHOOK_TOKEN over storing it here
    pub token: Option<String>,

    /// API base URL (GitHub Enterprise: https://host/api/v3)
    pub api_base: Option<String>,

    /// "assets" or "release"
    pub mode: Option<SelectMode>,

    /// List targets without downloading
    pub report_only: Option<bool>,

    /// Directory downloads are written to
    pub output_dir: Option<String>,

    /// Maximum downloads in flight
    pub max_concurrent: Option<usize>,

    /// Seconds a download may stall before it fails
    pub read_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: Option<String>,

    /// Port to listen on
    pub port: Option<u16>,

    /// Route of the hook
    pub path: Option<String>,

    /// Answer HTTP 200 even when mirroring failed
    pub always_ok_status: Option<bool>,
}

impl RelhookConfig {
    /// Load configuration from relhook.toml, searching upward from the given directory
    pub fn load(start_dir: &Path) -> Result<Option<Self>> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE);

            if config_path.exists() {
                return Self::load_file(&config_path).map(Some);
            }

            if !current.pop() {
                return Ok(None);
            }
        }
    }

    /// Load configuration by searching upward from the current working directory
    pub fn load_from_cwd() -> Result<Option<Self>> {
        let cwd = std::env::current_dir()?;
        Self::load(&cwd)
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: RelhookConfig =
            toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

/// Mirror settings given on the command line
#[derive(Debug, Default, Clone)]
pub struct MirrorOverrides {
    pub repository: Option<String>,
    pub token: Option<String>,
    pub api_base: Option<String>,
    pub mode: Option<SelectMode>,
    pub report_only: Option<bool>,
    pub output_dir: Option<PathBuf>,
    pub max_concurrent: Option<usize>,
    pub read_timeout_secs: Option<u64>,
}

/// Listener settings given on the command line
#[derive(Debug, Default, Clone)]
pub struct ServeOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub path: Option<String>,
    pub always_ok_status: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeSettings {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub always_ok_status: bool,
}

/// Environment lookup for RELHOOK_* variables, empty values count as unset
pub fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

/// Merge command line, environment and file into a mirror configuration.
///
/// Precedence: command line > environment > file > defaults.
pub fn resolve_mirror_config(
    file: Option<&RelhookConfig>,
    env: impl Fn(&str) -> Option<String>,
    overrides: &MirrorOverrides,
) -> Result<MirrorConfig> {
    let github = file.map(|f| &f.github);

    let repository = overrides
        .repository
        .clone()
        .or_else(|| env("RELHOOK_REPOSITORY"))
        .or_else(|| github.and_then(|g| g.repository.clone()))
        .context("No repository configured (use --repository, RELHOOK_REPOSITORY or [github] repository)")?;
    let repository: RepositoryRef = repository.parse()?;

    let token = overrides
        .token
        .clone()
        .or_else(|| env("RELHOOK_TOKEN"))
        .or_else(|| env("GITHUB_TOKEN"))
        .or_else(|| github.and_then(|g| g.token.clone()))
        .context("No GitHub token configured (use --token, RELHOOK_TOKEN or GITHUB_TOKEN)")?;

    let mut config = MirrorConfig::new(repository, Credential::new(token));

    if let Some(mode) = overrides.mode.or_else(|| github.and_then(|g| g.mode)) {
        config = config.with_mode(mode);
    }

    let report_only = overrides
        .report_only
        .or_else(|| github.and_then(|g| g.report_only))
        .unwrap_or(false);
    config = config.with_report_only(report_only);

    if let Some(api_base) = overrides
        .api_base
        .clone()
        .or_else(|| env("RELHOOK_API_BASE"))
        .or_else(|| github.and_then(|g| g.api_base.clone()))
    {
        config = config.with_api_base(api_base);
    }

    if let Some(output_dir) = overrides
        .output_dir
        .clone()
        .or_else(|| github.and_then(|g| g.output_dir.as_ref().map(PathBuf::from)))
    {
        config = config.with_output_dir(output_dir);
    }

    let max_concurrent = overrides
        .max_concurrent
        .or_else(|| github.and_then(|g| g.max_concurrent));
    config = config.with_max_concurrent(max_concurrent);

    if let Some(secs) = overrides.read_timeout_secs.or_else(|| github.and_then(|g| g.read_timeout_secs)) {
        config = config.with_read_timeout(Duration::from_secs(secs));
    }

    Ok(config)
}

/// Merge command line and file into listener settings
pub fn resolve_serve_settings(file: Option<&RelhookConfig>, overrides: &ServeOverrides) -> ServeSettings {
    let server = file.map(|f| &f.server);

    let mut path = overrides
        .path
        .clone()
        .or_else(|| server.and_then(|s| s.path.clone()))
        .unwrap_or_else(|| DEFAULT_HOOK_PATH.to_string());
    if !path.starts_with('/') {
        path.insert(0, '/');
    }

    ServeSettings {
        host: overrides
            .host
            .clone()
            .or_else(|| server.and_then(|s| s.host.clone()))
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: overrides
            .port
            .or_else(|| server.and_then(|s| s.port))
            .unwrap_or(DEFAULT_PORT),
        path,
        always_ok_status: overrides
            .always_ok_status
            .or_else(|| server.and_then(|s| s.always_ok_status))
            .unwrap_or(true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn parse(toml: &str) -> RelhookConfig {
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse("");
        assert!(config.github.repository.is_none());
        assert!(config.server.port.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let config = parse(
            r#"
[github]
repository = "octocat/hello-world"
token = "gho_file"
api_base = "https://ghe.example.com/api/v3"
mode = "release"
report_only = true
output_dir = "/srv/mirror"
max_concurrent = 4
read_timeout_secs = 60

[server]
host = "127.0.0.1"
port = 9000
path = "/hooks/release"
always_ok_status = false
"#,
        );

        assert_eq!(config.github.repository.as_deref(), Some("octocat/hello-world"));
        assert_eq!(config.github.mode, Some(SelectMode::Release));
        assert_eq!(config.github.report_only, Some(true));
        assert_eq!(config.github.max_concurrent, Some(4));
        assert_eq!(config.github.read_timeout_secs, Some(60));
        assert_eq!(config.server.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(config.server.port, Some(9000));
        assert_eq!(config.server.path.as_deref(), Some("/hooks/release"));
        assert_eq!(config.server.always_ok_status, Some(false));
    }

    #[test]
    fn test_parse_invalid_mode() {
        let result: std::result::Result<RelhookConfig, _> = toml::from_str("[github]\nmode = \"zipball\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_searches_upward() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILE),
            "[github]\nrepository = \"octocat/hello-world\"\n",
        )
        .unwrap();
        let nested = temp_dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let config = RelhookConfig::load(&nested).unwrap().unwrap();
        assert_eq!(config.github.repository.as_deref(), Some("octocat/hello-world"));
    }

    #[test]
    fn test_load_file_reports_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[github\n").unwrap();

        let err = RelhookConfig::load_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_resolve_from_file() {
        let file = parse(
            r#"
[github]
repository = "octocat/hello-world"
token = "gho_file"
mode = "release"
output_dir = "/srv/mirror"
max_concurrent = 2
read_timeout_secs = 5
"#,
        );

        let config = resolve_mirror_config(Some(&file), no_env, &MirrorOverrides::default()).unwrap();

        assert_eq!(config.repository, RepositoryRef::new("octocat", "hello-world"));
        assert_eq!(config.credential.expose(), "gho_file");
        assert_eq!(config.mode, SelectMode::Release);
        assert!(!config.report_only);
        assert_eq!(config.output_dir, PathBuf::from("/srv/mirror"));
        assert_eq!(config.max_concurrent, Some(2));
        assert_eq!(config.read_timeout, Duration::from_secs(5));
        assert_eq!(config.api_base, "https://api.github.com");
    }

    #[test]
    fn test_resolve_precedence() {
        let file = parse(
            r#"
[github]
repository = "file/repo"
token = "gho_file"
api_base = "https://file.example.com"
"#,
        );
        let env: HashMap<&str, &str> = HashMap::from([
            ("RELHOOK_REPOSITORY", "env/repo"),
            ("RELHOOK_TOKEN", "gho_env"),
            ("RELHOOK_API_BASE", "https://env.example.com"),
        ]);
        let lookup = |name: &str| env.get(name).map(|v| v.to_string());

        let config = resolve_mirror_config(Some(&file), lookup, &MirrorOverrides::default()).unwrap();
        assert_eq!(config.repository.to_string(), "env/repo");
        assert_eq!(config.credential.expose(), "gho_env");
        assert_eq!(config.api_base, "https://env.example.com");

        let overrides = MirrorOverrides {
            repository: Some("cli/repo".to_string()),
            token: Some("gho_cli".to_string()),
            report_only: Some(true),
            ..Default::default()
        };
        let config = resolve_mirror_config(Some(&file), lookup, &overrides).unwrap();
        assert_eq!(config.repository.to_string(), "cli/repo");
        assert_eq!(config.credential.expose(), "gho_cli");
        assert!(config.report_only);
    }

    #[test]
    fn test_resolve_report_only_flag_overrides_file() {
        let file = parse(
            r#"
[github]
repository = "octocat/hello-world"
token = "gho_file"
report_only = true
"#,
        );

        let config = resolve_mirror_config(Some(&file), no_env, &MirrorOverrides::default()).unwrap();
        assert!(config.report_only);

        let overrides = MirrorOverrides {
            report_only: Some(false),
            ..Default::default()
        };
        let config = resolve_mirror_config(Some(&file), no_env, &overrides).unwrap();
        assert!(!config.report_only);
    }

    #[test]
    fn test_resolve_github_token_fallback() {
        let lookup = |name: &str| match name {
            "GITHUB_TOKEN" => Some("ghp_fallback".to_string()),
            _ => None,
        };
        let overrides = MirrorOverrides {
            repository: Some("octocat/hello-world".to_string()),
            ..Default::default()
        };

        let config = resolve_mirror_config(None, lookup, &overrides).unwrap();
        assert_eq!(config.credential.expose(), "ghp_fallback");
    }

    #[test]
    fn test_resolve_missing_values() {
        let err = resolve_mirror_config(None, no_env, &MirrorOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("No repository configured"));

        let overrides = MirrorOverrides {
            repository: Some("octocat/hello-world".to_string()),
            ..Default::default()
        };
        let err = resolve_mirror_config(None, no_env, &overrides).unwrap_err();
        assert!(err.to_string().contains("No GitHub token configured"));
    }

    #[test]
    fn test_resolve_invalid_repository() {
        let overrides = MirrorOverrides {
            repository: Some("not-a-repo".to_string()),
            token: Some("t".to_string()),
            ..Default::default()
        };
        assert!(resolve_mirror_config(None, no_env, &overrides).is_err());
    }

    #[test]
    fn test_serve_settings_defaults() {
        let settings = resolve_serve_settings(None, &ServeOverrides::default());
        assert_eq!(
            settings,
            ServeSettings {
                host: "0.0.0.0".to_string(),
                port: 3000,
                path: "/rels/hook".to_string(),
                always_ok_status: true,
            }
        );
    }

    #[test]
    fn test_serve_settings_precedence() {
        let file = parse("[server]\nhost = \"127.0.0.1\"\nport = 9000\npath = \"hooks\"\n");
        let overrides = ServeOverrides {
            port: Some(8080),
            always_ok_status: Some(false),
            ..Default::default()
        };

        let settings = resolve_serve_settings(Some(&file), &overrides);
        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.path, "/hooks");
        assert!(!settings.always_ok_status);
    }
}
