//! Configuration resolution across sources.
//!
//! Each field is taken from the first source that sets it:
//!
//! 1. the environment file named by `ORCHE_CONFIG`, under the application's key
//! 2. the local rc file (`.orcherc` in the working directory)
//! 3. the programmatic draft
//! 4. built-in defaults
//!
//! File reads are best-effort. A file that is missing, unreadable or
//! malformed contributes nothing and is reported in
//! [`Resolution::warnings`].

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::{ConfigFileError, OrcheConfig, ResolvedConfig};

/// Environment variable naming the environment file.
pub const ENV_FILE_VAR: &str = "ORCHE_CONFIG";

/// Name of the local rc file.
pub const LOCAL_FILE_NAME: &str = ".orcherc";

/// App name used when none is configured and the working directory has no name.
const FALLBACK_APP_NAME: &str = "orche";

/// The outcome of resolving configuration.
#[derive(Debug)]
pub struct Resolution {
    /// The final configuration.
    pub config: ResolvedConfig,
    /// Sources that could not be used.
    pub warnings: Vec<ConfigFileError>,
}

#[derive(Debug, Clone)]
enum EnvFile {
    Var(String),
    Path(PathBuf),
    Disabled,
}

/// Resolves an [`OrcheConfig`] draft against the configuration files.
///
/// # Example
///
/// ```no_run
/// use orche_config::{ConfigLoader, OrcheConfig};
///
/// let resolution = ConfigLoader::new(OrcheConfig::new().app_name("computers").port(3001))
///     .with_dotenv()
///     .resolve();
///
/// for warning in &resolution.warnings {
///     eprintln!("{warning}");
/// }
/// println!("listening on {}", resolution.config.port);
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    programmatic: OrcheConfig,
    env_file: EnvFile,
    local_file: Option<PathBuf>,
    working_dir: Option<PathBuf>,
    dotenv: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(OrcheConfig::default())
    }
}

impl ConfigLoader {
    /// Creates a loader for a programmatic draft with the standard sources.
    #[must_use]
    pub fn new(programmatic: OrcheConfig) -> Self {
        Self {
            programmatic,
            env_file: EnvFile::Var(ENV_FILE_VAR.to_string()),
            local_file: None,
            working_dir: None,
            dotenv: false,
        }
    }

    /// Reads the environment file path from a different variable.
    #[must_use]
    pub fn with_env_file_var(mut self, var: impl Into<String>) -> Self {
        self.env_file = EnvFile::Var(var.into());
        self
    }

    /// Uses an explicit environment file instead of the variable.
    #[must_use]
    pub fn with_env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = EnvFile::Path(path.into());
        self
    }

    /// Ignores the environment file.
    #[must_use]
    pub fn without_env_file(mut self) -> Self {
        self.env_file = EnvFile::Disabled;
        self
    }

    /// Uses an explicit local rc file.
    #[must_use]
    pub fn with_local_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_file = Some(path.into());
        self
    }

    /// Resolves `.env`, the local rc file and the default app name against
    /// `dir` instead of the process working directory.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Loads a `.env` file before reading the environment.
    #[must_use]
    pub fn with_dotenv(mut self) -> Self {
        self.dotenv = true;
        self
    }

    /// Resolves the final configuration.
    pub fn resolve(self) -> Resolution {
        let mut warnings = Vec::new();

        if self.dotenv {
            let loaded = match &self.working_dir {
                Some(dir) => dotenvy::from_path(dir.join(".env")),
                None => dotenvy::dotenv().map(|_| ()),
            };
            if let Err(err) = loaded {
                if !err.not_found() {
                    warnings.push(ConfigFileError::Dotenv {
                        reason: err.to_string(),
                    });
                }
            }
        }

        let working_dir = self
            .working_dir
            .clone()
            .or_else(|| env::current_dir().ok());

        let local_path = self.local_file.clone().or_else(|| {
            working_dir
                .as_ref()
                .map(|dir| dir.join(LOCAL_FILE_NAME))
        });
        let local = local_path
            .as_deref()
            .and_then(|path| record(read_draft(path), &mut warnings))
            .unwrap_or_default();

        let default_app_name = working_dir
            .as_deref()
            .and_then(Path::file_name)
            .and_then(|name| name.to_str())
            .unwrap_or(FALLBACK_APP_NAME)
            .to_string();
        let app_name = self
            .programmatic
            .app_name
            .clone()
            .or_else(|| local.app_name.clone())
            .unwrap_or_else(|| default_app_name.clone());

        let env_draft = self
            .env_file_path()
            .and_then(|path| record(read_env_draft(&path, &app_name), &mut warnings))
            .unwrap_or_default();

        let draft = env_draft.over(local).over(self.programmatic);
        let config = ResolvedConfig::from_draft(draft, &default_app_name);

        for warning in &warnings {
            tracing::warn!(error = %warning, "configuration source ignored");
        }
        tracing::debug!(
            app = %config.app_name,
            port = config.port,
            path = %config.mount_path,
            engine = %config.api_engine,
            "configuration resolved"
        );

        Resolution { config, warnings }
    }

    fn env_file_path(&self) -> Option<PathBuf> {
        match &self.env_file {
            EnvFile::Var(var) => env::var_os(var)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from),
            EnvFile::Path(path) => Some(path.clone()),
            EnvFile::Disabled => None,
        }
    }
}

fn record<T>(result: Result<T, ConfigFileError>, warnings: &mut Vec<ConfigFileError>) -> Option<T> {
    result.map_err(|err| warnings.push(err)).ok()
}

fn read_env_draft(path: &Path, app_name: &str) -> Result<OrcheConfig, ConfigFileError> {
    let document = read_document(path)?;
    let section = match document {
        Value::Object(mut apps) => apps.remove(app_name),
        _ => None,
    }
    .ok_or_else(|| ConfigFileError::MissingApplication {
        path: path.to_path_buf(),
        app_name: app_name.to_string(),
    })?;

    serde_json::from_value(section).map_err(|source| ConfigFileError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn read_draft(path: &Path) -> Result<OrcheConfig, ConfigFileError> {
    let document = read_document(path)?;
    serde_json::from_value(document).map_err(|source| ConfigFileError::Json {
        path: path.to_path_buf(),
        source,
    })
}

// Parse a file as TOML or JSON based on its extension.
fn read_document(path: &Path) -> Result<Value, ConfigFileError> {
    if !path.exists() {
        return Err(ConfigFileError::not_found(path));
    }
    let content = fs::read_to_string(path).map_err(|e| ConfigFileError::read(path, e))?;

    let is_toml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"));

    if is_toml {
        toml::from_str(&content).map_err(|source| ConfigFileError::Toml {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_json::from_str(&content).map_err(|source| ConfigFileError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_only_programmatic() {
        let dir = tempfile::tempdir().unwrap();
        let resolution = ConfigLoader::new(OrcheConfig::new().port(3001))
            .without_env_file()
            .with_working_dir(dir.path())
            .resolve();

        assert_eq!(resolution.config.port, 3001);
        assert_eq!(resolution.warnings.len(), 1);
        assert!(resolution.warnings[0].is_not_found());
    }

    #[test]
    fn test_default_app_name_is_directory_name() {
        let parent = tempfile::tempdir().unwrap();
        let dir = parent.path().join("computers-api");
        fs::create_dir(&dir).unwrap();

        let resolution = ConfigLoader::default()
            .without_env_file()
            .with_working_dir(&dir)
            .resolve();
        assert_eq!(resolution.config.app_name, "computers-api");
    }

    #[test]
    fn test_local_over_programmatic() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), LOCAL_FILE_NAME, r#"{"port": 8080, "debug": true}"#);

        let resolution = ConfigLoader::new(OrcheConfig::new().port(3001).path("/orche"))
            .without_env_file()
            .with_working_dir(dir.path())
            .resolve();

        assert!(resolution.warnings.is_empty());
        assert_eq!(resolution.config.port, 8080);
        assert!(resolution.config.debug);
        assert_eq!(resolution.config.mount_path, "/orche");
    }

    #[test]
    fn test_env_file_keyed_by_app_name() {
        let dir = tempfile::tempdir().unwrap();
        let env_file = write(
            dir.path(),
            "orche.json",
            r#"{"computers": {"port": 9000}, "other": {"port": 1}}"#,
        );

        let resolution = ConfigLoader::new(OrcheConfig::new().app_name("computers"))
            .with_env_file(env_file)
            .with_working_dir(dir.path())
            .resolve();
        assert_eq!(resolution.config.port, 9000);
    }

    #[test]
    fn test_env_file_missing_application() {
        let dir = tempfile::tempdir().unwrap();
        let env_file = write(dir.path(), "orche.json", r#"{"other": {"port": 1}}"#);
        write(dir.path(), LOCAL_FILE_NAME, "{}");

        let resolution = ConfigLoader::new(OrcheConfig::new().app_name("computers").port(3001))
            .with_env_file(env_file)
            .with_working_dir(dir.path())
            .resolve();
        assert_eq!(resolution.config.port, 3001);
        assert!(matches!(
            resolution.warnings.as_slice(),
            [ConfigFileError::MissingApplication { .. }]
        ));
    }

    #[test]
    fn test_local_app_name_selects_env_section() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), LOCAL_FILE_NAME, r#"{"appName": "from-rc"}"#);
        let env_file = write(dir.path(), "env.toml", "[from-rc]\nport = 7000\n");

        let resolution = ConfigLoader::default()
            .with_env_file(env_file)
            .with_working_dir(dir.path())
            .resolve();
        assert!(resolution.warnings.is_empty());
        assert_eq!(resolution.config.app_name, "from-rc");
        assert_eq!(resolution.config.port, 7000);
    }

    #[test]
    fn test_malformed_local_file_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), LOCAL_FILE_NAME, "{ port: ");

        let resolution = ConfigLoader::new(OrcheConfig::new().port(3001))
            .without_env_file()
            .with_working_dir(dir.path())
            .resolve();
        assert_eq!(resolution.config.port, 3001);
        assert!(matches!(
            resolution.warnings.as_slice(),
            [ConfigFileError::Json { .. }]
        ));
    }

    #[test]
    fn test_unset_env_var_reads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), LOCAL_FILE_NAME, "{}");
        let resolution = ConfigLoader::default()
            .with_env_file_var("ORCHE_CONFIG_UNSET_FOR_TESTS")
            .with_working_dir(dir.path())
            .resolve();
        assert!(resolution.warnings.is_empty());
        assert_eq!(resolution.config.port, 3000);
    }
}
