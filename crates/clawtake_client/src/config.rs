//! Credentials load/save for `~/.config/clawtake/credentials.json`.
//! Resolution order (later wins): built-in default, on-disk record, environment.

use std::path::{Path, PathBuf};

/// Service URL used when neither the record nor the environment supplies one.
pub const DEFAULT_API_URL: &str = "https://clawtake.com/api";

/// Overrides the service URL from the record.
pub const API_URL_ENV: &str = "CLAWTAKE_API_URL";
/// Overrides the API key from the record.
pub const API_KEY_ENV: &str = "CLAWTAKE_API_KEY";
/// Overrides the location of the record itself.
pub const CREDENTIALS_PATH_ENV: &str = "CLAWTAKE_CREDENTIALS";

/// On-disk record. Every key is optional; missing keys fall through to the
/// lower-precedence source.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CredentialsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
}

/// Resolved credentials, fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub service_url: String,
    /// Empty when no source supplied a key; authenticated calls are refused.
    pub api_key: String,
    pub agent_name: Option<String>,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            agent_name: None,
        }
    }
}

impl Credentials {
    pub fn has_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Layer a record over these credentials. Empty values in the record are
    /// still taken, matching how the record was written.
    pub fn merge_file(mut self, file: CredentialsFile) -> Self {
        if let Some(url) = file.api_url {
            self.service_url = url;
        }
        if let Some(key) = file.api_key {
            self.api_key = key;
        }
        if file.agent_name.is_some() {
            self.agent_name = file.agent_name;
        }
        self
    }

    /// Layer environment overrides; only non-empty values apply.
    pub fn merge_env(mut self, env: &EnvOverrides) -> Self {
        if let Some(url) = env.api_url.as_deref().filter(|v| !v.is_empty()) {
            self.service_url = url.to_string();
        }
        if let Some(key) = env.api_key.as_deref().filter(|v| !v.is_empty()) {
            self.api_key = key.to_string();
        }
        self
    }

    fn to_file(&self) -> CredentialsFile {
        CredentialsFile {
            api_url: Some(self.service_url.clone()),
            api_key: Some(self.api_key.clone()),
            agent_name: self.agent_name.clone(),
        }
    }
}

/// Snapshot of the environment variables that override the record.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            api_url: std::env::var(API_URL_ENV).ok(),
            api_key: std::env::var(API_KEY_ENV).ok(),
        }
    }
}

/// Returns the default record path: `~/.config/clawtake/credentials.json`.
pub fn default_credentials_path() -> Option<PathBuf> {
    let home = home_dir()?;
    Some(
        home.join(".config")
            .join("clawtake")
            .join("credentials.json"),
    )
}

#[cfg(unix)]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

#[cfg(windows)]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE").map(PathBuf::from)
}

#[cfg(not(any(unix, windows)))]
fn home_dir() -> Option<PathBuf> {
    None
}

/// Read the record at `path`. A missing file is `Ok(None)`; a file that exists
/// but does not parse is an error, never a silent fallback to defaults.
pub fn load(path: &Path) -> Result<Option<CredentialsFile>, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Resolve credentials from the record at `path` and the process environment.
pub fn resolve(path: &Path) -> Result<Credentials, ConfigError> {
    resolve_with(path, &EnvOverrides::from_env())
}

/// Same as [`resolve`] with explicit environment overrides.
pub fn resolve_with(path: &Path, env: &EnvOverrides) -> Result<Credentials, ConfigError> {
    let mut creds = Credentials::default();
    if let Some(file) = load(path)? {
        creds = creds.merge_file(file);
    }
    let creds = creds.merge_env(env);
    tracing::debug!(
        path = %path.display(),
        service_url = %creds.service_url,
        has_key = creds.has_key(),
        "resolved credentials"
    );
    Ok(creds)
}

/// Save credentials to `path`. Creates the parent directory (owner-only) if
/// missing, writes the record, then restricts the file to owner read/write.
pub fn save(path: &Path, creds: &Credentials) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            create_private_dir(parent).map_err(io_err)?;
        }
    }
    let contents = serde_json::to_string_pretty(&creds.to_file())
        .map_err(|e| io_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
    write_private_file(path, contents.as_bytes()).map_err(io_err)?;
    restrict_file(path).map_err(io_err)?;
    tracing::info!(path = %path.display(), "saved credentials");
    Ok(())
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)
}

#[cfg(unix)]
fn write_private_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, contents)
}

// The open mode only applies to newly created files; an existing record keeps
// its old mode until this runs.
#[cfg(unix)]
fn restrict_file(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_file(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Credentials load/save error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot access credentials file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid credentials file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unable to determine credentials path (set --credentials or CLAWTAKE_CREDENTIALS)")]
    NoHomeDir,
}
