//! Credential-file discovery and loading.
//!
//! Credentials live in a dotenv-formatted file. Callers hand over an ordered
//! list of candidate paths; the first one that exists is parsed into an
//! [`EnvFile`]. Parsing never touches the process environment, so the values
//! can be passed on explicitly to whatever needs them.
//!
//! ```no_run
//! use std::path::PathBuf;
//! use shared_utils::config::load_first_env_file;
//!
//! let env = load_first_env_file(&[PathBuf::from("config/.env"), PathBuf::from(".env")])?;
//! let key = env.require(&["API_KEY", "APCA_API_KEY_ID"])?;
//! # Ok::<(), shared_utils::config::ConfigError>(())
//! ```

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use thiserror::Error;

/// Errors related to application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// None of the candidate credential files exists.
    #[error("No credential file found (searched: {})", display_paths(.searched))]
    NoEnvFile { searched: Vec<PathBuf> },

    /// A credential file exists but is not valid dotenv syntax.
    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    /// A required key is neither in the file nor in the process environment.
    #[error("Missing key {} in {}", .keys.join(" | "), .path.display())]
    MissingKey { keys: Vec<String>, path: PathBuf },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Key/value pairs read from a dotenv file.
#[derive(Debug, Clone)]
pub struct EnvFile {
    path: PathBuf,
    vars: HashMap<String, String>,
}

impl EnvFile {
    /// Parses a dotenv file at `path`.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let parse_err = |source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        };
        let mut vars = HashMap::new();
        for item in dotenvy::from_path_iter(path).map_err(parse_err)? {
            let (key, value) = item.map_err(parse_err)?;
            vars.insert(key, value);
        }
        Ok(Self {
            path: path.to_path_buf(),
            vars,
        })
    }

    /// The file these values were read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value of `key` in the file, ignoring the process environment.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// First non-empty value among `keys`.
    ///
    /// Every key is looked up in the file before the process environment is
    /// consulted, so a file entry wins over an exported variable of an alias.
    pub fn require(&self, keys: &[&str]) -> Result<String, ConfigError> {
        keys.iter()
            .find_map(|k| self.get(k).filter(|v| !v.trim().is_empty()).map(str::to_owned))
            .or_else(|| crate::env::get_first_env_var(keys).ok())
            .ok_or_else(|| ConfigError::MissingKey {
                keys: keys.iter().map(|k| k.to_string()).collect(),
                path: self.path.clone(),
            })
    }
}

/// Loads the first existing file among `candidates`, in order.
///
/// Only existence decides which file is picked: a candidate that exists but
/// fails to parse is an error, later candidates are not tried.
pub fn load_first_env_file(candidates: &[PathBuf]) -> Result<EnvFile, ConfigError> {
    match candidates.iter().find(|p| p.is_file()) {
        Some(path) => EnvFile::from_path(path),
        None => Err(ConfigError::NoEnvFile {
            searched: candidates.to_vec(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let p = dir.path().join(name);
        fs::write(&p, body).unwrap();
        p
    }

    #[test]
    fn picks_first_existing_candidate() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("config/.env");
        let home = write(&dir, ".alpaca.env", "API_KEY=home-key\nSECRET_KEY=home-secret\n");
        let cwd = write(&dir, ".env", "API_KEY=cwd-key\n");

        let env = load_first_env_file(&[missing, home.clone(), cwd]).unwrap();
        assert_eq!(env.path(), home.as_path());
        assert_eq!(env.get("API_KEY"), Some("home-key"));
        assert_eq!(env.require(&["SECRET_KEY"]).unwrap(), "home-secret");
    }

    #[test]
    fn no_candidate_lists_searched_paths() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.env");
        let b = dir.path().join("b.env");
        let err = load_first_env_file(&[a.clone(), b.clone()]).unwrap_err();
        match &err {
            ConfigError::NoEnvFile { searched } => assert_eq!(searched, &vec![a, b]),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("a.env"));
    }

    #[test]
    fn alias_and_missing_keys() {
        let dir = TempDir::new().unwrap();
        let p = write(&dir, ".env", "APCA_API_KEY_ID=alias\nEMPTY=\n");
        let env = load_first_env_file(&[p]).unwrap();

        assert_eq!(
            env.require(&["SHARED_UTILS_TEST_UNSET", "APCA_API_KEY_ID"]).unwrap(),
            "alias"
        );
        assert!(matches!(
            env.require(&["EMPTY", "SHARED_UTILS_TEST_UNSET"]),
            Err(ConfigError::MissingKey { .. })
        ));
    }

    #[test]
    fn quoted_values_and_comments() {
        let dir = TempDir::new().unwrap();
        let p = write(&dir, ".env", "# credentials\nAPI_KEY=\"quoted\"\n");
        let env = EnvFile::from_path(&p).unwrap();
        assert_eq!(env.get("API_KEY"), Some("quoted"));
    }
}
