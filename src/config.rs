use crate::error::ConfigError;
use dirs::config_dir;
use std::collections::BTreeSet;
use std::fmt;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File name looked up next to the `Account` directory and in the user config dir
pub const CONFIG_FILE_NAME: &str = "wtf-sync.conf";

/// The character whose files are copied everywhere else
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prototype {
    pub account: String,

    /// `None` when the config names only `<account>/<character>`; the realm is
    /// then searched for under the account directory.
    pub realm: Option<String>,

    pub character: String,
}

impl Prototype {
    /// Parse `<account>/<character>` or `<account>/<realm>/<character>`
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        let segments: Vec<&str> = value.split('/').map(str::trim).collect();

        if segments.iter().any(|s| s.is_empty()) {
            return Err(ConfigError::InvalidPrototype(value.to_string()));
        }

        match segments.as_slice() {
            [account, character] => Ok(Self {
                account: account.to_string(),
                realm: None,
                character: character.to_string(),
            }),
            [account, realm, character] => Ok(Self {
                account: account.to_string(),
                realm: Some(realm.to_string()),
                character: character.to_string(),
            }),
            _ => Err(ConfigError::InvalidPrototype(value.to_string())),
        }
    }
}

impl fmt::Display for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.realm {
            Some(realm) => write!(f, "{}/{}/{}", self.account, realm, self.character),
            None => write!(f, "{}/{}", self.account, self.character),
        }
    }
}

/// Parsed sync preferences. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub prototype: Prototype,

    /// Addon names whose SavedVariables files are neither copied nor kept
    pub excluded_addons: BTreeSet<String>,

    /// Character item basenames that are never copied
    pub excluded_char_files: BTreeSet<String>,

    /// Character allow-list. Empty means every character participates.
    pub only_chars: BTreeSet<String>,
}

impl SyncConfig {
    /// Build a config for `prototype` with no exclusions and no allow-list
    pub fn new(prototype: Prototype) -> Self {
        Self {
            prototype,
            excluded_addons: BTreeSet::new(),
            excluded_char_files: BTreeSet::new(),
            only_chars: BTreeSet::new(),
        }
    }

    /// Parse line-oriented `key=value` text.
    ///
    /// Everything from the first `#` on a line is a comment. Unknown keys are
    /// ignored. List keys may be repeated; each occurrence adds to the set.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, ConfigError> {
        let mut prototype = None;
        let mut excluded_addons = BTreeSet::new();
        let mut excluded_char_files = BTreeSet::new();
        let mut only_chars = BTreeSet::new();

        for line in reader.lines() {
            let line = line?;
            let line = strip_comment(&line).trim();
            if line.is_empty() {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                tracing::debug!("Ignoring config line without '=': {}", line);
                continue;
            };
            let value = value.trim();

            match key.trim() {
                "prototype" => prototype = Some(Prototype::parse(value)?),
                "addon_excluded" => excluded_addons.extend(split_list(value)),
                "char_files_excluded" => excluded_char_files.extend(split_list(value)),
                "only_chars" => only_chars.extend(split_list(value)),
                other => tracing::debug!("Ignoring unknown config key: {}", other),
            }
        }

        Ok(Self {
            prototype: prototype.ok_or(ConfigError::MissingPrototype)?,
            excluded_addons,
            excluded_char_files,
            only_chars,
        })
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound(path.to_path_buf())
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        Self::from_reader(BufReader::new(file)).map_err(|e| match e {
            ConfigError::Read(source) => ConfigError::Io {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Pick the config file to use.
    ///
    /// An explicit path must exist. Otherwise `<wtf_dir>/wtf-sync.conf` is
    /// preferred over the user config directory.
    pub fn locate(explicit: Option<&Path>, wtf_dir: &Path) -> Result<PathBuf, ConfigError> {
        if let Some(path) = explicit {
            return if path.is_file() {
                Ok(path.to_path_buf())
            } else {
                Err(ConfigError::FileNotFound(path.to_path_buf()))
            };
        }

        let local = wtf_dir.join(CONFIG_FILE_NAME);
        if local.is_file() {
            return Ok(local);
        }

        match Self::default_config_path() {
            Some(path) if path.is_file() => Ok(path),
            _ => Err(ConfigError::FileNotFound(local)),
        }
    }

    /// Get the user-level configuration file path (XDG compliant)
    pub fn default_config_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("wtf-sync").join(CONFIG_FILE_NAME))
    }
}

impl FromStr for SyncConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_reader(s.as_bytes())
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn split_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
}
