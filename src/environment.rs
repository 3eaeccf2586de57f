//! Key/value configuration loaded from a `.env` file, or from the process environment when the
//! file has nothing to offer.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;

/// Where the values of an [`Environment`] came from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Process,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::File(path) => write!(f, "{}", path.display()),
            Source::Process => f.write_str("process environment"),
        }
    }
}

/// Immutable snapshot of configuration values, resolved once at startup
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Environment {
    values: BTreeMap<String, String>,
    source: Source,
}

impl Environment {
    /// Read `path`, falling back to the process environment if it yields no entries
    pub fn load(path: &Path) -> anyhow::Result<Environment> {
        let from_file = read_env_file(path)?;
        Ok(Environment::resolve(path, from_file, process_env()))
    }

    /// A non-empty file mapping wins outright, otherwise the ambient snapshot is used. The two
    /// are never merged.
    pub fn resolve(
        path: &Path,
        from_file: BTreeMap<String, String>,
        ambient: BTreeMap<String, String>,
    ) -> Environment {
        if from_file.is_empty() {
            Environment {
                values: ambient,
                source: Source::Process,
            }
        } else {
            Environment {
                values: from_file,
                source: Source::File(path.to_path_buf()),
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.values.iter()
    }

    pub fn source(&self) -> &Source {
        &self.source
    }
}

/// Parse a `.env` file. Anything that isn't a regular file counts as an empty one.
pub fn read_env_file(path: &Path) -> anyhow::Result<BTreeMap<String, String>> {
    if !path.is_file() {
        return Ok(BTreeMap::new());
    }
    let lines = match dotenvy::from_path_iter(path) {
        Ok(lines) => lines,
        Err(e) if e.not_found() => return Ok(BTreeMap::new()),
        Err(e) => return Err(e).with_context(|| format!("Failed to open {}", path.display())),
    };

    let mut values = BTreeMap::new();
    for line in lines {
        match line {
            Ok((key, value)) => {
                values.insert(key, value);
            }
            Err(dotenvy::Error::LineParse(line, index)) => {
                log::warn!(
                    "Skipping malformed line in {} at offset {index}: {line:?}",
                    path.display()
                );
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        }
    }
    Ok(values)
}

/// Snapshot of the process environment. Pairs that aren't valid UTF-8 are left out.
pub fn process_env() -> BTreeMap<String, String> {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}
