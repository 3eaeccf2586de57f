use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser};
use documented::{Documented, DocumentedFields};
use serde::{Deserialize, Serialize};
use struct_field_names_as_array::FieldNamesAsArray;

#[derive(Clone, Debug, Parser)]
#[clap(version, about)]
pub struct CliArgs {
    /// Path to an optional TOML settings file
    #[clap(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Print the effective settings as documented TOML and exit without printing the time
    #[clap(long)]
    pub print_config: bool,

    // Only the overrides the user actually passed end up in here
    #[clap(flatten)]
    pub nullable_settings: NullableSettings,
}

/// A copy of [`Settings`] where every field is optional, so that CLI arguments only
/// override the lower layers when they are given.
#[derive(Clone, Debug, Default, PartialEq, Eq, Args, Serialize)]
pub struct NullableSettings {
    /// Log file receiving one line per record
    #[clap(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    /// KEY=VALUE file to load configuration values from
    #[clap(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_file: Option<PathBuf>,
}

/// stamplog runtime settings
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Documented,
    DocumentedFields,
    Deserialize,
    Serialize,
    FieldNamesAsArray,
)]
pub struct Settings {
    /// Append-only log file. A relative path is resolved against the directory
    /// containing the stamplog executable.
    pub log_file: PathBuf,

    /// Optional KEY=VALUE file, resolved against the working directory. When it is
    /// missing or empty the process environment is used instead.
    pub env_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            log_file: PathBuf::from("stdout.log"),
            env_file: PathBuf::from(".env"),
        }
    }
}

impl Settings {
    /// Where log records are appended
    pub fn log_path(&self) -> anyhow::Result<PathBuf> {
        if self.log_file.is_absolute() {
            return Ok(self.log_file.clone());
        }
        let exe = std::env::current_exe().context("Failed to locate the running executable")?;
        let exe = exe.canonicalize().unwrap_or(exe);
        let dir = exe
            .parent()
            .with_context(|| format!("Executable {} has no parent directory", exe.display()))?;
        Ok(dir.join(&self.log_file))
    }

    fn docstring_to_toml_comment(docstring: &str) -> String {
        let mut toml_comment = String::new();
        for line in docstring.lines() {
            let toml_line = if line.is_empty() {
                String::from("#\n")
            } else {
                format!("# {line}\n")
            };
            toml_comment.push_str(&toml_line);
        }
        toml_comment
    }

    /// Serialize the `Settings` to a TOML document, where each field is prefixed with its
    /// documentation
    pub fn to_documented_toml(&self) -> anyhow::Result<String> {
        let mut doc = toml_edit::ser::to_document(self)?;

        for (idx, (mut key, _value)) in doc.iter_mut().enumerate() {
            let docstring = Settings::get_field_comment(key.get())?;
            let mut toml_comment = Self::docstring_to_toml_comment(docstring);

            // The struct docs go in front of the very first key
            if idx == 0 {
                let overview = Self::docstring_to_toml_comment(Self::DOCS);
                toml_comment = format!("{overview}\n{toml_comment}");
            } else {
                toml_comment = format!("\n{toml_comment}");
            }
            key.decor_mut().set_prefix(toml_comment);
        }
        Ok(doc.to_string())
    }
}
