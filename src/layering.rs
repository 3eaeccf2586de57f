use std::collections::BTreeMap;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;

use crate::settings::{CliArgs, Settings};

/// Prefix of the environment variables that override [`Settings`] fields
pub const ENV_PREFIX: &str = "STAMPLOG_";

pub fn get_layered_settings_from_cli(cli: CliArgs) -> anyhow::Result<Settings> {
    get_layered_settings(cli, env_overrides())
}

/// `STAMPLOG_*` variables keyed by lowercased field name. Values stay raw strings, so that
/// `STAMPLOG_LOG_FILE=123` names a file instead of becoming a number.
pub fn env_overrides() -> BTreeMap<String, String> {
    Env::prefixed(ENV_PREFIX)
        .iter()
        .map(|(key, value)| (key.as_str().to_ascii_lowercase(), value))
        .collect()
}

pub fn get_layered_settings(
    cli: CliArgs,
    env: BTreeMap<String, String>,
) -> anyhow::Result<Settings> {
    let mut builder = Figment::new().merge(Serialized::defaults(Settings::default()));

    // An explicitly requested settings file has to exist, unlike the .env file
    if let Some(path) = cli.config {
        if !path.is_file() {
            anyhow::bail!("Settings file: {} does not exist", path.display());
        }
        builder = builder.merge(Toml::file(path));
    }

    builder = builder.merge(Serialized::defaults(env));

    // The CLI layer is nullable, so only arguments the user actually passed override the
    // layers below.
    builder = builder.merge(Serialized::defaults(cli.nullable_settings));

    let settings: Settings = builder.extract()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;

    use tempdir::TempDir;

    use super::*;
    use crate::settings::NullableSettings;

    struct SettingsFixture {
        dir: TempDir,
        file: File,
        cli: CliArgs,
    }

    impl SettingsFixture {
        fn new() -> anyhow::Result<SettingsFixture> {
            let dir = TempDir::new("settings")?;
            let path = dir.path().join("stamplog.toml");
            let file = File::create(&path)?;
            let cli = CliArgs {
                config: Some(path),
                print_config: false,
                nullable_settings: NullableSettings::default(),
            };

            Ok(SettingsFixture { dir, file, cli })
        }
    }

    fn bare_cli() -> CliArgs {
        CliArgs {
            config: None,
            print_config: false,
            nullable_settings: NullableSettings::default(),
        }
    }

    fn env(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_without_any_layers() {
        let cli = bare_cli();
        let actual = get_layered_settings(cli, BTreeMap::new()).unwrap();
        assert_eq!(actual, Settings::default());
    }

    #[test]
    fn missing_settings_file_is_an_error() {
        let fixture = SettingsFixture::new().unwrap();
        drop(fixture.file);
        drop(fixture.dir);
        let result = get_layered_settings(fixture.cli, BTreeMap::new());
        assert!(result.is_err());
    }

    #[test]
    fn empty_settings_file_keeps_defaults() {
        let fixture = SettingsFixture::new().unwrap();
        let actual = get_layered_settings(fixture.cli.clone(), BTreeMap::new()).unwrap();
        assert_eq!(actual, Settings::default());
    }

    #[test]
    fn each_layer_overrides_the_previous() {
        let mut fixture = SettingsFixture::new().unwrap();
        let mut expected = Settings::default();

        writeln!(fixture.file, "log_file = \"/tmp/from-file.log\"").unwrap();
        expected.log_file = PathBuf::from("/tmp/from-file.log");
        let actual = get_layered_settings(fixture.cli.clone(), BTreeMap::new()).unwrap();
        assert_eq!(actual, expected);

        fixture.cli.nullable_settings.log_file = Some(PathBuf::from("/tmp/from-cli.log"));
        expected.log_file = PathBuf::from("/tmp/from-cli.log");
        let actual = get_layered_settings(fixture.cli.clone(), BTreeMap::new()).unwrap();
        assert_eq!(actual, expected);

        // Passing the default value on the CLI still overrides the file
        writeln!(fixture.file, "env_file = \"settings.env\"").unwrap();
        fixture.cli.nullable_settings.env_file = Some(PathBuf::from(".env"));
        let actual = get_layered_settings(fixture.cli.clone(), BTreeMap::new()).unwrap();
        assert_eq!(actual, expected);

        fixture.cli.nullable_settings.env_file = None;
        expected.env_file = PathBuf::from("settings.env");
        let actual = get_layered_settings(fixture.cli.clone(), BTreeMap::new()).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn unknown_keys_in_the_settings_file_are_ignored() {
        let mut fixture = SettingsFixture::new().unwrap();
        writeln!(fixture.file, "placeholder = 42").unwrap();
        let actual = get_layered_settings(fixture.cli, BTreeMap::new()).unwrap();
        assert_eq!(actual, Settings::default());
    }

    #[test]
    fn env_layer_sits_between_the_file_and_the_cli() {
        let mut fixture = SettingsFixture::new().unwrap();
        writeln!(fixture.file, "log_file = \"/tmp/from-file.log\"").unwrap();
        let vars = env(&[("log_file", "/tmp/from-env.log")]);

        let actual = get_layered_settings(fixture.cli.clone(), vars.clone()).unwrap();
        assert_eq!(actual.log_file, PathBuf::from("/tmp/from-env.log"));

        fixture.cli.nullable_settings.log_file = Some(PathBuf::from("/tmp/from-cli.log"));
        let actual = get_layered_settings(fixture.cli, vars).unwrap();
        assert_eq!(actual.log_file, PathBuf::from("/tmp/from-cli.log"));
    }

    #[test]
    fn numeric_looking_env_values_are_still_paths() {
        let vars = env(&[("log_file", "123"), ("env_file", "true")]);
        let actual = get_layered_settings(bare_cli(), vars).unwrap();
        assert_eq!(actual.log_file, PathBuf::from("123"));
        assert_eq!(actual.env_file, PathBuf::from("true"));
    }

    #[test]
    fn env_overrides_strip_the_prefix_and_keep_raw_strings() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("STAMPLOG_LOG_FILE", "123");
            jail.set_env("OTHER_LOG_FILE", "/tmp/ignored.log");

            let vars = env_overrides();
            assert_eq!(vars.get("log_file").map(String::as_str), Some("123"));
            assert!(!vars.values().any(|v| v == "/tmp/ignored.log"));

            let settings = get_layered_settings_from_cli(bare_cli()).map_err(|e| e.to_string())?;
            assert_eq!(settings.log_file, PathBuf::from("123"));
            Ok(())
        });
    }
}
