use std::io;

use clap::Parser;

use stamplog::environment::Environment;
use stamplog::settings::{CliArgs, Settings};
use stamplog::sink::FileSink;
use stamplog::{clock, instrument, layering};

fn main() {
    let cli = CliArgs::parse();
    let print_config = cli.print_config;

    let settings = match layering::get_layered_settings_from_cli(cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to resolve settings: {e:#}");
            return;
        }
    };

    if print_config {
        match settings.to_documented_toml() {
            Ok(toml) => print!("{toml}"),
            Err(e) => eprintln!("Failed to render settings: {e:#}"),
        }
        return;
    }

    init_logging(&settings);

    // Failures end up in the log, never in the exit code
    instrument::settle(|| run(&settings));
    log::logger().flush();
}

fn init_logging(settings: &Settings) {
    let installed = settings
        .log_path()
        .and_then(|path| FileSink::open(&path))
        .and_then(FileSink::install);

    if let Err(e) = installed {
        let fallback = stderrlog::new()
            .show_module_names(true)
            .color(stderrlog::ColorChoice::Auto)
            .verbosity(log::Level::Info)
            .init();
        match fallback {
            Ok(()) => log::warn!("Logging to stderr instead of a file: {e:#}"),
            Err(_) => eprintln!("No logger available: {e:#}"),
        }
    }
}

fn run(settings: &Settings) -> anyhow::Result<()> {
    let env = Environment::load(&settings.env_file)?;
    log::debug!(
        "Loaded {} configuration values from {}",
        env.len(),
        env.source()
    );

    instrument::call("print_now", || clock::print_now(io::stdout().lock()))?;
    Ok(())
}
