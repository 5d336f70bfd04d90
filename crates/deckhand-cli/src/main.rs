//! Deckhand CLI tool.

use clap::builder::BoolishValueParser;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "deckhand")]
#[command(about = "Deckhand pipeline settings and lifecycle tool", long_about = None)]
struct Cli {
    /// Log output format
    #[arg(
        long,
        env = "DECKHAND_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Text,
        global = true
    )]
    log_format: LogFormat,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(
        long,
        env = "DECKHAND_DEBUG",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve and print settings
    Settings {
        /// Print as JSON
        #[arg(long)]
        json: bool,
        /// Print credentials instead of masking them
        #[arg(long)]
        show_secrets: bool,
    },
    /// Load the built-in plugins and report which are enabled
    Plugins {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run a command inside a lifecycle phase
    Run(commands::run::RunArgs),
}

fn init_tracing(format: LogFormat, debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format, cli.debug);

    match cli.command {
        Commands::Settings { json, show_secrets } => {
            commands::settings::show(json, show_secrets)?;
        }
        Commands::Plugins { json } => {
            commands::plugins::list(json)?;
        }
        Commands::Run(args) => {
            commands::run::run(args)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, FromArgMatches};

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_takes_command_after_separator() {
        let cli = Cli::try_parse_from([
            "deckhand",
            "run",
            "container-build-stage",
            "--stage",
            "development",
            "--",
            "docker",
            "build",
            "--target",
            "development",
            ".",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.phase, commands::run::PhaseKind::ContainerBuildStage);
        assert_eq!(args.stage, "development");
        assert_eq!(
            args.command,
            vec!["docker", "build", "--target", "development", "."]
        );
    }

    #[test]
    fn test_debug_env_accepts_setting_spellings() {
        // A variable only this test sets, so parallel tests are unaffected.
        const VAR: &str = "DECKHAND_CLI_TEST_DEBUG";
        let command = Cli::command().mut_arg("debug", |arg| arg.env(VAR));

        let cases = [
            ("1", true),
            ("yes", true),
            ("on", true),
            ("0", false),
            ("off", false),
        ];
        for (raw, expected) in cases {
            unsafe { std::env::set_var(VAR, raw) };
            let matches = command
                .clone()
                .try_get_matches_from(["deckhand", "plugins"])
                .unwrap();
            let cli = Cli::from_arg_matches(&matches).unwrap();
            assert_eq!(cli.debug, expected, "{raw}");
        }
        unsafe { std::env::remove_var(VAR) };

        let cli = Cli::try_parse_from(["deckhand", "--debug", "plugins"]).unwrap();
        assert!(cli.debug);
    }

    #[test]
    fn test_log_format_flag() {
        let cli = Cli::try_parse_from(["deckhand", "--log-format", "json", "plugins"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
    }
}
