//! `gwdemo`: runs the gwcore start-up sequence end to end.
//!
//! Flags are latched into the settings, an optional INI file fills in the
//! rest, logging is configured from the result, and a small state file
//! counts the runs. Commands:
//!
//! - *(none)* or `show`: log the settings
//! - `fail`: raise a configuration error to exercise the funnel
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use gwcore::GwError;
use gwcore::cli::{CliArgs, CliSchema, Switch};
use gwcore::config::{ConfigParser, Converter, ImportSpec, Value, settings, state};
use gwcore::funnel;
use gwcore::logging::{LogConfig, Logger, Severity, setup_logging};

/// INI section the demo reads its settings from.
const SECTION: &str = "gwdemo";

fn main() -> ExitCode {
    let root = Logger::root();
    funnel::install_panic_hook(root.clone());
    funnel::run_guarded(&root, run)
}

fn schema() -> CliSchema {
    let version = option_env!("GWCORE_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    CliSchema::new("gwdemo", "Demonstrate the gwcore start-up sequence")
        .version(format!("gwdemo {version}"))
        .subcommand()
        .with_all(Switch::ALL)
}

fn import_specs() -> Vec<ImportSpec> {
    vec![
        ImportSpec::new("log_level", SECTION).with_converter(Converter::Severity),
        ImportSpec::new("log_file", SECTION).with_converter(Converter::Path),
        ImportSpec::new("log_file_level", SECTION).with_converter(Converter::Severity),
        ImportSpec::new("log_file_size", SECTION).with_converter(Converter::Int),
        ImportSpec::new("log_file_rotations", SECTION).with_converter(Converter::Int),
        ImportSpec::new("no_color", SECTION).with_converter(Converter::Bool),
        ImportSpec::new("accent", SECTION).with_converter(Converter::Color),
        ImportSpec::new("state_file", SECTION)
            .with_converter(Converter::Path)
            .with_default(PathBuf::from("gwdemo.state")),
    ]
}

/// Latch the flags, read the config file and import the demo's settings.
///
/// Returns the warnings to report once logging is up.
fn load_settings(args: &CliArgs) -> Result<(LogConfig, Vec<GwError>)> {
    let mut settings = settings::global();
    settings.update_as_immutable(args);

    let mut parser = ConfigParser::new();
    let mut warnings = Vec::new();
    if let Some(path) = &args.config_file {
        match parser.parse_file(path) {
            Ok(()) => {}
            Err(err) if err.is_warning() => warnings.push(err),
            Err(err) => return Err(err.into()),
        }
    }
    settings.bind_parser(parser);
    warnings.extend(settings.import_settings(&import_specs())?);

    let config = LogConfig::from_settings(&settings)?;
    drop(settings);
    Ok((config, warnings))
}

/// Bump the run counter in the state file.
fn count_run(log: &Logger) -> Result<i64> {
    let Some(path) = settings::global().get_path("state_file") else {
        return Ok(0);
    };
    let mut state = state::global();
    if let Err(err) = state.load(&path) {
        if !err.is_warning() {
            return Err(err.into());
        }
        log.debug(format_args!("starting fresh: {err}"));
    }
    let runs = state
        .peek("runs")
        .and_then(|v| v.to_string().parse::<i64>().ok())
        .unwrap_or(0)
        + 1;
    state.set("runs", runs);
    state.save("state")?;
    Ok(runs)
}

fn run() -> Result<()> {
    let schema = schema();
    let args = CliArgs::from_matches(&schema, &schema.command().get_matches());

    let (config, warnings) = load_settings(&args)?;
    let log = setup_logging(&config)?;
    for warning in &warnings {
        log.exception(warning);
    }

    let runs = count_run(&log)?;
    log.diagnostic(format_args!("run number {runs}"));

    match args.command.as_deref().unwrap_or_default() {
        "" | "show" => {
            let settings = settings::global();
            for line in settings.dump().lines() {
                log.info(line);
            }
            if let Some(Value::Color(accent)) = settings.peek("accent") {
                log.debug(format_args!("accent color {accent}"));
            }
            Ok(())
        }
        "fail" => Err(GwError::config("demonstration failure")
            .with_log_level(Severity::Critical)
            .into()),
        other => Err(GwError::value(format!("unknown command {other:?}")).into()),
    }
}
