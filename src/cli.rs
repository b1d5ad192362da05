//! A catalogue of standard command-line flags.
//!
//! [`CliSchema`] picks flags from a fixed catalogue (fixed spellings, help
//! text and destination keys) and builds a [`clap::Command`] from them.
//! After parsing, [`CliArgs::from_matches`] flattens the matches into a
//! record that can be latched into the settings with
//! [`Settings::update_as_immutable`](crate::config::Settings::update_as_immutable).
use std::collections::BTreeSet;

use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::config::{SettingsSource, Value};
use crate::logging::Severity;

/// An optional flag from the standard catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Switch {
    /// `-d/--dev/--devel` → `dev_mode`.
    Devel,
    /// `-v/--verbose` → `log_level = DIAGNOSTIC`.
    Verbose,
    /// `--vv/--very-verbose/--debug` → `log_level = DEBUG`.
    VeryVerbose,
    /// `--trace` → `log_level = TRACE`.
    Trace,
    /// `--nocolor/--no-color` → `no_color`.
    NoColor,
    /// `-l/--logfile FILE` → `log_file`.
    LogFile,
    /// `-c/--configfile FILE` → `config_file`.
    ConfigFile,
    /// `-i/--infile FILE` → `in_file`.
    InFile,
    /// `-o/--outfile FILE` → `out_file`.
    OutFile,
    /// `-r/--recurse` → `recurse`.
    Recurse,
}

impl Switch {
    /// Every switch, in catalogue order.
    pub const ALL: [Self; 10] = [
        Self::Devel,
        Self::Verbose,
        Self::VeryVerbose,
        Self::Trace,
        Self::NoColor,
        Self::LogFile,
        Self::ConfigFile,
        Self::InFile,
        Self::OutFile,
        Self::Recurse,
    ];

    /// Argument id, which is also the destination key for non-verbosity
    /// switches.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Devel => "dev_mode",
            Self::Verbose => "verbose",
            Self::VeryVerbose => "very_verbose",
            Self::Trace => "trace",
            Self::NoColor => "no_color",
            Self::LogFile => "log_file",
            Self::ConfigFile => "config_file",
            Self::InFile => "in_file",
            Self::OutFile => "out_file",
            Self::Recurse => "recurse",
        }
    }

    /// Log level selected by a verbosity switch.
    #[must_use]
    pub const fn verbosity(self) -> Option<Severity> {
        match self {
            Self::Verbose => Some(Severity::Diagnostic),
            Self::VeryVerbose => Some(Severity::Debug),
            Self::Trace => Some(Severity::Trace),
            _ => None,
        }
    }

    const fn takes_value(self) -> bool {
        matches!(
            self,
            Self::LogFile | Self::ConfigFile | Self::InFile | Self::OutFile
        )
    }

    fn arg(self) -> Arg {
        let arg = Arg::new(self.id());
        let arg = match self {
            Self::Devel => arg
                .short('d')
                .long("dev")
                .visible_alias("devel")
                .help("Run in developer mode"),
            Self::Verbose => arg
                .short('v')
                .long("verbose")
                .help("Show diagnostic output"),
            Self::VeryVerbose => arg
                .long("vv")
                .visible_aliases(["very-verbose", "debug"])
                .help("Show debug output"),
            Self::Trace => arg.long("trace").help("Show trace output"),
            Self::NoColor => arg
                .long("nocolor")
                .visible_alias("no-color")
                .help("Disable colored console output"),
            Self::LogFile => arg
                .short('l')
                .long("logfile")
                .value_name("FILE")
                .help("Also write the log to FILE"),
            Self::ConfigFile => arg
                .short('c')
                .long("configfile")
                .value_name("FILE")
                .help("Read settings from FILE"),
            Self::InFile => arg
                .short('i')
                .long("infile")
                .value_name("FILE")
                .help("Input file"),
            Self::OutFile => arg
                .short('o')
                .long("outfile")
                .value_name("FILE")
                .help("Output file"),
            Self::Recurse => arg
                .short('r')
                .long("recurse")
                .help("Descend into subdirectories"),
        };
        if self.takes_value() {
            arg.action(ArgAction::Set)
        } else {
            arg.action(ArgAction::SetTrue)
        }
    }
}

/// How many positional file names are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly `n`.
    Exactly(usize),
    /// Zero or one (`?`).
    Optional,
    /// Any number (`*`).
    Any,
    /// One or more (`+`).
    AtLeastOne,
}

impl Arity {
    /// `false` for `Exactly(0)`, which adds no positional at all.
    const fn accepts_values(self) -> bool {
        !matches!(self, Self::Exactly(0))
    }

    fn is_required(self) -> bool {
        matches!(self, Self::AtLeastOne) || matches!(self, Self::Exactly(n) if n > 0)
    }

    fn apply(self, arg: Arg) -> Arg {
        let arg = arg.required(self.is_required()).action(ArgAction::Set);
        match self {
            Self::Exactly(n) => arg.num_args(n),
            Self::Optional => arg.num_args(0..=1),
            Self::Any => arg.num_args(0..),
            Self::AtLeastOne => arg.num_args(1..),
        }
    }
}

const COMMAND_ID: &str = "command";
const FILENAMES_ID: &str = "filenames";

/// Which standard flags a program accepts.
///
/// # Examples
///
/// ```
/// use gwcore::cli::{CliArgs, CliSchema, Switch};
/// use gwcore::logging::Severity;
///
/// let schema = CliSchema::new("tool", "Does things")
///     .with(Switch::Verbose)
///     .with(Switch::ConfigFile);
/// let matches = schema.command().get_matches_from(["tool", "-v", "-c", "app.ini"]);
/// let args = CliArgs::from_matches(&schema, &matches);
///
/// assert_eq!(args.log_level, Some(Severity::Diagnostic));
/// assert_eq!(args.config_file.as_deref(), Some("app.ini"));
/// assert_eq!(args.recurse, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliSchema {
    name: String,
    about: String,
    version: Option<String>,
    subcommand: bool,
    filenames: Option<Arity>,
    switches: BTreeSet<Switch>,
}

impl CliSchema {
    /// A schema with no optional flags.
    #[must_use]
    pub fn new(name: impl Into<String>, about: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            about: about.into(),
            version: None,
            subcommand: false,
            filenames: None,
            switches: BTreeSet::new(),
        }
    }

    /// Add `--version`, printing `text` and exiting.
    #[must_use]
    pub fn version(mut self, text: impl Into<String>) -> Self {
        self.version = Some(text.into());
        self
    }

    /// Accept a leading positional `command`.
    ///
    /// It is required when file names are also accepted, and defaults to
    /// the empty string otherwise.
    #[must_use]
    pub const fn subcommand(mut self) -> Self {
        self.subcommand = true;
        self
    }

    /// Accept positional `filenames` with the given arity.
    ///
    /// `Arity::Exactly(0)` registers no positional; `filenames` then parses
    /// as an empty list.
    #[must_use]
    pub const fn filenames(mut self, arity: Arity) -> Self {
        self.filenames = Some(arity);
        self
    }

    /// Enable `switch`.
    #[must_use]
    pub fn with(mut self, switch: Switch) -> Self {
        self.switches.insert(switch);
        self
    }

    /// Enable every switch in `switches`.
    #[must_use]
    pub fn with_all(mut self, switches: impl IntoIterator<Item = Switch>) -> Self {
        self.switches.extend(switches);
        self
    }

    /// Whether `switch` is enabled.
    #[must_use]
    pub fn has(&self, switch: Switch) -> bool {
        self.switches.contains(&switch)
    }

    fn has_verbosity(&self) -> bool {
        self.switches.iter().any(|s| s.verbosity().is_some())
    }

    /// Build the parser. Nothing is parsed here.
    #[must_use]
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(self.name.clone())
            .about(self.about.clone())
            .disable_version_flag(true);

        if let Some(version) = &self.version {
            cmd = cmd.version(version.clone()).arg(
                Arg::new("version")
                    .long("version")
                    .action(ArgAction::Version)
                    .help("Print version"),
            );
        }

        if self.subcommand {
            let arg = Arg::new(COMMAND_ID).value_name("COMMAND").help("Command to run");
            cmd = cmd.arg(if self.filenames.is_some() {
                arg.required(true)
            } else {
                arg.default_value("")
            });
        }

        if let Some(arity) = self.filenames
            && arity.accepts_values()
        {
            cmd = cmd.arg(arity.apply(
                Arg::new(FILENAMES_ID)
                    .value_name("FILE")
                    .help("Files to process"),
            ));
        }

        for switch in &self.switches {
            cmd = cmd.arg(switch.arg());
        }
        cmd
    }
}

/// The flat record produced from parsed flags.
///
/// Fields of disabled flags are `None`. Enabled boolean flags are
/// `Some(false)` when absent, and `log_level` is `Some(INFO)` unless a
/// verbosity flag was given (the most verbose one wins).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    /// Positional command.
    pub command: Option<String>,
    /// Positional file names.
    pub filenames: Option<Vec<String>>,
    /// `--dev`.
    pub dev_mode: Option<bool>,
    /// Level selected by the verbosity flags.
    pub log_level: Option<Severity>,
    /// `--nocolor`.
    pub no_color: Option<bool>,
    /// `--logfile`.
    pub log_file: Option<String>,
    /// `--configfile`.
    pub config_file: Option<String>,
    /// `--infile`.
    pub in_file: Option<String>,
    /// `--outfile`.
    pub out_file: Option<String>,
    /// `--recurse`.
    pub recurse: Option<bool>,
}

impl CliArgs {
    /// Flatten `matches`, which must come from `schema.command()`.
    #[must_use]
    pub fn from_matches(schema: &CliSchema, matches: &ArgMatches) -> Self {
        let flag = |switch: Switch| {
            schema
                .has(switch)
                .then(|| matches.get_flag(switch.id()))
        };
        let text = |switch: Switch| {
            if schema.has(switch) {
                matches.get_one::<String>(switch.id()).cloned()
            } else {
                None
            }
        };

        let log_level = schema.has_verbosity().then(|| {
            Switch::ALL
                .into_iter()
                .filter_map(|s| s.verbosity().map(|level| (s, level)))
                .filter(|(s, _)| schema.has(*s) && matches.get_flag(s.id()))
                .map(|(_, level)| level)
                .min()
                .unwrap_or(Severity::Info)
        });

        let command = if schema.subcommand {
            matches.get_one::<String>(COMMAND_ID).cloned()
        } else {
            None
        };
        let filenames = schema.filenames.map(|arity| {
            if arity.accepts_values() {
                matches
                    .get_many::<String>(FILENAMES_ID)
                    .map(|values| values.cloned().collect())
                    .unwrap_or_default()
            } else {
                Vec::new()
            }
        });

        Self {
            command,
            filenames,
            dev_mode: flag(Switch::Devel),
            log_level,
            no_color: flag(Switch::NoColor),
            log_file: text(Switch::LogFile),
            config_file: text(Switch::ConfigFile),
            in_file: text(Switch::InFile),
            out_file: text(Switch::OutFile),
            recurse: flag(Switch::Recurse),
        }
    }
}

impl SettingsSource for CliArgs {
    fn setting_entries(&self) -> Vec<(String, Option<Value>)> {
        let text = |v: &Option<String>| v.clone().map(Value::Text);
        vec![
            ("command".to_string(), text(&self.command)),
            (
                "filenames".to_string(),
                self.filenames.clone().map(Value::List),
            ),
            ("dev_mode".to_string(), self.dev_mode.map(Value::Bool)),
            ("log_level".to_string(), self.log_level.map(Value::Severity)),
            ("no_color".to_string(), self.no_color.map(Value::Bool)),
            ("log_file".to_string(), text(&self.log_file)),
            ("config_file".to_string(), text(&self.config_file)),
            ("in_file".to_string(), text(&self.in_file)),
            ("out_file".to_string(), text(&self.out_file)),
            ("recurse".to_string(), self.recurse.map(Value::Bool)),
        ]
    }
}
