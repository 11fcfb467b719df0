//! Provides the CLI option parser
//!
//! Used to parse the argv/config file into a struct that the perfstat
//! executable can consume and use as configuration data. Values given on the
//! command line override those in the config file.

use clap::{App, AppSettings, Arg, ArgMatches};
use instrument::InstrumentKind;
use std::error;
use std::ffi::OsString;
use std::fmt;
use std::fs::File;
use std::io;
use std::io::Read;
use std::path::Path;
use toml;

const VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");

fn default_version() -> String {
    VERSION.unwrap_or("unknown").to_string()
}

/// How the final report is printed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReportFormat {
    /// One line per metric, for people.
    Text,
    /// A single JSON document, for programs.
    Json,
}

/// Configuration for the perfstat executable
///
/// This struct is what we construct from parsing the command line and the
/// optional config file. Please see `parse_args` and `parse_config_file` in
/// this module for more details.
#[derive(Debug)]
pub struct Args {
    /// How many times the command is run and sampled.
    pub iterations: usize,
    /// The instruments to sample with, in start order.
    pub instruments: Vec<InstrumentKind>,
    /// The format of the final report.
    pub format: ReportFormat,
    /// The verbosity setting of perfstat. The higher the value the more
    /// chatty perfstat gets.
    pub verbose: u64,
    /// perfstat version string. This is set automatically.
    pub version: String,
    /// The workload: program followed by its arguments.
    pub command: Vec<String>,
}

impl Default for Args {
    fn default() -> Self {
        Args {
            iterations: 10,
            instruments: vec![InstrumentKind::WallClock, InstrumentKind::Pmu],
            format: ReportFormat::Text,
            verbose: 0,
            version: default_version(),
            command: Vec::new(),
        }
    }
}

/// Reasons configuration could not be loaded.
#[derive(Debug)]
pub enum Error {
    /// The config file could not be read.
    Io(io::Error),
    /// The config file is not valid TOML.
    Toml(toml::de::Error),
    /// The command line could not be parsed.
    Cli(::clap::Error),
    /// A setting has the wrong type or an unacceptable value.
    InvalidValue {
        /// The offending setting.
        key: String,
        /// What is wrong with it.
        reason: String,
    },
}

fn invalid<S>(key: &str, reason: S) -> Error
where
    S: Into<String>,
{
    Error::InvalidValue {
        key: key.to_string(),
        reason: reason.into(),
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io(ref e) => write!(f, "could not read config file: {}", e),
            Error::Toml(ref e) => write!(f, "could not parse config file: {}", e),
            Error::Cli(ref e) => write!(f, "{}", e),
            Error::InvalidValue { ref key, ref reason } => {
                write!(f, "invalid value for '{}': {}", key, reason)
            }
        }
    }
}

impl error::Error for Error {}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Error {
        Error::Toml(e)
    }
}

impl From<::clap::Error> for Error {
    fn from(e: ::clap::Error) -> Error {
        Error::Cli(e)
    }
}

fn app() -> App<'static, 'static> {
    App::new("perfstat")
        .version(VERSION.unwrap_or("unknown"))
        .about("run a command repeatedly and report hardware counter statistics")
        .setting(AppSettings::TrailingVarArg)
        .arg(
            Arg::with_name("config-file")
                .long("config")
                .short("C")
                .value_name("config")
                .help("The config file to feed in.")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("repeat")
                .long("repeat")
                .short("r")
                .value_name("N")
                .help("Run and sample the command N times.")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("instruments")
                .long("instruments")
                .short("e")
                .value_name("LIST")
                .help("Comma separated instruments: wall_clock, pmu.")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("json")
                .long("json")
                .help("Print the report as JSON."),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Turn on verbose output."),
        )
        .arg(
            Arg::with_name("command")
                .value_name("COMMAND")
                .multiple(true)
                .required(true)
                .help("The command to profile, with its arguments."),
        )
}

/// Parse the process' command line. Exits on `--help` and `--version`.
pub fn parse_args() -> Result<Args, Error> {
    from_matches(&app().get_matches())
}

/// Parse an explicit argv, program name first.
pub fn parse_args_from<I, T>(argv: I) -> Result<Args, Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = app().get_matches_from_safe(argv)?;
    from_matches(&matches)
}

fn from_matches(matches: &ArgMatches) -> Result<Args, Error> {
    let verb = matches.occurrences_of("verbose");

    let mut args = match matches.value_of("config-file") {
        Some(filename) => parse_config_path(Path::new(filename), verb)?,
        None => {
            let mut args = Args::default();
            args.verbose = verb;
            args
        }
    };

    if let Some(n) = matches.value_of("repeat") {
        let n = n.parse::<i64>()
            .map_err(|e| invalid("repeat", e.to_string()))?;
        args.iterations = check_iterations("repeat", n)?;
    }
    if let Some(list) = matches.value_of("instruments") {
        let names: Vec<&str> = list.split(',').filter(|s| !s.trim().is_empty()).collect();
        args.instruments = parse_instruments("instruments", &names)?;
    }
    if matches.is_present("json") {
        args.format = ReportFormat::Json;
    }
    args.command = matches
        .values_of("command")
        .map(|vals| vals.map(String::from).collect())
        .unwrap_or_default();

    Ok(args)
}

fn check_iterations(key: &str, n: i64) -> Result<usize, Error> {
    if n < 1 {
        Err(invalid(key, format!("{} is not a positive number of iterations", n)))
    } else {
        Ok(n as usize)
    }
}

// Unknown names are an error. Repeats are dropped, first mention wins.
fn parse_instruments(key: &str, names: &[&str]) -> Result<Vec<InstrumentKind>, Error> {
    let mut kinds = Vec::new();
    for name in names {
        let kind = name.parse::<InstrumentKind>()
            .map_err(|e| invalid(key, e.to_string()))?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    if kinds.is_empty() {
        return Err(invalid(key, "at least one instrument is required"));
    }
    Ok(kinds)
}

/// Read and parse the config file at `path`.
pub fn parse_config_path(path: &Path, verbosity: u64) -> Result<Args, Error> {
    let mut fp = File::open(path)?;
    let mut buffer = String::new();
    fp.read_to_string(&mut buffer)?;
    parse_config_file(&buffer, verbosity)
}

/// Parse the perfstat configuration file.
///
/// ```toml
/// iterations = 20
/// instruments = ["wall_clock", "pmu"]
/// format = "json"
/// ```
///
/// Every key is optional and falls back to `Args::default()`. The workload
/// command is only ever taken from the command line.
pub fn parse_config_file(buffer: &str, verbosity: u64) -> Result<Args, Error> {
    let mut args = Args::default();
    let value: toml::Value = toml::from_str(buffer)?;

    args.verbose = verbosity;

    if let Some(it) = value.get("iterations") {
        let n = it.as_integer()
            .ok_or_else(|| invalid("iterations", "must be an integer"))?;
        args.iterations = check_iterations("iterations", n)?;
    }

    if let Some(insts) = value.get("instruments") {
        let arr = insts
            .as_array()
            .ok_or_else(|| invalid("instruments", "must be an array of strings"))?;
        let mut names = Vec::new();
        for v in arr {
            let s = v.as_str()
                .ok_or_else(|| invalid("instruments", "must be an array of strings"))?;
            names.push(s);
        }
        args.instruments = parse_instruments("instruments", &names)?;
    }

    if let Some(fmt) = value.get("format") {
        args.format = match fmt.as_str() {
            Some("text") => ReportFormat::Text,
            Some("json") => ReportFormat::Json,
            _ => return Err(invalid("format", "must be \"text\" or \"json\"")),
        };
    }

    Ok(args)
}
