//! ttypager - show files or stdin through a pager
//!
//! A thin front end over the library: it opens a pager session and copies
//! its inputs to stdout. Off a terminal it behaves like `cat`.
//!
//! # Quick Start
//!
//! ```text
//! ttypager notes.txt         # page a file
//! dmesg | ttypager           # stdin is read when no files are given
//! ttypager --no-pager a b    # concatenate without paging
//! ```

use std::env;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ttypager::{config, Config, Session};

/// Command line options
#[derive(Debug, Default, PartialEq, Eq)]
struct Options {
    /// Inputs in order; `-` is stdin
    inputs: Vec<String>,
    /// Skip the pager entirely
    no_pager: bool,
}

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Variable holding the log filter
const LOG_VAR: &str = "TTYPAGER_LOG";

fn print_version() {
    eprintln!("ttypager {}", VERSION);
}

fn print_help() {
    eprintln!("ttypager {} - show files or stdin through a pager", VERSION);
    eprintln!();
    eprintln!("Usage: ttypager [OPTIONS] [FILE...]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --no-pager            Write straight to stdout");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("With no FILE, or when FILE is -, read standard input.");
    eprintln!();
    eprintln!("Pager: $PAGER, then pager, less, more");
    eprintln!("Configuration: ~/.ttypager/config.toml");
    eprintln!("Log: ~/.ttypager/ttypager.log (level from ${})", LOG_VAR);
}

fn parse_args<I>(args: I) -> Result<Options, String>
where
    I: IntoIterator<Item = String>,
{
    let mut options = Options::default();
    let mut only_files = false;

    for arg in args {
        if only_files {
            options.inputs.push(arg);
            continue;
        }
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "--no-pager" => {
                options.no_pager = true;
            }
            "--" => {
                only_files = true;
            }
            "-" => options.inputs.push(arg),
            flag if flag.starts_with('-') => {
                return Err(format!("Unknown argument: {}. Use -h for help.", flag));
            }
            _ => options.inputs.push(arg),
        }
    }

    if options.inputs.is_empty() {
        options.inputs.push("-".to_string());
    }
    Ok(options)
}

/// Log to a file: stderr is the pager's input while a session is open
fn init_logging() {
    let log_path = config::data_dir()
        .map(|dir| dir.join("ttypager.log"))
        .unwrap_or_else(|| PathBuf::from("ttypager.log"));

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_env(LOG_VAR).unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

/// Copy one input to `out`
fn copy_input(name: &str, out: &mut impl Write) -> io::Result<u64> {
    if name == "-" {
        io::copy(&mut io::stdin().lock(), out)
    } else {
        io::copy(&mut File::open(name)?, out)
    }
}

/// Copy every input, stopping quietly if the pager goes away
fn run(options: &Options) -> bool {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut ok = true;

    for input in &options.inputs {
        match copy_input(input, &mut out) {
            Ok(bytes) => info!("Copied {} bytes from {}", bytes, input),
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                info!("Pager closed its input, stopping");
                return ok;
            }
            Err(e) => {
                error!("Failed to read {}: {}", input, e);
                let _ = writeln!(io::stderr(), "ttypager: {}: {}", input, e);
                ok = false;
            }
        }
    }

    if let Err(e) = out.flush() {
        if e.kind() != io::ErrorKind::BrokenPipe {
            error!("Failed to flush output: {}", e);
            ok = false;
        }
    }
    ok
}

fn main() -> ExitCode {
    let options = match parse_args(env::args().skip(1)) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging();
    info!("ttypager starting...");

    let session = if options.no_pager {
        Session::inactive()
    } else {
        Session::begin(&Config::load()).unwrap_or_else(|e| {
            warn!("Paging unavailable: {}", e);
            Session::inactive()
        })
    };
    if let Some(name) = session.pager_name() {
        info!("Paging through {}", name);
    }

    let ok = run(&options);

    if let Err(e) = session.end() {
        error!("Pager session ended badly: {}", e);
        eprintln!("ttypager: {}", e);
        return ExitCode::FAILURE;
    }

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_reads_stdin() {
        let options = parse_args(args(&[])).unwrap();
        assert_eq!(options.inputs, vec!["-"]);
        assert!(!options.no_pager);
    }

    #[test]
    fn test_files_and_flags() {
        let options = parse_args(args(&["a.txt", "--no-pager", "-", "b.txt"])).unwrap();
        assert_eq!(options.inputs, vec!["a.txt", "-", "b.txt"]);
        assert!(options.no_pager);
    }

    #[test]
    fn test_double_dash() {
        let options = parse_args(args(&["--", "--no-pager", "-x"])).unwrap();
        assert_eq!(options.inputs, vec!["--no-pager", "-x"]);
        assert!(!options.no_pager);
    }

    #[test]
    fn test_unknown_flag() {
        assert!(parse_args(args(&["--bogus"])).is_err());
    }

    #[test]
    fn test_copy_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.txt");
        std::fs::write(&path, "0 hello\n1 hello\n").unwrap();

        let mut out = Vec::new();
        assert_eq!(copy_input(path.to_str().unwrap(), &mut out).unwrap(), 16);
        assert_eq!(out, b"0 hello\n1 hello\n");
    }

    #[test]
    fn test_copy_missing_file() {
        let mut out = Vec::new();
        let err = copy_input("/nonexistent/ttypager-input", &mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
