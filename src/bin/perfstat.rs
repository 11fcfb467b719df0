#![allow(unknown_lints)]

extern crate chrono;
extern crate fern;
extern crate perfstat;
extern crate serde_json;

#[macro_use]
extern crate log;

use chrono::Utc;
use perfstat::config::{self, Args, ReportFormat};
use perfstat::profiler::Profiler;
use perfstat::report;
use std::process;
use std::process::Command;

fn setup_logging(verbose: u64) -> Result<(), log::SetLoggerError> {
    let level = match verbose {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    // stdout belongs to the report
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}][{}] {}",
                record.module_path().unwrap_or("?"),
                record.line().unwrap_or(0),
                Utc::now().to_rfc3339(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
}

/// Run the workload once, bracketed by the profiler. Returns false if the
/// command could not be spawned at all.
fn sample(profiler: &mut Profiler, args: &Args, iteration: usize) -> bool {
    let mut cmd = Command::new(&args.command[0]);
    cmd.args(&args.command[1..]);

    profiler.start();
    let status = cmd.status();
    profiler.stop();

    match status {
        Ok(status) => {
            if !status.success() {
                warn!(
                    "iteration {}: '{}' exited with {}",
                    iteration, args.command[0], status
                );
            }
            true
        }
        Err(e) => {
            error!("could not run '{}': {}", args.command[0], e);
            false
        }
    }
}

fn main() {
    let args = match config::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("perfstat: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = setup_logging(args.verbose) {
        eprintln!("perfstat: could not set up logging: {}", e);
        process::exit(1);
    }

    info!("perfstat - {}", args.version);
    debug!("configuration: {:?}", args);

    let mut profiler = Profiler::new();
    for kind in &args.instruments {
        profiler.add(kind.build());
    }

    for iteration in 0..args.iterations {
        if !sample(&mut profiler, &args, iteration) {
            process::exit(1);
        }
    }
    info!("completed {} iterations", profiler.iterations());

    match args.format {
        ReportFormat::Text => print!("{}", report::render_text(&profiler)),
        ReportFormat::Json => match serde_json::to_string_pretty(&report::render_json(&profiler)) {
            Ok(doc) => println!("{}", doc),
            Err(e) => {
                error!("could not encode report: {}", e);
                process::exit(1);
            }
        },
    }
}
