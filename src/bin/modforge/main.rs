//! Host entrypoint: discover mods, drive the helper once, load or report.
//!
//! Exit codes: 0 library loaded (or plan printed), 1 compilation or load
//! failure, 2 configuration, launch or protocol failure.

use anyhow::Result;
use modforge::config::HostConfig;
use modforge::host::{
    compile_mods, discover, CollectingSink, FileLoader, HostError, LibraryLoader, MemoryLoader,
    SessionOutcome, SessionPlan, TeeSink, TracingSink,
};
use modforge::telemetry::init_tracing;
use std::process::ExitCode;
use tracing::error;

const EXIT_FAILED: u8 = 1;
const EXIT_BROKEN: u8 = 2;

fn main() -> ExitCode {
    let config = match HostConfig::parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("modforge: {err:#}");
            return ExitCode::from(EXIT_BROKEN);
        }
    };
    init_tracing(&config);

    match run(&config) {
        Ok(code) => code,
        Err(err) => {
            error!(error = %format!("{err:#}"), "modforge failed");
            eprintln!("modforge: {err:#}");
            ExitCode::from(EXIT_BROKEN)
        }
    }
}

fn run(config: &HostConfig) -> Result<ExitCode> {
    let request = config.host_request()?;

    if config.plan {
        let discovered = discover(&request.roots);
        let plan = SessionPlan::build(&request.identity, &discovered);
        print!("{}", plan.to_json_lines()?);
        return Ok(ExitCode::SUCCESS);
    }

    let mut loader: Box<dyn LibraryLoader> = match &config.output {
        Some(path) => Box::new(FileLoader::new(path)),
        None => Box::new(MemoryLoader::default()),
    };
    let mut collected = CollectingSink::default();
    let mut traced = TracingSink;
    let result = {
        let mut sink = TeeSink {
            first: &mut traced,
            second: &mut collected,
        };
        compile_mods(&request, &mut sink, loader.as_mut())
    };

    match result {
        Ok(report) => match report.outcome {
            SessionOutcome::Loaded { bytes } => {
                match &config.output {
                    Some(path) => println!("compiled {bytes} bytes -> {}", path.display()),
                    None => println!("compiled {bytes} bytes"),
                }
                Ok(ExitCode::SUCCESS)
            }
            SessionOutcome::Failed { diagnostics } => {
                for line in &collected.lines {
                    println!("{line}");
                }
                println!("compilation failed with {diagnostics} diagnostic(s)");
                Ok(ExitCode::from(EXIT_FAILED))
            }
        },
        Err(err @ HostError::Load { .. }) => {
            eprintln!("modforge: {:#}", anyhow::Error::from(err));
            Ok(ExitCode::from(EXIT_FAILED))
        }
        Err(err) => Err(err.into()),
    }
}
