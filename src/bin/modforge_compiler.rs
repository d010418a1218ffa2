//! Helper entrypoint: serve one compiler session over stdin/stdout.
//!
//! Stdout carries only the result frame. Exit codes: 0 after `Finish`,
//! 2 on a protocol violation or a second `Compile`, 1 on anything else.

use modforge::compiler::LiteCompiler;
use modforge::config::HelperConfig;
use modforge::driver::{run_driver_loop, DispatchError};
use modforge::protocol::ProtocolError;
use modforge::session::CompilerSession;
use modforge::telemetry::init_tracing;
use std::io;
use std::process::ExitCode;
use tracing::{error, info};

const EXIT_FATAL: u8 = 1;
const EXIT_PROTOCOL: u8 = 2;

fn main() -> ExitCode {
    let config = match HelperConfig::parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("modforge-compiler: {err:#}");
            return ExitCode::from(EXIT_FATAL);
        }
    };
    init_tracing(&config);

    let env = match config.helper_environment() {
        Ok(env) => env,
        Err(err) => {
            error!(error = %format!("{err:#}"), "helper environment unavailable");
            eprintln!("modforge-compiler: {err:#}");
            return ExitCode::from(EXIT_FATAL);
        }
    };
    info!(
        pid = std::process::id(),
        shim = %env.shim_path.display(),
        lang_version = config.lang_version.as_str(),
        "helper listening"
    );

    let mut session = CompilerSession::new(config.lang_version);
    let backend = LiteCompiler::new();
    let stdin = io::stdin().lock();
    let stdout = io::stdout().lock();

    match run_driver_loop(stdin, stdout, &mut session, &backend, &env) {
        Ok(stats) => {
            info!(
                actions = stats.actions,
                symbols = stats.symbols,
                sources = stats.sources,
                references = stats.references,
                compiles = stats.compiles,
                "helper finished"
            );
            ExitCode::SUCCESS
        }
        Err(DispatchError::Protocol(ProtocolError::Io(err))) => {
            error!(error = %err, "helper pipe failed");
            eprintln!("modforge-compiler: i/o failure: {err}");
            ExitCode::from(EXIT_FATAL)
        }
        Err(err) => {
            error!(error = %err, "helper stopped on protocol violation");
            eprintln!("modforge-compiler: {err}");
            ExitCode::from(EXIT_PROTOCOL)
        }
    }
}
