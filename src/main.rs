#[macro_use]
extern crate clap;
#[macro_use]
extern crate log;

use std::env;
use std::io;
use std::process;

use failure::Error;

mod analyzer;
mod args;
mod inference;
mod load_test;
mod preflight;
mod prompts;
mod render;
mod result;

use crate::inference::{Inference, SubprocessInference};
use crate::render::Renderer;

fn log_system_info() {
    info!("{} {}", crate_name!(), crate_version!());
    info!("Operating System: {} ({})", env::consts::OS, env::consts::FAMILY);
    info!("Machine: {}", env::consts::ARCH);
}

/// Verifies the binary, then runs the load test. Nothing is sent to
/// `inference` when the binary is unavailable.
fn run<I>(args: &args::LoadTestArgs, inference: &I) -> Result<result::LoadTestResult, Error>
where
    I: Inference + ?Sized,
{
    let binary = preflight::check_binary(&args.binary)?;
    info!("Using inference binary {}", binary.display());

    Ok(load_test::load_test(&args.config, inference))
}

fn render_result(args: &args::LoadTestArgs, result: result::LoadTestResult) {
    if !args.quiet {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        render::terminal::TerminalRenderer::new(&mut handle).render(result);
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match args::parse_args(env::args()) {
        Ok(args) => args,
        Err(err) => {
            error!("{}", err);
            process::exit(1);
        }
    };

    log_system_info();

    let inference = SubprocessInference::new(args.binary.clone(), args.prompt_flag.clone());

    match run(&args, &inference) {
        Ok(result) => render_result(&args, result),
        Err(err) => {
            error!("Error: {}", err);
            process::exit(1);
        }
    }
}
