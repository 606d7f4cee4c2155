use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use clap::{Arg, App};
use failure::{Error, err_msg};
use crate::load_test::LoadTestConfig;
use crate::prompts::{PromptSelection, Prompts};

pub const DEFAULT_BINARY: &str = "./mistral-7b-instruct-v0.2.Q5_K_M.llamafile";

#[derive(PartialEq, Debug)]
pub struct LoadTestArgs {
    pub config: LoadTestConfig,
    pub binary: PathBuf,
    pub prompt_flag: Option<String>,
    pub quiet: bool,
}

fn parse_number<T>(value: Option<&str>, option: &str) -> Result<Option<T>, Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(value) => {
            match value.parse() {
                Ok(value) => Ok(Some(value)),
                Err(err) => Err(err_msg(format!("{} must be numeric ({})", option, err))),
            }
        }
        None => Ok(None),
    }
}

pub fn parse_args<T>(args: T) -> Result<LoadTestArgs, Error>
where
    T: IntoIterator<Item = String>,
{
    let app = App::new("Inference Load Tester")
        .author(crate_authors!())
        .version(crate_version!())
        .after_help(crate_description!())
        .arg(
            Arg::with_name("requests")
                .value_name("NUM")
                .short("n")
                .long("requests")
                .help("Number of requests to make")
                .takes_value(true)
                .default_value("10"),
        )
        .arg(
            Arg::with_name("workers")
                .value_name("NUM")
                .short("w")
                .long("workers")
                .help("Maximum number of concurrent workers")
                .takes_value(true)
                .default_value("4"),
        )
        .arg(
            Arg::with_name("timeout")
                .value_name("SECONDS")
                .short("t")
                .long("timeout")
                .help("Timeout in seconds for each request")
                .takes_value(true)
                .default_value("300"),
        )
        .arg(
            Arg::with_name("binary")
                .value_name("PATH")
                .short("b")
                .long("binary")
                .help("Inference executable to load-test")
                .takes_value(true)
                .default_value(DEFAULT_BINARY),
        )
        .arg(
            Arg::with_name("prompt-flag")
                .value_name("FLAG")
                .long("prompt-flag")
                .help("Flag that precedes the prompt argument")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-p"),
        )
        .arg(
            Arg::with_name("no-prompt-flag")
                .long("no-prompt-flag")
                .help("Pass the prompt as a bare positional argument"),
        )
        .arg(
            Arg::with_name("prompts")
                .value_name("FILE")
                .long("prompts")
                .help("File with candidate prompts, one per line")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("round-robin")
                .long("round-robin")
                .help("Use the prompts in order instead of picking them at random"),
        )
        .arg(Arg::with_name("quiet").short("q").long("quiet").help(
            "Don't output results to stdout",
        ))
        .get_matches_from(args);

    let num_requests: usize = parse_number(app.value_of("requests"), "--requests")?
        .unwrap_or(10);

    let max_workers: usize = parse_number(app.value_of("workers"), "--workers")?
        .unwrap_or(4);
    if max_workers == 0 {
        return Err(err_msg("--workers must be at least 1"));
    }

    let timeout: u64 = parse_number(app.value_of("timeout"), "--timeout")?.unwrap_or(300);

    let prompts = match app.value_of("prompts") {
        Some(path) => Prompts::from_file(path)?,
        None => Prompts::default(),
    };

    let selection = if app.is_present("round-robin") {
        PromptSelection::RoundRobin
    } else {
        PromptSelection::Random
    };

    let prompt_flag = if app.is_present("no-prompt-flag") {
        None
    } else {
        app.value_of("prompt-flag").map(String::from)
    };

    Ok(LoadTestArgs {
        config: LoadTestConfig {
            num_requests,
            max_workers,
            timeout: Duration::from_secs(timeout),
            prompts,
            selection,
        },
        binary: PathBuf::from(app.value_of("binary").unwrap_or(DEFAULT_BINARY)),
        prompt_flag,
        quiet: app.is_present("quiet"),
    })
}
