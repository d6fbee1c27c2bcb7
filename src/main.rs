use clap::{Arg, ArgAction, Command};
use colored::Colorize;
use env_logger::Env;
use log::debug;
use std::path::Path;
use std::process;
use thiserror::Error;

use soltrace::config::{ConfigError, InterpreterConfig};
use soltrace::interpreter::{
    ErrorPolicy, FullInterpreter, InterpreterError, Program, TransactionRunner,
};

#[derive(Debug, Error)]
enum AppError {
    #[error("Interpreter error: {0}")]
    Interpreter(#[from] InterpreterError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Other(String),
}

impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::Other(s)
    }
}

fn main() {
    let matches = Command::new("soltrace")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Reference interpreter producing event traces for smart-contract transactions")
        .arg(
            Arg::new("program")
                .short('p')
                .long("program")
                .value_name("FILE")
                .help("Program file holding the contract AST and its transactions")
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Where to write the trace (default: interpretation.json)"),
        )
        .arg(
            Arg::new("seed")
                .short('s')
                .long("seed")
                .value_name("N")
                .help("Seed for the evaluator's random choices")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("error-policy")
                .long("error-policy")
                .value_name("POLICY")
                .help("Arithmetic error handling: fail or substitute")
                .value_parser(["fail", "substitute"]),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log interpretation details")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let verbose = matches.get_flag("verbose");
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    let program_path = match matches.get_one::<String>("program") {
        Some(path) => path.clone(),
        None => {
            eprintln!("{} no program file given", "Error:".red().bold());
            process::exit(1);
        }
    };

    let config = match build_config(
        matches.get_one::<String>("output"),
        matches.get_one::<u64>("seed").copied(),
        matches.get_one::<String>("error-policy"),
    ) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{} {}", "Error:".red().bold(), err);
            process::exit(1);
        }
    };

    if let Err(err) = run_program(&program_path, config) {
        eprintln!("{} {}", "Error:".red().bold(), err);
        process::exit(1);
    }
}

/// Environment configuration overridden by command line flags
fn build_config(
    output: Option<&String>,
    seed: Option<u64>,
    error_policy: Option<&String>,
) -> Result<InterpreterConfig, AppError> {
    let mut config = InterpreterConfig::from_env()?;
    if let Some(output) = output {
        config = config.with_trace_output(output);
    }
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    if let Some(policy) = error_policy {
        config = config.with_error_policy(policy.parse::<ErrorPolicy>()?);
    }
    Ok(config)
}

fn run_program(program_path: &str, config: InterpreterConfig) -> Result<(), AppError> {
    let path = Path::new(program_path);
    if !path.exists() {
        return Err(format!("Program file not found: {}", program_path).into());
    }

    let program = Program::load(path)?;
    debug!(
        "Loaded {} contracts and {} transactions from {}",
        program.ast.contracts.len(),
        program.transactions.len(),
        program_path
    );

    let mut interpreter = FullInterpreter::new(&program.ast, &program.transactions, config);
    TransactionRunner::run(&mut interpreter)?;
    interpreter.finish()?;

    println!(
        "{} {} transactions, {} events -> {}",
        "Trace written:".green().bold(),
        program.transactions.len(),
        interpreter.trace().len(),
        interpreter.config().trace_output.display()
    );
    Ok(())
}
