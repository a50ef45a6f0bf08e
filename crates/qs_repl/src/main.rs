mod repl;

use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use qs_interpreter::{
    host::ShellHost, Config, Interpreter, DEFAULT_HOST_BINDING, DEFAULT_MAX_DEPTH,
    DEFAULT_MAX_NESTING, STACK_SIZE,
};

/// Interpreter for the qs scripting language.
#[derive(Parser)]
#[command(name = "qs", version, about = "Interpreter for the qs scripting language")]
struct Cli {
    /// Script to interpret. Starts the REPL when omitted.
    file: Option<PathBuf>,

    /// Bind the shell escape hatch, which runs its argument with `sh -c`.
    #[arg(long)]
    allow_host: bool,

    /// Name of the shell escape binding.
    #[arg(long, default_value = DEFAULT_HOST_BINDING)]
    host_binding: String,

    /// Nested function calls allowed before a run is aborted.
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Expression nesting allowed before a run is aborted.
    #[arg(long, default_value_t = DEFAULT_MAX_NESTING)]
    max_nesting: usize,

    /// Enable debug logging (RUST_LOG takes precedence).
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> Config {
        let config = if self.allow_host {
            Config::with_host(Rc::new(ShellHost))
        } else {
            Config::default()
        };
        config
            .host_binding(self.host_binding.clone())
            .max_depth(self.max_depth)
            .max_nesting(self.max_nesting)
    }
}

fn init_logging(verbose: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Evaluation recurses on the native stack, deeper than the main thread allows
    let worker = std::thread::Builder::new()
        .name("qs".to_owned())
        .stack_size(STACK_SIZE)
        .spawn(move || run(&cli));

    match worker.map(|handle| handle.join()) {
        Ok(Ok(code)) => code,
        Ok(Err(_)) => {
            error!("interpreter thread panicked");
            ExitCode::FAILURE
        }
        Err(err) => {
            error!(error = %err, "failed to start interpreter thread");
            eprintln!("Error: could not start the interpreter: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> ExitCode {
    let config = cli.config();
    debug!(
        host = config.host.is_some(),
        binding = %config.host_binding,
        max_depth = config.max_depth,
        max_nesting = config.max_nesting,
        "interpreter configured"
    );

    let path = match &cli.file {
        Some(path) => path,
        None => {
            repl::repl(&config);
            return ExitCode::SUCCESS;
        }
    };

    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            error!(path = %path.display(), error = %err, "failed to read script");
            eprintln!("Error: could not read {}: {}", path.display(), err);
            return ExitCode::FAILURE;
        }
    };

    let mut interpreter = Interpreter::with_config(&source, &config);
    match interpreter.interpret() {
        Ok(env) => {
            repl::print_environment(env);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            if let Some(text) = err.span.and_then(|span| span.source_text(&source)) {
                eprintln!("  near `{}`", text);
            }
            ExitCode::FAILURE
        }
    }
}
