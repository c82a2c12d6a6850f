use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs::read_to_string, process::ExitCode};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[clap(name = "dscript", version)]
pub struct CLArgs {
    #[clap(subcommand)]
    pub routine: DscriptCommand,
    /// Increase logging verbosity (-v debug, -vv trace).
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum DscriptCommand {
    Tokenize {
        path: PathBuf,
        #[clap(long = "format", value_enum, default_value = "basic")]
        format: TokenFormat,
    },
    Parse {
        path: PathBuf,
    },
    Run {
        path: PathBuf,
        /// Abort the script after this many milliseconds.
        #[clap(long = "time-limit")]
        time_limit: Option<u64>,
    },
}

#[derive(Debug, Clone, ValueEnum)]
pub enum TokenFormat {
    Debug,
    Basic,
}

fn main() -> ExitCode {
    dscript_main().expect("Encountered an error!")
}

fn dscript_main() -> Result<ExitCode> {
    color_eyre::install().expect("Can't fail at first call!");
    let args = CLArgs::parse();

    let filter = match args.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let succeeded = match args.routine {
        DscriptCommand::Tokenize { path, format } => {
            tracing::info!("Tokenizing {path:?}...");
            let src = read_to_string(&path)?;
            tokenize(&src, &format)?
        }
        DscriptCommand::Parse { path } => {
            tracing::info!("Parsing {path:?}...");
            let src = read_to_string(&path)?;
            parse(&src, &path)?
        }
        DscriptCommand::Run { path, time_limit } => {
            tracing::info!("Running {path:?}...");
            let src = read_to_string(&path)?;
            run(&src, &path, time_limit.map(Duration::from_millis))?
        }
    };
    match succeeded {
        true => Ok(ExitCode::SUCCESS),
        false => Ok(ExitCode::from(65)),
    }
}

fn tokenize(src: &str, format: &TokenFormat) -> Result<bool> {
    use dscript::lexer::formatter::{BasicFormatter, DebugFormatter, ToFormatter, TokenFormatter};
    use dscript::lexer::{Lexer, TokenKind};

    let mut scanner = Lexer::new(src);
    let formatter: Box<dyn TokenFormatter> = match format {
        TokenFormat::Debug => Box::new(ToFormatter::<DebugFormatter>::create_formatter(&scanner)),
        TokenFormat::Basic => Box::new(ToFormatter::<BasicFormatter>::create_formatter(&scanner)),
    };
    let mut succeeded = true;
    loop {
        match scanner.next_token() {
            Ok(token) => {
                println!("{}", formatter.format(&token));
                if matches!(token.kind, TokenKind::Eof) {
                    return Ok(succeeded);
                }
            }
            Err(error) => {
                eprintln!("{}", formatter.format_lexical_error(&error));
                succeeded = false;
            }
        };
    }
}

fn parse(src: &str, path: &Path) -> Result<bool> {
    use dscript::parser::formatter::{ParserFormatter, PrettyParserFormatter};
    use dscript::parser::Parser;

    let mut parser = Parser::new(src);
    match parser.parse() {
        Ok(script) => {
            println!("{script:#?}");
            Ok(true)
        }
        Err(error) => {
            let formatter = PrettyParserFormatter::new(src, path);
            eprintln!("{}", formatter.format_error(&error));
            Ok(false)
        }
    }
}

fn run(src: &str, path: &Path, time_limit: Option<Duration>) -> Result<bool> {
    use dscript::interpreter::{Process, ProcessConfig, StdioContext};
    use dscript::parser::formatter::{ParserFormatter, PrettyParserFormatter};
    use dscript::parser::Parser;
    use dscript::value::formatter::{PrettyFormatter, ValueFormatter};

    let mut parser = Parser::new(src);
    let script = match parser.parse() {
        Ok(script) => script,
        Err(error) => {
            let formatter = PrettyParserFormatter::new(src, path);
            eprintln!("{}", formatter.format_error(&error));
            return Ok(false);
        }
    };

    let config = ProcessConfig {
        max_execution_time: time_limit,
    };
    let mut process = Process::new(StdioContext, config);
    let outcome = process.run(script).and_then(|()| process.execute());
    match outcome {
        Ok(()) => Ok(true),
        Err(error) => {
            let formatter = PrettyFormatter::new(src, path);
            eprintln!("{}", formatter.format_error(&error));
            Ok(false)
        }
    }
}
