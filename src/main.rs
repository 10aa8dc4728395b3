//! nbinterp CLI - run statements through configured interpreters

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;

use nbinterp::error::{FixSuggestion, InterpreterError};
use nbinterp::interpreter::{
    create_interpreter, Code, InterpreterContext, InterpreterGroup, InterpreterResult, MessageType,
};
use nbinterp::{AsyncInterpreter, NbConfig};

#[derive(Parser)]
#[command(name = "nbinterp")]
#[command(about = "Run notebook statements through lazily opened interpreters")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.config/nbinterp/interpreters.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a statement
    Run {
        /// Interpreter name (defaults to the configured default)
        #[arg(short, long)]
        interpreter: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Statement to run; multiple words are joined with spaces
        #[arg(required = true, trailing_var_arg = true)]
        statement: Vec<String>,
    },

    /// List completion candidates for a buffer
    Complete {
        /// Interpreter name (defaults to the configured default)
        #[arg(short, long)]
        interpreter: Option<String>,

        /// Byte offset of the cursor (defaults to end of buffer)
        #[arg(long)]
        cursor: Option<usize>,

        /// Print candidates as JSON
        #[arg(long)]
        json: bool,

        buffer: String,
    },

    /// List configured interpreters
    List,
}

#[tokio::main]
async fn main() {
    // Load .env file (ignore if not present)
    let _ = dotenvy::dotenv();

    // Initialize tracing (stderr, so results on stdout stay clean)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match load_config(cli.config.as_ref()) {
        Ok(config) => match cli.command {
            Commands::Run {
                interpreter,
                json,
                statement,
            } => run_statement(&config, interpreter.as_deref(), json, statement.join(" ")).await,
            Commands::Complete {
                interpreter,
                cursor,
                json,
                buffer,
            } => complete(&config, interpreter.as_deref(), cursor, json, buffer).await,
            Commands::List => {
                list_interpreters(&config);
                Ok(true)
            }
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            if let Some(suggestion) = e.fix_suggestion() {
                eprintln!("  {} {}", "Fix:".yellow(), suggestion);
            }
            std::process::exit(1);
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<NbConfig, InterpreterError> {
    let config = match path {
        Some(path) => NbConfig::load_from(path)?,
        None => NbConfig::load()?,
    };
    Ok(config.with_env())
}

fn open_interpreter(
    config: &NbConfig,
    name: Option<&str>,
) -> Result<(AsyncInterpreter, InterpreterContext), InterpreterError> {
    let setting = config.setting(name)?;
    let group = Arc::new(InterpreterGroup::new(format!("{}-cli", setting.name)));
    let interpreter = AsyncInterpreter::new(create_interpreter(setting, Some(group))?);

    let mut ctx = InterpreterContext::new("cli", "paragraph_1").with_repl_name(&setting.name);
    ctx.user_name = setting.user.clone();
    Ok((interpreter, ctx))
}

/// Returns Ok(false) when the statement ran but reported an error
async fn run_statement(
    config: &NbConfig,
    name: Option<&str>,
    json: bool,
    statement: String,
) -> Result<bool, InterpreterError> {
    let (interpreter, ctx) = open_interpreter(config, name)?;
    let ctx = ctx.with_paragraph_text(statement.clone());

    let run = interpreter.interpret(statement, ctx.clone());
    tokio::pin!(run);

    let result = tokio::select! {
        result = &mut run => result?,
        Ok(()) = tokio::signal::ctrl_c() => {
            eprintln!("{} cancelling paragraph", "→".cyan());
            interpreter.cancel(ctx).await?;
            run.await?
        }
    };

    interpreter.close().await?;
    print_result(&result, json)?;
    Ok(result.code != Code::Error)
}

fn print_result(result: &InterpreterResult, json: bool) -> Result<(), InterpreterError> {
    if json {
        let encoded =
            serde_json::to_string_pretty(result).map_err(|e| InterpreterError::Execution {
                reason: format!("failed to encode result: {}", e),
            })?;
        println!("{}", encoded);
        return Ok(());
    }

    for message in &result.messages {
        match message.kind {
            MessageType::Text => print!("{}", message.data),
            other => println!("[{:?}] {}", other, message.data),
        }
        if !message.data.ends_with('\n') && !message.data.is_empty() {
            println!();
        }
    }
    if result.code == Code::Error {
        eprintln!("{}", "Paragraph failed".red());
    }
    Ok(())
}

async fn complete(
    config: &NbConfig,
    name: Option<&str>,
    cursor: Option<usize>,
    json: bool,
    buffer: String,
) -> Result<bool, InterpreterError> {
    let (interpreter, ctx) = open_interpreter(config, name)?;
    let cursor = cursor.unwrap_or(buffer.len());

    let items = interpreter.completion(buffer, cursor, ctx).await?;
    interpreter.close().await?;

    if json {
        let encoded =
            serde_json::to_string_pretty(&items).map_err(|e| InterpreterError::Execution {
                reason: format!("failed to encode completions: {}", e),
            })?;
        println!("{}", encoded);
    } else {
        for item in &items {
            println!("{}\t{}", item.value, item.meta.dimmed());
        }
    }
    Ok(true)
}

fn list_interpreters(config: &NbConfig) {
    let default = config.setting(None).ok().map(|s| s.name.as_str());

    for setting in &config.interpreters {
        let marker = if Some(setting.name.as_str()) == default {
            "*".green().bold()
        } else {
            " ".normal()
        };
        println!(
            "{} {} ({}{})",
            marker,
            setting.name.cyan().bold(),
            setting.class,
            if setting.lazy { ", lazy" } else { "" }
        );
    }
}
