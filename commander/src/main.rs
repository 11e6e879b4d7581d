//! Commander CLI - run a command bot in the terminal.

#![allow(clippy::print_stdout)] // CLI program intentionally uses stdout

use clap::{Args, Parser, Subcommand};
use commander::prelude::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Commander - a command tree bot running on the console
#[derive(Parser)]
#[command(name = "commander")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "COMMANDER_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the console bot
    Run(RunArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for the run command
#[derive(Args)]
struct RunArgs {
    /// Command prefix (overrides config)
    #[arg(short, long)]
    prefix: Option<String>,
}

/// Arguments for the config command
#[derive(Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Show configuration file path
    Path,
    /// Validate configuration
    Validate,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");

    match rt.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the given verbosity level.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "commander={level},{}",
            if verbosity >= 2 { "debug" } else { "warn" }
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let path = cli.config.unwrap_or_else(config_path);
    match cli.command {
        Commands::Run(args) => cmd_run(args, &path).await,
        Commands::Config(args) => cmd_config(args, &path).await,
    }
}

/// The configuration at `path`, or the defaults when there is none.
async fn read_config(path: &Path) -> Result<CommanderConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(CommanderConfig::default());
    }
    load_config(path)
        .await
        .with_context(|| format!("failed to load {}", path.display()))
}

/// Start the console bot.
async fn cmd_run(args: RunArgs, path: &Path) -> Result<()> {
    let mut config = read_config(path).await?;
    if let Some(prefix) = args.prefix {
        config.prefix = Some(prefix);
    }

    for issue in config.validate() {
        match issue.level {
            IssueLevel::Warning => tracing::warn!("{}", issue.message),
            IssueLevel::Error => return Err(CommanderError::config(issue.message)),
        }
    }

    let mut commander = Commander::new();
    register_commands(&mut commander)?;
    config.install_checks(&mut commander)?;

    let platform = Arc::new(ConsolePlatform::new(config.console.clone()));
    commander.connect(platform).await?;

    println!(
        "Commander running as {}. Type `help` for commands, `exit` to quit.\n",
        config.console.bot_name
    );

    tokio::select! {
        result = commander.closed() => result,
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
            Ok(())
        }
    }
}

/// Register the demo commands.
fn register_commands(commander: &mut Commander) -> Result<()> {
    commander
        .command("ping")?
        .set_description("Check that the bot is alive")
        .set_handler(handler_fn(|_ctx, res: Responder| async move {
            let _ = res.text("pong").await;
            res.finish();
        }));

    commander
        .command("echo")?
        .set_description("Repeat a message")
        .bind(
            "<text...>",
            handler_fn(|ctx: CommandContext, res: Responder| async move {
                let text = ctx.params.as_ref().and_then(|p| p.str("text")).unwrap_or_default();
                let _ = res.text(text).await;
                res.finish();
            }),
            ParameterMap::new(),
        )?;

    commander
        .command("add")?
        .set_description("Add two integers\nBoth operands must fit a signed 64-bit integer.")
        .bind(
            "<a:int> <b:int>",
            handler_fn(|ctx: CommandContext, res: Responder| async move {
                let params = ctx.params.unwrap_or_default();
                let (a, b) = (params.int("a").unwrap_or(0), params.int("b").unwrap_or(0));
                let _ = match a.checked_add(b) {
                    Some(sum) => res.text(format!("{a} + {b} = {sum}")).await,
                    None => res.send(Response::error_message("that sum overflows")).await,
                };
                res.finish();
            }),
            ParameterMap::new(),
        )?;

    let channel = commander.command("channel")?;
    channel.set_description("Channel utilities");
    channel
        .command("info")?
        .set_description("Show details about a channel, this one by default")
        .bind(
            "[target:channel]",
            handler_fn(|ctx: CommandContext, res: Responder| async move {
                let target = ctx
                    .params
                    .as_ref()
                    .and_then(|p| p.channel("target"))
                    .unwrap_or(&ctx.channel);
                let embed = Embed::new()
                    .title(&target.name)
                    .field("id", &target.id, true)
                    .field("private", target.is_private.to_string(), true)
                    .field("guild", target.guild_id.as_deref().unwrap_or("-"), true)
                    .footer(format!("requested by {}", ctx.author.username));
                let _ = res.send(Response::embed(embed)).await;
                res.finish();
            }),
            ParameterMap::new(),
        )?;

    Ok(())
}

/// Manage configuration.
async fn cmd_config(args: ConfigArgs, path: &Path) -> Result<()> {
    match args.command {
        ConfigCommands::Path => {
            println!("{}", path.display());
        }
        ConfigCommands::Show => {
            let config = read_config(path).await?;
            let rendered = serde_json::to_string_pretty(&config).map_err(ConfigError::from)?;
            println!("{rendered}");
        }
        ConfigCommands::Validate => {
            let config = read_config(path).await?;
            let issues = config.validate();
            if issues.is_empty() {
                println!("Configuration is valid");
            }
            for issue in &issues {
                println!("{issue}");
            }
            if config.has_errors() {
                return Err(CommanderError::config("configuration has errors"));
            }
        }
    }
    Ok(())
}
