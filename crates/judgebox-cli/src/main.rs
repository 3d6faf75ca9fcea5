//! judgebox CLI: judge student-authored browser-automation test scripts.
//!
//! Human-readable output goes to stderr, JSON output (`--json`, `serve`) to stdout.

// CLI-specific lint allowances (CLI binary, not library)
#![allow(missing_docs)]
#![allow(clippy::print_stdout)] // CLI must print to stdout
#![allow(clippy::print_stderr)] // CLI must print to stderr
#![allow(clippy::exit)] // CLI uses exit codes

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use judgebox::config::{load_config_file, validate_config};
use judgebox::judge::Judge;
use judgebox::model::config::{DeploymentTier, JudgeConfig, StoreConfig, WorkspaceMode};
use judgebox::recorder::{open_store, DisabledStore};
use judgebox::runner::CancellationToken;
use judgebox::validator::StaticValidator;
use judgebox::{
    AuthenticatedUser, ExecutionRequest, JudgeError, JudgeResult, TaskId, UserId, Verdict,
    VerdictStatus, MAX_SOURCE_BYTES,
};
use miette::{IntoDiagnostic, Result};
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// How often `serve` checks for an interrupt while waiting for input.
const SERVE_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Conventional exit status for a process stopped by SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Color output mode
#[derive(Copy, Clone, Debug, Default, ValueEnum)]
enum ColorMode {
    /// Auto-detect based on terminal and `NO_COLOR` env
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum TierArg {
    Standard,
    Constrained,
}

impl From<TierArg> for DeploymentTier {
    fn from(value: TierArg) -> Self {
        match value {
            TierArg::Standard => Self::Standard,
            TierArg::Constrained => Self::Constrained,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "judgebox",
    version,
    about = "Judge student-authored browser-automation test scripts"
)]
struct Cli {
    /// Control color output
    #[arg(long, value_enum, default_value = "auto", global = true)]
    color: ColorMode,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` applies otherwise.
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Configuration file plus per-invocation overrides.
#[derive(Debug, Default, Args)]
struct ConfigArgs {
    #[arg(long, help = "Judge configuration file (.json, .yaml or .yml)")]
    config: Option<PathBuf>,
    #[arg(long, help = "Remote browser endpoint; selects the external runner")]
    endpoint: Option<String>,
    #[arg(long, value_enum, help = "Deployment tier")]
    tier: Option<TierArg>,
    #[arg(long, help = "Reuse one fixed workspace directory for inspection")]
    persistent: bool,
    #[arg(long, help = "Parent directory for workspaces (absolute path)")]
    workspace_root: Option<PathBuf>,
    #[arg(long, help = "Append verdict records to this JSONL file")]
    store: Option<PathBuf>,
    #[arg(long, help = "Runner timeout in milliseconds")]
    timeout_ms: Option<u64>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Judge one script and print its verdict
    Judge {
        #[arg(help = "Script to judge, or - for stdin")]
        file: PathBuf,
        #[arg(long, help = "Submitting user id")]
        user: i64,
        #[arg(long, help = "Task id")]
        task: i64,
        #[command(flatten)]
        config: ConfigArgs,
        #[arg(long)]
        json: bool,
    },
    /// Judge newline-delimited JSON requests from stdin
    Serve {
        #[arg(long, help = "Read requests from stdin, write responses to stdout")]
        stdio: bool,
        #[arg(long, help = "Authenticated user id for every request")]
        user: i64,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Run only the static validator
    Check {
        #[arg(help = "Script to check, or - for stdin")]
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Delete expired ephemeral workspaces
    Sweep {
        #[command(flatten)]
        config: ConfigArgs,
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions for bash, zsh, or fish
    Completions {
        #[arg(value_enum, help = "Shell to generate completions for")]
        shell: Shell,
    },
}

/// Configure color output based on CLI flag and environment
fn configure_colors(mode: ColorMode) -> bool {
    let use_color = match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => {
            if std::env::var("NO_COLOR").is_ok() {
                false
            } else {
                supports_color::on(supports_color::Stream::Stderr).is_some()
            }
        }
    };

    miette::set_hook(Box::new(move |_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .color(use_color)
                .unicode(use_color)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set
    use_color
}

fn init_tracing(verbose: u8, use_color: bool) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(use_color)
        .with_target(false)
        .try_init()
        .ok();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let use_color = configure_colors(cli.color);
    init_tracing(cli.verbose, use_color);
    match cli.command {
        Commands::Judge {
            file,
            user,
            task,
            config,
            json,
        } => cmd_judge(&file, user, task, &config, json),
        Commands::Serve {
            stdio,
            user,
            config,
        } => cmd_serve(stdio, user, &config),
        Commands::Check { file, json } => cmd_check(&file, json),
        Commands::Sweep { config, json } => cmd_sweep(&config, json),
        Commands::Completions { shell } => cmd_completions(shell),
    }
}

// =============================================================================
// Command Handlers
// =============================================================================

fn cmd_judge(file: &Path, user: i64, task: i64, args: &ConfigArgs, json: bool) -> Result<()> {
    let result = load_config(args).and_then(|config| {
        let source = read_source(file)?;
        let judge = build_judge(config)?;
        Ok(judge.judge(&ExecutionRequest::new(source, TaskId(task), UserId(user))))
    });
    emit_verdict(json, result)
}

fn cmd_serve(stdio: bool, user: i64, args: &ConfigArgs) -> Result<()> {
    if !stdio {
        return emit_error(
            false,
            &JudgeError::protocol("serve currently requires --stdio", None),
        );
    }
    let judge = match load_config(args).and_then(build_judge) {
        Ok(judge) => judge,
        Err(err) => return emit_error(false, &err),
    };
    let user = AuthenticatedUser::new(user);

    // Lines are read on their own thread so an interrupt ends the loop without waiting for input.
    let (sender, lines) = mpsc::channel();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            if sender.send(line).is_err() {
                break;
            }
        }
    });

    let mut stdout = io::stdout();
    while !judge.is_shutting_down() {
        let line = match lines.recv_timeout(SERVE_POLL_INTERVAL) {
            Ok(line) => line.into_diagnostic()?,
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        };
        if line.trim().is_empty() {
            continue;
        }
        let (status, body) = judge.respond(&user, &line);
        tracing::debug!(status, "request answered");
        let payload = serde_json::to_string(&body).into_diagnostic()?;
        writeln!(stdout, "{payload}").into_diagnostic()?;
        stdout.flush().into_diagnostic()?;
    }
    if judge.is_shutting_down() {
        tracing::info!("interrupted, serve loop stopped");
        std::process::exit(INTERRUPTED_EXIT_CODE);
    }
    Ok(())
}

fn cmd_check(file: &Path, json: bool) -> Result<()> {
    let source = match read_source(file) {
        Ok(source) => source,
        Err(err) => return emit_error(json, &err),
    };
    let result = StaticValidator::new().validate(&source);
    if json {
        let payload = serde_json::json!({
            "valid": result.is_ok(),
            "finding": result.as_ref().err(),
            "message": result.as_ref().err().map(ToString::to_string),
        });
        println!("{}", serde_json::to_string(&payload).into_diagnostic()?);
    } else {
        match &result {
            Ok(()) => eprintln!("check: ok"),
            Err(finding) => eprintln!("check: {finding}"),
        }
    }
    if result.is_err() {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_sweep(args: &ConfigArgs, json: bool) -> Result<()> {
    let report = load_config(args)
        .and_then(|config| Judge::new(config, Box::new(DisabledStore)))
        .and_then(|judge| judge.sweep());
    match report {
        Ok(report) => {
            if json {
                println!("{}", serde_json::to_string(&report).into_diagnostic()?);
            } else {
                eprintln!(
                    "sweep: removed {} of {} workspaces",
                    report.workspaces_removed, report.workspaces_checked
                );
            }
            Ok(())
        }
        Err(err) => emit_error(json, &err),
    }
}

/// Handle the completions command.
#[allow(clippy::unnecessary_wraps)] // Consistent with other command handlers
fn cmd_completions(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

fn load_config(args: &ConfigArgs) -> JudgeResult<JudgeConfig> {
    let mut config = match args.config.as_ref() {
        Some(path) => load_config_file(path)?,
        None => JudgeConfig::default(),
    };
    apply_overrides(&mut config, args);
    validate_config(&config)?;
    Ok(config)
}

fn apply_overrides(config: &mut JudgeConfig, args: &ConfigArgs) {
    if let Some(endpoint) = args.endpoint.as_ref() {
        config.runner.endpoint = Some(endpoint.clone());
    }
    if let Some(tier) = args.tier {
        config.runner.tier = tier.into();
    }
    if args.persistent {
        config.workspace.mode = WorkspaceMode::Persistent;
    }
    if let Some(root) = args.workspace_root.as_ref() {
        config.workspace.root = Some(root.clone());
    }
    if let Some(path) = args.store.as_ref() {
        config.store = StoreConfig::Jsonl {
            path: Some(path.clone()),
        };
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.runner.timeout_ms = timeout_ms;
    }
}

/// Build a judge that stops its runner and accepts no more work on Ctrl-C.
///
/// A second Ctrl-C exits immediately.
fn build_judge(config: JudgeConfig) -> JudgeResult<Judge> {
    let store = open_store(&config)?;
    let token = CancellationToken::new();
    let handler_token = token.clone();
    let handler = move || {
        if handler_token.is_cancelled() {
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
        handler_token.cancel();
    };
    if let Err(err) = ctrlc::set_handler(handler) {
        tracing::warn!(error = %err, "failed to install interrupt handler");
    }
    Judge::with_cancellation(config, store, token)
}

fn read_source(file: &Path) -> JudgeResult<String> {
    let source = if file == Path::new("-") {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|err| JudgeError::io("failed to read script from stdin", err))?;
        buffer
    } else {
        std::fs::read_to_string(file)
            .map_err(|err| JudgeError::io(format!("failed to read {}", file.display()), err))?
    };
    if source.len() > MAX_SOURCE_BYTES {
        return Err(JudgeError::protocol(
            format!("script exceeds {MAX_SOURCE_BYTES} bytes"),
            serde_json::json!({ "size": source.len() }),
        ));
    }
    Ok(source)
}

fn emit_verdict(json: bool, result: JudgeResult<Verdict>) -> Result<()> {
    match result {
        Ok(verdict) => {
            if json {
                let payload = serde_json::to_string(&verdict.to_response()).into_diagnostic()?;
                println!("{payload}");
            } else {
                if !verdict.sanitized_log.is_empty() {
                    println!("{}", verdict.sanitized_log);
                }
                eprintln!(
                    "verdict: {} ({} ms)",
                    verdict.status, verdict.duration_ms
                );
            }
            match verdict.status {
                VerdictStatus::Passed => Ok(()),
                VerdictStatus::Failed => std::process::exit(1),
            }
        }
        Err(err) => emit_error(json, &err),
    }
}

fn emit_error(json: bool, err: &JudgeError) -> Result<()> {
    if json {
        let response = judgebox::ErrorResponse::from(err.to_error_info());
        let payload = serde_json::to_string(&response).into_diagnostic()?;
        println!("{payload}");
    } else {
        eprintln!("error: {err}");
    }
    std::process::exit(err.exit_code());
}
