//! Command-line interface.
//!
//! Thin layer over [`crate::core::vault`]: parse arguments, build a
//! [`Context`], call one operation and render its result.

pub mod clean;
pub mod completions;
pub mod create;
pub mod doctor;
pub mod files;
pub mod init;
pub mod output;
pub mod prompt;
pub mod register;
pub mod revoke;
pub mod rotate;
pub mod status;
pub mod sync;
pub mod whoami;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::core::context::Context;
use crate::error::Result;

/// Cellar - git-native team secrets with per-device keys.
#[derive(Parser)]
#[command(
    name = "cellar",
    about = "Git-native team secrets with per-device keys",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Resolve and validate everything, but write nothing
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Initialize a cellar store in the current directory
    Init {
        /// Project name (defaults to the directory name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Create a keypair for this machine
    Create {
        /// Device name (defaults to the hostname)
        #[arg(short, long)]
        name: Option<String>,
        /// Replace an existing key for this project
        #[arg(short, long)]
        force: bool,
    },

    /// Grant a device access to the project key
    Register(RegisterArgs),

    /// Replace this machine's keypair
    Rotate {
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Re-key the project and re-encrypt every secret
    Sync,

    /// Remove a device's access and re-key the project
    Revoke(RevokeArgs),

    /// Encrypt plaintext files to their .enc siblings
    Encrypt {
        /// Files, directories or glob patterns (default: every tracked secret)
        patterns: Vec<String>,
    },

    /// Decrypt .enc files to their plaintext siblings
    Decrypt {
        /// Files, directories or glob patterns (default: every ciphertext)
        patterns: Vec<String>,
    },

    /// Show devices, access and secret files
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show your identity and this machine's device
    Whoami,

    /// Remove orphaned wrapped keys
    Clean {
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Check store consistency and local key health
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Who to register. Exactly one of the device, `--user` or `--key-file`.
#[derive(Args, Debug, Default)]
pub struct RegisterArgs {
    /// Device id to grant access to
    pub device: Option<String>,
    /// Register every pending device of this user
    #[arg(long, value_name = "EMAIL")]
    pub user: Option<String>,
    /// Register a public key received out of band
    #[arg(long, value_name = "PATH")]
    pub key_file: Option<PathBuf>,
    /// Owner of the key file
    #[arg(long, value_name = "EMAIL")]
    pub email: Option<String>,
    /// Device name for the key file
    #[arg(long)]
    pub name: Option<String>,
    /// Register again even if already active
    #[arg(short, long)]
    pub force: bool,
}

/// Who to revoke. Exactly one of the device or `--user`.
#[derive(Args, Debug, Default)]
pub struct RevokeArgs {
    /// Device id to revoke
    pub device: Option<String>,
    /// Revoke every device of this user
    #[arg(long, value_name = "EMAIL")]
    pub user: Option<String>,
    /// With --user, revoke only this device
    #[arg(long = "device", value_name = "ID", requires = "user")]
    pub user_device: Option<String>,
    /// Skip confirmation
    #[arg(short, long)]
    pub force: bool,
    /// Allow revoking the last device with access
    #[arg(long)]
    pub allow_lockout: bool,
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Execute a command and return the process exit code.
///
/// # Errors
///
/// Returns the first error an operation fails with.
pub fn run(cli: Cli) -> Result<i32> {
    if let Command::Completions { shell } = cli.command {
        completions::execute(shell)?;
        return Ok(0);
    }

    let ctx = Context::discover()?
        .with_prompt(prompt::Terminal)
        .with_dry_run(cli.dry_run);
    if ctx.dry_run {
        output::dry_run();
    }

    execute(&ctx, cli.command)
}

/// Dispatch a command against a prepared context.
pub fn execute(ctx: &Context, command: Command) -> Result<i32> {
    use Command::*;

    match command {
        Init { name } => init::execute(ctx, name.as_deref()).map(|()| 0),
        Create { name, force } => create::execute(ctx, name.as_deref(), force).map(|()| 0),
        Register(args) => register::execute(ctx, &args).map(|()| 0),
        Rotate { force } => rotate::execute(ctx, force).map(|()| 0),
        Sync => sync::execute(ctx).map(|()| 0),
        Revoke(args) => revoke::execute(ctx, &args).map(|()| 0),
        Encrypt { patterns } => files::encrypt(ctx, &patterns),
        Decrypt { patterns } => files::decrypt(ctx, &patterns),
        Status { json } => status::execute(ctx, json).map(|()| 0),
        Whoami => whoami::execute(ctx).map(|()| 0),
        Clean { force } => clean::execute(ctx, force).map(|()| 0),
        Doctor { json } => doctor::execute(ctx, json),
        Completions { shell } => completions::execute(shell).map(|()| 0),
    }
}
