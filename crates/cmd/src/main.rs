// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

mod commands;
mod picker;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::Reply;
use diagnostics::{log_debug, log_error};
use dirstore::{Config, DirectoryHost, FixedPicker, LocalHost, NamespaceManager, ScopedFileStore};
use picker::PromptPicker;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "dirstore")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Namespace to work in (defaults to `default_namespace` from the config)
    #[arg(short, long, global = true)]
    namespace: Option<String>,

    /// Use this folder whenever one must be chosen, instead of asking
    #[arg(long, global = true)]
    pick: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Store(StoreCommands),
    /// Print every namespace with a saved folder, comma separated
    Namespaces,
    /// Forget the folders of every namespace
    ClearAll,
}

/// Commands working in the selected namespace
#[derive(Subcommand)]
enum StoreCommands {
    /// Choose a folder for the namespace, replacing the current one
    Select,
    /// Print whether the namespace has a folder, without asking for one
    IsSet,
    /// Print the name of the current folder
    Pwd,
    /// Write a file in the current folder
    Save {
        name: String,
        /// File contents as hex
        hex: String,
    },
    /// Print a file's contents as hex
    Load { name: String },
    /// Print the files in the current folder, comma separated
    List,
    /// Rename a file (copy, then delete the original)
    Rename { old: String, new: String },
    /// Delete a file
    Rm { name: String },
    /// Enter a subfolder, creating it if needed
    Cd { name: String },
    /// Return to the first folder chosen for the namespace
    Reset,
    /// Forget every folder chosen for the namespace
    Forget,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Store(command) => command.name(),
            Commands::Namespaces => "namespaces",
            Commands::ClearAll => "clear-all",
        }
    }

    /// Whether the command prints text rather than true/false
    fn prints_text(&self) -> bool {
        match self {
            Commands::Store(command) => command.prints_text(),
            Commands::Namespaces => true,
            Commands::ClearAll => false,
        }
    }

    async fn execute(&self, manager: &NamespaceManager) -> dirstore::Result<Reply> {
        match self {
            Commands::Store(command) => command.execute(&manager.selected().await?).await,
            Commands::Namespaces => commands::namespaces_command(manager).await,
            Commands::ClearAll => commands::clear_all_command(manager).await,
        }
    }
}

impl StoreCommands {
    fn name(&self) -> &'static str {
        match self {
            StoreCommands::Select => "select",
            StoreCommands::IsSet => "is-set",
            StoreCommands::Pwd => "pwd",
            StoreCommands::Save { .. } => "save",
            StoreCommands::Load { .. } => "load",
            StoreCommands::List => "list",
            StoreCommands::Rename { .. } => "rename",
            StoreCommands::Rm { .. } => "rm",
            StoreCommands::Cd { .. } => "cd",
            StoreCommands::Reset => "reset",
            StoreCommands::Forget => "forget",
        }
    }

    fn prints_text(&self) -> bool {
        matches!(
            self,
            StoreCommands::Select
                | StoreCommands::Pwd
                | StoreCommands::Load { .. }
                | StoreCommands::List
                | StoreCommands::Cd { .. }
        )
    }

    async fn execute(&self, store: &ScopedFileStore) -> dirstore::Result<Reply> {
        match self {
            StoreCommands::Select => commands::select_command(store).await,
            StoreCommands::IsSet => commands::is_set_command(store).await,
            StoreCommands::Pwd => commands::pwd_command(store).await,
            StoreCommands::Save { name, hex } => commands::save_command(store, name, hex).await,
            StoreCommands::Load { name } => commands::load_command(store, name).await,
            StoreCommands::List => commands::list_command(store).await,
            StoreCommands::Rename { old, new } => commands::rename_command(store, old, new).await,
            StoreCommands::Rm { name } => commands::remove_command(store, name).await,
            StoreCommands::Cd { name } => commands::cd_command(store, name).await,
            StoreCommands::Reset => commands::reset_command(store).await,
            StoreCommands::Forget => commands::forget_command(store).await,
        }
    }
}

/// Run one command and print its reply. A failed command prints the empty
/// or false default, logs the error and yields a failure exit code.
async fn run<W: Write>(
    cli: &Cli,
    config: &Config,
    host: Arc<dyn DirectoryHost>,
    out: &mut W,
) -> Result<ExitCode> {
    let manager = NamespaceManager::with_config(config, host);
    let namespace = cli
        .namespace
        .clone()
        .or_else(|| config.default_namespace.clone());

    let outcome: dirstore::Result<Reply> = async {
        if let Some(namespace) = namespace {
            log_debug!("Using namespace {namespace}", namespace: namespace.as_str());
            _ = manager.select(namespace).await?;
        }
        cli.command.execute(&manager).await
    }
    .await;

    match outcome {
        Ok(reply) => {
            writeln!(out, "{reply}")?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            let error = e.to_string();
            log_error!(
                "{command} failed: {error}",
                command: cli.command.name(),
                error: error.as_str()
            );
            writeln!(out, "{}", Reply::fallback_for(cli.command.prints_text()))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    diagnostics::init();

    let cli = Cli::parse();
    let config = Config::load()?;

    let host: Arc<dyn DirectoryHost> = match &cli.pick {
        Some(path) => Arc::new(LocalHost::new(FixedPicker::new(Some(path.clone())))),
        None => Arc::new(LocalHost::new(PromptPicker)),
    };

    let mut stdout = std::io::stdout();
    run(&cli, &config, host, &mut stdout).await
}
