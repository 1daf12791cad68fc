//! Command-driven fix loop for an LLM coding collaborator.
//!
//! Loads agent definitions from TOML configuration files, validates them,
//! and runs a selected agent against the stdio collaborator.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;

use fixloop::cancel::CancelFlag;
use fixloop::io::stdio::StdioCoder;
use fixloop::registry::AgentRegistry;

#[derive(Parser)]
#[command(
    name = "fixloop",
    version,
    about = "Command-driven fix loop for an LLM coding collaborator"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse and validate agent configuration files.
    Check {
        /// Configuration files, merged left to right. Missing files are skipped.
        #[arg(long = "config", required = true, num_args = 1..)]
        config: Vec<PathBuf>,
    },
    /// List configured agents.
    List {
        #[arg(long = "config", required = true, num_args = 1..)]
        config: Vec<PathBuf>,
        /// Emit the listing as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Run a configured agent against the stdio collaborator.
    Run {
        /// Agent name, as defined in the configuration.
        name: String,
        #[arg(long = "config", required = true, num_args = 1..)]
        config: Vec<PathBuf>,
    },
}

#[derive(Serialize)]
struct AgentListing<'a> {
    name: &'a str,
    r#type: &'a str,
}

fn main() {
    fixloop::logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Check { config } => cmd_check(&config),
        Command::List { config, json } => cmd_list(&config, json),
        Command::Run { name, config } => cmd_run(&name, &config),
    }
}

fn cmd_check(config: &[PathBuf]) -> Result<()> {
    let registry = load_registry(config)?;
    println!("ok: {} agent(s) configured", registry.agents().count());
    Ok(())
}

fn cmd_list(config: &[PathBuf], json: bool) -> Result<()> {
    let registry = load_registry(config)?;
    if json {
        let listing: Vec<AgentListing> = registry
            .agents()
            .map(|(name, r#type)| AgentListing { name, r#type })
            .collect();
        let mut payload = serde_json::to_string_pretty(&listing).context("serialize listing")?;
        payload.push('\n');
        print!("{payload}");
    } else {
        for (name, r#type) in registry.agents() {
            println!("{name}\t{type}");
        }
    }
    Ok(())
}

fn cmd_run(name: &str, config: &[PathBuf]) -> Result<()> {
    let registry = load_registry(config)?;
    if !registry.is_agent(name) {
        bail!("unknown agent '{name}' (see `fixloop list`)");
    }

    let cancel = CancelFlag::new();
    cancel.register_sigint()?;

    let root = std::env::current_dir().context("resolve current directory")?;
    let mut coder = StdioCoder::new(root);
    registry.run_agent(name, &mut coder, &cancel)
}

/// Read configuration sources in order; missing files become skipped sources.
fn load_registry(paths: &[PathBuf]) -> Result<AgentRegistry> {
    let mut sources = Vec::with_capacity(paths.len());
    for path in paths {
        if path.exists() {
            let text =
                fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
            sources.push(Some(text));
        } else {
            sources.push(None);
        }
    }
    AgentRegistry::load(&sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_check() {
        let cli = Cli::parse_from(["fixloop", "check", "--config", "agents.toml"]);
        assert!(matches!(cli.command, Command::Check { config } if config.len() == 1));
    }

    #[test]
    fn parse_list_json() {
        let cli = Cli::parse_from(["fixloop", "list", "--config", "a.toml", "b.toml", "--json"]);
        let Command::List { config, json } = cli.command else {
            panic!("expected list command");
        };
        assert_eq!(config.len(), 2);
        assert!(json);
    }

    #[test]
    fn parse_run() {
        let cli = Cli::parse_from(["fixloop", "run", "lint", "--config", "agents.toml"]);
        let Command::Run { name, config } = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(name, "lint");
        assert_eq!(config.len(), 1);
    }

    #[test]
    fn load_registry_skips_missing_files() {
        let temp = tempfile::tempdir().expect("tempdir");
        let present = temp.path().join("agents.toml");
        fs::write(
            &present,
            "[lint]\ntype = \"fix\"\ncommand = \"make lint\"\n",
        )
        .expect("write config");

        let registry =
            load_registry(&[temp.path().join("missing.toml"), present]).expect("load");
        assert!(registry.is_agent("lint"));
    }
}
