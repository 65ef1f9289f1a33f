use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use devops_browser::cache::FileCache;
use devops_browser::config::{BrowserConfig, DEFAULT_CONFIG_FILE};
use devops_browser::{BrowserError, GraphResolver, views};

/// Browse the group and user membership graph of an Azure DevOps organization.
#[derive(Debug, Parser)]
#[command(name = "devops-browser", version)]
struct Cli {
    /// Path to the YAML config file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Drop every cached response before running
    #[arg(long)]
    refresh: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive users, groups and namespaces
    Overview,
    /// All namespaces, sorted by name
    Namespaces,
    /// One namespace by name
    Namespace { name: String },
    /// All groups, sorted by name
    Groups,
    /// Interactive users, sorted by name
    Users,
    /// An entity with everything it is transitively connected to
    Entity { descriptor: String },
    /// A group with its direct members and memberships
    Group { descriptor: String },
    /// A user with every group it belongs to
    User { descriptor: String },
    /// Direct members and memberships of a descriptor
    Connections { descriptor: String },
    /// Transitive members and memberships of a descriptor
    Related { descriptor: String },
    /// The full descriptor lookup table
    Debug,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), BrowserError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: Cli) -> Result<(), BrowserError> {
    let config = BrowserConfig::load(&cli.config)?;
    if cli.refresh {
        FileCache::open(&config.cache_dir)?.clear()?;
    }

    let resolver = GraphResolver::from_config(&config)?;
    info!(event = "Startup", organization = config.organization.as_str());

    match cli.command {
        Command::Overview => print_json(&views::overview(&resolver)?),
        Command::Namespaces => print_json(&resolver.get_sorted_namespaces()?),
        Command::Namespace { name } => print_json(&resolver.get_namespace(&name)?),
        Command::Groups => print_json(&resolver.get_sorted_groups()?),
        Command::Users => print_json(&resolver.get_sorted_users()?),
        Command::Entity { descriptor } => print_json(&views::entity_view(&resolver, &descriptor)?),
        Command::Group { descriptor } => print_json(&views::group_view(&resolver, &descriptor)?),
        Command::User { descriptor } => print_json(&views::user_view(&resolver, &descriptor)?),
        Command::Connections { descriptor } => {
            print_json(&resolver.get_entity_connections(&descriptor)?)
        }
        Command::Related { descriptor } => print_json(&resolver.get_related_entities(&descriptor)?),
        Command::Debug => print_json(&resolver.lookup_table()?),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
