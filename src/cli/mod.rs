//! CLI subcommands — synth, validate, graph, fingerprint, completions.
//!
//! The topology itself takes no runtime parameters; the CLI only chooses
//! how and where the synthesized declaration is emitted.

use crate::graph::{order, validate};
use crate::synth::template;
use crate::topology;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "trama",
    version,
    about = "Declarative network topology — typed resource graph, deterministic synthesis"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synthesize the topology into a template document
    Synth {
        /// Write to a file instead of stdout (atomic write)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Validate the declaration without rendering
    Validate,

    /// Print the dependency edges and deterministic declaration order
    Graph,

    /// Print the BLAKE3 fingerprint of the synthesized template
    Fingerprint,

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<(), String> {
    match cmd {
        Commands::Synth { output, format } => cmd_synth(output.as_deref(), format),
        Commands::Validate => cmd_validate(),
        Commands::Graph => cmd_graph(),
        Commands::Fingerprint => cmd_fingerprint(),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "trama", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn cmd_synth(output: Option<&Path>, format: OutputFormat) -> Result<(), String> {
    let topology = topology::load_balancer_topology()?;
    let template = template::synthesize(&topology)?;
    let rendered = match format {
        OutputFormat::Json => template::to_json(&template)?,
        OutputFormat::Yaml => template::to_yaml(&template)?,
    };

    match output {
        Some(path) => {
            template::write_atomic(path, &rendered)?;
            println!(
                "Wrote {} ({} fragments, {})",
                path.display(),
                template.resources.len(),
                template::fingerprint(&template)?
            );
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

fn cmd_validate() -> Result<(), String> {
    let topology = topology::load_balancer_topology()?;
    let errors = validate::validate_topology(&topology);

    if errors.is_empty() {
        println!(
            "OK: {} ({} resources)",
            topology.name,
            topology.resources.len()
        );
        Ok(())
    } else {
        for e in &errors {
            eprintln!("  ERROR: {}", e);
        }
        Err(format!("{} validation error(s)", errors.len()))
    }
}

fn cmd_graph() -> Result<(), String> {
    let topology = topology::load_balancer_topology()?;
    let edges = order::dependency_edges(&topology)?;
    let declaration_order = order::declaration_order(&topology)?;

    println!("Edges ({}):", edges.len());
    for (dependency, dependent) in &edges {
        println!("  {} -> {}", dependency, dependent);
    }
    println!("Declaration order:");
    for (position, id) in declaration_order.iter().enumerate() {
        println!("  {}. {}", position + 1, id);
    }
    Ok(())
}

fn cmd_fingerprint() -> Result<(), String> {
    let topology = topology::load_balancer_topology()?;
    let template = template::synthesize(&topology)?;
    println!("{}", template::fingerprint(&template)?);
    Ok(())
}
