// crates/flowcli/src/main.rs

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use flowcore::{FlowEvent, Message, NodeConfig, NodeError, NodeEvent, Value};
use flownodes::TransformNode;
use flowruntime::{Flow, FlowRuntime, NodeRegistry, RuntimeConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flow")]
#[command(about = "File flow CLI", long_about = None)]
struct Cli {
    /// Show debug logs (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy a file through a reader -> writer -> debug flow
    Copy {
        /// File to read
        src: PathBuf,

        /// File to write; parent directories are created
        dst: PathBuf,

        /// Character encoding used for both ends
        #[arg(short, long, default_value = "UTF-8")]
        encoding: String,

        /// Send the file line by line instead of as one message
        #[arg(short, long)]
        lines: bool,

        /// Write mode: auto, append, truncate or create-new
        #[arg(short, long, default_value = "auto")]
        mode: String,

        /// Write a newline after every message
        #[arg(short, long)]
        newline: bool,
    },

    /// Read a file and print the emitted messages as JSON
    Cat {
        /// File to read
        src: PathBuf,

        /// Character encoding
        #[arg(short, long, default_value = "UTF-8")]
        encoding: String,

        /// Emit one message per line
        #[arg(short, long)]
        lines: bool,
    },

    /// List available node types
    Nodes,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn runtime() -> FlowRuntime {
    let mut registry = NodeRegistry::new();
    flownodes::register_all(&mut registry);
    FlowRuntime::with_registry(Arc::new(registry), RuntimeConfig::default())
}

fn path_config(path: &Path, encoding: &str) -> Result<NodeConfig> {
    let Some(path) = path.to_str() else {
        bail!("Path is not valid UTF-8: {}", path.display());
    };
    let mut config = NodeConfig::new();
    config.insert("path".to_string(), Value::from(path));
    config.insert("encoding".to_string(), Value::from(encoding));
    Ok(config)
}

fn read_config(src: &Path, encoding: &str, lines: bool) -> Result<NodeConfig> {
    let mut config = path_config(src, encoding)?;
    let mode = if lines { "lines" } else { "whole" };
    config.insert("mode".to_string(), Value::from(mode));
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Copy {
            src,
            dst,
            encoding,
            lines,
            mode,
            newline,
        } => copy_file(src, dst, &encoding, lines, &mode, newline).await,
        Commands::Cat {
            src,
            encoding,
            lines,
        } => cat_file(src, &encoding, lines).await,
        Commands::Nodes => {
            list_nodes();
            Ok(())
        }
    }
}

async fn copy_file(
    src: PathBuf,
    dst: PathBuf,
    encoding: &str,
    lines: bool,
    mode: &str,
    newline: bool,
) -> Result<()> {
    let runtime = runtime();
    let mut events = runtime.subscribe_events();

    let mut write_config = path_config(&dst, encoding)?;
    write_config.insert("write_mode".to_string(), Value::from(mode));
    write_config.insert("trailing_newline".to_string(), Value::from(newline));

    let mut flow = Flow::new();
    runtime.add_node(&mut flow, "file.read", "reader", &read_config(&src, encoding, lines)?)?;
    runtime.add_node(&mut flow, "file.write", "writer", &write_config)?;
    runtime.add_node(&mut flow, "debug.log", "debug", &NodeConfig::new())?;
    flow.pipe("reader", "writer")?;
    flow.pipe("writer", "debug")?;

    println!("📄 {} -> {}", src.display(), dst.display());
    flow.inject("reader", Message::empty()).await?;

    let report = drain_events(&mut events);
    if report.failures > 0 {
        bail!("Copy failed with {} error(s)", report.failures);
    }
    println!("✅ Copied {} message(s)", report.written);
    Ok(())
}

async fn cat_file(src: PathBuf, encoding: &str, lines: bool) -> Result<()> {
    let runtime = runtime();
    let mut events = runtime.subscribe_events();

    let mut flow = Flow::new();
    runtime.add_node(&mut flow, "file.read", "reader", &read_config(&src, encoding, lines)?)?;
    let printer = TransformNode::new("print", |message| {
        let line = serde_json::to_string(&message_json(&message))
            .map_err(|e| NodeError::ExecutionFailed(e.to_string()))?;
        println!("{}", line);
        Ok(Vec::new())
    })
    .with_events(runtime.event_bus().create_emitter("print"));
    flow.add_node(Arc::new(printer))?;
    flow.pipe("reader", "print")?;

    flow.inject("reader", Message::empty()).await?;

    let report = drain_events(&mut events);
    if report.failures > 0 {
        bail!("Read failed");
    }
    Ok(())
}

/// Plain JSON view of a message, without value tagging
fn message_json(message: &Message) -> serde_json::Value {
    let metadata: serde_json::Map<String, serde_json::Value> = message
        .metadata()
        .iter()
        .map(|(key, value)| (key.clone(), value.to_plain_json()))
        .collect();
    serde_json::json!({
        "id": message.id().to_string(),
        "payload": message.payload().to_plain_json(),
        "metadata": metadata,
    })
}

#[derive(Default)]
struct Report {
    written: usize,
    failures: usize,
}

/// Print node failures and warnings collected while the flow ran
fn drain_events(events: &mut broadcast::Receiver<FlowEvent>) -> Report {
    let mut report = Report::default();
    while let Ok(event) = events.try_recv() {
        match event {
            FlowEvent::NodeFailed { node_id, error, .. } => {
                eprintln!("  ❌ Node {} failed: {}", node_id, error);
                report.failures += 1;
            }
            FlowEvent::MessageEmitted { node_id, .. } if node_id == "writer" => {
                report.written += 1;
            }
            FlowEvent::NodeEvent {
                node_id,
                event: NodeEvent::Warning { message },
                ..
            } => {
                eprintln!("     ⚠️  [{}] {}", node_id, message);
            }
            _ => {}
        }
    }
    report
}

fn list_nodes() {
    println!("📦 Available Node Types:");
    println!();

    let runtime = runtime();
    let registry = runtime.registry();

    for node_type in registry.list_node_types() {
        let Some(metadata) = registry.get_metadata(&node_type) else {
            println!("  • {}", node_type);
            continue;
        };
        println!("  • {} ({})", node_type, metadata.category);
        println!("    {}", metadata.description);
        for key in &metadata.config {
            let marker = if key.required { "required" } else { "optional" };
            println!("      {} [{}] {}", key.name, marker, key.description);
        }
    }
}
