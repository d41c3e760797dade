use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use schema_publish::{PublishConfig, Publisher};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-graph-export")]
#[command(about = "Export the schema include graph to JSON/DOT/SVG format")]
struct Cli {
    /// Config file (TOML or YAML); default locations are always read
    #[arg(short, long)]
    config: Option<String>,

    /// Start from this schema instead of the whole catalog
    #[arg(short, long)]
    thrift_file: Option<String>,

    /// Output file (defaults to schemas.<format>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format: json, dot or svg
    #[arg(short, long, default_value = "dot")]
    format: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = PublishConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    let graph = Publisher::new(config)?.dependency_graph(cli.thrift_file.as_deref())?;

    println!("Graph resolved: {} schemas, {} edges", graph.node_count(), graph.edge_count());
    for cycle in graph.cycles() {
        println!("  circular includes: {}", cycle.join(" <-> "));
    }

    let output_path = cli
        .output
        .unwrap_or_else(|| PathBuf::from(format!("schemas.{}", cli.format)));

    match cli.format.as_str() {
        "json" => {
            graph.write_node_link(&output_path)?;
            println!("✅ Exported node-link JSON to: {:?}", output_path);
        }
        "dot" => {
            std::fs::write(&output_path, graph.to_dot())?;
            println!("✅ Exported DOT to: {:?}", output_path);
        }
        "svg" => {
            // Write DOT to temp file, then convert to SVG
            let temp_dot = output_path.with_extension("temp.dot");
            std::fs::write(&temp_dot, graph.to_dot())?;

            let output = std::process::Command::new("dot")
                .arg("-Tsvg")
                .arg(&temp_dot)
                .arg("-o")
                .arg(&output_path)
                .output()
                .context("running GraphViz `dot`")?;

            let _ = std::fs::remove_file(&temp_dot);

            if !output.status.success() {
                bail!(
                    "GraphViz conversion failed: {}",
                    String::from_utf8_lossy(&output.stderr)
                );
            }
            println!("✅ Exported SVG to: {:?}", output_path);
        }
        other => bail!("Invalid format '{}'. Use 'json', 'dot' or 'svg'", other),
    }

    Ok(())
}
