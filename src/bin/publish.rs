//! Schema Publisher CLI
//!
//! Usage:
//!   schema-publish publish [--local] [--java|--ruby] [--doc-only] [--thrift-file FILE]
//!   schema-publish visualize [--thrift-file FILE]
//!   schema-publish compilers
//!   schema-publish config
//!
//! Global options: `--config FILE`, `--set-compiler NAME`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use schema_publish::generator::{run_worker, WorkerManifest};
use schema_publish::{PublishConfig, PublishError, Publisher};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-publish")]
#[command(about = "Generate and publish client libraries from Thrift schemas")]
#[command(version)]
struct Cli {
    /// Use this config file (TOML or YAML) on top of the default locations
    #[arg(long, global = true)]
    config: Option<String>,

    /// Build with this compiler only (name from configuration)
    #[arg(long, global = true)]
    set_compiler: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate clients for the selected schemas
    Publish(PublishArgs),

    /// Write the schema dependency graph as node-link JSON
    Visualize {
        /// Start from this schema instead of the whole catalog
        #[arg(long)]
        thrift_file: Option<String>,
    },

    /// List configured compilers
    Compilers,

    /// Print the effective configuration
    Config,

    /// Run one generation task (launched by `publish`)
    #[command(hide = true)]
    Worker {
        #[arg(long)]
        manifest: PathBuf,
    },
}

#[derive(Args)]
struct PublishArgs {
    /// Local mode: ignore VCS and build the full catalog
    #[arg(long)]
    local: bool,

    /// Java only (local mode only)
    #[arg(long)]
    java: bool,

    /// Ruby only (local mode only)
    #[arg(long)]
    ruby: bool,

    /// Generate documentation only
    #[arg(long)]
    doc_only: bool,

    /// Regenerate just this schema file (implies --local)
    #[arg(long)]
    thrift_file: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            eprintln!("❌ Error: {}", e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32, PublishError> {
    if let Commands::Worker { manifest } = &cli.command {
        let manifest = WorkerManifest::load(manifest)?;
        return run_worker(&manifest);
    }

    let mut config = PublishConfig::load_from(cli.config.as_deref())?;

    if let Commands::Compilers = cli.command {
        for compiler in &config.compilers {
            println!("{}", compiler.describe());
        }
        return Ok(0);
    }

    if let Some(name) = &cli.set_compiler {
        config = config.select_compiler(name)?;
    }

    match cli.command {
        Commands::Publish(args) => {
            config = config.with_local(args.local);
            if let Some(file) = &args.thrift_file {
                config = config.with_service_override(file);
            }
            config = config.with_client_flags(args.java, args.ruby);
            if args.doc_only {
                config = config.doc_only();
            }

            let status = Publisher::new(config)?.process_schemas()?;
            println!("✅ Published with {} generator task(s)", status.tasks);
        }
        Commands::Visualize { thrift_file } => {
            let path = Publisher::new(config)?.visualize(thrift_file.as_deref())?;
            println!("Wrote node-link JSON data to {}", path.display());
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
        Commands::Compilers | Commands::Worker { .. } => {}
    }
    Ok(0)
}
