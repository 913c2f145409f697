use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ap2")]
#[command(about = "AP2 mandate purchase flow CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the purchase flow end to end against the paper adapters
    Demo {
        /// Layered config paths in merge order (base -> overlays)
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// Product id to order (default: first shortlisted product)
        #[arg(long)]
        product: Option<String>,

        /// Write the session audit log here as JSON Lines
        #[arg(long)]
        audit_out: Option<String>,

        /// Fail instead of warn when config contains keys nothing reads
        #[arg(long, default_value_t = false)]
        strict_config: bool,
    },

    /// List the configured catalog
    Catalog {
        /// Layered config paths in merge order
        #[arg(long = "config")]
        config_paths: Vec<String>,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> overlays)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Audit trail utilities
    Audit {
        #[command(subcommand)]
        cmd: AuditCmd,
    },
}

#[derive(Subcommand)]
enum AuditCmd {
    /// Verify the hash chain of an exported audit JSONL file
    Verify {
        /// Path to the exported file
        path: String,
    },
}

fn main() -> Result<()> {
    // Load .env.local if present (dev convenience). Silent if missing.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Demo {
            config_paths,
            product,
            audit_out,
            strict_config,
        } => commands::demo::run_demo(commands::demo::DemoArgs {
            config_paths,
            product,
            audit_out,
            strict_config,
        }),

        Commands::Catalog { config_paths } => commands::demo::list_catalog(&config_paths),

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = ap2_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
            Ok(())
        }

        Commands::Audit { cmd } => match cmd {
            AuditCmd::Verify { path } => commands::audit::verify(&path),
        },
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
