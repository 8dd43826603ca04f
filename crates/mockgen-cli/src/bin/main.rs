//! openapi-mockgen CLI - generate mock data modules from an OpenAPI v3 spec
//!
//! `init` writes `openapi-mockgen.config.json`, `list` shows the endpoint
//! groups of the configured spec and `generate` writes one mock module per
//! endpoint plus `manifest.json` into the output directory.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use mock_generator::{DEFAULT_ARRAY_LENGTH, DEFAULT_OUTPUT_DIR};
use mockgen_cli::{GenerateOptions, InitOptions};

/// openapi-mockgen - Mock data generator for OpenAPI v3 specs
#[derive(Parser, Debug)]
#[command(name = "openapi-mockgen")]
#[command(version)]
#[command(about = "Generate mock data from OpenAPI v3 response schemas")]
struct Args {
    /// Config file location
    #[arg(long, global = true, env = "OPENAPI_MOCKGEN_CONFIG", default_value = mock_generator::CONFIG_FILE_NAME)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the config file
    Init {
        /// Local path or http(s) URL of the OpenAPI spec
        #[arg(long)]
        spec_path: String,

        /// Directory receiving mock modules and the manifest
        #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: String,

        /// Base URL served by the mock server
        #[arg(long)]
        base_url: Option<String>,

        /// Number of items generated for arrays
        #[arg(long, default_value_t = DEFAULT_ARRAY_LENGTH)]
        array_length: usize,

        /// Emit faker source instead of static values
        #[arg(long)]
        dynamic: bool,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// List endpoint groups of the configured spec
    List,

    /// Generate mock modules and the manifest
    Generate {
        /// Remove the output directory first
        #[arg(long)]
        clean: bool,

        /// Only groups whose label contains this
        #[arg(long)]
        group: Option<String>,

        /// Only endpoints whose path contains this
        #[arg(long)]
        path: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    match args.command {
        Command::Init {
            spec_path,
            output_dir,
            base_url,
            array_length,
            dynamic,
            force,
        } => {
            let options = InitOptions {
                spec_path,
                output_dir,
                base_url,
                array_length,
                dynamic,
                force,
            };
            mockgen_cli::init(&args.config, options).await?;
        }
        Command::List => {
            for (label, endpoints) in mockgen_cli::list(&args.config).await? {
                println!("{}", label);
                for endpoint in endpoints {
                    println!("  {}", endpoint);
                }
            }
        }
        Command::Generate { clean, group, path } => {
            let options = GenerateOptions { clean, group, path };
            let run = mockgen_cli::generate(&args.config, options).await?;
            info!(
                "Done: {} endpoints, {} example/schema mismatches",
                run.endpoints.len(),
                run.errors.len()
            );
        }
    }

    Ok(())
}
