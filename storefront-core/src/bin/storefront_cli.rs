//! Storefront CLI - compose a storefront image from the photo folder
//!
//! Commands: profiles, validate, compose
//! Machine-readable results go to stdout as JSON, progress goes to the log

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use storefront_core::{
    pipeline::write_manifest, ComposeRequest, PipelineError, ProfileRegistry, StorefrontPipeline,
};

#[derive(Parser)]
#[command(name = "storefront-cli")]
#[command(about = "Compose a square storefront image from a folder of product photos")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding config_<profile>.json files
    #[arg(short = 'd', long, default_value = ".")]
    profiles_dir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// List available profiles
    Profiles,

    /// Check a profile's layout values
    Validate {
        /// Profile name, e.g. ebay or shopify
        #[arg(short, long)]
        profile: String,
    },

    /// Compose the storefront image
    Compose {
        /// Profile name, e.g. ebay or shopify
        #[arg(short, long)]
        profile: String,

        /// Directory containing exactly one photo folder
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Output JPEG path
        #[arg(short, long, default_value = "output.jpg")]
        output: PathBuf,

        /// Also write a JSON manifest of every placement
        #[arg(short, long)]
        manifest: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let registry = match ProfileRegistry::load_from_dir(&cli.profiles_dir) {
        Ok(r) => r,
        Err(e) => {
            log::error!("Failed to load profiles: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let pipeline = StorefrontPipeline::new();

    match cli.command {
        Commands::Profiles => {
            let profiles: Vec<_> = registry.list()
                .into_iter()
                .map(|(name, c)| serde_json::json!({
                    "name": name,
                    "mode": c.mode,
                    "image_size": c.image_size,
                    "thumbnail_size": c.thumbnail_size,
                }))
                .collect();

            print_json(&serde_json::Value::Array(profiles))
        }

        Commands::Validate { profile } => {
            let config = match registry.get(&profile) {
                Ok(c) => c,
                Err(e) => return report(e.into()),
            };
            let result = pipeline.validate_config(config);
            let code = print_json(&result);
            if result.valid { code } else { ExitCode::from(2) }
        }

        Commands::Compose { profile, dir, output, manifest } => {
            let config = match registry.get(&profile) {
                Ok(c) => c,
                Err(e) => return report(e.into()),
            };
            let request = ComposeRequest { profile, root: dir, output };

            let result = pipeline.run(config, &request).and_then(|m| match &manifest {
                Some(path) => write_manifest(&m, path).map(|_| m),
                None => Ok(m),
            });
            match result {
                Ok(m) => {
                    log::info!(
                        "Success. Wrote {} with {} thumbnails{}",
                        m.output.display(),
                        m.thumbnail_count(),
                        if m.truncated { " and a truncation marker" } else { "" }
                    );
                    ExitCode::SUCCESS
                }
                Err(e) => report(e),
            }
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            println!("{}", s);
            ExitCode::SUCCESS
        }
        Err(e) => report(e.into()),
    }
}

/// The one place failures are reported.
fn report(e: PipelineError) -> ExitCode {
    log::error!("{}", e);
    ExitCode::FAILURE
}
