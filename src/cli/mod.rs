use crate::manifest::ManifestKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mlist")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Registry username
    #[arg(long, global = true, env = "MLIST_USERNAME")]
    pub username: Option<String>,

    /// Registry password
    #[arg(long, global = true, env = "MLIST_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Accept invalid TLS certificates from the registry
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Talk to the registry over plain HTTP
    #[arg(long, global = true)]
    pub plain_http: bool,

    /// Directory containing the Docker config.json credential store
    #[arg(long, global = true, value_name = "DIR")]
    pub docker_cfg: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Push a manifest list/OCI index to a registry with provided image details
    Push {
        /// Manifest type: docker (v2.2 manifest list) or oci (v1 index)
        #[arg(long = "type", value_enum, global = true)]
        manifest_type: Option<ManifestKind>,

        #[command(subcommand)]
        source: PushSource,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum PushSource {
    /// Push a manifest list described by a YAML file
    FromSpec {
        /// Path to the YAML specification
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Only warn on images that cannot be found
        #[arg(long)]
        ignore_missing: bool,
    },

    /// Push a manifest list described by command-line arguments
    FromArgs {
        /// Comma-separated platforms the images exist for (e.g., linux/amd64,linux/arm/v7)
        #[arg(long)]
        platforms: Option<String>,

        /// Source image pattern; OS, ARCH and VARIANT are replaced per platform
        #[arg(long)]
        template: Option<String>,

        /// Name of the manifest list image to produce
        #[arg(long)]
        target: Option<String>,

        /// Only warn on images that cannot be found
        #[arg(long)]
        ignore_missing: bool,
    },
}
