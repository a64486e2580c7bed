use anyhow::Result;
use clap::Parser;
use mlist::{
    auth::Credentials,
    cli::{Cli, Commands, PushSource},
    config::Config,
    registry::ConnectionPolicy,
    service::{MissingPolicy, PushContext, PushService},
    spec::{ArgsInput, Document, ManifestSpec, SpecInput},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Push {
            manifest_type,
            source,
        } => {
            let config = Config::load()?;
            let kind = manifest_type.unwrap_or(config.manifest_type);

            let (input, ignore_missing) = match source {
                PushSource::FromSpec {
                    file,
                    ignore_missing,
                } => (SpecInput::Document(Document::from_file(&file)?), ignore_missing),
                PushSource::FromArgs {
                    platforms,
                    template,
                    target,
                    ignore_missing,
                } => (
                    SpecInput::Args(ArgsInput {
                        platforms: platforms.unwrap_or_default(),
                        template: template.unwrap_or_default(),
                        target: target.unwrap_or_default(),
                    }),
                    ignore_missing,
                ),
            };

            let spec = ManifestSpec::load(input, kind)?;

            let context = PushContext {
                credentials: Credentials::new(cli.username, cli.password),
                connection: ConnectionPolicy {
                    insecure: cli.insecure,
                    plain_http: cli.plain_http,
                },
                missing: MissingPolicy::from_ignore_missing(ignore_missing),
                docker_config: config.docker_config_file(cli.docker_cfg.as_deref()),
            };

            let mut registry = context.registry_client(config.registry_auths());
            let outcome = PushService::push(&mut registry, &spec, context.missing).await?;

            info!("Pushed {} to {}", kind, spec.target);
            // Print only the digest and length to stdout
            println!("Digest: {} {}", outcome.digest, outcome.length);
        }
        Commands::Version => {
            println!("mlist {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
