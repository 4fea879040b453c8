//! Command dispatch.

use crate::args::{Cli, Command};
use anyhow::Context;
use docvault_crypto::{CryptoEngine, KeyRing};
use docvault_store::{
    DefaultOwnershipResolver, DocumentStore, NewDocument, OwnershipResolver, S3Backend,
    StoreConfig,
};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Runs a parsed command line against the configured backend.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let mut stdout = std::io::stdout();

    if let Command::Keyring = cli.command {
        let ring = config.key_ring().context("failed to build key ring")?;
        return describe_keyring(&ring, &mut stdout);
    }

    let store = build_store(&config).await?;
    let resolver = DefaultOwnershipResolver::new(config.authorized_subjects.clone());
    execute(&store, &resolver, cli.command, &mut stdout).await
}

/// Config file (if any) overlaid with the environment, then validated.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<StoreConfig> {
    let mut config = match path {
        Some(path) => StoreConfig::from_toml_file(path)?,
        None => StoreConfig::default(),
    };
    config.apply_env(|name| std::env::var(name).ok())?;
    config.validate()?;
    Ok(config)
}

async fn build_store(config: &StoreConfig) -> anyhow::Result<DocumentStore> {
    let ring = config.key_ring().context("failed to build key ring")?;
    let backend = S3Backend::from_config(&config.s3)
        .await
        .context("failed to configure S3 backend")?;

    let mut builder = DocumentStore::builder(CryptoEngine::new(Arc::new(ring)), Arc::new(backend))
        .options(config.store_options());
    if let Some(scanner) = config.virus_scanner()? {
        info!("virus scanning via {}", scanner.url());
        builder = builder.virus_scanner(Arc::new(scanner));
    }
    Ok(builder.build())
}

/// Executes one command against an already built store.
pub async fn execute(
    store: &DocumentStore,
    resolver: &dyn OwnershipResolver,
    command: Command,
    out: &mut (dyn Write + Send),
) -> anyhow::Result<()> {
    match command {
        Command::Store {
            owner,
            content_type,
            title,
            custom_id,
            ttl_secs,
            file,
        } => {
            let owner = resolver.resolve(&owner.context())?;
            let content = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let title = title.unwrap_or_else(|| {
                file.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });

            let size = content.len();
            let mut doc = NewDocument::new(content, &content_type, &title);
            if let Some(secs) = ttl_secs {
                doc = doc.with_ttl(Duration::from_secs(secs));
            }

            let id = match custom_id {
                Some(name) => store.store_custom(&name, doc, &owner).await?,
                None => store.store(doc, &owner).await?,
            };
            info!("stored {size} bytes ({content_type})");
            writeln!(out, "{id}")?;
        }

        Command::Fetch {
            owner,
            target,
            output,
        } => {
            let owner = resolver.resolve(&owner.context())?;
            let id = target.document_id(&owner)?;
            let doc = store.fetch(&id, &owner).await?;
            info!(
                "fetched \"{}\" ({}, {} bytes)",
                doc.title,
                doc.content_type,
                doc.content.len()
            );

            match output {
                Some(path) => tokio::fs::write(&path, &doc.content)
                    .await
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => out.write_all(&doc.content)?,
            }
        }

        Command::Delete { owner, target } => {
            let owner = resolver.resolve(&owner.context())?;
            let id = target.document_id(&owner)?;
            store.delete(&id, &owner).await?;
            writeln!(out, "deleted {id}")?;
        }

        Command::Health => {
            store.health().await.context("backend health check failed")?;
            writeln!(out, "ok")?;
        }

        Command::Keyring => describe_keyring(store.engine().keyring(), out)?,
    }
    Ok(())
}

fn describe_keyring(ring: &KeyRing, out: &mut dyn Write) -> anyhow::Result<()> {
    writeln!(out, "active key version: {}", ring.active_version())?;
    let versions: Vec<String> = ring.versions().iter().map(u32::to_string).collect();
    writeln!(out, "decryptable versions: {}", versions.join(", "))?;
    Ok(())
}
