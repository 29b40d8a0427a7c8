use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};

use arxml_kb::{
    init_tracing, DocumentParser, GraphStore, ImportClient, ImportConfig, ImportFile,
    ImportMessage, ImportService, InMemoryGraphStore, Neo4jConfig, Neo4jGraphStore,
    XmlDocumentParser,
};

/// Import ARXML system descriptions into the safety-analysis graph.
#[derive(Parser, Debug)]
#[command(name = "arxml-import", version, about)]
struct Cli {
    /// ARXML files, or directories scanned (non-recursively) for `.arxml` files
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Build the graph in memory only; Neo4j is not contacted
    #[arg(long)]
    dry_run: bool,

    /// Print the import outcome as JSON
    #[arg(long)]
    json: bool,
}

fn is_arxml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("arxml"))
        .unwrap_or(false)
}

fn collect_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = std::fs::read_dir(input)
                .with_context(|| format!("Failed to read directory {}", input.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file() && is_arxml(path))
                .collect();
            found.sort();
            if found.is_empty() {
                warn!("No .arxml files in {}", input.display());
            }
            paths.extend(found);
        } else {
            paths.push(input.clone());
        }
    }
    Ok(paths)
}

async fn read_files(paths: &[PathBuf]) -> Result<Vec<ImportFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        files.push(ImportFile::new(file_name, path.display().to_string(), content));
    }
    Ok(files)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let paths = collect_paths(&cli.paths)?;
    if paths.is_empty() {
        bail!("No ARXML files found in the given paths");
    }
    let files = read_files(&paths).await?;
    info!(files = files.len(), dry_run = cli.dry_run, "Starting ARXML import");

    let config = ImportConfig::load();
    let store: Arc<dyn GraphStore> = if cli.dry_run {
        Arc::new(InMemoryGraphStore::new())
    } else {
        let neo4j = Neo4jGraphStore::new(Neo4jConfig::from_env())
            .await
            .context("Failed to connect to Neo4j")?;
        Arc::new(neo4j)
    };
    let parser: Arc<dyn DocumentParser> = Arc::new(XmlDocumentParser::new());

    let (import_tx, import_rx) = mpsc::channel::<ImportMessage>(8);
    let mut service = ImportService::new(parser, store, config, import_rx);
    let service_handle = tokio::spawn(async move { service.run().await });

    let client = ImportClient::new(import_tx);
    let outcome = client.import(files).await?;
    let latest = client.latest_import().await?;
    drop(client);
    service_handle.await.context("Import service task failed")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", outcome.message);
        println!("  nodes:         {}", outcome.node_count);
        println!("  relationships: {}", outcome.relationship_count);
        println!("  unresolved:    {}", outcome.unresolved_references.len());
        if let Some(summary) = latest {
            println!("  session:       {} ({})", summary.session.id, summary.session.status);
        }
        for unresolved in &outcome.unresolved_references {
            println!(
                "    {} -[{}]-> {} ({})",
                unresolved.source_uuid,
                unresolved.relationship_type,
                unresolved.target_path,
                unresolved.destination_attribute
            );
        }
    }

    if !outcome.success {
        bail!(outcome.error.unwrap_or(outcome.message));
    }
    Ok(())
}
