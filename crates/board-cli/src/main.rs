//! `board`: inspect, arrange and convert board documents.

use anyhow::{Context, Result, anyhow, bail};
use board_core::{Alignment, BoardConfig, NodeId};
use board_editor::{BoardStore, DocumentKind, PersistenceApi, load_document, save_document};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;

mod fs;

use fs::{Format, FsPersistence};

#[derive(Parser)]
#[command(name = "board")]
#[command(about = "Inspect, arrange and convert board documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON file overriding editor defaults (gap, history size, ...)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a document
    Info { doc: String },

    /// Arrange nodes as a row, column or grid and save
    Arrange {
        doc: String,

        /// row | column | grid
        #[arg(short, long)]
        layout: String,

        /// Arrange every node
        #[arg(long, conflicts_with = "ids", required_unless_present = "ids")]
        all: bool,

        /// Comma-separated node ids, in arrangement order
        #[arg(long, value_delimiter = ',')]
        ids: Vec<String>,

        /// Write here instead of overwriting the input
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Re-encode a document as JSON or MessagePack
    Convert {
        doc: String,

        /// json | msgpack
        #[arg(long)]
        to: String,

        #[arg(short, long)]
        out: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            BoardConfig::from_json(&text).map_err(|e| anyhow!(e))?
        }
        None => BoardConfig::default(),
    };

    let persistence = FsPersistence::new(".");
    let mut store = BoardStore::new(DocumentKind::ImageCanvas, config);

    match cli.command {
        Commands::Info { doc } => {
            open(&mut store, &persistence, &doc).await?;
            print_info(&store);
        }
        Commands::Arrange {
            doc,
            layout,
            all,
            ids,
            out,
        } => {
            let alignment = Alignment::parse(&layout)
                .ok_or_else(|| anyhow!("unknown layout '{layout}' (expected row, column or grid)"))?;
            open(&mut store, &persistence, &doc).await?;

            select_targets(&mut store, all, &ids).with_context(|| format!("arranging {doc}"))?;

            if !store.align_nodes(alignment).applied() {
                bail!("need at least two nodes to arrange, got {}", store.selection().len());
            }
            for node in store.selected_nodes() {
                println!("{:<24} {:>9.1} {:>9.1}", node.id, node.geometry.x, node.geometry.y);
            }

            match out {
                Some(out) => persistence.save_document(&out, &store.snapshot()).await?,
                None => {
                    if !save_document(&mut store, &persistence).await {
                        bail!(store.error().unwrap_or("save failed").to_string());
                    }
                }
            }
        }
        Commands::Convert { doc, to, out } => {
            let format = Format::parse(&to).ok_or_else(|| anyhow!("unknown format '{to}'"))?;
            open(&mut store, &persistence, &doc).await?;
            let bytes = format.encode(&store.snapshot())?;
            std::fs::write(&out, bytes).with_context(|| format!("writing {out}"))?;
            log::info!("converted {doc} -> {out} ({format:?})");
        }
    }
    Ok(())
}

/// Select every node for `--all`, otherwise exactly `ids` in order.
fn select_targets(store: &mut BoardStore, all: bool, ids: &[String]) -> Result<()> {
    if all {
        store.select_all();
        return Ok(());
    }
    let wanted: Vec<NodeId> = ids.iter().map(|s| NodeId::intern(s.trim())).collect();
    if let Some(missing) = wanted.iter().find(|id| !store.contains(**id)) {
        bail!("no node '{missing}'");
    }
    store.select_nodes(wanted);
    Ok(())
}

async fn open(store: &mut BoardStore, persistence: &FsPersistence, doc: &str) -> Result<()> {
    if load_document(store, persistence, doc).await {
        Ok(())
    } else {
        Err(anyhow!(store.error().unwrap_or("load failed").to_string()))
    }
}

fn print_info(store: &BoardStore) {
    let snapshot = store.snapshot();
    println!("id:       {}", snapshot.id);
    println!("name:     {}", snapshot.name);
    println!("canvas:   {}x{}", snapshot.canvas.width, snapshot.canvas.height);
    println!(
        "viewport: zoom {:.2}, pan ({:.1}, {:.1})",
        snapshot.viewport.zoom, snapshot.viewport.pan.x, snapshot.viewport.pan.y
    );
    println!(
        "flags:    grid {}, snap {}",
        snapshot.flags.show_grid, snapshot.flags.snap_to_grid
    );

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for node in store.nodes() {
        *counts.entry(node.node_type().id_prefix()).or_default() += 1;
    }
    let summary: Vec<String> = counts.iter().map(|(k, v)| format!("{v} {k}")).collect();
    println!("nodes:    {} ({})", store.nodes().len(), summary.join(", "));

    let duplicates = snapshot.duplicate_ids();
    if !duplicates.is_empty() {
        println!("warning:  duplicate ids {duplicates:?}");
    }
}
