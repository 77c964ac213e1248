//! Bulletin - command line admin for the official bulletin
//!
//! Reads are open; anything that changes documents signs in as `--user`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bulletin::app::{self, AdminSession};
use bulletin::core::auth::UserProfile;
use bulletin::core::backup;
use bulletin::core::config::AppConfig;
use bulletin::core::document::{parse_tags, Document, DocumentDraft};
use bulletin::core::store::{DocumentFilter, DocumentStore};
use bulletin::core::sync::{self, PublishOutcome};
use bulletin::core::time;
use bulletin::render::{self, outline};

#[derive(Parser)]
#[command(version, about = "Bulletin - official bulletin store and renderer", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Email of the acting admin
    #[arg(long, global = true, env = "BULLETIN_USER")]
    user: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List documents, newest first, grouped by organism
    List {
        #[arg(long)]
        organism: Option<String>,
        #[arg(long = "type")]
        doc_type: Option<String>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Render a document as plain text
    Show { id: String },
    /// Element outline of a structured document
    Outline { id: String },
    /// Create a document
    Create {
        #[command(flatten)]
        fields: DraftArgs,
        /// Description of the change, stored in the history
        #[arg(long, default_value = "Nuevo documento")]
        changes: String,
    },
    /// Update a document; omitted fields keep their stored value
    Update {
        id: String,
        #[command(flatten)]
        fields: DraftArgs,
        #[arg(long)]
        changes: String,
    },
    /// Delete a document
    Delete {
        id: String,
        #[arg(long, default_value = "Documento eliminado")]
        changes: String,
    },
    /// Full version history
    History,
    /// Versions that contain a document
    Versions { id: String },
    /// Preview a version, or publish it with --apply
    Restore {
        version_id: String,
        #[arg(long)]
        apply: bool,
        #[arg(long)]
        changes: Option<String>,
    },
    /// Write a full backup
    Export,
    /// Replace documents and history from a backup
    Import {
        path: PathBuf,
        #[arg(long, default_value = "Backup importado")]
        changes: String,
    },
    /// List backups, newest first
    Backups,
    /// Pretty-print a JSON file
    Format {
        path: PathBuf,
        /// Rewrite the file in place
        #[arg(long)]
        write: bool,
    },
    /// Document counts by type
    Stats,
}

#[derive(Args)]
struct DraftArgs {
    #[arg(long)]
    organism: Option<String>,
    #[arg(long = "type")]
    doc_type: Option<String>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    reference: Option<String>,
    /// Publication date, YYYY-MM-DD
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long)]
    description: Option<String>,
    /// Flat text body
    #[arg(long, conflicts_with = "structure")]
    content: Option<PathBuf>,
    /// JSON array of structure elements
    #[arg(long)]
    structure: Option<PathBuf>,
    /// Comma-separated
    #[arg(long)]
    tags: Option<String>,
}

impl DraftArgs {
    fn apply(self, mut draft: DocumentDraft) -> Result<DocumentDraft> {
        if let Some(organism) = self.organism {
            draft.organism = organism;
        }
        if let Some(doc_type) = self.doc_type {
            draft.doc_type = doc_type;
        }
        if let Some(title) = self.title {
            draft.title = title;
        }
        if let Some(reference) = self.reference {
            draft.reference = reference;
        }
        if let Some(date) = self.date {
            draft.date = date.and_time(NaiveTime::MIN).and_utc().timestamp();
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
        if let Some(path) = self.content {
            draft.content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read content: {}", path.display()))?;
            draft.structure = None;
        }
        if let Some(path) = self.structure {
            draft.structure = Some(
                std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read structure: {}", path.display()))?,
            );
        }
        if let Some(tags) = self.tags {
            draft.tags = parse_tags(&tags);
        }
        Ok(draft)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing_subscriber::filter::LevelFilter::DEBUG
    } else {
        tracing_subscriber::filter::LevelFilter::INFO
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(level)
        .init();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = Some(dir);
    }

    match cli.command {
        Commands::List {
            organism,
            doc_type,
            year,
            search,
            category,
        } => {
            let store = load(&config)?;
            let mut filter = DocumentFilter::default();
            if let Some(organism) = organism {
                filter = filter.organism(organism.parse()?);
            }
            if let Some(doc_type) = doc_type {
                filter = filter.doc_type(doc_type.parse()?);
            }
            if let Some(year) = year {
                filter = filter.year(year);
            }
            if let Some(search) = search {
                filter = filter.search(search);
            }
            if let Some(category) = category {
                filter = filter.category(category);
            }

            for (organism, docs) in store.grouped_by_organism(&filter) {
                println!("{}", organism.label());
                for doc in docs {
                    println!("  {}", summary_line(doc));
                }
            }
        }
        Commands::Show { id } => {
            let store = load(&config)?;
            let doc = find(&store, &id)?;
            println!("{}", doc.title);
            println!(
                "{} · {} · {}",
                doc.organism.label(),
                doc.doc_type.label(),
                time::long_date(doc.date)
            );
            if let Some(reference) = &doc.reference {
                println!("{}", reference);
            }
            println!();
            println!("{}", render::to_plain_text(&render::render(doc)));
        }
        Commands::Outline { id } => {
            let store = load(&config)?;
            let doc = find(&store, &id)?;
            if !doc.has_structure() {
                println!("{} has no structure", doc.id);
            }
            for (index, entry) in outline::outline(doc).iter().enumerate() {
                let numero = entry.numero.as_deref().unwrap_or("-");
                println!("{:>3}. {:<12} {:<6} {}", index + 1, entry.type_name, numero, entry.preview);
            }
        }
        Commands::Create { fields, changes } => {
            let mut session = sign_in(config, cli.user)?;
            let draft = fields.apply(DocumentDraft {
                date: time::now(),
                ..Default::default()
            })?;
            let (doc, outcome) = session.save_document(None, &draft, &changes)?;
            println!("Created {}", doc.id);
            report(outcome);
        }
        Commands::Update {
            id,
            fields,
            changes,
        } => {
            let mut session = sign_in(config, cli.user)?;
            let current = find(session.store(), &id)?;
            let draft = fields.apply(DocumentDraft::from_document(current))?;
            let (doc, outcome) = session.save_document(Some(&id), &draft, &changes)?;
            println!("Updated {} to v{}", doc.id, doc.version);
            report(outcome);
        }
        Commands::Delete { id, changes } => {
            let mut session = sign_in(config, cli.user)?;
            let (doc, outcome) = session.delete_document(&id, &changes)?;
            println!("Deleted {} ({})", doc.id, doc.title);
            report(outcome);
        }
        Commands::History => {
            let store = load(&config)?;
            print!("{}", store.ledger().history_report());
        }
        Commands::Versions { id } => {
            let store = load(&config)?;
            for version in store.ledger().list_for(&id) {
                println!(
                    "{}  {}  v{}  {} - {}",
                    version.record.id,
                    time::long_date(version.record.timestamp),
                    version.document.version,
                    version.record.author,
                    version.record.changes
                );
            }
        }
        Commands::Restore {
            version_id,
            apply,
            changes,
        } => {
            if apply {
                let mut session = sign_in(config, cli.user)?;
                let changes = changes.unwrap_or_else(|| format!("Restaurada versión {}", version_id));
                let outcome = session.restore_version(&version_id, &changes)?;
                println!("Restored {}", version_id);
                report(outcome);
            } else {
                let store = load(&config)?;
                let snapshot = store.ledger().restore(&version_id)?;
                println!("{}", serde_json::to_string_pretty(snapshot)?);
            }
        }
        Commands::Export => {
            let session = sign_in(config, cli.user)?;
            let path = session.export_backup()?;
            println!("{}", path.display());
        }
        Commands::Import { path, changes } => {
            let mut session = sign_in(config, cli.user)?;
            let outcome = session.import_backup(&path, &changes)?;
            println!("Imported {}", path.display());
            report(outcome);
        }
        Commands::Backups => {
            for path in backup::find_backups(&config.backup_dir()) {
                println!("{}", path.display());
            }
        }
        Commands::Format { path, write } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read: {}", path.display()))?;
            let formatted = app::format_json(&text)?;
            if write {
                std::fs::write(&path, &formatted)
                    .with_context(|| format!("Failed to write: {}", path.display()))?;
                tracing::info!("Formatted {}", path.display());
            } else {
                println!("{}", formatted);
            }
        }
        Commands::Stats => {
            let store = load(&config)?;
            let stats = store.stats();
            println!("Total: {}", stats.total);
            for (doc_type, count) in stats.by_type {
                println!("{}: {}", doc_type.label(), count);
            }
            let years: Vec<String> = store.years().iter().map(i32::to_string).collect();
            if !years.is_empty() {
                println!("Años: {}", years.join(", "));
            }
        }
    }

    Ok(())
}

fn load(config: &AppConfig) -> Result<DocumentStore> {
    let backend = config.open_backend();
    sync::load_store(backend.as_ref(), config.ledger_capacity)
        .with_context(|| format!("Failed to load documents from {}", backend.name()))
}

fn sign_in(config: AppConfig, user: Option<String>) -> Result<AdminSession> {
    let email = user.context("An admin email is required (--user or BULLETIN_USER)")?;
    Ok(AdminSession::open(config, UserProfile::new(email))?)
}

fn find<'a>(store: &'a DocumentStore, id: &str) -> Result<&'a Document> {
    store
        .get(id)
        .with_context(|| format!("Document not found: {}", id))
}

fn summary_line(doc: &Document) -> String {
    let mut line = format!(
        "{}  {}  [{}]  {}",
        doc.id,
        doc.doc_type.label(),
        doc.category(),
        doc.title
    );
    if let Some(reference) = &doc.reference {
        line.push_str(&format!(" ({})", reference));
    }
    line
}

fn report(outcome: PublishOutcome) {
    match outcome {
        PublishOutcome::Synced => println!("Published"),
        PublishOutcome::HistoryKept => {
            println!("Published data.json");
            println!("versions.json could not be read and was left untouched");
        }
        PublishOutcome::ManualSave {
            reason,
            inconsistent,
            files,
        } => {
            println!("Publish failed: {}", reason);
            if inconsistent {
                println!("data.json was published but versions.json was not");
            }
            println!("Saved for manual upload:");
            for file in files {
                println!("  {}", file.display());
            }
        }
    }
}
