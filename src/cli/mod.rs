//! Command-line interface for bookshelf.
//!
//! Provides commands for adding, editing, deleting, listing, sorting and
//! searching books in the catalog.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};

use crate::adapters::OpenLibraryClient;
use crate::config::{self, ResolvedConfig};
use crate::core::{CatalogService, CoverResolver};
use crate::domain::{BookEdit, BookEntry, BookId, CoverSize, ListOrder, NewBook};
use crate::store::BookStore;

/// bookshelf - Personal book catalog
#[derive(Parser, Debug)]
#[command(name = "bookshelf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List books in the catalog
    List {
        /// Sort order
        #[arg(short, long, value_enum, default_value = "added")]
        sort: SortBy,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Add a book (looks up a cover on Open Library)
    Add {
        /// Book title
        #[arg(long)]
        title: String,

        /// Author name
        #[arg(long)]
        author: String,

        /// Genre
        #[arg(long, default_value = "")]
        genre: String,

        /// Date read (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Rating
        #[arg(long)]
        rating: i64,

        /// Short description
        #[arg(long, default_value = "")]
        description: String,

        /// Reading notes
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Show one book with its notes
    Show {
        /// Book ID
        id: i64,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Edit a book; omitted or empty fields keep their current value
    Edit {
        /// Book ID
        id: i64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        author: Option<String>,

        #[arg(long)]
        genre: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Date read (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        rating: Option<i64>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete a book and its notes
    Delete {
        /// Book ID
        id: i64,
    },

    /// Search titles, authors and genres
    Search {
        /// Search query (case-insensitive substring)
        query: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show resolved configuration (debug)
    Config,
}

/// Listing order for CLI (maps to ListOrder)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortBy {
    /// Order added
    Added,

    /// Most recently read first
    Recency,

    /// Lowest rating first
    Rating,
}

impl From<SortBy> for ListOrder {
    fn from(s: SortBy) -> Self {
        match s {
            SortBy::Added => ListOrder::Added,
            SortBy::Recency => ListOrder::Recency,
            SortBy::Rating => ListOrder::Rating,
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let cfg = config::config()?;

        if let Commands::Config = self.command {
            show_config(cfg);
            return Ok(());
        }

        let store = BookStore::open(&cfg.database)
            .await
            .with_context(|| format!("Failed to open database: {}", cfg.database.display()))?;
        let lookup = OpenLibraryClient::new(cfg.lookup.client_config())
            .context("Failed to build Open Library client")?;
        let resolver = CoverResolver::with_policy(Arc::new(lookup), cfg.lookup.resolver_policy());
        let service = CatalogService::new(store.clone(), resolver);

        let result = run_command(&service, cfg, self.command).await;

        drop(service);
        store.close().context("Failed to close database")?;
        result
    }
}

async fn run_command(service: &CatalogService, cfg: &ResolvedConfig, command: Commands) -> Result<()> {
    match command {
        Commands::List { sort, json } => {
            let entries = service.list(sort.into()).await?;
            print_entries(&entries, json)
        }
        Commands::Add {
            title,
            author,
            genre,
            date,
            rating,
            description,
            notes,
        } => {
            let book = NewBook {
                title,
                author,
                genre,
                description,
                read_date: date.unwrap_or_else(|| Local::now().date_naive()),
                rating,
                notes,
            };
            let id = service.add_book(book).await?;
            let entry = service.get_book(id).await?;

            println!("Added book {}: {}", id, entry.book.title);
            match &entry.book.cover {
                Some(cover) => println!(
                    "Cover: {}",
                    cover.image_url(&cfg.lookup.covers_url, CoverSize::Medium)
                ),
                None => println!("Cover: (none found)"),
            }
            Ok(())
        }
        Commands::Show { id, json } => {
            let entry = service.get_book(BookId::new(id)).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entry)?);
            } else {
                print_entry(&entry, &cfg.lookup.covers_url);
            }
            Ok(())
        }
        Commands::Edit {
            id,
            title,
            author,
            genre,
            description,
            date,
            rating,
            notes,
        } => {
            let edit = BookEdit {
                title,
                author,
                genre,
                description,
                read_date: date,
                rating,
                notes,
            };
            if edit.is_empty() {
                println!("Nothing to change; stored values are kept.");
            }
            let entry = service.edit_book(BookId::new(id), edit).await?;
            println!("Updated book {}: {}", entry.id(), entry.book.title);
            Ok(())
        }
        Commands::Delete { id } => {
            service.delete_book(BookId::new(id)).await?;
            println!("Deleted book {}", id);
            Ok(())
        }
        Commands::Search { query, json } => {
            let entries = service.search(&query).await?;
            if entries.is_empty() && !json {
                println!("No results found for: {}", query);
                return Ok(());
            }
            if !json {
                println!("Found {} result(s) for \"{}\":\n", entries.len(), query);
            }
            print_entries(&entries, json)
        }
        Commands::Config => {
            show_config(cfg);
            Ok(())
        }
    }
}

/// Truncate to `max` characters, marking the cut with "..."
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let kept: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}

fn print_entries(entries: &[BookEntry], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No books yet. Add one with: bookshelf add --title <TITLE> --author <AUTHOR> --rating <N>");
        return Ok(());
    }

    println!(
        "{:<6} {:<6} {:<10} {:<40} {:<24} {:<16}",
        "ID", "RATING", "READ", "TITLE", "AUTHOR", "GENRE"
    );
    println!("{}", "-".repeat(107));

    for entry in entries {
        println!(
            "{:<6} {:<6} {:<10} {:<40} {:<24} {:<16}",
            entry.id().to_string(),
            entry.note.rating,
            entry.note.read_date.to_string(),
            truncate(&entry.book.title, 40),
            truncate(&entry.book.author, 24),
            truncate(&entry.book.genre, 16)
        );
    }

    Ok(())
}

fn print_entry(entry: &BookEntry, covers_url: &str) {
    println!("{} ({})", entry.book.title, entry.id());
    println!("  Author:      {}", entry.book.author);
    println!("  Genre:       {}", entry.book.genre);
    println!("  Read:        {}", entry.note.read_date);
    println!("  Rating:      {}", entry.note.rating);
    println!(
        "  Cover:       {}",
        entry
            .book
            .cover
            .as_ref()
            .map(|c| c.image_url(covers_url, CoverSize::Large))
            .unwrap_or_else(|| "(none)".to_string())
    );
    if !entry.book.description.is_empty() {
        println!();
        println!("{}", entry.book.description);
    }
    if !entry.note.notes.is_empty() {
        println!();
        println!("Notes:");
        println!("{}", entry.note.notes);
    }
}

fn show_config(cfg: &ResolvedConfig) {
    println!("Bookshelf Configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:     {}", cfg.home.display());
    println!("  Database: {}", cfg.database.display());
    println!();
    println!("Lookup:");
    println!("  Search URL:        {}", cfg.lookup.search_url);
    println!("  Covers URL:        {}", cfg.lookup.covers_url);
    println!("  Timeout:           {}s", cfg.lookup.timeout_seconds);
    println!("  Probe concurrency: {}", cfg.lookup.probe_concurrency);
    println!("  Strict search:     {}", cfg.lookup.strict_search);
}
