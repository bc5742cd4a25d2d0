//! SQLite book store.
//!
//! The free functions are the single-statement contract (query, insert,
//! update, delete) and run against any `Connection` or `Transaction`.
//! `BookStore` composes them into units of work, each inside one
//! transaction, and runs them off the async executor.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::functions::FunctionFlags;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use tracing::{debug, info};

use super::schema::apply_migrations;
use super::{StoreError, StoreResult};
use crate::domain::{Book, BookEntry, BookId, CoverId, ListOrder, NewBook, Note};

const SELECT_ENTRIES: &str = "SELECT
        books.id,
        books.title,
        books.author,
        books.genre,
        books.description,
        books.cover_id,
        notes.read_date,
        notes.rating,
        notes.notes
     FROM books
     JOIN notes ON books.id = notes.book_id";

/// Row selection for joined reads
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EntryFilter {
    /// Every entry
    #[default]
    All,

    /// A single book
    Id(BookId),

    /// Case-insensitive substring over title, author or genre
    Search(String),
}

/// SQL function folding text with the same Unicode rule as `like_pattern`.
/// SQLite's built-in `lower()` only folds ASCII.
const FOLD_CASE_FN: &str = "fold_case";

/// Escape LIKE wildcards so the query is matched literally
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for ch in query.to_lowercase().chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<BookEntry> {
    let id = BookId::new(row.get(0)?);
    let cover: Option<String> = row.get(5)?;

    Ok(BookEntry {
        book: Book {
            id,
            title: row.get(1)?,
            author: row.get(2)?,
            genre: row.get(3)?,
            description: row.get(4)?,
            cover: cover.filter(|c| !c.is_empty()).map(CoverId::new),
        },
        note: Note {
            book_id: id,
            read_date: row.get(6)?,
            rating: row.get(7)?,
            notes: row.get(8)?,
        },
    })
}

/// Joined Book ⋈ Note rows matching `filter`, in `order`
pub fn query_entries(
    conn: &Connection,
    filter: &EntryFilter,
    order: ListOrder,
) -> StoreResult<Vec<BookEntry>> {
    let (clause, args): (&str, Vec<Value>) = match filter {
        EntryFilter::All => ("", Vec::new()),
        EntryFilter::Id(id) => (" WHERE books.id = ?1", vec![Value::Integer(id.get())]),
        EntryFilter::Search(query) => (
            " WHERE fold_case(books.title) LIKE '%' || ?1 || '%' ESCAPE '\\'
                OR fold_case(books.author) LIKE '%' || ?1 || '%' ESCAPE '\\'
                OR fold_case(books.genre) LIKE '%' || ?1 || '%' ESCAPE '\\'",
            vec![Value::Text(like_pattern(query))],
        ),
    };

    let order_by = match order {
        ListOrder::Added => " ORDER BY books.id ASC",
        ListOrder::Recency => " ORDER BY notes.read_date DESC, books.id ASC",
        ListOrder::Rating => " ORDER BY notes.rating ASC, books.id ASC",
    };

    let sql = format!("{SELECT_ENTRIES}{clause}{order_by};");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(args), entry_from_row)?;

    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Insert a book row and return its assigned id
pub fn insert_book(conn: &Connection, book: &NewBook, cover: Option<&CoverId>) -> StoreResult<BookId> {
    let id = conn.query_row(
        "INSERT INTO books (title, author, genre, description, cover_id)
         VALUES (?1, ?2, ?3, ?4, ?5)
         RETURNING id;",
        params![
            book.title,
            book.author,
            book.genre,
            book.description,
            cover.map(CoverId::as_str),
        ],
        |row| row.get(0),
    )?;

    Ok(BookId::new(id))
}

/// Insert the note belonging to `book_id`
pub fn insert_note(conn: &Connection, book_id: BookId, book: &NewBook) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO notes (read_date, rating, notes, book_id)
         VALUES (?1, ?2, ?3, ?4);",
        params![book.read_date, book.rating, book.notes, book_id.get()],
    )?;
    Ok(())
}

/// Overwrite the editable book fields. Returns rows changed.
pub fn update_book(conn: &Connection, book: &Book) -> StoreResult<usize> {
    Ok(conn.execute(
        "UPDATE books
         SET title = ?1, author = ?2, genre = ?3, description = ?4
         WHERE id = ?5;",
        params![book.title, book.author, book.genre, book.description, book.id.get()],
    )?)
}

/// Overwrite the note fields for `note.book_id`. Returns rows changed.
pub fn update_note(conn: &Connection, note: &Note) -> StoreResult<usize> {
    Ok(conn.execute(
        "UPDATE notes
         SET read_date = ?1, rating = ?2, notes = ?3
         WHERE book_id = ?4;",
        params![note.read_date, note.rating, note.notes, note.book_id.get()],
    )?)
}

/// Delete the notes of a book. Returns rows removed.
pub fn delete_note(conn: &Connection, book_id: BookId) -> StoreResult<usize> {
    Ok(conn.execute("DELETE FROM notes WHERE book_id = ?1;", [book_id.get()])?)
}

/// Delete a book row. Its notes must already be gone.
pub fn delete_book(conn: &Connection, id: BookId) -> StoreResult<usize> {
    Ok(conn.execute("DELETE FROM books WHERE id = ?1;", [id.get()])?)
}

/// Handle to the catalog database.
///
/// Constructed explicitly at startup and closed at shutdown; clones share
/// one connection.
#[derive(Clone)]
pub struct BookStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl BookStore {
    /// Open (or create) the database file and apply migrations
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let db_path = path.clone();

        let conn = tokio::task::spawn_blocking(move || -> StoreResult<Connection> {
            if let Some(parent) = db_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut conn = Connection::open(&db_path)?;
            bootstrap(&mut conn)?;
            Ok(conn)
        })
        .await??;

        info!(path = %path.display(), "Opened book store");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path),
        })
    }

    /// Open a throwaway in-memory database
    pub async fn open_in_memory() -> StoreResult<Self> {
        let conn = tokio::task::spawn_blocking(|| -> StoreResult<Connection> {
            let mut conn = Connection::open_in_memory()?;
            bootstrap(&mut conn)?;
            Ok(conn)
        })
        .await??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    /// Database file path (None for in-memory stores)
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Close the connection.
    ///
    /// When other clones are still alive the connection stays open until
    /// the last one is dropped.
    pub fn close(self) -> StoreResult<()> {
        match Arc::try_unwrap(self.conn) {
            Ok(mutex) => {
                let conn = mutex.into_inner().map_err(|_| StoreError::Poisoned)?;
                conn.close().map_err(|(_, e)| StoreError::Sqlite(e))?;
                debug!("Closed book store");
                Ok(())
            }
            Err(_) => {
                debug!("Book store still shared, deferring close");
                Ok(())
            }
        }
    }

    /// Run `f` against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&mut *guard)
        })
        .await?
    }

    /// Joined entries matching `filter`, in `order`
    pub async fn query(&self, filter: EntryFilter, order: ListOrder) -> StoreResult<Vec<BookEntry>> {
        self.with_conn(move |conn| query_entries(conn, &filter, order))
            .await
    }

    /// One joined entry
    pub async fn get(&self, id: BookId) -> StoreResult<Option<BookEntry>> {
        let mut entries = self.query(EntryFilter::Id(id), ListOrder::Added).await?;
        Ok(if entries.is_empty() {
            None
        } else {
            Some(entries.swap_remove(0))
        })
    }

    /// Insert a book and its note as one unit of work
    pub async fn create(&self, book: NewBook, cover: Option<CoverId>) -> StoreResult<BookId> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let id = insert_book(&tx, &book, cover.as_ref())?;
            insert_note(&tx, id, &book)?;
            tx.commit()?;
            Ok(id)
        })
        .await
    }

    /// Read the entry, compute its replacement with `merge`, and write the
    /// book and note fields back, all in one transaction.
    ///
    /// Returns None (and writes nothing) when the book does not exist.
    pub async fn edit<F>(&self, id: BookId, merge: F) -> StoreResult<Option<BookEntry>>
    where
        F: FnOnce(&BookEntry) -> BookEntry + Send + 'static,
    {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            let current = query_entries(&tx, &EntryFilter::Id(id), ListOrder::Added)?
                .into_iter()
                .next();
            let Some(current) = current else {
                return Ok(None);
            };

            let mut updated = merge(&current);
            // Writes always target the row that was read
            updated.book.id = id;
            updated.note.book_id = id;

            update_book(&tx, &updated.book)?;
            update_note(&tx, &updated.note)?;
            tx.commit()?;

            Ok(Some(updated))
        })
        .await
    }

    /// Delete a book and its notes, notes first. Returns false when the
    /// book did not exist.
    pub async fn delete(&self, id: BookId) -> StoreResult<bool> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let notes = delete_note(&tx, id)?;
            let books = delete_book(&tx, id)?;
            tx.commit()?;

            debug!(%id, notes, books, "Deleted book");
            Ok(books > 0)
        })
        .await
    }

    /// Number of books, including any without a note
    pub async fn count_books(&self) -> StoreResult<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM books;", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }
}

fn bootstrap(conn: &mut Connection) -> StoreResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.create_scalar_function(
        FOLD_CASE_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )?;
    conn.busy_timeout(Duration::from_secs(5))?;
    apply_migrations(conn)?;
    Ok(())
}
