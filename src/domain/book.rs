//! Books, reading notes and the joined entry the rest of the crate consumes.
//!
//! A `Book` never surfaces on its own: every read goes through the
//! Book ⋈ Note inner join and yields a `BookEntry`.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Store-assigned book identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(i64);

impl BookId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Open Library edition key whose cover image is known to exist (e.g. `OL7353617M`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoverId(String);

/// Cover image sizes served by the covers endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoverSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl CoverSize {
    fn suffix(self) -> &'static str {
        match self {
            CoverSize::Small => "S",
            CoverSize::Medium => "M",
            CoverSize::Large => "L",
        }
    }
}

impl CoverId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Image URL for this edition on the covers endpoint
    pub fn image_url(&self, covers_url: &str, size: CoverSize) -> String {
        format!(
            "{}/b/olid/{}-{}.jpg",
            covers_url.trim_end_matches('/'),
            self.0,
            size.suffix()
        )
    }
}

impl fmt::Display for CoverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Catalog entry for a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub description: String,

    /// None when no cover could be resolved at creation time
    pub cover: Option<CoverId>,
}

/// Reader-authored annotation for a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub book_id: BookId,
    pub read_date: NaiveDate,
    pub rating: i64,
    pub notes: String,
}

/// One row of the Book ⋈ Note join
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookEntry {
    pub book: Book,
    pub note: Note,
}

impl BookEntry {
    pub fn id(&self) -> BookId {
        self.book.id
    }
}

/// Fields submitted when adding a book
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub description: String,
    pub read_date: NaiveDate,
    pub rating: i64,
    pub notes: String,
}

/// Partial update for an existing entry.
///
/// Merging is a field-level coalesce: a submitted value replaces the stored
/// one only when it is present and non-empty (non-zero for `rating`).
/// Submitting an unchanged or blank edit never erases data, which also means
/// a field cannot be cleared through an edit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookEdit {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub read_date: Option<NaiveDate>,
    pub rating: Option<i64>,
    pub notes: Option<String>,
}

impl BookEdit {
    /// True when no field would change a stored value
    pub fn is_empty(&self) -> bool {
        [
            &self.title,
            &self.author,
            &self.genre,
            &self.description,
            &self.notes,
        ]
        .iter()
        .all(|field| submitted_text(field).is_none())
            && self.read_date.is_none()
            && submitted_rating(self.rating).is_none()
    }

    /// Apply this edit over `current`, keeping stored values for fields that
    /// were not submitted. Identity and cover are never touched.
    pub fn merge_onto(&self, current: &BookEntry) -> BookEntry {
        let book = &current.book;
        let note = &current.note;

        BookEntry {
            book: Book {
                id: book.id,
                title: coalesce(&self.title, &book.title),
                author: coalesce(&self.author, &book.author),
                genre: coalesce(&self.genre, &book.genre),
                description: coalesce(&self.description, &book.description),
                cover: book.cover.clone(),
            },
            note: Note {
                book_id: book.id,
                read_date: self.read_date.unwrap_or(note.read_date),
                rating: submitted_rating(self.rating).unwrap_or(note.rating),
                notes: coalesce(&self.notes, &note.notes),
            },
        }
    }
}

fn submitted_text(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn submitted_rating(value: Option<i64>) -> Option<i64> {
    value.filter(|v| *v != 0)
}

fn coalesce(submitted: &Option<String>, stored: &str) -> String {
    submitted_text(submitted).unwrap_or(stored).to_string()
}

/// Ordering for multi-row listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListOrder {
    /// Insertion order (book id ascending)
    #[default]
    Added,

    /// Most recently read first
    Recency,

    /// Lowest rating first
    Rating,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> BookEntry {
        BookEntry {
            book: Book {
                id: BookId::new(7),
                title: "The Hobbit".to_string(),
                author: "J.R.R. Tolkien".to_string(),
                genre: "Fantasy".to_string(),
                description: "There and back again".to_string(),
                cover: Some(CoverId::new("OL123M")),
            },
            note: Note {
                book_id: BookId::new(7),
                read_date: NaiveDate::from_ymd_opt(2023, 5, 1).unwrap(),
                rating: 8,
                notes: "Loved the riddles".to_string(),
            },
        }
    }

    #[test]
    fn test_empty_edit_keeps_everything() {
        let edit = BookEdit::default();
        assert!(edit.is_empty());
        assert_eq!(edit.merge_onto(&stored()), stored());
    }

    #[test]
    fn test_rating_only_edit() {
        let edit = BookEdit {
            rating: Some(3),
            ..Default::default()
        };
        assert!(!edit.is_empty());

        let merged = edit.merge_onto(&stored());
        assert_eq!(merged.note.rating, 3);

        let mut expected = stored();
        expected.note.rating = 3;
        assert_eq!(merged, expected);
    }

    #[test]
    fn test_blank_values_do_not_clear() {
        let edit = BookEdit {
            title: Some(String::new()),
            notes: Some(String::new()),
            rating: Some(0),
            ..Default::default()
        };
        assert!(edit.is_empty());
        assert_eq!(edit.merge_onto(&stored()), stored());
    }

    #[test]
    fn test_whitespace_counts_as_submitted() {
        let edit = BookEdit {
            genre: Some(" ".to_string()),
            ..Default::default()
        };
        assert_eq!(edit.merge_onto(&stored()).book.genre, " ");
    }

    #[test]
    fn test_merge_preserves_identity_and_cover() {
        let edit = BookEdit {
            title: Some("The Lord of the Rings".to_string()),
            read_date: NaiveDate::from_ymd_opt(2024, 1, 2),
            ..Default::default()
        };
        let merged = edit.merge_onto(&stored());

        assert_eq!(merged.id(), BookId::new(7));
        assert_eq!(merged.note.book_id, BookId::new(7));
        assert_eq!(merged.book.cover, Some(CoverId::new("OL123M")));
        assert_eq!(merged.book.title, "The Lord of the Rings");
        assert_eq!(merged.book.author, "J.R.R. Tolkien");
        assert_eq!(merged.note.read_date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn test_cover_image_url() {
        let cover = CoverId::new("OL7353617M");
        assert_eq!(
            cover.image_url("https://covers.openlibrary.org/", CoverSize::Medium),
            "https://covers.openlibrary.org/b/olid/OL7353617M-M.jpg"
        );
        assert_eq!(
            cover.image_url("http://localhost:9000", CoverSize::Large),
            "http://localhost:9000/b/olid/OL7353617M-L.jpg"
        );
    }
}
