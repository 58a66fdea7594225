use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub available: bool,
    /// Holder's user id; `None` is stored as an empty field.
    pub borrower_id: Option<String>,
}

impl Book {
    pub fn new(title: impl Into<String>, author: impl Into<String>, isbn: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            isbn: isbn.into(),
            available: true,
            borrower_id: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub(crate) fn check_out(&mut self, user_id: &str) {
        self.available = false;
        self.borrower_id = Some(user_id.to_string());
    }

    pub(crate) fn check_in(&mut self) {
        self.available = true;
        self.borrower_id = None;
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} by {} ({})", self.title, self.author, self.isbn)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    /// ISBNs in borrow order.
    pub borrowed_isbns: Vec<String>,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            borrowed_isbns: Vec::new(),
        }
    }

    pub(crate) fn hold(&mut self, isbn: &str) {
        self.borrowed_isbns.push(isbn.to_string());
    }

    pub(crate) fn release(&mut self, isbn: &str) {
        self.borrowed_isbns.retain(|held| held != isbn);
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.id, self.name)
    }
}

/// Who currently holds a book, as shown in the catalog listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Holder {
    Available,
    BorrowedBy { id: String, name: String },
    /// The recorded borrower no longer exists in the roster.
    UnknownUser,
}

impl fmt::Display for Holder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Holder::Available => write!(f, "Available"),
            Holder::BorrowedBy { id, name } => write!(f, "Borrowed by: {} ({})", name, id),
            Holder::UnknownUser => write!(f, "Borrowed (Unknown User)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookListing {
    pub position: usize,
    pub book: Book,
    pub holder: Holder,
}

impl fmt::Display for BookListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {} - {}", self.position, self.book, self.holder)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserListing {
    pub position: usize,
    pub id: String,
    pub name: String,
    /// Titles of held books that still resolve in the catalog.
    pub held_titles: Vec<String>,
}

impl fmt::Display for UserListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} | Borrowed: ", self.id, self.name)?;
        if self.held_titles.is_empty() {
            return write!(f, "No book's borrowed");
        }
        for title in &self.held_titles {
            write!(f, "[{}] ", title)?;
        }
        Ok(())
    }
}

/// One entry of a user's own borrowed list; `position` counts entries whose
/// ISBN no longer resolves, so it always matches the return selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowedListing {
    pub position: usize,
    pub book: Book,
}

impl fmt::Display for BorrowedListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.position, self.book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_listing_display() {
        let mut book = Book::new("Dune", "Herbert", "77");
        let listing = BookListing {
            position: 1,
            book: book.clone(),
            holder: Holder::Available,
        };
        assert_eq!(listing.to_string(), "1. Dune by Herbert (77) - Available");

        book.check_out("U1");
        let listing = BookListing {
            position: 1,
            book,
            holder: Holder::BorrowedBy {
                id: "U1".to_string(),
                name: "Alice".to_string(),
            },
        };
        assert_eq!(listing.to_string(), "1. Dune by Herbert (77) - Borrowed by: Alice (U1)");
    }

    #[test]
    fn test_user_listing_display() {
        let listing = UserListing {
            position: 1,
            id: "U1".to_string(),
            name: "Alice".to_string(),
            held_titles: vec![],
        };
        assert_eq!(listing.to_string(), "U1: Alice | Borrowed: No book's borrowed");

        let listing = UserListing {
            held_titles: vec!["Dune".to_string(), "Venom".to_string()],
            ..listing
        };
        assert_eq!(listing.to_string(), "U1: Alice | Borrowed: [Dune] [Venom] ");
    }

    #[test]
    fn test_release_removes_isbn() {
        let mut user = User::new("U1", "Alice");
        user.hold("01");
        user.hold("02");
        user.release("01");
        assert_eq!(user.borrowed_isbns, vec!["02".to_string()]);
    }
}
