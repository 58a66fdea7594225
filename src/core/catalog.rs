//! In-memory catalog of books and the patron roster.
//!
//! Both collections are insertion-ordered maps so that 1-based display
//! positions stay consistent between listings while lookups go by key.
//! All mutations are pure in-memory changes; persisting them is the
//! caller's job (see [`crate::core::library::LibraryService`]).

use crate::domain::model::{Book, BookListing, BorrowedListing, Holder, User, UserListing};
use crate::utils::error::{LibraryError, Result};
use crate::utils::validation::{validate_record_field, validate_record_key};
use indexmap::IndexMap;

/// Books seeded into an empty catalog: (title, author, isbn).
pub const DEMO_BOOKS: [(&str, &str, &str); 3] = [
    ("Venom", "Ruben Samuel Fleischer", "01"),
    ("Boruto: Two Blue Vortex", "Ukyō Kodachi", "02"),
    ("The Wild Robot", "Christopher Michael Sanders", "03"),
];

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    books: IndexMap<String, Book>,
    users: IndexMap<String, User>,
    strict_references: bool,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strict mode refuses removals that would leave a dangling reference.
    pub fn with_strict_references(mut self, strict: bool) -> Self {
        self.strict_references = strict;
        self
    }

    /// Rebuilds a catalog from persisted records, keeping their order.
    /// Later duplicates of a key replace earlier ones in place.
    pub fn from_records(books: Vec<Book>, users: Vec<User>) -> Self {
        let mut catalog = Self::new();
        for book in books {
            if catalog.books.insert(book.isbn.clone(), book).is_some() {
                tracing::warn!("Duplicate ISBN in stored books; keeping the last record");
            }
        }
        for user in users {
            if catalog.users.insert(user.id.clone(), user).is_some() {
                tracing::warn!("Duplicate user ID in stored users; keeping the last record");
            }
        }
        catalog
    }

    /// Adds the demo books when the catalog has none. Returns whether it did.
    pub fn seed_if_empty(&mut self) -> bool {
        if !self.books.is_empty() {
            return false;
        }
        for (title, author, isbn) in DEMO_BOOKS {
            self.books.insert(isbn.to_string(), Book::new(title, author, isbn));
        }
        tracing::info!("📚 Seeded empty catalog with {} demo books", DEMO_BOOKS.len());
        true
    }

    // ---- queries ----

    pub fn book_count(&self) -> usize {
        self.books.len()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn book_exists(&self, isbn: &str) -> bool {
        self.books.contains_key(isbn)
    }

    pub fn user_exists(&self, id: &str) -> bool {
        self.users.contains_key(id)
    }

    /// Case-sensitive exact match.
    pub fn user_name_exists(&self, name: &str) -> bool {
        self.users.values().any(|user| user.name == name)
    }

    pub fn find_book(&self, isbn: &str) -> Option<&Book> {
        self.books.get(isbn)
    }

    pub fn find_user(&self, id: &str) -> Option<&User> {
        self.users.get(id)
    }

    pub fn books(&self) -> impl Iterator<Item = &Book> {
        self.books.values()
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn book_at(&self, selector: usize) -> Result<&Book> {
        let index = to_index(selector, self.books.len())?;
        self.books
            .get_index(index)
            .map(|(_, book)| book)
            .ok_or(LibraryError::InvalidSelection { selector, len: self.books.len() })
    }

    pub fn user_at(&self, selector: usize) -> Result<&User> {
        let index = to_index(selector, self.users.len())?;
        self.users
            .get_index(index)
            .map(|(_, user)| user)
            .ok_or(LibraryError::InvalidSelection { selector, len: self.users.len() })
    }

    pub fn list_books(&self) -> Vec<BookListing> {
        self.books
            .values()
            .enumerate()
            .map(|(i, book)| BookListing {
                position: i + 1,
                book: book.clone(),
                holder: self.holder_of(book),
            })
            .collect()
    }

    pub fn list_users(&self) -> Vec<UserListing> {
        self.users
            .values()
            .enumerate()
            .map(|(i, user)| UserListing {
                position: i + 1,
                id: user.id.clone(),
                name: user.name.clone(),
                held_titles: user
                    .borrowed_isbns
                    .iter()
                    .filter_map(|isbn| self.books.get(isbn))
                    .map(|book| book.title.clone())
                    .collect(),
            })
            .collect()
    }

    pub fn list_borrowed(&self, user_id: &str) -> Result<Vec<BorrowedListing>> {
        let user = self.require_user(user_id)?;
        Ok(user
            .borrowed_isbns
            .iter()
            .enumerate()
            .filter_map(|(i, isbn)| match self.books.get(isbn) {
                Some(book) => Some(BorrowedListing {
                    position: i + 1,
                    book: book.clone(),
                }),
                None => {
                    tracing::warn!(user = %user.id, isbn = %isbn, "Borrowed ISBN no longer in catalog");
                    None
                }
            })
            .collect())
    }

    fn holder_of(&self, book: &Book) -> Holder {
        if book.available {
            return Holder::Available;
        }
        match book.borrower_id.as_deref().and_then(|id| self.users.get(id)) {
            Some(user) => Holder::BorrowedBy {
                id: user.id.clone(),
                name: user.name.clone(),
            },
            None => Holder::UnknownUser,
        }
    }

    fn require_user(&self, id: &str) -> Result<&User> {
        self.users
            .get(id)
            .ok_or_else(|| LibraryError::UserNotFound { id: id.to_string() })
    }

    // ---- mutations ----

    pub fn add_book(&mut self, title: &str, author: &str, isbn: &str) -> Result<&Book> {
        validate_record_field("title", title)?;
        validate_record_field("author", author)?;
        validate_record_key("isbn", isbn)?;
        if self.book_exists(isbn) {
            return Err(LibraryError::DuplicateIsbn { isbn: isbn.to_string() });
        }

        let entry = self.books.entry(isbn.to_string());
        let book = entry.or_insert_with(|| Book::new(title, author, isbn));
        tracing::info!(isbn = %book.isbn, "Added book \"{}\"", book.title);
        Ok(book)
    }

    /// Removes the book at a 1-based position. Outside strict mode a borrowed
    /// book is removed too and its borrower keeps the now dangling ISBN.
    pub fn remove_book(&mut self, selector: usize) -> Result<Book> {
        let book = self.book_at(selector)?;
        if self.strict_references && !book.available {
            return Err(LibraryError::BookOnLoan {
                isbn: book.isbn.clone(),
                borrower_id: book.borrower_id.clone().unwrap_or_default(),
            });
        }

        let index = selector - 1;
        let (_, removed) = self
            .books
            .shift_remove_index(index)
            .ok_or(LibraryError::InvalidSelection { selector, len: self.books.len() })?;
        if !removed.available {
            tracing::warn!(isbn = %removed.isbn, borrower = ?removed.borrower_id, "Removed a borrowed book");
        }
        tracing::info!(isbn = %removed.isbn, "Removed book \"{}\"", removed.title);
        Ok(removed)
    }

    pub fn register_user(&mut self, id: &str, name: &str) -> Result<&User> {
        validate_record_key("id", id)?;
        validate_record_field("name", name)?;
        if self.user_exists(id) {
            return Err(LibraryError::DuplicateUserId { id: id.to_string() });
        }
        if self.user_name_exists(name) {
            return Err(LibraryError::DuplicateName { name: name.to_string() });
        }

        let user = self.users.entry(id.to_string()).or_insert_with(|| User::new(id, name));
        tracing::info!(id = %user.id, "Registered user \"{}\"", user.name);
        Ok(user)
    }

    /// Renaming a user to their own current name is rejected as a duplicate.
    pub fn edit_user_name(&mut self, selector: usize, new_name: &str) -> Result<&User> {
        to_index(selector, self.users.len())?;
        validate_record_field("name", new_name)?;
        if self.user_name_exists(new_name) {
            return Err(LibraryError::DuplicateName { name: new_name.to_string() });
        }

        let len = self.users.len();
        let (_, user) = self
            .users
            .get_index_mut(selector - 1)
            .ok_or(LibraryError::InvalidSelection { selector, len })?;
        tracing::info!(id = %user.id, "Renamed user \"{}\" to \"{}\"", user.name, new_name);
        user.name = new_name.to_string();
        Ok(user)
    }

    /// Removes the user at a 1-based position. Outside strict mode the books
    /// they hold stay marked as borrowed by the removed id.
    pub fn remove_user(&mut self, selector: usize) -> Result<User> {
        let user = self.user_at(selector)?;
        if self.strict_references && !user.borrowed_isbns.is_empty() {
            return Err(LibraryError::UserHasLoans {
                id: user.id.clone(),
                count: user.borrowed_isbns.len(),
            });
        }

        let (_, removed) = self
            .users
            .shift_remove_index(selector - 1)
            .ok_or(LibraryError::InvalidSelection { selector, len: self.users.len() })?;
        if !removed.borrowed_isbns.is_empty() {
            tracing::warn!(
                id = %removed.id,
                held = removed.borrowed_isbns.len(),
                "Removed a user who still holds books"
            );
        }
        tracing::info!(id = %removed.id, "Removed user \"{}\"", removed.name);
        Ok(removed)
    }

    pub fn borrow_book(&mut self, selector: usize, user_id: &str) -> Result<&Book> {
        let isbn = self.book_at(selector)?.isbn.clone();
        self.require_user(user_id)?;

        let book = self
            .books
            .get_mut(&isbn)
            .ok_or_else(|| LibraryError::BookNotFound { isbn: isbn.clone() })?;
        if !book.available {
            return Err(LibraryError::AlreadyBorrowed { isbn });
        }
        book.check_out(user_id);

        // 兩邊一起更新
        if let Some(user) = self.users.get_mut(user_id) {
            user.hold(&isbn);
        }
        tracing::info!(isbn = %isbn, user = %user_id, "Book borrowed");
        self.books
            .get(&isbn)
            .ok_or(LibraryError::BookNotFound { isbn })
    }

    /// `selector` is a 1-based position in the user's own borrowed list.
    pub fn return_book(&mut self, selector: usize, user_id: &str) -> Result<&Book> {
        let user = self.require_user(user_id)?;
        let index = to_index(selector, user.borrowed_isbns.len())?;
        let isbn = user.borrowed_isbns[index].clone();

        if !self.books.contains_key(&isbn) {
            return Err(LibraryError::BookNotFound { isbn });
        }

        if let Some(user) = self.users.get_mut(user_id) {
            user.release(&isbn);
        }
        let book = self
            .books
            .get_mut(&isbn)
            .ok_or_else(|| LibraryError::BookNotFound { isbn: isbn.clone() })?;
        book.check_in();
        tracing::info!(isbn = %isbn, user = %user_id, "Book returned");
        Ok(book)
    }
}

fn to_index(selector: usize, len: usize) -> Result<usize> {
    if selector == 0 || selector > len {
        return Err(LibraryError::InvalidSelection { selector, len });
    }
    Ok(selector - 1)
}
