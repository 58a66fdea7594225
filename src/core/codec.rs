//! Single-line text encoding of [`Book`] and [`User`] records.
//!
//! Books are `title|author|isbn|0-or-1|borrowerID` and users are
//! `id|name|isbn...`. Encoding rejects values that contain the delimiter
//! or a line break rather than writing a line that would decode differently.

use crate::domain::model::{Book, User};
use crate::utils::error::{LibraryError, Result};
use crate::utils::validation::{validate_record_field, FIELD_DELIMITER};

/// Why a line could not be decoded; the persistence layer attaches the
/// resource name and line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError(pub String);

impl DecodeError {
    pub fn at(self, resource: &str, line: usize) -> LibraryError {
        LibraryError::MalformedRecord {
            resource: resource.to_string(),
            line,
            reason: self.0,
        }
    }
}

pub fn encode_book(book: &Book) -> Result<String> {
    validate_record_field("title", &book.title)?;
    validate_record_field("author", &book.author)?;
    validate_record_field("isbn", &book.isbn)?;
    let borrower = book.borrower_id.as_deref().unwrap_or("");
    // 借閱者 ID 是最後一個欄位，但換行仍會破壞記錄
    if borrower.contains(['\n', '\r']) {
        return Err(LibraryError::InvalidField {
            field: "borrower_id".to_string(),
            value: borrower.to_string(),
            reason: "must not contain line breaks".to_string(),
        });
    }

    let flag = if book.available { '1' } else { '0' };
    let d = FIELD_DELIMITER;
    Ok(format!(
        "{}{d}{}{d}{}{d}{}{d}{}",
        book.title, book.author, book.isbn, flag, borrower
    ))
}

pub fn decode_book(line: &str) -> std::result::Result<Book, DecodeError> {
    let mut parts = line.splitn(5, FIELD_DELIMITER);
    let (Some(title), Some(author), Some(isbn), Some(flag), Some(borrower)) =
        (parts.next(), parts.next(), parts.next(), parts.next(), parts.next())
    else {
        let found = line.matches(FIELD_DELIMITER).count();
        return Err(DecodeError(format!(
            "book record needs 4 '{}' delimiters, found {}",
            FIELD_DELIMITER, found
        )));
    };

    if isbn.is_empty() {
        return Err(DecodeError("isbn is empty".to_string()));
    }

    let available = match flag {
        "1" => true,
        "0" => false,
        other => {
            return Err(DecodeError(format!(
                "availability flag must be 0 or 1, got '{}'",
                other
            )))
        }
    };

    Ok(Book {
        title: title.to_string(),
        author: author.to_string(),
        isbn: isbn.to_string(),
        available,
        borrower_id: (!borrower.is_empty()).then(|| borrower.to_string()),
    })
}

pub fn encode_user(user: &User) -> Result<String> {
    validate_record_field("id", &user.id)?;
    validate_record_field("name", &user.name)?;

    let mut line = format!("{}{}{}", user.id, FIELD_DELIMITER, user.name);
    for isbn in &user.borrowed_isbns {
        validate_record_field("borrowed isbn", isbn)?;
        line.push(FIELD_DELIMITER);
        line.push_str(isbn);
    }
    Ok(line)
}

pub fn decode_user(line: &str) -> std::result::Result<User, DecodeError> {
    let mut parts = line.split(FIELD_DELIMITER);
    let (Some(id), Some(name)) = (parts.next(), parts.next()) else {
        return Err(DecodeError(format!(
            "user record needs at least an id and a name separated by '{}'",
            FIELD_DELIMITER
        )));
    };
    if id.is_empty() {
        return Err(DecodeError("user id is empty".to_string()));
    }

    Ok(User {
        id: id.to_string(),
        name: name.to_string(),
        borrowed_isbns: parts
            .filter(|isbn| !isbn.is_empty())
            .map(str::to_string)
            .collect(),
    })
}
