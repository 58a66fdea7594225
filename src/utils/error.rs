use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Book with ISBN {isbn} already exists")]
    DuplicateIsbn { isbn: String },

    #[error("User with ID {id} already exists")]
    DuplicateUserId { id: String },

    #[error("A user with the name \"{name}\" already exists")]
    DuplicateName { name: String },

    #[error("Invalid selection {selector} (valid range 1..={len})")]
    InvalidSelection { selector: usize, len: usize },

    #[error("User {id} not found")]
    UserNotFound { id: String },

    #[error("Book with ISBN {isbn} not found")]
    BookNotFound { isbn: String },

    #[error("Book with ISBN {isbn} is already borrowed")]
    AlreadyBorrowed { isbn: String },

    #[error("Book with ISBN {isbn} is on loan to {borrower_id}")]
    BookOnLoan { isbn: String, borrower_id: String },

    #[error("User {id} still holds {count} book(s)")]
    UserHasLoans { id: String, count: usize },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidField {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Malformed record in {resource} at line {line}: {reason}")]
    MalformedRecord {
        resource: String,
        line: usize,
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid configuration value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Catalog,
    Persistence,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LibraryError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LibraryError::DuplicateIsbn { .. }
            | LibraryError::DuplicateUserId { .. }
            | LibraryError::DuplicateName { .. }
            | LibraryError::InvalidSelection { .. }
            | LibraryError::UserNotFound { .. }
            | LibraryError::BookNotFound { .. }
            | LibraryError::AlreadyBorrowed { .. }
            | LibraryError::BookOnLoan { .. }
            | LibraryError::UserHasLoans { .. }
            | LibraryError::InvalidField { .. } => ErrorCategory::Catalog,
            LibraryError::MalformedRecord { .. } => ErrorCategory::Persistence,
            LibraryError::ConfigValidationError { .. }
            | LibraryError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            LibraryError::IoError(_) => ErrorCategory::System,
        }
    }

    /// 目錄層級的錯誤都可恢復，只有持久化與系統錯誤需要中止
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Catalog => ErrorSeverity::Low,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Persistence => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.severity() == ErrorSeverity::Low
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            LibraryError::DuplicateIsbn { .. } => "Choose an ISBN that is not already in the catalog".to_string(),
            LibraryError::DuplicateUserId { .. } => "Choose a different user ID".to_string(),
            LibraryError::DuplicateName { .. } => "Choose a name no other user has".to_string(),
            LibraryError::InvalidSelection { .. } => "Pick a number from the list shown".to_string(),
            LibraryError::UserNotFound { .. } => "Ask the administrator to register the user".to_string(),
            LibraryError::BookNotFound { .. } => "The catalog entry was removed; ask the administrator to re-add it".to_string(),
            LibraryError::AlreadyBorrowed { .. } => "Wait until the book is returned".to_string(),
            LibraryError::BookOnLoan { .. } => "Have the borrower return the book first".to_string(),
            LibraryError::UserHasLoans { .. } => "Return the user's books before removing them".to_string(),
            LibraryError::InvalidField { .. } => "Remove '|' and line breaks from the value".to_string(),
            LibraryError::MalformedRecord { resource, line, .. } => {
                format!("Fix or delete line {} of {}", line, resource)
            }
            LibraryError::IoError(_) => "Check that the data directory exists and is writable".to_string(),
            LibraryError::ConfigValidationError { .. }
            | LibraryError::InvalidConfigValueError { .. } => "Check the configuration file and command-line flags".to_string(),
        }
    }

    /// 主控台顯示用的訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            LibraryError::DuplicateIsbn { isbn } => format!("Failed: Book with ISBN {} already exists.", isbn),
            LibraryError::DuplicateUserId { id } => format!("Failed: User with ID {} already exists.", id),
            LibraryError::DuplicateName { name } => {
                format!("Failed: A user with the name \"{}\" already exists.", name)
            }
            LibraryError::InvalidSelection { .. } => "Failed: Invalid selection.".to_string(),
            LibraryError::UserNotFound { .. } => "Failed: User not found.".to_string(),
            LibraryError::BookNotFound { .. } => "Failed: Book not found.".to_string(),
            LibraryError::AlreadyBorrowed { .. } => "Failed: Book already borrowed.".to_string(),
            LibraryError::BookOnLoan { borrower_id, .. } => {
                format!("Failed: Book is currently borrowed by {}.", borrower_id)
            }
            LibraryError::UserHasLoans { count, .. } => {
                format!("Failed: User still has {} borrowed book(s).", count)
            }
            LibraryError::InvalidField { field, reason, .. } => format!("Failed: {} {}.", field, reason),
            other => format!("Failed: {}.", other),
        }
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
