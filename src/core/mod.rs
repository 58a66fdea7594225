pub mod catalog;
pub mod codec;
pub mod library;
pub mod persistence;

pub use crate::domain::model::{Book, BookListing, BorrowedListing, Holder, User, UserListing};
pub use crate::domain::ports::{ConfigProvider, Storage};
pub use crate::utils::error::Result;
