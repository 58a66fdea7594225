use crate::core::catalog::Catalog;
use crate::core::codec::{decode_book, decode_user, encode_book, encode_user, DecodeError};
use crate::domain::model::{Book, User};
use crate::domain::ports::Storage;
use crate::utils::error::{LibraryError, Result};

/// Loads and rewrites the two flat-file resources backing a [`Catalog`].
///
/// Every flush rewrites both resources from scratch. There is no atomic
/// rename, so a crash mid-write can leave a truncated file.
#[derive(Debug, Clone)]
pub struct PersistenceGateway<S: Storage> {
    storage: S,
    books_file: String,
    users_file: String,
}

impl<S: Storage> PersistenceGateway<S> {
    pub fn new(storage: S, books_file: impl Into<String>, users_file: impl Into<String>) -> Self {
        Self {
            storage,
            books_file: books_file.into(),
            users_file: users_file.into(),
        }
    }

    /// Reads both resources. A missing resource yields an empty collection;
    /// an undecodable line fails the whole load.
    pub async fn load(&self) -> Result<(Vec<Book>, Vec<User>)> {
        let books = self.load_records(&self.books_file, decode_book).await?;
        let users = self.load_records(&self.users_file, decode_user).await?;
        tracing::info!(
            "📂 Loaded {} books from {} and {} users from {}",
            books.len(),
            self.books_file,
            users.len(),
            self.users_file
        );
        Ok((books, users))
    }

    async fn load_records<T>(
        &self,
        resource: &str,
        decode: fn(&str) -> std::result::Result<T, DecodeError>,
    ) -> Result<Vec<T>> {
        let Some(data) = self.storage.read_file(resource).await? else {
            tracing::debug!("{} does not exist yet, starting empty", resource);
            return Ok(Vec::new());
        };

        let content = String::from_utf8(data).map_err(|e| LibraryError::MalformedRecord {
            resource: resource.to_string(),
            line: 0,
            reason: format!("not valid UTF-8: {}", e),
        })?;

        let mut records = Vec::new();
        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            records.push(decode(line).map_err(|e| e.at(resource, index + 1))?);
        }
        Ok(records)
    }

    /// Rewrites both resources with the full current collections, in order.
    /// Everything is encoded before anything is written.
    pub async fn flush(&self, catalog: &Catalog) -> Result<()> {
        let books = encode_all(catalog.books(), encode_book)?;
        let users = encode_all(catalog.users(), encode_user)?;

        self.storage.write_file(&self.books_file, books.as_bytes()).await?;
        self.storage.write_file(&self.users_file, users.as_bytes()).await?;
        tracing::debug!(
            books = catalog.book_count(),
            users = catalog.user_count(),
            "Flushed catalog"
        );
        Ok(())
    }
}

fn encode_all<'a, T: 'a>(
    records: impl Iterator<Item = &'a T>,
    encode: fn(&T) -> Result<String>,
) -> Result<String> {
    let mut out = String::new();
    for record in records {
        out.push_str(&encode(record)?);
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemoryStorage;

    fn gateway(storage: MemoryStorage) -> PersistenceGateway<MemoryStorage> {
        PersistenceGateway::new(storage, "books.txt", "users.txt")
    }

    #[tokio::test]
    async fn test_missing_resources_load_empty() {
        let (books, users) = gateway(MemoryStorage::new()).load().await.unwrap();
        assert!(books.is_empty());
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn test_flush_writes_lines_in_order() {
        let storage = MemoryStorage::new();
        let gateway = gateway(storage.clone());

        let mut catalog = Catalog::new();
        catalog.seed_if_empty();
        catalog.register_user("U1", "Alice").unwrap();
        catalog.borrow_book(3, "U1").unwrap();
        gateway.flush(&catalog).await.unwrap();

        let books = storage.get_text("books.txt").await.unwrap();
        assert_eq!(
            books,
            "Venom|Ruben Samuel Fleischer|01|1|\n\
             Boruto: Two Blue Vortex|Ukyō Kodachi|02|1|\n\
             The Wild Robot|Christopher Michael Sanders|03|0|U1\n"
        );
        assert_eq!(storage.get_text("users.txt").await.unwrap(), "U1|Alice|03\n");
    }

    #[tokio::test]
    async fn test_flush_then_load_restores_catalog() {
        let storage = MemoryStorage::new();
        let gateway = gateway(storage);

        let mut catalog = Catalog::new();
        catalog.add_book("Dune", "Herbert", "77").unwrap();
        catalog.register_user("U1", "Alice").unwrap();
        catalog.borrow_book(1, "U1").unwrap();
        gateway.flush(&catalog).await.unwrap();

        let (books, users) = gateway.load().await.unwrap();
        let restored = Catalog::from_records(books, users);
        assert_eq!(restored.find_book("77"), catalog.find_book("77"));
        assert_eq!(restored.find_user("U1"), catalog.find_user("U1"));
    }

    #[tokio::test]
    async fn test_malformed_line_reports_location() {
        let storage = MemoryStorage::new();
        storage.put("books.txt", "Dune|Herbert|77|1|\r\n\nbroken line\n").await;

        let err = gateway(storage).load().await.unwrap_err();
        match err {
            LibraryError::MalformedRecord { resource, line, .. } => {
                assert_eq!(resource, "books.txt");
                assert_eq!(line, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_book_with_empty_isbn_is_malformed() {
        let storage = MemoryStorage::new();
        storage.put("books.txt", "Dune|Herbert|77|1|\nGhost|Anon||1|\n").await;
        storage.put("users.txt", "U1|Alice\n").await;

        match gateway(storage).load().await.unwrap_err() {
            LibraryError::MalformedRecord { resource, line, reason } => {
                assert_eq!(resource, "books.txt");
                assert_eq!(line, 2);
                assert_eq!(reason, "isbn is empty");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_flush_writes_nothing_on_encoding_error() {
        tokio_test::block_on(async {
            let storage = MemoryStorage::new();
            let gateway = gateway(storage.clone());

            let mut catalog = Catalog::new();
            catalog.register_user("U1", "Alice").unwrap();
            // 繞過目錄層的檢查，模擬外部修改過的記錄
            let (books, mut users) = (Vec::new(), catalog.users().cloned().collect::<Vec<_>>());
            users[0].name = "Al|ice".to_string();
            let tainted = Catalog::from_records(books, users);

            assert!(matches!(
                gateway.flush(&tainted).await,
                Err(LibraryError::InvalidField { .. })
            ));
            assert!(storage.get_text("books.txt").await.is_none());
            assert!(storage.get_text("users.txt").await.is_none());
        });
    }
}
