use crate::core::catalog::Catalog;
use crate::core::persistence::PersistenceGateway;
use crate::core::{Book, ConfigProvider, Storage, User};
use crate::utils::error::Result;

/// Pairs the in-memory [`Catalog`] with its [`PersistenceGateway`].
///
/// Every mutating call changes the catalog first and then flushes both
/// resources before returning. A failed validation or a failed flush leaves
/// the in-memory catalog as it was before the call.
pub struct LibraryService<S: Storage> {
    catalog: Catalog,
    gateway: PersistenceGateway<S>,
}

impl<S: Storage> LibraryService<S> {
    /// Hydrates the catalog from storage, seeding the demo books into an
    /// empty catalog when asked to.
    pub async fn open(gateway: PersistenceGateway<S>, strict_references: bool, seed: bool) -> Result<Self> {
        let (books, users) = gateway.load().await?;
        let catalog = Catalog::from_records(books, users).with_strict_references(strict_references);
        let mut service = Self { catalog, gateway };

        if seed && service.catalog.seed_if_empty() {
            service.flush().await?;
        }
        Ok(service)
    }

    pub async fn from_config<C: ConfigProvider>(storage: S, config: &C) -> Result<Self> {
        let gateway = PersistenceGateway::new(storage, config.books_file(), config.users_file());
        Self::open(gateway, config.strict_references(), config.seed_demo_books()).await
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub async fn flush(&self) -> Result<()> {
        self.gateway.flush(&self.catalog).await
    }

    /// Flushes a mutation, restoring `snapshot` if the write fails.
    async fn commit<T>(&mut self, snapshot: Catalog, value: T) -> Result<T> {
        if let Err(e) = self.flush().await {
            tracing::error!("❌ Flush failed, rolling back in-memory change: {}", e);
            self.catalog = snapshot;
            return Err(e);
        }
        Ok(value)
    }

    pub async fn add_book(&mut self, title: &str, author: &str, isbn: &str) -> Result<Book> {
        let snapshot = self.catalog.clone();
        let book = self.catalog.add_book(title, author, isbn)?.clone();
        self.commit(snapshot, book).await
    }

    pub async fn remove_book(&mut self, selector: usize) -> Result<Book> {
        let snapshot = self.catalog.clone();
        let book = self.catalog.remove_book(selector)?;
        self.commit(snapshot, book).await
    }

    pub async fn register_user(&mut self, id: &str, name: &str) -> Result<User> {
        let snapshot = self.catalog.clone();
        let user = self.catalog.register_user(id, name)?.clone();
        self.commit(snapshot, user).await
    }

    pub async fn edit_user_name(&mut self, selector: usize, new_name: &str) -> Result<User> {
        let snapshot = self.catalog.clone();
        let user = self.catalog.edit_user_name(selector, new_name)?.clone();
        self.commit(snapshot, user).await
    }

    pub async fn remove_user(&mut self, selector: usize) -> Result<User> {
        let snapshot = self.catalog.clone();
        let user = self.catalog.remove_user(selector)?;
        self.commit(snapshot, user).await
    }

    pub async fn borrow_book(&mut self, selector: usize, user_id: &str) -> Result<Book> {
        let snapshot = self.catalog.clone();
        let book = self.catalog.borrow_book(selector, user_id)?.clone();
        self.commit(snapshot, book).await
    }

    pub async fn return_book(&mut self, selector: usize, user_id: &str) -> Result<Book> {
        let snapshot = self.catalog.clone();
        let book = self.catalog.return_book(selector, user_id)?.clone();
        self.commit(snapshot, book).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemoryStorage;
    use crate::utils::error::LibraryError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Memory storage whose writes can be switched to fail.
    #[derive(Clone, Default)]
    struct FlakyStorage {
        inner: MemoryStorage,
        fail_writes: Arc<AtomicBool>,
    }

    impl FlakyStorage {
        fn fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }
    }

    impl Storage for FlakyStorage {
        async fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>> {
            self.inner.read_file(path).await
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into());
            }
            self.inner.write_file(path, data).await
        }
    }

    async fn open_flaky(storage: &FlakyStorage) -> LibraryService<FlakyStorage> {
        let gateway = PersistenceGateway::new(storage.clone(), "books.txt", "users.txt");
        LibraryService::open(gateway, false, true).await.unwrap()
    }

    async fn open(storage: &MemoryStorage, seed: bool) -> LibraryService<MemoryStorage> {
        let gateway = PersistenceGateway::new(storage.clone(), "books.txt", "users.txt");
        LibraryService::open(gateway, false, seed).await.unwrap()
    }

    #[tokio::test]
    async fn test_first_run_seeds_and_flushes() {
        let storage = MemoryStorage::new();
        let service = open(&storage, true).await;

        assert_eq!(service.catalog().book_count(), 3);
        let books = storage.get_text("books.txt").await.unwrap();
        assert_eq!(books.lines().count(), 3);
        assert!(books.starts_with("Venom|"));
    }

    #[tokio::test]
    async fn test_seed_skipped_when_books_exist() {
        let storage = MemoryStorage::new();
        storage.put("books.txt", "Dune|Herbert|77|1|\n").await;
        let service = open(&storage, true).await;

        assert_eq!(service.catalog().book_count(), 1);
        assert!(service.catalog().book_exists("77"));
    }

    #[tokio::test]
    async fn test_mutation_is_flushed_before_returning() {
        let storage = MemoryStorage::new();
        let mut service = open(&storage, false).await;

        service.register_user("U1", "Alice").await.unwrap();
        service.add_book("Dune", "Herbert", "77").await.unwrap();
        service.borrow_book(1, "U1").await.unwrap();

        assert_eq!(storage.get_text("books.txt").await.unwrap(), "Dune|Herbert|77|0|U1\n");
        assert_eq!(storage.get_text("users.txt").await.unwrap(), "U1|Alice|77\n");
    }

    #[tokio::test]
    async fn test_failed_mutation_does_not_flush() {
        let storage = MemoryStorage::new();
        let mut service = open(&storage, false).await;

        let err = service.return_book(1, "U1").await.unwrap_err();
        assert!(matches!(err, LibraryError::UserNotFound { .. }));
        assert!(storage.get_text("users.txt").await.is_none());
    }

    #[tokio::test]
    async fn test_reopen_sees_previous_session() {
        let storage = MemoryStorage::new();
        {
            let mut service = open(&storage, true).await;
            service.register_user("U1", "Alice").await.unwrap();
            service.borrow_book(2, "U1").await.unwrap();
        }

        let service = open(&storage, true).await;
        let book = service.catalog().find_book("02").unwrap();
        assert!(!book.available);
        assert_eq!(service.catalog().find_user("U1").unwrap().borrowed_isbns, vec!["02".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_flush_rolls_back_borrow() {
        let storage = FlakyStorage::default();
        let mut service = open_flaky(&storage).await;
        service.register_user("U1", "Alice").await.unwrap();
        let books_before = storage.inner.get_text("books.txt").await;

        storage.fail_writes(true);
        let err = service.borrow_book(1, "U1").await.unwrap_err();
        assert!(matches!(err, LibraryError::IoError(_)));

        let book = service.catalog().find_book("01").unwrap();
        assert!(book.available);
        assert_eq!(book.borrower_id, None);
        assert!(service.catalog().find_user("U1").unwrap().borrowed_isbns.is_empty());
        assert_eq!(storage.inner.get_text("books.txt").await, books_before);

        // 重試得到相同的結果，而不是「已借出」
        assert!(matches!(
            service.borrow_book(1, "U1").await,
            Err(LibraryError::IoError(_))
        ));
        storage.fail_writes(false);
        let book = service.borrow_book(1, "U1").await.unwrap();
        assert_eq!(book.borrower_id.as_deref(), Some("U1"));
    }

    #[tokio::test]
    async fn test_failed_flush_rolls_back_removals_in_place() {
        let storage = FlakyStorage::default();
        let mut service = open_flaky(&storage).await;
        service.register_user("U1", "Alice").await.unwrap();
        service.register_user("U2", "Bob").await.unwrap();

        storage.fail_writes(true);
        assert!(service.remove_user(1).await.is_err());
        assert!(service.remove_book(2).await.is_err());
        assert!(service.add_book("Dune", "Herbert", "77").await.is_err());
        assert!(service.edit_user_name(2, "Robert").await.is_err());

        let ids: Vec<_> = service.catalog().users().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["U1", "U2"]);
        assert_eq!(service.catalog().find_user("U2").unwrap().name, "Bob");
        let isbns: Vec<_> = service.catalog().books().map(|b| b.isbn.as_str()).collect();
        assert_eq!(isbns, vec!["01", "02", "03"]);
    }
}
