use crate::utils::error::Result;

pub trait Storage: Send + Sync {
    /// Returns `None` when the resource does not exist yet.
    fn read_file(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = Result<Option<Vec<u8>>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn data_dir(&self) -> &str;
    fn books_file(&self) -> &str;
    fn users_file(&self) -> &str;
    fn seed_demo_books(&self) -> bool;
    fn strict_references(&self) -> bool;
}
