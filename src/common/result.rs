use crate::common::error::MigratorError;

/// プロジェクト全体で使用するResult型のエイリアス
///
/// # Examples
///
/// ```
/// use repomigrator::common::result::MigratorResult;
/// use repomigrator::common::error::MigratorError;
///
/// fn example_function() -> MigratorResult<String> {
///     Ok("success".to_string())
/// }
///
/// fn example_with_error() -> MigratorResult<()> {
///     Err(MigratorError::internal_error("Something went wrong"))
/// }
/// ```
pub type MigratorResult<T> = Result<T, MigratorError>;

/// Resultのエラー変換ヘルパー
pub trait ResultExt<T, E> {
    /// InternalErrorとしてMigratorResultに変換
    fn with_internal_error(self, message: impl Into<String>) -> MigratorResult<T>
    where
        E: std::error::Error + Send + Sync + 'static;

    /// ファイルシステムエラーとしてMigratorResultに変換
    fn with_filesystem_error(
        self,
        message: impl Into<String>,
        path: Option<std::path::PathBuf>,
    ) -> MigratorResult<T>
    where
        E: Into<std::io::Error>;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn with_internal_error(self, message: impl Into<String>) -> MigratorResult<T>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.map_err(|e| MigratorError::internal_error_with_source(message, e))
    }

    fn with_filesystem_error(
        self,
        message: impl Into<String>,
        path: Option<std::path::PathBuf>,
    ) -> MigratorResult<T>
    where
        E: Into<std::io::Error>,
    {
        self.map_err(|e| MigratorError::filesystem_error_with_source(message, path, e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_result_ext_with_internal_error() {
        let result: Result<(), std::fmt::Error> = Err(std::fmt::Error);
        let err = result.with_internal_error("render failed").unwrap_err();
        assert_eq!(err.code(), "internal_error");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_result_ext_with_filesystem_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let result: Result<String, std::io::Error> = Err(io_error);
        let path = Some(PathBuf::from("/test/path"));

        match result.with_filesystem_error("reading index", path.clone()) {
            Err(MigratorError::FileSystemError { path: p, .. }) => assert_eq!(p, path),
            other => panic!("Expected FileSystemError, got {:?}", other),
        }
    }
}
