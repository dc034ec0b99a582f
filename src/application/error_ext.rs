//! Error conversion helpers that attach file paths
//!
//! Both outline reads and outline parsing report the file they were working on.

use std::io;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::TreeResult;

/// Converts `io::Result` to `ApplicationResult` with the path that failed.
pub trait IoResultExt<T> {
    /// # Example
    /// ```ignore
    /// std::fs::read_to_string(&outline_path)
    ///     .with_path_context("read outline", &outline_path)?;
    /// ```
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: format!("{}: {}", action, path.display()),
            source: Box::new(e),
        })
    }
}

/// Ties tree errors raised while parsing an outline to its file.
pub trait TreeResultExt<T> {
    fn in_outline(self, path: &Path) -> ApplicationResult<T>;
}

impl<T> TreeResultExt<T> for TreeResult<T> {
    fn in_outline(self, path: &Path) -> ApplicationResult<T> {
        self.map_err(|source| ApplicationError::Outline {
            path: path.to_path_buf(),
            source,
        })
    }
}
