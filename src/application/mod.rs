//! Application layer: use cases on top of the domain
//!
//! This layer reads outline files and turns domain errors into application errors.

pub mod error;
pub mod error_ext;
pub mod outline;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::{IoResultExt, TreeResultExt};
pub use outline::{load_outline, require_label, TreeStats};
