pub mod error;
pub mod logging;

pub use error::{ErrorCategory, SiteError, SiteResult};
pub use logging::{setup_logging, LoggingConfig};
