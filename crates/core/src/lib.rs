pub mod config;
pub mod error;
pub mod query;
pub mod statement;

pub use config::{AuthConfig, ComputeTarget, ConnectionConfig, DatabaseConfig, PollConfig};
pub use error::{ErrorKind, RedshiftDataError};
pub use query::{ParamValue, ParameterizedQuery};
pub use statement::*;
