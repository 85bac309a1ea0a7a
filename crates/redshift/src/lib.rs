pub mod api;
pub mod client;
pub mod credentials;
pub mod dispatcher;
pub mod poller;
pub mod request;
pub mod result;
pub mod sdk;
pub mod stream;
pub mod translate;

pub use api::{BatchExecuteRequest, DataApi, ExecuteRequest, SqlParam};
pub use client::RedshiftDataClient;
pub use credentials::resolve_credentials;
pub use dispatcher::{Completion, Dispatcher};
pub use poller::{poll_until_terminal, PollOutcome};
pub use request::{build_batch_request, build_execute_request, StatementOptions, MAX_BATCH_STATEMENTS};
pub use result::{ColumnMetadata, Field, Record, ResultPage, StatementResult};
pub use sdk::SdkDataApi;
pub use stream::RowStream;

pub use redshift_data_core::{
    AuthConfig, ComputeTarget, ConnectionConfig, DatabaseConfig, ErrorKind, ParamValue,
    ParameterizedQuery, PollConfig, RedshiftDataError, StatementDescription, StatementHandle,
    StatementStatus, SubStatement,
};
