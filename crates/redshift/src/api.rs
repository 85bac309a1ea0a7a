//! The Data API seam.
//!
//! [`DataApi`] covers the provider calls the client needs. The production
//! implementation is [`crate::sdk::SdkDataApi`]; tests script fakes against the
//! same trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use redshift_data_core::error::Result;
use redshift_data_core::{DatabaseConfig, StatementDescription, StatementHandle};

use crate::result::ResultPage;

/// A named bind parameter in wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlParam {
    pub name: String,
    pub value: String,
}

/// Validated ExecuteStatement request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub target: DatabaseConfig,
    pub sql: String,
    pub parameters: Vec<SqlParam>,
    pub statement_name: Option<String>,
    /// Publish an EventBridge event when the statement finishes.
    pub with_event: bool,
    /// Idempotency token.
    pub client_token: Option<String>,
}

/// Validated BatchExecuteStatement request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchExecuteRequest {
    pub target: DatabaseConfig,
    /// SQL texts in submission order, parameters already inlined.
    pub sqls: Vec<String>,
    pub statement_name: Option<String>,
    pub with_event: bool,
    pub client_token: Option<String>,
}

/// Provider calls used by the client. Implementations must be cheap to share
/// across tasks.
#[async_trait]
pub trait DataApi: Send + Sync {
    /// Submit one statement; returns its id immediately.
    async fn execute_statement(&self, request: ExecuteRequest) -> Result<StatementHandle>;

    /// Submit a batch; returns the parent id.
    async fn batch_execute_statement(&self, request: BatchExecuteRequest) -> Result<StatementHandle>;

    /// Fresh read of a statement's status.
    async fn describe_statement(&self, id: &StatementHandle) -> Result<StatementDescription>;

    /// One page of a finished statement's result.
    async fn get_statement_result(
        &self,
        id: &StatementHandle,
        next_token: Option<String>,
    ) -> Result<ResultPage>;

    /// Ask the provider to stop a running statement.
    async fn cancel_statement(&self, id: &StatementHandle) -> Result<bool>;
}
