//! Pure mapping from logical statements to Data API requests.
//!
//! Every check here runs before anything is dispatched, so malformed input
//! fails synchronously with a validation error.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use redshift_data_core::error::Result;
use redshift_data_core::{DatabaseConfig, ParameterizedQuery, RedshiftDataError};

use crate::api::{BatchExecuteRequest, ExecuteRequest, SqlParam};

/// Upper bound on SQL texts per BatchExecuteStatement call.
pub const MAX_BATCH_STATEMENTS: usize = 40;

/// Optional per-call settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementOptions {
    /// Label shown in the Redshift console and statement listings.
    pub statement_name: Option<String>,
    pub with_event: bool,
    /// Idempotency token; a random one is generated when `None`.
    pub client_token: Option<String>,
}

impl StatementOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            statement_name: Some(name.into()),
            ..Self::default()
        }
    }

    fn resolved_client_token(&self) -> String {
        self.client_token
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
    }
}

/// Build an ExecuteStatement request for `query` against `target`.
pub fn build_execute_request(
    query: &ParameterizedQuery,
    target: &DatabaseConfig,
    options: &StatementOptions,
) -> Result<ExecuteRequest> {
    target.validate()?;
    query.validate()?;

    let parameters = query
        .wire_parameters()?
        .into_iter()
        .map(|(name, value)| SqlParam { name, value })
        .collect();

    Ok(ExecuteRequest {
        target: target.clone(),
        sql: query.sql().to_string(),
        parameters,
        statement_name: options.statement_name.clone(),
        with_event: options.with_event,
        client_token: Some(options.resolved_client_token()),
    })
}

/// Build a BatchExecuteStatement request. Parameters are inlined because the
/// batch call cannot bind them.
pub fn build_batch_request(
    queries: &[ParameterizedQuery],
    target: &DatabaseConfig,
    options: &StatementOptions,
) -> Result<BatchExecuteRequest> {
    target.validate()?;

    if queries.is_empty() {
        return Err(RedshiftDataError::Validation(
            "a batch needs at least one SQL statement".into(),
        ));
    }
    if queries.len() > MAX_BATCH_STATEMENTS {
        return Err(RedshiftDataError::Validation(format!(
            "a batch holds at most {MAX_BATCH_STATEMENTS} statements, got {}",
            queries.len()
        )));
    }

    let sqls = queries
        .iter()
        .enumerate()
        .map(|(i, q)| {
            q.validate()
                .map(|_| q.to_inline_sql())
                .map_err(|e| match e {
                    RedshiftDataError::Validation(msg) => {
                        RedshiftDataError::Validation(format!("statement {}: {msg}", i + 1))
                    }
                    other => other,
                })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(BatchExecuteRequest {
        target: target.clone(),
        sqls,
        statement_name: options.statement_name.clone(),
        with_event: options.with_event,
        client_token: Some(options.resolved_client_token()),
    })
}

/// Read a request's parameter list back into `name → value`.
pub fn parameters_to_map(parameters: &[SqlParam]) -> IndexMap<String, String> {
    parameters
        .iter()
        .map(|p| (p.name.clone(), p.value.clone()))
        .collect()
}
