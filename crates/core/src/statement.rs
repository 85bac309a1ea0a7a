use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RedshiftDataError;

/// Opaque identifier of a submitted SQL statement.
///
/// Batch submissions return a parent id; each SQL in the batch is tracked by a
/// sub-statement id of the form `<parent>:<n>` where `n` starts at 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatementHandle(String);

impl StatementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 1-based position inside a batch, if this is a sub-statement id.
    pub fn sub_index(&self) -> Option<u32> {
        let (_, suffix) = self.0.rsplit_once(':')?;
        suffix.parse().ok()
    }
}

impl fmt::Display for StatementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for StatementHandle {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for StatementHandle {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Lifecycle state of a statement as reported by the Data API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementStatus {
    Submitted,
    Picked,
    Started,
    Finished,
    Failed,
    Aborted,
}

impl StatementStatus {
    /// FINISHED, FAILED and ABORTED admit no further transition.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StatementStatus::Finished | StatementStatus::Failed | StatementStatus::Aborted
        )
    }

    pub fn is_success(self) -> bool {
        self == StatementStatus::Finished
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatementStatus::Submitted => "SUBMITTED",
            StatementStatus::Picked => "PICKED",
            StatementStatus::Started => "STARTED",
            StatementStatus::Finished => "FINISHED",
            StatementStatus::Failed => "FAILED",
            StatementStatus::Aborted => "ABORTED",
        }
    }
}

impl fmt::Display for StatementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatementStatus {
    type Err = RedshiftDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SUBMITTED" => Ok(StatementStatus::Submitted),
            "PICKED" => Ok(StatementStatus::Picked),
            "STARTED" => Ok(StatementStatus::Started),
            "FINISHED" => Ok(StatementStatus::Finished),
            "FAILED" => Ok(StatementStatus::Failed),
            "ABORTED" => Ok(StatementStatus::Aborted),
            other => Err(RedshiftDataError::Provider(format!(
                "unrecognised statement status '{other}'"
            ))),
        }
    }
}

/// One SQL of a batch submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubStatement {
    pub id: StatementHandle,
    pub status: StatementStatus,
    pub query_string: Option<String>,
    pub error: Option<String>,
    pub has_result_set: bool,
    pub result_rows: i64,
}

/// Status payload returned by DescribeStatement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementDescription {
    pub id: StatementHandle,
    pub status: StatementStatus,
    /// Provider error message when the statement failed.
    pub error: Option<String>,
    pub query_string: Option<String>,
    pub has_result_set: bool,
    /// Rows returned or affected; -1 when the provider has no count.
    pub result_rows: i64,
    /// Result size in bytes; -1 when unknown.
    pub result_size: i64,
    /// Execution time in nanoseconds.
    pub duration_ns: i64,
    pub redshift_query_id: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sub_statements: Vec<SubStatement>,
}

impl StatementDescription {
    /// Minimal description carrying only an id and a status.
    pub fn new(id: impl Into<StatementHandle>, status: StatementStatus) -> Self {
        Self {
            id: id.into(),
            status,
            error: None,
            query_string: None,
            has_result_set: false,
            result_rows: -1,
            result_size: -1,
            duration_ns: 0,
            redshift_query_id: 0,
            created_at: None,
            updated_at: None,
            sub_statements: Vec::new(),
        }
    }

    /// Sub-statement handles ordered by their position in the batch.
    ///
    /// Ids without a numeric suffix keep the order the provider returned.
    pub fn sub_statement_handles(&self) -> Vec<StatementHandle> {
        let mut subs: Vec<(usize, &SubStatement)> = self.sub_statements.iter().enumerate().collect();
        subs.sort_by_key(|(pos, sub)| (sub.id.sub_index().map(|n| n as usize).unwrap_or(*pos + 1), *pos));
        subs.into_iter().map(|(_, sub)| sub.id.clone()).collect()
    }
}
