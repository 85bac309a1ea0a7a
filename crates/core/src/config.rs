use std::env;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RedshiftDataError, Result};

const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_DATABASE: &str = "dev";
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 60;
const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;
const DEFAULT_WORKER_THREADS: usize = 4;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => matches!(v.as_str(), "true" | "1"),
        None => default,
    }
}

// ── Auth ──────────────────────────────────────────────────────

/// How the client obtains AWS credentials.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// Static key pair, optionally session-scoped.
    Static {
        access_key_id: String,
        secret_access_key: String,
        #[serde(default)]
        session_token: Option<String>,
    },
    /// EC2 instance metadata (IMDS) credentials.
    InstanceProfile {
        #[serde(default)]
        profile_name: Option<String>,
    },
}

impl AuthConfig {
    pub fn validate(&self) -> Result<()> {
        if let AuthConfig::Static {
            access_key_id,
            secret_access_key,
            ..
        } = self
        {
            if access_key_id.trim().is_empty() {
                return Err(RedshiftDataError::Configuration(
                    "access key id must not be empty".into(),
                ));
            }
            if secret_access_key.trim().is_empty() {
                return Err(RedshiftDataError::Configuration(
                    "secret access key must not be empty".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn label(&self) -> &'static str {
        match self {
            AuthConfig::Static { session_token: Some(_), .. } => "session",
            AuthConfig::Static { .. } => "static",
            AuthConfig::InstanceProfile { .. } => "instance_profile",
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthConfig::Static {
                access_key_id,
                session_token,
                ..
            } => f
                .debug_struct("Static")
                .field("access_key_id", access_key_id)
                .field("secret_access_key", &"***")
                .field("session_token", &session_token.as_ref().map(|_| "***"))
                .finish(),
            AuthConfig::InstanceProfile { profile_name } => f
                .debug_struct("InstanceProfile")
                .field("profile_name", profile_name)
                .finish(),
        }
    }
}

// ── Database access ───────────────────────────────────────────

/// Provisioned cluster or serverless workgroup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputeTarget {
    Cluster(String),
    Workgroup(String),
}

/// Where statements run and as whom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub target: ComputeTarget,
    pub database: String,
    /// Temporary-credentials user; provisioned clusters only.
    #[serde(default)]
    pub db_user: Option<String>,
    /// Secrets Manager secret holding database credentials.
    #[serde(default)]
    pub secret_arn: Option<String>,
}

impl DatabaseConfig {
    pub fn cluster(cluster_id: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            target: ComputeTarget::Cluster(cluster_id.into()),
            database: database.into(),
            db_user: None,
            secret_arn: None,
        }
    }

    pub fn workgroup(workgroup: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            target: ComputeTarget::Workgroup(workgroup.into()),
            database: database.into(),
            db_user: None,
            secret_arn: None,
        }
    }

    pub fn with_db_user(mut self, user: impl Into<String>) -> Self {
        self.db_user = Some(user.into());
        self
    }

    pub fn with_secret_arn(mut self, arn: impl Into<String>) -> Self {
        self.secret_arn = Some(arn.into());
        self
    }

    /// Check required identifiers before any request is built.
    pub fn validate(&self) -> Result<()> {
        match &self.target {
            ComputeTarget::Cluster(id) => {
                if id.trim().is_empty() {
                    return Err(RedshiftDataError::Validation(
                        "cluster identifier must not be empty".into(),
                    ));
                }
                if self.db_user.is_none() && self.secret_arn.is_none() {
                    return Err(RedshiftDataError::Validation(
                        "cluster access needs a database user or a secret ARN".into(),
                    ));
                }
            }
            ComputeTarget::Workgroup(name) => {
                if name.trim().is_empty() {
                    return Err(RedshiftDataError::Validation(
                        "workgroup name must not be empty".into(),
                    ));
                }
                if self.db_user.is_some() {
                    return Err(RedshiftDataError::Validation(
                        "a database user cannot be set for a serverless workgroup".into(),
                    ));
                }
            }
        }
        if self.database.trim().is_empty() {
            return Err(RedshiftDataError::Validation(
                "database name must not be empty".into(),
            ));
        }
        if matches!(&self.db_user, Some(u) if u.trim().is_empty()) {
            return Err(RedshiftDataError::Validation(
                "database user must not be empty".into(),
            ));
        }
        if matches!(&self.secret_arn, Some(a) if a.trim().is_empty()) {
            return Err(RedshiftDataError::Validation(
                "secret ARN must not be empty".into(),
            ));
        }
        Ok(())
    }
}

// ── Polling ───────────────────────────────────────────────────

/// Completion-polling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Total time allowed for a statement to reach a terminal state.
    pub timeout: Duration,
    /// Fixed delay between status checks.
    pub interval: Duration,
    /// Issue a best-effort CancelStatement after a timeout.
    #[serde(default)]
    pub cancel_on_timeout: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS),
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            cancel_on_timeout: false,
        }
    }
}

impl PollConfig {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval,
            cancel_on_timeout: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(RedshiftDataError::Configuration(
                "poll timeout must be greater than zero".into(),
            ));
        }
        if self.interval.is_zero() {
            return Err(RedshiftDataError::Configuration(
                "poll interval must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

// ── ConnectionConfig ──────────────────────────────────────────

/// Everything needed to construct a client.
///
/// Reads from environment variables with optional profile prefix.
/// When `REDSHIFT_PROFILE=PROD`, checks `PROD_REDSHIFT_DATABASE` before
/// `REDSHIFT_DATABASE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub region: String,
    pub auth: AuthConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub poll: PollConfig,
    /// Worker threads of the dispatch pool.
    pub worker_threads: usize,
    /// Endpoint override (local stacks, VPC endpoints).
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

impl ConnectionConfig {
    pub fn new(region: impl Into<String>, auth: AuthConfig, database: DatabaseConfig) -> Self {
        Self {
            region: region.into(),
            auth,
            database,
            poll: PollConfig::default(),
            worker_threads: DEFAULT_WORKER_THREADS,
            endpoint_url: None,
        }
    }

    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Result<Self> {
        let profile = env_opt("REDSHIFT_PROFILE")
            .map(|s| s.to_uppercase())
            .unwrap_or_default();
        Self::from_env_profiled(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn from_env_profiled(profile: &str) -> Result<Self> {
        let p = profile;

        let region = profiled_env_opt(p, "REDSHIFT_REGION")
            .or_else(|| profiled_env_opt(p, "AWS_REGION"))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let auth = match (
            profiled_env_opt(p, "AWS_ACCESS_KEY_ID"),
            profiled_env_opt(p, "AWS_SECRET_ACCESS_KEY"),
        ) {
            (Some(access_key_id), Some(secret_access_key)) => AuthConfig::Static {
                access_key_id,
                secret_access_key,
                session_token: profiled_env_opt(p, "AWS_SESSION_TOKEN"),
            },
            (None, None) => AuthConfig::InstanceProfile {
                profile_name: profiled_env_opt(p, "REDSHIFT_INSTANCE_PROFILE"),
            },
            _ => {
                return Err(RedshiftDataError::Configuration(
                    "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set together".into(),
                ))
            }
        };

        let target = match (
            profiled_env_opt(p, "REDSHIFT_CLUSTER_ID"),
            profiled_env_opt(p, "REDSHIFT_WORKGROUP"),
        ) {
            (Some(cluster), None) => ComputeTarget::Cluster(cluster),
            (None, Some(workgroup)) => ComputeTarget::Workgroup(workgroup),
            (Some(_), Some(_)) => {
                return Err(RedshiftDataError::Configuration(
                    "set either REDSHIFT_CLUSTER_ID or REDSHIFT_WORKGROUP, not both".into(),
                ))
            }
            (None, None) => {
                return Err(RedshiftDataError::Configuration(
                    "REDSHIFT_CLUSTER_ID or REDSHIFT_WORKGROUP is required".into(),
                ))
            }
        };

        let database = DatabaseConfig {
            target,
            database: profiled_env_or(p, "REDSHIFT_DATABASE", DEFAULT_DATABASE),
            db_user: profiled_env_opt(p, "REDSHIFT_DB_USER"),
            secret_arn: profiled_env_opt(p, "REDSHIFT_SECRET_ARN"),
        };

        let poll = PollConfig {
            timeout: Duration::from_secs(profiled_env_u64(
                p,
                "REDSHIFT_POLL_TIMEOUT_SECONDS",
                DEFAULT_POLL_TIMEOUT_SECS,
            )),
            interval: Duration::from_millis(profiled_env_u64(
                p,
                "REDSHIFT_POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL_MS,
            )),
            cancel_on_timeout: profiled_env_bool(p, "REDSHIFT_CANCEL_ON_TIMEOUT", false),
        };

        Ok(Self {
            region,
            auth,
            database,
            poll,
            worker_threads: profiled_env_u64(
                p,
                "REDSHIFT_WORKER_THREADS",
                DEFAULT_WORKER_THREADS as u64,
            ) as usize,
            endpoint_url: profiled_env_opt(p, "REDSHIFT_ENDPOINT_URL"),
        })
    }

    /// Check the whole config; every failure is a configuration error.
    pub fn validate(&self) -> Result<()> {
        if self.region.trim().is_empty() {
            return Err(RedshiftDataError::Configuration(
                "region must not be empty".into(),
            ));
        }
        if self.worker_threads == 0 {
            return Err(RedshiftDataError::Configuration(
                "worker_threads must be at least 1".into(),
            ));
        }
        self.auth.validate()?;
        self.poll.validate()?;
        self.database
            .validate()
            .map_err(|e| RedshiftDataError::Configuration(e.to_string()))
    }

    /// Redacted view safe for logs (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        let (target_kind, target_name) = match &self.database.target {
            ComputeTarget::Cluster(id) => ("cluster", id.as_str()),
            ComputeTarget::Workgroup(name) => ("workgroup", name.as_str()),
        };
        serde_json::json!({
            "region": self.region,
            "auth": self.auth.label(),
            target_kind: target_name,
            "database": self.database.database,
            "db_user": self.database.db_user,
            "uses_secret": self.database.secret_arn.is_some(),
            "poll_timeout_ms": self.poll.timeout.as_millis() as u64,
            "poll_interval_ms": self.poll.interval.as_millis() as u64,
            "worker_threads": self.worker_threads,
            "endpoint_url": self.endpoint_url,
        })
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!(config = %self.redacted_summary(), "Redshift Data config loaded");
    }
}

// ── Tests ─────────────────────────────────────────────────────
