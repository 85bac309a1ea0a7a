//! Tests for building a client from environment configuration.

use std::env;
use std::sync::Mutex;
use std::time::Duration;

use redshift_data::{AuthConfig, ConnectionConfig, ErrorKind, RedshiftDataClient};

// Env-based tests must run serially to avoid interfering with each other.
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_redshift_env() {
    let keys = [
        "REDSHIFT_PROFILE",
        "REDSHIFT_REGION",
        "AWS_REGION",
        "AWS_ACCESS_KEY_ID",
        "AWS_SECRET_ACCESS_KEY",
        "AWS_SESSION_TOKEN",
        "REDSHIFT_INSTANCE_PROFILE",
        "REDSHIFT_CLUSTER_ID",
        "REDSHIFT_WORKGROUP",
        "REDSHIFT_DATABASE",
        "REDSHIFT_DB_USER",
        "REDSHIFT_SECRET_ARN",
        "REDSHIFT_POLL_TIMEOUT_SECONDS",
        "REDSHIFT_POLL_INTERVAL_MS",
        "REDSHIFT_CANCEL_ON_TIMEOUT",
        "REDSHIFT_WORKER_THREADS",
        "REDSHIFT_ENDPOINT_URL",
        "STAGING_REDSHIFT_WORKGROUP",
        "STAGING_AWS_ACCESS_KEY_ID",
        "STAGING_AWS_SECRET_ACCESS_KEY",
    ];
    for k in keys {
        env::remove_var(k);
    }
}

#[test]
fn test_client_from_env_with_static_keys() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_redshift_env();

    env::set_var("REDSHIFT_WORKGROUP", "analytics-wg");
    env::set_var("AWS_ACCESS_KEY_ID", "AKIAEXAMPLE");
    env::set_var("AWS_SECRET_ACCESS_KEY", "secret");
    env::set_var("REDSHIFT_POLL_TIMEOUT_SECONDS", "120");
    env::set_var("REDSHIFT_CANCEL_ON_TIMEOUT", "true");
    env::set_var("REDSHIFT_WORKER_THREADS", "2");
    env::set_var("REDSHIFT_ENDPOINT_URL", "localhost:4566");

    let config = ConnectionConfig::from_env().unwrap();
    assert_eq!(config.poll.timeout, Duration::from_secs(120));
    assert!(config.poll.cancel_on_timeout);
    assert_eq!(config.worker_threads, 2);

    let client = RedshiftDataClient::new(config).unwrap();
    assert_eq!(client.database().database, "dev");
    assert_eq!(client.poll_config().timeout, Duration::from_secs(120));
    client.close().unwrap();

    clear_redshift_env();
}

#[test]
fn test_profile_prefix_selects_environment() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_redshift_env();

    env::set_var("REDSHIFT_PROFILE", "staging");
    env::set_var("REDSHIFT_WORKGROUP", "prod-wg");
    env::set_var("STAGING_REDSHIFT_WORKGROUP", "staging-wg");
    env::set_var("STAGING_AWS_ACCESS_KEY_ID", "AKIASTAGING");
    env::set_var("STAGING_AWS_SECRET_ACCESS_KEY", "staging-secret");

    let config = ConnectionConfig::from_env().unwrap();
    assert_eq!(
        config.database.target,
        redshift_data::ComputeTarget::Workgroup("staging-wg".into())
    );
    assert!(matches!(config.auth, AuthConfig::Static { .. }));

    clear_redshift_env();
}

#[test]
fn test_missing_target_is_configuration_error() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_redshift_env();

    let err = ConnectionConfig::from_env().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);

    clear_redshift_env();
}

#[test]
fn test_cluster_without_identity_fails_client_construction() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_redshift_env();

    env::set_var("REDSHIFT_CLUSTER_ID", "analytics");
    env::set_var("AWS_ACCESS_KEY_ID", "AKIAEXAMPLE");
    env::set_var("AWS_SECRET_ACCESS_KEY", "secret");

    let config = ConnectionConfig::from_env().unwrap();
    let err = RedshiftDataClient::new(config).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Configuration);

    clear_redshift_env();
}

#[test]
fn test_instance_profile_client_builds_without_network() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_redshift_env();

    env::set_var("REDSHIFT_CLUSTER_ID", "analytics");
    env::set_var("REDSHIFT_DB_USER", "awsuser");
    env::set_var("REDSHIFT_INSTANCE_PROFILE", "redshift-role");

    let config = ConnectionConfig::from_env().unwrap();
    assert_eq!(
        config.auth,
        AuthConfig::InstanceProfile {
            profile_name: Some("redshift-role".into())
        }
    );

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let _guard = runtime.enter();
    let client = RedshiftDataClient::new(config).unwrap();
    client.close().unwrap();

    clear_redshift_env();
}
