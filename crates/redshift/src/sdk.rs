//! [`DataApi`] backed by `aws-sdk-redshiftdata`.

use async_trait::async_trait;
use aws_sdk_redshiftdata::config::{BehaviorVersion, Region};
use aws_sdk_redshiftdata::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_redshiftdata::types::SqlParameter;
use tracing::{debug, info};

use redshift_data_core::error::Result;
use redshift_data_core::{
    ComputeTarget, ConnectionConfig, RedshiftDataError, StatementDescription, StatementHandle,
};

use crate::api::{BatchExecuteRequest, DataApi, ExecuteRequest};
use crate::credentials::resolve_credentials;
use crate::result::ResultPage;
use crate::translate::{description_from_sdk, page_from_sdk};

/// Production Data API client.
#[derive(Clone)]
pub struct SdkDataApi {
    client: aws_sdk_redshiftdata::Client,
}

impl SdkDataApi {
    /// Build the SDK client from `config`. Credential problems surface here.
    pub fn from_config(config: &ConnectionConfig) -> Result<Self> {
        let credentials = resolve_credentials(&config.auth)?;

        // Build the service config directly; aws_config::defaults() would also
        // pick up endpoint overrides meant for other services.
        let mut builder = aws_sdk_redshiftdata::Config::builder()
            .region(Region::new(config.region.clone()))
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(credentials);

        if let Some(endpoint) = config.endpoint_url.as_deref().filter(|e| !e.is_empty()) {
            let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
                endpoint.to_string()
            } else {
                format!("https://{endpoint}")
            };
            builder = builder.endpoint_url(url);
        }

        info!(
            region = %config.region,
            auth = config.auth.label(),
            "Redshift Data SDK client initialised"
        );

        Ok(Self::from_client(aws_sdk_redshiftdata::Client::from_conf(
            builder.build(),
        )))
    }

    pub fn from_client(client: aws_sdk_redshiftdata::Client) -> Self {
        Self { client }
    }
}

/// Service errors mean the provider rejected the call; anything else
/// (transport, timeouts, response parsing) is passed through as opaque.
fn sdk_error<E, R>(operation: &'static str, err: SdkError<E, R>) -> RedshiftDataError
where
    E: std::error::Error + ProvideErrorMetadata + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    match err.as_service_error() {
        Some(service) => RedshiftDataError::Rejected {
            operation: operation.to_string(),
            code: service.code().unwrap_or("Unknown").to_string(),
            message: service.message().unwrap_or_default().to_string(),
        },
        None => RedshiftDataError::Provider(format!("{operation}: {}", DisplayErrorContext(&err))),
    }
}

#[async_trait]
impl DataApi for SdkDataApi {
    async fn execute_statement(&self, request: ExecuteRequest) -> Result<StatementHandle> {
        let target = request.target;
        let mut call = self
            .client
            .execute_statement()
            .sql(request.sql)
            .database(target.database)
            .set_db_user(target.db_user)
            .set_secret_arn(target.secret_arn)
            .set_statement_name(request.statement_name)
            .with_event(request.with_event)
            .set_client_token(request.client_token);

        call = match target.target {
            ComputeTarget::Cluster(id) => call.cluster_identifier(id),
            ComputeTarget::Workgroup(name) => call.workgroup_name(name),
        };

        if !request.parameters.is_empty() {
            let parameters = request
                .parameters
                .into_iter()
                .map(|p| {
                    SqlParameter::builder()
                        .name(p.name)
                        .value(p.value)
                        .build()
                        .map_err(|e| RedshiftDataError::Validation(e.to_string()))
                })
                .collect::<Result<Vec<_>>>()?;
            call = call.set_parameters(Some(parameters));
        }

        let output = call
            .send()
            .await
            .map_err(|e| sdk_error("execute_statement", e))?;

        let id = output
            .id()
            .ok_or_else(|| RedshiftDataError::Provider("no statement id returned".into()))?;
        debug!(statement_id = %id, "Statement submitted");
        Ok(id.into())
    }

    async fn batch_execute_statement(&self, request: BatchExecuteRequest) -> Result<StatementHandle> {
        let target = request.target;
        let mut call = self
            .client
            .batch_execute_statement()
            .set_sqls(Some(request.sqls))
            .database(target.database)
            .set_db_user(target.db_user)
            .set_secret_arn(target.secret_arn)
            .set_statement_name(request.statement_name)
            .with_event(request.with_event)
            .set_client_token(request.client_token);

        call = match target.target {
            ComputeTarget::Cluster(id) => call.cluster_identifier(id),
            ComputeTarget::Workgroup(name) => call.workgroup_name(name),
        };

        let output = call
            .send()
            .await
            .map_err(|e| sdk_error("batch_execute_statement", e))?;

        let id = output
            .id()
            .ok_or_else(|| RedshiftDataError::Provider("no batch id returned".into()))?;
        debug!(statement_id = %id, "Batch submitted");
        Ok(id.into())
    }

    async fn describe_statement(&self, id: &StatementHandle) -> Result<StatementDescription> {
        let output = self
            .client
            .describe_statement()
            .id(id.as_str())
            .send()
            .await
            .map_err(|e| sdk_error("describe_statement", e))?;

        description_from_sdk(&output)
    }

    async fn get_statement_result(
        &self,
        id: &StatementHandle,
        next_token: Option<String>,
    ) -> Result<ResultPage> {
        let output = self
            .client
            .get_statement_result()
            .id(id.as_str())
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| sdk_error("get_statement_result", e))?;

        page_from_sdk(&output)
    }

    async fn cancel_statement(&self, id: &StatementHandle) -> Result<bool> {
        let output = self
            .client
            .cancel_statement()
            .id(id.as_str())
            .send()
            .await
            .map_err(|e| sdk_error("cancel_statement", e))?;

        Ok(output.status().unwrap_or(false))
    }
}
