//! Credential resolution from [`AuthConfig`].

use aws_config::imds::credentials::ImdsCredentialsProvider;
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_credential_types::Credentials;
use tracing::debug;

use redshift_data_core::error::Result;
use redshift_data_core::AuthConfig;

const STATIC_PROVIDER_NAME: &str = "redshift-data-static";

/// Build the credentials provider for `auth`.
///
/// Static keys are used verbatim (session-scoped when a token is present).
/// Instance-profile auth defers to IMDS. Nothing here retries; an invalid
/// config fails immediately.
pub fn resolve_credentials(auth: &AuthConfig) -> Result<SharedCredentialsProvider> {
    auth.validate()?;

    match auth {
        AuthConfig::Static {
            access_key_id,
            secret_access_key,
            session_token,
        } => {
            debug!(session = session_token.is_some(), "Using static credentials");
            let creds = Credentials::new(
                access_key_id,
                secret_access_key,
                session_token.clone(),
                None,
                STATIC_PROVIDER_NAME,
            );
            Ok(SharedCredentialsProvider::new(creds))
        }
        AuthConfig::InstanceProfile { profile_name } => {
            debug!(profile = ?profile_name, "Using instance profile credentials");
            let mut builder = ImdsCredentialsProvider::builder();
            if let Some(name) = profile_name {
                builder = builder.profile(name);
            }
            Ok(SharedCredentialsProvider::new(builder.build()))
        }
    }
}
