use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_config::profile::profile_file::{ProfileFileKind, ProfileFiles};
use aws_config::retry::RetryConfig as SdkRetryConfig;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};

use crate::config::ClientConfig;
use crate::types::S3Credentials;

const CREDENTIALS_PROVIDER_NAME: &str = "s3sweep";

impl ClientConfig {
    /// Build an AWS S3 client from this configuration.
    ///
    /// Credentials come from a named profile, explicit access keys, or the
    /// SDK's default environment chain. Region, endpoint and retry settings
    /// override the environment when set.
    pub async fn create_client(&self) -> Client {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        match &self.credential {
            S3Credentials::Profile(profile_name) => {
                loader = loader.profile_name(profile_name);
            }
            S3Credentials::Credentials { access_keys } => {
                let credentials = Credentials::new(
                    access_keys.access_key.clone(),
                    access_keys.secret_access_key.clone(),
                    access_keys.session_token.clone(),
                    None,
                    CREDENTIALS_PROVIDER_NAME,
                );
                loader = loader.credentials_provider(credentials);
            }
            S3Credentials::FromEnvironment => {}
        }

        if self.client_config_location.aws_config_file.is_some()
            || self.client_config_location.aws_shared_credentials_file.is_some()
        {
            let mut profile_files_builder = ProfileFiles::builder();
            if let Some(ref config_file) = self.client_config_location.aws_config_file {
                profile_files_builder =
                    profile_files_builder.with_file(ProfileFileKind::Config, config_file);
            } else {
                profile_files_builder = profile_files_builder.include_default_config_file(true);
            }
            if let Some(ref credentials_file) =
                self.client_config_location.aws_shared_credentials_file
            {
                profile_files_builder =
                    profile_files_builder.with_file(ProfileFileKind::Credentials, credentials_file);
            } else {
                profile_files_builder =
                    profile_files_builder.include_default_credentials_file(true);
            }
            loader = loader.profile_files(profile_files_builder.build());
        }

        if let Some(ref region) = self.region {
            loader = loader.region(Region::new(region.clone()));
        }

        if let Some(ref endpoint_url) = self.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }

        let retry_config = if self.retry_config.aws_max_attempts == 0 {
            SdkRetryConfig::disabled()
        } else {
            SdkRetryConfig::standard()
                .with_max_attempts(self.retry_config.aws_max_attempts)
                .with_initial_backoff(Duration::from_millis(
                    self.retry_config.initial_backoff_milliseconds,
                ))
        };
        loader = loader.retry_config(retry_config);

        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(self.force_path_style)
            .build();

        Client::from_conf(s3_config)
    }
}
