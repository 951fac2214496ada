use std::sync::Arc;

use tracing::info;

use crate::{
    config::{load_root_certificates, ApiClientConfig, VerifierConfig},
    data::{
        datasources::{
            app_store_server_api_datasource::AppStoreServerApiDatasourceImpl,
            app_store_server_notification_datasource::AppStoreServerNotificationDatasourceImpl,
        },
        models::app_store_server_api::{
            jws_transaction_decoded_payload_model::JwsTransactionDecodedPayloadModel,
            responses::SendTestNotificationResponse,
            transaction_history_request_model::TransactionHistoryRequest,
        },
        repositories::app_store_repository_impl::AppStoreRepositoryImpl,
    },
    domain::{
        entities::{
            decoded_payload::{DecodedPayload, PayloadKind},
            test_notification_status::TestNotificationStatus,
            verification_context::VerificationContext,
            verified_notification::VerifiedNotification,
        },
        repositories::app_store_repository::AppStoreRepository,
    },
    errors::AppStoreApiError,
    verification::{chain_verifier::TrustAnchorSet, signed_data_verifier::SignedDataVerifier},
};

/// Entry point for verifying App Store data and talking to the App Store
/// Server API.
pub struct AppStoreUtil<R: AppStoreRepository> {
    app_store_repository: R,
    verifier: Arc<SignedDataVerifier>,
}

impl<R: AppStoreRepository> AppStoreUtil<R> {
    pub async fn verify_and_decode(
        &self,
        kind: PayloadKind,
        token: &str,
    ) -> Result<DecodedPayload, AppStoreApiError> {
        self.app_store_repository.verify_and_decode(kind, token).await
    }

    pub async fn get_transaction_info(
        &self,
        transaction_id: &str,
    ) -> Result<JwsTransactionDecodedPayloadModel, AppStoreApiError> {
        self.app_store_repository
            .get_transaction_info(transaction_id)
            .await
    }

    /// transaction_id:
    ///   Any transaction identifier that belongs to the customer.
    pub async fn get_transaction_history(
        &self,
        transaction_id: &str,
        request: &TransactionHistoryRequest,
    ) -> Result<Vec<JwsTransactionDecodedPayloadModel>, AppStoreApiError> {
        self.app_store_repository
            .get_transaction_history(transaction_id, request)
            .await
    }

    /// body:
    ///   The raw POST body App Store Server Notifications V2 sent to the
    ///   server.
    pub async fn parse_notification(
        &self,
        body: &str,
    ) -> Result<VerifiedNotification, AppStoreApiError> {
        self.app_store_repository.parse_notification(body).await
    }

    pub async fn request_test_notification(
        &self,
    ) -> Result<SendTestNotificationResponse, AppStoreApiError> {
        self.app_store_repository.request_test_notification().await
    }

    /// test_notification_token:
    ///   The token returned by [`AppStoreUtil::request_test_notification`].
    pub async fn get_test_notification_status(
        &self,
        test_notification_token: &str,
    ) -> Result<TestNotificationStatus, AppStoreApiError> {
        self.app_store_repository
            .get_test_notification_status(test_notification_token)
            .await
    }

    /// The underlying synchronous verifier, for callers outside an async
    /// context.
    pub fn verifier(&self) -> &Arc<SignedDataVerifier> {
        &self.verifier
    }
}

/// The util backed by the HTTP API client and the signed notification parser.
pub type DefaultAppStoreUtil = AppStoreUtil<
    AppStoreRepositoryImpl<AppStoreServerApiDatasourceImpl, AppStoreServerNotificationDatasourceImpl>,
>;

impl DefaultAppStoreUtil {
    /// api_config:
    ///   Credentials for the App Store Server API. Without them only locally
    ///   received signed data can be verified.
    pub fn new(
        verifier_config: &VerifierConfig,
        api_config: Option<&ApiClientConfig>,
    ) -> Result<Self, AppStoreApiError> {
        let root_certificates = load_root_certificates(&verifier_config.root_certificates_dir)?;
        let verifier = SignedDataVerifier::with_ocsp_timeout(
            TrustAnchorSet::from_der(root_certificates)?,
            VerificationContext::new(
                verifier_config.environment.clone(),
                verifier_config.bundle_id.as_str(),
                verifier_config.app_apple_id,
                verifier_config.enable_online_checks,
            )?,
            verifier_config.ocsp_timeout(),
        )?;
        Self::with_verifier(Arc::new(verifier), api_config)
    }

    /// Reads both configurations from `APP_STORE_*` environment variables. The
    /// API client is only set up when its key is present.
    pub fn from_env() -> Result<Self, AppStoreApiError> {
        let verifier_config = VerifierConfig::from_env()?;
        let api_config = match std::env::var(crate::config::APP_STORE_SIGNING_KEY) {
            Ok(_) => Some(ApiClientConfig::from_env()?),
            Err(_) => None,
        };
        Self::new(&verifier_config, api_config.as_ref())
    }

    pub fn with_verifier(
        verifier: Arc<SignedDataVerifier>,
        api_config: Option<&ApiClientConfig>,
    ) -> Result<Self, AppStoreApiError> {
        let api_datasource = api_config
            .map(|c| {
                AppStoreServerApiDatasourceImpl::new(
                    &c.signing_key,
                    &c.key_id,
                    &c.issuer_id,
                    &c.bundle_id,
                    &c.environment,
                )
            })
            .transpose()?;
        info!(
            environment = %verifier.context().environment(),
            bundle_id = verifier.context().bundle_id(),
            api_client = api_datasource.is_some(),
            "initialized App Store util"
        );
        Ok(Self {
            app_store_repository: AppStoreRepositoryImpl::new(
                api_datasource,
                AppStoreServerNotificationDatasourceImpl::new(verifier.clone()),
                verifier.clone(),
            ),
            verifier,
        })
    }
}
