use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::{
    data::{
        datasources::{
            app_store_server_api_datasource::AppStoreServerApiDatasource,
            app_store_server_notification_datasource::AppStoreServerNotificationDatasource,
        },
        models::app_store_server_api::{
            jws_transaction_decoded_payload_model::JwsTransactionDecodedPayloadModel,
            responses::{CheckTestNotificationResponseModel, SendTestNotificationResponse},
            transaction_history_request_model::TransactionHistoryRequest,
        },
    },
    domain::{
        entities::{
            decoded_payload::{DecodedPayload, PayloadKind},
            test_notification_status::TestNotificationStatus,
            verified_notification::VerifiedNotification,
        },
        repositories::app_store_repository::AppStoreRepository,
    },
    errors::AppStoreApiError,
    verification::signed_data_verifier::SignedDataVerifier,
};

pub struct AppStoreRepositoryImpl<
    A: AppStoreServerApiDatasource,
    B: AppStoreServerNotificationDatasource,
> {
    app_store_server_api_datasource: Option<A>,
    app_store_server_notification_datasource: Arc<B>,
    verifier: Arc<SignedDataVerifier>,
}

impl<A, B> AppStoreRepositoryImpl<A, B>
where
    A: AppStoreServerApiDatasource,
    B: AppStoreServerNotificationDatasource + 'static,
{
    pub fn new(
        app_store_server_api_datasource: Option<A>,
        app_store_server_notification_datasource: B,
        verifier: Arc<SignedDataVerifier>,
    ) -> Self {
        Self {
            app_store_server_api_datasource,
            app_store_server_notification_datasource: Arc::new(
                app_store_server_notification_datasource,
            ),
            verifier,
        }
    }

    fn api(&self) -> Result<&A, AppStoreApiError> {
        self.app_store_server_api_datasource
            .as_ref()
            .ok_or(AppStoreApiError::ApiNotConfigured)
    }

    /// Runs `f` on the blocking pool. Chain verification may do synchronous
    /// network I/O for revocation checks.
    async fn blocking<T, F>(f: F) -> Result<T, AppStoreApiError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, AppStoreApiError> + Send + 'static,
    {
        tokio::task::spawn_blocking(f)
            .await
            .map_err(|e| AppStoreApiError::TaskJoin(e.to_string()))?
    }
}

#[async_trait]
impl<A, B> AppStoreRepository for AppStoreRepositoryImpl<A, B>
where
    A: AppStoreServerApiDatasource,
    B: AppStoreServerNotificationDatasource + 'static,
{
    async fn verify_and_decode(
        &self,
        kind: PayloadKind,
        token: &str,
    ) -> Result<DecodedPayload, AppStoreApiError> {
        let verifier = self.verifier.clone();
        let token = token.to_owned();
        Self::blocking(move || Ok(verifier.verify_and_decode(kind, &token)?)).await
    }

    async fn get_transaction_info(
        &self,
        transaction_id: &str,
    ) -> Result<JwsTransactionDecodedPayloadModel, AppStoreApiError> {
        let signed_transaction = self.api()?.get_transaction_info(transaction_id).await?;
        debug!(transaction_id, "fetched signed transaction");
        let verifier = self.verifier.clone();
        Self::blocking(move || {
            Ok(verifier.verify_and_decode_signed_transaction(&signed_transaction)?)
        })
        .await
    }

    async fn get_transaction_history(
        &self,
        transaction_id: &str,
        request: &TransactionHistoryRequest,
    ) -> Result<Vec<JwsTransactionDecodedPayloadModel>, AppStoreApiError> {
        let api = self.api()?;
        let mut transactions = Vec::new();
        let mut revision: Option<String> = None;
        loop {
            let page = api
                .get_transaction_history(transaction_id, revision.as_deref(), request)
                .await?;
            let verifier = self.verifier.clone();
            let signed_transactions = page.signed_transactions;
            transactions.extend(
                Self::blocking(move || {
                    signed_transactions
                        .iter()
                        .map(|t| Ok(verifier.verify_and_decode_signed_transaction(t)?))
                        .collect::<Result<Vec<_>, AppStoreApiError>>()
                })
                .await?,
            );
            if !page.has_more {
                break;
            }
            match page.revision {
                Some(next) if revision.as_deref() != Some(next.as_str()) => {
                    revision = Some(next)
                }
                _ => {
                    return Err(AppStoreApiError::InvalidResponse {
                        function: "GetTransactionHistory",
                        details: "hasMore is set but the revision did not advance".to_string(),
                    })
                }
            }
        }
        debug!(
            transaction_id,
            count = transactions.len(),
            "fetched transaction history"
        );
        Ok(transactions)
    }

    async fn parse_notification(
        &self,
        body: &str,
    ) -> Result<VerifiedNotification, AppStoreApiError> {
        let datasource = self.app_store_server_notification_datasource.clone();
        let body = body.to_owned();
        Self::blocking(move || datasource.parse_notification(&body)).await
    }

    async fn request_test_notification(
        &self,
    ) -> Result<SendTestNotificationResponse, AppStoreApiError> {
        self.api()?.request_test_notification().await
    }

    async fn get_test_notification_status(
        &self,
        test_notification_token: &str,
    ) -> Result<TestNotificationStatus, AppStoreApiError> {
        let CheckTestNotificationResponseModel {
            signed_payload,
            send_attempts,
        } = self
            .api()?
            .get_test_notification_status(test_notification_token)
            .await?;
        let verifier = self.verifier.clone();
        let payload = Self::blocking(move || {
            Ok(signed_payload
                .map(|p| verifier.verify_and_decode_notification(&p))
                .transpose()?)
        })
        .await?;
        Ok(TestNotificationStatus {
            payload,
            send_attempts,
        })
    }
}
