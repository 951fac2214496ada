use async_trait::async_trait;

use crate::{
    data::models::app_store_server_api::{
        jws_transaction_decoded_payload_model::JwsTransactionDecodedPayloadModel,
        responses::SendTestNotificationResponse,
        transaction_history_request_model::TransactionHistoryRequest,
    },
    domain::entities::{
        decoded_payload::{DecodedPayload, PayloadKind},
        test_notification_status::TestNotificationStatus,
        verified_notification::VerifiedNotification,
    },
    errors::AppStoreApiError,
};

#[async_trait]
pub trait AppStoreRepository: Send + Sync {
    /// Verifies a signed payload received from a device or a server
    /// notification and decodes it as `kind`.
    async fn verify_and_decode(
        &self,
        kind: PayloadKind,
        token: &str,
    ) -> Result<DecodedPayload, AppStoreApiError>;

    /// Fetches a transaction from the App Store Server API and verifies the
    /// signed response.
    async fn get_transaction_info(
        &self,
        transaction_id: &str,
    ) -> Result<JwsTransactionDecodedPayloadModel, AppStoreApiError>;

    /// Follows every page of the customer's transaction history and verifies
    /// each signed transaction. Fails on the first one that does not verify.
    async fn get_transaction_history(
        &self,
        transaction_id: &str,
        request: &TransactionHistoryRequest,
    ) -> Result<Vec<JwsTransactionDecodedPayloadModel>, AppStoreApiError>;

    async fn parse_notification(&self, body: &str)
        -> Result<VerifiedNotification, AppStoreApiError>;

    async fn request_test_notification(
        &self,
    ) -> Result<SendTestNotificationResponse, AppStoreApiError>;

    async fn get_test_notification_status(
        &self,
        test_notification_token: &str,
    ) -> Result<TestNotificationStatus, AppStoreApiError>;
}
