use std::sync::Arc;

use tracing::debug;

use crate::{
    data::models::app_store_server_notifications::response_body_v2_model::ResponseBodyV2Model,
    domain::entities::verified_notification::VerifiedNotification,
    errors::AppStoreApiError,
    verification::signed_data_verifier::SignedDataVerifier,
};

pub trait AppStoreServerNotificationDatasource: Send + Sync {
    /// Parse App Store Server Notification:
    /// https://developer.apple.com/documentation/appstoreservernotifications/app-store-server-notifications-v2
    ///
    /// notification:
    ///   The raw POST body of the notification.
    ///
    /// Blocks while certificates are checked, so async callers should run it
    /// off the runtime's worker threads.
    fn parse_notification(&self, notification: &str)
        -> Result<VerifiedNotification, AppStoreApiError>;
}

pub struct AppStoreServerNotificationDatasourceImpl {
    verifier: Arc<SignedDataVerifier>,
}

impl AppStoreServerNotificationDatasource for AppStoreServerNotificationDatasourceImpl {
    fn parse_notification(
        &self,
        notification: &str,
    ) -> Result<VerifiedNotification, AppStoreApiError> {
        let wrapper = ResponseBodyV2Model::from_body(notification)?;
        let payload = self
            .verifier
            .verify_and_decode_notification(&wrapper.signed_payload)?;
        debug!(
            notification_type = ?payload.notification_type,
            notification_uuid = ?payload.notification_uuid,
            "verified notification payload"
        );

        let data = payload.data();
        let transaction = data
            .and_then(|data| data.signed_transaction_info.as_deref())
            .map(|t| self.verifier.verify_and_decode_signed_transaction(t))
            .transpose()?;
        let renewal_info = data
            .and_then(|data| data.signed_renewal_info.as_deref())
            .map(|r| self.verifier.verify_and_decode_renewal_info(r))
            .transpose()?;

        Ok(VerifiedNotification {
            payload,
            transaction,
            renewal_info,
        })
    }
}

impl AppStoreServerNotificationDatasourceImpl {
    pub fn new(verifier: Arc<SignedDataVerifier>) -> Self {
        Self { verifier }
    }
}
