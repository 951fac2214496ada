use crate::data::models::{
    app_store_server_api::{
        jws_renewal_info_decoded_payload_model::JwsRenewalInfoDecodedPayloadModel,
        jws_transaction_decoded_payload_model::JwsTransactionDecodedPayloadModel,
    },
    app_store_server_notifications::response_body_v2_decoded_payload_model::ResponseBodyV2DecodedPayloadModel,
};

/// An App Store Server Notification with its nested signed objects verified
/// and decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedNotification {
    pub payload: ResponseBodyV2DecodedPayloadModel,
    /// Present when the notification's data carried a signedTransactionInfo.
    pub transaction: Option<JwsTransactionDecodedPayloadModel>,
    /// Present when the notification's data carried a signedRenewalInfo.
    pub renewal_info: Option<JwsRenewalInfoDecodedPayloadModel>,
}
