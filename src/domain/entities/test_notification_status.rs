use crate::data::models::{
    app_store_server_api::responses::SendAttemptItem,
    app_store_server_notifications::response_body_v2_decoded_payload_model::ResponseBodyV2DecodedPayloadModel,
};

/// Delivery state of a test notification requested through the App Store
/// Server API.
#[derive(Debug, Clone, PartialEq)]
pub struct TestNotificationStatus {
    /// The verified test notification Apple tried to deliver.
    pub payload: Option<ResponseBodyV2DecodedPayloadModel>,
    /// Each delivery attempt to the server, oldest first.
    pub send_attempts: Vec<SendAttemptItem>,
}
