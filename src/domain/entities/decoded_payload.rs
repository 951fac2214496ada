use crate::data::models::{
    app_store_server_api::{
        app_transaction_model::AppTransactionModel,
        jws_renewal_info_decoded_payload_model::JwsRenewalInfoDecodedPayloadModel,
        jws_transaction_decoded_payload_model::JwsTransactionDecodedPayloadModel,
    },
    app_store_server_notifications::response_body_v2_decoded_payload_model::ResponseBodyV2DecodedPayloadModel,
};

/// The kinds of signed data the App Store issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Transaction,
    RenewalInfo,
    Notification,
    AppTransaction,
}

/// A payload that passed signature, chain and identity verification.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedPayload {
    Transaction(JwsTransactionDecodedPayloadModel),
    RenewalInfo(JwsRenewalInfoDecodedPayloadModel),
    Notification(ResponseBodyV2DecodedPayloadModel),
    AppTransaction(AppTransactionModel),
}

impl DecodedPayload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            DecodedPayload::Transaction(_) => PayloadKind::Transaction,
            DecodedPayload::RenewalInfo(_) => PayloadKind::RenewalInfo,
            DecodedPayload::Notification(_) => PayloadKind::Notification,
            DecodedPayload::AppTransaction(_) => PayloadKind::AppTransaction,
        }
    }
}
