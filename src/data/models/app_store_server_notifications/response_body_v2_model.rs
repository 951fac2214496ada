use serde::Deserialize;

use crate::errors::AppStoreApiError;

/// The `responseBodyV2` POST body. Only the signed payload is carried; every
/// other detail lives inside it.
///
/// https://developer.apple.com/documentation/appstoreservernotifications/responsebodyv2
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResponseBodyV2Model {
    pub(crate) signed_payload: String,
}

impl ResponseBodyV2Model {
    pub(crate) fn from_body(body: &str) -> Result<Self, AppStoreApiError> {
        serde_json::from_str(body).map_err(|e| AppStoreApiError::NotificationParse(e.to_string()))
    }
}
