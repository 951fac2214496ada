use chrono::{serde::ts_milliseconds_option, DateTime, Utc};
use serde::Deserialize;

use crate::domain::entities::environment::Environment;

/// Information that represents the customer's purchase of the app,
/// cryptographically signed by the App Store.
///
/// https://developer.apple.com/documentation/storekit/apptransaction
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppTransactionModel {
    /// The server environment that signs the app transaction.
    pub receipt_type: Option<Environment>,
    /// The unique identifier the App Store uses to identify the app.
    pub app_apple_id: Option<i64>,
    /// The bundle identifier that the app transaction applies to.
    pub bundle_id: Option<String>,
    /// The app version that the app transaction applies to.
    pub application_version: Option<String>,
    /// The version external identifier of the app.
    pub version_external_identifier: Option<i64>,
    /// The date that the App Store signed the JWS app transaction.
    #[serde(default, with = "ts_milliseconds_option")]
    pub receipt_creation_date: Option<DateTime<Utc>>,
    /// The date the user originally purchased the app from the App Store.
    #[serde(default, with = "ts_milliseconds_option")]
    pub original_purchase_date: Option<DateTime<Utc>>,
    /// The app version that the user originally purchased from the App Store.
    pub original_application_version: Option<String>,
    /// The Base64 device verification value to use to verify whether the app
    /// transaction belongs to the device.
    pub device_verification: Option<String>,
    /// The UUID used to compute the device verification value.
    pub device_verification_nonce: Option<String>,
    /// The date the customer placed an order for the app before it's available
    /// in the App Store.
    #[serde(default, with = "ts_milliseconds_option")]
    pub preorder_date: Option<DateTime<Utc>>,
}
