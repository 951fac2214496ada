//! Response bodies of the App Store Server API endpoints this crate calls.

use serde::Deserialize;

/// https://developer.apple.com/documentation/appstoreserverapi/transactioninforesponse
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TransactionInfoResponseModel {
    /// Signed by Apple, and still to be verified by the caller.
    pub(crate) signed_transaction_info: String,
}

/// https://developer.apple.com/documentation/appstoreserverapi/sendtestnotificationresponse
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTestNotificationResponse {
    /// Identifies the test notification App Store Server Notifications sends
    /// in response to the request.
    pub test_notification_token: Option<String>,
}

/// One page of a customer's transaction history.
///
/// https://developer.apple.com/documentation/appstoreserverapi/historyresponse
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponseModel {
    /// Token for requesting the next page.
    pub revision: Option<String>,
    #[serde(default)]
    pub has_more: bool,
    /// Signed by Apple, and still to be verified by the caller.
    #[serde(default)]
    pub signed_transactions: Vec<String>,
}

/// https://developer.apple.com/documentation/appstoreserverapi/checktestnotificationresponse
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckTestNotificationResponseModel {
    /// The test notification, signed by Apple and still to be verified.
    pub signed_payload: Option<String>,
    #[serde(default)]
    pub send_attempts: Vec<SendAttemptItem>,
}

/// https://developer.apple.com/documentation/appstoreserverapi/sendattemptitem
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendAttemptItem {
    /// UNIX time in milliseconds of the attempt.
    pub attempt_date: Option<i64>,
    pub send_attempt_result: Option<SendAttemptResult>,
}

/// https://developer.apple.com/documentation/appstoreserverapi/sendattemptresult
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SendAttemptResult {
    Success,
    TimedOut,
    TlsIssue,
    CircularRedirect,
    NoResponse,
    SocketIssue,
    UnsupportedCharset,
    InvalidResponse,
    PrematureClose,
    UnsuccessfulHttpResponseCode,
    Other,

    #[serde(untagged)]
    Unknown(String),
}
