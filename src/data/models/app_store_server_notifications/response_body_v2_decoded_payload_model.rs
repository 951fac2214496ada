use chrono::{serde::ts_milliseconds_option, DateTime, Utc};
use serde::Deserialize;
use serde_repr::Deserialize_repr;
use serde_with::{serde_as, DefaultOnError};

use crate::{domain::entities::environment::Environment, errors::VerificationError};

type JwsTransaction = String;
type JwsRenewalInfo = String;

/// Data structure for the decoded payload of a SignedPayload, sent by the App
/// Store Server Notifications service.
///
/// https://developer.apple.com/documentation/appstoreservernotifications/responsebodyv2decodedpayload
///
/// Apple documents the `data`, `summary` and `externalPurchaseToken` fields as
/// mutually exclusive. They are exposed as the single [`NotificationContent`]
/// value, and decoding fails unless exactly one of them is present.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseBodyV2DecodedPayloadModel {
    /// The in-app purchase event for which the App Store sends this version 2
    /// notification.
    pub notification_type: Option<NotificationType>,
    /// Additional information that identifies the notification event. Present
    /// only for specific version 2 notifications.
    pub subtype: Option<NotificationSubtype>,
    /// Whichever of `data`, `summary` or `externalPurchaseToken` the
    /// notification carries.
    pub content: NotificationContent,
    /// The App Store Server Notification version number, "2.0".
    pub version: Option<String>,
    /// The time that the App Store signed the JSON Web Signature data.
    pub signed_date: Option<DateTime<Utc>>,
    /// A unique identifier for the notification. Use this value to identify a
    /// duplicate notification.
    pub notification_uuid: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationContent {
    /// App metadata and the signed renewal and transaction information.
    Data(NotificationData),
    /// Summary of a completed request to extend subscription renewal dates for
    /// all eligible subscribers.
    Summary(NotificationSummary),
    /// Present when the notificationType is EXTERNAL_PURCHASE_TOKEN.
    ExternalPurchaseToken(ExternalPurchaseToken),
}

impl NotificationContent {
    fn from_parts(
        data: Option<NotificationData>,
        summary: Option<NotificationSummary>,
        external_purchase_token: Option<ExternalPurchaseToken>,
    ) -> Result<Self, VerificationError> {
        match (data, summary, external_purchase_token) {
            (Some(data), None, None) => Ok(NotificationContent::Data(data)),
            (None, Some(summary), None) => Ok(NotificationContent::Summary(summary)),
            (None, None, Some(token)) => Ok(NotificationContent::ExternalPurchaseToken(token)),
            (None, None, None) => Err(VerificationError::MissingField(
                "data, summary or externalPurchaseToken",
            )),
            _ => Err(VerificationError::MalformedToken(
                "notification carries more than one of data, summary and externalPurchaseToken"
                    .to_string(),
            )),
        }
    }
}

impl ResponseBodyV2DecodedPayloadModel {
    pub(crate) fn from_verified_claims(
        claims: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self, VerificationError> {
        let raw: RawResponseBodyV2DecodedPayloadModel =
            serde_json::from_value(serde_json::Value::Object(claims)).map_err(|e| {
                VerificationError::MalformedToken(format!("invalid notification payload: {e}"))
            })?;
        Ok(Self {
            notification_type: raw.notification_type,
            subtype: raw.subtype,
            content: NotificationContent::from_parts(
                raw.data,
                raw.summary,
                raw.external_purchase_token,
            )?,
            version: raw.version,
            signed_date: raw.signed_date,
            notification_uuid: raw.notification_uuid,
        })
    }

    pub fn data(&self) -> Option<&NotificationData> {
        match &self.content {
            NotificationContent::Data(data) => Some(data),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResponseBodyV2DecodedPayloadModel {
    notification_type: Option<NotificationType>,
    subtype: Option<NotificationSubtype>,
    data: Option<NotificationData>,
    summary: Option<NotificationSummary>,
    external_purchase_token: Option<ExternalPurchaseToken>,
    version: Option<String>,
    #[serde(default, with = "ts_milliseconds_option")]
    signed_date: Option<DateTime<Utc>>,
    #[serde(rename = "notificationUUID")]
    notification_uuid: Option<String>,
}

/// https://developer.apple.com/documentation/appstoreservernotifications/notificationtype
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    Subscribed,
    DidChangeRenewalPref,
    DidChangeRenewalStatus,
    OfferRedeemed,
    DidRenew,
    Expired,
    DidFailToRenew,
    GracePeriodExpired,
    PriceIncrease,
    Refund,
    RefundDeclined,
    RefundReversed,
    RenewalExtended,
    RenewalExtension,
    Revoke,
    /// Sent when you request it by calling Request a Test Notification.
    Test,
    ExternalPurchaseToken,
    OneTimeCharge,
    ConsumptionRequest,

    #[serde(untagged)]
    Unknown(String),
}

/// https://developer.apple.com/documentation/appstoreservernotifications/subtype
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationSubtype {
    InitialBuy,
    Resubscribe,
    Downgrade,
    Upgrade,
    AutoRenewEnabled,
    AutoRenewDisabled,
    Voluntary,
    BillingRetry,
    PriceIncrease,
    GracePeriod,
    Pending,
    Accepted,
    BillingRecovery,
    ProductNotForSale,
    Summary,
    Failure,
    Unreported,

    #[serde(untagged)]
    Unknown(String),
}

/// https://developer.apple.com/documentation/appstoreservernotifications/data
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    /// The unique identifier of the app that the notification applies to. This
    /// property is available for apps that users download from the App Store.
    /// It isn't present in the sandbox environment.
    pub app_apple_id: Option<i64>,
    /// The bundle identifier of the app.
    pub bundle_id: Option<String>,
    /// The version of the build that identifies an iteration of the bundle.
    pub bundle_version: Option<String>,
    /// The reason the customer requested the refund.
    pub consumption_request_reason: Option<ConsumptionRequestReason>,
    /// The server environment that the notification applies to, either
    /// sandbox or production.
    pub environment: Option<Environment>,
    /// Subscription renewal information signed by the App Store, in JSON Web
    /// Signature (JWS) format.
    pub signed_renewal_info: Option<JwsRenewalInfo>,
    /// Transaction information signed by the App Store, in JSON Web Signature
    /// (JWS) format.
    pub signed_transaction_info: Option<JwsTransaction>,
    /// The status of an auto-renewable subscription as of the signedDate in
    /// the decoded payload.
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub status: Option<SubscriptionStatus>,
}

/// https://developer.apple.com/documentation/appstoreservernotifications/summary
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSummary {
    /// The UUID that represents a specific request to extend a subscription
    /// renewal date.
    pub request_identifier: Option<String>,
    /// The server environment that the notification applies to.
    pub environment: Option<Environment>,
    /// The unique identifier of the app that the notification applies to.
    pub app_apple_id: Option<i64>,
    /// The bundle identifier of the app.
    pub bundle_id: Option<String>,
    /// The product identifier of the auto-renewable subscription that the
    /// renewal date extension applies to.
    pub product_id: Option<String>,
    /// A list of country codes that limits the renewal date extension.
    pub storefront_country_codes: Option<Vec<String>>,
    /// The final count of subscriptions that fail to receive a renewal date
    /// extension.
    pub failed_count: Option<i64>,
    /// The final count of subscriptions that successfully receive a renewal
    /// date extension.
    pub succeeded_count: Option<i64>,
}

/// https://developer.apple.com/documentation/appstoreservernotifications/externalpurchasetoken
///
/// Carries no environment of its own; see
/// [`ExternalPurchaseToken::inferred_environment`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalPurchaseToken {
    /// The unique identifier of the token.
    pub external_purchase_id: Option<String>,
    /// The time the system created the token.
    #[serde(default, with = "ts_milliseconds_option")]
    pub token_creation_date: Option<DateTime<Utc>>,
    /// The app Apple ID for which the system generated the token.
    pub app_apple_id: Option<i64>,
    /// The bundle ID of the app for which the system generated the token.
    pub bundle_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsumptionRequestReason {
    UnintendedPurchase,
    FulfillmentIssue,
    UnsatisfiedWithPurchase,
    Legal,
    Other,

    #[serde(untagged)]
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize_repr)]
#[repr(u8)]
pub enum SubscriptionStatus {
    Active = 1,
    Expired = 2,
    BillingRetry = 3,
    BillingGracePeriod = 4,
    Revoked = 5,
}
