use chrono::{serde::ts_milliseconds_option, DateTime, Utc};
use serde::Deserialize;
use serde_repr::Deserialize_repr;
use serde_with::{serde_as, DefaultOnError};

use super::common::{OfferDiscountType, OfferType};
use crate::domain::entities::environment::Environment;

/// Data structure for the decoded payload of a JWSRenewalInfo, returned by the
/// App Store Server API.
///
/// https://developer.apple.com/documentation/appstoreserverapi/jwsrenewalinfodecodedpayload
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwsRenewalInfoDecodedPayloadModel {
    /// The identifier of the product that renews at the next billing period.
    pub auto_renew_product_id: Option<String>,
    /// The renewal status of the auto-renewable subscription.
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub auto_renew_status: Option<AutoRenewStatus>,
    /// The currency code for the renewalPrice of the subscription.
    pub currency: Option<String>,
    /// The list of win-back offer IDs that the customer is eligible for.
    pub eligible_win_back_offer_ids: Option<Vec<String>>,
    /// The server environment, either sandbox or production.
    pub environment: Option<Environment>,
    /// The reason the subscription expired.
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub expiration_intent: Option<ExpirationIntent>,
    /// The time when the Billing Grace Period for subscription renewals
    /// expires.
    #[serde(default, with = "ts_milliseconds_option")]
    pub grace_period_expires_date: Option<DateTime<Utc>>,
    /// Whether the App Store is attempting to automatically renew the expired
    /// subscription.
    pub is_in_billing_retry_period: Option<bool>,
    /// The payment mode of the discount offer.
    pub offer_discount_type: Option<OfferDiscountType>,
    /// The offer code or the promotional offer identifier.
    pub offer_identifier: Option<String>,
    /// The type of subscription offer.
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub offer_type: Option<OfferType>,
    /// The transaction identifier of the original purchase associated with this
    /// transaction.
    pub original_transaction_id: Option<String>,
    /// The status that indicates whether the auto-renewable subscription is
    /// subject to a price increase.
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub price_increase_status: Option<PriceIncreaseStatus>,
    /// The product identifier of the In-App Purchase.
    pub product_id: Option<String>,
    /// The earliest start date of the auto-renewable subscription in a series
    /// of subscription purchases that ignores all lapses of paid service that
    /// are 60 days or fewer.
    #[serde(default, with = "ts_milliseconds_option")]
    pub recent_subscription_start_date: Option<DateTime<Utc>>,
    /// The time when the most recent auto-renewable subscription purchase
    /// expires.
    #[serde(default, with = "ts_milliseconds_option")]
    pub renewal_date: Option<DateTime<Utc>>,
    /// The renewal price, in milliunits, of the auto-renewable subscription
    /// that renews at the next billing period.
    pub renewal_price: Option<i64>,
    /// The time that the App Store signed the JSON Web Signature (JWS) data.
    #[serde(default, with = "ts_milliseconds_option")]
    pub signed_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize_repr)]
#[repr(u8)]
pub enum AutoRenewStatus {
    /// Automatic renewal is off.
    Off = 0,
    /// Automatic renewal is on.
    On = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize_repr)]
#[repr(u8)]
pub enum ExpirationIntent {
    /// The customer canceled their subscription.
    VoluntaryCancellation = 1,
    /// Billing error; for example, the customer's payment information is no
    /// longer valid.
    BillingError = 2,
    /// The customer didn't consent to an auto-renewable subscription price
    /// increase that requires customer consent.
    PriceIncreaseDecline = 3,
    /// The product wasn't available for purchase at the time of renewal.
    ProductUnavailable = 4,
    /// The subscription expired for some other reason.
    Other = 5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize_repr)]
#[repr(u8)]
pub enum PriceIncreaseStatus {
    /// The customer hasn't yet responded to a price increase that requires
    /// consent.
    NoActionTaken = 0,
    /// The customer consented to the price increase, or the App Store notified
    /// them of one that doesn't require consent.
    CustomerConsented = 1,
}
