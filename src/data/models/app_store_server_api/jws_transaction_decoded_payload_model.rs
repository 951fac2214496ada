use chrono::{serde::ts_milliseconds_option, DateTime, Utc};
use serde::Deserialize;
use serde_repr::Deserialize_repr;
use serde_with::{serde_as, DefaultOnError};

use super::common::{OfferDiscountType, OfferType};
use crate::domain::entities::environment::Environment;

/// Data structure for the decoded payload of a JWSTransaction, returned by the
/// App Store Server API.
///
/// https://developer.apple.com/documentation/appstoreserverapi/jwstransactiondecodedpayload
///
/// Every field is optional so that payloads keep decoding as Apple adds and
/// retires fields; unrecognized fields are ignored.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwsTransactionDecodedPayloadModel {
    /// A UUID you create at the time of purchase that associates the
    /// transaction with a customer on your own service.
    pub app_account_token: Option<String>,
    /// The bundle identifier of the app.
    pub bundle_id: Option<String>,
    /// The three-letter ISO 4217 currency code associated with the price
    /// parameter. This value is present only if price is present.
    pub currency: Option<String>,
    /// The server environment, either sandbox or production.
    pub environment: Option<Environment>,
    /// The time that the subscription expires or renews.
    #[serde(default, with = "ts_milliseconds_option")]
    pub expires_date: Option<DateTime<Utc>>,
    /// A string that describes whether the transaction was purchased by the
    /// customer, or is available to them through Family Sharing.
    pub in_app_ownership_type: Option<InAppOwnershipType>,
    /// A Boolean value that indicates whether the customer upgraded to another
    /// subscription.
    pub is_upgraded: Option<bool>,
    /// The payment mode you configure for the subscription offer, such as Free
    /// Trial, Pay As You Go, or Pay Up Front.
    pub offer_discount_type: Option<OfferDiscountType>,
    /// The identifier that contains the offer code or the promotional offer
    /// identifier.
    pub offer_identifier: Option<String>,
    /// A value that represents the promotional offer type.
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub offer_type: Option<OfferType>,
    /// The purchase date of the original transaction identifier.
    #[serde(default, with = "ts_milliseconds_option")]
    pub original_purchase_date: Option<DateTime<Utc>>,
    /// The transaction identifier of the original purchase.
    pub original_transaction_id: Option<String>,
    /// The price multiplied by 1000 of the in-app purchase or subscription
    /// offer. The currency parameter indicates the currency of this price.
    pub price: Option<i64>,
    /// The unique identifier of the product.
    pub product_id: Option<String>,
    /// The time that the App Store charged the customer's account for a
    /// purchase, restored product, subscription, or subscription renewal after
    /// a lapse.
    #[serde(default, with = "ts_milliseconds_option")]
    pub purchase_date: Option<DateTime<Utc>>,
    /// The number of consumable products the customer purchased.
    pub quantity: Option<i32>,
    /// The time that the App Store refunded the transaction or revoked it from
    /// Family Sharing.
    #[serde(default, with = "ts_milliseconds_option")]
    pub revocation_date: Option<DateTime<Utc>>,
    /// The reason that the App Store refunded the transaction or revoked it
    /// from Family Sharing.
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub revocation_reason: Option<RevocationReason>,
    /// The time that the App Store signed the JSON Web Signature (JWS) data.
    #[serde(default, with = "ts_milliseconds_option")]
    pub signed_date: Option<DateTime<Utc>>,
    /// The three-letter code that represents the country or region associated
    /// with the App Store storefront for the purchase.
    pub storefront: Option<String>,
    /// An Apple-defined value that uniquely identifies the App Store storefront
    /// associated with the purchase.
    pub storefront_id: Option<String>,
    /// The identifier of the subscription group to which the subscription
    /// belongs.
    pub subscription_group_identifier: Option<String>,
    /// The unique identifier of the transaction.
    pub transaction_id: Option<String>,
    /// The reason for the purchase transaction, which indicates whether it's a
    /// customer's purchase or a renewal for an auto-renewable subscription that
    /// the system initiates.
    pub transaction_reason: Option<TransactionReason>,
    /// The type of the in-app purchase.
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    /// The unique identifier of subscription purchase events across devices,
    /// including subscription renewals.
    pub web_order_line_item_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InAppOwnershipType {
    /// The transaction belongs to a family member who benefits from service.
    FamilyShared,
    /// The transaction belongs to the purchaser.
    Purchased,

    #[serde(untagged)]
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize_repr)]
#[repr(u8)]
pub enum RevocationReason {
    /// The App Store refunded the transaction on behalf of the customer for
    /// other reasons, for example, an accidental purchase.
    Other = 0,
    /// The App Store refunded the transaction on behalf of the customer due to
    /// an actual or perceived issue within your app.
    Issue = 1,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionReason {
    /// The customer initiated the purchase.
    Purchase,
    /// The App Store server initiated the purchase transaction to renew an
    /// auto-renewable subscription.
    Renewal,

    #[serde(untagged)]
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum TransactionType {
    #[serde(rename = "Auto-Renewable Subscription")]
    AutoRenewableSubscription,
    #[serde(rename = "Non-Consumable")]
    NonConsumable,
    #[serde(rename = "Consumable")]
    Consumable,
    #[serde(rename = "Non-Renewing Subscription")]
    NonRenewableSubscription,

    #[serde(untagged)]
    Unknown(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_sparse_payload_and_ignores_unknown_fields() {
        let m: JwsTransactionDecodedPayloadModel = serde_json::from_value(serde_json::json!({
            "bundleId": "com.example.app",
            "environment": "Sandbox",
            "transactionId": "1000",
            "purchaseDate": 1698148900000i64,
            "type": "Consumable",
            "someFutureField": {"nested": true},
        }))
        .unwrap();
        assert_eq!(m.bundle_id.as_deref(), Some("com.example.app"));
        assert_eq!(m.environment, Some(Environment::Sandbox));
        assert_eq!(m.transaction_type, Some(TransactionType::Consumable));
        assert_eq!(m.purchase_date.unwrap().timestamp_millis(), 1698148900000);
        assert!(m.original_transaction_id.is_none());
    }

    #[test]
    fn unknown_integer_enum_value_reads_as_none() {
        let m: JwsTransactionDecodedPayloadModel = serde_json::from_value(serde_json::json!({
            "offerType": 9,
            "revocationReason": 1,
        }))
        .unwrap();
        assert_eq!(m.offer_type, None);
        assert_eq!(m.revocation_reason, Some(RevocationReason::Issue));
    }
}
