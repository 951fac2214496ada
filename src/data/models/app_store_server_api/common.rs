use serde::Deserialize;
use serde_repr::Deserialize_repr;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferDiscountType {
    /// A payment mode of a product discount that indicates a free trial.
    FreeTrial,
    /// A payment mode of a product discount that customers pay over a single or
    /// multiple billing periods.
    PayAsYouGo,
    /// A payment mode of a product discount that customers pay up front.
    PayUpFront,

    #[serde(untagged)]
    Unknown(String),
}

/// Integer-coded enums cannot carry an `Unknown` fallback, so fields of this
/// type are decoded with `DefaultOnError` and read as `None` when Apple adds a
/// new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize_repr)]
#[repr(u8)]
pub enum OfferType {
    /// An introductory offer.
    Introductory = 1,
    /// A promotional offer.
    Promotional = 2,
    /// An offer with a subscription offer code.
    OfferCode = 3,
    /// A win-back offer.
    WinBack = 4,
}
