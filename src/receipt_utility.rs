//! Transaction id lookup in legacy StoreKit 1 transaction receipts.
//!
//! Nothing here validates the receipt. The extracted id should only be used
//! to query the App Store Server API, which returns signed data.

use base64::{engine::general_purpose::STANDARD, Engine};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ReceiptError;

static PURCHASE_INFO_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""purchase-info"\s+=\s+"([a-zA-Z0-9+/=]+)";"#).expect("valid regex")
});
static TRANSACTION_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""transaction-id"\s+=\s+"([a-zA-Z0-9+/=]+)";"#).expect("valid regex")
});

/// Extracts the transaction id from a base64 encoded transaction receipt
/// (`SKPaymentTransaction.transactionReceipt`).
pub fn extract_transaction_id_from_transaction_receipt(
    transaction_receipt: &str,
) -> Result<String, ReceiptError> {
    let receipt = decode(transaction_receipt)?;
    let purchase_info = capture(&PURCHASE_INFO_REGEX, &receipt, "purchase-info")?;
    let purchase_info = decode(purchase_info)?;
    capture(&TRANSACTION_ID_REGEX, &purchase_info, "transaction-id").map(str::to_owned)
}

fn decode(value: &str) -> Result<String, ReceiptError> {
    let bytes = STANDARD
        .decode(value)
        .map_err(|e| ReceiptError::InvalidEncoding(e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn capture<'a>(
    regex: &Regex,
    haystack: &'a str,
    field: &'static str,
) -> Result<&'a str, ReceiptError> {
    regex
        .captures(haystack)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or(ReceiptError::FieldNotFound(field))
}
