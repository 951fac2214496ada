//! Signatures for subscription promotional offers.
//!
//! https://developer.apple.com/documentation/storekit/in-app_purchase/original_api_for_in-app_purchase/subscriptions_and_offers/generating_a_signature_for_promotional_offers

use base64::{engine::general_purpose::STANDARD, Engine};
use openssl::{
    ec::EcKey,
    ecdsa::EcdsaSig,
    hash::{hash, MessageDigest},
    pkey::{PKey, Private},
};

use crate::errors::PromotionalOfferError;

const FIELD_SEPARATOR: char = '\u{2063}';
const COORDINATE_LEN: i32 = 32;

pub struct PromotionalOfferSignatureCreator {
    signing_key: EcKey<Private>,
    key_id: String,
    bundle_id: String,
}

impl PromotionalOfferSignatureCreator {
    /// signing_key:
    ///   The PEM contents of the subscription key downloaded from App Store
    ///   Connect, in SEC1 or PKCS#8 form.
    pub fn new(
        signing_key: &str,
        key_id: &str,
        bundle_id: &str,
    ) -> Result<Self, PromotionalOfferError> {
        let signing_key = PKey::private_key_from_pem(signing_key.as_bytes())
            .and_then(|key| key.ec_key())
            .map_err(|e| PromotionalOfferError::InvalidSigningKey(e.to_string()))?;
        Ok(Self {
            signing_key,
            key_id: key_id.to_owned(),
            bundle_id: bundle_id.to_owned(),
        })
    }

    /// Returns the base64 encoded signature to pass to StoreKit along with
    /// the other offer parameters.
    ///
    /// application_username:
    ///   An opaque identifier for the user's account, or empty.
    ///
    /// nonce:
    ///   A one-time UUID, which StoreKit expects in lowercase.
    ///
    /// timestamp:
    ///   Milliseconds since the UNIX epoch when the signature was generated.
    pub fn create_signature(
        &self,
        product_identifier: &str,
        subscription_offer_id: &str,
        application_username: &str,
        nonce: &str,
        timestamp: i64,
    ) -> Result<String, PromotionalOfferError> {
        let payload = [
            self.bundle_id.as_str(),
            self.key_id.as_str(),
            product_identifier,
            subscription_offer_id,
            &application_username.to_lowercase(),
            &nonce.to_lowercase(),
            &timestamp.to_string(),
        ]
        .join(&FIELD_SEPARATOR.to_string());

        let signing_error = |e: openssl::error::ErrorStack| {
            PromotionalOfferError::SigningFailed(e.to_string())
        };
        let digest = hash(MessageDigest::sha256(), payload.as_bytes()).map_err(signing_error)?;
        let signature = EcdsaSig::sign(&digest, &self.signing_key).map_err(signing_error)?;

        // Raw r || s, each left-padded to the curve size.
        let mut raw = signature
            .r()
            .to_vec_padded(COORDINATE_LEN)
            .map_err(signing_error)?;
        raw.extend(
            signature
                .s()
                .to_vec_padded(COORDINATE_LEN)
                .map_err(signing_error)?,
        );
        Ok(STANDARD.encode(raw))
    }
}
