use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, Validation};
use openssl::pkey::{PKey, Public};

use super::token_decoder::{Claims, DecodedToken};
use crate::{constants::SIGNED_DATA_ALGORITHM, errors::VerificationError};

/// Rejects any header whose `alg` is not exactly "ES256".
pub fn check_algorithm(decoded: &DecodedToken) -> Result<(), VerificationError> {
    match decoded.algorithm() {
        Some(SIGNED_DATA_ALGORITHM) => Ok(()),
        other => Err(VerificationError::UnsupportedAlgorithm(
            other.map(str::to_owned),
        )),
    }
}

/// Checks the token's ES256 signature against the leaf certificate's key and
/// returns the claims it covers.
///
/// Registered JWT claims (`exp`, `nbf`, `aud`) are not interpreted; App Store
/// payloads carry their own dates and identity fields, which are checked after
/// decoding.
pub fn verify(
    token: &str,
    decoded: &DecodedToken,
    leaf_public_key: &PKey<Public>,
) -> Result<Claims, VerificationError> {
    check_algorithm(decoded)?;

    let pem = leaf_public_key
        .public_key_to_pem()
        .map_err(|e| VerificationError::KeyAlgorithmMismatch(e.to_string()))?;
    let key = DecodingKey::from_ec_pem(&pem)
        .map_err(|e| VerificationError::KeyAlgorithmMismatch(e.to_string()))?;

    let mut validation = Validation::new(Algorithm::ES256);
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;

    let verified = jsonwebtoken::decode::<Claims>(token, &key, &validation).map_err(|e| {
        match e.kind() {
            ErrorKind::InvalidSignature => VerificationError::SignatureVerificationFailure(
                "signature does not match the leaf certificate key".to_string(),
            ),
            ErrorKind::InvalidAlgorithm => VerificationError::UnsupportedAlgorithm(
                decoded.algorithm().map(str::to_owned),
            ),
            ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                VerificationError::MalformedToken(e.to_string())
            }
            _ => VerificationError::SignatureVerificationFailure(e.to_string()),
        }
    })?;
    Ok(verified.claims)
}
