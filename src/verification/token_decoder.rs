//! Splits a compact JWS into its parts without verifying anything.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde_json::{Map, Value};

use crate::errors::VerificationError;

pub type Claims = Map<String, Value>;

/// The parts of a compact signed token. Nothing here has been verified.
#[derive(Debug, Clone)]
pub struct DecodedToken {
    pub header: Map<String, Value>,
    pub claims: Claims,
    /// `base64url(header) || '.' || base64url(payload)`, the bytes the
    /// signature covers.
    pub signing_input: String,
    pub signature: Vec<u8>,
}

impl DecodedToken {
    /// The `alg` header value, if it is a string.
    pub fn algorithm(&self) -> Option<&str> {
        self.header.get("alg").and_then(Value::as_str)
    }

    /// The `x5c` header value as a list of base64 DER certificates.
    pub fn certificate_chain(&self) -> Result<Vec<String>, VerificationError> {
        let entries = self
            .header
            .get("x5c")
            .ok_or(VerificationError::MissingField("x5c"))?
            .as_array()
            .ok_or_else(|| VerificationError::MalformedToken("x5c is not an array".to_string()))?;
        entries
            .iter()
            .map(|entry| {
                entry.as_str().map(str::to_owned).ok_or_else(|| {
                    VerificationError::MalformedToken("x5c entry is not a string".to_string())
                })
            })
            .collect()
    }

    /// The UNIX time in milliseconds at which Apple signed the data, taken from
    /// `signedDate` or, for app transactions, `receiptCreationDate`.
    pub fn signed_date_millis(&self) -> Option<i64> {
        ["signedDate", "receiptCreationDate"]
            .iter()
            .find_map(|key| self.claims.get(*key).and_then(json_millis))
    }
}

fn json_millis(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|millis| millis as i64))
}

pub fn decode(token: &str) -> Result<DecodedToken, VerificationError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [header_segment, payload_segment, signature_segment] = segments.as_slice() else {
        return Err(VerificationError::MalformedToken(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    };
    let header = decode_json_object(header_segment, "header")?;
    let claims = decode_json_object(payload_segment, "payload")?;
    let signature = decode_segment(signature_segment, "signature")?;
    Ok(DecodedToken {
        header,
        claims,
        signing_input: format!("{header_segment}.{payload_segment}"),
        signature,
    })
}

/// Compact serialization forbids `=` padding (RFC 7515, section 2).
fn decode_segment(segment: &str, name: &str) -> Result<Vec<u8>, VerificationError> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| VerificationError::MalformedToken(format!("{name} is not base64url: {e}")))
}

fn decode_json_object(segment: &str, name: &str) -> Result<Map<String, Value>, VerificationError> {
    let bytes = decode_segment(segment, name)?;
    match serde_json::from_slice(&bytes) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(VerificationError::MalformedToken(format!(
            "{name} is not a JSON object"
        ))),
        Err(e) => Err(VerificationError::MalformedToken(format!(
            "{name} is not valid JSON: {e}"
        ))),
    }
}
