use std::time::Duration;

use reqwest::header::CONTENT_TYPE;

use crate::{errors::VerificationError, verification::revocation::OcspResponder};

/// Posts OCSP requests over HTTP (RFC 6960, appendix A).
///
/// Blocking: call it off the async executor. The client is built per request so
/// that no blocking client outlives the calling thread.
#[derive(Debug, Clone)]
pub struct HttpOcspResponder {
    timeout: Duration,
}

impl HttpOcspResponder {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl OcspResponder for HttpOcspResponder {
    fn query(&self, url: &str, request_der: &[u8]) -> Result<Vec<u8>, VerificationError> {
        let failure = |details: String| {
            VerificationError::ChainVerificationFailure(format!(
                "OCSP request to {url} failed: {details}"
            ))
        };
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| failure(e.to_string()))?;
        let response = client
            .post(url)
            .header(CONTENT_TYPE, "application/ocsp-request")
            .body(request_der.to_vec())
            .send()
            .map_err(|e| failure(e.to_string()))?;
        if !response.status().is_success() {
            return Err(failure(format!("status {}", response.status())));
        }
        response
            .bytes()
            .map(|body| body.to_vec())
            .map_err(|e| failure(e.to_string()))
    }
}
