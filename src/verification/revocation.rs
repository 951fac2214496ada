//! Online revocation checking for signing chains.
//!
//! Revocation is fail-closed: a chain is only accepted when every queried
//! certificate gets a fresh, signed GOOD status. Timeouts, transport errors,
//! unparsable responses and UNKNOWN statuses all reject the chain. There is no
//! fail-open mode and no retry at this layer.

use openssl::{
    error::ErrorStack,
    hash::MessageDigest,
    ocsp::{OcspCertId, OcspCertStatus, OcspFlag, OcspRequest, OcspResponse, OcspResponseStatus},
    stack::Stack,
    x509::X509Ref,
};
use tracing::{debug, warn};

use super::chain_verifier::{CertificateChain, TrustAnchorSet};
use crate::{constants::OCSP_VALIDITY_LEEWAY_SECS, errors::VerificationError};

/// Decides whether any certificate of an already path-validated chain has been
/// revoked.
pub trait RevocationChecker: Send + Sync {
    fn check(
        &self,
        chain: &CertificateChain,
        trust_anchors: &TrustAnchorSet,
    ) -> Result<(), VerificationError>;
}

/// Transport for OCSP requests.
pub trait OcspResponder: Send + Sync {
    /// Sends a DER-encoded OCSP request to `url` and returns the DER-encoded
    /// response. Implementations must bound the call with a timeout.
    fn query(&self, url: &str, request_der: &[u8]) -> Result<Vec<u8>, VerificationError>;
}

pub struct OcspRevocationChecker<R: OcspResponder> {
    responder: R,
}

impl<R: OcspResponder> OcspRevocationChecker<R> {
    pub fn new(responder: R) -> Self {
        Self { responder }
    }

    fn check_certificate(
        &self,
        subject: &X509Ref,
        issuer: &X509Ref,
        trust_anchors: &TrustAnchorSet,
    ) -> Result<(), VerificationError> {
        let url = subject
            .ocsp_responders()
            .map_err(revocation_failure)?
            .iter()
            .next()
            .map(|url| url.to_string())
            .ok_or_else(|| {
                VerificationError::ChainVerificationFailure(
                    "certificate names no OCSP responder".to_string(),
                )
            })?;

        let mut request = OcspRequest::new().map_err(revocation_failure)?;
        request
            .add_id(cert_id(subject, issuer)?)
            .map_err(revocation_failure)?;
        let request_der = request.to_der().map_err(revocation_failure)?;

        debug!(responder = %url, "querying OCSP responder");
        let response_der = self.responder.query(&url, &request_der)?;

        let response = OcspResponse::from_der(&response_der).map_err(revocation_failure)?;
        if response.status() != OcspResponseStatus::SUCCESSFUL {
            return Err(VerificationError::ChainVerificationFailure(format!(
                "OCSP responder returned status {:?}",
                response.status()
            )));
        }
        let basic = response.basic().map_err(revocation_failure)?;

        let mut signers = Stack::new().map_err(revocation_failure)?;
        signers
            .push(issuer.to_owned())
            .map_err(revocation_failure)?;
        let store = trust_anchors.store(None).map_err(revocation_failure)?;
        basic
            .verify(&signers, &store, OcspFlag::empty())
            .map_err(revocation_failure)?;

        let id = cert_id(subject, issuer)?;
        let status = basic.find_status(&id).ok_or_else(|| {
            VerificationError::ChainVerificationFailure(
                "OCSP response does not cover the certificate".to_string(),
            )
        })?;
        status
            .check_validity(OCSP_VALIDITY_LEEWAY_SECS, None)
            .map_err(revocation_failure)?;

        if status.status == OcspCertStatus::GOOD {
            Ok(())
        } else if status.status == OcspCertStatus::REVOKED {
            warn!("certificate in signing chain has been revoked");
            Err(VerificationError::ChainVerificationFailure(
                "certificate has been revoked".to_string(),
            ))
        } else {
            Err(VerificationError::ChainVerificationFailure(
                "OCSP status of certificate is unknown".to_string(),
            ))
        }
    }
}

impl<R: OcspResponder> RevocationChecker for OcspRevocationChecker<R> {
    fn check(
        &self,
        chain: &CertificateChain,
        trust_anchors: &TrustAnchorSet,
    ) -> Result<(), VerificationError> {
        self.check_certificate(&chain.leaf, &chain.intermediate, trust_anchors)?;
        let anchor = trust_anchors
            .issuer_of(&chain.intermediate)
            .ok_or_else(|| {
                VerificationError::ChainVerificationFailure(
                    "no trust anchor issued the intermediate certificate".to_string(),
                )
            })?;
        self.check_certificate(&chain.intermediate, anchor, trust_anchors)
    }
}

fn cert_id(subject: &X509Ref, issuer: &X509Ref) -> Result<OcspCertId, VerificationError> {
    OcspCertId::from_cert(MessageDigest::sha1(), subject, issuer).map_err(revocation_failure)
}

fn revocation_failure(e: ErrorStack) -> VerificationError {
    VerificationError::ChainVerificationFailure(format!("revocation check failed: {e}"))
}
