mod common;

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use base64::{engine::general_purpose::STANDARD, Engine};
use common::*;
use fractic_app_store_verify::{
    domain::entities::{environment::Environment, verification_context::VerificationContext},
    errors::VerificationError,
    verification::{
        chain_verifier::{CertificateChain, TrustAnchorSet},
        revocation::{OcspResponder, OcspRevocationChecker, RevocationChecker},
        signed_data_verifier::SignedDataVerifier,
    },
};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::json;

const LEAF_RESPONDER: &str = "http://ocsp.example.test/intermediate";
const INTERMEDIATE_RESPONDER: &str = "http://ocsp.example.test/root";

/// Serves canned responses per responder URL, remembering the URLs asked.
/// Unknown URLs behave like an unreachable host.
#[derive(Clone, Default)]
struct FakeResponder {
    responses: HashMap<String, Result<Vec<u8>, String>>,
    queried: Arc<Mutex<Vec<String>>>,
}

impl FakeResponder {
    fn answering(mut self, url: &str, response: Result<Vec<u8>, String>) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    fn queried(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }
}

impl OcspResponder for FakeResponder {
    fn query(&self, url: &str, request_der: &[u8]) -> Result<Vec<u8>, VerificationError> {
        assert!(!request_der.is_empty());
        self.queried.lock().unwrap().push(url.to_string());
        self.responses
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err("connection refused".to_string()))
            .map_err(VerificationError::ChainVerificationFailure)
    }
}

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/ocsp")
}

fn fixture(name: &str) -> Vec<u8> {
    fs::read(fixtures().join(name)).unwrap()
}

/// Chain and responses produced by `tests/fixtures/ocsp/generate.sh`.
fn fixture_x5c() -> Vec<String> {
    ["leaf.der", "intermediate.der", "root.der"]
        .iter()
        .map(|name| STANDARD.encode(fixture(name)))
        .collect()
}

fn fixture_chain_and_anchors() -> (CertificateChain, TrustAnchorSet) {
    (
        CertificateChain::parse(&fixture_x5c()).unwrap(),
        TrustAnchorSet::from_der([fixture("root.der")]).unwrap(),
    )
}

fn responder_with_leaf_response(leaf_response: &str) -> FakeResponder {
    FakeResponder::default()
        .answering(LEAF_RESPONDER, Ok(fixture(leaf_response)))
        .answering(INTERMEDIATE_RESPONDER, Ok(fixture("intermediate_good.ocsp")))
}

fn check(responder: &FakeResponder) -> Result<(), VerificationError> {
    let (chain, anchors) = fixture_chain_and_anchors();
    OcspRevocationChecker::new(responder.clone()).check(&chain, &anchors)
}

#[test]
fn good_status_for_both_certificates_is_accepted() {
    let responder = responder_with_leaf_response("leaf_good.ocsp");
    check(&responder).unwrap();
    assert_eq!(
        responder.queried(),
        vec![LEAF_RESPONDER.to_string(), INTERMEDIATE_RESPONDER.to_string()]
    );
}

#[test]
fn revoked_leaf_is_rejected() {
    let responder = responder_with_leaf_response("leaf_revoked.ocsp");
    match check(&responder) {
        Err(VerificationError::ChainVerificationFailure(reason)) => {
            assert!(reason.contains("revoked"), "{reason}")
        }
        other => panic!("expected a revocation failure, got {other:?}"),
    }
    assert_eq!(responder.queried(), vec![LEAF_RESPONDER.to_string()]);
}

#[test]
fn response_signed_outside_the_trust_anchors_is_rejected() {
    let responder = responder_with_leaf_response("leaf_foreign_signer.ocsp");
    assert!(matches!(
        check(&responder),
        Err(VerificationError::ChainVerificationFailure(_))
    ));
}

#[test]
fn stale_response_is_rejected() {
    let responder = responder_with_leaf_response("leaf_stale.ocsp");
    assert!(matches!(
        check(&responder),
        Err(VerificationError::ChainVerificationFailure(_))
    ));
}

#[test]
fn response_for_another_certificate_is_rejected() {
    // A genuine GOOD answer, but about the leaf, served for the intermediate.
    let responder = FakeResponder::default()
        .answering(LEAF_RESPONDER, Ok(fixture("leaf_good.ocsp")))
        .answering(INTERMEDIATE_RESPONDER, Ok(fixture("leaf_good.ocsp")));
    assert!(matches!(
        check(&responder),
        Err(VerificationError::ChainVerificationFailure(_))
    ));
}

#[test]
fn unanswered_intermediate_query_is_rejected() {
    let responder =
        FakeResponder::default().answering(LEAF_RESPONDER, Ok(fixture("leaf_good.ocsp")));
    assert!(matches!(
        check(&responder),
        Err(VerificationError::ChainVerificationFailure(_))
    ));
    assert_eq!(
        responder.queried(),
        vec![LEAF_RESPONDER.to_string(), INTERMEDIATE_RESPONDER.to_string()]
    );
}

#[test]
fn unparseable_response_is_rejected() {
    let responder = FakeResponder::default()
        .answering(LEAF_RESPONDER, Ok(b"not an OCSP response".to_vec()));
    assert!(matches!(
        check(&responder),
        Err(VerificationError::ChainVerificationFailure(_))
    ));
}

#[test]
fn certificate_without_responder_is_rejected() {
    let pki = TestPki::new();
    let chain = CertificateChain::parse(&pki.x5c()).unwrap();
    let anchors = TrustAnchorSet::from_der([pki.root_der()]).unwrap();
    let responder = FakeResponder::default();

    let result = OcspRevocationChecker::new(responder.clone()).check(&chain, &anchors);
    assert!(matches!(
        result,
        Err(VerificationError::ChainVerificationFailure(_))
    ));
    assert!(responder.queried().is_empty());
}

#[test]
fn unreachable_responder_is_rejected() {
    let pki = TestPki::with_options(PkiOptions {
        ocsp_urls: true,
        ..Default::default()
    });
    let chain = CertificateChain::parse(&pki.x5c()).unwrap();
    let anchors = TrustAnchorSet::from_der([pki.root_der()]).unwrap();
    let responder = FakeResponder::default();

    let result = OcspRevocationChecker::new(responder.clone()).check(&chain, &anchors);
    assert!(matches!(
        result,
        Err(VerificationError::ChainVerificationFailure(_))
    ));
    assert_eq!(responder.queried(), vec![LEAF_RESPONDER.to_string()]);
}

fn online_verifier(responder: FakeResponder) -> SignedDataVerifier {
    SignedDataVerifier::with_revocation_checker(
        TrustAnchorSet::from_der([fixture("root.der")]).unwrap(),
        VerificationContext::new(Environment::Sandbox, BUNDLE_ID, None, true).unwrap(),
        Arc::new(OcspRevocationChecker::new(responder)),
    )
}

fn fixture_signed_transaction() -> String {
    let mut header = Header::new(Algorithm::ES256);
    header.x5c = Some(fixture_x5c());
    let key = EncodingKey::from_ec_pem(&fixture("leaf.key")).unwrap();
    jsonwebtoken::encode(
        &header,
        &json!({
            "transactionId": "1000",
            "bundleId": BUNDLE_ID,
            "environment": "Sandbox",
        }),
        &key,
    )
    .unwrap()
}

#[test]
fn online_verification_accepts_unrevoked_chain() {
    let verifier = online_verifier(responder_with_leaf_response("leaf_good.ocsp"));
    let transaction = verifier
        .verify_and_decode_signed_transaction(&fixture_signed_transaction())
        .unwrap();
    assert_eq!(transaction.transaction_id.as_deref(), Some("1000"));
}

#[test]
fn online_verification_rejects_revoked_leaf() {
    let verifier = online_verifier(responder_with_leaf_response("leaf_revoked.ocsp"));
    assert!(matches!(
        verifier.verify_and_decode_signed_transaction(&fixture_signed_transaction()),
        Err(VerificationError::ChainVerificationFailure(_))
    ));
}
