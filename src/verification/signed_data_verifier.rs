use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{
    chain_verifier::{ChainVerifier, TrustAnchorSet},
    payload_validator::{self, IdentityClaims},
    revocation::{OcspRevocationChecker, RevocationChecker},
    signature_verifier,
    token_decoder::{self, Claims, DecodedToken},
};
use crate::{
    constants::DEFAULT_OCSP_TIMEOUT_SECS,
    data::{
        datasources::ocsp_responder_datasource::HttpOcspResponder,
        models::{
            app_store_server_api::{
                app_transaction_model::AppTransactionModel,
                jws_renewal_info_decoded_payload_model::JwsRenewalInfoDecodedPayloadModel,
                jws_transaction_decoded_payload_model::JwsTransactionDecodedPayloadModel,
            },
            app_store_server_notifications::response_body_v2_decoded_payload_model::ResponseBodyV2DecodedPayloadModel,
        },
    },
    domain::entities::{
        decoded_payload::{DecodedPayload, PayloadKind},
        environment::Environment,
        verification_context::VerificationContext,
    },
    errors::VerificationError,
};

/// Verifies and decodes data signed by the App Store.
///
/// Holds only immutable configuration, so one instance can be shared across
/// threads and used concurrently.
pub struct SignedDataVerifier {
    context: VerificationContext,
    chain_verifier: ChainVerifier,
}

impl SignedDataVerifier {
    /// root_certificates:
    ///   DER-encoded Apple root certificates the signing chain must terminate
    ///   in. https://www.apple.com/certificateauthority/
    ///
    /// enable_online_checks:
    ///   Whether to validate certificates at the current time and query OCSP
    ///   responders. When disabled, certificates are validated as of the time
    ///   the data was signed and no network I/O happens.
    ///
    /// app_apple_id:
    ///   Required when `environment` is Production.
    pub fn new<I, B>(
        root_certificates: I,
        enable_online_checks: bool,
        environment: Environment,
        bundle_id: &str,
        app_apple_id: Option<i64>,
    ) -> Result<Self, VerificationError>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        Self::with_ocsp_timeout(
            TrustAnchorSet::from_der(root_certificates)?,
            VerificationContext::new(environment, bundle_id, app_apple_id, enable_online_checks)?,
            Duration::from_secs(DEFAULT_OCSP_TIMEOUT_SECS),
        )
    }

    /// Like [`SignedDataVerifier::new`], with a caller-chosen timeout for each
    /// OCSP round trip.
    pub fn with_ocsp_timeout(
        trust_anchors: TrustAnchorSet,
        context: VerificationContext,
        ocsp_timeout: Duration,
    ) -> Result<Self, VerificationError> {
        Ok(Self::with_revocation_checker(
            trust_anchors,
            context,
            Arc::new(OcspRevocationChecker::new(HttpOcspResponder::new(
                ocsp_timeout,
            ))),
        ))
    }

    pub fn with_revocation_checker(
        trust_anchors: TrustAnchorSet,
        context: VerificationContext,
        revocation_checker: Arc<dyn RevocationChecker>,
    ) -> Self {
        if context.environment().skips_signature_verification() {
            warn!(
                environment = %context.environment(),
                "signature verification is disabled for this environment; \
                 signed data will be accepted without checking it"
            );
        }
        Self {
            context,
            chain_verifier: ChainVerifier::new(trust_anchors, revocation_checker),
        }
    }

    pub fn context(&self) -> &VerificationContext {
        &self.context
    }

    /// Verifies and decodes a signedTransaction obtained from the App Store
    /// Server API, an App Store Server Notification, or a device.
    ///
    /// https://developer.apple.com/documentation/appstoreserverapi/jwstransaction
    pub fn verify_and_decode_signed_transaction(
        &self,
        signed_transaction: &str,
    ) -> Result<JwsTransactionDecodedPayloadModel, VerificationError> {
        self.verify_and_decode_typed(signed_transaction)
    }

    /// Verifies and decodes a signedRenewalInfo obtained from the App Store
    /// Server API, an App Store Server Notification, or a device.
    ///
    /// https://developer.apple.com/documentation/appstoreserverapi/jwsrenewalinfo
    pub fn verify_and_decode_renewal_info(
        &self,
        signed_renewal_info: &str,
    ) -> Result<JwsRenewalInfoDecodedPayloadModel, VerificationError> {
        self.verify_and_decode_typed(signed_renewal_info)
    }

    /// Verifies and decodes an App Store Server Notification signedPayload.
    ///
    /// https://developer.apple.com/documentation/appstoreservernotifications/signedpayload
    pub fn verify_and_decode_notification(
        &self,
        signed_payload: &str,
    ) -> Result<ResponseBodyV2DecodedPayloadModel, VerificationError> {
        let claims = self.decode_signed_object(signed_payload)?;
        let payload = ResponseBodyV2DecodedPayloadModel::from_verified_claims(claims)?;
        self.validate(&payload)?;
        Ok(payload)
    }

    /// Verifies and decodes a signed AppTransaction.
    ///
    /// https://developer.apple.com/documentation/storekit/apptransaction
    pub fn verify_and_decode_app_transaction(
        &self,
        signed_app_transaction: &str,
    ) -> Result<AppTransactionModel, VerificationError> {
        self.verify_and_decode_typed(signed_app_transaction)
    }

    pub fn verify_and_decode(
        &self,
        kind: PayloadKind,
        token: &str,
    ) -> Result<DecodedPayload, VerificationError> {
        Ok(match kind {
            PayloadKind::Transaction => {
                DecodedPayload::Transaction(self.verify_and_decode_signed_transaction(token)?)
            }
            PayloadKind::RenewalInfo => {
                DecodedPayload::RenewalInfo(self.verify_and_decode_renewal_info(token)?)
            }
            PayloadKind::Notification => {
                DecodedPayload::Notification(self.verify_and_decode_notification(token)?)
            }
            PayloadKind::AppTransaction => {
                DecodedPayload::AppTransaction(self.verify_and_decode_app_transaction(token)?)
            }
        })
    }

    /// Returns the claims of a signed token once its certificate chain and
    /// signature have been verified.
    ///
    /// For Xcode and LocalTesting environments the claims are returned without
    /// any verification, since that data is signed locally.
    pub fn decode_signed_object(&self, token: &str) -> Result<Claims, VerificationError> {
        let decoded = token_decoder::decode(token)?;

        if self.context.environment().skips_signature_verification() {
            debug!(
                environment = %self.context.environment(),
                "returning unverified claims"
            );
            return Ok(decoded.claims);
        }

        self.verify_signed_object(token, &decoded)
            .inspect_err(|e| warn!(error = %e, "rejected signed data"))
    }

    fn verify_signed_object(
        &self,
        token: &str,
        decoded: &DecodedToken,
    ) -> Result<Claims, VerificationError> {
        signature_verifier::check_algorithm(decoded)?;
        let certificates = decoded.certificate_chain()?;
        let effective_time = self.effective_time(decoded.signed_date_millis());
        let leaf_public_key = self.chain_verifier.verify(
            &certificates,
            effective_time,
            self.context.enable_online_checks(),
        )?;
        signature_verifier::verify(token, decoded, &leaf_public_key)
    }

    /// Online checks validate certificates as of now. Offline, they are
    /// validated as of the time Apple signed the data, so old tokens stay
    /// verifiable after their leaf certificate expires.
    fn effective_time(&self, signed_date_millis: Option<i64>) -> DateTime<Utc> {
        if self.context.enable_online_checks() {
            return Utc::now();
        }
        signed_date_millis
            .and_then(DateTime::from_timestamp_millis)
            .unwrap_or_else(Utc::now)
    }

    fn verify_and_decode_typed<T>(&self, token: &str) -> Result<T, VerificationError>
    where
        T: DeserializeOwned + IdentityClaims,
    {
        let claims = self.decode_signed_object(token)?;
        let payload: T = serde_json::from_value(serde_json::Value::Object(claims))
            .map_err(|e| VerificationError::MalformedToken(format!("invalid payload: {e}")))?;
        self.validate(&payload)?;
        Ok(payload)
    }

    fn validate<P: IdentityClaims>(&self, payload: &P) -> Result<(), VerificationError> {
        payload_validator::validate(&self.context, payload).inspect_err(|e| {
            warn!(error = %e, "signed data does not match the configured app");
        })
    }
}
