//! Validates the `x5c` certificate chain of a signed token against the
//! configured Apple roots.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use openssl::{
    error::ErrorStack,
    nid::Nid,
    pkey::{Id, PKey, Public},
    stack::Stack,
    x509::{
        store::{X509Store, X509StoreBuilder},
        verify::X509VerifyParam,
        X509Ref, X509StoreContext, X509VerifyResult, X509,
    },
};
use tracing::debug;

use super::revocation::RevocationChecker;
use crate::{
    constants::{INTERMEDIATE_POLICY_OID, LEAF_POLICY_OID},
    errors::{ChainPosition, VerificationError},
};

/// The root certificates a chain must terminate in.
#[derive(Debug, Clone)]
pub struct TrustAnchorSet {
    roots: Arc<[X509]>,
}

impl TrustAnchorSet {
    /// Parses DER-encoded root certificates. At least one is required.
    pub fn from_der<I, B>(certificates: I) -> Result<Self, VerificationError>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let roots = certificates
            .into_iter()
            .map(|der| {
                X509::from_der(der.as_ref()).map_err(|e| VerificationError::InvalidCertificate {
                    position: ChainPosition::Root,
                    reason: format!("failed to parse trust anchor: {e}"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if roots.is_empty() {
            return Err(VerificationError::InvalidConfiguration(
                "no root certificates provided".to_string(),
            ));
        }
        Ok(Self {
            roots: roots.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// The configured root that signed `certificate`, if any.
    pub(crate) fn issuer_of(&self, certificate: &X509Ref) -> Option<&X509> {
        self.roots
            .iter()
            .find(|root| root.issued(certificate) == X509VerifyResult::OK)
    }

    /// Builds an OpenSSL store holding the roots. With `at` set, validity
    /// periods are evaluated at that instant instead of the current time.
    pub(crate) fn store(&self, at: Option<DateTime<Utc>>) -> Result<X509Store, ErrorStack> {
        let mut builder = X509StoreBuilder::new()?;
        for root in self.roots.iter() {
            builder.add_cert(root.clone())?;
        }
        if let Some(at) = at {
            let mut param = X509VerifyParam::new()?;
            param.set_time(at.timestamp() as _);
            builder.set_param(&param)?;
        }
        Ok(builder.build())
    }
}

/// The three certificates embedded in a token, in `x5c` order.
///
/// The third entry is parsed but never trusted on its own; the path is built
/// to the configured [`TrustAnchorSet`] instead.
#[derive(Debug, Clone)]
pub struct CertificateChain {
    pub leaf: X509,
    pub intermediate: X509,
    pub root: X509,
}

impl CertificateChain {
    pub fn parse(entries: &[String]) -> Result<Self, VerificationError> {
        let [leaf, intermediate, root] = entries else {
            return Err(VerificationError::InvalidChainLength {
                found: entries.len(),
            });
        };
        Ok(Self {
            leaf: parse_certificate(leaf, ChainPosition::Leaf)?,
            intermediate: parse_certificate(intermediate, ChainPosition::Intermediate)?,
            root: parse_certificate(root, ChainPosition::Root)?,
        })
    }
}

fn parse_certificate(entry: &str, position: ChainPosition) -> Result<X509, VerificationError> {
    let der = STANDARD
        .decode(entry)
        .map_err(|e| VerificationError::InvalidCertificate {
            position,
            reason: format!("not valid base64: {e}"),
        })?;
    X509::from_der(&der).map_err(|e| VerificationError::InvalidCertificate {
        position,
        reason: format!("not a valid DER certificate: {e}"),
    })
}

pub struct ChainVerifier {
    trust_anchors: TrustAnchorSet,
    revocation_checker: Arc<dyn RevocationChecker>,
}

impl ChainVerifier {
    pub fn new(trust_anchors: TrustAnchorSet, revocation_checker: Arc<dyn RevocationChecker>) -> Self {
        Self {
            trust_anchors,
            revocation_checker,
        }
    }

    pub fn trust_anchors(&self) -> &TrustAnchorSet {
        &self.trust_anchors
    }

    /// Verifies the chain and returns the leaf's public key.
    ///
    /// certificates:
    ///   The `x5c` header entries: base64 (standard alphabet) DER certificates,
    ///   leaf first.
    ///
    /// effective_time:
    ///   The instant certificate validity periods are evaluated at.
    ///
    /// online_checks:
    ///   Whether to query OCSP responders for the leaf and intermediate. Any
    ///   failure to obtain a GOOD status rejects the chain.
    pub fn verify(
        &self,
        certificates: &[String],
        effective_time: DateTime<Utc>,
        online_checks: bool,
    ) -> Result<PKey<Public>, VerificationError> {
        let chain = CertificateChain::parse(certificates)?;
        self.verify_path(&chain, effective_time)?;
        check_policy_oid(&chain.leaf, ChainPosition::Leaf, LEAF_POLICY_OID)?;
        check_policy_oid(
            &chain.intermediate,
            ChainPosition::Intermediate,
            INTERMEDIATE_POLICY_OID,
        )?;
        if online_checks {
            self.revocation_checker
                .check(&chain, &self.trust_anchors)?;
        }
        leaf_public_key(&chain.leaf)
    }

    fn verify_path(
        &self,
        chain: &CertificateChain,
        effective_time: DateTime<Utc>,
    ) -> Result<(), VerificationError> {
        let store = self
            .trust_anchors
            .store(Some(effective_time))
            .map_err(chain_failure)?;
        let mut untrusted = Stack::new().map_err(chain_failure)?;
        untrusted
            .push(chain.intermediate.clone())
            .map_err(chain_failure)?;

        let mut context = X509StoreContext::new().map_err(chain_failure)?;
        let (valid, result, path_length) = context
            .init(&store, &chain.leaf, &untrusted, |c| {
                let valid = c.verify_cert()?;
                let path_length = c.chain().map(|path| path.len()).unwrap_or(0);
                Ok((valid, c.error(), path_length))
            })
            .map_err(chain_failure)?;

        if !valid {
            return Err(VerificationError::ChainVerificationFailure(
                result.error_string().to_string(),
            ));
        }
        // leaf -> intermediate -> anchor; a leaf issued directly by a root is
        // not an App Store signing chain.
        if path_length != 3 {
            return Err(VerificationError::ChainVerificationFailure(format!(
                "expected a path of 3 certificates to a trust anchor, built {path_length}"
            )));
        }
        let intermediate_key = chain.intermediate.public_key().map_err(chain_failure)?;
        if !chain.leaf.verify(&intermediate_key).map_err(chain_failure)? {
            return Err(VerificationError::ChainVerificationFailure(
                "leaf certificate is not signed by the intermediate".to_string(),
            ));
        }
        debug!(
            effective_time = %effective_time,
            "certificate chain validated against trust anchors"
        );
        Ok(())
    }
}

fn chain_failure(e: ErrorStack) -> VerificationError {
    VerificationError::ChainVerificationFailure(e.to_string())
}

fn check_policy_oid(
    certificate: &X509,
    position: ChainPosition,
    oid: &'static str,
) -> Result<(), VerificationError> {
    let der = certificate
        .to_der()
        .map_err(|e| VerificationError::InvalidCertificate {
            position,
            reason: e.to_string(),
        })?;
    let (_, parsed) = x509_parser::parse_x509_certificate(&der).map_err(|e| {
        VerificationError::InvalidCertificate {
            position,
            reason: e.to_string(),
        }
    })?;
    if parsed
        .extensions()
        .iter()
        .any(|extension| extension.oid.to_id_string() == oid)
    {
        Ok(())
    } else {
        Err(VerificationError::MissingPolicyOid { position, oid })
    }
}

fn leaf_public_key(leaf: &X509) -> Result<PKey<Public>, VerificationError> {
    let key = leaf
        .public_key()
        .map_err(|e| VerificationError::InvalidCertificate {
            position: ChainPosition::Leaf,
            reason: format!("unreadable public key: {e}"),
        })?;
    if key.id() != Id::EC {
        return Err(VerificationError::KeyAlgorithmMismatch(format!(
            "key type {:?}",
            key.id()
        )));
    }
    let curve = key
        .ec_key()
        .map_err(|e| VerificationError::KeyAlgorithmMismatch(e.to_string()))?
        .group()
        .curve_name();
    if curve != Some(Nid::X9_62_PRIME256V1) {
        return Err(VerificationError::KeyAlgorithmMismatch(format!(
            "curve {}",
            curve
                .and_then(|nid| nid.short_name().ok())
                .unwrap_or("unnamed")
        )));
    }
    Ok(key)
}
