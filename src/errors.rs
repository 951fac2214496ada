use std::fmt;

use thiserror::Error;

/// Position of a certificate inside the `x5c` chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainPosition {
    Leaf,
    Intermediate,
    Root,
}

impl fmt::Display for ChainPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainPosition::Leaf => write!(f, "leaf"),
            ChainPosition::Intermediate => write!(f, "intermediate"),
            ChainPosition::Root => write!(f, "root"),
        }
    }
}

/// Errors raised while verifying and decoding signed App Store data.
///
/// Every variant is terminal: a payload that produced any of these must not be
/// consumed, and retrying with the same input gives the same result.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("malformed token: {0}")]
    MalformedToken(String),
    #[error("invalid {position} certificate: {reason}")]
    InvalidCertificate {
        position: ChainPosition,
        reason: String,
    },
    #[error("expected 3 certificates in chain, found {found}")]
    InvalidChainLength { found: usize },
    #[error("certificate chain verification failed: {0}")]
    ChainVerificationFailure(String),
    #[error("{position} certificate is missing policy OID {oid}")]
    MissingPolicyOid {
        position: ChainPosition,
        oid: &'static str,
    },
    #[error("leaf certificate key is not an EC P-256 key: {0}")]
    KeyAlgorithmMismatch(String),
    #[error("unsupported signature algorithm: {0:?}")]
    UnsupportedAlgorithm(Option<String>),
    #[error("signature verification failed: {0}")]
    SignatureVerificationFailure(String),
    #[error("payload does not belong to the configured app")]
    InvalidAppIdentifier,
    #[error("payload environment does not match the configured environment")]
    InvalidEnvironment,
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("invalid verifier configuration: {0}")]
    InvalidConfiguration(String),
}

/// Errors raised when calling out to the App Store Server API.
#[derive(Debug, Error)]
pub enum AppStoreApiError {
    #[error("invalid App Store Server API key: {0}")]
    ApiKeyInvalid(String),
    #[error("{function}: callout failed to send: {details}")]
    CalloutFailed {
        function: &'static str,
        details: String,
    },
    #[error("{function}: callout returned status {status}: {body}")]
    UnexpectedStatus {
        function: &'static str,
        status: u16,
        body: String,
    },
    #[error("{function}: failed to parse callout response: {details}")]
    InvalidResponse {
        function: &'static str,
        details: String,
    },
    #[error("App Store Server API credentials are not configured")]
    ApiNotConfigured,
    #[error("failed to parse notification body: {0}")]
    NotificationParse(String),
    #[error(transparent)]
    Verification(#[from] VerificationError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("verification task failed: {0}")]
    TaskJoin(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration value {0}")]
    Missing(&'static str),
    #[error("invalid configuration value {key}: {details}")]
    Invalid { key: &'static str, details: String },
    #[error("failed to read {path}: {details}")]
    Io { path: String, details: String },
}

#[derive(Debug, Error)]
pub enum PromotionalOfferError {
    #[error("invalid signing key: {0}")]
    InvalidSigningKey(String),
    #[error("failed to sign promotional offer: {0}")]
    SigningFailed(String),
}

#[derive(Debug, Error)]
pub enum ReceiptError {
    #[error("receipt is not valid base64: {0}")]
    InvalidEncoding(String),
    #[error("{0} not found in receipt")]
    FieldNotFound(&'static str),
}
