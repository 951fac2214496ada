/// Marker extension carried by App Store receipt-signing leaf certificates.
pub const LEAF_POLICY_OID: &str = "1.2.840.113635.100.6.11.1";
/// Marker extension carried by the Apple Worldwide Developer Relations
/// intermediate certificate.
pub const INTERMEDIATE_POLICY_OID: &str = "1.2.840.113635.100.6.2.1";

/// The only signature algorithm App Store signed data is allowed to use.
pub const SIGNED_DATA_ALGORITHM: &str = "ES256";

/// Prefix Apple puts on external purchase ids issued in the sandbox.
pub const SANDBOX_EXTERNAL_PURCHASE_ID_PREFIX: &str = "SANDBOX";

pub const APP_STORE_SERVER_API_PRODUCTION_URL: &str = "https://api.storekit.itunes.apple.com";
pub const APP_STORE_SERVER_API_SANDBOX_URL: &str = "https://api.storekit-sandbox.itunes.apple.com";
pub const APP_STORE_SERVER_API_AUDIENCE: &str = "appstoreconnect-v1";

pub const DEFAULT_OCSP_TIMEOUT_SECS: u64 = 10;
/// Clock skew tolerated on OCSP thisUpdate/nextUpdate, in seconds.
pub const OCSP_VALIDITY_LEEWAY_SECS: u32 = 300;
