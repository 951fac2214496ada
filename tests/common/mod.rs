//! Test PKI and token helpers shared by the integration tests.

#![allow(dead_code)]

use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine,
};
use chrono::{DateTime, Duration, Utc};
use fractic_app_store_verify::constants::{INTERMEDIATE_POLICY_OID, LEAF_POLICY_OID};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use openssl::{
    asn1::{Asn1Object, Asn1OctetString, Asn1Time},
    bn::BigNum,
    ec::{EcGroup, EcKey},
    hash::MessageDigest,
    nid::Nid,
    pkey::{PKey, Private},
    x509::{
        extension::{BasicConstraints, KeyUsage},
        X509Extension, X509Name, X509,
    },
};
use serde_json::Value;

pub const BUNDLE_ID: &str = "com.example.app";
pub const APP_APPLE_ID: i64 = 1234;

pub struct Validity {
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

impl Validity {
    pub fn around_now() -> Self {
        Self {
            not_before: Utc::now() - Duration::days(30),
            not_after: Utc::now() + Duration::days(30),
        }
    }
}

/// Shape of the generated chain. The default mirrors Apple's: a P-256 root,
/// an intermediate carrying the WWDR policy marker and a leaf carrying the
/// App Store signing marker.
pub struct PkiOptions {
    pub leaf_policy: bool,
    pub intermediate_policy: bool,
    pub leaf_validity: Validity,
    pub leaf_curve: Nid,
    pub ocsp_urls: bool,
}

impl Default for PkiOptions {
    fn default() -> Self {
        Self {
            leaf_policy: true,
            intermediate_policy: true,
            leaf_validity: Validity::around_now(),
            leaf_curve: Nid::X9_62_PRIME256V1,
            ocsp_urls: false,
        }
    }
}

pub struct TestPki {
    pub root: X509,
    pub root_key: PKey<Private>,
    pub intermediate: X509,
    pub intermediate_key: PKey<Private>,
    pub leaf: X509,
    pub leaf_key: PKey<Private>,
}

impl TestPki {
    pub fn new() -> Self {
        Self::with_options(PkiOptions::default())
    }

    pub fn with_options(options: PkiOptions) -> Self {
        let root_key = ec_key(Nid::X9_62_PRIME256V1);
        let root = CertificateSpec {
            serial: 1,
            common_name: "Test Root CA",
            ca: true,
            validity: Validity::around_now(),
            extra_extensions: vec![],
        }
        .issue(&root_key, None);

        let intermediate_key = ec_key(Nid::X9_62_PRIME256V1);
        let mut extensions = vec![];
        if options.intermediate_policy {
            extensions.push(marker_extension(INTERMEDIATE_POLICY_OID));
        }
        if options.ocsp_urls {
            extensions.push(ocsp_extension("http://ocsp.example.test/root"));
        }
        let intermediate = CertificateSpec {
            serial: 2,
            common_name: "Test Intermediate CA",
            ca: true,
            validity: Validity::around_now(),
            extra_extensions: extensions,
        }
        .issue(&intermediate_key, Some((&root, &root_key)));

        let leaf_key = ec_key(options.leaf_curve);
        let mut extensions = vec![];
        if options.leaf_policy {
            extensions.push(marker_extension(LEAF_POLICY_OID));
        }
        if options.ocsp_urls {
            extensions.push(ocsp_extension("http://ocsp.example.test/intermediate"));
        }
        let leaf = CertificateSpec {
            serial: 3,
            common_name: "Test App Store Signing",
            ca: false,
            validity: options.leaf_validity,
            extra_extensions: extensions,
        }
        .issue(&leaf_key, Some((&intermediate, &intermediate_key)));

        Self {
            root,
            root_key,
            intermediate,
            intermediate_key,
            leaf,
            leaf_key,
        }
    }

    pub fn root_der(&self) -> Vec<u8> {
        self.root.to_der().unwrap()
    }

    /// `x5c` entries in leaf, intermediate, root order.
    pub fn x5c(&self) -> Vec<String> {
        [&self.leaf, &self.intermediate, &self.root]
            .iter()
            .map(|cert| STANDARD.encode(cert.to_der().unwrap()))
            .collect()
    }

    /// An ES256 token over `claims`, signed by the leaf key, carrying `x5c`.
    pub fn sign(&self, claims: &Value, x5c: Vec<String>) -> String {
        let mut header = Header::new(Algorithm::ES256);
        header.x5c = Some(x5c);
        let key = EncodingKey::from_ec_pem(&self.leaf_key.private_key_to_pem_pkcs8().unwrap())
            .unwrap();
        jsonwebtoken::encode(&header, claims, &key).unwrap()
    }

    pub fn sign_with_chain(&self, claims: &Value) -> String {
        self.sign(claims, self.x5c())
    }
}

/// A token with the given header and a signature that verifies under no key.
pub fn unsigned_token(header: &Value, claims: &Value) -> String {
    format!(
        "{}.{}.{}",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(claims.to_string()),
        URL_SAFE_NO_PAD.encode([0u8; 64]),
    )
}

struct CertificateSpec {
    serial: u32,
    common_name: &'static str,
    ca: bool,
    validity: Validity,
    extra_extensions: Vec<X509Extension>,
}

impl CertificateSpec {
    /// Issues the certificate for `key`. Without an issuer it is self-signed.
    fn issue(self, key: &PKey<Private>, issuer: Option<(&X509, &PKey<Private>)>) -> X509 {
        let mut name = X509Name::builder().unwrap();
        name.append_entry_by_text("CN", self.common_name).unwrap();
        let name = name.build();

        let mut builder = X509::builder().unwrap();
        builder.set_version(2).unwrap();
        builder
            .set_serial_number(&BigNum::from_u32(self.serial).unwrap().to_asn1_integer().unwrap())
            .unwrap();
        builder.set_subject_name(&name).unwrap();
        match issuer {
            Some((issuer, _)) => builder.set_issuer_name(issuer.subject_name()).unwrap(),
            None => builder.set_issuer_name(&name).unwrap(),
        }
        builder.set_pubkey(key).unwrap();
        builder
            .set_not_before(&Asn1Time::from_unix(self.validity.not_before.timestamp()).unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::from_unix(self.validity.not_after.timestamp()).unwrap())
            .unwrap();
        if self.ca {
            builder
                .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
                .unwrap();
            builder
                .append_extension(
                    KeyUsage::new()
                        .critical()
                        .key_cert_sign()
                        .crl_sign()
                        .build()
                        .unwrap(),
                )
                .unwrap();
        } else {
            builder
                .append_extension(
                    KeyUsage::new()
                        .critical()
                        .digital_signature()
                        .build()
                        .unwrap(),
                )
                .unwrap();
        }
        for extension in self.extra_extensions {
            builder.append_extension(extension).unwrap();
        }

        let signing_key = issuer.map(|(_, key)| key).unwrap_or(key);
        builder.sign(signing_key, MessageDigest::sha256()).unwrap();
        builder.build()
    }
}

fn ec_key(curve: Nid) -> PKey<Private> {
    let group = EcGroup::from_curve_name(curve).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

/// Non-critical extension holding an ASN.1 NULL, the way Apple encodes its
/// marker extensions.
fn marker_extension(oid: &str) -> X509Extension {
    X509Extension::new_from_der(
        &Asn1Object::from_str(oid).unwrap(),
        false,
        &Asn1OctetString::new_from_bytes(&[0x05, 0x00]).unwrap(),
    )
    .unwrap()
}

/// Authority information access naming a single OCSP responder.
fn ocsp_extension(url: &str) -> X509Extension {
    // id-ad-ocsp
    const OCSP_METHOD: [u8; 10] = [0x06, 0x08, 0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x30, 0x01];
    let mut location = vec![0x86, url.len() as u8];
    location.extend_from_slice(url.as_bytes());
    let mut description = vec![0x30, (OCSP_METHOD.len() + location.len()) as u8];
    description.extend_from_slice(&OCSP_METHOD);
    description.extend_from_slice(&location);
    let mut value = vec![0x30, description.len() as u8];
    value.extend_from_slice(&description);

    X509Extension::new_from_der(
        &Asn1Object::from_str("1.3.6.1.5.5.7.1.1").unwrap(),
        false,
        &Asn1OctetString::new_from_bytes(&value).unwrap(),
    )
    .unwrap()
}
