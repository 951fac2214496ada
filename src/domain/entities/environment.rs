use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// The App Store server environment a piece of signed data belongs to.
///
/// https://developer.apple.com/documentation/appstoreserverapi/environment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Environment {
    /// Indicates that the data applies to testing in the sandbox environment.
    Sandbox,
    /// Indicates that the data applies to the production environment.
    Production,
    /// Indicates that the data was generated by StoreKit Testing in Xcode.
    Xcode,
    /// Indicates that the data was generated for local testing.
    LocalTesting,

    #[serde(untagged)]
    Unknown(String),
}

impl Environment {
    /// Data from these environments is signed locally by Xcode rather than by
    /// the App Store, so its signature cannot be verified against Apple's
    /// roots.
    pub fn skips_signature_verification(&self) -> bool {
        matches!(self, Environment::Xcode | Environment::LocalTesting)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Sandbox => write!(f, "Sandbox"),
            Environment::Production => write!(f, "Production"),
            Environment::Xcode => write!(f, "Xcode"),
            Environment::LocalTesting => write!(f, "LocalTesting"),
            Environment::Unknown(other) => write!(f, "{other}"),
        }
    }
}

impl FromStr for Environment {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Sandbox" => Environment::Sandbox,
            "Production" => Environment::Production,
            "Xcode" => Environment::Xcode,
            "LocalTesting" => Environment::LocalTesting,
            other => Environment::Unknown(other.to_string()),
        })
    }
}
