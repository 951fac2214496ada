use super::environment::Environment;
use crate::errors::VerificationError;

/// The identity signed data is expected to belong to.
///
/// Built once per verifier and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationContext {
    environment: Environment,
    bundle_id: String,
    app_apple_id: Option<i64>,
    enable_online_checks: bool,
}

impl VerificationContext {
    /// app_apple_id:
    ///   The unique identifier the App Store uses for the app. Required when
    ///   `environment` is Production, ignored otherwise.
    pub fn new(
        environment: Environment,
        bundle_id: impl Into<String>,
        app_apple_id: Option<i64>,
        enable_online_checks: bool,
    ) -> Result<Self, VerificationError> {
        if let Environment::Unknown(other) = &environment {
            return Err(VerificationError::InvalidConfiguration(format!(
                "unknown environment '{other}'"
            )));
        }
        if environment == Environment::Production && app_apple_id.is_none() {
            return Err(VerificationError::InvalidConfiguration(
                "app_apple_id is required when the environment is Production".to_string(),
            ));
        }
        Ok(Self {
            environment,
            bundle_id: bundle_id.into(),
            app_apple_id,
            enable_online_checks,
        })
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn bundle_id(&self) -> &str {
        &self.bundle_id
    }

    pub fn app_apple_id(&self) -> Option<i64> {
        self.app_apple_id
    }

    pub fn enable_online_checks(&self) -> bool {
        self.enable_online_checks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_requires_app_apple_id() {
        let err = VerificationContext::new(Environment::Production, "com.example", None, false)
            .unwrap_err();
        assert!(matches!(err, VerificationError::InvalidConfiguration(_)));
        assert!(
            VerificationContext::new(Environment::Production, "com.example", Some(1), false)
                .is_ok()
        );
    }

    #[test]
    fn sandbox_does_not_require_app_apple_id() {
        let context =
            VerificationContext::new(Environment::Sandbox, "com.example", None, true).unwrap();
        assert_eq!(context.bundle_id(), "com.example");
        assert!(context.enable_online_checks());
    }

    #[test]
    fn rejects_unknown_environment() {
        let err = VerificationContext::new(
            Environment::Unknown("Staging".into()),
            "com.example",
            None,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, VerificationError::InvalidConfiguration(_)));
    }
}
