//! Identity checks run on payloads after their signature has been verified.

use crate::{
    constants::SANDBOX_EXTERNAL_PURCHASE_ID_PREFIX,
    data::models::{
        app_store_server_api::{
            app_transaction_model::AppTransactionModel,
            jws_renewal_info_decoded_payload_model::JwsRenewalInfoDecodedPayloadModel,
            jws_transaction_decoded_payload_model::JwsTransactionDecodedPayloadModel,
        },
        app_store_server_notifications::response_body_v2_decoded_payload_model::{
            ExternalPurchaseToken, NotificationContent, ResponseBodyV2DecodedPayloadModel,
        },
    },
    domain::entities::{environment::Environment, verification_context::VerificationContext},
    errors::VerificationError,
};

/// Whether a payload kind carries an identity field at all, and its value if
/// it does. Fields a payload kind does not carry are not checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim<T> {
    NotCarried,
    Carried(Option<T>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedIdentity<'a> {
    pub bundle_id: Claim<&'a str>,
    pub app_apple_id: Claim<i64>,
    pub environment: Claim<Environment>,
}

/// Implemented by every payload kind the verifier can return.
pub trait IdentityClaims {
    fn claimed_identity(&self) -> ClaimedIdentity<'_>;
}

/// Checks a payload's identity against the context, in order: bundle id, app
/// Apple id (Production only), environment.
pub fn validate<P: IdentityClaims + ?Sized>(
    context: &VerificationContext,
    payload: &P,
) -> Result<(), VerificationError> {
    let identity = payload.claimed_identity();

    if let Claim::Carried(bundle_id) = identity.bundle_id {
        if bundle_id != Some(context.bundle_id()) {
            return Err(VerificationError::InvalidAppIdentifier);
        }
    }

    if *context.environment() == Environment::Production {
        if let Claim::Carried(app_apple_id) = identity.app_apple_id {
            if app_apple_id.is_none() || app_apple_id != context.app_apple_id() {
                return Err(VerificationError::InvalidAppIdentifier);
            }
        }
    }

    if let Claim::Carried(environment) = identity.environment {
        if environment.as_ref() != Some(context.environment()) {
            return Err(VerificationError::InvalidEnvironment);
        }
    }

    Ok(())
}

impl IdentityClaims for JwsTransactionDecodedPayloadModel {
    fn claimed_identity(&self) -> ClaimedIdentity<'_> {
        ClaimedIdentity {
            bundle_id: Claim::Carried(self.bundle_id.as_deref()),
            app_apple_id: Claim::NotCarried,
            environment: Claim::Carried(self.environment.clone()),
        }
    }
}

impl IdentityClaims for JwsRenewalInfoDecodedPayloadModel {
    fn claimed_identity(&self) -> ClaimedIdentity<'_> {
        ClaimedIdentity {
            bundle_id: Claim::NotCarried,
            app_apple_id: Claim::NotCarried,
            environment: Claim::Carried(self.environment.clone()),
        }
    }
}

impl IdentityClaims for AppTransactionModel {
    fn claimed_identity(&self) -> ClaimedIdentity<'_> {
        ClaimedIdentity {
            bundle_id: Claim::Carried(self.bundle_id.as_deref()),
            app_apple_id: Claim::Carried(self.app_apple_id),
            environment: Claim::Carried(self.receipt_type.clone()),
        }
    }
}

impl IdentityClaims for ResponseBodyV2DecodedPayloadModel {
    fn claimed_identity(&self) -> ClaimedIdentity<'_> {
        let (bundle_id, app_apple_id, environment) = match &self.content {
            NotificationContent::Data(data) => (
                data.bundle_id.as_deref(),
                data.app_apple_id,
                data.environment.clone(),
            ),
            NotificationContent::Summary(summary) => (
                summary.bundle_id.as_deref(),
                summary.app_apple_id,
                summary.environment.clone(),
            ),
            NotificationContent::ExternalPurchaseToken(token) => (
                token.bundle_id.as_deref(),
                token.app_apple_id,
                Some(token.inferred_environment()),
            ),
        };
        ClaimedIdentity {
            bundle_id: Claim::Carried(bundle_id),
            app_apple_id: Claim::Carried(app_apple_id),
            environment: Claim::Carried(environment),
        }
    }
}

impl ExternalPurchaseToken {
    /// External purchase tokens carry no environment field. Apple prefixes the
    /// ids of sandbox tokens with "SANDBOX"; anything else, including a missing
    /// id, is treated as Production.
    pub fn inferred_environment(&self) -> Environment {
        match &self.external_purchase_id {
            Some(id) if id.starts_with(SANDBOX_EXTERNAL_PURCHASE_ID_PREFIX) => {
                Environment::Sandbox
            }
            _ => Environment::Production,
        }
    }
}
