use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Method};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    constants::{
        APP_STORE_SERVER_API_AUDIENCE, APP_STORE_SERVER_API_PRODUCTION_URL,
        APP_STORE_SERVER_API_SANDBOX_URL,
    },
    data::models::app_store_server_api::{
        responses::{
            CheckTestNotificationResponseModel, HistoryResponseModel,
            SendTestNotificationResponse, TransactionInfoResponseModel,
        },
        transaction_history_request_model::TransactionHistoryRequest,
    },
    domain::entities::environment::Environment,
    errors::{AppStoreApiError, ConfigError},
};

type JwsTransaction = String;

#[async_trait]
pub trait AppStoreServerApiDatasource: Send + Sync {
    /// Get Transaction Info:
    /// https://developer.apple.com/documentation/appstoreserverapi/get_transaction_info
    ///
    /// transaction_id:
    ///   The identifier of a transaction that belongs to the customer, and
    ///   which may be an original transaction identifier.
    ///
    /// Returns the still-unverified signed transaction.
    async fn get_transaction_info(
        &self,
        transaction_id: &str,
    ) -> Result<JwsTransaction, AppStoreApiError>;

    /// Get Transaction History (v2), one page:
    /// https://developer.apple.com/documentation/appstoreserverapi/get-transaction-history
    ///
    /// revision:
    ///   The token from the previous page, or `None` for the first page.
    async fn get_transaction_history(
        &self,
        transaction_id: &str,
        revision: Option<&str>,
        request: &TransactionHistoryRequest,
    ) -> Result<HistoryResponseModel, AppStoreApiError>;

    /// Request a Test Notification:
    /// https://developer.apple.com/documentation/appstoreserverapi/request_a_test_notification
    async fn request_test_notification(
        &self,
    ) -> Result<SendTestNotificationResponse, AppStoreApiError>;

    /// Get Test Notification Status:
    /// https://developer.apple.com/documentation/appstoreserverapi/get_test_notification_status
    async fn get_test_notification_status(
        &self,
        test_notification_token: &str,
    ) -> Result<CheckTestNotificationResponseModel, AppStoreApiError>;
}

pub struct AppStoreServerApiDatasourceImpl {
    client: reqwest::Client,
    base_url: &'static str,
    encoding_key: jsonwebtoken::EncodingKey,
    key_id: String,
    issuer_id: String,
    bundle_id: String,
}

#[async_trait]
impl AppStoreServerApiDatasource for AppStoreServerApiDatasourceImpl {
    async fn get_transaction_info(
        &self,
        transaction_id: &str,
    ) -> Result<JwsTransaction, AppStoreApiError> {
        let response: TransactionInfoResponseModel = self
            .callout(
                Method::GET,
                &format!("/inApps/v1/transactions/{transaction_id}"),
                &[],
                "GetTransactionInfo",
            )
            .await?;
        Ok(response.signed_transaction_info)
    }

    async fn get_transaction_history(
        &self,
        transaction_id: &str,
        revision: Option<&str>,
        request: &TransactionHistoryRequest,
    ) -> Result<HistoryResponseModel, AppStoreApiError> {
        self.callout(
            Method::GET,
            &format!("/inApps/v2/history/{transaction_id}"),
            &request.query(revision),
            "GetTransactionHistory",
        )
        .await
    }

    async fn request_test_notification(
        &self,
    ) -> Result<SendTestNotificationResponse, AppStoreApiError> {
        self.callout(
            Method::POST,
            "/inApps/v1/notifications/test",
            &[],
            "RequestTestNotification",
        )
        .await
    }

    async fn get_test_notification_status(
        &self,
        test_notification_token: &str,
    ) -> Result<CheckTestNotificationResponseModel, AppStoreApiError> {
        self.callout(
            Method::GET,
            &format!("/inApps/v1/notifications/test/{test_notification_token}"),
            &[],
            "GetTestNotificationStatus",
        )
        .await
    }
}

impl AppStoreServerApiDatasourceImpl {
    /// signing_key:
    ///   The PEM contents of the In-App Purchase key (.p8) downloaded from App
    ///   Store Connect.
    pub fn new(
        signing_key: &str,
        key_id: &str,
        issuer_id: &str,
        bundle_id: &str,
        environment: &Environment,
    ) -> Result<Self, AppStoreApiError> {
        let encoding_key = jsonwebtoken::EncodingKey::from_ec_pem(signing_key.as_bytes())
            .map_err(|e| AppStoreApiError::ApiKeyInvalid(format!("{e:?}")))?;
        let base_url = match environment {
            Environment::Production => APP_STORE_SERVER_API_PRODUCTION_URL,
            Environment::Sandbox | Environment::LocalTesting => APP_STORE_SERVER_API_SANDBOX_URL,
            Environment::Xcode | Environment::Unknown(_) => {
                return Err(AppStoreApiError::Config(ConfigError::Invalid {
                    key: "environment",
                    details: format!("the App Store Server API has no {environment} environment"),
                }))
            }
        };
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            encoding_key,
            key_id: key_id.to_owned(),
            issuer_id: issuer_id.to_owned(),
            bundle_id: bundle_id.to_owned(),
        })
    }

    /// Tokens are short-lived, so a fresh one is signed for every request.
    fn build_jwt_token(&self) -> Result<String, AppStoreApiError> {
        // Build header.
        let mut header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::ES256);
        header.kid = Some(self.key_id.clone());

        // Build claims.
        #[derive(Debug, Serialize, Deserialize)]
        struct Claims<'a> {
            iss: &'a str,
            iat: i64,
            exp: i64,
            aud: &'a str,
            bid: &'a str,
        }
        let now = chrono::Utc::now();
        let claims = Claims {
            iss: &self.issuer_id,
            iat: now.timestamp(),
            exp: (now + chrono::Duration::minutes(10)).timestamp(),
            aud: APP_STORE_SERVER_API_AUDIENCE,
            bid: &self.bundle_id,
        };

        // Build token.
        jsonwebtoken::encode(&header, &claims, &self.encoding_key)
            .map_err(|e| AppStoreApiError::ApiKeyInvalid(format!("{e:?}")))
    }

    async fn callout<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        function: &'static str,
    ) -> Result<T, AppStoreApiError> {
        let response = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .query(query)
            .header(AUTHORIZATION, format!("Bearer {}", self.build_jwt_token()?))
            .send()
            .await
            .map_err(|e| AppStoreApiError::CalloutFailed {
                function,
                details: format!("{e:?}"),
            })?;

        if !response.status().is_success() {
            return Err(AppStoreApiError::UnexpectedStatus {
                function,
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| AppStoreApiError::InvalidResponse {
                function,
                details: format!("{e:?}"),
            })
    }
}
