pub mod data {
    pub mod datasources {
        pub mod app_store_server_api_datasource;
        pub mod app_store_server_notification_datasource;
        pub mod ocsp_responder_datasource;
    }
    pub mod models {
        pub mod app_store_server_api {
            pub mod app_transaction_model;
            pub mod common;
            pub mod jws_renewal_info_decoded_payload_model;
            pub mod jws_transaction_decoded_payload_model;
            pub mod responses;
            pub mod transaction_history_request_model;
        }
        pub mod app_store_server_notifications {
            pub mod response_body_v2_decoded_payload_model;
            pub(crate) mod response_body_v2_model;
        }
    }
    pub mod repositories {
        pub mod app_store_repository_impl;
    }
}

pub mod domain {
    pub mod entities {
        pub mod decoded_payload;
        pub mod environment;
        pub mod test_notification_status;
        pub mod verification_context;
        pub mod verified_notification;
    }
    pub mod repositories {
        pub mod app_store_repository;
    }
}

pub mod verification {
    pub mod chain_verifier;
    pub mod payload_validator;
    pub mod revocation;
    pub mod signature_verifier;
    pub mod signed_data_verifier;
    pub mod token_decoder;
}

pub mod config;
pub mod constants;
pub mod errors;
pub mod promotional_offer;
pub mod receipt_utility;
pub mod util;

pub use data::datasources::ocsp_responder_datasource::HttpOcspResponder;
pub use util::{AppStoreUtil, DefaultAppStoreUtil};
