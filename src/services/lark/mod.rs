pub mod client;
pub mod clock;
pub mod error;
pub mod factory;
pub mod login;
pub mod messages;
pub mod signature;
pub mod ticket;
pub mod token;

#[cfg(test)]
pub(crate) mod testutil;

pub use client::{LarkTransport, ReqwestTransport};
pub use error::{LarkError, LarkResult};
pub use factory::{LarkServices, build_lark_services};
pub use messages::MessageContent;

/// Lark open API endpoints, relative to the configured base URL.
pub mod paths {
    pub const APP_ACCESS_TOKEN: &str = "/open-apis/auth/v3/app_access_token/internal";
    pub const JSAPI_TICKET: &str = "/open-apis/jssdk/ticket/get";
    pub const USER_ACCESS_TOKEN: &str = "/open-apis/authen/v1/access_token";
    pub const USER_INFO: &str = "/open-apis/authen/v1/user_info";
    pub const MESSAGES: &str = "/open-apis/im/v1/messages";
}
