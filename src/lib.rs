//! Bridge between a Lark web/webview client and the Lark open platform:
//! JSSDK config signing backed by a single-flight jsapi ticket cache, plus
//! thin login and messaging proxies.
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
