pub mod health;
pub mod lark_config;
pub mod login;
pub mod messages;
