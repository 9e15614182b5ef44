//! HTTP request handlers.

pub mod checkout;
pub mod credits;
pub mod generate;
pub mod health;
pub mod images;
pub mod similar;
pub mod users;
pub mod webhooks;
