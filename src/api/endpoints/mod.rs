pub mod admin;
pub mod auth;
pub mod chat;
pub mod health;
pub mod records;
