pub mod admin;
pub mod auth;
pub mod feed;
pub mod health;
pub mod submit;
pub mod webhook;
