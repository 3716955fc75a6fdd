pub mod auth;
pub mod errors;
pub mod models;
pub mod state;
pub mod validation;
pub mod views;
