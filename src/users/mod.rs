pub mod models;
pub mod services;
pub mod tokens;
pub mod views;
