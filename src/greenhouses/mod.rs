pub mod lifecycle;
pub mod models;
pub mod services;
pub mod views;
