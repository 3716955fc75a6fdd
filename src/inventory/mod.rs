pub mod consumption;
pub mod models;
pub mod services;
pub mod usage;
pub mod views;

#[cfg(test)]
mod tests;
