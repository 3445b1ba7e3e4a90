// Library exports for use in integration tests and binaries
pub mod config;
pub mod export;
pub mod i18n;
pub mod middleware;
pub mod server;
