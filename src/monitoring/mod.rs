pub mod logger;
pub mod monitor;
