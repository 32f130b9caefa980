pub mod persistence;
pub mod resolver;
pub mod tracker;
pub mod types;
