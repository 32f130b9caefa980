pub mod quarter_rules;
pub mod types;
