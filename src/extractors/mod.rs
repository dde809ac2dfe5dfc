// src/extractors/mod.rs
pub mod statements;

// Re-export key extraction types for convenience
pub use statements::{
    FinancialStatements, SecApiClient, Statement, XbrlConverter, DEFAULT_STATEMENTS,
};
