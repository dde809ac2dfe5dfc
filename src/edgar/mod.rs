// src/edgar/mod.rs
pub mod client;
pub mod directory;
pub mod index;
pub mod locator;
pub mod models;
