pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod errors;
pub mod extract;
pub mod fingerprint;
pub mod model;
pub mod report;
