/// Metric recorders for token issuance, validation, and store access
pub mod metrics;
