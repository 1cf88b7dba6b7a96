//! Cross-component integration flows.

pub mod cold_chain;
pub mod flows;
