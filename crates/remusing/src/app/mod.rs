//! Application layer: the capture, resolve, plan, and rewrite stages.

pub mod capture;
pub mod pipeline;
pub mod plan;
pub mod queries;
pub mod resolve;
pub mod rewrite;
