//! Domain types shared by the rewrite engine and its adapters.

pub mod errors;
pub mod model;
pub mod symbols;
