//! Sales overview dashboard: loads the e-commerce transaction CSV, filters it
//! by purchase date and category, and computes the chart tables.

pub mod aggregation;
pub mod cache;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod service;
pub mod source;
