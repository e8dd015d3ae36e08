//! fredcat library
//!
//! Harvests FRED series metadata category by category, memoizing every
//! category in a durable store so that no category is ever requested twice.

pub mod cache;
pub mod cli;
pub mod data;
pub mod export;
pub mod harvest;
pub mod throttle;

#[cfg(test)]
mod test_support;
