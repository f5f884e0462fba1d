//! Shared helpers for money handling and timestamps

pub mod currency;
pub mod time;
