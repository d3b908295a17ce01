//! Core data types for the Hivecap engine

pub mod account;
pub mod ids;
