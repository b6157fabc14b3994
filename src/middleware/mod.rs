//! Tower middleware

pub mod rate_limit;
