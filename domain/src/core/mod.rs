//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`]: domain-level errors
//! - [`error::ErrorCode`]: stable codes surfaced in `error` events
//! - [`string`]: UTF-8 safe truncation and conversation titles

pub mod error;
pub mod string;
