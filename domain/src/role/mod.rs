//! Role domain module
//!
//! A [`Role`] is a persona: a prompt, a restricted tool list and the
//! keywords that route questions to it. Roles live in a [`RoleCatalog`]
//! built once at startup and shared read-only by every turn.

pub mod catalog;
pub mod entities;

pub use catalog::{FINANCIAL_ADVISOR, MARKET_ANALYST, POLICY_EXPERT, PURCHASE_CONSULTANT};
pub use entities::{Role, RoleCatalog, RoleId, RoleOutput};
