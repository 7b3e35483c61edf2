//! Service layer for the book exchange backend.
//! - Separates business logic from data access.
//! - Reuses validation and entity definitions in the `models` crate.

pub mod auth;
#[cfg(test)]
pub mod test_support;
