//! SeaORM entities for the book exchange schema.
//!
//! `user` carries the helpers the auth layer needs; the remaining entities are
//! plain schema definitions.

pub mod errors;
pub mod db;
pub mod user;
pub mod book;
pub mod post;
pub mod exchange;
pub mod message;
pub mod rating;

#[cfg(test)]
mod tests;
