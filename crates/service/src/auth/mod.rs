//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Registration, login and token checks live here, independent of the web
//! framework. Hashing, token signing and storage sit behind traits.

pub mod domain;
pub mod errors;
pub mod password;
pub mod policy;
pub mod repo;
pub mod repository;
pub mod service;
pub mod token;

pub use errors::AuthError;
pub use service::AuthService;
