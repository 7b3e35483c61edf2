//! Storage adapters for [`AccountStore`](super::repository::AccountStore).

pub mod seaorm;

pub use seaorm::SeaOrmAccountStore;
