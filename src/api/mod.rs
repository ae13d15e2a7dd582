//! Data access over the hosted backend.
//!
//! The backend exposes an auto-generated table-oriented REST layer plus a
//! password-grant auth endpoint. Everything the client needs from it fits
//! behind two traits: [`TableApi`] for row reads/writes and [`AuthApi`]
//! for session management. Screens depend on the traits, never on the
//! concrete HTTP client.

pub mod error;
pub mod filter;
pub mod rest;
pub mod table;

#[cfg(test)]
pub mod mock;

pub use error::ApiError;
pub use filter::Filter;
pub use rest::RestApi;
pub use table::{AuthApi, Session, TableApi};
