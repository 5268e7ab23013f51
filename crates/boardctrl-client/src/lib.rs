//! Client for the signage backend
//!
//! Wraps the REST endpoints the controller needs (sign-in, category and board
//! listings, slides of a board) and the local credential store that carries the
//! bearer token between invocations.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]
#![allow(clippy::missing_errors_doc, clippy::must_use_candidate)]

pub mod api_client;
pub mod credentials;
pub mod error;

pub use api_client::{ApiClient, SlideSource};
pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use error::{ClientError, ClientResult};
