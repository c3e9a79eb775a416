//! The peer-facing HTTP surface: `/download/:fid` and `/attest`, consumed by
//! other providers' attestation and stray-reclamation clients, plus two
//! small status endpoints (`/version`, `/`) carried over from the original
//! daemon for operational parity.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::routes;
pub use state::AppState;
