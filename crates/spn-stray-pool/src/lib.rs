//! Bounded pool of workers ("Hands") that claim orphaned contracts
//! published by the chain, recovering bytes from disk or peers, and binding
//! the claimed contract id to the existing file fingerprint.

pub mod hand;
pub mod key;
pub mod pool;

pub use hand::{process, Hand, HandContext, ProcessError};
pub use key::derive_hand_key;
pub use pool::{Pool, DEFAULT_POLL_INTERVAL};
