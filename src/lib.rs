//! vaultd: an encrypted personal-secrets manager with client/server sync.
//!
//! The server stores opaque ciphertext envelopes per owner and reconciles
//! divergent device state with last-write-wins merging over soft deletes.
//! The client keeps an encrypted in-memory vault and applies each successful
//! sync round trip as a wholesale replacement of its local set.

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod router;
pub mod session;
pub mod state;
pub mod storage;

pub mod crypto {
    pub mod secretbox;
}

pub mod models {
    pub mod envelope;
    pub mod item;
    pub mod session;
    pub mod user;
}

pub mod services {
    pub mod auth;
    pub mod reconcile;
}

pub mod handlers {
    pub mod auth;
    pub mod sync;
}

pub mod middleware_layer {
    pub mod auth;
}

pub mod validation {
    pub mod auth;
}

pub mod client {
    pub mod api;
    pub mod credentials;
    pub mod vault;
}
