//! Top-level facade crate for tdfeed.
//!
//! Re-exports the TD decoder and the relay library so users can depend on a single crate.

pub mod core {
    pub use tdfeed_core::*;
}

pub mod relay {
    pub use tdfeed_relay::*;
}
