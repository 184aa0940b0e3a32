//! # Kamae
//!
//! Entity-conditioned stance detection. Re-exports the inference and data
//! API from `kamae-core` and the fine-tuning API from `kamae-trainer`.

pub use kamae_core::*;

pub mod trainer {
    pub use kamae_trainer::*;
}
