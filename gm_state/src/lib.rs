//! # GM State
//!
//! The ledger crate - the canonical pacing state of a run and the pure data
//! structures around it. It holds no pacing decisions; those live in
//! `gm_director`.
//!
//! - **state**: the `GmState` aggregate, its ledgers and self-healing snapshot decoding
//! - **schedule**: deterministic priority scheduler for delayed GM actions
//! - **rng**: private seeded random stream
//! - **run**: run identity and seed derivation
//! - **mechanics**: closed vocabularies for mechanics and intent strength

pub mod error;
pub mod mechanics;
pub mod rng;
pub mod run;
pub mod schedule;
pub mod state;

pub use error::*;
pub use mechanics::*;
pub use rng::*;
pub use run::*;
pub use schedule::*;
pub use state::*;
