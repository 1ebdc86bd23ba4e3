//! # GM Director (The Game Master)
//!
//! The decision core of the pacing system. Each turn it reads the telemetry
//! accumulated in `gm_state` and decides, reproducibly, whether to surface a
//! line of flavor, a nudge toward an optional mechanic or a rare scripted
//! travel encounter. It never touches gameplay state.
//!
//! ## Core Components
//!
//! - **director**: the host-owned session; every public operation goes through it
//! - **turn**: per-turn boredom and mood dynamics
//! - **ingest**: telemetry folded into counters, reputation and mood
//! - **intents**: entrance flavor and mechanic hint channels
//! - **factions**: reputation-armed travel events on top of the scheduler
//! - **persist**: snapshot store seam and save policy
//! - **config**: tuning, loadable from TOML
//!
//! ## Design Philosophy
//!
//! - **Deterministic**: same run id and call sequence, same decisions
//! - **Advisory**: outputs are proposals the presentation layer may ignore
//! - **Fail-quiet**: storage and decoding failures fall back to fresh state

pub mod config;
pub mod director;
pub mod error;
pub mod events;
pub mod factions;
pub mod ingest;
pub mod intents;
pub mod persist;
pub mod tags;
pub mod turn;

pub use config::*;
pub use director::*;
pub use error::*;
pub use events::*;
pub use factions::*;
pub use ingest::*;
pub use intents::*;
pub use persist::*;
pub use tags::*;
pub use turn::*;

pub use gm_state;
