//! `tgn-core` — foundational types shared by every `tgn-*` crate.
//!
//! This crate has no `tgn-*` dependencies and a single external one (`rand`,
//! plus optional `serde`).
//!
//! # What lives here
//!
//! | Module    | Contents                                                  |
//! |-----------|-----------------------------------------------------------|
//! | [`ids`]   | `NodeId`, `SectorId`, `ChannelNumber`                     |
//! | [`geo`]   | `Position` (metres, Cartesian) and Euclidean distance     |
//! | [`time`]  | `SimTime` (integer nanoseconds)                           |
//! | [`rng`]   | `LinkRng`, seed hashing helpers                           |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use geo::Position;
pub use ids::{ChannelNumber, NodeId, SectorId};
pub use rng::{LinkRng, hash_name, hash_seed, hash_seed_all};
pub use time::SimTime;
