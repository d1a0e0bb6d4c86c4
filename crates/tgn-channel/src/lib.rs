//! `tgn-channel` — the on-demand TGn MIMO channel model.
//!
//! Links are created on first use, stored once in canonical direction, and
//! advanced lazily to each query time.  Matrices depend only on the run seed,
//! the link endpoints, and the query times, never on which thread computed
//! them.
//!
//! # Query flow
//!
//! ```text
//! channel_matrix(time, channel, from → to, subcarrier):
//!   ① Resolve     — channel number → table, nodes → antenna arrays
//!   ② Initialize  — first touch: seed link RNG, factor correlations,
//!                   warm up one Bell filter per antenna pair per tap
//!   ③ Advance     — if the next sample boundary has passed: LOS check,
//!                   step filters, interpolate taps, assemble subcarriers
//!   ④ Orient      — transpose when `from` is the link's arriving end
//! ```
//!
//! # Crate layout
//!
//! | Module        | Contents                                                     |
//! |---------------|--------------------------------------------------------------|
//! | [`config`]    | `TgnConfig`, `ChannelSpec`, `AntennaArrayConfig`, `ModelTiming` |
//! | [`link`]      | `LinkKey`, `LinkSlot`, `LinkState` (initialize / advance)    |
//! | [`table`]     | `LinkTable`, `ChannelData`                                   |
//! | [`scheduler`] | `PrecomputeScheduler` fork-join rounds                       |
//! | [`model`]     | `TgnMimoChannelModel`, `ModelInterface`, `NodeChannelView`   |
//! | [`loader`]    | Per-node antenna layouts from CSV                            |
//! | [`error`]     | `ChannelError`, `ChannelResult<T>`                           |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                        |
//! |------------|---------------------------------------------------------------|
//! | `parallel` | Precompute rounds run on a Rayon pool of `worker_threads − 1` threads plus the caller. |
//! | `fx-hash`  | FxHash instead of SipHash for the node and link maps.         |
//! | `serde`    | `Serialize`/`Deserialize` on configuration types.             |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tgn_channel::{AntennaArrayConfig, TgnConfig, TgnMimoChannelModel};
//! use tgn_core::{ChannelNumber, NodeId, Position, SectorId, SimTime};
//! use tgn_mobility::StationaryMobility;
//!
//! let mut model = TgnMimoChannelModel::new(TgnConfig::default())?;
//! let ap = model.create_interface_for(
//!     NodeId(0), SectorId::PRIMARY, AntennaArrayConfig::new(2, 0.5),
//!     Arc::new(StationaryMobility::new(Position::default())),
//! )?;
//! let sta = model.create_interface_for(
//!     NodeId(1), SectorId::PRIMARY, AntennaArrayConfig::new(2, 0.5),
//!     Arc::new(StationaryMobility::new(Position::new(20.0, 0.0, 0.0))),
//! )?;
//! let h = model.view(&sta)?.channel_matrix(SimTime::ZERO, ChannelNumber(0), ap.end(), 0)?;
//! ```

pub mod config;
pub mod error;
pub mod link;
pub mod loader;
pub mod model;
pub mod scheduler;
pub mod table;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{AntennaArrayConfig, ChannelSpec, DEFAULT_SCATTERER_SPEED_M_S, ModelTiming, SPEED_OF_LIGHT_M_S, TgnConfig};
pub use error::{ChannelError, ChannelResult};
pub use link::{LinkContext, LinkEnd, LinkKey, LinkSlot, LinkState};
pub use loader::{load_antenna_configs_csv, load_antenna_configs_reader};
pub use model::{ModelInterface, NodeChannelView, TgnMimoChannelModel};
pub use scheduler::{PrecomputeJob, PrecomputeScheduler};
pub use table::{ChannelData, LinkTable};
