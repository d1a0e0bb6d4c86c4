//! `tgn-mobility` — where a node is at a given simulation time.
//!
//! The channel model only ever asks one question of mobility: the position
//! of a node at a given instant, so it can decide whether the two endpoints
//! of a link are inside the K-factor breakpoint distance.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                       |
//! |-------------|----------------------------------------------------------------|
//! | [`model`]   | `MobilityModel` trait, `SharedMobility` handle                 |
//! | [`state`]   | `StationaryMobility`, `LinearMobility`, `WaypointMobility`     |
//! | [`error`]   | `MobilityError`, `MobilityResult<T>`                           |
//!
//! # Movement model
//!
//! `LinearMobility` interpolates straight-line between a departure and an
//! arrival position.  Before departure the node sits at the start, after
//! arrival it sits at the destination.  `WaypointMobility` chains such legs.

pub mod error;
pub mod model;
pub mod state;


pub use error::{MobilityError, MobilityResult};
pub use model::{MobilityModel, SharedMobility};
pub use state::{LinearMobility, StationaryMobility, WaypointMobility};
