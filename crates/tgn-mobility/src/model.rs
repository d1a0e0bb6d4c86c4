//! The mobility query seam.

use std::sync::Arc;

use tgn_core::{Position, SimTime};

/// Anything that can report a node's position at a point in time.
///
/// Implementations are queried from the precompute workers, so they must be
/// `Send + Sync` and must not depend on query order.
pub trait MobilityModel: Send + Sync {
    fn position_at(&self, time: SimTime) -> Position;
}

/// A mobility model shared between the caller and the channel model.
pub type SharedMobility = Arc<dyn MobilityModel>;

impl<M: MobilityModel + ?Sized> MobilityModel for Arc<M> {
    #[inline]
    fn position_at(&self, time: SimTime) -> Position {
        (**self).position_at(time)
    }
}

impl<M: MobilityModel + ?Sized> MobilityModel for Box<M> {
    #[inline]
    fn position_at(&self, time: SimTime) -> Position {
        (**self).position_at(time)
    }
}
