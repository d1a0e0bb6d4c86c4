use tgn_core::SimTime;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MobilityError {
    #[error("arrival time {arrive} precedes departure time {depart}")]
    ArrivalBeforeDeparture { depart: SimTime, arrive: SimTime },

    #[error("waypoint list is empty")]
    NoWaypoints,

    #[error("waypoint {index} at {time} is not after the previous waypoint")]
    WaypointOutOfOrder { index: usize, time: SimTime },

    #[error("position component is not finite")]
    NonFinitePosition,
}

pub type MobilityResult<T> = Result<T, MobilityError>;
