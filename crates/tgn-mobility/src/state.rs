//! Concrete mobility models.

use tgn_core::{Position, SimTime};

use crate::{MobilityError, MobilityModel, MobilityResult};

fn check_finite(p: Position) -> MobilityResult<Position> {
    if p.x.is_finite() && p.y.is_finite() && p.z.is_finite() {
        Ok(p)
    } else {
        Err(MobilityError::NonFinitePosition)
    }
}

// ── StationaryMobility ────────────────────────────────────────────────────────

/// A node that never moves.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StationaryMobility {
    pub position: Position,
}

impl StationaryMobility {
    #[inline]
    pub fn new(position: Position) -> Self {
        Self { position }
    }
}

impl MobilityModel for StationaryMobility {
    #[inline]
    fn position_at(&self, _time: SimTime) -> Position {
        self.position
    }
}

// ── LinearMobility ────────────────────────────────────────────────────────────

/// Straight-line travel from `from` to `to` between `depart` and `arrive`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinearMobility {
    pub from:   Position,
    pub to:     Position,
    pub depart: SimTime,
    pub arrive: SimTime,
}

impl LinearMobility {
    /// # Errors
    ///
    /// `ArrivalBeforeDeparture` if `arrive < depart`, `NonFinitePosition` if
    /// either endpoint has a NaN or infinite component.
    pub fn new(from: Position, to: Position, depart: SimTime, arrive: SimTime) -> MobilityResult<Self> {
        if arrive < depart {
            return Err(MobilityError::ArrivalBeforeDeparture { depart, arrive });
        }
        Ok(Self {
            from:   check_finite(from)?,
            to:     check_finite(to)?,
            depart,
            arrive,
        })
    }

    /// Fraction of the journey completed at `now`, in `[0.0, 1.0]`.
    ///
    /// Zero-length journeys report `1.0` from their departure time onward.
    pub fn progress(&self, now: SimTime) -> f64 {
        if now <= self.depart {
            return if self.arrive <= self.depart && now == self.depart { 1.0 } else { 0.0 };
        }
        if now >= self.arrive {
            return 1.0;
        }
        let elapsed = (now - self.depart).as_nanos() as f64;
        let total   = (self.arrive - self.depart).as_nanos() as f64;
        (elapsed / total).min(1.0)
    }
}

impl MobilityModel for LinearMobility {
    fn position_at(&self, time: SimTime) -> Position {
        self.from.lerp(self.to, self.progress(time))
    }
}

// ── WaypointMobility ──────────────────────────────────────────────────────────

/// Piecewise-linear travel through timed waypoints.
///
/// The node holds the first waypoint's position before its time and the last
/// waypoint's position after its time.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WaypointMobility {
    waypoints: Vec<(SimTime, Position)>,
}

impl WaypointMobility {
    /// # Errors
    ///
    /// `NoWaypoints` for an empty list, `WaypointOutOfOrder` unless times are
    /// strictly increasing, `NonFinitePosition` for NaN or infinite positions.
    pub fn new(waypoints: Vec<(SimTime, Position)>) -> MobilityResult<Self> {
        if waypoints.is_empty() {
            return Err(MobilityError::NoWaypoints);
        }
        for (index, pair) in waypoints.windows(2).enumerate() {
            if pair[1].0 <= pair[0].0 {
                return Err(MobilityError::WaypointOutOfOrder { index: index + 1, time: pair[1].0 });
            }
        }
        for &(_, p) in &waypoints {
            check_finite(p)?;
        }
        Ok(Self { waypoints })
    }

    pub fn waypoints(&self) -> &[(SimTime, Position)] {
        &self.waypoints
    }
}

impl MobilityModel for WaypointMobility {
    fn position_at(&self, time: SimTime) -> Position {
        let next = self.waypoints.partition_point(|&(t, _)| t <= time);
        if next == 0 {
            return self.waypoints[0].1;
        }
        if next == self.waypoints.len() {
            return self.waypoints[next - 1].1;
        }
        let (t0, p0) = self.waypoints[next - 1];
        let (t1, p1) = self.waypoints[next];
        let fraction = (time - t0).as_nanos() as f64 / (t1 - t0).as_nanos() as f64;
        p0.lerp(p1, fraction)
    }
}
