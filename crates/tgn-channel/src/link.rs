//! Per-link state: correlation factors, Bell filter states, and the most
//! recent per-subcarrier matrices.
//!
//! # Direction
//!
//! Every link is stored once, in canonical direction: the lower
//! `(node, sector)` endpoint departs (tx), the higher one arrives (rx).  Tap
//! and subcarrier matrices are `num_rx × num_tx`.  Callers asking from the
//! other side receive the transpose.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized ──initialize──▶ Initialized ──advance(t)──▶ Updated ──advance(t' ≥ t)──▶ …
//! ```
//!
//! `Uninitialized` only exists as a placeholder inserted by
//! `notify_of_imminent_link_use` so that precompute workers never change the
//! link table's structure.

use std::f64::consts::{FRAC_PI_4, PI};
use std::fmt;

use tgn_core::{LinkRng, NodeId, SectorId, SimTime, hash_seed_all};
use tgn_model::{
    ChannelProfile, Complex64, ComplexMatrix, FadingFilterState, SubcarrierLayout, UniformLinearArray,
    WARMUP_SAMPLES, assemble_subcarrier_matrices, correlation_factor,
};

use crate::ModelTiming;

/// Angle of departure and arrival of the LOS ray, regardless of geometry.
const LOS_ANGLE_RAD: f64 = FRAC_PI_4;

// ── LinkEnd / LinkKey ─────────────────────────────────────────────────────────

/// One endpoint of a link.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct LinkEnd {
    pub node:   NodeId,
    pub sector: SectorId,
}

impl LinkEnd {
    #[inline]
    pub fn new(node: NodeId, sector: SectorId) -> Self {
        Self { node, sector }
    }
}

impl From<NodeId> for LinkEnd {
    /// The node's primary sector.
    #[inline]
    fn from(node: NodeId) -> Self {
        Self { node, sector: SectorId::PRIMARY }
    }
}

impl From<(NodeId, SectorId)> for LinkEnd {
    #[inline]
    fn from((node, sector): (NodeId, SectorId)) -> Self {
        Self { node, sector }
    }
}

impl fmt::Display for LinkEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.node, self.sector)
    }
}

/// Canonical, direction-free key of a link: `low < high`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct LinkKey {
    pub low:  LinkEnd,
    pub high: LinkEnd,
}

impl LinkKey {
    /// Canonicalize the link `from → to`.  The flag is `true` when `from` is
    /// the higher endpoint, i.e. the caller's direction is the reverse of the
    /// stored one.
    pub fn new(from: LinkEnd, to: LinkEnd) -> (LinkKey, bool) {
        if from > to {
            (LinkKey { low: to, high: from }, true)
        } else {
            (LinkKey { low: from, high: to }, false)
        }
    }

    /// Fold this key into the channel seed.
    pub fn seed(&self, channel_seed: u64) -> u64 {
        hash_seed_all(
            channel_seed,
            &[
                self.low.node.as_u64(),
                self.low.sector.as_u64(),
                self.high.node.as_u64(),
                self.high.sector.as_u64(),
            ],
        )
    }
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.low, self.high)
    }
}

// ── LinkSlot ──────────────────────────────────────────────────────────────────

/// Entry of the link table.
#[derive(Debug, Default)]
pub enum LinkSlot {
    /// Reserved for a queued precompute job; not yet initialized.
    #[default]
    Uninitialized,
    Active(Box<LinkState>),
}

impl LinkSlot {
    pub fn state(&self) -> Option<&LinkState> {
        match self {
            LinkSlot::Active(state) => Some(&**state),
            LinkSlot::Uninitialized => None,
        }
    }

    /// Initialize the slot if it is still a placeholder, then return the state.
    pub fn get_or_initialize(&mut self, init: impl FnOnce() -> LinkState) -> &mut LinkState {
        if let LinkSlot::Uninitialized = self {
            *self = LinkSlot::Active(Box::new(init()));
        }
        match self {
            LinkSlot::Active(state) => &mut **state,
            LinkSlot::Uninitialized => unreachable!("slot initialized above"),
        }
    }
}

// ── LinkState ─────────────────────────────────────────────────────────────────

/// Shared, read-only inputs to link initialization and advancement.
#[derive(Copy, Clone)]
pub struct LinkContext<'a> {
    pub profile: &'a ChannelProfile,
    pub timing:  &'a ModelTiming,
    pub layout:  SubcarrierLayout,
}

#[derive(Debug)]
struct TapState {
    /// Lower-triangular `L` with `L·Lᴴ = R_tx ⊗ R_rx`.
    correlation: ComplexMatrix,
    filters:     Vec<FadingFilterState>,
    /// White-to-Doppler filtered, not yet spatially correlated samples at the
    /// current and the following fading sample time, one per antenna pair.
    current:     Vec<Complex64>,
    next:        Vec<Complex64>,
    /// Interpolated `num_rx × num_tx` channel at the last update.
    h:           ComplexMatrix,
}

/// Mutable state of one link on one channel.
#[derive(Debug)]
pub struct LinkState {
    rng:            LinkRng,
    num_tx:         usize,
    num_rx:         usize,
    taps:           Vec<TapState>,
    rice_los:       Vec<Complex64>,
    start_time:     SimTime,
    last_update:    SimTime,
    next_sample:    SimTime,
    fading_sample:  i64,
    los:            bool,
    matrices:       Vec<ComplexMatrix>,
}

impl LinkState {
    /// Seed the link's RNG, factor every tap's spatial correlation, and warm
    /// up one Bell filter per antenna pair.
    ///
    /// `departure` is the array of `key.low`, `arrival` the array of
    /// `key.high`.
    pub fn initialize(
        channel_seed: u64,
        key:          &LinkKey,
        departure:    &UniformLinearArray,
        arrival:      &UniformLinearArray,
        start_time:   SimTime,
        profile:      &ChannelProfile,
    ) -> LinkState {
        let mut rng = LinkRng::new(key.seed(channel_seed));
        let num_tx = departure.antenna_count;
        let num_rx = arrival.antenna_count;
        let pairs = num_tx * num_rx;

        let taps = profile
            .taps
            .iter()
            .map(|tap| {
                let mut filters = vec![FadingFilterState::new(); pairs];
                let mut current = Vec::with_capacity(pairs);
                let mut next = Vec::with_capacity(pairs);
                for filter in &mut filters {
                    filter.skip(&mut rng, WARMUP_SAMPLES);
                    current.push(filter.next_sample(&mut rng));
                    next.push(filter.next_sample(&mut rng));
                }
                TapState {
                    correlation: correlation_factor(tap, departure, arrival),
                    filters,
                    current,
                    next,
                    h: ComplexMatrix::zeros(num_rx, num_tx),
                }
            })
            .collect();

        LinkState {
            rng,
            num_tx,
            num_rx,
            taps,
            rice_los: rice_vector(profile, departure, arrival),
            start_time,
            last_update: start_time,
            next_sample: start_time,
            fading_sample: 0,
            los: true,
            matrices: Vec::new(),
        }
    }

    /// `true` once `time` has reached the next output-sample boundary.
    #[inline]
    pub fn needs_update(&self, time: SimTime) -> bool {
        self.next_sample <= time
    }

    /// Bring the link's matrices up to `time`.
    ///
    /// No-op while `time` is before the next output-sample boundary.
    /// Otherwise `los_applies` is evaluated once to decide whether tap 0
    /// carries the LOS component, the Bell filters are stepped to the fading
    /// sample at or before `time`, and every tap's matrix is interpolated
    /// between that sample and the following one.
    ///
    /// # Panics
    ///
    /// Panics if an update would move the link backwards in time.
    pub fn advance(&mut self, time: SimTime, ctx: &LinkContext<'_>, los_applies: impl FnOnce() -> bool) {
        if !self.needs_update(time) {
            return;
        }
        assert!(
            time >= self.last_update,
            "link advanced backwards in time: {time} < {}",
            self.last_update
        );
        self.los = los_applies();

        let timing = ctx.timing;
        let target = time.intervals_since(self.start_time, timing.fading_interval);
        assert!(
            target >= self.fading_sample,
            "fading sample {target} precedes current sample {}",
            self.fading_sample
        );
        let steps = target - self.fading_sample;

        let current_time = self.start_time + timing.fading_interval * target;
        let current_secs = current_time.as_secs_f64();
        let next_secs = current_secs + timing.fading_interval.as_secs_f64();
        let fraction = (time.as_secs_f64() - current_secs) / (next_secs - current_secs);

        let k_factor = ctx.profile.k_factor;
        let los_phasor = |t_secs: f64| {
            Complex64::from_polar(1.0, 2.0 * PI * timing.doppler_cutoff_hz * LOS_ANGLE_RAD.cos() * t_secs)
        };

        for (index, (tap, profile_tap)) in self.taps.iter_mut().zip(&ctx.profile.taps).enumerate() {
            if steps > 0 {
                for j in 0..tap.filters.len() {
                    if steps == 1 {
                        tap.current[j] = tap.next[j];
                    } else {
                        for _ in 0..steps - 1 {
                            tap.current[j] = tap.filters[j].next_sample(&mut self.rng);
                        }
                    }
                    tap.next[j] = tap.filters[j].next_sample(&mut self.rng);
                }
            }

            let scale = profile_tap.normalized_power(self.los).sqrt();
            let mut current = scaled(tap.correlation.mul_vec(&tap.current), scale);
            let mut next = scaled(tap.correlation.mul_vec(&tap.next), scale);

            if index == 0 && self.los {
                let nlos_scale = (1.0 / (k_factor + 1.0)).sqrt();
                let (phasor_now, phasor_next) = (los_phasor(current_secs), los_phasor(next_secs));
                for ((c, n), rice) in current.iter_mut().zip(next.iter_mut()).zip(&self.rice_los) {
                    *c = *c * nlos_scale + phasor_now * rice;
                    *n = *n * nlos_scale + phasor_next * rice;
                }
            }

            for (k, (c, n)) in current.iter().zip(&next).enumerate() {
                tap.h[(k % self.num_rx, k / self.num_rx)] = c + (n - c) * fraction;
            }
        }

        let sample = time.intervals_since(self.start_time, timing.sampling_interval);
        self.next_sample = self.start_time + timing.sampling_interval * (sample + 1);
        self.last_update = time;
        self.fading_sample = target;

        let tap_matrices: Vec<ComplexMatrix> = self.taps.iter().map(|t| t.h.clone()).collect();
        assemble_subcarrier_matrices(&tap_matrices, &ctx.layout, timing.tap_delay_secs, &mut self.matrices);
    }

    /// Subcarrier matrix from the last update, `num_rx × num_tx`.
    ///
    /// # Panics
    ///
    /// Panics if the link has never been advanced or `subcarrier` is out of
    /// range; the facade checks both before calling.
    #[inline]
    pub fn matrix(&self, subcarrier: usize) -> &ComplexMatrix {
        &self.matrices[subcarrier]
    }

    pub fn matrices(&self) -> &[ComplexMatrix] {
        &self.matrices
    }

    #[inline]
    pub fn antenna_counts(&self) -> (usize, usize) {
        (self.num_tx, self.num_rx)
    }

    /// Whether the last update included the LOS component.
    #[inline]
    pub fn los_active(&self) -> bool {
        self.los
    }

    #[inline]
    pub fn start_time(&self) -> SimTime {
        self.start_time
    }

    #[inline]
    pub fn last_update(&self) -> SimTime {
        self.last_update
    }

    #[inline]
    pub fn next_sample_time(&self) -> SimTime {
        self.next_sample
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn scaled(mut v: Vec<Complex64>, factor: f64) -> Vec<Complex64> {
    for x in &mut v {
        *x *= factor;
    }
    v
}

/// LOS contribution per antenna pair, index `k = tx·num_rx + rx`: the
/// arrival ⊗ departure steering outer product at the fixed LOS angle, scaled
/// to tap 0's share of the K-factor power.
fn rice_vector(
    profile:   &ChannelProfile,
    departure: &UniformLinearArray,
    arrival:   &UniformLinearArray,
) -> Vec<Complex64> {
    let k = profile.k_factor;
    let factor = (profile.taps[0].normalized_power_los * (k / (k + 1.0))).sqrt();
    let tx = departure.steering_vector(LOS_ANGLE_RAD);
    let rx = arrival.steering_vector(LOS_ANGLE_RAD);

    let mut rice = Vec::with_capacity(tx.len() * rx.len());
    for t in &tx {
        for r in &rx {
            rice.push(r * t * factor);
        }
    }
    rice
}
