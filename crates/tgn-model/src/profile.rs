//! TGn channel profiles B, C, D and E.
//!
//! Each profile is a fixed table of taps spaced 10 ns apart.  A tap holds one
//! or more clusters, each with a power (dB), a nominal angle of departure and
//! arrival, and the angular spread around them (degrees).  [`ChannelProfile`]
//! expands the table into linear-power, radian, normalized form with the
//! per-cluster Laplacian weights already computed.

use std::fmt;
use std::str::FromStr;

use crate::correlation::normalize_cluster_weights;
use crate::laplacian::laplacian_sd_for;
use crate::{ModelError, ModelResult};

/// Base spacing between consecutive taps.
pub const TAP_DELAY_INCREMENT_SECS: f64 = 1e-8;

// ── Static tables ─────────────────────────────────────────────────────────────

/// One cluster of a published profile.  `power_db[i]` belongs to tap
/// `first_tap + i`; taps outside that range do not contain the cluster.
struct ClusterRow {
    first_tap:      usize,
    power_db:       &'static [f64],
    aod_deg:        f64,
    aod_spread_deg: f64,
    aoa_deg:        f64,
    aoa_spread_deg: f64,
}

impl ClusterRow {
    fn power_db_at(&self, tap: usize) -> Option<f64> {
        tap.checked_sub(self.first_tap)
            .and_then(|i| self.power_db.get(i))
            .copied()
    }
}

struct ProfileTable {
    k_factor_db:  f64,
    breakpoint_m: f64,
    tap_count:    usize,
    clusters:     &'static [ClusterRow],
}

static MODEL_B: ProfileTable = ProfileTable {
    k_factor_db:  0.0,
    breakpoint_m: 5.0,
    tap_count:    9,
    clusters: &[
        ClusterRow {
            first_tap:      0,
            power_db:       &[0.0, -5.4, -10.8, -16.2, -21.7],
            aod_deg:        225.1,
            aod_spread_deg: 14.4,
            aoa_deg:        4.3,
            aoa_spread_deg: 14.4,
        },
        ClusterRow {
            first_tap:      2,
            power_db:       &[-3.2, -6.3, -9.4, -12.5, -15.6, -18.7, -21.8],
            aod_deg:        106.5,
            aod_spread_deg: 25.4,
            aoa_deg:        118.4,
            aoa_spread_deg: 25.2,
        },
    ],
};

static MODEL_C: ProfileTable = ProfileTable {
    k_factor_db:  0.0,
    breakpoint_m: 5.0,
    tap_count:    14,
    clusters: &[
        ClusterRow {
            first_tap:      0,
            power_db:       &[0.0, -2.1, -4.3, -6.5, -8.6, -10.8, -13.0, -15.2, -17.3, -19.5],
            aod_deg:        13.5,
            aod_spread_deg: 24.7,
            aoa_deg:        290.3,
            aoa_spread_deg: 24.6,
        },
        ClusterRow {
            first_tap:      6,
            power_db:       &[-5.0, -7.2, -9.3, -11.5, -13.7, -15.8, -18.0, -20.2],
            aod_deg:        56.4,
            aod_spread_deg: 22.5,
            aoa_deg:        332.3,
            aoa_spread_deg: 22.4,
        },
    ],
};

static MODEL_D: ProfileTable = ProfileTable {
    k_factor_db:  3.0,
    breakpoint_m: 10.0,
    tap_count:    18,
    clusters: &[
        ClusterRow {
            first_tap: 0,
            power_db: &[
                0.0, -0.9, -1.7, -2.6, -3.5, -4.3, -5.2, -6.1, -6.9, -7.8, -9.0, -11.1, -13.7,
                -16.3, -19.3, -23.2,
            ],
            aod_deg:        332.1,
            aod_spread_deg: 27.4,
            aoa_deg:        158.9,
            aoa_spread_deg: 27.7,
        },
        ClusterRow {
            first_tap:      10,
            power_db:       &[-6.6, -9.5, -12.1, -14.7, -17.4, -21.9, -25.5],
            aod_deg:        49.3,
            aod_spread_deg: 32.1,
            aoa_deg:        320.2,
            aoa_spread_deg: 31.4,
        },
        ClusterRow {
            first_tap:      14,
            power_db:       &[-18.8, -23.2, -25.2, -26.7],
            aod_deg:        275.9,
            aod_spread_deg: 36.8,
            aoa_deg:        276.1,
            aoa_spread_deg: 37.4,
        },
    ],
};

static MODEL_E: ProfileTable = ProfileTable {
    k_factor_db:  6.0,
    breakpoint_m: 20.0,
    tap_count:    18,
    clusters: &[
        ClusterRow {
            first_tap: 0,
            power_db: &[
                -2.6, -3.0, -3.5, -3.9, -4.5, -5.6, -6.9, -8.2, -9.8, -11.7, -13.9, -16.1, -18.3,
                -20.5, -22.9,
            ],
            aod_deg:        105.6,
            aod_spread_deg: 36.1,
            aoa_deg:        163.7,
            aoa_spread_deg: 35.8,
        },
        ClusterRow {
            first_tap: 4,
            power_db: &[
                -1.8, -3.2, -4.5, -5.8, -7.1, -9.9, -10.3, -14.3, -14.7, -18.7, -19.9, -22.4,
            ],
            aod_deg:        293.1,
            aod_spread_deg: 42.5,
            aoa_deg:        251.8,
            aoa_spread_deg: 41.6,
        },
        ClusterRow {
            first_tap:      8,
            power_db:       &[-7.9, -9.6, -14.2, -13.8, -18.6, -18.1, -22.8],
            aod_deg:        61.9,
            aod_spread_deg: 38.0,
            aoa_deg:        80.0,
            aoa_spread_deg: 37.4,
        },
        ClusterRow {
            first_tap:      14,
            power_db:       &[-20.6, -20.5, -20.7, -24.6],
            aod_deg:        275.7,
            aod_spread_deg: 38.7,
            aoa_deg:        182.0,
            aoa_spread_deg: 40.3,
        },
    ],
};

// ── ModelLetter ───────────────────────────────────────────────────────────────

/// One of the four published TGn indoor profiles.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModelLetter {
    B,
    C,
    D,
    E,
}

impl ModelLetter {
    pub const ALL: [ModelLetter; 4] = [ModelLetter::B, ModelLetter::C, ModelLetter::D, ModelLetter::E];

    fn table(self) -> &'static ProfileTable {
        match self {
            ModelLetter::B => &MODEL_B,
            ModelLetter::C => &MODEL_C,
            ModelLetter::D => &MODEL_D,
            ModelLetter::E => &MODEL_E,
        }
    }
}

impl FromStr for ModelLetter {
    type Err = ModelError;

    /// Accepts exactly one character, case-insensitive.
    fn from_str(s: &str) -> ModelResult<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => match c.to_ascii_uppercase() {
                'B' => Ok(ModelLetter::B),
                'C' => Ok(ModelLetter::C),
                'D' => Ok(ModelLetter::D),
                'E' => Ok(ModelLetter::E),
                _ => Err(ModelError::UnknownModelLetter(s.to_string())),
            },
            _ => Err(ModelError::UnknownModelLetter(s.to_string())),
        }
    }
}

impl fmt::Display for ModelLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            ModelLetter::B => "B",
            ModelLetter::C => "C",
            ModelLetter::D => "D",
            ModelLetter::E => "E",
        };
        f.write_str(letter)
    }
}

// ── Expanded profile ──────────────────────────────────────────────────────────

/// One multipath cluster as seen from one end of the link.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterDescriptor {
    /// Linear power relative to the profile's 0 dB reference.
    pub relative_power: f64,
    /// Nominal angle of departure or arrival (radians).
    pub angle_rad: f64,
    /// Published angular spread (radians).
    pub angle_spread_rad: f64,
    /// Standard deviation of the untruncated Laplacian that reproduces
    /// `angle_spread_rad` after truncation to `[-π, π]`.
    pub laplacian_sd_rad: f64,
    /// Power-angle-spectrum normalization weight `Q`.
    pub weight_q: f64,
}

impl ClusterDescriptor {
    fn new(power_db: f64, angle_deg: f64, spread_deg: f64) -> Self {
        let angle_spread_rad = spread_deg.to_radians();
        Self {
            relative_power: db_to_linear(power_db),
            angle_rad: angle_deg.to_radians(),
            angle_spread_rad,
            laplacian_sd_rad: laplacian_sd_for(angle_spread_rad),
            weight_q: 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TapProfile {
    /// Sum of the linear cluster powers in this tap.
    pub pdp_relative_power: f64,
    /// Share of total power when the LOS component is present.
    pub normalized_power_los: f64,
    /// Share of total power without a LOS component.
    pub normalized_power_nlos: f64,
    pub departure: Vec<ClusterDescriptor>,
    pub arrival: Vec<ClusterDescriptor>,
}

impl TapProfile {
    #[inline]
    pub fn normalized_power(&self, los: bool) -> f64 {
        if los { self.normalized_power_los } else { self.normalized_power_nlos }
    }
}

/// A fully expanded, normalized profile ready for link initialization.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelProfile {
    pub letter: ModelLetter,
    pub expansion_factor: u32,
    /// Rician K-factor, linear.
    pub k_factor: f64,
    /// Below this endpoint distance the LOS component is present.
    pub k_factor_breakpoint_m: f64,
    pub taps: Vec<TapProfile>,
}

impl ChannelProfile {
    /// Expand the published table for `letter`.
    ///
    /// `expansion_factor > 1` inserts interpolated taps between the published
    /// ones (finer delay resolution for wider channels).
    pub fn new(letter: ModelLetter, expansion_factor: u32) -> ModelResult<Self> {
        if expansion_factor == 0 {
            return Err(ModelError::InvalidExpansionFactor(expansion_factor));
        }
        let table = letter.table();

        let mut taps: Vec<TapProfile> = (0..table.tap_count).map(|i| tap_from_table(table, i)).collect();
        if expansion_factor > 1 {
            taps = expand_taps(&taps, expansion_factor);
        }

        let k_factor = db_to_linear(table.k_factor_db);
        normalize_tap_powers(&mut taps, k_factor);

        for tap in &mut taps {
            normalize_cluster_weights(&mut tap.departure);
            normalize_cluster_weights(&mut tap.arrival);
        }

        Ok(Self {
            letter,
            expansion_factor,
            k_factor,
            k_factor_breakpoint_m: table.breakpoint_m,
            taps,
        })
    }

    #[inline]
    pub fn tap_count(&self) -> usize {
        self.taps.len()
    }

    /// Delay between consecutive taps after expansion.
    #[inline]
    pub fn tap_delay_increment_secs(&self) -> f64 {
        TAP_DELAY_INCREMENT_SECS / self.expansion_factor as f64
    }

    /// Whether endpoints `distance_m` apart see the LOS component.
    #[inline]
    pub fn los_applies(&self, distance_m: f64) -> bool {
        distance_m < self.k_factor_breakpoint_m
    }
}

// ── Construction helpers ──────────────────────────────────────────────────────

#[inline]
pub(crate) fn db_to_linear(db: f64) -> f64 {
    10f64.powf(db / 10.0)
}

#[inline]
pub(crate) fn linear_to_db(linear: f64) -> f64 {
    10.0 * linear.log10()
}

fn tap_from_table(table: &ProfileTable, tap: usize) -> TapProfile {
    let mut departure = Vec::new();
    let mut arrival = Vec::new();
    let mut pdp_relative_power = 0.0;

    for row in table.clusters {
        if let Some(power_db) = row.power_db_at(tap) {
            pdp_relative_power += db_to_linear(power_db);
            departure.push(ClusterDescriptor::new(power_db, row.aod_deg, row.aod_spread_deg));
            arrival.push(ClusterDescriptor::new(power_db, row.aoa_deg, row.aoa_spread_deg));
        }
    }
    assert!(!departure.is_empty(), "profile tap {tap} has no clusters");

    TapProfile {
        pdp_relative_power,
        normalized_power_los: 0.0,
        normalized_power_nlos: 0.0,
        departure,
        arrival,
    }
}

/// Insert `factor - 1` copies of every tap but the last, with the total power
/// interpolated in dB towards the following tap.  Cluster contents are copied
/// unchanged.
fn expand_taps(taps: &[TapProfile], factor: u32) -> Vec<TapProfile> {
    let step = 1.0 / factor as f64;
    let mut expanded = Vec::with_capacity((taps.len() - 1) * factor as usize + 1);

    for pair in taps.windows(2) {
        let (tap, next) = (&pair[0], &pair[1]);
        expanded.push(tap.clone());

        let tap_db = linear_to_db(tap.pdp_relative_power);
        let delta_db = linear_to_db(next.pdp_relative_power) - tap_db;
        for j in 1..factor {
            let mut copy = tap.clone();
            copy.pdp_relative_power = db_to_linear(tap_db + step * j as f64 * delta_db);
            expanded.push(copy);
        }
    }
    if let Some(last) = taps.last() {
        expanded.push(last.clone());
    }
    expanded
}

/// Fill both normalized power columns.  The LOS column carries `K` extra
/// units of tap-0 power; the NLOS column ignores the K-factor entirely.
fn normalize_tap_powers(taps: &mut [TapProfile], k_factor: f64) {
    let nlos_total: f64 = taps.iter().map(|t| t.pdp_relative_power).sum();
    let los_total = nlos_total + k_factor * taps[0].pdp_relative_power;

    for (i, tap) in taps.iter_mut().enumerate() {
        let los_power = if i == 0 {
            (1.0 + k_factor) * tap.pdp_relative_power
        } else {
            tap.pdp_relative_power
        };
        tap.normalized_power_los = los_power / los_total;
        tap.normalized_power_nlos = tap.pdp_relative_power / nlos_total;
    }
}
