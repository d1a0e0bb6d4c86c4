//! Model configuration and the timing derived from it.

use tgn_core::{ChannelNumber, SimTime};
use tgn_model::{ModelLetter, NORMALIZED_DOPPLER_SPREAD, UniformLinearArray};

use crate::{ChannelError, ChannelResult};

pub const SPEED_OF_LIGHT_M_S: f64 = 299_792_458.0;

/// Default speed of the scatterers around the link, which sets the Doppler
/// cutoff for every link.
pub const DEFAULT_SCATTERER_SPEED_M_S: f64 = 1.0 / 3.0;

// ── ChannelSpec ───────────────────────────────────────────────────────────────

/// One RF channel served by the model.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelSpec {
    pub carrier_hz:   f64,
    pub bandwidth_hz: f64,
}

impl ChannelSpec {
    pub fn new(carrier_hz: f64, bandwidth_hz: f64) -> Self {
        Self { carrier_hz, bandwidth_hz }
    }
}

// ── AntennaArrayConfig ────────────────────────────────────────────────────────

/// Antenna layout of one node: a uniform linear array.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AntennaArrayConfig {
    pub antenna_count:       usize,
    /// Element spacing in carrier wavelengths.
    pub spacing_wavelengths: f64,
}

impl AntennaArrayConfig {
    pub fn new(antenna_count: usize, spacing_wavelengths: f64) -> Self {
        Self { antenna_count, spacing_wavelengths }
    }

    /// Check the layout and convert it to the model's array type.
    pub fn to_array(&self) -> ChannelResult<UniformLinearArray> {
        if self.antenna_count == 0 {
            return Err(ChannelError::Config("antenna count must be at least 1".into()));
        }
        if !(self.spacing_wavelengths.is_finite() && self.spacing_wavelengths > 0.0) {
            return Err(ChannelError::Config(format!(
                "antenna spacing must be positive, got {}",
                self.spacing_wavelengths
            )));
        }
        Ok(UniformLinearArray::new(self.antenna_count, self.spacing_wavelengths))
    }
}

// ── TgnConfig ─────────────────────────────────────────────────────────────────

/// Everything the channel model needs at construction time.
///
/// Per-node antenna layouts are supplied later, when each node registers.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TgnConfig {
    /// Published profile to use for every link.
    pub model: ModelLetter,

    /// TGac sampling-rate expansion: taps per published 10 ns tap.  Default 1.
    pub expansion_factor: u32,

    /// Drives the Doppler cutoff.  Default 1/3 m/s.
    pub scatterer_speed_m_s: f64,

    /// Granularity at which channel matrices are refreshed.  `None` uses the
    /// fading sample interval.
    pub sampling_interval: Option<SimTime>,

    /// Threads used by a precompute round, counting the caller.  `0`
    /// disables precomputation.
    pub worker_threads: usize,

    /// Number of the first entry of `channels`.
    pub base_channel: ChannelNumber,

    /// RF channels, in channel-number order.  All must share one bandwidth.
    /// The first carrier sets the Doppler cutoff for all of them.
    pub channels: Vec<ChannelSpec>,

    /// OFDM subcarriers per channel.
    pub subcarrier_count: usize,

    /// Per-run seed.  The same seed and query sequence always produce
    /// identical matrices.
    pub run_seed: u64,

    /// Distinguishes several model instances within one run.
    pub instance_name: String,
}

impl Default for TgnConfig {
    fn default() -> Self {
        Self {
            model:               ModelLetter::B,
            expansion_factor:    1,
            scatterer_speed_m_s: DEFAULT_SCATTERER_SPEED_M_S,
            sampling_interval:   None,
            worker_threads:      0,
            base_channel:        ChannelNumber(0),
            channels:            vec![ChannelSpec::new(5.18e9, 20e6)],
            subcarrier_count:    64,
            run_seed:            1,
            instance_name:       "tgn".to_string(),
        }
    }
}

impl TgnConfig {
    /// Check every field the constructor depends on.
    pub fn validate(&self) -> ChannelResult<()> {
        let Some(first) = self.channels.first() else {
            return Err(ChannelError::Config("at least one channel is required".into()));
        };
        for (i, channel) in self.channels.iter().enumerate() {
            if !(channel.carrier_hz.is_finite() && channel.carrier_hz > 0.0) {
                return Err(ChannelError::Config(format!(
                    "channel {i}: carrier frequency must be positive, got {}",
                    channel.carrier_hz
                )));
            }
            if !(channel.bandwidth_hz.is_finite() && channel.bandwidth_hz > 0.0) {
                return Err(ChannelError::Config(format!(
                    "channel {i}: bandwidth must be positive, got {}",
                    channel.bandwidth_hz
                )));
            }
            if channel.bandwidth_hz != first.bandwidth_hz {
                return Err(ChannelError::Config(format!(
                    "channel bandwidths must be the same: channel {i} has {} Hz, channel 0 has {} Hz",
                    channel.bandwidth_hz, first.bandwidth_hz
                )));
            }
        }
        if self.subcarrier_count == 0 {
            return Err(ChannelError::Config("subcarrier count must be at least 1".into()));
        }
        if self.expansion_factor == 0 {
            return Err(ChannelError::Config("expansion factor must be at least 1".into()));
        }
        if !(self.scatterer_speed_m_s.is_finite() && self.scatterer_speed_m_s > 0.0) {
            return Err(ChannelError::Config(format!(
                "scatterer speed must be positive, got {}",
                self.scatterer_speed_m_s
            )));
        }
        if let Some(interval) = self.sampling_interval {
            if interval <= SimTime::ZERO {
                return Err(ChannelError::Config(format!(
                    "sampling interval must be positive, got {interval}"
                )));
            }
        }
        let last = self.base_channel.0 as u64 + self.channels.len() as u64 - 1;
        if last > u32::MAX as u64 {
            return Err(ChannelError::Config("channel numbers overflow u32".into()));
        }
        Ok(())
    }
}

// ── ModelTiming ───────────────────────────────────────────────────────────────

/// Time constants shared by every link of one model instance.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ModelTiming {
    /// Maximum Doppler shift caused by scatterer motion.
    pub doppler_cutoff_hz: f64,
    /// Spacing of Bell filter output samples.
    pub fading_interval:   SimTime,
    /// Spacing at which link matrices are refreshed.
    pub sampling_interval: SimTime,
    /// Delay between consecutive taps.
    pub tap_delay_secs:    f64,
}

impl ModelTiming {
    /// Derive timing from a validated configuration.
    pub fn derive(config: &TgnConfig, tap_delay_secs: f64) -> ChannelResult<Self> {
        let carrier_hz = config
            .channels
            .first()
            .map(|c| c.carrier_hz)
            .ok_or_else(|| ChannelError::Config("at least one channel is required".into()))?;

        let wavelength_m = SPEED_OF_LIGHT_M_S / carrier_hz;
        let doppler_cutoff_hz = config.scatterer_speed_m_s / wavelength_m;

        let fading_interval = SimTime::from_secs_f64(NORMALIZED_DOPPLER_SPREAD / doppler_cutoff_hz);
        if fading_interval <= SimTime::ZERO {
            return Err(ChannelError::Config(format!(
                "Doppler cutoff {doppler_cutoff_hz} Hz is too high: fading interval rounds to zero"
            )));
        }

        Ok(Self {
            doppler_cutoff_hz,
            fading_interval,
            sampling_interval: config.sampling_interval.unwrap_or(fading_interval),
            tap_delay_secs,
        })
    }
}
