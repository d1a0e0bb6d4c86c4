//! Unit tests for tgn-channel.

use std::io::Cursor;
use std::sync::Arc;

use tgn_core::{ChannelNumber, NodeId, Position, SectorId, SimTime, hash_seed_all};
use tgn_mobility::{LinearMobility, SharedMobility, StationaryMobility};
use tgn_model::{ComplexMatrix, ModelLetter};

use crate::{
    AntennaArrayConfig, ChannelError, ChannelSpec, LinkEnd, LinkKey, ModelInterface, TgnConfig,
    TgnMimoChannelModel,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

const CH0: ChannelNumber = ChannelNumber(0);

fn config(model: ModelLetter) -> TgnConfig {
    TgnConfig {
        model,
        sampling_interval: Some(SimTime::MILLISECOND),
        ..TgnConfig::default()
    }
}

fn at(x: f64) -> SharedMobility {
    Arc::new(StationaryMobility::new(Position::new(x, 0.0, 0.0)))
}

fn register(model: &mut TgnMimoChannelModel, node: u32, antennas: usize, x: f64) -> ModelInterface {
    model
        .create_interface_for(NodeId(node), SectorId::PRIMARY, AntennaArrayConfig::new(antennas, 0.5), at(x))
        .unwrap()
}

/// Model with node 0 (2 antennas) at the origin and node 1 (2 antennas) at `distance`.
fn two_nodes(cfg: TgnConfig, distance: f64) -> (TgnMimoChannelModel, ModelInterface, ModelInterface) {
    let mut model = TgnMimoChannelModel::new(cfg).unwrap();
    let a = register(&mut model, 0, 2, 0.0);
    let b = register(&mut model, 1, 2, distance);
    (model, a, b)
}

fn ms(n: i64) -> SimTime {
    SimTime::from_millis(n)
}

// ── Configuration ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod configuration {
    use super::*;
    use crate::{ModelTiming, SPEED_OF_LIGHT_M_S};

    fn rejects(cfg: TgnConfig) {
        assert!(
            matches!(TgnMimoChannelModel::new(cfg), Err(ChannelError::Config(_))),
            "expected a configuration error"
        );
    }

    #[test]
    fn default_config_is_valid() {
        TgnConfig::default().validate().unwrap();
    }

    #[test]
    fn invalid_fields_are_rejected() {
        rejects(TgnConfig { channels: vec![], ..TgnConfig::default() });
        rejects(TgnConfig { subcarrier_count: 0, ..TgnConfig::default() });
        rejects(TgnConfig { expansion_factor: 0, ..TgnConfig::default() });
        rejects(TgnConfig { scatterer_speed_m_s: 0.0, ..TgnConfig::default() });
        rejects(TgnConfig { sampling_interval: Some(SimTime::ZERO), ..TgnConfig::default() });
        rejects(TgnConfig { channels: vec![ChannelSpec::new(-1.0, 20e6)], ..TgnConfig::default() });
        rejects(TgnConfig { channels: vec![ChannelSpec::new(5.18e9, 0.0)], ..TgnConfig::default() });
    }

    #[test]
    fn bandwidths_must_match() {
        rejects(TgnConfig {
            channels: vec![ChannelSpec::new(5.18e9, 20e6), ChannelSpec::new(5.2e9, 40e6)],
            ..TgnConfig::default()
        });
    }

    #[test]
    fn timing_follows_first_carrier() {
        let cfg = TgnConfig {
            channels: vec![ChannelSpec::new(5.18e9, 20e6), ChannelSpec::new(5.8e9, 20e6)],
            ..TgnConfig::default()
        };
        let timing = ModelTiming::derive(&cfg, 1e-8).unwrap();
        let cutoff = 5.18e9 / (3.0 * SPEED_OF_LIGHT_M_S);
        assert!((timing.doppler_cutoff_hz - cutoff).abs() < 1e-9);

        let expected = SimTime::from_secs_f64(1.0 / 300.0 / timing.doppler_cutoff_hz);
        assert_eq!(timing.fading_interval, expected);
        // Unset sampling interval falls back to the fading interval.
        assert_eq!(timing.sampling_interval, timing.fading_interval);
    }

    #[test]
    fn explicit_sampling_interval_is_kept() {
        let timing = ModelTiming::derive(&config(ModelLetter::B), 1e-8).unwrap();
        assert_eq!(timing.sampling_interval, SimTime::MILLISECOND);
    }

    #[test]
    fn expansion_shrinks_tap_delay() {
        let model = TgnMimoChannelModel::new(TgnConfig { expansion_factor: 2, ..TgnConfig::default() }).unwrap();
        assert!((model.timing().tap_delay_secs - 5e-9).abs() < 1e-18);
    }

    #[test]
    fn antenna_layout_is_checked() {
        assert!(AntennaArrayConfig::new(0, 0.5).to_array().is_err());
        assert!(AntennaArrayConfig::new(2, 0.0).to_array().is_err());
        assert!(AntennaArrayConfig::new(2, f64::NAN).to_array().is_err());
        assert_eq!(AntennaArrayConfig::new(3, 0.5).to_array().unwrap().antenna_count, 3);
    }
}

// ── Registration and lookups ──────────────────────────────────────────────────

#[cfg(test)]
mod registration {
    use super::*;

    #[test]
    fn antenna_counts_are_reported() {
        let mut model = TgnMimoChannelModel::new(config(ModelLetter::B)).unwrap();
        let a = register(&mut model, 0, 2, 0.0);
        register(&mut model, 1, 3, 10.0);

        let view = model.view(&a).unwrap();
        assert_eq!(view.number_of_antennas(), 2);
        assert_eq!(view.number_of_antennas_for(NodeId(1)).unwrap(), 3);
        assert!(matches!(view.number_of_antennas_for(NodeId(9)), Err(ChannelError::UnknownNode(NodeId(9)))));
    }

    #[test]
    fn second_sector_must_share_layout() {
        let mut model = TgnMimoChannelModel::new(config(ModelLetter::B)).unwrap();
        register(&mut model, 0, 2, 0.0);

        let same = model.create_interface_for(NodeId(0), SectorId(1), AntennaArrayConfig::new(2, 0.5), at(0.0));
        assert_eq!(same.unwrap().sector(), SectorId(1));

        let other = model.create_interface_for(NodeId(0), SectorId(2), AntennaArrayConfig::new(4, 0.5), at(0.0));
        assert!(matches!(other, Err(ChannelError::Config(_))));
    }

    #[test]
    fn unknown_channel_node_and_subcarrier() {
        let cfg = TgnConfig {
            base_channel: ChannelNumber(36),
            channels: vec![ChannelSpec::new(5.18e9, 20e6), ChannelSpec::new(5.2e9, 20e6)],
            ..config(ModelLetter::B)
        };
        let (mut model, a, b) = two_nodes(cfg, 10.0);
        let mut view = model.view(&b).unwrap();

        assert!(view.channel_matrix(SimTime::ZERO, ChannelNumber(36), a.end(), 0).is_ok());
        assert!(view.channel_matrix(SimTime::ZERO, ChannelNumber(37), a.end(), 63).is_ok());
        for bad in [ChannelNumber(35), ChannelNumber(38), ChannelNumber(0)] {
            assert!(matches!(
                view.channel_matrix(SimTime::ZERO, bad, a.end(), 0),
                Err(ChannelError::UnknownChannel { .. })
            ));
        }
        assert!(matches!(
            view.channel_matrix(SimTime::ZERO, ChannelNumber(36), a.end(), 64),
            Err(ChannelError::SubcarrierOutOfRange { index: 64, count: 64 })
        ));
        assert!(matches!(
            view.channel_matrix(SimTime::ZERO, ChannelNumber(36), NodeId(5), 0),
            Err(ChannelError::UnknownNode(NodeId(5)))
        ));
    }

    #[test]
    fn unknown_sector_of_known_node_is_rejected() {
        let mut cfg = config(ModelLetter::B);
        cfg.worker_threads = 2;
        let (mut model, a, b) = two_nodes(cfg, 10.0);
        let ghost = LinkEnd::new(a.node(), SectorId(7));
        let is_ghost = |e: &ChannelError| {
            matches!(e, ChannelError::UnknownSector { node: NodeId(0), sector: SectorId(7) })
        };

        assert!(is_ghost(&model.channel_matrix(SimTime::ZERO, CH0, ghost, b.end(), 0).unwrap_err()));
        assert!(is_ghost(&model.channel_matrix(SimTime::ZERO, CH0, b.end(), ghost, 0).unwrap_err()));
        assert!(is_ghost(&model.initialize_link_if_not_yet_inited(SimTime::ZERO, CH0, ghost, b.end()).unwrap_err()));
        assert!(is_ghost(&model.notify_of_imminent_link_use(CH0, ghost, b.end(), SimTime::ZERO).unwrap_err()));
        assert!(model.view(&b).unwrap().channel_matrix(SimTime::ZERO, CH0, ghost, 0).is_err());

        assert_eq!(model.link_count(CH0).unwrap(), 0);
        assert_eq!(model.pending_precompute_jobs(), 0);
    }

    #[test]
    fn view_of_unregistered_node_fails() {
        let mut model = TgnMimoChannelModel::new(config(ModelLetter::B)).unwrap();
        register(&mut model, 0, 1, 0.0);
        let stranger = {
            let mut other = TgnMimoChannelModel::new(config(ModelLetter::B)).unwrap();
            register(&mut other, 4, 1, 0.0)
        };
        assert!(matches!(model.view(&stranger), Err(ChannelError::UnknownNode(NodeId(4)))));
    }

    #[test]
    fn self_link_is_zero() {
        let (mut model, a, _) = two_nodes(config(ModelLetter::B), 10.0);
        let h = model.view(&a).unwrap().channel_matrix(ms(3), CH0, a.end(), 0).unwrap();
        assert_eq!(h, ComplexMatrix::zeros(2, 2));
        assert_eq!(model.link_count(CH0).unwrap(), 0);
    }
}

// ── Link keys ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod keys {
    use super::*;

    #[test]
    fn key_is_canonical() {
        let a = LinkEnd::from(NodeId(3));
        let b = LinkEnd::from((NodeId(1), SectorId(2)));

        let (forward, reversed) = LinkKey::new(b, a);
        assert!(!reversed);
        let (backward, reversed) = LinkKey::new(a, b);
        assert!(reversed);
        assert_eq!(forward, backward);
        assert_eq!(forward.low, b);
    }

    #[test]
    fn sector_breaks_ties() {
        let (key, reversed) = LinkKey::new(
            LinkEnd::new(NodeId(1), SectorId(1)),
            LinkEnd::new(NodeId(1), SectorId(0)),
        );
        assert!(reversed);
        assert_eq!(key.low.sector, SectorId(0));
    }

    #[test]
    fn seed_depends_on_every_component() {
        let base = LinkKey::new(NodeId(0).into(), NodeId(1).into()).0;
        let other_sector = LinkKey::new(NodeId(0).into(), (NodeId(1), SectorId(1)).into()).0;
        let other_node = LinkKey::new(NodeId(0).into(), NodeId(2).into()).0;

        assert_eq!(base.seed(7), hash_seed_all(7, &[0, 0, 1, 0]));
        assert_eq!(other_sector.seed(7), hash_seed_all(7, &[0, 0, 1, 1]));
        assert_ne!(base.seed(7), base.seed(8));
        assert_ne!(base.seed(7), other_sector.seed(7));
        assert_ne!(base.seed(7), other_node.seed(7));
        assert_eq!(base.seed(7), base.seed(7));
    }
}

// ── Sectors ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod sectors {
    use super::*;

    /// Node 0 at the origin as sectors 0 and 1, node 1 (sector 0) at 10 m.
    fn sectored() -> (TgnMimoChannelModel, ModelInterface, ModelInterface, ModelInterface) {
        let mut model = TgnMimoChannelModel::new(config(ModelLetter::B)).unwrap();
        let s0 = register(&mut model, 0, 2, 0.0);
        let s1 = model
            .create_interface_for(NodeId(0), SectorId(1), AntennaArrayConfig::new(2, 0.5), at(0.0))
            .unwrap();
        let b = register(&mut model, 1, 2, 10.0);
        (model, s0, s1, b)
    }

    #[test]
    fn each_sector_has_its_own_link() {
        let (mut model, s0, s1, b) = sectored();
        let mut view = model.view(&b).unwrap();
        let via_s0 = view.channel_matrix(ms(1), CH0, s0.end(), 5).unwrap();
        let via_s1 = view.channel_matrix(ms(1), CH0, s1.end(), 5).unwrap();

        assert_ne!(via_s0, via_s1);
        assert_eq!(model.link_count(CH0).unwrap(), 2);
        assert!(model.link_state(CH0, s0.end(), b.end()).unwrap().is_some());
        assert!(model.link_state(CH0, s1.end(), b.end()).unwrap().is_some());
    }

    #[test]
    fn sector_link_is_reciprocal() {
        let (mut model, _, s1, b) = sectored();
        let down = model.view(&b).unwrap().channel_matrix(ms(2), CH0, s1.end(), 9).unwrap();
        let up = model.view(&s1).unwrap().channel_matrix(ms(2), CH0, b.end(), 9).unwrap();
        assert_eq!(up, down.transpose());
        assert_eq!(model.link_count(CH0).unwrap(), 1);
    }

    #[test]
    fn keys_order_node_then_sector() {
        let (_, s0, s1, b) = sectored();
        let (k0, reversed) = LinkKey::new(b.end(), s1.end());
        assert!(reversed);
        assert_eq!((k0.low, k0.high), (s1.end(), b.end()));

        let (k1, _) = LinkKey::new(s0.end(), b.end());
        assert!(k1 < k0);
        assert!(s0.end() < s1.end());
        assert!(s1.end() < b.end());
    }

    #[test]
    fn unregistered_sector_is_rejected() {
        let (mut model, _, _, b) = sectored();
        let s2 = LinkEnd::new(NodeId(0), SectorId(2));
        assert!(matches!(
            model.channel_matrix(SimTime::ZERO, CH0, s2, b.end(), 0),
            Err(ChannelError::UnknownSector { node: NodeId(0), sector: SectorId(2) })
        ));
        assert_eq!(model.link_count(CH0).unwrap(), 0);
    }
}

// ── Matrices ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod matrices {
    use super::*;

    #[test]
    fn shape_follows_the_query_direction() {
        let mut model = TgnMimoChannelModel::new(config(ModelLetter::D)).unwrap();
        let a = register(&mut model, 0, 2, 0.0);
        let b = register(&mut model, 1, 3, 20.0);

        let at_b = model.view(&b).unwrap().channel_matrix(SimTime::ZERO, CH0, a.end(), 5).unwrap();
        assert_eq!((at_b.rows(), at_b.cols()), (3, 2));

        let at_a = model.view(&a).unwrap().channel_matrix(SimTime::ZERO, CH0, b.end(), 5).unwrap();
        assert_eq!((at_a.rows(), at_a.cols()), (2, 3));
        assert_eq!(at_a, at_b.transpose());
    }

    #[test]
    fn same_seed_same_matrices() {
        let (mut m1, a1, b1) = two_nodes(config(ModelLetter::C), 30.0);
        let (mut m2, a2, b2) = two_nodes(config(ModelLetter::C), 30.0);

        for t in [0, 1, 2, 7, 40, 41, 500] {
            let h1 = m1.view(&b1).unwrap().channel_matrix(ms(t), CH0, a1.end(), 17).unwrap();
            let h2 = m2.view(&b2).unwrap().channel_matrix(ms(t), CH0, a2.end(), 17).unwrap();
            assert_eq!(h1, h2, "diverged at {t} ms");
        }
    }

    #[test]
    fn run_seed_changes_matrices() {
        let (mut m1, a1, b1) = two_nodes(config(ModelLetter::C), 30.0);
        let (mut m2, a2, b2) = two_nodes(TgnConfig { run_seed: 2, ..config(ModelLetter::C) }, 30.0);

        let h1 = m1.view(&b1).unwrap().channel_matrix(SimTime::ZERO, CH0, a1.end(), 0).unwrap();
        let h2 = m2.view(&b2).unwrap().channel_matrix(SimTime::ZERO, CH0, a2.end(), 0).unwrap();
        assert!(h1.max_abs_diff(&h2) > 1e-6);
    }

    #[test]
    fn channels_fade_independently() {
        let cfg = TgnConfig {
            channels: vec![ChannelSpec::new(5.18e9, 20e6), ChannelSpec::new(5.2e9, 20e6)],
            ..config(ModelLetter::B)
        };
        let (mut model, a, b) = two_nodes(cfg, 30.0);
        let mut view = model.view(&b).unwrap();
        let h0 = view.channel_matrix(SimTime::ZERO, ChannelNumber(0), a.end(), 0).unwrap();
        let h1 = view.channel_matrix(SimTime::ZERO, ChannelNumber(1), a.end(), 0).unwrap();
        assert!(h0.max_abs_diff(&h1) > 1e-6);
        assert_eq!(model.link_count(ChannelNumber(0)).unwrap(), 1);
        assert_eq!(model.link_count(ChannelNumber(1)).unwrap(), 1);
    }

    #[test]
    fn reverse_query_returns_transpose() {
        let (mut model, a, b) = two_nodes(config(ModelLetter::E), 40.0);
        for t in [0, 3, 9] {
            let forward = model.view(&b).unwrap().channel_matrix(ms(t), CH0, a.end(), 11).unwrap();
            let reverse = model.view(&a).unwrap().channel_matrix(ms(t), CH0, b.end(), 11).unwrap();
            assert_eq!(reverse, forward.transpose());
        }
        assert_eq!(model.link_count(CH0).unwrap(), 1);
    }

    #[test]
    fn subcarriers_differ_across_the_band() {
        let (mut model, a, b) = two_nodes(config(ModelLetter::B), 10.0);
        let mut view = model.view(&b).unwrap();
        let first = view.channel_matrix(SimTime::ZERO, CH0, a.end(), 0).unwrap();
        let last = view.channel_matrix(SimTime::ZERO, CH0, a.end(), 63).unwrap();

        assert!(first.power() > 0.0);
        assert!(last.power() > 0.0);
        assert!(first.max_abs_diff(&last) > 1e-6);
    }

    #[test]
    fn matrix_holds_between_samples() {
        let (mut model, a, b) = two_nodes(config(ModelLetter::B), 10.0);
        let mut view = model.view(&b).unwrap();
        let h0 = view.channel_matrix(SimTime::ZERO, CH0, a.end(), 0).unwrap();
        let held = view.channel_matrix(SimTime::from_micros(999), CH0, a.end(), 0).unwrap();
        let moved = view.channel_matrix(SimTime::MILLISECOND, CH0, a.end(), 0).unwrap();

        assert_eq!(h0, held);
        assert_ne!(h0, moved);
    }

    #[test]
    fn fading_is_continuous() {
        let (mut model, a, b) = two_nodes(config(ModelLetter::B), 30.0);
        let mut view = model.view(&b).unwrap();
        let h0 = view.channel_matrix(SimTime::ZERO, CH0, a.end(), 0).unwrap();
        let h1 = view.channel_matrix(SimTime::MILLISECOND, CH0, a.end(), 0).unwrap();
        // 1 ms is a small fraction of the ~170 ms coherence time.
        assert!(h0.max_abs_diff(&h1) < 0.25);
    }

    #[test]
    fn link_state_bookkeeping() {
        let (mut model, a, b) = two_nodes(config(ModelLetter::B), 10.0);
        model.view(&b).unwrap().channel_matrix(ms(4), CH0, a.end(), 0).unwrap();
        model.view(&b).unwrap().channel_matrix(SimTime::from_micros(6_500), CH0, a.end(), 0).unwrap();

        let state = model.link_state(CH0, a.end(), b.end()).unwrap().unwrap();
        assert_eq!(state.start_time(), ms(4));
        assert_eq!(state.last_update(), SimTime::from_micros(6_500));
        assert_eq!(state.next_sample_time(), ms(7));
        assert_eq!(state.antenna_counts(), (2, 2));
        assert_eq!(state.matrices().len(), 64);
    }

    #[test]
    fn rayleigh_power_across_links() {
        // Model B beyond its 5 m breakpoint: pure NLOS.  The fading noise
        // carries power 1/2 + 1 per antenna pair.
        let mut model = TgnMimoChannelModel::new(config(ModelLetter::B)).unwrap();
        let hub = register(&mut model, 0, 1, 0.0);
        let links = 500u32;
        for node in 1..=links {
            register(&mut model, node, 1, 100.0);
        }

        let mut view = model.view(&hub).unwrap();
        let mut total = 0.0;
        for node in 1..=links {
            for subcarrier in [0, 32, 63] {
                let h = view.channel_matrix(SimTime::ZERO, CH0, NodeId(node), subcarrier).unwrap();
                total += h.power();
            }
        }
        let mean = total / (3 * links) as f64;
        assert!((1.2..1.8).contains(&mean), "mean power {mean}");
    }

    #[test]
    #[should_panic(expected = "backwards in time")]
    fn querying_the_past_panics() {
        let (mut model, a, b) = two_nodes(config(ModelLetter::B), 10.0);
        let mut view = model.view(&b).unwrap();
        view.channel_matrix(ms(5), CH0, a.end(), 0).unwrap();
        view.channel_matrix(ms(2), CH0, a.end(), 0).unwrap();
    }
}

// ── Time-range queries ────────────────────────────────────────────────────────

#[cfg(test)]
mod time_range {
    use super::*;

    #[test]
    fn reuses_matrix_inside_window() {
        let (mut model, a, b) = two_nodes(config(ModelLetter::B), 10.0);
        let mut view = model.view(&b).unwrap();
        let h0 = view.channel_matrix(SimTime::ZERO, CH0, a.end(), 0).unwrap();

        // Next sample is at 1 ms; a window starting before it keeps the old matrix.
        let reused = view
            .channel_matrix_in_time_range(SimTime::from_micros(500), ms(3), CH0, a.end(), 0)
            .unwrap();
        assert_eq!(h0, reused);
        assert_eq!(model.link_state(CH0, a.end(), b.end()).unwrap().unwrap().last_update(), SimTime::ZERO);
    }

    #[test]
    fn advances_to_earliest_only() {
        let (mut model, a, b) = two_nodes(config(ModelLetter::B), 10.0);
        model.view(&b).unwrap().channel_matrix(SimTime::ZERO, CH0, a.end(), 0).unwrap();
        model
            .view(&b)
            .unwrap()
            .channel_matrix_in_time_range(SimTime::from_micros(1_500), ms(3), CH0, a.end(), 0)
            .unwrap();

        let state = model.link_state(CH0, a.end(), b.end()).unwrap().unwrap();
        assert_eq!(state.last_update(), SimTime::from_micros(1_500));
        assert_eq!(state.next_sample_time(), ms(2));
    }

    #[test]
    fn matches_point_query_at_earliest() {
        let (mut m1, a1, b1) = two_nodes(config(ModelLetter::D), 3.0);
        let (mut m2, a2, b2) = two_nodes(config(ModelLetter::D), 3.0);

        let ranged = m1
            .view(&b1)
            .unwrap()
            .channel_matrix_in_time_range(ms(2), ms(4), CH0, a1.end(), 9)
            .unwrap();
        let point = m2.view(&b2).unwrap().channel_matrix(ms(2), CH0, a2.end(), 9).unwrap();
        assert_eq!(ranged, point);
    }

    #[test]
    #[should_panic(expected = "time range is inverted")]
    fn inverted_window_panics() {
        let (mut model, a, b) = two_nodes(config(ModelLetter::B), 10.0);
        let _ = model
            .view(&b)
            .unwrap()
            .channel_matrix_in_time_range(ms(4), ms(3), CH0, a.end(), 0);
    }
}

// ── Line of sight ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod line_of_sight {
    use super::*;

    fn los_at(distance: f64) -> bool {
        let (mut model, a, b) = two_nodes(config(ModelLetter::B), distance);
        model.view(&b).unwrap().channel_matrix(SimTime::ZERO, CH0, a.end(), 0).unwrap();
        model.link_state(CH0, a.end(), b.end()).unwrap().unwrap().los_active()
    }

    #[test]
    fn breakpoint_is_exclusive() {
        assert!(los_at(4.9));
        assert!(!los_at(5.0));
        assert!(!los_at(50.0));
    }

    #[test]
    fn stays_nlos_at_breakpoint() {
        let (mut model, a, b) = two_nodes(config(ModelLetter::B), 5.0);
        for t in 0..20 {
            model.view(&b).unwrap().channel_matrix(ms(t * 3), CH0, a.end(), 0).unwrap();
            assert!(!model.link_state(CH0, a.end(), b.end()).unwrap().unwrap().los_active());
        }
    }

    #[test]
    fn moving_node_leaves_los() {
        let mut model = TgnMimoChannelModel::new(config(ModelLetter::B)).unwrap();
        let a = register(&mut model, 0, 1, 0.0);
        let walker = LinearMobility::new(
            Position::new(1.0, 0.0, 0.0),
            Position::new(41.0, 0.0, 0.0),
            SimTime::ZERO,
            SimTime::from_millis(10_000),
        )
        .unwrap();
        let b = model
            .create_interface_for(NodeId(1), SectorId::PRIMARY, AntennaArrayConfig::new(1, 0.5), Arc::new(walker))
            .unwrap();

        model.view(&b).unwrap().channel_matrix(SimTime::ZERO, CH0, a.end(), 0).unwrap();
        assert!(model.link_state(CH0, a.end(), b.end()).unwrap().unwrap().los_active());

        model.view(&b).unwrap().channel_matrix(ms(5_000), CH0, a.end(), 0).unwrap();
        assert!(!model.link_state(CH0, a.end(), b.end()).unwrap().unwrap().los_active());
    }
}

// ── Precompute ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod precompute {
    use super::*;

    fn star(worker_threads: usize, leaves: u32) -> (TgnMimoChannelModel, ModelInterface) {
        let mut model =
            TgnMimoChannelModel::new(TgnConfig { worker_threads, ..config(ModelLetter::C) }).unwrap();
        let hub = register(&mut model, 0, 2, 0.0);
        for node in 1..=leaves {
            register(&mut model, node, 2, 3.0 * node as f64);
        }
        (model, hub)
    }

    #[test]
    fn disabled_without_threads() {
        let (mut model, hub) = star(0, 2);
        assert!(!model.precompute_enabled());
        model.notify_of_imminent_link_use(CH0, hub.end(), NodeId(1), SimTime::ZERO).unwrap();
        assert_eq!(model.pending_precompute_jobs(), 0);
        assert_eq!(model.link_count(CH0).unwrap(), 0);
        assert_eq!(model.precompute_counter(), None);
        // Nothing queued: a round is a no-op.
        model.do_the_parallel_precalculation();
        assert!(model.link_state(CH0, hub.end(), NodeId(1).into()).unwrap().is_none());

        // Endpoints are still validated.
        assert!(matches!(
            model.notify_of_imminent_link_use(CH0, hub.end(), NodeId(9), SimTime::ZERO),
            Err(ChannelError::UnknownNode(NodeId(9)))
        ));
    }

    #[test]
    fn round_drains_every_job() {
        let (mut model, hub) = star(4, 6);
        for node in 1..=6 {
            model.notify_of_imminent_link_use(CH0, hub.end(), NodeId(node), ms(2)).unwrap();
        }
        assert_eq!(model.pending_precompute_jobs(), 6);
        assert_eq!(model.link_count(CH0).unwrap(), 6);
        assert!(model.link_state(CH0, hub.end(), NodeId(1).into()).unwrap().is_none());

        model.do_the_parallel_precalculation();

        assert_eq!(model.pending_precompute_jobs(), 0);
        assert!(model.precompute_counter().unwrap() < 0);
        for node in 1..=6 {
            let state = model.link_state(CH0, hub.end(), NodeId(node).into()).unwrap().unwrap();
            assert_eq!(state.start_time(), ms(2));
            assert_eq!(state.last_update(), ms(2));
        }
    }

    #[test]
    fn empty_round_is_a_no_op() {
        let (mut model, _) = star(2, 1);
        model.do_the_parallel_precalculation();
        assert_eq!(model.precompute_counter(), Some(0));
        assert_eq!(model.link_count(CH0).unwrap(), 0);
    }

    #[test]
    fn matches_sequential_queries() {
        let (mut parallel, hub_p) = star(3, 5);
        let (mut sequential, hub_s) = star(0, 5);

        for round in 0..4 {
            let t = ms(round * 7);
            for node in 1..=5 {
                parallel.notify_of_imminent_link_use(CH0, NodeId(node), hub_p.end(), t).unwrap();
                sequential
                    .initialize_link_if_not_yet_inited(t, CH0, NodeId(node).into(), hub_s.end())
                    .unwrap();
            }
            parallel.do_the_parallel_precalculation();

            for node in 1..=5 {
                for subcarrier in [0, 40] {
                    let hp = parallel.view(&hub_p).unwrap().channel_matrix(t, CH0, NodeId(node), subcarrier).unwrap();
                    let hs =
                        sequential.view(&hub_s).unwrap().channel_matrix(t, CH0, NodeId(node), subcarrier).unwrap();
                    assert_eq!(hp, hs, "node {node} diverged in round {round}");
                }
            }
        }
    }

    #[test]
    fn direct_query_before_round_is_respected() {
        let (mut model, hub) = star(2, 2);
        model.notify_of_imminent_link_use(CH0, hub.end(), NodeId(1), ms(3)).unwrap();
        // Touch the reserved link before the round runs.
        let early = model.view(&hub).unwrap().channel_matrix(ms(1), CH0, NodeId(1), 0).unwrap();
        model.do_the_parallel_precalculation();

        let state = model.link_state(CH0, hub.end(), NodeId(1).into()).unwrap().unwrap();
        assert_eq!(state.start_time(), ms(1));
        assert_eq!(state.last_update(), ms(3));
        let later = model.view(&hub).unwrap().channel_matrix(ms(3), CH0, NodeId(1), 0).unwrap();
        assert_ne!(early, later);
    }

    #[test]
    fn self_link_is_ignored() {
        let (mut model, hub) = star(2, 1);
        model.notify_of_imminent_link_use(CH0, hub.end(), hub.end(), ms(1)).unwrap();
        assert_eq!(model.pending_precompute_jobs(), 0);
    }

    #[test]
    #[should_panic(expected = "queued twice")]
    fn duplicate_job_panics() {
        let (mut model, hub) = star(2, 1);
        model.notify_of_imminent_link_use(CH0, hub.end(), NodeId(1), ms(1)).unwrap();
        model.notify_of_imminent_link_use(CH0, NodeId(1), hub.end(), ms(1)).unwrap();
    }

    #[test]
    fn same_link_on_two_channels() {
        let cfg = TgnConfig {
            worker_threads: 2,
            channels: vec![ChannelSpec::new(5.18e9, 20e6), ChannelSpec::new(5.2e9, 20e6)],
            ..config(ModelLetter::B)
        };
        let (mut model, a, b) = two_nodes(cfg, 8.0);
        model.notify_of_imminent_link_use(ChannelNumber(0), a.end(), b.end(), ms(1)).unwrap();
        model.notify_of_imminent_link_use(ChannelNumber(1), a.end(), b.end(), ms(1)).unwrap();
        model.do_the_parallel_precalculation();

        for channel in [ChannelNumber(0), ChannelNumber(1)] {
            assert!(model.link_state(channel, a.end(), b.end()).unwrap().is_some());
        }
    }
}

// ── CSV loader ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod loader {
    use super::*;
    use crate::load_antenna_configs_reader;

    #[test]
    fn loads_rows_in_order() {
        let csv = "node_id,antenna_count,antenna_spacing_wavelengths\n3,2,0.5\n0,4,1.0\n";
        let configs = load_antenna_configs_reader(Cursor::new(csv)).unwrap();
        assert_eq!(
            configs,
            vec![
                (NodeId(3), AntennaArrayConfig::new(2, 0.5)),
                (NodeId(0), AntennaArrayConfig::new(4, 1.0)),
            ]
        );
    }

    #[test]
    fn duplicate_node_is_rejected() {
        let csv = "node_id,antenna_count,antenna_spacing_wavelengths\n1,2,0.5\n1,2,0.5\n";
        assert!(matches!(load_antenna_configs_reader(Cursor::new(csv)), Err(ChannelError::Parse(_))));
    }

    #[test]
    fn invalid_layout_is_rejected() {
        let csv = "node_id,antenna_count,antenna_spacing_wavelengths\n1,0,0.5\n";
        assert!(matches!(load_antenna_configs_reader(Cursor::new(csv)), Err(ChannelError::Parse(_))));
    }

    #[test]
    fn malformed_row_is_rejected() {
        let csv = "node_id,antenna_count,antenna_spacing_wavelengths\nx,2,0.5\n";
        assert!(matches!(load_antenna_configs_reader(Cursor::new(csv)), Err(ChannelError::Parse(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = crate::load_antenna_configs_csv(std::path::Path::new("/nonexistent/antennas.csv"));
        assert!(matches!(result, Err(ChannelError::Io(_))));
    }
}
