//! The channel model facade.

use tgn_core::{ChannelNumber, NodeId, SectorId, SimTime, hash_name, hash_seed};
use tgn_mobility::SharedMobility;
use tgn_model::{ChannelProfile, ComplexMatrix, SubcarrierLayout, UniformLinearArray};
use tracing::{debug, info};

use crate::table::{ChannelData, FastMap, FastSet};
use crate::{
    AntennaArrayConfig, ChannelError, ChannelResult, LinkContext, LinkEnd, LinkKey, LinkSlot, LinkState,
    ModelTiming, PrecomputeJob, PrecomputeScheduler, TgnConfig,
};

/// Salt folded into every channel seed.
const CHANNEL_SEED_SALT: u64 = 375_620_163;

// ── ModelInterface ────────────────────────────────────────────────────────────

/// Token for one registered node sector.  Obtain a query view with
/// [`TgnMimoChannelModel::view`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ModelInterface {
    node:   NodeId,
    sector: SectorId,
}

impl ModelInterface {
    #[inline]
    pub fn node(&self) -> NodeId {
        self.node
    }

    #[inline]
    pub fn sector(&self) -> SectorId {
        self.sector
    }

    #[inline]
    pub fn end(&self) -> LinkEnd {
        LinkEnd::new(self.node, self.sector)
    }
}

struct NodeEntry {
    array:    UniformLinearArray,
    mobility: SharedMobility,
    sectors:  FastSet<SectorId>,
}

type NodeTable = FastMap<NodeId, NodeEntry>;

// ── TgnMimoChannelModel ───────────────────────────────────────────────────────

/// On-demand TGn MIMO channel model.
///
/// Links are created the first time they are touched and advanced lazily to
/// each query time.  With `worker_threads > 0`, upcoming link uses can be
/// queued with [`notify_of_imminent_link_use`] and advanced together by
/// [`do_the_parallel_precalculation`]; the resulting matrices are identical
/// to the ones the lazy path would produce.
///
/// [`notify_of_imminent_link_use`]: TgnMimoChannelModel::notify_of_imminent_link_use
/// [`do_the_parallel_precalculation`]: TgnMimoChannelModel::do_the_parallel_precalculation
pub struct TgnMimoChannelModel {
    profile:      ChannelProfile,
    timing:       ModelTiming,
    base_channel: ChannelNumber,
    channels:     Vec<ChannelData>,
    nodes:        NodeTable,
    scheduler:    Option<PrecomputeScheduler>,
}

impl TgnMimoChannelModel {
    /// Validate `config` and build the model.
    ///
    /// # Errors
    ///
    /// `Config` for any invalid field, `Model` for an invalid expansion factor.
    pub fn new(config: TgnConfig) -> ChannelResult<Self> {
        config.validate()?;

        let profile = ChannelProfile::new(config.model, config.expansion_factor)?;
        let timing = ModelTiming::derive(&config, profile.tap_delay_increment_secs())?;

        let instance_seed = hash_seed(config.run_seed, hash_name(&config.instance_name));
        let channels: Vec<ChannelData> = config
            .channels
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                let layout = SubcarrierLayout {
                    center_frequency_hz: spec.carrier_hz,
                    bandwidth_hz:        spec.bandwidth_hz,
                    subcarrier_count:    config.subcarrier_count,
                };
                let seed = hash_seed(hash_seed(instance_seed, i as u64), CHANNEL_SEED_SALT);
                ChannelData::new(layout, seed)
            })
            .collect();

        let scheduler = match config.worker_threads {
            0 => None,
            n => Some(PrecomputeScheduler::new(n)?),
        };

        info!(
            model = %config.model,
            taps = profile.tap_count(),
            channels = channels.len(),
            doppler_cutoff_hz = timing.doppler_cutoff_hz,
            fading_interval = %timing.fading_interval,
            sampling_interval = %timing.sampling_interval,
            worker_threads = config.worker_threads,
            "TGn channel model ready"
        );

        Ok(Self {
            profile,
            timing,
            base_channel: config.base_channel,
            channels,
            nodes: NodeTable::default(),
            scheduler,
        })
    }

    // ── Registration ──────────────────────────────────────────────────────

    /// Register `sector` of `node` and return its interface token.
    ///
    /// A node registered again (e.g. another sector of a base station) must
    /// use the same antenna layout; its original mobility model is kept.
    pub fn create_interface_for(
        &mut self,
        node:     NodeId,
        sector:   SectorId,
        antennas: AntennaArrayConfig,
        mobility: SharedMobility,
    ) -> ChannelResult<ModelInterface> {
        let array = antennas.to_array()?;
        let entry = self
            .nodes
            .entry(node)
            .or_insert_with(|| NodeEntry { array, mobility, sectors: FastSet::default() });
        if entry.array != array {
            return Err(ChannelError::Config(format!(
                "{node} re-registered with {} antennas at {}λ (was {} at {}λ)",
                array.antenna_count,
                array.spacing_wavelengths,
                entry.array.antenna_count,
                entry.array.spacing_wavelengths
            )));
        }
        entry.sectors.insert(sector);
        Ok(ModelInterface { node, sector })
    }

    /// Query view fixing `iface` as the receiving side.
    pub fn view(&mut self, iface: &ModelInterface) -> ChannelResult<NodeChannelView<'_>> {
        let antennas = self.endpoint(iface.end())?.array.antenna_count;
        Ok(NodeChannelView { model: self, iface: *iface, antennas })
    }

    pub fn number_of_antennas_for(&self, node: NodeId) -> ChannelResult<usize> {
        Ok(self.node(node)?.array.antenna_count)
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Channel from `from` to `to` at `time` on one subcarrier, as a
    /// `to_antennas × from_antennas` matrix.
    pub fn channel_matrix(
        &mut self,
        time:       SimTime,
        channel:    ChannelNumber,
        from:       LinkEnd,
        to:         LinkEnd,
        subcarrier: usize,
    ) -> ChannelResult<ComplexMatrix> {
        self.channel_matrix_in_time_range(time, time, channel, from, to, subcarrier)
    }

    /// Like [`channel_matrix`](Self::channel_matrix), but any matrix computed
    /// within `[earliest, time]` is acceptable: the link is only advanced
    /// (to `earliest`) if it has crossed a sample boundary by `earliest`.
    ///
    /// # Panics
    ///
    /// Panics if `earliest > time` or the link was already advanced past
    /// `time`.
    pub fn channel_matrix_in_time_range(
        &mut self,
        earliest:   SimTime,
        time:       SimTime,
        channel:    ChannelNumber,
        from:       LinkEnd,
        to:         LinkEnd,
        subcarrier: usize,
    ) -> ChannelResult<ComplexMatrix> {
        assert!(earliest <= time, "time range is inverted: {earliest} > {time}");
        let ch = self.channel_index(channel)?;
        self.endpoint(from)?;
        let to_antennas = self.endpoint(to)?.array.antenna_count;

        let count = self.channels[ch].layout.subcarrier_count;
        if subcarrier >= count {
            return Err(ChannelError::SubcarrierOutOfRange { index: subcarrier, count });
        }
        if from.node == to.node {
            return Ok(ComplexMatrix::zeros(to_antennas, to_antennas));
        }

        let (key, reversed) = LinkKey::new(from, to);
        let Self { profile, timing, channels, nodes, .. } = self;
        let (profile, timing, nodes) = (&*profile, &*timing, &*nodes);
        let channel_data = &mut channels[ch];
        let ctx = LinkContext { profile, timing, layout: channel_data.layout };
        let seed = channel_data.seed;

        let (slot, _) = channel_data.links.slot_for(key);
        let state = channel_data
            .links
            .slot_mut(slot)
            .get_or_initialize(|| initialize_link(nodes, profile, seed, &key, earliest));

        assert!(
            state.last_update() <= time,
            "link {key} queried backwards in time: {time} < {}",
            state.last_update()
        );
        state.advance(earliest, &ctx, || los_applies(nodes, profile, &key, time));

        let matrix = state.matrix(subcarrier);
        Ok(if reversed { matrix.transpose() } else { matrix.clone() })
    }

    /// Create and advance the `from → to` link exactly as a query at `time`
    /// would, discarding the result.  Lets sequential runs touch links in
    /// the same order a precompute round would.
    pub fn initialize_link_if_not_yet_inited(
        &mut self,
        time:    SimTime,
        channel: ChannelNumber,
        from:    LinkEnd,
        to:      LinkEnd,
    ) -> ChannelResult<()> {
        self.channel_matrix(time, channel, from, to, 0).map(|_| ())
    }

    // ── Precompute ────────────────────────────────────────────────────────

    pub fn precompute_enabled(&self) -> bool {
        self.scheduler.is_some()
    }

    /// Queue the `a`–`b` link for the next precompute round, reserving its
    /// table entry now if it is new.  Self-links are ignored, and so is
    /// every call when `worker_threads == 0`: the link is then built on its
    /// first query instead.
    ///
    /// # Errors
    ///
    /// Unknown channel, node or sector.
    ///
    /// # Panics
    ///
    /// Panics if the link is already queued for this round.
    pub fn notify_of_imminent_link_use(
        &mut self,
        channel:     ChannelNumber,
        a:           impl Into<LinkEnd>,
        b:           impl Into<LinkEnd>,
        time_of_use: SimTime,
    ) -> ChannelResult<()> {
        let (a, b) = (a.into(), b.into());
        let ch = self.channel_index(channel)?;
        self.endpoint(a)?;
        self.endpoint(b)?;
        let Some(scheduler) = self.scheduler.as_mut() else {
            return Ok(());
        };
        if a.node == b.node {
            return Ok(());
        }

        let (key, _) = LinkKey::new(a, b);
        let (slot, is_new) = self.channels[ch].links.slot_for(key);
        scheduler.push(PrecomputeJob { channel_index: ch, slot, key, time_of_use, is_new });
        Ok(())
    }

    /// Initialize and advance every queued link, spread over the configured
    /// threads.  No-op when nothing is queued or precompute is disabled.
    pub fn do_the_parallel_precalculation(&mut self) {
        let Self { profile, timing, channels, nodes, scheduler, .. } = self;
        let Some(scheduler) = scheduler.as_mut() else {
            return;
        };
        if scheduler.jobs().is_empty() {
            return;
        }
        let (profile, timing, nodes) = (&*profile, &*timing, &*nodes);

        let channel_params: Vec<(SubcarrierLayout, u64)> =
            channels.iter().map(|c| (c.layout, c.seed)).collect();
        debug!(
            jobs = scheduler.jobs().len(),
            new_links = scheduler.jobs().iter().filter(|j| j.is_new).count(),
            threads = scheduler.worker_threads(),
            "precompute round"
        );

        let slots = claim_slots(channels, scheduler.jobs());
        scheduler.run(slots, |job, slot| {
            let (layout, seed) = channel_params[job.channel_index];
            let ctx = LinkContext { profile, timing, layout };
            let state =
                slot.get_or_initialize(|| initialize_link(nodes, profile, seed, &job.key, job.time_of_use));
            state.advance(job.time_of_use, &ctx, || los_applies(nodes, profile, &job.key, job.time_of_use));
        });
    }

    /// Jobs waiting for the next round.
    pub fn pending_precompute_jobs(&self) -> usize {
        self.scheduler.as_ref().map_or(0, |s| s.jobs().len())
    }

    /// Claim counter of the last round, `None` when precompute is disabled.
    pub fn precompute_counter(&self) -> Option<isize> {
        self.scheduler.as_ref().map(PrecomputeScheduler::remaining)
    }

    // ── Introspection ─────────────────────────────────────────────────────

    pub fn profile(&self) -> &ChannelProfile {
        &self.profile
    }

    pub fn timing(&self) -> &ModelTiming {
        &self.timing
    }

    /// Number of links (including placeholders) on `channel`.
    pub fn link_count(&self, channel: ChannelNumber) -> ChannelResult<usize> {
        Ok(self.channels[self.channel_index(channel)?].links.len())
    }

    /// State of the `a`–`b` link, if it has been initialized.
    pub fn link_state(&self, channel: ChannelNumber, a: LinkEnd, b: LinkEnd) -> ChannelResult<Option<&LinkState>> {
        let ch = self.channel_index(channel)?;
        let (key, _) = LinkKey::new(a, b);
        Ok(self.channels[ch].links.get(&key).and_then(LinkSlot::state))
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    fn channel_index(&self, channel: ChannelNumber) -> ChannelResult<usize> {
        channel
            .0
            .checked_sub(self.base_channel.0)
            .map(|i| i as usize)
            .filter(|&i| i < self.channels.len())
            .ok_or(ChannelError::UnknownChannel {
                channel,
                base:  self.base_channel,
                count: self.channels.len(),
            })
    }

    fn node(&self, node: NodeId) -> ChannelResult<&NodeEntry> {
        self.nodes.get(&node).ok_or(ChannelError::UnknownNode(node))
    }

    /// The node entry behind `end`, provided that sector was registered.
    fn endpoint(&self, end: LinkEnd) -> ChannelResult<&NodeEntry> {
        let entry = self.node(end.node)?;
        if !entry.sectors.contains(&end.sector) {
            return Err(ChannelError::UnknownSector { node: end.node, sector: end.sector });
        }
        Ok(entry)
    }
}

// ── NodeChannelView ───────────────────────────────────────────────────────────

/// Queries from the point of view of one registered node sector.
///
/// Every matrix has this node's antennas as rows and the other node's as
/// columns.
pub struct NodeChannelView<'a> {
    model:    &'a mut TgnMimoChannelModel,
    iface:    ModelInterface,
    antennas: usize,
}

impl NodeChannelView<'_> {
    pub fn interface(&self) -> ModelInterface {
        self.iface
    }

    pub fn number_of_antennas(&self) -> usize {
        self.antennas
    }

    pub fn number_of_antennas_for(&self, other: NodeId) -> ChannelResult<usize> {
        self.model.number_of_antennas_for(other)
    }

    pub fn channel_matrix(
        &mut self,
        time:       SimTime,
        channel:    ChannelNumber,
        other:      impl Into<LinkEnd>,
        subcarrier: usize,
    ) -> ChannelResult<ComplexMatrix> {
        self.model.channel_matrix(time, channel, other.into(), self.iface.end(), subcarrier)
    }

    pub fn channel_matrix_in_time_range(
        &mut self,
        earliest:   SimTime,
        time:       SimTime,
        channel:    ChannelNumber,
        other:      impl Into<LinkEnd>,
        subcarrier: usize,
    ) -> ChannelResult<ComplexMatrix> {
        self.model
            .channel_matrix_in_time_range(earliest, time, channel, other.into(), self.iface.end(), subcarrier)
    }

    pub fn initialize_link_if_not_yet_inited(
        &mut self,
        time:    SimTime,
        channel: ChannelNumber,
        other:   impl Into<LinkEnd>,
    ) -> ChannelResult<()> {
        self.model
            .initialize_link_if_not_yet_inited(time, channel, other.into(), self.iface.end())
    }
}

// ── Link helpers ──────────────────────────────────────────────────────────────

fn initialize_link(
    nodes:   &NodeTable,
    profile: &ChannelProfile,
    seed:    u64,
    key:     &LinkKey,
    start:   SimTime,
) -> LinkState {
    debug!(link = %key, start = %start, "initializing link");
    LinkState::initialize(seed, key, &nodes[&key.low.node].array, &nodes[&key.high.node].array, start, profile)
}

fn los_applies(nodes: &NodeTable, profile: &ChannelProfile, key: &LinkKey, time: SimTime) -> bool {
    let a = nodes[&key.low.node].mobility.position_at(time);
    let b = nodes[&key.high.node].mobility.position_at(time);
    profile.los_applies(a.distance_m(b))
}

/// Disjoint `&mut` link slots for every job, in job order.
///
/// # Panics
///
/// Panics if a job names a slot outside its channel's table.
fn claim_slots<'c>(channels: &'c mut [ChannelData], jobs: &[PrecomputeJob]) -> Vec<&'c mut LinkSlot> {
    let tables: Vec<(*mut LinkSlot, usize)> = channels
        .iter_mut()
        .map(|c| (c.links.slots_ptr(), c.links.len()))
        .collect();

    jobs.iter()
        .map(|job| {
            let (base, len) = tables[job.channel_index];
            assert!(job.slot < len, "precompute job slot {} out of range", job.slot);
            // SAFETY: `(channel_index, key)` is unique per round (checked when
            // the job was queued) and each key owns exactly one slot, so every
            // pointer targets a distinct element.  The index is in bounds and
            // the tables are not resized while the returned borrows live.
            unsafe { &mut *base.add(job.slot) }
        })
        .collect()
}
