//! Fork-join precomputation of links that are about to be queried.
//!
//! # Round protocol
//!
//! ```text
//! notify(job) × n   (caller thread; placeholders inserted into link tables)
//! run(work):
//!   remaining ← n
//!   fork: worker_threads − 1 pool threads + the caller
//!   each thread: loop { i ← --remaining; if i < 0 break; work(job[i], slot[i]) }
//!   join
//!   assert remaining < 0; clear jobs
//! ```
//!
//! Every job targets a different link, so each thread holds the only
//! reference to the link it claimed and no per-link locking is needed.  The
//! uniqueness is checked when jobs are queued.
//!
//! With the `parallel` feature the fork uses a dedicated Rayon pool owned by
//! the scheduler.  Rayon joins all spawned work before `in_place_scope`
//! returns, and the pool lives exactly as long as the scheduler.  Without the
//! feature every round runs on the caller.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicIsize, Ordering};

use tgn_core::SimTime;

use crate::table::FastSet;
use crate::{ChannelError, ChannelResult, LinkKey, LinkSlot};

/// One queued link advancement.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PrecomputeJob {
    /// Index into the model's channel list.
    pub channel_index: usize,
    /// Index into that channel's link table.
    pub slot:          usize,
    pub key:           LinkKey,
    pub time_of_use:   SimTime,
    /// The link's placeholder was inserted by this job.
    pub is_new:        bool,
}

pub struct PrecomputeScheduler {
    jobs:           Vec<PrecomputeJob>,
    queued:         FastSet<(usize, LinkKey)>,
    remaining:      AtomicIsize,
    worker_threads: usize,
    #[cfg(feature = "parallel")]
    pool:           Option<rayon::ThreadPool>,
}

impl PrecomputeScheduler {
    /// `worker_threads` counts the caller, so `1` runs every round inline.
    pub fn new(worker_threads: usize) -> ChannelResult<Self> {
        if worker_threads == 0 {
            return Err(ChannelError::Config("a precompute scheduler needs at least one thread".into()));
        }

        #[cfg(feature = "parallel")]
        let pool = if worker_threads > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(worker_threads - 1)
                .thread_name(|i| format!("tgn-precompute-{i}"))
                .build()
                .map_err(|e| ChannelError::Config(format!("cannot start precompute threads: {e}")))?;
            Some(pool)
        } else {
            None
        };

        #[cfg(not(feature = "parallel"))]
        if worker_threads > 1 {
            tracing::warn!(
                worker_threads,
                "tgn-channel built without the `parallel` feature; precompute rounds run on the caller"
            );
        }

        Ok(Self {
            jobs: Vec::new(),
            queued: FastSet::default(),
            remaining: AtomicIsize::new(0),
            worker_threads,
            #[cfg(feature = "parallel")]
            pool,
        })
    }

    /// Queue a job for the next round.
    ///
    /// # Panics
    ///
    /// Panics if the same link on the same channel is already queued: two
    /// threads would then advance one link concurrently.
    pub fn push(&mut self, job: PrecomputeJob) {
        assert!(
            self.queued.insert((job.channel_index, job.key)),
            "link {} on channel index {} queued twice in one precompute round",
            job.key,
            job.channel_index
        );
        self.jobs.push(job);
    }

    pub fn jobs(&self) -> &[PrecomputeJob] {
        &self.jobs
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    /// Claim counter after the last round; negative once a round has run.
    pub fn remaining(&self) -> isize {
        self.remaining.load(Ordering::Acquire)
    }

    /// Run every queued job once and clear the queue.
    ///
    /// `slots[i]` must be the link slot of `jobs()[i]`.  `work` is called
    /// exactly once per job, from whichever thread claims it.
    pub fn run<F>(&mut self, slots: Vec<&mut LinkSlot>, work: F)
    where
        F: Fn(&PrecomputeJob, &mut LinkSlot) + Sync,
    {
        if self.jobs.is_empty() {
            return;
        }
        assert_eq!(slots.len(), self.jobs.len(), "one link slot per job");

        let board = ClaimBoard {
            jobs:      &self.jobs,
            slots:     slots.into_iter().map(UnsafeCell::new).collect(),
            remaining: &self.remaining,
        };
        board.remaining.store(self.jobs.len() as isize, Ordering::Release);

        let drain = || {
            while let Some((job, slot)) = board.claim() {
                work(job, slot);
            }
        };

        #[cfg(feature = "parallel")]
        match &self.pool {
            Some(pool) => pool.in_place_scope(|scope| {
                for _ in 0..pool.current_num_threads() {
                    scope.spawn(|_| drain());
                }
                drain();
            }),
            None => drain(),
        }

        #[cfg(not(feature = "parallel"))]
        drain();

        drop(board);
        assert!(self.remaining() < 0, "precompute round finished with unclaimed jobs");
        self.jobs.clear();
        self.queued.clear();
    }
}

// ── ClaimBoard ────────────────────────────────────────────────────────────────

/// Jobs and their link slots, handed out one claim at a time.
struct ClaimBoard<'a> {
    jobs:      &'a [PrecomputeJob],
    slots:     Vec<UnsafeCell<&'a mut LinkSlot>>,
    remaining: &'a AtomicIsize,
}

// SAFETY: a slot is only reachable through `claim`, and `claim` hands out
// each index at most once per round (the counter only decreases).  The slots
// themselves are distinct links (unique keys per round, checked in `push`),
// so no two threads ever hold references to the same `LinkSlot`.
unsafe impl Sync for ClaimBoard<'_> {}

impl ClaimBoard<'_> {
    #[allow(clippy::mut_from_ref)]
    fn claim(&self) -> Option<(&PrecomputeJob, &mut LinkSlot)> {
        let index = self.remaining.fetch_sub(1, Ordering::AcqRel) - 1;
        if index < 0 {
            return None;
        }
        let index = index as usize;
        // SAFETY: `index` was handed out by the counter above and never will
        // be again, so this is the only live reference to `slots[index]`.
        let slot: &mut LinkSlot = unsafe { &mut **self.slots[index].get() };
        Some((&self.jobs[index], slot))
    }
}
