//! The engine core: graph ingest, the shard slot pool, the three phase
//! drivers, and the run loop.
//!
//! One iteration is strictly barriered: every shard's gather completes
//! before apply starts, apply completes before any scatter, and the
//! frontier is rebuilt only after all shards finished flagging. Within the
//! shard loops, staging of the next shard overlaps compute on the current
//! slot whenever the pool holds more than one slot.

mod apply;
mod config;
mod frontier;
mod gather;
mod metrics;
mod scatter;
mod slot;

pub use config::{EngineConfig, DEFAULT_EDGE_BUDGET, DEFAULT_SLOT_COUNT};
pub use metrics::EngineMetrics;

use std::sync::atomic::AtomicU8;
use std::thread;

use tracing::{debug, info};

use crate::device::primitives;
use crate::error::{EngineError, Result};
use crate::graph::{cross_view_index, Topology};
use crate::plan::{plan_shards, ShardPlan};
use crate::program::VertexProgram;
use crate::types::Vertex;

use frontier::Frontier;
use scatter::ScatterEdges;
use slot::{SlotPool, StoredOrder};

/// Sharded gather-apply-scatter engine over an immutable topology.
///
/// The engine owns every buffer; shard slots hold copies of one shard's
/// cold payload plus scratch, and alias the global per-vertex arrays by
/// offset. Vertex state is mutated only by apply, edge state only by the
/// optional scatter hook.
pub struct GasEngine<P: VertexProgram> {
    program: P,
    config: EngineConfig,
    topology: Topology,
    plan: ShardPlan,
    stored: StoredOrder,

    vertex_data: Vec<P::VertexData>,
    /// Edge state in stored order (the gather view's order when
    /// `sort_edges_for_gather`).
    edge_data: Vec<P::EdgeData>,
    /// Other-view position -> stored position, for indirect edge access.
    edge_index: Vec<u32>,

    gather_tmp: Vec<P::GatherResult>,
    apply_ret: Vec<u8>,
    active_flags: Vec<AtomicU8>,
    frontier: Frontier,
    pool: SlotPool<P>,
    metrics: EngineMetrics,
}

impl<P: VertexProgram> std::fmt::Debug for GasEngine<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GasEngine").finish_non_exhaustive()
    }
}

impl<P: VertexProgram> GasEngine<P> {
    /// Ingests a directed edge list: builds both topology views, re-sorts
    /// edge state into the stored order, plans shards against the edge
    /// budget, and sizes the slot pool for the largest shard.
    pub fn from_edge_list(
        program: P,
        config: EngineConfig,
        n_vertices: usize,
        vertex_data: Vec<P::VertexData>,
        edge_srcs: &[Vertex],
        edge_dsts: &[Vertex],
        edge_data: Vec<P::EdgeData>,
    ) -> Result<Self> {
        if config.slot_count == 0 {
            return Err(EngineError::InvalidArgument("slot_count must be at least 1".into()));
        }
        if config.edge_budget == 0 {
            return Err(EngineError::InvalidArgument("edge_budget must be at least 1".into()));
        }
        if vertex_data.len() != n_vertices {
            return Err(EngineError::Ingest(format!(
                "vertex state length {} does not match vertex count {n_vertices}",
                vertex_data.len()
            )));
        }
        if edge_data.len() != edge_srcs.len() {
            return Err(EngineError::Ingest(format!(
                "edge state length {} does not match edge count {}",
                edge_data.len(),
                edge_srcs.len()
            )));
        }

        let topology = Topology::from_edge_list(n_vertices, edge_srcs, edge_dsts)?;
        let plan = plan_shards(&topology, config.edge_budget);

        let stored = if config.sort_edges_for_gather {
            StoredOrder::Incoming
        } else {
            StoredOrder::Outgoing
        };
        let (stored_view, other_view) = match stored {
            StoredOrder::Incoming => (&topology.csc, &topology.csr),
            StoredOrder::Outgoing => (&topology.csr, &topology.csc),
        };
        let edge_data: Vec<P::EdgeData> = stored_view
            .input_index
            .iter()
            .map(|&orig| edge_data[orig as usize].clone())
            .collect();
        let edge_index = cross_view_index(other_view, stored_view);

        let pool = SlotPool::new(&plan, config.slot_count);
        let zero = program.gather_zero();
        let frontier = Frontier::new(plan.shard_count());

        info!(
            vertices = n_vertices,
            edges = topology.n_edges(),
            shards = plan.shard_count(),
            slots = config.slot_count,
            "engine ready"
        );

        Ok(Self {
            program,
            config,
            topology,
            plan,
            stored,
            vertex_data,
            edge_data,
            edge_index,
            gather_tmp: vec![zero; n_vertices],
            apply_ret: vec![0; n_vertices],
            active_flags: (0..n_vertices).map(|_| AtomicU8::new(0)).collect(),
            frontier,
            pool,
            metrics: EngineMetrics::default(),
        })
    }

    /// Replaces the frontier with the half-open range `[start, end)`.
    pub fn set_active(&mut self, start: Vertex, end: Vertex) -> Result<()> {
        let v = self.topology.n_vertices();
        if start > end || end as usize > v {
            return Err(EngineError::InvalidArgument(format!(
                "active range {start}..{end} does not fit [0, {v})"
            )));
        }
        self.frontier.set_range(&self.plan, start, end);
        Ok(())
    }

    pub fn count_active(&self) -> usize {
        self.frontier.len()
    }

    /// The frontier: global ids grouped by shard, ascending in each group.
    pub fn active_vertices(&self) -> &[Vertex] {
        self.frontier.as_slice()
    }

    pub fn active_per_shard(&self) -> Vec<u32> {
        self.frontier.per_shard_counts()
    }

    pub fn shard_count(&self) -> usize {
        self.plan.shard_count()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn plan(&self) -> &ShardPlan {
        &self.plan
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    /// Final vertex state.
    pub fn results(&self) -> &[P::VertexData] {
        &self.vertex_data
    }

    pub fn into_results(self) -> Vec<P::VertexData> {
        self.vertex_data
    }

    /// Edge state restored to the input edge-list order.
    pub fn edge_results(&self) -> Vec<P::EdgeData> {
        let stored_view = match self.stored {
            StoredOrder::Incoming => &self.topology.csc,
            StoredOrder::Outgoing => &self.topology.csr,
        };
        let mut out = self.edge_data.clone();
        for (pos, &orig) in stored_view.input_index.iter().enumerate() {
            out[orig as usize] = self.edge_data[pos].clone();
        }
        out
    }

    fn schedule(&self) -> Vec<usize> {
        (0..self.plan.shard_count())
            .filter(|&k| self.frontier.shard_len(k) > 0)
            .collect()
    }

    /// Gather phase: stream every shard with active vertices through the
    /// slot pool and reduce incoming-edge contributions into the global
    /// accumulator. Skipped in full when the program opts out; the
    /// accumulator then keeps its identity seed.
    pub fn gather(&mut self) -> Result<()> {
        if !self.program.uses_gather() || self.frontier.len() == 0 {
            return Ok(());
        }
        let zero = self.program.gather_zero();
        self.gather_tmp.fill(zero);

        let schedule = self.schedule();
        let pool = &self.pool;
        let topology = &self.topology;
        let plan = &self.plan;
        let program = &self.program;
        let frontier = &self.frontier;
        let vertex_data = &self.vertex_data;
        let edge_data = &self.edge_data;
        let edge_index = &self.edge_index;
        let stored = self.stored;
        let gather_tmp = &mut self.gather_tmp;

        let mut expanded = 0u64;
        pool.slot(0)
            .lock()
            .stage(schedule[0], topology, plan, edge_data, edge_index, stored)?;
        for (idx, &k) in schedule.iter().enumerate() {
            let cur = idx % pool.len();
            let next = schedule.get(idx + 1).copied();
            thread::scope(|scope| -> Result<()> {
                let prefetch = match next {
                    Some(next_shard) if pool.len() > 1 => {
                        let next_slot = (idx + 1) % pool.len();
                        Some(scope.spawn(move || {
                            pool.slot(next_slot).lock().stage(
                                next_shard, topology, plan, edge_data, edge_index, stored,
                            )
                        }))
                    }
                    _ => None,
                };

                let mut staged = pool.slot(cur).lock();
                expanded += gather::gather_shard(
                    program,
                    &mut staged,
                    frontier.shard_slice(k),
                    vertex_data,
                    edge_data,
                    stored,
                    gather_tmp,
                );
                staged.release();
                drop(staged);

                if let Some(handle) = prefetch {
                    handle
                        .join()
                        .map_err(|_| EngineError::Device("staging thread panicked".into()))??;
                }
                Ok(())
            })?;
            if pool.len() == 1 {
                if let Some(next_shard) = next {
                    pool.slot(0)
                        .lock()
                        .stage(next_shard, topology, plan, edge_data, edge_index, stored)?;
                }
            }
        }

        self.metrics.record_gather(schedule.len() as u64, expanded);
        self.metrics.shards_staged += schedule.len() as u64;
        debug!(shards = schedule.len(), expanded, "gather phase complete");
        Ok(())
    }

    /// Apply phase: update every active vertex from its reduced gather
    /// value and record the activation verdicts.
    pub fn apply(&mut self) {
        if self.frontier.len() == 0 {
            return;
        }
        apply::apply_frontier(
            &self.program,
            self.frontier.as_slice(),
            &mut self.vertex_data,
            &self.gather_tmp,
            &mut self.apply_ret,
        );
        debug!(active = self.frontier.len(), "apply phase complete");
    }

    /// Scatter phase: clear the activation flags, flag every activated
    /// neighborhood shard by shard, then rebuild the frontier from the
    /// flags. Activation always runs; the per-edge hook only when the
    /// program asks for it.
    pub fn scatter_activate(&mut self) -> Result<()> {
        primitives::clear_flags(&self.active_flags);

        let schedule = self.schedule();
        if !schedule.is_empty() {
            let expanded = if self.program.uses_scatter() {
                self.scatter_with_hook(&schedule)?
            } else {
                self.scatter_parallel(&schedule)?
            };
            self.metrics.record_scatter(schedule.len() as u64, expanded);
            self.metrics.shards_staged += schedule.len() as u64;
        }

        let n_active = self.frontier.rebuild(&self.plan, &self.active_flags);
        self.metrics.record_frontier(n_active as u64);
        debug!(shards = schedule.len(), n_active, "scatter phase complete");
        Ok(())
    }

    /// Flag-only scatter: no edge state is touched, so shards stream with
    /// staging overlap and slots release without write-back.
    fn scatter_parallel(&mut self, schedule: &[usize]) -> Result<u64> {
        let pool = &self.pool;
        let topology = &self.topology;
        let plan = &self.plan;
        let program = &self.program;
        let frontier = &self.frontier;
        let vertex_data = &self.vertex_data;
        let edge_data = &self.edge_data;
        let edge_index = &self.edge_index;
        let stored = self.stored;
        let apply_ret = &self.apply_ret;
        let active_flags = &self.active_flags;

        let mut expanded = 0u64;
        pool.slot(0)
            .lock()
            .stage(schedule[0], topology, plan, edge_data, edge_index, stored)?;
        for (idx, &k) in schedule.iter().enumerate() {
            let cur = idx % pool.len();
            let next = schedule.get(idx + 1).copied();
            thread::scope(|scope| -> Result<()> {
                let prefetch = match next {
                    Some(next_shard) if pool.len() > 1 => {
                        let next_slot = (idx + 1) % pool.len();
                        Some(scope.spawn(move || {
                            pool.slot(next_slot).lock().stage(
                                next_shard, topology, plan, edge_data, edge_index, stored,
                            )
                        }))
                    }
                    _ => None,
                };

                let mut staged = pool.slot(cur).lock();
                expanded += scatter::scatter_shard(
                    program,
                    &mut staged,
                    frontier.shard_slice(k),
                    apply_ret,
                    vertex_data,
                    active_flags,
                    ScatterEdges::Staged,
                );
                staged.release();
                drop(staged);

                if let Some(handle) = prefetch {
                    handle
                        .join()
                        .map_err(|_| EngineError::Device("staging thread panicked".into()))??;
                }
                Ok(())
            })?;
            if pool.len() == 1 {
                if let Some(next_shard) = next {
                    pool.slot(0)
                        .lock()
                        .stage(next_shard, topology, plan, edge_data, edge_index, stored)?;
                }
            }
        }
        Ok(expanded)
    }

    /// Scatter with the per-edge hook: shards run one at a time because the
    /// hook mutates edge state, staged when it lives in outgoing order and
    /// through the permutation into the engine-resident array otherwise.
    fn scatter_with_hook(&mut self, schedule: &[usize]) -> Result<u64> {
        let mut expanded = 0u64;
        for (idx, &k) in schedule.iter().enumerate() {
            let mut staged = self.pool.slot(idx % self.pool.len()).lock();
            staged.stage(
                k,
                &self.topology,
                &self.plan,
                &self.edge_data,
                &self.edge_index,
                self.stored,
            )?;

            let edges = match self.stored {
                StoredOrder::Outgoing => ScatterEdges::Staged,
                StoredOrder::Incoming => ScatterEdges::Permuted(&mut self.edge_data),
            };
            expanded += scatter::scatter_shard(
                &self.program,
                &mut staged,
                self.frontier.shard_slice(k),
                &self.apply_ret,
                &self.vertex_data,
                &self.active_flags,
                edges,
            );

            match self.stored {
                StoredOrder::Outgoing => {
                    let range = self.plan.csr_edge_range(k);
                    staged.evict(&mut self.edge_data[range]);
                    self.metrics.shards_evicted += 1;
                }
                StoredOrder::Incoming => staged.release(),
            }
        }
        Ok(expanded)
    }

    /// Ends the iteration and reports the surviving frontier size.
    pub fn next_iter(&mut self) -> usize {
        self.metrics.iterations += 1;
        self.frontier.len()
    }

    /// Runs the standard loop until the frontier is empty; returns the
    /// number of iterations executed.
    pub fn run(&mut self) -> Result<u64> {
        let mut iterations = 0u64;
        while self.count_active() > 0 {
            self.gather()?;
            self.apply();
            self.scatter_activate()?;
            self.next_iter();
            iterations += 1;
        }
        info!(iterations, "frontier drained");
        Ok(iterations)
    }
}
