/// The user-pluggable operations defining a vertex-centric algorithm.
///
/// An implementation carries the algorithm's constants (damping factors,
/// tolerances) as instance state; the engine calls every method through a
/// shared reference, possibly from several threads at once.
///
/// # Contract
///
/// `gather_reduce` must be associative and commutative, and `gather_zero`
/// must be its identity. The engine relies on these properties to reduce
/// edge contributions in any grouping and does not verify them at runtime;
/// violating them silently corrupts results.
pub trait VertexProgram: Send + Sync {
    /// Per-vertex state, mutated only by [`VertexProgram::apply`].
    type VertexData: Clone + Send + Sync;
    /// Per-edge state, mutated only by the optional scatter hook.
    type EdgeData: Clone + Send + Sync;
    /// The value aggregated over a vertex's incoming edges.
    type GatherResult: Clone + Send + Sync;

    /// Identity element for [`VertexProgram::gather_reduce`].
    fn gather_zero(&self) -> Self::GatherResult;

    /// Computes one incoming edge's contribution to `dst`. Must be pure.
    fn gather_map(
        &self,
        src: &Self::VertexData,
        dst: &Self::VertexData,
        edge: &Self::EdgeData,
    ) -> Self::GatherResult;

    /// Combines two gather contributions. Must be pure, associative, and
    /// commutative with [`VertexProgram::gather_zero`] as identity.
    fn gather_reduce(&self, a: &Self::GatherResult, b: &Self::GatherResult) -> Self::GatherResult;

    /// Updates a vertex from its reduced gather value. Returns whether the
    /// vertex's outgoing neighborhood becomes active next iteration.
    fn apply(&self, vertex: &mut Self::VertexData, gathered: &Self::GatherResult) -> bool;

    /// Hook invoked while activating `dst` along an out-edge of `src`; may
    /// mutate the edge state. Only runs when [`VertexProgram::uses_scatter`]
    /// returns true; activation itself does not depend on it.
    fn scatter(&self, src: &Self::VertexData, dst: &Self::VertexData, edge: &mut Self::EdgeData) {
        let _ = (src, dst, edge);
    }

    /// Programs with no incoming-edge aggregation can opt out; the gather
    /// phase is then skipped in full and apply sees the identity value.
    fn uses_gather(&self) -> bool {
        true
    }

    /// Whether the scatter edge hook should be invoked during activation.
    fn uses_scatter(&self) -> bool {
        false
    }
}
