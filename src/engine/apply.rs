use crate::program::VertexProgram;
use crate::types::Vertex;

/// Below this span the recursion runs the loop inline instead of forking.
const SEQUENTIAL_SPAN: usize = 256;

/// Applies the program over the whole frontier, writing each vertex's
/// activation verdict into `apply_ret`.
///
/// `active` must be strictly ascending (the frontier invariant); the
/// recursion splits the vertex arrays at pivot boundaries so both halves
/// mutate disjoint slices.
pub(crate) fn apply_frontier<P: VertexProgram>(
    program: &P,
    active: &[Vertex],
    vertex_data: &mut [P::VertexData],
    gather_tmp: &[P::GatherResult],
    apply_ret: &mut [u8],
) {
    apply_span(program, active, 0, vertex_data, gather_tmp, apply_ret);
}

fn apply_span<P: VertexProgram>(
    program: &P,
    active: &[Vertex],
    base: Vertex,
    vertex_data: &mut [P::VertexData],
    gather_tmp: &[P::GatherResult],
    apply_ret: &mut [u8],
) {
    if active.len() <= SEQUENTIAL_SPAN {
        for &a in active {
            let i = (a - base) as usize;
            let changed = program.apply(&mut vertex_data[i], &gather_tmp[i]);
            apply_ret[i] = changed as u8;
        }
        return;
    }

    let mid = active.len() / 2;
    let pivot = active[mid];
    let split = (pivot - base) as usize;
    let (left_active, right_active) = active.split_at(mid);
    let (left_data, right_data) = vertex_data.split_at_mut(split);
    let (left_gather, right_gather) = gather_tmp.split_at(split);
    let (left_ret, right_ret) = apply_ret.split_at_mut(split);

    rayon::join(
        || apply_span(program, left_active, base, left_data, left_gather, left_ret),
        || apply_span(program, right_active, pivot, right_data, right_gather, right_ret),
    );
}
