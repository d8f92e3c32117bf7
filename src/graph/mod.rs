//! Graph ingest and the immutable dual-view topology.
//!
//! An edge list is converted once into compressed sparse form along both
//! directions: the incoming view (indexed by destination, listing sources)
//! drives gather, the outgoing view (indexed by source, listing
//! destinations) drives scatter. Topology never changes after ingest; only
//! vertex and edge state does.

mod build;

pub use build::{cross_view_index, AdjacencyView, Topology};
