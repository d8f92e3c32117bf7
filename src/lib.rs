pub mod device;
pub mod engine;
pub mod error;
pub mod graph;
pub mod plan;
pub mod program;
pub mod types;

pub use crate::engine::{EngineConfig, EngineMetrics, GasEngine};
pub use crate::error::{EngineError, Result};
pub use crate::graph::Topology;
pub use crate::plan::ShardPlan;
pub use crate::program::VertexProgram;
pub use crate::types::{EdgePos, Vertex};
