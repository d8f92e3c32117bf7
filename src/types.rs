/// Dense vertex index; vertices occupy the contiguous space `[0, V)`.
pub type Vertex = u32;

/// Position of an edge inside one topology view (incoming or outgoing order).
pub type EdgePos = u32;
