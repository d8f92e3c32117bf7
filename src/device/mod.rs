//! Contracts the engine needs from the accelerator's parallel-primitive
//! library, with a host reference implementation on rayon.
//!
//! The concrete accelerator runtime is an external collaborator; the engine
//! only depends on the semantics documented on each function here.

pub mod primitives;
