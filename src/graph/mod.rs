//! Filter graphs: a serializable description, the node tree built from it and the entry point
//! that evaluates a tree for a device transform.

pub(crate) mod apply;
pub(crate) mod node;
pub(crate) mod model;
