//! Lazily composed filter results and the evaluation state threaded through a filter graph.
//!
//! A [`FilterResult`](result::FilterResult) keeps crops, transforms and color filters as metadata
//! on a shared image for as long as folding them is pixel-equivalent to rendering each step;
//! [`decision`] holds those rules. [`Builder`](builder::Builder) combines several results with
//! a single paint.

pub(crate) mod builder;
pub(crate) mod cache;
pub(crate) mod context;
pub(crate) mod decision;
pub(crate) mod result;
