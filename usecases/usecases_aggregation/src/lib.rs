//! Use Cases Layer: Reply Aggregation
//!
//! Folds the tracer's heterogeneous per-node reply list into one
//! [`TraceResult`]. The fold is order-independent: the two per-node maps
//! are keyed by node and the saved id is a singleton.

pub mod aggregate;

pub use aggregate::aggregate;
