//! Trama — a declarative network topology as a typed resource graph.
//!
//! One fixed load-balanced stack, declared once, validated, and rendered
//! into a template for an external reconciliation engine. Deterministic
//! ordering, BLAKE3 template fingerprints, no cloud API calls.

pub mod cli;
pub mod graph;
pub mod resources;
pub mod synth;
pub mod topology;
