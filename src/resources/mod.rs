//! Per-family template emitters.
//!
//! Each module turns one resource family into its template fragment:
//! a JSON object with a `Type` and a `Properties` block, references
//! expressed as `{"Ref": "<logical id>"}`.

pub mod autoscaling;
pub mod balancer;
pub mod iam;
pub mod network;
pub mod security;
