//! Network (VPC) emitter.

use crate::graph::types::Vpc;
use serde_json::{json, Value};

/// Emit the VPC template fragment.
pub fn vpc_fragment(vpc: &Vpc) -> Value {
    json!({
        "Type": "AWS::EC2::VPC",
        "Properties": {
            "CidrBlock": vpc.cidr,
            "EnableDnsHostnames": true,
            "EnableDnsSupport": true,
        }
    })
}
