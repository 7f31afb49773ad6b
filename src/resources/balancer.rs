//! Load balancer and listener emitters.

use crate::graph::types::{Listener, LoadBalancer};
use serde_json::{json, Value};

/// Emit the load balancer template fragment.
pub fn load_balancer_fragment(lb: &LoadBalancer) -> Value {
    let scheme = if lb.internet_facing {
        "internet-facing"
    } else {
        "internal"
    };
    json!({
        "Type": "AWS::ElasticLoadBalancingV2::LoadBalancer",
        "Properties": {
            "Scheme": scheme,
            "Type": "application",
            "VpcId": { "Ref": lb.vpc },
        }
    })
}

/// Emit the listener template fragment, including its target binding.
pub fn listener_fragment(listener: &Listener) -> Value {
    let mut properties = json!({
        "LoadBalancerArn": { "Ref": listener.load_balancer },
        "Protocol": listener.protocol.to_string().to_uppercase(),
        "Port": listener.port,
        "OpenToWorld": listener.open_to_world,
    });
    if let Some(ref target) = listener.target {
        properties["DefaultActions"] = json!([{
            "Type": "forward",
            "TargetPort": target.port,
            "Targets": [{ "Ref": target.autoscaling_group }],
        }]);
    }
    json!({
        "Type": "AWS::ElasticLoadBalancingV2::Listener",
        "Properties": properties,
    })
}
