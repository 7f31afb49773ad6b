//! Synthesis — turn a validated resource graph into a template document.

pub mod template;

use crate::graph::types::ResourceSpec;
use crate::resources;
use serde_json::Value;

/// Emit the template fragments for one resource. Most resources yield a
/// single fragment; an autoscaling group also yields its scaling policies.
pub fn emit(id: &str, resource: &ResourceSpec) -> Vec<(String, Value)> {
    match resource {
        ResourceSpec::Vpc(vpc) => vec![(id.to_string(), resources::network::vpc_fragment(vpc))],
        ResourceSpec::LoadBalancer(lb) => vec![(
            id.to_string(),
            resources::balancer::load_balancer_fragment(lb),
        )],
        ResourceSpec::Listener(listener) => vec![(
            id.to_string(),
            resources::balancer::listener_fragment(listener),
        )],
        ResourceSpec::SecurityGroup(sg) => vec![(
            id.to_string(),
            resources::security::security_group_fragment(sg),
        )],
        ResourceSpec::Role(role) => {
            vec![(id.to_string(), resources::iam::role_fragment(role))]
        }
        ResourceSpec::AutoScalingGroup(asg) => resources::autoscaling::fragments(id, asg),
    }
}
