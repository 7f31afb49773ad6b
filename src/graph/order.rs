//! Dependency DAG construction and deterministic ordering.
//!
//! Edges are derived from the references embedded in each resource rather
//! than from an explicit depends_on list. Topological order uses Kahn's
//! algorithm; ties break by declaration position, so the network always
//! leads the document and two builds of the same declaration always order
//! identically.

use super::types::Topology;
use std::collections::{HashMap, HashSet, VecDeque};

/// All (dependency, dependent) edges implied by resource references.
pub fn dependency_edges(topology: &Topology) -> Result<Vec<(String, String)>, String> {
    let mut edges = Vec::new();
    for (id, resource) in &topology.resources {
        for (referenced, _) in resource.references() {
            if !topology.resources.contains_key(&referenced) {
                return Err(format!(
                    "resource '{}' references unknown '{}'",
                    id, referenced
                ));
            }
            edges.push((referenced, id.clone()));
        }
    }
    Ok(edges)
}

/// Compute the deterministic declaration order for synthesis.
pub fn declaration_order(topology: &Topology) -> Result<Vec<String>, String> {
    let resource_ids: Vec<String> = topology.resources.keys().cloned().collect();
    let mut in_degree: HashMap<String, usize> = HashMap::new();
    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();

    for id in &resource_ids {
        in_degree.insert(id.clone(), 0);
        adjacency.insert(id.clone(), Vec::new());
    }

    for (dependency, dependent) in dependency_edges(topology)? {
        adjacency
            .get_mut(&dependency)
            .ok_or_else(|| format!("unknown dependency '{}'", dependency))?
            .push(dependent.clone());
        *in_degree
            .get_mut(&dependent)
            .ok_or_else(|| format!("unknown dependent '{}'", dependent))? += 1;
    }

    // Kahn's algorithm; ties break by declaration position
    let declared_at = |id: &String| topology.resources.get_index_of(id).unwrap_or(usize::MAX);
    let mut queue: VecDeque<String> = VecDeque::new();
    let mut zero_degree: Vec<String> = in_degree
        .iter()
        .filter(|(_, &d)| d == 0)
        .map(|(id, _)| id.clone())
        .collect();
    zero_degree.sort_by_key(|id| declared_at(id));
    for id in zero_degree {
        queue.push_back(id);
    }

    let mut order = Vec::new();
    while let Some(current) = queue.pop_front() {
        order.push(current.clone());

        let mut next_ready: Vec<String> = Vec::new();
        if let Some(neighbors) = adjacency.get(&current) {
            for neighbor in neighbors {
                let degree = in_degree
                    .get_mut(neighbor)
                    .ok_or_else(|| format!("unknown neighbor '{}'", neighbor))?;
                *degree -= 1;
                if *degree == 0 {
                    next_ready.push(neighbor.clone());
                }
            }
        }
        next_ready.sort_by_key(|id| declared_at(id));
        for id in next_ready {
            queue.push_back(id);
        }
    }

    if order.len() != resource_ids.len() {
        let remaining: HashSet<_> = resource_ids.iter().collect();
        let ordered: HashSet<_> = order.iter().collect();
        let mut cycle_members: Vec<_> = remaining
            .difference(&ordered)
            .map(|s| s.as_str())
            .collect();
        cycle_members.sort_unstable();
        return Err(format!(
            "reference cycle detected involving: {}",
            cycle_members.join(", ")
        ));
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::builder::{AsgOptions, TopologyBuilder};
    use crate::graph::types::*;
    use indexmap::IndexMap;

    fn full_topology() -> Topology {
        let mut b = TopologyBuilder::new("test");
        let vpc = b.default_vpc("net").unwrap();
        let lb = b.load_balancer("lb", &vpc, true).unwrap();
        let sg = b.security_group("sg", &vpc, false).unwrap();
        b.allow_from_load_balancer(&sg, &lb, Protocol::Tcp, 80, "lb")
            .unwrap();
        let role = b.role("role", "sns.amazonaws.com").unwrap();
        let asg = b
            .autoscaling_group("pool", &vpc, &sg, &role, AsgOptions::default())
            .unwrap();
        let listener = b.listener("http", &lb, Protocol::Tcp, 80).unwrap();
        b.add_target(&listener, 80, &asg).unwrap();
        b.build()
    }

    #[test]
    fn test_edges_cover_every_reference() {
        let topology = full_topology();
        let edges = dependency_edges(&topology).unwrap();
        assert!(edges.contains(&("net".to_string(), "lb".to_string())));
        assert!(edges.contains(&("net".to_string(), "sg".to_string())));
        assert!(edges.contains(&("lb".to_string(), "sg".to_string())));
        assert!(edges.contains(&("sg".to_string(), "pool".to_string())));
        assert!(edges.contains(&("role".to_string(), "pool".to_string())));
        assert!(edges.contains(&("lb".to_string(), "http".to_string())));
        assert!(edges.contains(&("pool".to_string(), "http".to_string())));
    }

    #[test]
    fn test_order_respects_every_edge() {
        let topology = full_topology();
        let order = declaration_order(&topology).unwrap();
        let position: std::collections::HashMap<_, _> = order
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();
        for (dependency, dependent) in dependency_edges(&topology).unwrap() {
            assert!(
                position[&dependency] < position[&dependent],
                "{} must come before {}",
                dependency,
                dependent
            );
        }
        assert_eq!(order[0], "net");
        assert_eq!(order.last().unwrap(), "http");
    }

    #[test]
    fn test_order_deterministic() {
        let topology = full_topology();
        let first = declaration_order(&topology).unwrap();
        let second = declaration_order(&topology).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_independent_resources_keep_declaration_order() {
        let mut b = TopologyBuilder::new("test");
        b.role("zeta", "sns.amazonaws.com").unwrap();
        b.role("alpha", "sns.amazonaws.com").unwrap();
        let order = declaration_order(&b.build()).unwrap();
        assert_eq!(order, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_unknown_reference_rejected() {
        let mut resources = IndexMap::new();
        resources.insert(
            "lb".to_string(),
            ResourceSpec::LoadBalancer(LoadBalancer {
                vpc: "ghost".to_string(),
                internet_facing: true,
            }),
        );
        let topology = Topology {
            name: "bad".to_string(),
            description: None,
            resources,
        };
        let err = declaration_order(&topology).unwrap_err();
        assert!(err.contains("references unknown 'ghost'"));
    }

    #[test]
    fn test_cycle_detected_in_hand_assembled_graph() {
        // The builder cannot produce this; a hand-assembled graph can.
        let mut resources = IndexMap::new();
        resources.insert(
            "a".to_string(),
            ResourceSpec::SecurityGroup(SecurityGroup {
                vpc: "net".to_string(),
                allow_all_outbound: false,
                ingress: vec![IngressRule {
                    peer: Peer::Resource("b".to_string()),
                    protocol: Protocol::Tcp,
                    port: 80,
                    description: None,
                }],
                egress: vec![],
            }),
        );
        resources.insert(
            "b".to_string(),
            ResourceSpec::SecurityGroup(SecurityGroup {
                vpc: "net".to_string(),
                allow_all_outbound: false,
                ingress: vec![IngressRule {
                    peer: Peer::Resource("a".to_string()),
                    protocol: Protocol::Tcp,
                    port: 80,
                    description: None,
                }],
                egress: vec![],
            }),
        );
        resources.insert("net".to_string(), ResourceSpec::Vpc(Vpc::default()));
        let topology = Topology {
            name: "cyclic".to_string(),
            description: None,
            resources,
        };
        let err = declaration_order(&topology).unwrap_err();
        assert!(err.contains("cycle"));
        assert!(err.contains('a') && err.contains('b'));
    }

    #[test]
    fn test_empty_topology_orders_empty() {
        let topology = TopologyBuilder::new("empty").build();
        assert!(declaration_order(&topology).unwrap().is_empty());
    }
}
