//! Security group emitter.

use crate::graph::types::{Peer, SecurityGroup};
use serde_json::{json, Value};

/// Emit the security group template fragment.
pub fn security_group_fragment(sg: &SecurityGroup) -> Value {
    let ingress: Vec<Value> = sg
        .ingress
        .iter()
        .map(|rule| {
            let mut entry = json!({
                "IpProtocol": rule.protocol.to_string(),
                "FromPort": rule.port,
                "ToPort": rule.port,
            });
            match rule.peer {
                Peer::AnyIpv4 => entry["CidrIp"] = json!("0.0.0.0/0"),
                Peer::Ipv4(ref cidr) => entry["CidrIp"] = json!(cidr),
                Peer::Resource(ref id) => {
                    entry["Source"] = json!({ "Ref": id });
                }
            }
            if let Some(ref description) = rule.description {
                entry["Description"] = json!(description);
            }
            entry
        })
        .collect();

    let egress: Vec<Value> = sg
        .egress
        .iter()
        .map(|rule| {
            let mut entry = json!({
                "IpProtocol": rule.protocol.to_string(),
                "FromPort": rule.port,
                "ToPort": rule.port,
                "CidrIp": rule.cidr,
            });
            if let Some(ref description) = rule.description {
                entry["Description"] = json!(description);
            }
            entry
        })
        .collect();

    json!({
        "Type": "AWS::EC2::SecurityGroup",
        "Properties": {
            "VpcId": { "Ref": sg.vpc },
            "AllowAllOutbound": sg.allow_all_outbound,
            "SecurityGroupIngress": ingress,
            "SecurityGroupEgress": egress,
        }
    })
}
