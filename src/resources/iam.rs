//! Role and policy emitter.

use crate::graph::types::Role;
use serde_json::{json, Value};

/// Emit the role template fragment with its inline policy document.
pub fn role_fragment(role: &Role) -> Value {
    let statements: Vec<Value> = role
        .statements
        .iter()
        .map(|statement| {
            json!({
                "Effect": "Allow",
                "Action": statement.actions,
                "Resource": statement.resources,
            })
        })
        .collect();

    json!({
        "Type": "AWS::IAM::Role",
        "Properties": {
            "AssumeRolePolicyDocument": {
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": { "Service": role.assumed_by },
                    "Action": "sts:AssumeRole",
                }]
            },
            "Policies": [{
                "PolicyName": "inline",
                "PolicyDocument": {
                    "Version": "2012-10-17",
                    "Statement": statements,
                }
            }]
        }
    })
}
