//! Autoscaling group emitter.
//!
//! The group itself plus one scaling-policy fragment per owned policy,
//! with derived logical ids (`<group id><policy name>`).

use crate::graph::types::{AutoScalingGroup, ScalingTarget};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};

/// Emit the autoscaling group fragment and its scaling-policy fragments.
pub fn fragments(id: &str, asg: &AutoScalingGroup) -> Vec<(String, Value)> {
    let mut out = vec![(id.to_string(), group_fragment(asg))];
    for policy in &asg.scaling_policies {
        out.push((
            format!("{}{}", id, policy.name),
            scaling_policy_fragment(id, &policy.target),
        ));
    }
    out
}

fn group_fragment(asg: &AutoScalingGroup) -> Value {
    json!({
        "Type": "AWS::AutoScaling::AutoScalingGroup",
        "Properties": {
            "VpcId": { "Ref": asg.vpc },
            "InstanceType": asg.instance_type(),
            "MachineImage": asg.machine_image.to_string(),
            "SecurityGroups": [{ "Ref": asg.security_group }],
            "Role": { "Ref": asg.role },
            "MinSize": asg.min_size,
            "MaxSize": asg.max_size,
            "UserData": BASE64.encode(asg.user_data.to_script()),
        }
    })
}

fn scaling_policy_fragment(group_id: &str, target: &ScalingTarget) -> Value {
    let tracking = match target {
        ScalingTarget::CpuUtilization { percent } => json!({
            "PredefinedMetricSpecification": {
                "PredefinedMetricType": "ASGAverageCPUUtilization",
            },
            "TargetValue": percent,
        }),
        ScalingTarget::RequestsPerMinute { count } => json!({
            "PredefinedMetricSpecification": {
                "PredefinedMetricType": "ALBRequestCountPerTarget",
            },
            "TargetValue": count,
        }),
    };
    json!({
        "Type": "AWS::AutoScaling::ScalingPolicy",
        "Properties": {
            "AutoScalingGroupName": { "Ref": group_id },
            "PolicyType": "TargetTrackingScaling",
            "TargetTrackingConfiguration": tracking,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::{
        InstanceClass, InstanceSize, MachineImage, ScalingPolicy, UserData,
    };

    fn make_asg() -> AutoScalingGroup {
        let mut user_data = UserData::for_linux();
        user_data.add_command("echo boot");
        AutoScalingGroup {
            vpc: "net".to_string(),
            instance_class: InstanceClass::T3a,
            instance_size: InstanceSize::Micro,
            machine_image: MachineImage::AmazonLinux,
            security_group: "sg".to_string(),
            role: "role".to_string(),
            user_data,
            min_size: 1,
            max_size: 1,
            scaling_policies: vec![
                ScalingPolicy {
                    name: "CpuScaling".to_string(),
                    target: ScalingTarget::CpuUtilization { percent: 40 },
                },
                ScalingPolicy {
                    name: "AModestLoad".to_string(),
                    target: ScalingTarget::RequestsPerMinute { count: 1 },
                },
            ],
        }
    }

    #[test]
    fn test_group_fragment_wiring() {
        let all = fragments("pool", &make_asg());
        let (_, group) = &all[0];
        assert_eq!(group["Type"], "AWS::AutoScaling::AutoScalingGroup");
        assert_eq!(group["Properties"]["InstanceType"], "t3a.micro");
        assert_eq!(group["Properties"]["MachineImage"], "amazon-linux");
        assert_eq!(group["Properties"]["SecurityGroups"][0]["Ref"], "sg");
        assert_eq!(group["Properties"]["Role"]["Ref"], "role");
        assert_eq!(group["Properties"]["MinSize"], 1);
        assert_eq!(group["Properties"]["MaxSize"], 1);
    }

    #[test]
    fn test_user_data_base64() {
        let all = fragments("pool", &make_asg());
        let encoded = all[0].1["Properties"]["UserData"].as_str().unwrap();
        let decoded = BASE64.decode(encoded).unwrap();
        assert_eq!(
            String::from_utf8(decoded).unwrap(),
            "#!/bin/bash\necho boot\n"
        );
    }

    #[test]
    fn test_one_fragment_per_scaling_policy() {
        let all = fragments("pool", &make_asg());
        assert_eq!(all.len(), 3);
        assert_eq!(all[1].0, "poolCpuScaling");
        assert_eq!(all[2].0, "poolAModestLoad");
    }

    #[test]
    fn test_cpu_policy_fragment() {
        let all = fragments("pool", &make_asg());
        let cpu = &all[1].1;
        assert_eq!(cpu["Type"], "AWS::AutoScaling::ScalingPolicy");
        assert_eq!(cpu["Properties"]["AutoScalingGroupName"]["Ref"], "pool");
        let tracking = &cpu["Properties"]["TargetTrackingConfiguration"];
        assert_eq!(
            tracking["PredefinedMetricSpecification"]["PredefinedMetricType"],
            "ASGAverageCPUUtilization"
        );
        assert_eq!(tracking["TargetValue"], 40);
    }

    #[test]
    fn test_request_policy_fragment() {
        let all = fragments("pool", &make_asg());
        let requests = &all[2].1;
        let tracking = &requests["Properties"]["TargetTrackingConfiguration"];
        assert_eq!(
            tracking["PredefinedMetricSpecification"]["PredefinedMetricType"],
            "ALBRequestCountPerTarget"
        );
        assert_eq!(tracking["TargetValue"], 1);
    }

    #[test]
    fn test_no_policies_single_fragment() {
        let mut asg = make_asg();
        asg.scaling_policies.clear();
        let all = fragments("pool", &asg);
        assert_eq!(all.len(), 1);
    }
}
