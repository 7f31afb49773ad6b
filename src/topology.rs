//! The load-balanced topology this crate exists to declare.
//!
//! One VPC, one internet-facing application load balancer with a TCP/80
//! listener open to the world, a locked-down security group, an S3-read
//! role, and a t3a.micro autoscaling pool with CPU and request-count
//! scaling. All parameters are fixed literals; there is no runtime input.

use crate::graph::builder::{AsgOptions, TopologyBuilder};
use crate::graph::types::{
    InstanceClass, InstanceSize, MachineImage, PolicyStatement, Protocol, Topology, UserData,
};

const S3_BUCKET_NAME: &str = "cdk-alb-test-s3-bucket";

/// Build the full load-balancer topology.
pub fn load_balancer_topology() -> Result<Topology, String> {
    let mut b = TopologyBuilder::new("load-balancer-stack")
        .description("Load-balanced autoscaling pool behind a public ALB");

    let vpc = b.default_vpc("VPC")?;

    let lb = b.load_balancer("LB", &vpc, true)?;

    // Boot-time copy from S3. The command line ships without a copy verb;
    // the bootstrap contract is "run this literal command", so it is
    // carried as-is rather than repaired.
    let mut user_data = UserData::for_linux();
    user_data.add_command(format!(
        "s3://{}/testFile.txt /home/ec2-user/myfile.txt",
        S3_BUCKET_NAME
    ));

    let role = b.role("MyRole", "sns.amazonaws.com")?;
    b.add_to_policy(
        &role,
        PolicyStatement {
            resources: vec!["arn:aws:s3:::cdk-alb-test/*".to_string()],
            actions: vec!["s3:GetObject".to_string()],
        },
    )?;

    let sg = b.security_group("instanceSg", &vpc, false)?;
    b.allow_from_load_balancer(&sg, &lb, Protocol::Tcp, 80, "Load balancer to target")?;
    b.allow_egress(&sg, "0.0.0.0/0", Protocol::Tcp, 443, None)?;
    for port in [5432, 6379, 12001] {
        b.allow_egress(&sg, "0.0.0.0/0", Protocol::Tcp, port, Some("Add additional ports"))?;
    }

    let asg = b.autoscaling_group(
        "ASG",
        &vpc,
        &sg,
        &role,
        AsgOptions {
            instance_class: InstanceClass::T3a,
            instance_size: InstanceSize::Micro,
            machine_image: MachineImage::AmazonLinux,
            user_data,
            min_size: 1,
            max_size: 1,
        },
    )?;

    // Scale out when average CPU exceeds 40%
    b.scale_on_cpu_utilization(&asg, "CpuScaling", 40)?;

    let listener = b.listener("Listener", &lb, Protocol::Tcp, 80)?;
    b.add_target(&listener, 80, &asg)?;
    b.open_to_world(&listener)?;

    b.scale_on_request_count(&asg, "AModestLoad", 1)?;

    Ok(b.build())
}
