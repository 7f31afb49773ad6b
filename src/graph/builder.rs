//! Topology construction with declare-before-reference enforcement.
//!
//! The builder hands out typed id handles only when the corresponding
//! resource is declared, so wiring can never point at an undeclared
//! resource and the resulting graph is acyclic by construction. Misuse
//! (duplicate logical ids, rules on a missing group) is a programming
//! error surfaced as `Err`, never a panic.

use super::types::*;
use indexmap::IndexMap;

macro_rules! typed_id {
    ($name:ident) => {
        /// Handle proving the resource has been declared.
        #[derive(Debug, Clone)]
        pub struct $name(String);

        impl $name {
            pub fn logical_id(&self) -> &str {
                &self.0
            }
        }
    };
}

typed_id!(VpcId);
typed_id!(LoadBalancerId);
typed_id!(SecurityGroupId);
typed_id!(RoleId);
typed_id!(AsgId);
typed_id!(ListenerId);

/// Non-reference knobs of an autoscaling group declaration.
#[derive(Debug, Clone)]
pub struct AsgOptions {
    pub instance_class: InstanceClass,
    pub instance_size: InstanceSize,
    pub machine_image: MachineImage,
    pub user_data: UserData,
    pub min_size: u32,
    pub max_size: u32,
}

impl Default for AsgOptions {
    fn default() -> Self {
        Self {
            instance_class: InstanceClass::T3,
            instance_size: InstanceSize::Micro,
            machine_image: MachineImage::AmazonLinux,
            user_data: UserData::for_linux(),
            min_size: 1,
            max_size: 1,
        }
    }
}

/// Incremental topology builder.
#[derive(Debug, Clone)]
pub struct TopologyBuilder {
    name: String,
    description: Option<String>,
    resources: IndexMap<String, ResourceSpec>,
}

impl TopologyBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            resources: IndexMap::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn insert(&mut self, id: &str, spec: ResourceSpec) -> Result<(), String> {
        if self.resources.contains_key(id) {
            return Err(format!("logical id '{}' declared twice", id));
        }
        self.resources.insert(id.to_string(), spec);
        Ok(())
    }

    /// Declare the network. Everything else is declared inside one.
    pub fn vpc(&mut self, id: &str, cidr: &str) -> Result<VpcId, String> {
        self.insert(
            id,
            ResourceSpec::Vpc(Vpc {
                cidr: cidr.to_string(),
            }),
        )?;
        Ok(VpcId(id.to_string()))
    }

    /// Declare the network with the default CIDR.
    pub fn default_vpc(&mut self, id: &str) -> Result<VpcId, String> {
        self.insert(id, ResourceSpec::Vpc(Vpc::default()))?;
        Ok(VpcId(id.to_string()))
    }

    pub fn load_balancer(
        &mut self,
        id: &str,
        vpc: &VpcId,
        internet_facing: bool,
    ) -> Result<LoadBalancerId, String> {
        self.insert(
            id,
            ResourceSpec::LoadBalancer(LoadBalancer {
                vpc: vpc.0.clone(),
                internet_facing,
            }),
        )?;
        Ok(LoadBalancerId(id.to_string()))
    }

    pub fn security_group(
        &mut self,
        id: &str,
        vpc: &VpcId,
        allow_all_outbound: bool,
    ) -> Result<SecurityGroupId, String> {
        self.insert(
            id,
            ResourceSpec::SecurityGroup(SecurityGroup {
                vpc: vpc.0.clone(),
                allow_all_outbound,
                ingress: Vec::new(),
                egress: Vec::new(),
            }),
        )?;
        Ok(SecurityGroupId(id.to_string()))
    }

    fn security_group_mut(&mut self, sg: &SecurityGroupId) -> Result<&mut SecurityGroup, String> {
        match self.resources.get_mut(&sg.0) {
            Some(ResourceSpec::SecurityGroup(group)) => Ok(group),
            _ => Err(format!("'{}' is not a declared security group", sg.0)),
        }
    }

    /// Allow inbound traffic to the group from a declared load balancer.
    pub fn allow_from_load_balancer(
        &mut self,
        sg: &SecurityGroupId,
        lb: &LoadBalancerId,
        protocol: Protocol,
        port: u16,
        description: &str,
    ) -> Result<(), String> {
        let peer = Peer::Resource(lb.0.clone());
        let group = self.security_group_mut(sg)?;
        group.ingress.push(IngressRule {
            peer,
            protocol,
            port,
            description: Some(description.to_string()),
        });
        Ok(())
    }

    /// Allow one outbound flow from the group.
    pub fn allow_egress(
        &mut self,
        sg: &SecurityGroupId,
        cidr: &str,
        protocol: Protocol,
        port: u16,
        description: Option<&str>,
    ) -> Result<(), String> {
        let group = self.security_group_mut(sg)?;
        group.egress.push(EgressRule {
            cidr: cidr.to_string(),
            protocol,
            port,
            description: description.map(|d| d.to_string()),
        });
        Ok(())
    }

    pub fn role(&mut self, id: &str, assumed_by: &str) -> Result<RoleId, String> {
        self.insert(
            id,
            ResourceSpec::Role(Role {
                assumed_by: assumed_by.to_string(),
                statements: Vec::new(),
            }),
        )?;
        Ok(RoleId(id.to_string()))
    }

    /// Attach a permission grant to a declared role.
    pub fn add_to_policy(
        &mut self,
        role: &RoleId,
        statement: PolicyStatement,
    ) -> Result<(), String> {
        match self.resources.get_mut(&role.0) {
            Some(ResourceSpec::Role(r)) => {
                r.statements.push(statement);
                Ok(())
            }
            _ => Err(format!("'{}' is not a declared role", role.0)),
        }
    }

    pub fn autoscaling_group(
        &mut self,
        id: &str,
        vpc: &VpcId,
        security_group: &SecurityGroupId,
        role: &RoleId,
        options: AsgOptions,
    ) -> Result<AsgId, String> {
        self.insert(
            id,
            ResourceSpec::AutoScalingGroup(AutoScalingGroup {
                vpc: vpc.0.clone(),
                instance_class: options.instance_class,
                instance_size: options.instance_size,
                machine_image: options.machine_image,
                security_group: security_group.0.clone(),
                role: role.0.clone(),
                user_data: options.user_data,
                min_size: options.min_size,
                max_size: options.max_size,
                scaling_policies: Vec::new(),
            }),
        )?;
        Ok(AsgId(id.to_string()))
    }

    fn autoscaling_group_mut(&mut self, asg: &AsgId) -> Result<&mut AutoScalingGroup, String> {
        match self.resources.get_mut(&asg.0) {
            Some(ResourceSpec::AutoScalingGroup(group)) => Ok(group),
            _ => Err(format!("'{}' is not a declared autoscaling group", asg.0)),
        }
    }

    /// Track average CPU utilization toward a target percentage.
    pub fn scale_on_cpu_utilization(
        &mut self,
        asg: &AsgId,
        name: &str,
        percent: u32,
    ) -> Result<(), String> {
        let group = self.autoscaling_group_mut(asg)?;
        group.scaling_policies.push(ScalingPolicy {
            name: name.to_string(),
            target: ScalingTarget::CpuUtilization { percent },
        });
        Ok(())
    }

    /// Track request count toward a target per minute.
    pub fn scale_on_request_count(
        &mut self,
        asg: &AsgId,
        name: &str,
        per_minute: u32,
    ) -> Result<(), String> {
        let group = self.autoscaling_group_mut(asg)?;
        group.scaling_policies.push(ScalingPolicy {
            name: name.to_string(),
            target: ScalingTarget::RequestsPerMinute { count: per_minute },
        });
        Ok(())
    }

    pub fn listener(
        &mut self,
        id: &str,
        lb: &LoadBalancerId,
        protocol: Protocol,
        port: u16,
    ) -> Result<ListenerId, String> {
        self.insert(
            id,
            ResourceSpec::Listener(Listener {
                load_balancer: lb.0.clone(),
                protocol,
                port,
                target: None,
                open_to_world: false,
            }),
        )?;
        Ok(ListenerId(id.to_string()))
    }

    fn listener_mut(&mut self, listener: &ListenerId) -> Result<&mut Listener, String> {
        match self.resources.get_mut(&listener.0) {
            Some(ResourceSpec::Listener(l)) => Ok(l),
            _ => Err(format!("'{}' is not a declared listener", listener.0)),
        }
    }

    /// Register a declared autoscaling group as the listener's target.
    pub fn add_target(
        &mut self,
        listener: &ListenerId,
        port: u16,
        asg: &AsgId,
    ) -> Result<(), String> {
        let target = TargetBinding {
            port,
            autoscaling_group: asg.0.clone(),
        };
        let l = self.listener_mut(listener)?;
        if l.target.is_some() {
            return Err(format!("listener '{}' already has a target", listener.0));
        }
        l.target = Some(target);
        Ok(())
    }

    /// Allow the listener's default port from any IPv4 source.
    pub fn open_to_world(&mut self, listener: &ListenerId) -> Result<(), String> {
        self.listener_mut(listener)?.open_to_world = true;
        Ok(())
    }

    pub fn build(self) -> Topology {
        Topology {
            name: self.name,
            description: self.description,
            resources: self.resources,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wired_builder() -> TopologyBuilder {
        let mut b = TopologyBuilder::new("test");
        let vpc = b.default_vpc("net").unwrap();
        let lb = b.load_balancer("lb", &vpc, true).unwrap();
        let sg = b.security_group("sg", &vpc, false).unwrap();
        b.allow_from_load_balancer(&sg, &lb, Protocol::Tcp, 80, "lb to pool")
            .unwrap();
        b
    }

    #[test]
    fn test_declaration_order_preserved() {
        let topology = wired_builder().build();
        let ids: Vec<_> = topology.resources.keys().collect();
        assert_eq!(ids, vec!["net", "lb", "sg"]);
    }

    #[test]
    fn test_duplicate_logical_id_rejected() {
        let mut b = TopologyBuilder::new("test");
        b.default_vpc("net").unwrap();
        let err = b.default_vpc("net").unwrap_err();
        assert!(err.contains("declared twice"));
    }

    #[test]
    fn test_ingress_rule_lands_on_group() {
        let topology = wired_builder().build();
        match topology.get("sg").unwrap() {
            ResourceSpec::SecurityGroup(sg) => {
                assert_eq!(sg.ingress.len(), 1);
                assert_eq!(sg.ingress[0].peer, Peer::Resource("lb".to_string()));
                assert_eq!(sg.ingress[0].port, 80);
            }
            other => panic!("unexpected resource: {:?}", other),
        }
    }

    #[test]
    fn test_egress_rules_accumulate() {
        let mut b = TopologyBuilder::new("test");
        let vpc = b.default_vpc("net").unwrap();
        let sg = b.security_group("sg", &vpc, false).unwrap();
        b.allow_egress(&sg, "0.0.0.0/0", Protocol::Tcp, 443, None)
            .unwrap();
        b.allow_egress(&sg, "0.0.0.0/0", Protocol::Tcp, 5432, Some("db"))
            .unwrap();
        let topology = b.build();
        match topology.get("sg").unwrap() {
            ResourceSpec::SecurityGroup(sg) => {
                let ports: Vec<u16> = sg.egress.iter().map(|r| r.port).collect();
                assert_eq!(ports, vec![443, 5432]);
            }
            other => panic!("unexpected resource: {:?}", other),
        }
    }

    #[test]
    fn test_role_policy_attachment() {
        let mut b = TopologyBuilder::new("test");
        let role = b.role("role", "sns.amazonaws.com").unwrap();
        b.add_to_policy(
            &role,
            PolicyStatement {
                resources: vec!["arn:aws:s3:::bucket/*".to_string()],
                actions: vec!["s3:GetObject".to_string()],
            },
        )
        .unwrap();
        let topology = b.build();
        match topology.get("role").unwrap() {
            ResourceSpec::Role(r) => {
                assert_eq!(r.assumed_by, "sns.amazonaws.com");
                assert_eq!(r.statements.len(), 1);
            }
            other => panic!("unexpected resource: {:?}", other),
        }
    }

    #[test]
    fn test_asg_wiring_and_scaling() {
        let mut b = TopologyBuilder::new("test");
        let vpc = b.default_vpc("net").unwrap();
        let sg = b.security_group("sg", &vpc, false).unwrap();
        let role = b.role("role", "sns.amazonaws.com").unwrap();
        let asg = b
            .autoscaling_group("pool", &vpc, &sg, &role, AsgOptions::default())
            .unwrap();
        b.scale_on_cpu_utilization(&asg, "CpuScaling", 40).unwrap();
        b.scale_on_request_count(&asg, "AModestLoad", 1).unwrap();
        let topology = b.build();
        match topology.get("pool").unwrap() {
            ResourceSpec::AutoScalingGroup(g) => {
                assert_eq!(g.security_group, "sg");
                assert_eq!(g.role, "role");
                assert_eq!(g.scaling_policies.len(), 2);
            }
            other => panic!("unexpected resource: {:?}", other),
        }
    }

    #[test]
    fn test_listener_single_target() {
        let mut b = TopologyBuilder::new("test");
        let vpc = b.default_vpc("net").unwrap();
        let lb = b.load_balancer("lb", &vpc, true).unwrap();
        let sg = b.security_group("sg", &vpc, false).unwrap();
        let role = b.role("role", "sns.amazonaws.com").unwrap();
        let asg = b
            .autoscaling_group("pool", &vpc, &sg, &role, AsgOptions::default())
            .unwrap();
        let listener = b.listener("http", &lb, Protocol::Tcp, 80).unwrap();
        b.add_target(&listener, 80, &asg).unwrap();
        let err = b.add_target(&listener, 80, &asg).unwrap_err();
        assert!(err.contains("already has a target"));
    }

    #[test]
    fn test_open_to_world_flag() {
        let mut b = TopologyBuilder::new("test");
        let vpc = b.default_vpc("net").unwrap();
        let lb = b.load_balancer("lb", &vpc, true).unwrap();
        let listener = b.listener("http", &lb, Protocol::Tcp, 80).unwrap();
        b.open_to_world(&listener).unwrap();
        let topology = b.build();
        match topology.get("http").unwrap() {
            ResourceSpec::Listener(l) => assert!(l.open_to_world),
            other => panic!("unexpected resource: {:?}", other),
        }
    }

    #[test]
    fn test_rule_on_unknown_group_rejected() {
        let mut b = TopologyBuilder::new("test");
        let vpc = b.default_vpc("net").unwrap();
        let lb = b.load_balancer("lb", &vpc, true).unwrap();
        // Handle from a different builder names a resource this one lacks
        let mut other = TopologyBuilder::new("other");
        let vpc2 = other.default_vpc("net2").unwrap();
        let sg = other.security_group("ghost", &vpc2, false).unwrap();
        let err = b
            .allow_from_load_balancer(&sg, &lb, Protocol::Tcp, 80, "x")
            .unwrap_err();
        assert!(err.contains("not a declared security group"));
    }

    #[test]
    fn test_builder_description() {
        let topology = TopologyBuilder::new("t").description("a stack").build();
        assert_eq!(topology.description.as_deref(), Some("a stack"));
    }
}
