//! Topology entity model.
//!
//! Every resource the declaration can contain, as immutable value structs.
//! All types derive Serialize/Deserialize so the graph itself, not just the
//! synthesized template, can be dumped and diffed.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Topology
// ============================================================================

/// A complete, fully-wired resource graph — the unit handed to synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    /// Human-readable stack name
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Resource declarations, keyed by logical id (declaration-ordered)
    pub resources: IndexMap<String, ResourceSpec>,
}

impl Topology {
    /// Count resources of a given kind.
    pub fn count_kind(&self, kind: ResourceKind) -> usize {
        self.resources.values().filter(|r| r.kind() == kind).count()
    }

    /// Look up a resource by logical id.
    pub fn get(&self, id: &str) -> Option<&ResourceSpec> {
        self.resources.get(id)
    }
}

// ============================================================================
// Resources
// ============================================================================

/// A single declared resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResourceSpec {
    Vpc(Vpc),
    LoadBalancer(LoadBalancer),
    Listener(Listener),
    SecurityGroup(SecurityGroup),
    Role(Role),
    AutoScalingGroup(AutoScalingGroup),
}

impl ResourceSpec {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Vpc(_) => ResourceKind::Vpc,
            Self::LoadBalancer(_) => ResourceKind::LoadBalancer,
            Self::Listener(_) => ResourceKind::Listener,
            Self::SecurityGroup(_) => ResourceKind::SecurityGroup,
            Self::Role(_) => ResourceKind::Role,
            Self::AutoScalingGroup(_) => ResourceKind::AutoScalingGroup,
        }
    }

    /// Every logical id this resource points at, with the kind the wiring
    /// expects there (None for peers, which may reference any resource).
    pub fn references(&self) -> Vec<(String, Option<ResourceKind>)> {
        match self {
            Self::Vpc(_) => Vec::new(),
            Self::LoadBalancer(lb) => vec![(lb.vpc.clone(), Some(ResourceKind::Vpc))],
            Self::Listener(l) => {
                let mut refs = vec![(
                    l.load_balancer.clone(),
                    Some(ResourceKind::LoadBalancer),
                )];
                if let Some(ref target) = l.target {
                    refs.push((
                        target.autoscaling_group.clone(),
                        Some(ResourceKind::AutoScalingGroup),
                    ));
                }
                refs
            }
            Self::SecurityGroup(sg) => {
                let mut refs = vec![(sg.vpc.clone(), Some(ResourceKind::Vpc))];
                for rule in &sg.ingress {
                    if let Peer::Resource(ref id) = rule.peer {
                        refs.push((id.clone(), None));
                    }
                }
                refs
            }
            Self::Role(_) => Vec::new(),
            Self::AutoScalingGroup(asg) => vec![
                (asg.vpc.clone(), Some(ResourceKind::Vpc)),
                (asg.security_group.clone(), Some(ResourceKind::SecurityGroup)),
                (asg.role.clone(), Some(ResourceKind::Role)),
            ],
        }
    }
}

/// Resource kind enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Vpc,
    LoadBalancer,
    Listener,
    SecurityGroup,
    Role,
    AutoScalingGroup,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vpc => write!(f, "vpc"),
            Self::LoadBalancer => write!(f, "load_balancer"),
            Self::Listener => write!(f, "listener"),
            Self::SecurityGroup => write!(f, "security_group"),
            Self::Role => write!(f, "role"),
            Self::AutoScalingGroup => write!(f, "auto_scaling_group"),
        }
    }
}

// ============================================================================
// Network
// ============================================================================

/// Isolated virtual network — everything else lives inside one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vpc {
    /// IPv4 CIDR block
    pub cidr: String,
}

impl Default for Vpc {
    fn default() -> Self {
        Self {
            cidr: "10.0.0.0/16".to_string(),
        }
    }
}

/// Public traffic entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadBalancer {
    /// Containing VPC (logical id)
    pub vpc: String,

    /// Reachable from the public internet
    pub internet_facing: bool,
}

/// Port + protocol a load balancer accepts traffic on, plus the pool it
/// forwards to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listener {
    /// Owning load balancer (logical id)
    pub load_balancer: String,

    pub protocol: Protocol,
    pub port: u16,

    /// Forwarding target
    #[serde(default)]
    pub target: Option<TargetBinding>,

    /// Allow the default port from any IPv4 source
    #[serde(default)]
    pub open_to_world: bool,
}

/// Listener → compute pool binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetBinding {
    pub port: u16,

    /// Target pool (logical id)
    pub autoscaling_group: String,
}

/// IP protocol for firewall rules and listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Udp => write!(f, "udp"),
        }
    }
}

// ============================================================================
// Security group
// ============================================================================

/// Stateful firewall attached to compute instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityGroup {
    /// Containing VPC (logical id)
    pub vpc: String,

    /// When false, only explicitly listed egress rules apply
    pub allow_all_outbound: bool,

    #[serde(default)]
    pub ingress: Vec<IngressRule>,

    #[serde(default)]
    pub egress: Vec<EgressRule>,
}

/// One allowed inbound flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngressRule {
    pub peer: Peer,
    pub protocol: Protocol,
    pub port: u16,

    #[serde(default)]
    pub description: Option<String>,
}

/// One allowed outbound flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EgressRule {
    /// Destination CIDR
    pub cidr: String,

    pub protocol: Protocol,
    pub port: u16,

    #[serde(default)]
    pub description: Option<String>,
}

/// Traffic source for an ingress rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Peer {
    /// 0.0.0.0/0
    AnyIpv4,

    /// A literal CIDR block
    Ipv4(String),

    /// Another declared resource (logical id), e.g. the load balancer
    Resource(String),
}

// ============================================================================
// Identity
// ============================================================================

/// Assumable identity attached to the compute pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    /// Trusted service principal, e.g. "sns.amazonaws.com"
    pub assumed_by: String,

    #[serde(default)]
    pub statements: Vec<PolicyStatement>,
}

/// A permission grant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyStatement {
    /// Resource ARN patterns
    pub resources: Vec<String>,

    /// Allowed actions
    pub actions: Vec<String>,
}

// ============================================================================
// Autoscaling
// ============================================================================

/// Elastic pool of compute instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoScalingGroup {
    /// Containing VPC (logical id)
    pub vpc: String,

    pub instance_class: InstanceClass,
    pub instance_size: InstanceSize,
    pub machine_image: MachineImage,

    /// Attached firewall (logical id)
    pub security_group: String,

    /// Attached identity (logical id)
    pub role: String,

    pub user_data: UserData,

    #[serde(default = "default_pool_size")]
    pub min_size: u32,

    #[serde(default = "default_pool_size")]
    pub max_size: u32,

    /// Policies adjusting the pool size (owned, not top-level graph nodes)
    #[serde(default)]
    pub scaling_policies: Vec<ScalingPolicy>,
}

fn default_pool_size() -> u32 {
    1
}

impl AutoScalingGroup {
    /// Combined instance type string, e.g. "t3a.micro".
    pub fn instance_type(&self) -> String {
        format!("{}.{}", self.instance_class, self.instance_size)
    }
}

/// Instance class (the family half of an instance type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceClass {
    T3,
    T3a,
    M5,
    C5,
}

impl fmt::Display for InstanceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::T3 => write!(f, "t3"),
            Self::T3a => write!(f, "t3a"),
            Self::M5 => write!(f, "m5"),
            Self::C5 => write!(f, "c5"),
        }
    }
}

impl std::str::FromStr for InstanceClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "t3" => Ok(Self::T3),
            "t3a" => Ok(Self::T3a),
            "m5" => Ok(Self::M5),
            "c5" => Ok(Self::C5),
            other => Err(format!("unknown instance class: {}", other)),
        }
    }
}

/// Instance size (the sizing half of an instance type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceSize {
    Micro,
    Small,
    Medium,
    Large,
}

impl fmt::Display for InstanceSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Micro => write!(f, "micro"),
            Self::Small => write!(f, "small"),
            Self::Medium => write!(f, "medium"),
            Self::Large => write!(f, "large"),
        }
    }
}

impl std::str::FromStr for InstanceSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "micro" => Ok(Self::Micro),
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            other => Err(format!("unknown instance size: {}", other)),
        }
    }
}

/// Machine image the pool boots from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MachineImage {
    AmazonLinux,
}

impl fmt::Display for MachineImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AmazonLinux => write!(f, "amazon-linux"),
        }
    }
}

/// Boot-time script, emitted into the template verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    pub commands: Vec<String>,
}

impl UserData {
    /// Empty Linux user data.
    pub fn for_linux() -> Self {
        Self::default()
    }

    /// Append one command line, unmodified.
    pub fn add_command(&mut self, command: impl Into<String>) {
        self.commands.push(command.into());
    }

    /// Render the full boot script.
    pub fn to_script(&self) -> String {
        let mut script = String::from("#!/bin/bash\n");
        for command in &self.commands {
            script.push_str(command);
            script.push('\n');
        }
        script
    }
}

/// Rule adjusting the pool size toward a metric target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingPolicy {
    /// Policy name, unique within its group
    pub name: String,

    pub target: ScalingTarget,
}

/// The metric a scaling policy tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "metric", rename_all = "snake_case")]
pub enum ScalingTarget {
    CpuUtilization { percent: u32 },
    RequestsPerMinute { count: u32 },
}
