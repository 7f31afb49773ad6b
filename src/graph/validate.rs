//! Synthesis-time validation.
//!
//! Structural constraints checked before any rendering happens:
//! - CIDR literals are well-formed IPv4 blocks
//! - ports are non-zero
//! - references resolve, match the expected kind, and point backwards
//!   (a resource may only reference one declared before it)
//! - scaling targets are in range
//! - every listener forwards somewhere

use super::types::*;

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ValidationError {
    fn new(message: String) -> Self {
        Self { message }
    }
}

/// Check an IPv4 CIDR literal like "10.0.0.0/16".
///
/// Only plain decimal digits are accepted: `u8::from_str` also takes a
/// leading `+` and leading zeros, which are not valid in dotted-quad
/// notation.
pub fn check_cidr(cidr: &str) -> Result<(), String> {
    let (addr, prefix) = cidr
        .split_once('/')
        .ok_or_else(|| format!("'{}' is not CIDR notation (missing /prefix)", cidr))?;

    let octets: Vec<&str> = addr.split('.').collect();
    if octets.len() != 4 {
        return Err(format!("'{}' does not have four octets", cidr));
    }
    for octet in octets {
        parse_decimal(octet, 255)
            .map_err(|_| format!("'{}' has an invalid octet '{}'", cidr, octet))?;
    }

    parse_decimal(prefix, 32)
        .map_err(|_| format!("'{}' has an invalid prefix length '{}'", cidr, prefix))?;

    Ok(())
}

/// Parse a plain-decimal field (no sign, no leading zeros) up to `max`.
fn parse_decimal(field: &str, max: u32) -> Result<u32, ()> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(());
    }
    if field.len() > 1 && field.starts_with('0') {
        return Err(());
    }
    let value: u32 = field.parse().map_err(|_| ())?;
    if value > max {
        return Err(());
    }
    Ok(value)
}

/// Validate a topology. Returns a list of errors (empty = valid).
pub fn validate_topology(topology: &Topology) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if topology.name.is_empty() {
        errors.push(ValidationError::new("name must not be empty".to_string()));
    }

    for (position, (id, resource)) in topology.resources.iter().enumerate() {
        check_references(topology, position, id, resource, &mut errors);

        match resource {
            ResourceSpec::Vpc(vpc) => {
                if let Err(e) = check_cidr(&vpc.cidr) {
                    errors.push(ValidationError::new(format!("vpc '{}': {}", id, e)));
                }
            }
            ResourceSpec::LoadBalancer(_) => {}
            ResourceSpec::Listener(listener) => {
                check_port(id, "listener", listener.port, &mut errors);
                match listener.target {
                    Some(ref target) => check_port(id, "target", target.port, &mut errors),
                    None => errors.push(ValidationError::new(format!(
                        "listener '{}' has no target binding",
                        id
                    ))),
                }
            }
            ResourceSpec::SecurityGroup(sg) => {
                for rule in &sg.ingress {
                    check_port(id, "ingress rule", rule.port, &mut errors);
                    if let Peer::Ipv4(ref cidr) = rule.peer {
                        if let Err(e) = check_cidr(cidr) {
                            errors.push(ValidationError::new(format!(
                                "security group '{}' ingress: {}",
                                id, e
                            )));
                        }
                    }
                }
                for rule in &sg.egress {
                    check_port(id, "egress rule", rule.port, &mut errors);
                    if let Err(e) = check_cidr(&rule.cidr) {
                        errors.push(ValidationError::new(format!(
                            "security group '{}' egress: {}",
                            id, e
                        )));
                    }
                }
            }
            ResourceSpec::Role(role) => {
                if role.assumed_by.is_empty() {
                    errors.push(ValidationError::new(format!(
                        "role '{}' has no trusted principal",
                        id
                    )));
                }
                for statement in &role.statements {
                    if statement.actions.is_empty() {
                        errors.push(ValidationError::new(format!(
                            "role '{}' has a statement with no actions",
                            id
                        )));
                    }
                    if statement.resources.is_empty() {
                        errors.push(ValidationError::new(format!(
                            "role '{}' has a statement with no resources",
                            id
                        )));
                    }
                }
            }
            ResourceSpec::AutoScalingGroup(asg) => {
                if asg.min_size > asg.max_size {
                    errors.push(ValidationError::new(format!(
                        "autoscaling group '{}' has min_size {} > max_size {}",
                        id, asg.min_size, asg.max_size
                    )));
                }
                for policy in &asg.scaling_policies {
                    match policy.target {
                        ScalingTarget::CpuUtilization { percent } => {
                            if percent == 0 || percent > 100 {
                                errors.push(ValidationError::new(format!(
                                    "scaling policy '{}/{}' CPU target {} not in 1-100",
                                    id, policy.name, percent
                                )));
                            }
                        }
                        ScalingTarget::RequestsPerMinute { count } => {
                            if count == 0 {
                                errors.push(ValidationError::new(format!(
                                    "scaling policy '{}/{}' request target must be >= 1",
                                    id, policy.name
                                )));
                            }
                        }
                    }
                }
            }
        }
    }

    errors
}

fn check_port(id: &str, what: &str, port: u16, errors: &mut Vec<ValidationError>) {
    if port == 0 {
        errors.push(ValidationError::new(format!(
            "'{}' {} has port 0 (valid range 1-65535)",
            id, what
        )));
    }
}

fn check_references(
    topology: &Topology,
    position: usize,
    id: &str,
    resource: &ResourceSpec,
    errors: &mut Vec<ValidationError>,
) {
    for (referenced, expected_kind) in resource.references() {
        let Some(found_position) = topology.resources.get_index_of(&referenced) else {
            errors.push(ValidationError::new(format!(
                "resource '{}' references unknown resource '{}'",
                id, referenced
            )));
            continue;
        };
        if found_position > position {
            errors.push(ValidationError::new(format!(
                "resource '{}' references '{}' before it is declared",
                id, referenced
            )));
        }
        if let Some(expected) = expected_kind {
            let actual = topology.resources[&referenced].kind();
            if actual != expected {
                errors.push(ValidationError::new(format!(
                    "resource '{}' expects '{}' to be a {}, found {}",
                    id, referenced, expected, actual
                )));
            }
        }
    }
}
