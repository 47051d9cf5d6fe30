//! Office-network admission for attendance requests.
//!
//! Soft gate: it compares the caller's address against the configured office
//! address. The caller is responsible for the fail-open path when the policy
//! itself cannot be read.

/// Admission verdict; `reason` is human-readable and set on denial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl Admission {
    fn granted() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }
}

/// Private-range prefix eligible for the subnet heuristic. Client-visible
/// addresses on such networks keep the first three octets and vary the last.
const PRIVATE_PREFIX: &str = "192.168.";

/// Validate a request address against the configured office address.
///
/// Rule order: empty policy admits everything; the request address is
/// normalized from IPv4-mapped IPv6 form; exact match admits; two addresses
/// in the 192.168.0.0/16 range admit when their first three octets agree.
pub fn check_network(request_ip: &str, allowed_ip: &str) -> Admission {
    let allowed = allowed_ip.trim();
    if allowed.is_empty() {
        // No restriction configured.
        return Admission::granted();
    }

    let request = request_ip.trim();
    let request = request.strip_prefix("::ffff:").unwrap_or(request);

    if request == allowed {
        return Admission::granted();
    }

    if allowed.starts_with(PRIVATE_PREFIX) && request.starts_with(PRIVATE_PREFIX) {
        let same_subnet = allowed.split('.').take(3).eq(request.split('.').take(3));
        if same_subnet {
            return Admission::granted();
        }
    }

    Admission {
        allowed: false,
        reason: Some(format!(
            "IP Mismatch. Allowed Network: {allowed}, You are on: {request}"
        )),
    }
}
