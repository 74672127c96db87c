//! Orchestrator utility functions

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Compute a short hash for a user request
///
/// Returns an 8-character hexadecimal hash used as a log correlation field
/// so the request text itself never reaches the logs.
pub fn hash_request(request: &str) -> String {
    let mut hasher = DefaultHasher::new();
    request.hash(&mut hasher);
    format!("{:016x}", hasher.finish())[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_request_is_short_and_stable() {
        let a = hash_request("Research new leads and add them to CRM.");
        assert_eq!(a.len(), 8);
        assert_eq!(a, hash_request("Research new leads and add them to CRM."));
        assert_ne!(a, hash_request("something else"));
    }
}
