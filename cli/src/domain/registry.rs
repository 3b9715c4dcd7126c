//! Server registry — pure mutations over the remote server-name list.
//!
//! The registry file is advisory bookkeeping, not the exclusion mechanism:
//! concurrent editors race through download-mutate-upload and the later
//! write wins. These functions only operate on the in-memory snapshot so
//! that the race-prone window stays at the explicit fetch/store boundary.

/// Append `name` unless it is already present. Returns whether it was added.
pub fn insert_name(names: &mut Vec<String>, name: &str) -> bool {
    if names.iter().any(|n| n == name) {
        return false;
    }
    names.push(name.to_owned());
    true
}

/// Remove `name` if present. Returns whether it was found.
pub fn remove_name(names: &mut Vec<String>, name: &str) -> bool {
    let before = names.len();
    names.retain(|n| n != name);
    names.len() != before
}
