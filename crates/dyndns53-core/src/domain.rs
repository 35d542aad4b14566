//! Hostname to zone derivation

/// Derive the zone domain of `hostname` by dropping its leftmost label
///
/// No label syntax is validated: a single-label hostname yields an empty
/// string, which then fails zone lookup at the provider.
///
/// ```
/// use dyndns53_core::derive_domain;
///
/// assert_eq!(derive_domain("a.b.example.com"), "b.example.com");
/// assert_eq!(derive_domain("host.com"), "com");
/// ```
pub fn derive_domain(hostname: &str) -> String {
    hostname
        .split('.')
        .skip(1)
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_leftmost_label() {
        assert_eq!(derive_domain("a.b.example.com"), "b.example.com");
        assert_eq!(derive_domain("host.example.com"), "example.com");
        assert_eq!(derive_domain("host.com"), "com");
    }

    #[test]
    fn malformed_hostnames_yield_malformed_domains() {
        assert_eq!(derive_domain("localhost"), "");
        assert_eq!(derive_domain(""), "");
        assert_eq!(derive_domain("host..com"), ".com");
        assert_eq!(derive_domain("host.example.com."), "example.com.");
    }
}
