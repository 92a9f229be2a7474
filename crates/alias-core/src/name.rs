//! DNS name normalization
//!
//! Zone names are always dot-terminated, and DNS names compare
//! case-insensitively.

/// Dot-terminate a name
pub fn fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{}.", name)
    }
}

/// Case-insensitive DNS name equality
pub fn names_match(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Fully-qualified alias name inside `zone_name`
///
/// Accepts a bare label ("test"), a partially qualified name
/// ("test.example.com") or a fully qualified one ("test.example.com.").
/// The zone suffix is appended only when the dot-terminated alias does not
/// already end with it, so it never appears twice.
pub fn alias_fqdn(alias: &str, zone_name: &str) -> String {
    let alias = fqdn(alias);
    let zone_name = fqdn(zone_name);

    if ends_with_ignore_case(&alias, &zone_name) {
        alias
    } else {
        format!("{}{}", alias, zone_name)
    }
}

fn ends_with_ignore_case(name: &str, suffix: &str) -> bool {
    name.len() >= suffix.len()
        && name.is_char_boundary(name.len() - suffix.len())
        && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}
