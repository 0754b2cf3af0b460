//! Bypass list (non-proxy hosts) parsing.

/// Hosts a configuration can be seeded with before user additions.
pub const DEFAULT_NON_PROXY_HOSTS: [&str; 2] = ["127.0.0.1", "localhost"];

/// Split a comma-separated bypass list.
///
/// Entries are trimmed and kept in order. Duplicates are preserved and entries
/// that are empty after trimming (stray commas) are dropped.
pub fn parse_non_proxy_hosts(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalize already-split entries the same way [`parse_non_proxy_hosts`] does.
pub fn normalize_non_proxy_hosts<I, S>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    entries
        .into_iter()
        .filter_map(|entry| {
            let entry = entry.as_ref().trim();
            (!entry.is_empty()).then(|| entry.to_string())
        })
        .collect()
}

/// Render a bypass list back to its comma-separated form.
pub fn join_non_proxy_hosts(hosts: &[String]) -> String {
    hosts.join(",")
}

/// The default bypass entries as owned strings.
pub fn default_non_proxy_hosts() -> Vec<String> {
    DEFAULT_NON_PROXY_HOSTS.iter().map(|h| h.to_string()).collect()
}

/// Prepend the default entries that `hosts` does not already contain.
pub fn seed_default_non_proxy_hosts(mut hosts: Vec<String>) -> Vec<String> {
    let mut seeded: Vec<String> = DEFAULT_NON_PROXY_HOSTS
        .iter()
        .filter(|default| !hosts.iter().any(|h| h.as_str() == **default))
        .map(|default| default.to_string())
        .collect();
    seeded.append(&mut hosts);
    seeded
}
