//! Keyspace module - reserved prefixes and key construction
//!
//! The durable tier is a single flat key space. Namespaces are carved out by
//! string prefix, and collisions are made impossible by construction: normal
//! entry keys are built from a `{domain}:{operation}:{params}` template whose
//! domain component is rejected if it matches a reserved prefix.

/// Prefix for archival pointers (`cold-index:{originalKey}`)
pub const COLD_INDEX_PREFIX: &str = "cold-index:";

/// Prefix for inbound rate-limit counters (`ratelimit:{identity}`)
pub const RATE_LIMIT_PREFIX: &str = "ratelimit:";

/// Prefix for configuration entries, never touched by the archival sweep
pub const CONFIG_PREFIX: &str = "config:";

/// All reserved prefixes, in sweep-exclusion order
pub const RESERVED_PREFIXES: [&str; 3] = [COLD_INDEX_PREFIX, RATE_LIMIT_PREFIX, CONFIG_PREFIX];

/// Whether a key lives under a reserved namespace
///
/// Reserved keys are excluded from archival candidate selection and must
/// never be produced by [`entry_key`].
pub fn is_reserved(key: &str) -> bool {
    RESERVED_PREFIXES.iter().any(|p| key.starts_with(p))
}

/// Build a normal cache key: `{domain}:{operation}:{normalized-params}`
///
/// Returns `None` if the domain would collide with a reserved namespace.
///
/// # Examples
///
/// ```
/// use stacks_domain::keyspace;
///
/// let key = keyspace::entry_key("books", "lookup", "isbn=9780141439518").unwrap();
/// assert_eq!(key, "books:lookup:isbn=9780141439518");
/// assert!(keyspace::entry_key("cold-index", "lookup", "x").is_none());
/// ```
pub fn entry_key(domain: &str, operation: &str, params: &str) -> Option<String> {
    let key = format!("{}:{}:{}", domain, operation, params);
    if is_reserved(&key) {
        return None;
    }
    Some(key)
}

/// Build the cold-index key for an original entry key
pub fn cold_index_key(original_key: &str) -> String {
    format!("{}{}", COLD_INDEX_PREFIX, original_key)
}

/// Recover the original entry key from a cold-index key
pub fn original_key(cold_index_key: &str) -> Option<&str> {
    cold_index_key.strip_prefix(COLD_INDEX_PREFIX)
}

/// Build the rate-limit counter key for a caller identity
pub fn rate_limit_key(identity: &str) -> String {
    format!("{}{}", RATE_LIMIT_PREFIX, identity)
}

/// Sanitize a key for use as an archival path component
///
/// Replaces every character outside `[A-Za-z0-9._-]` with `-` so the result
/// is safe in an object-storage path regardless of what the original key
/// contained.
pub fn sanitize(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}
