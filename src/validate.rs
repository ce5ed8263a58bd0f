//! Validator. Rejects malformed input before it ever touches
//! Redis -- every public `SharQ` method calls these before assembling keys.

/// Identifiers (`queue_type`, `queue_id`, `job_id`) must be non-empty,
/// bounded in length, and drawn from a limited character set so that they
/// can be concatenated into colon-delimited Redis keys without escaping.
const MAX_IDENTIFIER_LEN: usize = 256;

/// The default floor below which `is_valid_interval` rejects a value. The
/// orchestrator may be configured with a higher floor; it never accepts a
/// lower one.
pub const DEFAULT_INTERVAL_FLOOR_MS: i64 = 1000;

const MAX_INTERVAL_MS: i64 = i32::MAX as i64;

/// `letters, digits, _, -` -- freeform but constrained enough to be a safe
/// Redis key component and a safe Lua string-concatenation operand.
pub fn is_valid_identifier(s: &str) -> bool {
    if s.is_empty() || s.len() > MAX_IDENTIFIER_LEN {
        return false;
    }
    s.bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// `interval` must be a positive integer, at least `floor_ms`, and small
/// enough to round-trip through Redis's signed 32-bit Lua number coercion.
pub fn is_valid_interval(interval_ms: i64, floor_ms: i64) -> bool {
    interval_ms >= floor_ms && interval_ms <= MAX_INTERVAL_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_identifiers() {
        assert!(is_valid_identifier("sms"));
        assert!(is_valid_identifier("q1"));
        assert!(is_valid_identifier("tenant_42"));
        assert!(is_valid_identifier("tenant-42"));
    }

    #[test]
    fn rejects_empty_identifier() {
        assert!(!is_valid_identifier(""));
    }

    #[test]
    fn rejects_identifier_with_colon() {
        // Colons would let an identifier forge adjacent key components.
        assert!(!is_valid_identifier("sms:q1"));
    }

    #[test]
    fn rejects_identifier_with_whitespace() {
        assert!(!is_valid_identifier("sms q1"));
    }

    #[test]
    fn rejects_overlong_identifier() {
        let s = "a".repeat(MAX_IDENTIFIER_LEN + 1);
        assert!(!is_valid_identifier(&s));
    }

    #[test]
    fn accepts_interval_at_floor() {
        assert!(is_valid_interval(1000, DEFAULT_INTERVAL_FLOOR_MS));
    }

    #[test]
    fn rejects_interval_below_floor() {
        assert!(!is_valid_interval(999, DEFAULT_INTERVAL_FLOOR_MS));
    }

    #[test]
    fn rejects_negative_interval() {
        assert!(!is_valid_interval(-1, DEFAULT_INTERVAL_FLOOR_MS));
    }

    #[test]
    fn rejects_interval_above_max() {
        assert!(!is_valid_interval(MAX_INTERVAL_MS + 1, DEFAULT_INTERVAL_FLOOR_MS));
    }
}
