//! Key to partition mapping compatible with the JVM hash-code partitioner.
//!
//! Clients on the JVM route a keyed message to
//! `abs(key.hashCode()) % partitions`. Reproducing that choice from Rust
//! requires hashing the key exactly like `java.lang.String#hashCode`, which
//! walks the UTF-16 code units of the string rather than its code points.
//!
//! ### Example
//! ```rust
//! assert_eq!(kt::prelude::partition_for("a", 12), 1);
//! assert_eq!(kt::prelude::partition_for("a", 0), -1);
//! ```

/// Returned by [`partition_for`] when no partition can be chosen.
pub const NO_PARTITION: i32 = -1;

/// Hash `s` the way `java.lang.String#hashCode` does.
///
/// Characters outside the Basic Multilingual Plane are encoded as a
/// surrogate pair and each half takes its own `* 31` step.
pub fn hash_code(s: &str) -> i32 {
    s.encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

/// `Math.abs` for ints as the JVM partitioner uses it, except that
/// `i32::MIN` maps to `0` instead of overflowing.
pub fn java_abs(i: i32) -> i32 {
    match i {
        i32::MIN => 0,
        i if i < 0 => -i,
        i => i,
    }
}

/// The partition a JVM producer's default partitioner picks for `key`.
///
/// Returns [`NO_PARTITION`] if `partition_count` is not positive.
pub fn partition_for(key: &str, partition_count: i32) -> i32 {
    if partition_count <= 0 {
        return NO_PARTITION;
    }

    java_abs(hash_code(key)) % partition_count
}
