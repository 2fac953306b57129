/// Wildcard input type that accepts any source.
pub const ANY_TYPE: &str = "ANY";

/// Decide whether an output of `source_type` may feed an input of `target_type`.
///
/// Rules, in order:
/// 1. an untyped side is compatible with anything
/// 2. identical types are compatible
/// 3. an `ANY` input accepts every source
/// 4. `INT` widens implicitly into `FLOAT`
///
/// Everything else is rejected.
pub fn are_types_compatible(source_type: Option<&str>, target_type: Option<&str>) -> bool {
    let (source, target) = match (source_type, target_type) {
        (Some(s), Some(t)) => (s, t),
        _ => return true,
    };

    source == target || target == ANY_TYPE || (source == "INT" && target == "FLOAT")
}
