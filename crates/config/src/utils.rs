/// Parses a boolean the way configuration maps spell them.
pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "true" | "1" | "on" | "yes" => Some(true),
        "false" | "0" | "off" | "no" | "" => Some(false),
        _ => None,
    }
}
