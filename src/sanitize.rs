//! Telemetry key sanitization.

/// Cleans up a snapshot key so downstream telemetry pipelines accept it.
///
/// Keeps ASCII letters, digits, `_`, and the `:`, `=`, `"` characters the
/// label rendering relies on; everything else becomes `_`.
pub(crate) fn sanitize_telemetry_name(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '=' | '"') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
