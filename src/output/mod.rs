/// Output sinks: per-frequency CSV sheets, a JSON summary, and the
/// multi-panel profile plot. Everything here consumes a finished
/// `SampleResult`; nothing feeds back into the pipeline, and nothing is
/// written until the whole batch has been accepted.

pub mod plot;
pub mod table;

/// Keep artifact names filesystem-safe whatever the filename heuristics
/// extracted.
pub(crate) fn sanitize_component(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
