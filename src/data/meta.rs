use std::path::Path;

use log::debug;

use super::model::{FileMeta, UNKNOWN};

// ---------------------------------------------------------------------------
// Filename metadata extraction
// ---------------------------------------------------------------------------

/// Pulls measurement metadata out of a file name.
///
/// Naming conventions differ between labs, so the pipeline only ever sees
/// this trait; a different convention is a different implementation, not a
/// parser change.
pub trait MetadataExtractor {
    fn extract(&self, path: &Path) -> FileMeta;
}

/// Default naming convention, e.g. `PX12_CV_A123_100kHz.txt`:
///
/// * frequency label – everything up to and including the frequency marker
///   (`PX12_CV_A123_100kHz`), or [`UNKNOWN`] when the marker is absent;
/// * sample id – first alphanumeric token between the sweep marker and the
///   numeric frequency (`A123`), or [`UNKNOWN`] when no such token exists.
///
/// Both markers are plain configurable strings; this is a best-effort
/// heuristic over filenames, not a fixed law.
#[derive(Debug, Clone)]
pub struct NamePattern {
    /// Marker that ends the frequency token, e.g. `kHz`.
    pub frequency_marker: String,
    /// Marker preceding the sample token, e.g. `CV`.
    pub sweep_marker: String,
}

impl Default for NamePattern {
    fn default() -> Self {
        Self {
            frequency_marker: "kHz".to_string(),
            sweep_marker: "CV".to_string(),
        }
    }
}

impl MetadataExtractor for NamePattern {
    fn extract(&self, path: &Path) -> FileMeta {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let frequency_label = match name.find(&self.frequency_marker) {
            Some(i) => name[..i + self.frequency_marker.len()].to_string(),
            None => UNKNOWN.to_string(),
        };

        let sample_id = self.sample_token(&name).unwrap_or_else(|| {
            debug!("{name}: no sample token found, using {UNKNOWN}");
            UNKNOWN.to_string()
        });

        FileMeta {
            path: path.to_path_buf(),
            frequency_label,
            sample_id,
        }
    }
}

impl NamePattern {
    /// First alphanumeric token after the sweep marker and before the digits
    /// of the frequency token.
    fn sample_token(&self, name: &str) -> Option<String> {
        let start = name.find(&self.sweep_marker)? + self.sweep_marker.len();
        let end = match name.find(&self.frequency_marker) {
            // Walk back over the numeric frequency immediately before the
            // marker so its digits never leak into the sample id.
            Some(marker) => name[..marker]
                .char_indices()
                .rev()
                .find(|(_, c)| !c.is_ascii_digit() && *c != '.')
                .map(|(i, c)| i + c.len_utf8())
                .unwrap_or(0),
            None => name.len(),
        };

        name.get(start..end)?
            .split(|c: char| !c.is_ascii_alphanumeric())
            .find(|token| !token.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(name: &str) -> FileMeta {
        NamePattern::default().extract(Path::new(name))
    }

    #[test]
    fn frequency_label_is_prefix_up_to_marker() {
        let meta = extract("PX12_CV_A123_100kHz.txt");
        assert_eq!(meta.frequency_label, "PX12_CV_A123_100kHz");
    }

    #[test]
    fn sample_id_sits_between_markers() {
        let meta = extract("PX12_CV_A123_100kHz.txt");
        assert_eq!(meta.sample_id, "A123");
    }

    #[test]
    fn missing_frequency_marker_yields_unknown() {
        let meta = extract("PX12_CV_A123_sweep.txt");
        assert_eq!(meta.frequency_label, UNKNOWN);
        // Without a frequency token the id still comes from after the marker.
        assert_eq!(meta.sample_id, "A123");
    }

    #[test]
    fn missing_sweep_marker_yields_unknown_sample() {
        let meta = extract("100kHz.txt");
        assert_eq!(meta.frequency_label, "100kHz");
        assert_eq!(meta.sample_id, UNKNOWN);
    }

    #[test]
    fn frequency_digits_do_not_become_the_sample_id() {
        let meta = extract("CV_100kHz.txt");
        assert_eq!(meta.sample_id, UNKNOWN);
    }

    #[test]
    fn custom_markers() {
        let pattern = NamePattern {
            frequency_marker: "MHz".to_string(),
            sweep_marker: "sweep".to_string(),
        };
        let meta = pattern.extract(Path::new("sweep-B7-1MHz.txt"));
        assert_eq!(meta.frequency_label, "sweep-B7-1MHz");
        assert_eq!(meta.sample_id, "B7");
    }
}
