use std::path::PathBuf;

// ---------------------------------------------------------------------------
// FileMeta – identity recovered from a measurement file's name
// ---------------------------------------------------------------------------

/// Placeholder for a frequency label or sample id the filename did not yield.
pub const UNKNOWN: &str = "Unknown";

/// Metadata recovered from a measurement file's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    pub path: PathBuf,
    /// Filename prefix up to and including the frequency marker, or [`UNKNOWN`].
    pub frequency_label: String,
    /// Device token between the sweep marker and the frequency digits, or [`UNKNOWN`].
    pub sample_id: String,
}

// ---------------------------------------------------------------------------
// SweepTable – one parsed C-V measurement
// ---------------------------------------------------------------------------

/// One retained line of a measurement file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepRow {
    pub voltage: f64,
    pub c_forward: f64,
    pub c_backward: f64,
}

/// An ordered C-V sweep. Rows keep file order – that is the sweep order,
/// and the numerical derivative downstream depends on it.
#[derive(Debug, Clone, Default)]
pub struct SweepTable {
    pub rows: Vec<SweepRow>,
}

impl SweepTable {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Voltage column in sweep order.
    pub fn voltages(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.voltage).collect()
    }

    /// Forward-sweep capacitance column.
    pub fn forward(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.c_forward).collect()
    }

    /// Backward-sweep capacitance column.
    pub fn backward(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.c_backward).collect()
    }
}

// ---------------------------------------------------------------------------
// Profile – depth/density sequences derived from one sweep
// ---------------------------------------------------------------------------

/// Per-row depth and carrier-density sequences for both sweep directions,
/// plus the depth-integrated sheet densities. Row count always equals the
/// source table's row count.
#[derive(Debug, Clone)]
pub struct Profile {
    pub voltage: Vec<f64>,
    pub depth_forward_nm: Vec<f64>,
    pub depth_backward_nm: Vec<f64>,
    pub density_forward_cm3: Vec<f64>,
    pub density_backward_cm3: Vec<f64>,
    /// Sheet carrier density of the forward sweep (cm⁻², non-negative).
    pub sheet_forward_cm2: f64,
    /// Sheet carrier density of the backward sweep (cm⁻², non-negative).
    pub sheet_backward_cm2: f64,
}

impl Profile {
    /// Number of rows in each output sequence.
    pub fn len(&self) -> usize {
        self.voltage.len()
    }

    /// Whether the profile has no rows.
    pub fn is_empty(&self) -> bool {
        self.voltage.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SampleResult – per-frequency profiles of one physical sample
// ---------------------------------------------------------------------------

/// All profiles measured on one physical sample, keyed by frequency label.
/// Entries keep first-seen order; inserting an existing label replaces the
/// profile in place (last write wins).
#[derive(Debug, Clone)]
pub struct SampleResult {
    pub sample_id: String,
    entries: Vec<(String, Profile)>,
}

impl SampleResult {
    pub fn new(sample_id: String) -> Self {
        Self {
            sample_id,
            entries: Vec::new(),
        }
    }

    /// Insert a profile under a frequency label. Returns `true` when an
    /// earlier profile with the same label was replaced.
    pub fn insert(&mut self, frequency_label: String, profile: Profile) -> bool {
        match self.entries.iter_mut().find(|(l, _)| *l == frequency_label) {
            Some((_, slot)) => {
                *slot = profile;
                true
            }
            None => {
                self.entries.push((frequency_label, profile));
                false
            }
        }
    }

    /// Profiles in first-seen frequency order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Profile)> {
        self.entries.iter().map(|(l, p)| (l.as_str(), p))
    }

    pub fn get(&self, frequency_label: &str) -> Option<&Profile> {
        self.entries
            .iter()
            .find(|(l, _)| l == frequency_label)
            .map(|(_, p)| p)
    }

    /// Number of frequency entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no frequency produced a profile.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(marker: f64) -> Profile {
        Profile {
            voltage: vec![marker],
            depth_forward_nm: vec![marker],
            depth_backward_nm: vec![marker],
            density_forward_cm3: vec![marker],
            density_backward_cm3: vec![marker],
            sheet_forward_cm2: marker,
            sheet_backward_cm2: marker,
        }
    }

    #[test]
    fn insert_keeps_first_seen_order() {
        let mut result = SampleResult::new("A1".into());
        assert!(!result.insert("100kHz".into(), profile(1.0)));
        assert!(!result.insert("20kHz".into(), profile(2.0)));
        let order: Vec<&str> = result.iter().map(|(l, _)| l).collect();
        assert_eq!(order, ["100kHz", "20kHz"]);
    }

    #[test]
    fn insert_replaces_in_place_on_collision() {
        let mut result = SampleResult::new("A1".into());
        result.insert("100kHz".into(), profile(1.0));
        result.insert("20kHz".into(), profile(2.0));
        assert!(result.insert("100kHz".into(), profile(3.0)));
        assert_eq!(result.len(), 2);
        assert_eq!(result.get("100kHz").unwrap().sheet_forward_cm2, 3.0);
        let order: Vec<&str> = result.iter().map(|(l, _)| l).collect();
        assert_eq!(order, ["100kHz", "20kHz"]);
    }
}
