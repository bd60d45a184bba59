use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::path::PathBuf;

use log::{info, warn};
use serde::Serialize;
use thiserror::Error;

use super::meta::MetadataExtractor;
use super::model::{SampleResult, UNKNOWN};
use super::parser::{self, ParsedSweep};
use crate::profile::{self, Constants};

// ---------------------------------------------------------------------------
// Batch parameters
// ---------------------------------------------------------------------------

/// User-supplied physical parameters for one processing run.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Params {
    /// Capacitor diameter (µm).
    pub diameter_um: f64,
    /// Relative permittivity of the profiled layer.
    pub relative_permittivity: f64,
    /// Expected interface depth (nm). Annotation only, never integrated.
    pub interface_nm: f64,
}

impl Params {
    /// Circular capacitor area (m²) from the diameter.
    pub fn area_m2(&self) -> f64 {
        let radius_m = self.diameter_um * 1e-6 / 2.0;
        PI * radius_m * radius_m
    }

    fn validate(&self) -> Result<(), BatchError> {
        // `!(x > 0.0)` also rejects NaN.
        if !(self.diameter_um > 0.0) {
            return Err(BatchError::InvalidParameter {
                name: "diameter",
                reason: format!("{} µm is not a positive number", self.diameter_um),
            });
        }
        if !(self.relative_permittivity > 0.0) {
            return Err(BatchError::InvalidParameter {
                name: "permittivity",
                reason: format!("{} is not a positive number", self.relative_permittivity),
            });
        }
        if !self.interface_nm.is_finite() {
            return Err(BatchError::InvalidParameter {
                name: "interface",
                reason: format!("{} nm is not a finite depth", self.interface_nm),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Batch failure modes
// ---------------------------------------------------------------------------

/// Conditions that abort the whole batch. None of these may leave partial
/// artifacts behind: they fire before anything is written.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("invalid {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("input files mix samples: {}", .ids.join(", "))]
    MixedSample { ids: Vec<String> },
    #[error("no input file produced a usable sweep")]
    NoValidData,
}

// ---------------------------------------------------------------------------
// Session assembly
// ---------------------------------------------------------------------------

/// Parse every input file and fold the per-frequency profiles into one
/// sample-wide result. Per-file failures are logged and skipped;
/// batch-level guards fail the whole run.
pub fn build(
    paths: &[PathBuf],
    params: &Params,
    extractor: &dyn MetadataExtractor,
    constants: &Constants,
) -> Result<SampleResult, BatchError> {
    params.validate()?;

    let mut parsed = Vec::with_capacity(paths.len());
    for path in paths {
        match parser::parse(path, extractor) {
            Ok(sweep) => {
                info!(
                    "{}: {} rows, frequency {}, sample {}",
                    path.display(),
                    sweep.table.len(),
                    sweep.meta.frequency_label,
                    sweep.meta.sample_id
                );
                parsed.push(sweep);
            }
            Err(err) => warn!("skipping file: {err}"),
        }
    }

    assemble(parsed, params.area_m2(), params.relative_permittivity, constants)
}

/// Pure fold from parsed sweeps to a [`SampleResult`]; no I/O, so tests can
/// drive it with synthetic sweeps.
pub fn assemble(
    files: Vec<ParsedSweep>,
    area_m2: f64,
    relative_permittivity: f64,
    constants: &Constants,
) -> Result<SampleResult, BatchError> {
    // Guard against aggregating unrelated physical devices: every file that
    // names a sample must name the same one.
    let mut ids: Vec<String> = files
        .iter()
        .map(|f| f.meta.sample_id.clone())
        .filter(|id| id != UNKNOWN)
        .collect();
    ids.sort();
    ids.dedup();
    if ids.len() > 1 {
        return Err(BatchError::MixedSample { ids });
    }

    let sample_id = ids.pop().unwrap_or_else(|| UNKNOWN.to_string());
    let mut result = SampleResult::new(sample_id);
    let mut origin: BTreeMap<String, PathBuf> = BTreeMap::new();

    for file in files {
        let profile = profile::compute(&file.table, area_m2, relative_permittivity, constants);
        let label = file.meta.frequency_label.clone();
        if result.insert(label.clone(), profile) {
            warn!(
                "frequency {}: {} replaces {}",
                label,
                file.meta.path.display(),
                origin
                    .get(&label)
                    .map(|p| p.display().to_string())
                    .unwrap_or_default()
            );
        }
        origin.insert(label, file.meta.path);
    }

    if result.is_empty() {
        return Err(BatchError::NoValidData);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{FileMeta, SweepRow, SweepTable};

    fn sweep(name: &str, sample_id: &str, frequency: &str) -> ParsedSweep {
        ParsedSweep {
            meta: FileMeta {
                path: PathBuf::from(name),
                frequency_label: frequency.to_string(),
                sample_id: sample_id.to_string(),
            },
            table: SweepTable {
                rows: vec![
                    SweepRow {
                        voltage: 0.0,
                        c_forward: 1.0e-9,
                        c_backward: 1.1e-9,
                    },
                    SweepRow {
                        voltage: 0.5,
                        c_forward: 0.9e-9,
                        c_backward: 1.0e-9,
                    },
                ],
            },
        }
    }

    fn params() -> Params {
        Params {
            diameter_um: 500.0,
            relative_permittivity: 11.7,
            interface_nm: 120.0,
        }
    }

    #[test]
    fn area_follows_circular_geometry() {
        let p = params();
        let expected = PI * (250.0e-6_f64).powi(2);
        assert!((p.area_m2() - expected).abs() < expected * 1e-12);
    }

    #[test]
    fn mixed_samples_fail_instead_of_picking_one() {
        let files = vec![
            sweep("a_CV_A1_100kHz.txt", "A1", "100kHz"),
            sweep("b_CV_B2_100kHz.txt", "B2", "100kHz"),
        ];
        let err = assemble(files, params().area_m2(), 11.7, &Constants::default()).unwrap_err();
        match err {
            BatchError::MixedSample { ids } => assert_eq!(ids, ["A1", "B2"]),
            other => panic!("expected MixedSample, got {other:?}"),
        }
    }

    #[test]
    fn unknown_sample_ids_do_not_count_as_a_second_sample() {
        let files = vec![
            sweep("a.txt", "A1", "100kHz"),
            sweep("b.txt", UNKNOWN, "20kHz"),
        ];
        let result = assemble(files, params().area_m2(), 11.7, &Constants::default()).unwrap();
        assert_eq!(result.sample_id, "A1");
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn frequency_collision_keeps_the_later_file() {
        let mut second = sweep("later.txt", "A1", "100kHz");
        second.table.rows.push(SweepRow {
            voltage: 1.0,
            c_forward: 0.8e-9,
            c_backward: 0.9e-9,
        });
        let files = vec![sweep("earlier.txt", "A1", "100kHz"), second];
        let result = assemble(files, params().area_m2(), 11.7, &Constants::default()).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.get("100kHz").unwrap().len(), 3);
    }

    #[test]
    fn no_usable_files_is_an_error() {
        let err = assemble(Vec::new(), params().area_m2(), 11.7, &Constants::default()).unwrap_err();
        assert!(matches!(err, BatchError::NoValidData));
    }

    #[test]
    fn non_positive_diameter_is_rejected_before_any_io() {
        let bad = Params {
            diameter_um: 0.0,
            ..params()
        };
        let err = build(&[], &bad, &crate::data::meta::NamePattern::default(), &Constants::default())
            .unwrap_err();
        assert!(matches!(
            err,
            BatchError::InvalidParameter { name: "diameter", .. }
        ));
    }

    #[test]
    fn nan_permittivity_is_rejected() {
        let bad = Params {
            relative_permittivity: f64::NAN,
            ..params()
        };
        let err = build(&[], &bad, &crate::data::meta::NamePattern::default(), &Constants::default())
            .unwrap_err();
        assert!(matches!(
            err,
            BatchError::InvalidParameter { name: "permittivity", .. }
        ));
    }
}
