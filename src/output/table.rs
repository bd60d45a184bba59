use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use super::sanitize_component;
use crate::data::model::SampleResult;
use crate::data::session::Params;

// ---------------------------------------------------------------------------
// Summary (JSON artifact)
// ---------------------------------------------------------------------------

/// Sheet-density scalars of one frequency, as persisted in the summary.
#[derive(Debug, Clone, Serialize)]
pub struct FrequencySummary {
    pub frequency: String,
    pub rows: usize,
    pub sheet_forward_cm2: f64,
    pub sheet_backward_cm2: f64,
}

/// Machine-readable run summary written next to the CSV sheets.
#[derive(Debug, Clone, Serialize)]
pub struct SampleSummary {
    pub sample_id: String,
    #[serde(flatten)]
    pub params: Params,
    pub frequencies: Vec<FrequencySummary>,
}

impl SampleSummary {
    pub fn new(result: &SampleResult, params: &Params) -> Self {
        Self {
            sample_id: result.sample_id.clone(),
            params: *params,
            frequencies: result
                .iter()
                .map(|(frequency, profile)| FrequencySummary {
                    frequency: frequency.to_string(),
                    rows: profile.len(),
                    sheet_forward_cm2: profile.sheet_forward_cm2,
                    sheet_backward_cm2: profile.sheet_backward_cm2,
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// CSV sheets
// ---------------------------------------------------------------------------

const SHEET_HEADER: [&str; 5] = [
    "Voltage(V)",
    "Depth_Forward(nm)",
    "Depth_Backward(nm)",
    "Density_Forward(cm^-3)",
    "Density_Backward(cm^-3)",
];

/// Write one CSV sheet per frequency plus the JSON summary into `out_dir`.
/// Returns the paths written. Output contains no timestamps, so re-running
/// the same batch reproduces every byte.
pub fn write_tables(result: &SampleResult, params: &Params, out_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let stem = sanitize_component(&result.sample_id);
    let mut written = Vec::with_capacity(result.len() + 1);

    for (frequency, profile) in result.iter() {
        let path = out_dir.join(format!("{stem}_{}.csv", sanitize_component(frequency)));
        let mut writer =
            csv::Writer::from_path(&path).with_context(|| format!("creating {}", path.display()))?;
        writer
            .write_record(SHEET_HEADER)
            .with_context(|| format!("writing header of {}", path.display()))?;
        for i in 0..profile.len() {
            writer
                .write_record(&[
                    profile.voltage[i].to_string(),
                    profile.depth_forward_nm[i].to_string(),
                    profile.depth_backward_nm[i].to_string(),
                    profile.density_forward_cm3[i].to_string(),
                    profile.density_backward_cm3[i].to_string(),
                ])
                .with_context(|| format!("writing row {i} of {}", path.display()))?;
        }
        writer
            .flush()
            .with_context(|| format!("flushing {}", path.display()))?;
        written.push(path);
    }

    let summary = SampleSummary::new(result, params);
    let path = out_dir.join(format!("{stem}_summary.json"));
    let json = serde_json::to_string_pretty(&summary).context("serializing run summary")?;
    fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    written.push(path);

    Ok(written)
}
