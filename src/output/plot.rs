use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::coord::Shift;
use plotters::prelude::*;

use super::sanitize_component;
use crate::data::model::SampleResult;

// ---------------------------------------------------------------------------
// Style
// ---------------------------------------------------------------------------

/// Rendering options for the profile grid.
#[derive(Debug, Clone)]
pub struct PlotStyle {
    pub panel_width: u32,
    pub panel_height: u32,
    pub background: RGBColor,
    pub forward_color: RGBColor,
    pub backward_color: RGBColor,
    /// Colour of the vertical interface-depth marker.
    pub marker_color: RGBColor,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            panel_width: 700,
            panel_height: 400,
            background: WHITE,
            forward_color: RED,
            backward_color: BLACK,
            marker_color: RGBColor(255, 165, 0),
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render the profile grid as PNG bytes: one row per frequency, forward on
/// the left, backward on the right, density on a log axis, and a vertical
/// marker at the expected interface depth.
pub fn render_profiles_png(
    result: &SampleResult,
    interface_nm: f64,
    style: &PlotStyle,
) -> Result<Vec<u8>> {
    if result.is_empty() {
        return Err(anyhow!("no profiles to plot"));
    }

    let width = style.panel_width * 2;
    let height = style.panel_height * result.len() as u32;
    let mut buffer = vec![0u8; (width * height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&style.background)
            .map_err(|e| anyhow!("filling plot background: {e}"))?;

        let panels = root.split_evenly((result.len(), 2));
        for (row, (frequency, profile)) in result.iter().enumerate() {
            draw_panel(
                &panels[row * 2],
                &format!("Forward - {frequency}"),
                &profile.depth_forward_nm,
                &profile.density_forward_cm3,
                profile.sheet_forward_cm2,
                interface_nm,
                style.forward_color,
                style.marker_color,
            )?;
            draw_panel(
                &panels[row * 2 + 1],
                &format!("Backward - {frequency}"),
                &profile.depth_backward_nm,
                &profile.density_backward_cm3,
                profile.sheet_backward_cm2,
                interface_nm,
                style.backward_color,
                style.marker_color,
            )?;
        }
        root.present().map_err(|e| anyhow!("finalizing plot: {e}"))?;
    }

    encode_png(&buffer, width, height)
}

/// Render and write the grid next to the tabular artifacts. Returns the
/// path written.
pub fn write_plot(
    result: &SampleResult,
    interface_nm: f64,
    style: &PlotStyle,
    out_dir: &Path,
) -> Result<PathBuf> {
    let png = render_profiles_png(result, interface_nm, style)?;
    let path = out_dir.join(format!(
        "{}_profiles.png",
        sanitize_component(&result.sample_id)
    ));
    fs::write(&path, png).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

#[allow(clippy::too_many_arguments)]
fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    depth_nm: &[f64],
    density_cm3: &[f64],
    sheet_cm2: f64,
    interface_nm: f64,
    series_color: RGBColor,
    marker_color: RGBColor,
) -> Result<()> {
    let (x_lo, x_hi) = axis_range(depth_nm.iter().copied());
    // The density axis is logarithmic; zero-density samples (zeroed
    // degenerate derivatives) are clamped to the axis floor.
    let (y_lo, y_hi) = positive_range(density_cm3.iter().copied());

    let mut chart = ChartBuilder::on(area)
        .margin(12)
        .caption(title, ("sans-serif", 18))
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(x_lo..x_hi, (y_lo..y_hi).log_scale())
        .map_err(|e| anyhow!("{title}: building chart: {e}"))?;

    chart
        .configure_mesh()
        .x_desc("Z (nm)")
        .y_desc("N (cm^-3)")
        .light_line_style(&BLACK.mix(0.08))
        .draw()
        .map_err(|e| anyhow!("{title}: drawing mesh: {e}"))?;

    let floor = y_lo;
    let points = depth_nm
        .iter()
        .zip(density_cm3.iter())
        .map(move |(&z, &n)| (z, n.max(floor)));
    chart
        .draw_series(LineSeries::new(points, &series_color).point_size(2))
        .map_err(|e| anyhow!("{title}: drawing series: {e}"))?
        .label(format!("sheet density {sheet_cm2:.2e} cm^-2"))
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &series_color));

    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(interface_nm, y_lo), (interface_nm, y_hi)],
            ShapeStyle::from(&marker_color).stroke_width(2),
        )))
        .map_err(|e| anyhow!("{title}: drawing interface marker: {e}"))?
        .label("interface depth")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &marker_color));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .border_style(&BLACK.mix(0.2))
        .background_style(&WHITE.mix(0.9))
        .draw()
        .map_err(|e| anyhow!("{title}: drawing legend: {e}"))?;

    Ok(())
}

/// Finite min/max with a degenerate-width fallback.
fn axis_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in values.filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if lo > hi {
        return (0.0, 1.0);
    }
    if lo == hi {
        return (lo - 0.5, hi + 0.5);
    }
    (lo, hi)
}

/// Positive min/max for the log axis, with fallbacks for all-zero data.
fn positive_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (mut lo, mut hi) = (f64::INFINITY, 0.0_f64);
    for v in values.filter(|v| v.is_finite() && *v > 0.0) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if lo > hi {
        return (1.0, 10.0);
    }
    if lo == hi {
        return (lo / 10.0, hi * 10.0);
    }
    (lo, hi)
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| anyhow!("plot buffer has unexpected size"))?;
    let mut out = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .context("encoding plot PNG")?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Profile;

    fn result(frequencies: &[&str]) -> SampleResult {
        let mut r = SampleResult::new("A1".into());
        for f in frequencies {
            r.insert(
                f.to_string(),
                Profile {
                    voltage: vec![0.0, 0.5, 1.0],
                    depth_forward_nm: vec![60.0, 66.0, 73.0],
                    depth_backward_nm: vec![55.0, 60.0, 66.0],
                    density_forward_cm3: vec![1.0e17, 0.0, 1.2e17],
                    density_backward_cm3: vec![0.9e17, 1.0e17, 1.1e17],
                    sheet_forward_cm2: 7.2e11,
                    sheet_backward_cm2: 6.8e11,
                },
            );
        }
        r
    }

    #[test]
    fn renders_a_png_per_frequency_grid() {
        let png = render_profiles_png(&result(&["100kHz", "20kHz"]), 65.0, &PlotStyle::default())
            .unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn empty_result_is_an_error_not_a_blank_image() {
        let empty = SampleResult::new("A1".into());
        assert!(render_profiles_png(&empty, 65.0, &PlotStyle::default()).is_err());
    }

    #[test]
    fn ranges_guard_against_degenerate_data() {
        assert_eq!(axis_range([f64::INFINITY].into_iter()), (0.0, 1.0));
        assert_eq!(axis_range([5.0].into_iter()), (4.5, 5.5));
        assert_eq!(positive_range([0.0, 0.0].into_iter()), (1.0, 10.0));
        let (lo, hi) = positive_range([3.0, 3.0].into_iter());
        assert!(lo < 3.0 && hi > 3.0);
    }
}
