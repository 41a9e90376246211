// SVG site-profile plots, one chart per observable and key

use std::error::Error;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use polcmp_recon::{AlignedRecord, ComparisonSeries, Observable, Source};

use crate::{artifact_name, ExportError, ExportSink};

pub const PLOT_SIZE: (u32, u32) = (1000, 600);

const TFA_COLOR: RGBColor = BLUE;
const DMRG_COLOR: RGBColor = RED;

/// Writes `{observable}_pol_{key}.svg` for both observables into one directory.
#[derive(Debug, Clone)]
pub struct PlotSink {
    dir: PathBuf,
}

impl PlotSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ExportSink for PlotSink {
    fn export(&mut self, record: &AlignedRecord<'_>) -> Result<Vec<PathBuf>, ExportError> {
        let mut written = Vec::with_capacity(Observable::ALL.len());
        for observable in Observable::ALL {
            let series = record.series(observable);
            let path = self.dir.join(artifact_name(observable, series.key, "svg"));
            render_site_profile(&path, PLOT_SIZE, &series)
                .map_err(|e| ExportError::Plot { path: path.clone(), message: e.to_string() })?;
            log::debug!("wrote {}", path.display());
            written.push(path);
        }
        Ok(written)
    }
}

/// Vertical extent covering both curves, padded so markers clear the frame.
pub fn value_range(series: &ComparisonSeries<'_>) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in series.variational.iter().chain(series.reference) {
        if v.is_finite() {
            lo = lo.min(*v);
            hi = hi.max(*v);
        }
    }
    if lo > hi {
        return (-1.0, 1.0);
    }
    if (hi - lo).abs() < 1e-9 {
        lo -= 0.1;
        hi += 0.1;
    }
    let pad = 0.08 * (hi - lo);
    (lo - pad, hi + pad)
}

fn render_site_profile(
    out_path: &Path,
    size: (u32, u32),
    series: &ComparisonSeries<'_>,
) -> Result<(), Box<dyn Error>> {
    let tfa: Vec<(f64, f64)> = series.rows().map(|(i, t, _)| (i as f64, t)).collect();
    let dmrg: Vec<(f64, f64)> = series.rows().map(|(i, _, d)| (i as f64, d)).collect();
    let x_max = series.sites.len() as f64 + 1.0;
    let (y_min, y_max) = value_range(series);

    let root = SVGBackend::new(out_path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(series.observable.title(series.key), ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0f64..x_max, y_min..y_max)?;
    chart
        .configure_mesh()
        .x_desc("Site i")
        .y_desc(series.observable.axis_label())
        .draw()?;

    chart
        .draw_series(LineSeries::new(tfa.iter().copied(), TFA_COLOR.mix(0.9).stroke_width(2)))?
        .label(Source::Variational.label())
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], TFA_COLOR));
    chart.draw_series(tfa.iter().map(|(x, y)| Circle::new((*x, *y), 3, TFA_COLOR.filled())))?;

    chart
        .draw_series(LineSeries::new(dmrg.iter().copied(), DMRG_COLOR.mix(0.85).stroke_width(2)))?
        .label(Source::Reference.label())
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], DMRG_COLOR));
    chart.draw_series(dmrg.iter().map(|(x, y)| {
        EmptyElement::at((*x, *y)) + Rectangle::new([(-3, -3), (3, 3)], DMRG_COLOR.filled())
    }))?;

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polcmp_recon::PolarizationKey;

    fn record<'a>(sites: &'a [usize], n: &'a [f64], m: &'a [f64]) -> AlignedRecord<'a> {
        AlignedRecord {
            key: PolarizationKey::from_value(0.5).unwrap(),
            sites: sites.to_vec(),
            tfa_density: n,
            dmrg_density: n,
            tfa_magnetization: m,
            dmrg_magnetization: m,
        }
    }

    #[test]
    fn flat_series_gets_nonzero_range() {
        let sites = [1, 2];
        let n = [1.0, 1.0];
        let rec = record(&sites, &n, &n);
        let (lo, hi) = value_range(&rec.series(Observable::Density));
        assert!(lo < 1.0 && hi > 1.0);
    }

    #[test]
    fn range_ignores_non_finite() {
        let sites = [1, 2, 3];
        let n = [0.5, f64::NAN, 1.5];
        let rec = record(&sites, &n, &n);
        let (lo, hi) = value_range(&rec.series(Observable::Density));
        assert!(lo < 0.5 && hi > 1.5 && hi < 2.0);
    }

    #[test]
    fn sink_writes_svg_per_observable() {
        let tmp = tempfile::tempdir().unwrap();
        let sites: Vec<usize> = (1..=100).collect();
        let n: Vec<f64> = sites.iter().map(|i| 1.0 + 0.01 * (*i as f64).sin()).collect();
        let m: Vec<f64> = sites.iter().map(|i| 0.5 * (*i as f64 / 10.0).cos()).collect();
        let rec = record(&sites, &n, &m);

        let mut sink = PlotSink::new(tmp.path());
        let written = sink.export(&rec).unwrap();
        assert_eq!(
            written,
            vec![tmp.path().join("density_pol_0.5.svg"), tmp.path().join("magnetization_pol_0.5.svg")]
        );
        let svg = std::fs::read_to_string(&written[1]).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("TFA") && svg.contains("DMRG"));
    }
}
