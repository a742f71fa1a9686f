use eframe::egui::{Color32, Ui};
use egui_plot::{Legend, Line, LineStyle, MarkerShape, Plot, PlotPoints, Points};

use crate::app::EmcViewApp;
use crate::data::bands::Band;
use crate::data::filter::nice_ranges;
use crate::data::peaks;

// ---------------------------------------------------------------------------
// Overlay plot (central panel)
// ---------------------------------------------------------------------------

/// Render the overlay spectrum plot: one line per dataset (MHz vs dBμV/m),
/// optional peak markers, and the per-band emission limit segments.
pub fn overlay_plot(ui: &mut Ui, app: &EmcViewApp) {
    if app.state.datasets.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open measurement files to compare  (File → Open Dataset A…)");
        });
        return;
    }

    let mut plot = Plot::new("overlay_plot")
        .legend(Legend::default())
        .x_axis_label("Frequency (MHz)")
        .y_axis_label("Amplitude (dBμV/m)")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);

    if let Some(ranges) = data_ranges(app) {
        plot = plot
            .include_x(ranges.frequency.0)
            .include_x(ranges.frequency.1)
            .include_y(ranges.amplitude.0)
            .include_y(ranges.amplitude.1);
    }

    plot.show(ui, |plot_ui| {
        for dataset in &app.state.datasets {
            let points: PlotPoints = dataset
                .points
                .iter()
                .map(|p| [p.frequency_mhz(), p.amplitude])
                .collect();

            plot_ui.line(
                Line::new(points)
                    .name(&dataset.label)
                    .color(dataset.color)
                    .width(1.5),
            );

            if app.show_peaks {
                let detected = peaks::detect_peaks(&dataset.points, &app.config.peaks);
                if !detected.is_empty() {
                    let markers: PlotPoints = detected
                        .iter()
                        .map(|peak| [peak.frequency_mhz, peak.amplitude])
                        .collect();
                    plot_ui.points(
                        Points::new(markers)
                            .name(format!("{} peaks", dataset.label))
                            .color(dataset.color)
                            .shape(MarkerShape::Diamond)
                            .radius(4.0),
                    );
                }
            }
        }

        if app.config.limits.enabled {
            for band in active_bands(app) {
                let level = app.config.limits.limit_for(band);
                let (start_mhz, end_mhz) = band.range_mhz();
                let segment: PlotPoints =
                    vec![[start_mhz, level], [end_mhz, level]].into();
                plot_ui.line(
                    Line::new(segment)
                        .name(format!("{band} limit"))
                        .color(Color32::DARK_GRAY)
                        .style(LineStyle::Dashed { length: 8.0 })
                        .width(1.0),
                );
            }
        }
    });
}

/// Distinct bands among the loaded datasets, in band order.
fn active_bands(app: &EmcViewApp) -> Vec<Band> {
    let mut bands: Vec<Band> = app.state.datasets.iter().filter_map(|d| d.band).collect();
    bands.sort();
    bands.dedup();
    bands
}

/// Padded plot bounds over all finite points, in MHz / dBμV/m.
fn data_ranges(app: &EmcViewApp) -> Option<crate::data::filter::NiceRanges> {
    let mut min_freq = f64::INFINITY;
    let mut max_freq = f64::NEG_INFINITY;
    let mut min_amp = f64::INFINITY;
    let mut max_amp = f64::NEG_INFINITY;

    for dataset in &app.state.datasets {
        for point in &dataset.points {
            let mhz = point.frequency_mhz();
            if mhz.is_finite() && point.amplitude.is_finite() {
                min_freq = min_freq.min(mhz);
                max_freq = max_freq.max(mhz);
                min_amp = min_amp.min(point.amplitude);
                max_amp = max_amp.max(point.amplitude);
            }
        }
    }

    if !min_freq.is_finite() || !min_amp.is_finite() {
        return None;
    }
    Some(nice_ranges(min_freq, max_freq, min_amp, max_amp))
}
