use std::path::PathBuf;

use chrono::Utc;
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::app::EmcViewApp;
use crate::color::noisiness_color;
use crate::data::loader::{self, FsSource};
use crate::data::model::{Dataset, PanelId};
use crate::data::noise::{self, BandedSeries};
use crate::data::{export, filter};
use crate::state::Action;

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, app: &mut EmcViewApp) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open Dataset A…").clicked() {
                open_files_dialog(app, PanelId::DatasetA);
                ui.close_menu();
            }
            if ui.button("Open Dataset B…").clicked() {
                open_files_dialog(app, PanelId::DatasetB);
                ui.close_menu();
            }
            ui.separator();
            let can_export = !app.state.datasets.is_empty();
            if ui
                .add_enabled(can_export, egui::Button::new("Export CSV…"))
                .clicked()
            {
                export_dialog(app);
                ui.close_menu();
            }
        });

        ui.separator();

        if !app.state.datasets.is_empty() {
            ui.label(format!("{} datasets loaded", app.state.datasets.len()));
        }

        ui.separator();

        if ui
            .selectable_label(app.show_peaks, "Peaks")
            .on_hover_text("Mark detected peaks on the plot")
            .clicked()
        {
            app.show_peaks = !app.show_peaks;
        }

        if let Some(msg) = &app.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Left side panel – loaded datasets
// ---------------------------------------------------------------------------

/// Render the dataset list with band and noisiness badges.
pub fn side_panel(ui: &mut Ui, app: &mut EmcViewApp) {
    ui.heading("Datasets");
    ui.separator();

    if app.state.datasets.is_empty() {
        ui.label("No files loaded.\nFile → Open Dataset A…");
        return;
    }

    let mut pending: Vec<Action> = Vec::new();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for panel in [PanelId::DatasetA, PanelId::DatasetB] {
                let datasets: Vec<&Dataset> = app.state.panel_datasets(panel).collect();
                if datasets.is_empty() {
                    continue;
                }

                ui.horizontal(|ui: &mut Ui| {
                    ui.strong(panel.display_name());
                    if ui.small_button("Clear").clicked() {
                        pending.push(Action::ClearPanel(panel));
                    }
                });

                for dataset in datasets {
                    dataset_row(ui, app, dataset, &mut pending);
                }
                ui.separator();
            }
        });

    for action in pending {
        app.dispatch(action);
    }
}

fn dataset_row(ui: &mut Ui, app: &EmcViewApp, dataset: &Dataset, pending: &mut Vec<Action>) {
    ui.horizontal(|ui: &mut Ui| {
        ui.label(RichText::new("■").color(dataset.color));
        ui.label(&dataset.label);
        if ui.small_button("✕").clicked() {
            pending.push(Action::RemoveDataset(dataset.id.clone()));
        }
    });

    ui.horizontal(|ui: &mut Ui| {
        match dataset.band {
            Some(band) => {
                let in_band = filter::filter_to_band(&dataset.points, band).len();
                ui.label(format!("{band}")).on_hover_text(format!(
                    "{}\n{}\n{in_band} of {} points inside the band",
                    band.label(),
                    band.description(),
                    dataset.points.len()
                ));
            }
            None => {
                ui.label("no band");
            }
        }

        // Band-relative score when sibling files exist, absolute otherwise.
        match app.state.relative_for(&dataset.filename) {
            Some(relative) => {
                let score = relative.noisiness_index;
                ui.label(
                    RichText::new(format!("{score:.0}/10 {}", relative.category))
                        .color(noisiness_color(score)),
                );
            }
            None => {
                ui.label(format!(
                    "{:.0}/99 {}",
                    dataset.noisiness_index, dataset.noisiness_category
                ));
            }
        }

        ui.label(format!("{} pts", dataset.points.len()));
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

/// Pick measurement files for a panel, parse and assemble them, and replace
/// the panel's datasets. Parse warnings surface in the status line; failed
/// files are skipped with their first error.
pub fn open_files_dialog(app: &mut EmcViewApp, panel: PanelId) {
    let title = format!("Open measurement files for {}", panel.display_name());
    let files = rfd::FileDialog::new()
        .set_title(&title)
        .add_filter("CSV measurement files", &["csv", "txt"])
        .pick_files();

    let Some(paths) = files else {
        return;
    };

    load_into_panel(app, panel, paths);
}

fn load_into_panel(app: &mut EmcViewApp, panel: PanelId, paths: Vec<PathBuf>) {
    let source = FsSource;
    let mut datasets = Vec::new();
    let mut problems: Vec<String> = Vec::new();

    for path in paths {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unnamed")
            .to_string();

        let result = loader::load_file(&source, &path, &app.config);
        for warning in &result.warnings {
            log::warn!("{filename}: {warning}");
        }

        match (result.success, result.data) {
            (true, Some(points)) => {
                if !result.warnings.is_empty() {
                    problems.push(format!("{filename}: {}", result.warnings.join("; ")));
                }
                let index = datasets.len();
                datasets.push(Dataset::assemble(
                    &filename,
                    points,
                    panel,
                    index,
                    None,
                    &app.config.calibration,
                ));
            }
            _ => {
                let error = result
                    .errors
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "unknown error".to_string());
                log::error!("{filename}: {error}");
                problems.push(format!("{filename}: {error}"));
            }
        }
    }

    app.status_message = if problems.is_empty() {
        None
    } else {
        Some(problems.join(" | "))
    };

    if !datasets.is_empty() {
        log::info!(
            "loaded {} datasets into {}",
            datasets.len(),
            panel.display_name()
        );
        if datasets.len() > 1 {
            let series: Vec<BandedSeries<'_>> = datasets
                .iter()
                .map(|d| BandedSeries {
                    filename: &d.filename,
                    points: &d.points,
                    band: d.band,
                })
                .collect();
            for result in noise::batch_analyze_and_rank(&series, &app.config.calibration) {
                log::info!(
                    "  {}: absolute noisiness {:.0}/99 ({})",
                    result.filename,
                    result.noisiness_index,
                    result.category
                );
            }
        }
        app.dispatch(Action::SetPanelDatasets(panel, datasets));
    }
}

/// Export the current overlay to a CSV file chosen by the user.
pub fn export_dialog(app: &mut EmcViewApp) {
    let now = Utc::now();
    let band = app.state.datasets.first().and_then(|d| d.band);
    let suggested = export::export_filename(band, None, now);

    let Some(path) = rfd::FileDialog::new()
        .set_title("Export overlay data")
        .set_file_name(&suggested)
        .add_filter("CSV", &["csv"])
        .save_file()
    else {
        return;
    };

    match export::export_csv(&app.state.datasets, true, now)
        .and_then(|text| std::fs::write(&path, text).map_err(Into::into))
    {
        Ok(()) => {
            log::info!("exported {} datasets to {}", app.state.datasets.len(), path.display());
            app.status_message = None;
        }
        Err(err) => {
            log::error!("export failed: {err:#}");
            app.status_message = Some(format!("Export failed: {err:#}"));
        }
    }
}
