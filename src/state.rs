use crate::config::AppConfig;
use crate::data::model::{Dataset, NoiseAnalysisResult, PanelId};
use crate::data::noise::{self, BandedSeries};

// ---------------------------------------------------------------------------
// Application state + pure reducer
// ---------------------------------------------------------------------------

/// Dataset-list state transitions. The UI dispatches these; it never edits
/// the dataset list directly.
#[derive(Debug, Clone)]
pub enum Action {
    /// Replace a panel's datasets wholesale with a new selection.
    SetPanelDatasets(PanelId, Vec<Dataset>),
    /// Drop every dataset loaded from the panel.
    ClearPanel(PanelId),
    /// Drop one dataset by id.
    RemoveDataset(String),
}

/// The reducer-owned state: the overlay dataset list and the band-relative
/// scores derived from it. UI ephemera (status text, toggles) live on the
/// app struct, outside these transitions.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub datasets: Vec<Dataset>,
    /// Band-relative noisiness for the current dataset set. Recomputed on
    /// every dataset transition: the scores are only meaningful for the
    /// exact group membership they were computed against.
    pub relative_results: Vec<NoiseAnalysisResult>,
}

impl AppState {
    /// Band-relative result for a dataset, by filename.
    pub fn relative_for(&self, filename: &str) -> Option<&NoiseAnalysisResult> {
        self.relative_results.iter().find(|r| r.filename == filename)
    }

    pub fn panel_datasets(&self, panel: PanelId) -> impl Iterator<Item = &Dataset> {
        self.datasets.iter().filter(move |d| d.source_panel == panel)
    }
}

/// Pure transition: `(state, action) -> new state`. The input state is
/// never mutated; callers swap in the returned value.
pub fn reduce(state: &AppState, action: Action, config: &AppConfig) -> AppState {
    let mut datasets = state.datasets.clone();

    match action {
        Action::SetPanelDatasets(panel, new_datasets) => {
            datasets.retain(|d| d.source_panel != panel);
            datasets.extend(new_datasets);
        }
        Action::ClearPanel(panel) => {
            datasets.retain(|d| d.source_panel != panel);
        }
        Action::RemoveDataset(id) => {
            datasets.retain(|d| d.id != id);
        }
    }

    // Evict oldest past the cap.
    while datasets.len() > config.max_overlay_datasets {
        let evicted = datasets.remove(0);
        log::info!("dataset cap reached, evicting {}", evicted.filename);
    }

    let relative_results = recompute_relative(&datasets, config);

    AppState {
        datasets,
        relative_results,
    }
}

fn recompute_relative(datasets: &[Dataset], config: &AppConfig) -> Vec<NoiseAnalysisResult> {
    let files: Vec<BandedSeries<'_>> = datasets
        .iter()
        .map(|d| BandedSeries {
            filename: &d.filename,
            points: &d.points,
            band: d.band,
        })
        .collect();
    noise::analyze_band_relative(&files, &config.calibration)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::DataPoint;
    use crate::data::noise::Calibration;

    fn make_dataset(filename: &str, panel: PanelId, amplitude: f64) -> Dataset {
        let points: Vec<DataPoint> = (0..40)
            .map(|i| DataPoint::new(30e6 + i as f64 * 1e6, amplitude))
            .collect();
        Dataset::assemble(filename, points, panel, 0, None, &Calibration::default())
    }

    #[test]
    fn set_panel_replaces_only_that_panel() {
        let config = AppConfig::default();
        let state = AppState::default();

        let state = reduce(
            &state,
            Action::SetPanelDatasets(
                PanelId::DatasetA,
                vec![make_dataset("b5_a1.csv", PanelId::DatasetA, -60.0)],
            ),
            &config,
        );
        let state = reduce(
            &state,
            Action::SetPanelDatasets(
                PanelId::DatasetB,
                vec![make_dataset("b5_b1.csv", PanelId::DatasetB, -40.0)],
            ),
            &config,
        );
        assert_eq!(state.datasets.len(), 2);

        // Re-selecting panel A swaps out only A's dataset.
        let state = reduce(
            &state,
            Action::SetPanelDatasets(
                PanelId::DatasetA,
                vec![make_dataset("b5_a2.csv", PanelId::DatasetA, -50.0)],
            ),
            &config,
        );
        assert_eq!(state.datasets.len(), 2);
        assert!(state.datasets.iter().any(|d| d.filename == "b5_a2.csv"));
        assert!(state.datasets.iter().all(|d| d.filename != "b5_a1.csv"));
        assert!(state.datasets.iter().any(|d| d.filename == "b5_b1.csv"));
    }

    #[test]
    fn clear_panel_removes_its_datasets() {
        let config = AppConfig::default();
        let mut state = AppState::default();
        state = reduce(
            &state,
            Action::SetPanelDatasets(
                PanelId::DatasetA,
                vec![make_dataset("b5_a.csv", PanelId::DatasetA, -60.0)],
            ),
            &config,
        );
        state = reduce(&state, Action::ClearPanel(PanelId::DatasetA), &config);
        assert!(state.datasets.is_empty());
        assert!(state.relative_results.is_empty());
    }

    #[test]
    fn remove_dataset_by_id() {
        let config = AppConfig::default();
        let mut state = AppState::default();
        state = reduce(
            &state,
            Action::SetPanelDatasets(
                PanelId::DatasetA,
                vec![
                    make_dataset("b5_one.csv", PanelId::DatasetA, -60.0),
                    make_dataset("b5_two.csv", PanelId::DatasetA, -40.0),
                ],
            ),
            &config,
        );
        let id = state.datasets[0].id.clone();
        state = reduce(&state, Action::RemoveDataset(id), &config);
        assert_eq!(state.datasets.len(), 1);
        assert_eq!(state.datasets[0].filename, "b5_two.csv");
    }

    #[test]
    fn cap_evicts_oldest() {
        let config = AppConfig {
            max_overlay_datasets: 2,
            ..AppConfig::default()
        };
        let mut state = AppState::default();
        state = reduce(
            &state,
            Action::SetPanelDatasets(
                PanelId::DatasetA,
                vec![
                    make_dataset("b5_1.csv", PanelId::DatasetA, -60.0),
                    make_dataset("b5_2.csv", PanelId::DatasetA, -50.0),
                    make_dataset("b5_3.csv", PanelId::DatasetA, -40.0),
                ],
            ),
            &config,
        );
        assert_eq!(state.datasets.len(), 2);
        assert!(state.datasets.iter().all(|d| d.filename != "b5_1.csv"));
    }

    #[test]
    fn relative_scores_track_membership_changes() {
        let config = AppConfig::default();
        let mut state = AppState::default();
        state = reduce(
            &state,
            Action::SetPanelDatasets(
                PanelId::DatasetA,
                vec![make_dataset("b5_quiet.csv", PanelId::DatasetA, -60.0)],
            ),
            &config,
        );
        state = reduce(
            &state,
            Action::SetPanelDatasets(
                PanelId::DatasetB,
                vec![make_dataset("b5_loud.csv", PanelId::DatasetB, -20.0)],
            ),
            &config,
        );

        // Both in B5: extremes of the group.
        assert_eq!(state.relative_for("b5_quiet.csv").unwrap().noisiness_index, 1.0);
        assert_eq!(state.relative_for("b5_loud.csv").unwrap().noisiness_index, 10.0);

        // Dropping the loud file collapses the survivor to the neutral score.
        state = reduce(&state, Action::ClearPanel(PanelId::DatasetB), &config);
        assert_eq!(state.relative_for("b5_quiet.csv").unwrap().noisiness_index, 6.0);
        assert!(state.relative_for("b5_loud.csv").is_none());
    }

    #[test]
    fn reduce_does_not_mutate_input() {
        let config = AppConfig::default();
        let original = reduce(
            &AppState::default(),
            Action::SetPanelDatasets(
                PanelId::DatasetA,
                vec![make_dataset("b5_a.csv", PanelId::DatasetA, -60.0)],
            ),
            &config,
        );
        let before = original.datasets.len();
        let _next = reduce(&original, Action::ClearPanel(PanelId::DatasetA), &config);
        assert_eq!(original.datasets.len(), before);
    }
}
