/// Console presentation helpers
///
/// Shared by the one-shot `compress` command and the interactive session so
/// both render the workflow the same way.
use crate::constants::{
    COMPRESSED_SIZE_PREFIX, INFO_PREFIX, ORIGINAL_SIZE_PREFIX, PROGRESS_SPINNER_TEMPLATE,
    REDUCTION_PREFIX, TIME_PREFIX,
};
use crate::formatters::{format_bytes, StatsSnapshot};
use crate::logger::is_quiet;
use crate::media::image_dimensions;
use crate::workflow::{CompressionWorkflowController, WorkflowPhase};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a progress spinner with consistent styling
///
/// # Arguments
/// * `message` - Initial message to display
///
/// # Returns
/// * Configured `ProgressBar` instance, hidden in quiet mode
pub fn create_progress_spinner(message: &str) -> ProgressBar {
    if is_quiet() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template(PROGRESS_SPINNER_TEMPLATE) {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Describe pixel dimensions of encoded bytes, e.g. "1920x1080".
pub fn describe_dimensions(bytes: &[u8]) -> Option<String> {
    image_dimensions(bytes).map(|(w, h)| format!("{}x{}", w, h))
}

/// Short label for a workflow phase.
pub fn phase_label(phase: WorkflowPhase) -> &'static str {
    match phase {
        WorkflowPhase::Empty => "no image selected",
        WorkflowPhase::Ready => "ready",
        WorkflowPhase::Compressing => "compressing",
        WorkflowPhase::Result => "compressed",
        WorkflowPhase::Failed => "failed",
    }
}

/// Lines of the statistics panel.
pub fn stats_lines(stats: &StatsSnapshot) -> Vec<String> {
    vec![
        format!("{} {}", ORIGINAL_SIZE_PREFIX, stats.original_size),
        format!("{} {}", COMPRESSED_SIZE_PREFIX, stats.result_size),
        format!("{} {}", REDUCTION_PREFIX, stats.reduction),
        format!("{} {}", TIME_PREFIX, stats.elapsed),
    ]
}

/// Print the selection summary, status and statistics of a controller.
pub fn print_workflow_summary(controller: &CompressionWorkflowController) {
    let state = controller.state();

    match state.selected() {
        Some(file) => {
            let dimensions = controller
                .original_bytes()
                .ok()
                .and_then(|bytes| describe_dimensions(&bytes))
                .map(|d| format!(", {}", d))
                .unwrap_or_default();
            crate::info!(
                "{} Image: {} ({}, {}{})",
                INFO_PREFIX,
                file.name,
                file.content_type,
                format_bytes(state.original_size()),
                dimensions
            );
        }
        None => crate::info!("{} Image: -", INFO_PREFIX),
    }
    crate::info!("{} Status: {}", INFO_PREFIX, phase_label(controller.phase()));
    if let Some(message) = state.last_error() {
        crate::warn!("{}", message);
    }

    for line in stats_lines(&controller.stats()) {
        crate::info!("{}", line);
    }
}
