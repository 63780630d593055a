use gammashield::engine::progress::{Progress, ProgressCallback, SweepStatus};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;
/// Stored in place of an estimate before the first configuration has finished.
const NO_ESTIMATE: u64 = u64::MAX;

/// Draws sweep progress on stderr: a spinner per phase and a bar over the configurations.
///
/// The bar's ETA is the sweep's own estimate from [`SweepStatus`] rather than indicatif's
/// rate-based one, which is skewed by configurations resumed from a checkpoint.
#[derive(Clone)]
pub struct CliProgressHandler {
    bar: Arc<Mutex<ProgressBar>>,
    eta_secs: Arc<AtomicU64>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let eta_secs = Arc::new(AtomicU64::new(NO_ESTIMATE));
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr())
            .with_style(spinner_style())
            .with_message("Initializing...");
        bar.finish_and_clear();

        Self {
            bar: Arc::new(Mutex::new(bar)),
            eta_secs,
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let bar = self.bar.clone();
        let eta_secs = self.eta_secs.clone();

        Box::new(move |progress: Progress| {
            let Ok(bar) = bar.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::PhaseStart { name } => {
                    bar.reset();
                    bar.set_length(0);
                    bar.set_style(spinner_style());
                    bar.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                    bar.set_message(name);
                }
                Progress::PhaseFinish => {
                    bar.disable_steady_tick();
                    bar.finish_with_message("✓ Done");
                }
                Progress::TaskStart { total_steps } => {
                    eta_secs.store(NO_ESTIMATE, Ordering::Relaxed);
                    bar.disable_steady_tick();
                    bar.reset();
                    bar.set_length(total_steps);
                    bar.set_style(bar_style(eta_secs.clone()));
                    bar.set_message("Sweeping");
                }
                Progress::TaskIncrement => bar.inc(1),
                Progress::TaskFinish => {
                    if let Some(length) = bar.length() {
                        bar.set_position(length);
                    }
                    bar.finish();
                }
                Progress::Status(status) => {
                    let secs = status.remaining.map_or(NO_ESTIMATE, |d| d.as_secs());
                    eta_secs.store(secs, Ordering::Relaxed);
                    bar.set_message(status_message(&status));
                }
                Progress::Message(msg) if bar.is_finished() => bar.set_message(msg),
                Progress::Message(msg) => bar.println(format!("  {}", msg)),
            }
        })
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style(eta_secs: Arc<AtomicU64>) -> ProgressStyle {
    ProgressStyle::with_template("{msg:<16} [{bar:40.cyan/blue}] {pos}/{len} (ETA {sweep_eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .with_key(
            "sweep_eta",
            move |_: &ProgressState, w: &mut dyn Write| {
                let _ = w.write_str(&format_eta(eta_secs.load(Ordering::Relaxed)));
            },
        )
        .progress_chars("##-")
}

/// Minutes left, or `--` while there is nothing to estimate from.
fn format_eta(secs: u64) -> String {
    if secs == NO_ESTIMATE {
        "--".to_string()
    } else {
        format!("{:.1} min", secs as f64 / 60.0)
    }
}

/// Percentage of the grid handled so far.
pub fn status_message(status: &SweepStatus) -> String {
    format!("{:.1}%", status.fraction() * 100.0)
}
