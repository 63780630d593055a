use crate::core::models::result::SimulationResult;
use crate::core::models::store::ResultStore;

/// Number of configurations reported as critical after a sweep.
pub const CRITICAL_COUNT: usize = 5;

/// The `n` results with the highest dose rate, highest first.
///
/// Equal doses keep the store's insertion order.
pub fn highest_doses(store: &ResultStore, n: usize) -> Vec<&SimulationResult> {
    let mut ranked: Vec<&SimulationResult> = store.results().collect();
    ranked.sort_by(|a, b| b.dose_rem_per_hr.total_cmp(&a.dose_rem_per_hr));
    ranked.truncate(n);
    ranked
}
