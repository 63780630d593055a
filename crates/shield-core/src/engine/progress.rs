use std::time::Duration;

/// Where the sweep stands after a configuration has been handled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepStatus {
    pub processed: usize,
    pub total: usize,
    pub elapsed: Duration,
    pub remaining: Option<Duration>,
}

impl SweepStatus {
    pub fn new(processed: usize, total: usize, elapsed: Duration) -> Self {
        Self {
            processed,
            total,
            elapsed,
            remaining: estimate_remaining(processed, total, elapsed),
        }
    }

    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.processed as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Clone)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    Status(SweepStatus),
    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}

/// Linear extrapolation of the time left from the average time per configuration.
///
/// Returns `None` until at least one configuration has been processed.
pub fn estimate_remaining(processed: usize, total: usize, elapsed: Duration) -> Option<Duration> {
    if processed == 0 {
        return None;
    }
    let left = total.saturating_sub(processed);
    Some(elapsed.mul_f64(left as f64 / processed as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn remaining_time_is_linear_in_the_work_left() {
        let eta = estimate_remaining(10, 40, Duration::from_secs(20)).unwrap();
        assert_eq!(eta, Duration::from_secs(60));
        assert_eq!(
            estimate_remaining(40, 40, Duration::from_secs(20)),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn no_estimate_before_the_first_configuration() {
        assert_eq!(estimate_remaining(0, 40, Duration::from_secs(3)), None);
    }

    #[test]
    fn fraction_handles_an_empty_sweep() {
        assert_eq!(SweepStatus::new(0, 0, Duration::ZERO).fraction(), 1.0);
        assert_eq!(SweepStatus::new(1, 4, Duration::ZERO).fraction(), 0.25);
    }

    #[test]
    fn reporter_forwards_events_to_its_callback() {
        let seen = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::Message(text) = event {
                seen.lock().unwrap().push(text);
            }
        }));
        reporter.report(Progress::Message("hello".to_string()));
        reporter.report(Progress::TaskIncrement);
        drop(reporter);
        assert_eq!(seen.into_inner().unwrap(), vec!["hello".to_string()]);
    }
}
