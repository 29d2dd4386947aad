// src/utils/progress_bars/progress_callback.rs - Progress callbacks for batch runs

use indicatif::ProgressBar;
use log::debug;
use std::sync::Arc;
use std::time::Instant;

/// Takes a phase name and optional detailed progress information.
pub type ProgressCallback = Arc<dyn Fn(String, Option<String>) + Send + Sync>;

/// Callback that only logs at debug level.
pub fn create_simple_callback(task_name: &str) -> ProgressCallback {
    let task_name = task_name.to_string();
    Arc::new(move |phase: String, details: Option<String>| {
        let detail_str = details.map(|d| format!(" - {}", d)).unwrap_or_default();
        debug!("[{}] Progress: {}{}", task_name, phase, detail_str);
    })
}

/// Callback driving an indicatif bar. Details of the form `current/total`
/// move the bar; anything else becomes its message.
pub fn create_bar_callback(bar: ProgressBar) -> ProgressCallback {
    Arc::new(move |phase: String, details: Option<String>| {
        let position = details.as_deref().and_then(parse_position);
        match position {
            Some((current, total)) => {
                bar.set_length(total);
                bar.set_position(current);
                bar.set_message(phase);
            }
            None => match details {
                Some(d) => bar.set_message(format!("{} - {}", phase, d)),
                None => bar.set_message(phase),
            },
        }
    })
}

fn parse_position(details: &str) -> Option<(u64, u64)> {
    let head = details.split_whitespace().next()?;
    let (current, total) = head.split_once('/')?;
    Some((current.parse().ok()?, total.parse().ok()?))
}

/// Reports a phase and optional details through an `Option<ProgressCallback>`.
#[macro_export]
macro_rules! update_progress {
    ($callback:expr, $phase:expr) => {
        if let Some(ref cb) = $callback {
            cb($phase.to_string(), None);
        }
    };
    ($callback:expr, $phase:expr, $details:expr) => {
        if let Some(ref cb) = $callback {
            cb($phase.to_string(), Some($details.to_string()));
        }
    };
}

/// Reports `current/total`, optionally followed by extra information.
#[macro_export]
macro_rules! update_detailed_progress {
    ($callback:expr, $phase:expr, $current:expr, $total:expr) => {
        if let Some(ref cb) = $callback {
            cb($phase.to_string(), Some(format!("{}/{}", $current, $total)));
        }
    };
    ($callback:expr, $phase:expr, $current:expr, $total:expr, $extra:expr) => {
        if let Some(ref cb) = $callback {
            cb(
                $phase.to_string(),
                Some(format!("{}/{} ({})", $current, $total, $extra)),
            );
        }
    };
}

/// Phase-aware wrapper around an optional callback.
pub struct ProgressTracker {
    callback: Option<ProgressCallback>,
    current_phase: String,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(callback: Option<ProgressCallback>) -> Self {
        Self {
            callback,
            current_phase: "Initializing".to_string(),
            start_time: Instant::now(),
        }
    }

    pub fn set_phase(&mut self, phase: &str) {
        self.current_phase = phase.to_string();
        update_progress!(self.callback, phase);
    }

    pub fn update_progress(&self, current: usize, total: usize) {
        update_detailed_progress!(self.callback, self.current_phase, current, total);
    }

    pub fn finish_phase(&self, summary: &str) {
        let elapsed = self.start_time.elapsed();
        update_progress!(
            self.callback,
            "Completed",
            format!("{} in {:.2}s", summary, elapsed.as_secs_f64())
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn test_progress_tracker_forwards_calls() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let callback: ProgressCallback = Arc::new(move |phase: String, details: Option<String>| {
            seen_clone.lock().unwrap().push((phase, details));
        });

        let mut tracker = ProgressTracker::new(Some(callback));
        tracker.set_phase("Matching");
        tracker.update_progress(5, 20);
        tracker.finish_phase("20 queries");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0], ("Matching".to_string(), None));
        assert_eq!(seen[1], ("Matching".to_string(), Some("5/20".to_string())));
        assert_eq!(seen[2].0, "Completed");
        assert!(seen[2].1.as_deref().unwrap_or("").starts_with("20 queries in"));
    }

    #[test]
    fn test_tracker_without_callback_is_silent() {
        let mut tracker = ProgressTracker::new(None);
        tracker.set_phase("Matching");
        tracker.update_progress(1, 2);
        tracker.finish_phase("done");
    }

    #[test]
    fn test_macros_with_counter() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let cb: Option<ProgressCallback> = Some(Arc::new(move |_p: String, _d: Option<String>| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        }));
        update_progress!(cb, "phase");
        update_progress!(cb, "phase", "details");
        update_detailed_progress!(cb, "phase", 1, 3);
        update_detailed_progress!(cb, "phase", 2, 3, "matched 1");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_bar_callback_moves_position() {
        let bar = ProgressBar::hidden();
        let cb = create_bar_callback(bar.clone());
        cb("Matching".into(), Some("3/10 (matched 2)".into()));
        assert_eq!(bar.position(), 3);
        assert_eq!(bar.length(), Some(10));
        cb("Fetching".into(), Some("registry slow".into()));
        assert_eq!(bar.position(), 3);
    }

    #[test]
    fn test_simple_callback_does_not_panic() {
        let callback = create_simple_callback("batch");
        callback("Phase".to_string(), Some("details".to_string()));
        callback("Phase".to_string(), None);
    }
}
