//! Scheduler handle exposed by interpreters
//!
//! Paragraph scheduling lives outside this crate; interpreters only hand out
//! the scheduler their jobs should run on.

use parking_lot::Mutex;

/// A named execution lane for interpreter jobs
pub trait Scheduler: Send + Sync {
    fn name(&self) -> &str;

    /// Run `job` on this scheduler and block until it finishes
    fn run(&self, job: Box<dyn FnOnce() + Send + '_>);
}

/// Runs one job at a time on the calling thread
pub struct SerialScheduler {
    name: String,
    lane: Mutex<()>,
}

impl SerialScheduler {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lane: Mutex::new(()),
        }
    }
}

impl Scheduler for SerialScheduler {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, job: Box<dyn FnOnce() + Send + '_>) {
        let _lane = self.lane.lock();
        job();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_serial_scheduler_never_overlaps() {
        let scheduler = Arc::new(SerialScheduler::new("lane"));
        let running = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let scheduler = Arc::clone(&scheduler);
                let running = Arc::clone(&running);
                let max_seen = Arc::clone(&max_seen);
                thread::spawn(move || {
                    scheduler.run(Box::new(|| {
                        let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(10));
                        running.fetch_sub(1, Ordering::SeqCst);
                    }));
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.name(), "lane");
    }
}
