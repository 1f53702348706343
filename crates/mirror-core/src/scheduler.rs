//! Fixed-delay scheduling loop

use std::thread;
use std::time::{Duration, Instant};

use crate::stop::StopToken;

/// How often a waiting scheduler checks for a stop request.
pub const DEFAULT_POLL: Duration = Duration::from_millis(100);

const MIN_POLL: Duration = Duration::from_millis(1);

/// Runs an action once per interval until stopped.
///
/// Fixed delay: the first run happens one full interval after [`run`](Self::run)
/// is called, each next run one full interval after the previous one
/// returned. Runs never overlap and there is no catch-up for time spent
/// inside the action.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    interval: Duration,
    poll: Duration,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            poll: DEFAULT_POLL.min(interval).max(MIN_POLL),
        }
    }

    /// Set the stop-check granularity, clamped to the interval.
    pub fn with_poll(mut self, poll: Duration) -> Self {
        self.poll = poll.min(self.interval).max(MIN_POLL);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Block until `stop` is set, calling `action` once per interval.
    ///
    /// Returns the number of completed runs.
    pub fn run<F: FnMut()>(&self, stop: &StopToken, mut action: F) -> u64 {
        let mut runs = 0;
        loop {
            // None: the interval reaches past what Instant can represent
            let deadline = Instant::now().checked_add(self.interval);
            if !self.wait_until(deadline, stop) {
                tracing::debug!(runs, "scheduler stopped");
                return runs;
            }
            action();
            runs += 1;
        }
    }

    /// Sleep until `deadline`, or until stopped if there is none. Returns
    /// `false` if stopped first.
    fn wait_until(&self, deadline: Option<Instant>, stop: &StopToken) -> bool {
        loop {
            if stop.is_stopped() {
                return false;
            }
            let nap = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return true;
                    }
                    (deadline - now).min(self.poll)
                }
                None => self.poll,
            };
            thread::sleep(nap);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_run_waits_one_interval() {
        let scheduler = Scheduler::new(Duration::from_millis(50));
        let stop = StopToken::new();
        let started = Instant::now();
        let mut first_run = None;

        let runs = scheduler.run(&stop, || {
            first_run = Some(started.elapsed());
            stop.stop();
        });

        assert_eq!(runs, 1);
        assert!(first_run.unwrap() >= Duration::from_millis(50));
    }

    #[test]
    fn runs_until_stopped() {
        let scheduler = Scheduler::new(Duration::from_millis(5));
        let stop = StopToken::new();
        let mut count = 0;

        let runs = scheduler.run(&stop, || {
            count += 1;
            if count == 3 {
                stop.stop();
            }
        });

        assert_eq!(runs, 3);
        assert_eq!(count, 3);
    }

    #[test]
    fn stopped_before_first_tick_never_runs() {
        let scheduler = Scheduler::new(Duration::from_secs(3600));
        let stop = StopToken::new();
        stop.stop();

        let runs = scheduler.run(&stop, || panic!("must not run"));

        assert_eq!(runs, 0);
    }

    #[test]
    fn unrepresentable_deadline_waits_for_stop() {
        let scheduler =
            Scheduler::new(Duration::from_secs(u64::MAX)).with_poll(Duration::from_millis(5));
        let stop = StopToken::new();
        let remote = stop.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            remote.stop();
        });

        let runs = scheduler.run(&stop, || panic!("must not run"));
        handle.join().unwrap();

        assert_eq!(runs, 0);
    }

    #[test]
    fn stop_from_another_thread_interrupts_wait() {
        let scheduler = Scheduler::new(Duration::from_secs(3600)).with_poll(Duration::from_millis(5));
        let stop = StopToken::new();
        let remote = stop.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            remote.stop();
        });

        let started = Instant::now();
        let runs = scheduler.run(&stop, || {});
        handle.join().unwrap();

        assert_eq!(runs, 0);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn delay_counts_from_end_of_previous_run() {
        let scheduler = Scheduler::new(Duration::from_millis(20));
        let stop = StopToken::new();
        let mut ends: Vec<Instant> = Vec::new();
        let mut starts: Vec<Instant> = Vec::new();

        scheduler.run(&stop, || {
            starts.push(Instant::now());
            thread::sleep(Duration::from_millis(30));
            ends.push(Instant::now());
            if ends.len() == 2 {
                stop.stop();
            }
        });

        assert_eq!(starts.len(), 2);
        assert!(starts[1] >= ends[0] + Duration::from_millis(20));
    }

    #[test]
    fn poll_is_clamped() {
        let scheduler = Scheduler::new(Duration::from_millis(10)).with_poll(Duration::from_secs(1));
        assert_eq!(scheduler.poll, Duration::from_millis(10));

        let scheduler = Scheduler::new(Duration::ZERO);
        assert_eq!(scheduler.poll, MIN_POLL);
    }
}
