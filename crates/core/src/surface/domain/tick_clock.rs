use std::time::{Duration, Instant};

/// Fixed-rate presentation clock with an optional tick budget.
///
/// Deadlines advance by whole intervals from the previous deadline, not
/// from "now", so jitter in one tick does not drift the cadence.
#[derive(Debug)]
pub struct TickClock {
    rate: u32,
    interval: Duration,
    next_due: Option<Instant>,
    ticks: u64,
    max_ticks: Option<u64>,
    sleep: bool,
}

impl TickClock {
    /// A clock that sleeps until each tick is due.
    pub fn new(rate: u32) -> Self {
        let rate = rate.max(1);
        Self {
            rate,
            interval: Duration::from_secs_f64(1.0 / rate as f64),
            next_due: None,
            ticks: 0,
            max_ticks: None,
            sleep: true,
        }
    }

    /// A clock that counts ticks without sleeping.
    pub fn unpaced(rate: u32) -> Self {
        Self {
            sleep: false,
            ..Self::new(rate)
        }
    }

    pub fn with_max_ticks(mut self, max_ticks: Option<u64>) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    pub fn rate(&self) -> u32 {
        self.rate
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn budget_left(&self) -> bool {
        self.max_ticks.map_or(true, |max| self.ticks < max)
    }

    pub fn wait(&mut self) {
        self.ticks += 1;
        if !self.sleep {
            return;
        }
        let now = Instant::now();
        let due = next_deadline(self.next_due, self.interval, now);
        self.next_due = Some(due);
        if due > now {
            std::thread::sleep(due - now);
        }
    }
}

/// Next tick deadline after `previous`. Snaps forward when the previous
/// deadline fell more than one interval behind, so a stall is not followed
/// by a burst of catch-up ticks.
pub fn next_deadline(previous: Option<Instant>, interval: Duration, now: Instant) -> Instant {
    match previous {
        Some(due) => {
            let next = due + interval;
            if next + interval < now {
                now + interval
            } else {
                next
            }
        }
        None => now + interval,
    }
}
