use crate::clock::HostClock;
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Decides when the next frame runs.
///
/// The loop asks for a frame, runs one tick, and asks again. Returning `None`
/// is the host declining to schedule another frame; it is the only way the
/// loop ends.
pub trait FrameScheduler {
    /// Wait until the next frame is due and return its host timestamp (seconds).
    fn next_frame(&mut self) -> Option<f64>;
}

impl<S: FrameScheduler + ?Sized> FrameScheduler for &mut S {
    fn next_frame(&mut self) -> Option<f64> {
        (**self).next_frame()
    }
}

impl<S: FrameScheduler + ?Sized> FrameScheduler for Box<S> {
    fn next_frame(&mut self) -> Option<f64> {
        (**self).next_frame()
    }
}

/// Real-time scheduler pacing frames at a target framerate.
///
/// Sleeps with `spin_sleep` for the remainder of each frame budget. Stops
/// when the shared running flag is cleared or the optional frame limit is hit.
pub struct PacedScheduler {
    clock: HostClock,
    frame_duration: Duration,
    running: Arc<AtomicBool>,
    frame_limit: Option<u64>,
    frames: u64,
    last_frame: Option<Instant>,
}

impl PacedScheduler {
    pub fn new(clock: HostClock, framerate: u32) -> Self {
        Self {
            clock,
            frame_duration: Duration::from_secs_f64(1.0 / framerate.max(1) as f64),
            running: Arc::new(AtomicBool::new(true)),
            frame_limit: None,
            frames: 0,
            last_frame: None,
        }
    }

    pub fn with_frame_limit(mut self, limit: Option<u64>) -> Self {
        self.frame_limit = limit;
        self
    }

    /// Flag shared with signal handlers; store `false` to stop the loop.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame_duration
    }
}

impl FrameScheduler for PacedScheduler {
    fn next_frame(&mut self) -> Option<f64> {
        if !self.running.load(Ordering::SeqCst) {
            debug!("Scheduler stopped after {} frames", self.frames);
            return None;
        }
        if self.frame_limit.is_some_and(|limit| self.frames >= limit) {
            debug!("Frame limit of {} reached", self.frames);
            return None;
        }

        if let Some(last) = self.last_frame {
            let elapsed = last.elapsed();
            if elapsed < self.frame_duration {
                spin_sleep::sleep(self.frame_duration - elapsed);
            } else if elapsed > self.frame_duration * 2 {
                warn!(
                    "Frame lag detected: {:?} elapsed, budget {:?}",
                    elapsed, self.frame_duration
                );
            }
        }

        self.last_frame = Some(Instant::now());
        self.frames += 1;
        Some(self.clock.now())
    }
}

/// Fixed-step scheduler that never sleeps.
///
/// Produces `frames` timestamps spaced `step` seconds apart, then stops.
/// Used for headless runs and tests.
#[derive(Debug, Clone)]
pub struct ManualScheduler {
    now: f64,
    step: f64,
    remaining: u64,
}

impl ManualScheduler {
    pub fn new(step: f64, frames: u64) -> Self {
        Self { now: 0.0, step, remaining: frames }
    }

    pub fn starting_at(mut self, now: f64) -> Self {
        self.now = now;
        self
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl FrameScheduler for ManualScheduler {
    fn next_frame(&mut self) -> Option<f64> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.now += self.step;
        Some(self.now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_scheduler_yields_fixed_steps() {
        let mut scheduler = ManualScheduler::new(0.5, 3).starting_at(10.0);
        assert_eq!(scheduler.next_frame(), Some(10.5));
        assert_eq!(scheduler.next_frame(), Some(11.0));
        assert_eq!(scheduler.next_frame(), Some(11.5));
        assert_eq!(scheduler.next_frame(), None);
        assert_eq!(scheduler.remaining(), 0);
    }

    #[test]
    fn paced_scheduler_honours_frame_limit() {
        let mut scheduler = PacedScheduler::new(HostClock::new(), 1000).with_frame_limit(Some(3));
        let mut stamps = Vec::new();
        while let Some(now) = scheduler.next_frame() {
            stamps.push(now);
        }
        assert_eq!(stamps.len(), 3);
        assert!(stamps.windows(2).all(|w| w[1] >= w[0]));
        assert_eq!(scheduler.frames(), 3);
    }

    #[test]
    fn paced_scheduler_stops_on_flag() {
        let mut scheduler = PacedScheduler::new(HostClock::new(), 1000);
        assert!(scheduler.next_frame().is_some());
        scheduler.running_flag().store(false, Ordering::SeqCst);
        assert!(scheduler.next_frame().is_none());
    }

    #[test]
    fn stop_is_seen_through_shared_flag() {
        let mut scheduler = PacedScheduler::new(HostClock::new(), 1000);
        let flag = scheduler.running_flag();
        assert!(scheduler.next_frame().is_some());
        scheduler.stop();
        assert!(!flag.load(Ordering::SeqCst));
        assert!(scheduler.next_frame().is_none());
    }

    #[test]
    fn paced_scheduler_spaces_frames() {
        let mut scheduler = PacedScheduler::new(HostClock::new(), 200).with_frame_limit(Some(2));
        let first = scheduler.next_frame().unwrap();
        let second = scheduler.next_frame().unwrap();
        assert!(second - first >= 0.004);
    }

    #[test]
    fn boxed_scheduler_delegates() {
        let mut scheduler: Box<dyn FrameScheduler> = Box::new(ManualScheduler::new(1.0, 1));
        assert_eq!(scheduler.next_frame(), Some(1.0));
        assert_eq!(scheduler.next_frame(), None);
    }
}
