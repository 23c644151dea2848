//! Timer/scheduler engine.
//!
//! Periodic work that is not tied to command traffic (telemetry
//! broadcast) runs from here.  The scheduler notifies a
//! [`SchedulerDelegate`] when schedules fire; the control loop
//! implements the delegate.
//!
//! ```text
//!   run_cycle(now_ms)
//!        │
//!        ▼
//!  ┌───────────┐   now - last_fire >= interval   ┌───────────────────┐
//!  │ Scheduler │ ──────────────────────────────▶ │ SchedulerDelegate │
//!  └───────────┘        last_fire = now          └───────────────────┘
//! ```
//!
//! Timing is wall-clock based: the last-fire timestamp is compared
//! against the current time each call.  Drift is not corrected; only
//! the interval floor is guaranteed.

use crate::app::ports::SchedulerDelegate;
use log::{debug, info};

// ═══════════════════════════════════════════════════════════════
//  Schedule types
// ═══════════════════════════════════════════════════════════════

/// A single periodic schedule.
#[derive(Debug, Clone)]
pub struct Schedule {
    /// Label handed to the delegate (e.g. `"telemetry"`).
    pub label: &'static str,
    /// Minimum milliseconds between two fires.
    pub interval_ms: u32,
    /// Whether this schedule is currently enabled.
    pub enabled: bool,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Maximum number of concurrent schedules (stack-allocated).
const MAX_SCHEDULES: usize = 4;

/// The scheduler engine.
///
/// When a schedule fires it invokes the [`SchedulerDelegate`] callback
/// rather than doing the work itself, so the scheduler is testable
/// without a transport.
pub struct Scheduler {
    /// Active schedules.
    schedules: [Option<ScheduleEntry>; MAX_SCHEDULES],
    /// Global enable flag.
    enabled: bool,
}

/// Internal bookkeeping for a live schedule.
#[derive(Debug, Clone)]
struct ScheduleEntry {
    schedule: Schedule,
    last_fire_ms: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            schedules: [None, None, None, None],
            enabled: true,
        }
    }

    /// Add a schedule whose first interval starts at `now_ms`.
    /// Returns the slot index, or `None` if full.
    pub fn add(&mut self, schedule: Schedule, now_ms: u64) -> Option<usize> {
        for (i, slot) in self.schedules.iter_mut().enumerate() {
            if slot.is_none() {
                info!(
                    "Scheduler: added '{}' every {} ms at slot {}",
                    schedule.label, schedule.interval_ms, i
                );
                *slot = Some(ScheduleEntry {
                    schedule,
                    last_fire_ms: now_ms,
                });
                return Some(i);
            }
        }
        None // All slots full.
    }

    /// Remove a schedule by slot index.
    pub fn remove(&mut self, slot: usize) {
        if slot < MAX_SCHEDULES {
            if let Some(entry) = &self.schedules[slot] {
                info!("Scheduler: removed '{}' from slot {}", entry.schedule.label, slot);
            }
            self.schedules[slot] = None;
        }
    }

    /// Enable or disable the entire scheduler.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Check every schedule against `now_ms`.  Call once per control
    /// loop cycle.
    ///
    /// A schedule fires when at least `interval_ms` have passed since
    /// its last due time.  Fires stay on the `start + k * interval` grid
    /// while the loop keeps up; after a stall longer than one interval
    /// the grid restarts at `now_ms`, so a stall fires once, not once per
    /// missed interval.
    pub fn tick(&mut self, now_ms: u64, delegate: &mut dyn SchedulerDelegate) {
        if !self.enabled {
            return;
        }

        for slot in &mut self.schedules {
            let entry = match slot {
                Some(e) if e.schedule.enabled => e,
                _ => continue,
            };

            if now_ms.saturating_sub(entry.last_fire_ms) >= u64::from(entry.schedule.interval_ms) {
                debug!("Scheduler: '{}' fired at {} ms", entry.schedule.label, now_ms);
                let interval = u64::from(entry.schedule.interval_ms);
                let due = entry.last_fire_ms + interval;
                entry.last_fire_ms = if now_ms - due >= interval { now_ms } else { due };
                delegate.on_schedule_fired(entry.schedule.label, now_ms);
            }
        }
    }

    /// Number of active (enabled) schedules.
    pub fn active_count(&self) -> usize {
        self.schedules
            .iter()
            .filter(|s| s.as_ref().is_some_and(|e| e.schedule.enabled))
            .count()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
