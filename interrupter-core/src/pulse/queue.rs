//! Parameter hand-off between the pulse generator and the pacing task.
//!
//! [`PacerLink`] holds a depth-2 [`PulseSpec`] queue and the "software
//! strategy is live" flag, both behind one `critical-section` mutex so the
//! producer (caller context) and consumer (pacing task) may run at different
//! priorities.
//!
//! ## Overwrite policy
//!
//! [`send_overwrite()`](PacerLink::send_overwrite) never blocks and never
//! fails: when the queue is full the oldest unread entry is discarded. The
//! consumer drains the queue and keeps only the newest entry, so a slow
//! pacing task honours the most recent update and skips the ones in between.
//!
//! ## Live flag
//!
//! The pacing task only touches the pulse channel inside
//! [`emit_if_live()`](PacerLink::emit_if_live). Once
//! [`revoke()`](PacerLink::revoke) has returned, no further software-paced
//! write can reach the channel, which is what lets the hardware-looped
//! strategy take the channel over safely.
//!
//! [`hand_over()`](PacerLink::hand_over) queues a spec and grants access in
//! the same critical section, so the pacing task never sees a handed-over
//! spec without the grant.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Deque;

use super::PulseSpec;
use crate::constants::PARAM_QUEUE_DEPTH;

struct Shared {
    queue: Deque<PulseSpec, PARAM_QUEUE_DEPTH>,
    live: bool,
}

/// Shared state between [`PulseGenerator`](super::PulseGenerator) and
/// [`PulsePacer`](super::PulsePacer). Usually placed in a `static`.
pub struct PacerLink {
    shared: Mutex<RefCell<Shared>>,
}

impl PacerLink {
    pub const fn new() -> Self {
        PacerLink {
            shared: Mutex::new(RefCell::new(Shared {
                queue: Deque::new(),
                live: false,
            })),
        }
    }

    /// Enqueue `spec`, discarding the oldest unread entry when full.
    pub fn send_overwrite(&self, spec: PulseSpec) {
        critical_section::with(|cs| {
            let mut shared = self.shared.borrow_ref_mut(cs);
            if shared.queue.is_full() {
                shared.queue.pop_front();
            }
            // Cannot fail: a slot was freed above.
            let _ = shared.queue.push_back(spec);
        });
    }

    /// Enqueue `spec` and grant channel access in one critical section.
    ///
    /// The pacing task never sees the spec without the grant, so it cannot
    /// drain it and then fail the emit.
    pub fn hand_over(&self, spec: PulseSpec) {
        critical_section::with(|cs| {
            let mut shared = self.shared.borrow_ref_mut(cs);
            if shared.queue.is_full() {
                shared.queue.pop_front();
            }
            let _ = shared.queue.push_back(spec);
            shared.live = true;
        });
    }

    /// Revoke channel access and leave only the stop sentinel pending, in
    /// one critical section.
    pub fn revoke(&self) {
        critical_section::with(|cs| {
            let mut shared = self.shared.borrow_ref_mut(cs);
            shared.live = false;
            shared.queue.clear();
            let _ = shared.queue.push_back(PulseSpec::STOPPED);
        });
    }

    /// Non-blocking receive of the oldest pending entry.
    pub fn try_recv(&self) -> Option<PulseSpec> {
        critical_section::with(|cs| self.shared.borrow_ref_mut(cs).queue.pop_front())
    }

    /// Empty the queue, returning the newest entry if there was any.
    pub fn drain_latest(&self) -> Option<PulseSpec> {
        critical_section::with(|cs| {
            let mut shared = self.shared.borrow_ref_mut(cs);
            let latest = shared.queue.back().copied();
            shared.queue.clear();
            latest
        })
    }

    pub fn has_pending(&self) -> bool {
        critical_section::with(|cs| !self.shared.borrow_ref(cs).queue.is_empty())
    }

    pub fn pending(&self) -> usize {
        critical_section::with(|cs| self.shared.borrow_ref(cs).queue.len())
    }

    /// Grant or revoke the pacing task's access to the pulse channel.
    pub fn set_live(&self, live: bool) {
        critical_section::with(|cs| self.shared.borrow_ref_mut(cs).live = live);
    }

    pub fn is_live(&self) -> bool {
        critical_section::with(|cs| self.shared.borrow_ref(cs).live)
    }

    /// Run `emit` while holding the critical section, only if live.
    ///
    /// Returns whether `emit` ran.
    pub fn emit_if_live(&self, emit: impl FnOnce()) -> bool {
        critical_section::with(|cs| {
            if self.shared.borrow_ref(cs).live {
                emit();
                true
            } else {
                false
            }
        })
    }
}

impl Default for PacerLink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(period: u32, width: u32) -> PulseSpec {
        PulseSpec {
            period_ticks: period,
            pulse_width_ticks: width,
        }
    }

    #[test]
    fn new_is_empty_and_not_live() {
        let link = PacerLink::new();
        assert!(!link.has_pending());
        assert!(!link.is_live());
        assert_eq!(link.try_recv(), None);
    }

    #[test]
    fn fifo_within_capacity() {
        let link = PacerLink::new();
        link.send_overwrite(spec(100, 10));
        link.send_overwrite(spec(200, 20));
        assert_eq!(link.pending(), 2);
        assert_eq!(link.try_recv(), Some(spec(100, 10)));
        assert_eq!(link.try_recv(), Some(spec(200, 20)));
        assert_eq!(link.try_recv(), None);
    }

    #[test]
    fn full_queue_discards_oldest() {
        let link = PacerLink::new();
        link.send_overwrite(spec(100, 10));
        link.send_overwrite(spec(200, 20));
        link.send_overwrite(spec(300, 30));

        assert_eq!(link.pending(), PARAM_QUEUE_DEPTH);
        assert_eq!(link.try_recv(), Some(spec(200, 20)));
        assert_eq!(link.try_recv(), Some(spec(300, 30)));
    }

    #[test]
    fn drain_latest_keeps_newest_only() {
        let link = PacerLink::new();
        for i in 1..=5 {
            link.send_overwrite(spec(i * 100, i));
        }
        assert_eq!(link.drain_latest(), Some(spec(500, 5)));
        assert!(!link.has_pending());
        assert_eq!(link.drain_latest(), None);
    }

    #[test]
    fn hand_over_queues_and_grants_together() {
        let link = PacerLink::new();
        link.send_overwrite(spec(100, 10));
        link.send_overwrite(spec(200, 20));

        link.hand_over(spec(300, 30));

        assert!(link.is_live());
        assert_eq!(link.pending(), PARAM_QUEUE_DEPTH);
        assert_eq!(link.drain_latest(), Some(spec(300, 30)));
    }

    #[test]
    fn revoke_leaves_only_stop_sentinel() {
        let link = PacerLink::new();
        link.hand_over(spec(100, 10));
        link.send_overwrite(spec(200, 20));

        link.revoke();

        assert!(!link.is_live());
        assert_eq!(link.pending(), 1);
        assert_eq!(link.try_recv(), Some(PulseSpec::STOPPED));
    }

    #[test]
    fn emit_runs_only_while_live() {
        let link = PacerLink::new();
        let mut count = 0;

        assert!(!link.emit_if_live(|| count += 1));
        link.set_live(true);
        assert!(link.emit_if_live(|| count += 1));
        link.set_live(false);
        assert!(!link.emit_if_live(|| count += 1));

        assert_eq!(count, 1);
    }
}
