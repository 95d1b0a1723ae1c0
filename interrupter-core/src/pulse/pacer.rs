//! Software-paced pulse task.
//!
//! Used when the requested period does not fit the pulse channel's duration
//! registers. Each iteration emits one pulse as a non-blocking one-shot write
//! and then sleeps for the whole period, so timing is only as precise as the
//! millisecond sleep granularity.
//!
//! ```text
//! loop:
//!   drain queue ──► newest spec (if any)
//!   stopped? ──yes──► park until a spec arrives
//!      │no
//!   one-shot write (only while live) ──► sleep period_ms
//! ```

use embedded_hal::delay::DelayNs;

use super::queue::PacerLink;
use super::PulseSpec;
use crate::constants::PACER_POLL_MS;
use crate::peripheral::PulsePeripheral;

/// What the task loop should do after one [`PulsePacer::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacerStep {
    /// Nothing to emit: block until new parameters arrive.
    Park,
    /// A pulse was emitted: sleep this many milliseconds.
    Sleep(u32),
}

/// Body of the software pacing task.
pub struct PulsePacer<'a, P> {
    channel: &'a P,
    link: &'a PacerLink,
    current: PulseSpec,
}

impl<'a, P: PulsePeripheral> PulsePacer<'a, P> {
    pub fn new(channel: &'a P, link: &'a PacerLink) -> Self {
        PulsePacer {
            channel,
            link,
            current: PulseSpec::STOPPED,
        }
    }

    /// Parameters the task is currently pacing.
    pub fn current(&self) -> PulseSpec {
        self.current
    }

    /// Run one loop iteration without sleeping.
    pub fn step(&mut self) -> PacerStep {
        if let Some(spec) = self.link.drain_latest() {
            self.current = spec;
        }

        if self.current.is_stopped() {
            return PacerStep::Park;
        }

        let item = self.current.one_shot_item();
        let channel = self.channel;
        if !self.link.emit_if_live(|| channel.write(item)) {
            // Channel handed to another strategy; wait for the generator.
            self.current = PulseSpec::STOPPED;
            return PacerStep::Park;
        }

        PacerStep::Sleep(self.current.period_ms(P::TICK_US).max(1))
    }

    /// Block until the generator sends new parameters.
    pub fn park<D: DelayNs>(&self, delay: &mut D) {
        while !self.link.has_pending() {
            delay.delay_ms(PACER_POLL_MS);
        }
    }

    /// Task entry point.
    pub fn run<D: DelayNs>(&mut self, delay: &mut D) -> ! {
        loop {
            match self.step() {
                PacerStep::Sleep(ms) => delay.delay_ms(ms),
                PacerStep::Park => self.park(delay),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{HwEvent, HwLog, MockDelay, MockPulse};
    use crate::peripheral::PulseItem;

    fn long_spec() -> PulseSpec {
        // 10 Hz at 1 µs/tick
        PulseSpec {
            period_ticks: 100_000,
            pulse_width_ticks: 500,
        }
    }

    #[test]
    fn parks_when_nothing_was_sent() {
        let log = HwLog::new();
        let channel = MockPulse::new(&log);
        let link = PacerLink::new();
        let mut pacer = PulsePacer::new(&channel, &link);

        assert_eq!(pacer.step(), PacerStep::Park);
        assert!(log.events().is_empty());
    }

    #[test]
    fn emits_one_shot_and_sleeps_for_period() {
        let log = HwLog::new();
        let channel = MockPulse::new(&log);
        let link = PacerLink::new();
        link.hand_over(long_spec());
        let mut pacer = PulsePacer::new(&channel, &link);

        assert_eq!(pacer.step(), PacerStep::Sleep(100));
        assert_eq!(pacer.step(), PacerStep::Sleep(100));

        let write = HwEvent::PulseWrite(PulseItem {
            high_ticks: 500,
            low_ticks: 500,
        });
        assert_eq!(log.events(), vec![write, write]);
    }

    #[test]
    fn stop_sentinel_parks_the_task() {
        let log = HwLog::new();
        let channel = MockPulse::new(&log);
        let link = PacerLink::new();
        link.hand_over(long_spec());
        let mut pacer = PulsePacer::new(&channel, &link);
        pacer.step();

        link.send_overwrite(PulseSpec::STOPPED);
        assert_eq!(pacer.step(), PacerStep::Park);
        assert!(pacer.current().is_stopped());
    }

    #[test]
    fn only_newest_update_is_honoured() {
        let log = HwLog::new();
        let channel = MockPulse::new(&log);
        let link = PacerLink::new();
        link.set_live(true);
        let mut pacer = PulsePacer::new(&channel, &link);

        link.send_overwrite(long_spec());
        link.send_overwrite(PulseSpec {
            period_ticks: 50_000,
            pulse_width_ticks: 100,
        });
        link.send_overwrite(PulseSpec {
            period_ticks: 40_000,
            pulse_width_ticks: 200,
        });

        assert_eq!(pacer.step(), PacerStep::Sleep(40));
        assert_eq!(pacer.current().pulse_width_ticks, 200);
    }

    #[test]
    fn revoked_link_blocks_channel_writes() {
        let log = HwLog::new();
        let channel = MockPulse::new(&log);
        let link = PacerLink::new();
        link.send_overwrite(long_spec());
        let mut pacer = PulsePacer::new(&channel, &link);

        assert_eq!(pacer.step(), PacerStep::Park);
        assert!(log.events().is_empty());
    }

    #[test]
    fn handed_over_spec_survives_an_early_wake() {
        let log = HwLog::new();
        let channel = MockPulse::new(&log);
        let link = PacerLink::new();
        let mut pacer = PulsePacer::new(&channel, &link);

        // Task wakes from its park poll just before the hand-over lands.
        assert_eq!(pacer.step(), PacerStep::Park);
        link.hand_over(long_spec());
        assert_eq!(pacer.step(), PacerStep::Sleep(100));
        assert_eq!(pacer.step(), PacerStep::Sleep(100));

        let writes = log
            .events()
            .iter()
            .filter(|e| matches!(e, HwEvent::PulseWrite(_)))
            .count();
        assert_eq!(writes, 2);
    }

    #[test]
    fn regranted_link_resumes_after_revoke() {
        let log = HwLog::new();
        let channel = MockPulse::new(&log);
        let link = PacerLink::new();
        let mut pacer = PulsePacer::new(&channel, &link);

        link.hand_over(long_spec());
        pacer.step();
        link.revoke();
        assert_eq!(pacer.step(), PacerStep::Park);

        link.hand_over(long_spec());
        assert_eq!(pacer.step(), PacerStep::Sleep(100));
    }

    #[test]
    fn park_returns_immediately_when_pending() {
        let log = HwLog::new();
        let link = PacerLink::new();
        link.send_overwrite(long_spec());
        let channel = MockPulse::new(&log);
        let pacer = PulsePacer::new(&channel, &link);
        let mut delay = MockDelay::new();

        pacer.park(&mut delay);
        assert!(delay.sleeps().is_empty());
    }

    /// Delay that hands parameters over on its `arrive_on`-th sleep.
    struct ArrivingDelay<'a> {
        link: &'a PacerLink,
        arrive_on: usize,
        sleeps: Vec<u32>,
    }

    impl DelayNs for ArrivingDelay<'_> {
        fn delay_ns(&mut self, _ns: u32) {}

        fn delay_ms(&mut self, ms: u32) {
            self.sleeps.push(ms);
            if self.sleeps.len() == self.arrive_on {
                self.link.hand_over(long_spec());
            }
        }
    }

    #[test]
    fn park_polls_until_parameters_arrive() {
        let log = HwLog::new();
        let link = PacerLink::new();
        let channel = MockPulse::new(&log);
        let mut pacer = PulsePacer::new(&channel, &link);
        let mut delay = ArrivingDelay {
            link: &link,
            arrive_on: 5,
            sleeps: Vec::new(),
        };

        assert_eq!(pacer.step(), PacerStep::Park);
        pacer.park(&mut delay);

        assert_eq!(delay.sleeps, vec![PACER_POLL_MS; 5]);
        assert_eq!(pacer.step(), PacerStep::Sleep(100));
        assert_eq!(log.events().len(), 1);
    }
}
