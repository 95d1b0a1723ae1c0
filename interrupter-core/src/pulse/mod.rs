//! Manual pulse-train generation.
//!
//! A manual request `(freq_hz, pulse_width_us)` is converted into a
//! [`PulseSpec`] in pulse-channel ticks and handed to one of two
//! [`PulseDriver`] strategies:
//!
//! | Strategy | Used when | Precision |
//! |----------|-----------|-----------|
//! | [`HardwareLoop`] | `period_ticks <= 32767` | Peripheral clock; no per-cycle software |
//! | [`SoftwarePaced`] | `period_ticks > 32767` | Millisecond sleep granularity |
//!
//! The hardware-looped strategy programs one high/low pair and lets the
//! channel repeat it. Longer periods overflow the 15-bit duration registers,
//! so the software strategy instead feeds a [`PulsePacer`] task through a
//! [`PacerLink`], trading timing precision for range.
//!
//! [`PulseGenerator`] owns both strategies and makes sure only one of them
//! drives the channel at any time.

pub mod pacer;
pub mod queue;

use embedded_hal::digital::OutputPin;

use crate::constants::PULSE_DURATION_MAX;
use crate::peripheral::{PulseItem, PulsePeripheral};

pub use pacer::{PacerStep, PulsePacer};
pub use queue::PacerLink;

// ── PulseSpec ──────────────────────────────────────────────────────────────

/// Pulse train parameters in pulse-channel ticks.
///
/// `pulse_width_ticks <= period_ticks / 2` always holds for specs built by
/// [`from_request()`](Self::from_request). A zero period or width is the
/// "stopped" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseSpec {
    pub period_ticks: u32,
    pub pulse_width_ticks: u32,
}

impl PulseSpec {
    /// Canonical stop sentinel.
    pub const STOPPED: PulseSpec = PulseSpec {
        period_ticks: 0,
        pulse_width_ticks: 0,
    };

    /// Convert a manual request into ticks of `tick_us` microseconds.
    ///
    /// `freq_hz == 0` or `pulse_width_us == 0` yields [`STOPPED`](Self::STOPPED).
    /// The width is clamped to half the period.
    pub fn from_request(freq_hz: u16, pulse_width_us: u16, tick_us: u32) -> Self {
        if freq_hz == 0 || pulse_width_us == 0 {
            return Self::STOPPED;
        }
        let tick_us = tick_us.max(1);
        let period_ticks = 1_000_000 / (freq_hz as u32).saturating_mul(tick_us);
        let pulse_width_ticks = (pulse_width_us as u32 / tick_us).min(period_ticks / 2);
        PulseSpec {
            period_ticks,
            pulse_width_ticks,
        }
    }

    pub const fn is_stopped(&self) -> bool {
        self.period_ticks == 0 || self.pulse_width_ticks == 0
    }

    /// Whether the period fits the channel's duration registers.
    pub const fn fits_hardware_loop(&self) -> bool {
        self.period_ticks <= PULSE_DURATION_MAX
    }

    /// Period in whole milliseconds (truncated).
    pub const fn period_ms(&self, tick_us: u32) -> u32 {
        self.period_ticks.saturating_mul(tick_us) / 1000
    }

    /// High/low pair repeated by the hardware loop: width high, remainder low.
    pub fn looped_item(&self) -> PulseItem {
        let high = self.pulse_width_ticks.min(PULSE_DURATION_MAX);
        let low = self
            .period_ticks
            .saturating_sub(self.pulse_width_ticks)
            .min(PULSE_DURATION_MAX);
        PulseItem {
            high_ticks: high as u16,
            low_ticks: low as u16,
        }
    }

    /// Pair emitted once per software-paced period. The low phase only
    /// returns the line to idle; the rest of the period is slept.
    pub fn one_shot_item(&self) -> PulseItem {
        let width = self.pulse_width_ticks.min(PULSE_DURATION_MAX) as u16;
        PulseItem {
            high_ticks: width,
            low_ticks: width,
        }
    }
}

/// Which strategy currently owns the pulse channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Strategy {
    Stopped,
    HardwareLoop,
    SoftwarePaced,
}

impl Strategy {
    pub fn for_spec(spec: &PulseSpec) -> Self {
        if spec.is_stopped() {
            Strategy::Stopped
        } else if spec.fits_hardware_loop() {
            Strategy::HardwareLoop
        } else {
            Strategy::SoftwarePaced
        }
    }
}

// ── Drivers ────────────────────────────────────────────────────────────────

/// One way of turning a [`PulseSpec`] into a waveform on the pulse channel.
pub trait PulseDriver {
    /// Start (or retune) the waveform.
    fn start(&mut self, spec: PulseSpec);

    /// Stop emitting. Idempotent.
    fn halt(&mut self);
}

/// Continuous hardware-looped transmission of one high/low pair.
pub struct HardwareLoop<'a, P> {
    channel: &'a P,
}

impl<'a, P: PulsePeripheral> HardwareLoop<'a, P> {
    pub fn new(channel: &'a P) -> Self {
        HardwareLoop { channel }
    }
}

impl<P: PulsePeripheral> PulseDriver for HardwareLoop<'_, P> {
    fn start(&mut self, spec: PulseSpec) {
        self.channel.set_loop(true);
        self.channel.write(spec.looped_item());
    }

    fn halt(&mut self) {
        self.channel.stop_tx();
    }
}

/// Hand-off to the [`PulsePacer`] task through a [`PacerLink`].
pub struct SoftwarePaced<'a, P> {
    channel: &'a P,
    link: &'a PacerLink,
}

impl<'a, P: PulsePeripheral> SoftwarePaced<'a, P> {
    pub fn new(channel: &'a P, link: &'a PacerLink) -> Self {
        SoftwarePaced { channel, link }
    }
}

impl<P: PulsePeripheral> PulseDriver for SoftwarePaced<'_, P> {
    fn start(&mut self, spec: PulseSpec) {
        self.channel.set_loop(false);
        self.link.hand_over(spec);
    }

    fn halt(&mut self) {
        self.link.revoke();
    }
}

// ── Generator ──────────────────────────────────────────────────────────────

/// Manual pulse-train generator.
///
/// Owns both strategies and the GPIO latch of the output pin. Every update
/// picks the strategy from the period magnitude; switching strategy halts
/// the previous one before the new one starts.
///
/// # Example
///
/// ```ignore
/// static LINK: PacerLink = PacerLink::new();
///
/// let mut pulse = PulseGenerator::new(&PULSE_CHANNEL, &LINK, latch);
/// pulse.update(500, 100);   // 500 Hz, 100 µs → hardware loop
/// pulse.update(5, 100);     // 5 Hz → software-paced task
/// pulse.update(0, 100);     // stop, pin low
/// ```
pub struct PulseGenerator<'a, P, O> {
    hardware: HardwareLoop<'a, P>,
    software: SoftwarePaced<'a, P>,
    pin: O,
    spec: PulseSpec,
    live: Strategy,
    suspended: bool,
}

impl<'a, P, O> PulseGenerator<'a, P, O>
where
    P: PulsePeripheral,
    O: OutputPin,
{
    pub fn new(channel: &'a P, link: &'a PacerLink, pin: O) -> Self {
        PulseGenerator {
            hardware: HardwareLoop::new(channel),
            software: SoftwarePaced::new(channel, link),
            pin,
            spec: PulseSpec::STOPPED,
            live: Strategy::Stopped,
            suspended: false,
        }
    }

    /// Apply a manual request. `freq_hz == 0 || pulse_width_us == 0` stops
    /// the output and forces the pin low.
    pub fn update(&mut self, freq_hz: u16, pulse_width_us: u16) {
        self.apply(PulseSpec::from_request(freq_hz, pulse_width_us, P::TICK_US));
    }

    /// Stop the output; same as an update with a zero frequency.
    pub fn stop(&mut self) {
        self.apply(PulseSpec::STOPPED);
    }

    /// Record `spec` and drive it unless suspended.
    pub fn apply(&mut self, spec: PulseSpec) {
        self.spec = spec;
        if !self.suspended {
            self.drive(spec);
        }
    }

    /// Halt whichever strategy is live and hold further updates until
    /// [`resume()`](Self::resume).
    pub fn suspend(&mut self) {
        self.hardware.halt();
        self.software.halt();
        self.live = Strategy::Stopped;
        self.suspended = true;
    }

    /// Restart with the most recent spec.
    pub fn resume(&mut self) {
        self.suspended = false;
        self.drive(self.spec);
    }

    /// Drive the pin's GPIO latch low.
    pub fn force_low(&mut self) {
        if let Err(e) = self.pin.set_low() {
            error!("pulse: failed to drive pin low: {}", crate::log::Debug2Format(&e));
        }
    }

    pub fn spec(&self) -> PulseSpec {
        self.spec
    }

    pub fn strategy(&self) -> Strategy {
        self.live
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    fn drive(&mut self, spec: PulseSpec) {
        let target = Strategy::for_spec(&spec);
        if target != self.live {
            debug!("pulse: strategy {} -> {}", self.live, target);
        }

        if target == Strategy::Stopped {
            // Both strategies, whichever was live.
            self.hardware.halt();
            self.software.halt();
            self.force_low();
            self.live = target;
            return;
        }

        if target != self.live {
            match self.live {
                Strategy::HardwareLoop => self.hardware.halt(),
                Strategy::SoftwarePaced => self.software.halt(),
                Strategy::Stopped => {}
            }
        }
        match target {
            Strategy::HardwareLoop => self.hardware.start(spec),
            Strategy::SoftwarePaced => self.software.start(spec),
            Strategy::Stopped => {}
        }
        self.live = target;
    }
}
