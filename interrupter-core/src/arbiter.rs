//! Output mode and arm arbitration.
//!
//! [`ModeArbiter`] is the single owner of the output pin's routing slot. It
//! composes the [`PulseGenerator`] (Manual mode) and the
//! [`AudioEnvelopeSampler`] plus PWM channel (Audio mode), and decides which
//! of them, if any, is electrically connected to the pin.
//!
//! ## State machine
//!
//! ```text
//!              set_mode(Audio)
//!   Manual ────────────────────► Audio        × { Armed, Disarmed }
//!          ◄────────────────────
//!              set_mode(Manual)
//! ```
//!
//! Mode changes follow a strict four-step sequence so the pin is never
//! driven by two sources and never glitches high:
//!
//! 1. stop the active generator (pulse channel / ADC + PWM channel)
//! 2. route the pin to its GPIO latch and drive it low
//! 3. if armed, connect the new generator's signal
//! 4. start the new generator
//!
//! Arming and disarming only touch the routing: [`arm()`](ModeArbiter::arm)
//! connects the current mode's source without restarting it, and
//! [`disarm()`](ModeArbiter::disarm) always falls back to the passive route.

use embedded_hal::digital::OutputPin;

use crate::audio::{AudioEnvelopeSampler, Volume};
use crate::peripheral::{AdcContinuous, DutyPeripheral, PulsePeripheral, SignalRouter, SignalSource};
use crate::pulse::PulseGenerator;

/// Which generator feeds the pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputMode {
    /// Pulse train from the manual frequency / pulse-width settings.
    Manual,
    /// PWM duty following the audio input envelope.
    Audio,
}

impl OutputMode {
    /// Signal source that carries this mode's waveform.
    pub const fn source(self) -> SignalSource {
        match self {
            OutputMode::Manual => SignalSource::Pulse,
            OutputMode::Audio => SignalSource::Duty,
        }
    }
}

/// Whether the active generator is connected to the pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArmState {
    Armed,
    Disarmed,
}

/// Physical inputs delivering debounced edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    /// Held to arm the output.
    Trigger,
    /// Audio jack insertion switch: closed selects Audio mode.
    ModeSwitch,
}

/// Owner of the output pin and its two generators.
///
/// # Type parameters
///
/// - `P`: pulse channel, shared with the pacing task
/// - `O`: GPIO latch of the output pin
/// - `A`: continuous ADC
/// - `D`: PWM channel, shared with the ADC completion hook
/// - `R`: output-signal matrix
///
/// # Example
///
/// ```ignore
/// let pulse = PulseGenerator::new(&PULSE_CHANNEL, &PACER_LINK, latch);
/// let sampler = AudioEnvelopeSampler::new(adc).expect("ADC configuration");
/// let mut arbiter = ModeArbiter::new(pulse, sampler, &PWM_CHANNEL, router);
///
/// arbiter.manual_update(100, 50);
/// arbiter.on_button_edge(Button::Trigger, true);   // armed → pulses on pin
/// arbiter.on_button_edge(Button::ModeSwitch, true); // audio envelope on pin
/// ```
pub struct ModeArbiter<'a, P, O, A, D, R> {
    pulse: PulseGenerator<'a, P, O>,
    sampler: AudioEnvelopeSampler<A>,
    duty: &'a D,
    router: R,
    mode: OutputMode,
    arm: ArmState,
    routed: SignalSource,
}

impl<'a, P, O, A, D, R> ModeArbiter<'a, P, O, A, D, R>
where
    P: PulsePeripheral,
    O: OutputPin,
    A: AdcContinuous,
    D: DutyPeripheral,
    R: SignalRouter,
{
    /// Take ownership of the output stage.
    ///
    /// Starts disarmed in Manual mode with the pulse generator stopped and
    /// the pin latched low.
    pub fn new(
        pulse: PulseGenerator<'a, P, O>,
        sampler: AudioEnvelopeSampler<A>,
        duty: &'a D,
        router: R,
    ) -> Self {
        let mut arbiter = ModeArbiter {
            pulse,
            sampler,
            duty,
            router,
            mode: OutputMode::Manual,
            arm: ArmState::Disarmed,
            routed: SignalSource::Gpio,
        };
        arbiter.connect(SignalSource::Gpio);
        arbiter.pulse.stop();
        arbiter
    }

    // ── Arm / disarm ───────────────────────────────────────────────────

    /// Connect the current mode's generator to the pin. The generator keeps
    /// running as it was; nothing is restarted.
    pub fn arm(&mut self) {
        self.arm = ArmState::Armed;
        self.connect(self.mode.source());
        info!("arbiter: armed ({})", self.mode);
    }

    /// Route the pin to its passive GPIO latch, whatever the mode.
    pub fn disarm(&mut self) {
        self.arm = ArmState::Disarmed;
        self.connect(SignalSource::Gpio);
        info!("arbiter: disarmed");
    }

    // ── Mode ───────────────────────────────────────────────────────────

    /// Switch generators. No-op when `mode` is already active.
    pub fn set_mode(&mut self, mode: OutputMode) {
        if mode == self.mode {
            return;
        }
        info!("arbiter: mode {} -> {}", self.mode, mode);

        // 1. Stop the outgoing generator.
        match self.mode {
            OutputMode::Manual => self.pulse.suspend(),
            OutputMode::Audio => {
                self.sampler.stop();
                self.duty.halt();
            }
        }

        // 2. Safe state.
        self.connect(SignalSource::Gpio);
        self.pulse.force_low();
        self.mode = mode;

        // 3. Route.
        if self.arm == ArmState::Armed {
            self.connect(mode.source());
        }

        // 4. Start the incoming generator.
        match mode {
            OutputMode::Manual => self.pulse.resume(),
            OutputMode::Audio => self.sampler.listen(),
        }
    }

    pub fn get_mode(&self) -> OutputMode {
        self.mode
    }

    // ── Parameters ─────────────────────────────────────────────────────

    /// Recompute the manual pulse train. Takes effect immediately in Manual
    /// mode; otherwise it is kept for the next switch back to Manual.
    pub fn manual_update(&mut self, freq_hz: u16, pulse_width_us: u16) {
        self.pulse.update(freq_hz, pulse_width_us);
    }

    /// Store the audio output volume (currently not applied to the duty).
    pub fn set_volume(&mut self, level: u8) {
        self.sampler.set_volume(Volume::new(level));
    }

    // ── Inputs ─────────────────────────────────────────────────────────

    /// Dispatch a debounced button edge.
    ///
    /// | Button | Press | Release |
    /// |--------|-------|---------|
    /// | `Trigger` | arm | disarm |
    /// | `ModeSwitch` | Audio | Manual |
    pub fn on_button_edge(&mut self, button: Button, pressed: bool) {
        debug!("arbiter: {} {}", button, pressed);
        match (button, pressed) {
            (Button::Trigger, true) => self.arm(),
            (Button::Trigger, false) => self.disarm(),
            (Button::ModeSwitch, true) => self.set_mode(OutputMode::Audio),
            (Button::ModeSwitch, false) => self.set_mode(OutputMode::Manual),
        }
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn arm_state(&self) -> ArmState {
        self.arm
    }

    pub fn is_armed(&self) -> bool {
        self.arm == ArmState::Armed
    }

    /// Source currently connected to the pin.
    pub fn routed_source(&self) -> SignalSource {
        self.routed
    }

    pub fn pulse(&self) -> &PulseGenerator<'a, P, O> {
        &self.pulse
    }

    pub fn sampler(&self) -> &AudioEnvelopeSampler<A> {
        &self.sampler
    }

    fn connect(&mut self, source: SignalSource) {
        self.router.connect(source);
        self.routed = source;
    }
}
