//! Hardware seams of the output stage.
//!
//! The core drives four peripherals, each behind a small trait so that the
//! board crate supplies the register-level implementation and tests supply
//! recording mocks:
//!
//! | Trait | Hardware | Shared with |
//! |-------|----------|-------------|
//! | [`PulsePeripheral`] | Pulse (remote-control style) TX channel | Software pacing task |
//! | [`DutyPeripheral`] | Fixed-frequency 8-bit PWM channel | ADC completion ISR |
//! | [`SignalRouter`] | Output-signal matrix of the pin | |
//! | [`AdcContinuous`] | Continuous-conversion ADC | |
//!
//! Peripherals that are touched from more than one execution context take
//! `&self`; implementations perform each call as a single register update.
//! The pin's GPIO latch is an [`embedded_hal::digital::OutputPin`].

use crate::audio::DutyLevel;

/// One high/low duration pair, in pulse-channel ticks.
///
/// The high phase is emitted first, then the low phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseItem {
    /// Ticks the output spends high.
    pub high_ticks: u16,
    /// Ticks the output spends low.
    pub low_ticks: u16,
}

/// Pulse TX channel producing timed high/low transitions without per-cycle
/// software involvement.
pub trait PulsePeripheral {
    /// Duration of one channel tick in microseconds.
    const TICK_US: u32;

    /// Enable or disable continuous hardware looping of the last written item.
    fn set_loop(&self, enabled: bool);

    /// Start transmitting `item` (non-blocking). In loop mode the item
    /// repeats until [`stop_tx`](Self::stop_tx).
    fn write(&self, item: PulseItem);

    /// Halt any transmission in progress; the channel idles low.
    fn stop_tx(&self);
}

/// PWM channel whose duty is software-adjustable at a fixed carrier frequency.
pub trait DutyPeripheral {
    /// Latch a new duty level. Must be callable from interrupt context.
    ///
    /// Also restarts a channel stopped by [`halt`](Self::halt): nothing
    /// else brings it back when Audio mode is re-entered.
    fn set_duty(&self, level: DutyLevel);

    /// Stop the channel; the output idles low until the next
    /// [`set_duty`](Self::set_duty).
    fn halt(&self);
}

/// Signal source electrically connected to the output pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SignalSource {
    /// Passive routing: the pin follows its GPIO output latch.
    Gpio,
    /// Pulse TX channel.
    Pulse,
    /// Audio-duty PWM channel.
    Duty,
}

/// Output-signal matrix: selects which peripheral drives the pin.
pub trait SignalRouter {
    /// Connect `source` to the output pin, disconnecting the previous one.
    fn connect(&mut self, source: SignalSource);
}

/// Continuous-conversion ADC on the audio input pin.
pub trait AdcContinuous {
    /// Driver error type.
    type Error: core::fmt::Debug;

    /// One-time configuration of the conversion pattern and sample rate.
    fn configure(&mut self, sample_rate_hz: u32) -> Result<(), Self::Error>;

    /// Start continuous conversion.
    fn start(&mut self) -> Result<(), Self::Error>;

    /// Stop continuous conversion.
    fn stop(&mut self) -> Result<(), Self::Error>;
}
