//! Audio envelope sampling.
//!
//! The audio input is sampled continuously at [`SAMPLE_RATE_HZ`]. Each
//! completed conversion frame is handled inside the ADC completion interrupt
//! by a [`ConversionHook`], which rescales the 12-bit sample into an 8-bit
//! duty level and hands it to a [`DutySink`] (normally the PWM channel):
//!
//! ```text
//! ADC ──ISR──► ConversionHook ──raw * 255 / 4095──► DutySink::publish()
//! ```
//!
//! The hook is split from [`AudioEnvelopeSampler`] so the interrupt handler
//! can own it outright: it performs one fixed-size read, one integer rescale
//! and one publish call, with no locking, blocking or allocation.
//!
//! Duty updates flow whether or not the PWM channel is routed to the pin; in
//! Manual mode they are simply not electrically visible.

use crate::constants::{ADC_MAX, ADC_RESULT_BYTES, DUTY_MAX, SAMPLE_RATE_HZ};
use crate::peripheral::{AdcContinuous, DutyPeripheral};

/// Mask of the 12-bit data field in a "type 2" ADC result word.
const TYPE2_DATA_MASK: u32 = 0x0FFF;

// ── Value types ────────────────────────────────────────────────────────────

/// Raw 12-bit ADC code in `0..=4095`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample(u16);

impl RawSample {
    /// Create a sample, saturating at [`ADC_MAX`].
    pub const fn new(raw: u16) -> Self {
        if raw > ADC_MAX {
            RawSample(ADC_MAX)
        } else {
            RawSample(raw)
        }
    }

    /// Extract the data field of a "type 2" result word
    /// (`data:12 | channel:4 | unit:1 | reserved:15`, little-endian).
    pub const fn from_type2_word(word: u32) -> Self {
        RawSample((word & TYPE2_DATA_MASK) as u16)
    }

    /// The raw code.
    pub const fn get(self) -> u16 {
        self.0
    }

    /// Linear rescale into a duty level: `clamp(raw * 255 / 4095, 0, 255)`.
    pub const fn to_duty(self) -> DutyLevel {
        let mapped = self.0 as u32 * DUTY_MAX as u32 / ADC_MAX as u32;
        if mapped > DUTY_MAX as u32 {
            DutyLevel(DUTY_MAX)
        } else {
            DutyLevel(mapped as u8)
        }
    }
}

/// PWM duty level: 0 = always low, 255 = always high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DutyLevel(u8);

impl DutyLevel {
    /// Output held low.
    pub const ZERO: DutyLevel = DutyLevel(0);
    /// Output held high.
    pub const MAX: DutyLevel = DutyLevel(DUTY_MAX);

    /// Duty level from an 8-bit value; every value is valid.
    pub const fn new(level: u8) -> Self {
        DutyLevel(level)
    }

    /// The 8-bit level.
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl From<u8> for DutyLevel {
    fn from(level: u8) -> Self {
        DutyLevel(level)
    }
}

/// Output volume in `0..=255`.
///
/// Stored by the sampler but not applied to the duty mapping; the envelope
/// is always rescaled over the full ADC range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Volume(u8);

impl Volume {
    /// Volume from an 8-bit value; every value is valid.
    pub const fn new(level: u8) -> Self {
        Volume(level)
    }

    /// The stored level.
    pub const fn get(self) -> u8 {
        self.0
    }
}

// ── ISR side ───────────────────────────────────────────────────────────────

/// Receiver of duty levels produced in interrupt context.
///
/// Implementations must not block, allocate or take locks.
pub trait DutySink {
    fn publish(&self, level: DutyLevel);
}

impl<D: DutyPeripheral + ?Sized> DutySink for &D {
    fn publish(&self, level: DutyLevel) {
        (**self).set_duty(level);
    }
}

/// Completion hook run by the ADC conversion-done interrupt.
///
/// The sink is fixed at construction. A hook built with
/// [`unset()`](Self::unset) decodes frames and drops them.
pub struct ConversionHook<S> {
    sink: Option<S>,
}

impl<S: DutySink> ConversionHook<S> {
    /// Hook publishing every decoded sample to `sink`.
    pub const fn new(sink: S) -> Self {
        ConversionHook { sink: Some(sink) }
    }

    /// Hook with no sink: samples are dropped silently.
    pub const fn unset() -> Self {
        ConversionHook { sink: None }
    }

    /// Whether a sink is installed.
    pub fn is_set(&self) -> bool {
        self.sink.is_some()
    }

    /// Handle one completed conversion frame.
    ///
    /// Only the first result word is read; a frame shorter than one word is
    /// dropped. Call from the ADC completion interrupt.
    #[inline]
    pub fn on_conversion_done(&self, frame: &[u8]) {
        let Some(bytes) = frame.get(..ADC_RESULT_BYTES) else {
            return;
        };
        let word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let level = RawSample::from_type2_word(word).to_duty();

        if let Some(sink) = &self.sink {
            sink.publish(level);
        }
    }
}

// ── Task side ──────────────────────────────────────────────────────────────

/// Sampler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SamplerState {
    /// Conversions stopped.
    Idle,
    /// Continuous conversion running; the hook is firing.
    Listening,
}

/// Start/stop control of the continuous ADC.
///
/// [`listen()`](Self::listen) and [`stop()`](Self::stop) are idempotent. A
/// driver failure at runtime is logged and absorbed; the state still tracks
/// the last request.
pub struct AudioEnvelopeSampler<A> {
    adc: A,
    state: SamplerState,
    volume: Volume,
}

impl<A: AdcContinuous> AudioEnvelopeSampler<A> {
    /// Configure `adc` for continuous sampling at [`SAMPLE_RATE_HZ`].
    ///
    /// A configuration failure is a boot-time hardware fault and is returned
    /// to the caller unchanged.
    pub fn new(mut adc: A) -> Result<Self, A::Error> {
        adc.configure(SAMPLE_RATE_HZ)?;
        Ok(AudioEnvelopeSampler {
            adc,
            state: SamplerState::Idle,
            volume: Volume::default(),
        })
    }

    /// Start continuous sampling. No-op while already listening.
    pub fn listen(&mut self) {
        if self.state == SamplerState::Listening {
            return;
        }
        self.state = SamplerState::Listening;
        if let Err(e) = self.adc.start() {
            warn!("audio: ADC start failed: {}", crate::log::Debug2Format(&e));
        }
    }

    /// Stop sampling. No-op while already idle.
    pub fn stop(&mut self) {
        if self.state == SamplerState::Idle {
            return;
        }
        self.state = SamplerState::Idle;
        if let Err(e) = self.adc.stop() {
            warn!("audio: ADC stop failed: {}", crate::log::Debug2Format(&e));
        }
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state == SamplerState::Listening
    }

    /// Store the output volume. Has no effect on the duty mapping.
    pub fn set_volume(&mut self, volume: Volume) {
        self.volume = volume;
    }

    pub fn volume(&self) -> Volume {
        self.volume
    }
}
