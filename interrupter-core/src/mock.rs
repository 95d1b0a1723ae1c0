//! Recording mock peripherals for host tests.
//!
//! Every mock appends to one shared [`HwLog`], so tests can assert on the
//! exact interleaving of operations across peripherals.

use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};

use crate::audio::DutyLevel;
use crate::peripheral::{AdcContinuous, DutyPeripheral, PulseItem, PulsePeripheral, SignalRouter, SignalSource};

/// One observable hardware operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwEvent {
    AdcConfigure(u32),
    AdcStart,
    AdcStop,
    Duty(u8),
    DutyHalt,
    PulseLoop(bool),
    PulseWrite(PulseItem),
    PulseStop,
    Route(SignalSource),
    PinLow,
    PinHigh,
}

/// Shared, chronological log of [`HwEvent`]s.
#[derive(Clone, Default)]
pub struct HwLog(Rc<RefCell<Vec<HwEvent>>>);

impl HwLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: HwEvent) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<HwEvent> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

// ── ADC ────────────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
pub struct MockError;

pub struct MockAdc {
    log: HwLog,
    pub fail_configure: bool,
    pub fail_start: bool,
}

impl MockAdc {
    pub fn new(log: &HwLog) -> Self {
        MockAdc {
            log: log.clone(),
            fail_configure: false,
            fail_start: false,
        }
    }
}

impl AdcContinuous for MockAdc {
    type Error = MockError;

    fn configure(&mut self, sample_rate_hz: u32) -> Result<(), MockError> {
        if self.fail_configure {
            return Err(MockError);
        }
        self.log.push(HwEvent::AdcConfigure(sample_rate_hz));
        Ok(())
    }

    fn start(&mut self) -> Result<(), MockError> {
        self.log.push(HwEvent::AdcStart);
        if self.fail_start {
            Err(MockError)
        } else {
            Ok(())
        }
    }

    fn stop(&mut self) -> Result<(), MockError> {
        self.log.push(HwEvent::AdcStop);
        Ok(())
    }
}

// ── PWM / pulse channels ───────────────────────────────────────────────────

pub struct MockDuty {
    log: HwLog,
}

impl MockDuty {
    pub fn new(log: &HwLog) -> Self {
        MockDuty { log: log.clone() }
    }
}

impl DutyPeripheral for MockDuty {
    fn set_duty(&self, level: DutyLevel) {
        self.log.push(HwEvent::Duty(level.get()));
    }

    fn halt(&self) {
        self.log.push(HwEvent::DutyHalt);
    }
}

pub struct MockPulse {
    log: HwLog,
}

impl MockPulse {
    pub fn new(log: &HwLog) -> Self {
        MockPulse { log: log.clone() }
    }
}

impl PulsePeripheral for MockPulse {
    const TICK_US: u32 = 1;

    fn set_loop(&self, enabled: bool) {
        self.log.push(HwEvent::PulseLoop(enabled));
    }

    fn write(&self, item: PulseItem) {
        self.log.push(HwEvent::PulseWrite(item));
    }

    fn stop_tx(&self) {
        self.log.push(HwEvent::PulseStop);
    }
}

// ── Pin routing ────────────────────────────────────────────────────────────

pub struct MockRouter {
    log: HwLog,
}

impl MockRouter {
    pub fn new(log: &HwLog) -> Self {
        MockRouter { log: log.clone() }
    }
}

impl SignalRouter for MockRouter {
    fn connect(&mut self, source: SignalSource) {
        self.log.push(HwEvent::Route(source));
    }
}

pub struct MockPin {
    log: HwLog,
}

impl MockPin {
    pub fn new(log: &HwLog) -> Self {
        MockPin { log: log.clone() }
    }
}

impl ErrorType for MockPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.log.push(HwEvent::PinLow);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.log.push(HwEvent::PinHigh);
        Ok(())
    }
}

// ── Delay ──────────────────────────────────────────────────────────────────

/// Delay that returns immediately and records each millisecond sleep.
#[derive(Clone, Default)]
pub struct MockDelay {
    sleeps: Rc<RefCell<Vec<u32>>>,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sleeps(&self) -> Vec<u32> {
        self.sleeps.borrow().clone()
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.sleeps.borrow_mut().push(ms);
    }
}
