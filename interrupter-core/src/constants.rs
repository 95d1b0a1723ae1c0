//! Compile-time configuration shared by the signal and USB subsystems.

// ── Audio envelope sampling ────────────────────────────────────────────────

/// Continuous ADC sample rate in Hz.
pub const SAMPLE_RATE_HZ: u32 = 16_000;

/// Largest raw ADC code (12-bit conversions).
pub const ADC_MAX: u16 = 4095;

/// Raw ADC code of the zero-signal input (jack biased at mid-rail).
pub const ADC_MIDPOINT: u16 = 2110;

/// Duty level produced by [`ADC_MIDPOINT`].
pub const DUTY_MIDPOINT: u8 = 131;

/// Largest duty level (8-bit PWM resolution).
pub const DUTY_MAX: u8 = 255;

/// Carrier frequency of the audio-duty PWM channel in Hz.
pub const PWM_FREQUENCY_HZ: u32 = 30_000;

/// Bytes per ADC conversion result word ("type 2" output format).
pub const ADC_RESULT_BYTES: usize = 4;

// ── Pulse generation ───────────────────────────────────────────────────────

/// Largest value the pulse channel's 15-bit duration fields can hold.
pub const PULSE_DURATION_MAX: u32 = 32_767;

/// Depth of the parameter queue feeding the software pacing task.
pub const PARAM_QUEUE_DEPTH: usize = 2;

/// Poll interval of the pacing task while it waits for parameters.
pub const PACER_POLL_MS: u32 = 1;

// ── USB MIDI ───────────────────────────────────────────────────────────────

/// Size of the persistent inbound transfer (one full-speed bulk packet,
/// up to 16 USB-MIDI event packets).
pub const MIDI_PACKET_SIZE: usize = 64;

/// Bytes per USB-MIDI event packet.
pub const MIDI_EVENT_BYTES: usize = 4;

/// Bulk IN endpoint of the MIDI streaming interface.
pub const MIDI_EP_ADDR: u8 = 0x81;

/// Interface number of the MIDI streaming interface.
pub const MIDI_INTERFACE: u8 = 1;

/// Time given to an in-flight transfer to settle before the interface is released.
pub const DISCONNECT_SETTLE_MS: u32 = 100;

/// Capacity of the decoded device name in bytes.
pub const DEVICE_NAME_CAPACITY: usize = 64;

/// Capacity of the UTF-16 product string read from the device.
pub const PRODUCT_STRING_UNITS: usize = 126;
