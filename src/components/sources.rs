//! Signal sources and bus markers.
//!
//! Bus markers double as the boundary convention of custom components: a
//! [`BusInput`] inside a nested circuit becomes an input pin of the enclosing
//! component, a [`BusOutput`] becomes an output pin.

use super::{ComponentType, Element};
use crate::persist::ComponentDoc;
use crate::signal::Signal;

/// Widest bus a marker may carry.
pub const MAX_BUS_WIDTH: u32 = 64;

fn clamp_width(bit_count: u32) -> u32 {
    bit_count.clamp(1, MAX_BUS_WIDTH)
}

fn mask(bit_count: u32) -> u64 {
    if bit_count >= 64 {
        u64::MAX
    } else {
        (1u64 << bit_count) - 1
    }
}

fn bus_pin_names(prefix: &str, bit_count: u32) -> Vec<String> {
    if bit_count == 1 {
        vec![prefix.to_string()]
    } else {
        (0..bit_count).map(|i| format!("{prefix}{i}")).collect()
    }
}

/// A square-wave clock.
///
/// The output is high for the first half of every period. Elapsed time is
/// advanced from outside the settle loop.
#[derive(Debug, Clone, PartialEq)]
pub struct Clock {
    /// Frequency in Hz
    pub frequency: f32,
    /// Seconds since the clock started
    elapsed: f32,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Clock {
    /// Create a new clock.
    pub fn new(frequency: f32) -> Self {
        Self {
            frequency: frequency.max(0.0),
            elapsed: 0.0,
        }
    }

    /// Advance the clock by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt.max(0.0);
        if self.frequency > 0.0 {
            // Keep elapsed bounded so long sessions don't lose precision.
            let period = 1.0 / self.frequency;
            self.elapsed %= period;
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Get the current output level.
    pub fn signal(&self) -> Signal {
        if self.frequency <= 0.0 {
            return Signal::Low;
        }
        Signal::from((self.elapsed * self.frequency).fract() < 0.5)
    }
}

impl Element for Clock {
    fn component_type(&self) -> ComponentType {
        ComponentType::Clock
    }

    fn input_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn output_names(&self) -> Vec<String> {
        vec!["CLK".to_string()]
    }

    fn evaluate(&mut self, _inputs: &[Signal], outputs: &mut [Signal]) {
        if let Some(q) = outputs.first_mut() {
            *q = self.signal();
        }
    }

    fn save_params(&self, doc: &mut ComponentDoc) {
        doc.frequency = Some(self.frequency);
    }
}

/// Bus input marker: drives `bit_count` output pins from the bits of `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusInput {
    bit_count: u32,
    value: u64,
}

impl Default for BusInput {
    fn default() -> Self {
        Self::new(1)
    }
}

impl BusInput {
    pub fn new(bit_count: u32) -> Self {
        Self {
            bit_count: clamp_width(bit_count),
            value: 0,
        }
    }

    pub fn bit_count(&self) -> u32 {
        self.bit_count
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    /// Set the driven value. Bits above the bus width are dropped.
    pub fn set_value(&mut self, value: u64) {
        self.value = value & mask(self.bit_count);
    }

    /// Set the value from per-bit signals, least significant bit first.
    pub fn set_bits(&mut self, bits: &[Signal]) {
        let value = bits
            .iter()
            .take(self.bit_count as usize)
            .enumerate()
            .fold(0u64, |acc, (i, s)| acc | (s.bit() << i));
        self.value = value;
    }

    pub fn bit(&self, index: u32) -> Signal {
        Signal::from(index < self.bit_count && (self.value >> index) & 1 == 1)
    }
}

impl Element for BusInput {
    fn component_type(&self) -> ComponentType {
        ComponentType::BusInput
    }

    fn input_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn output_names(&self) -> Vec<String> {
        bus_pin_names("Q", self.bit_count)
    }

    fn evaluate(&mut self, _inputs: &[Signal], outputs: &mut [Signal]) {
        for (i, out) in outputs.iter_mut().enumerate() {
            *out = self.bit(i as u32);
        }
    }

    fn save_params(&self, doc: &mut ComponentDoc) {
        doc.bit_count = Some(self.bit_count);
        doc.value = Some(self.value);
    }
}

/// Bus output marker: samples `bit_count` input pins into `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusOutput {
    bit_count: u32,
    value: u64,
}

impl Default for BusOutput {
    fn default() -> Self {
        Self::new(1)
    }
}

impl BusOutput {
    pub fn new(bit_count: u32) -> Self {
        Self {
            bit_count: clamp_width(bit_count),
            value: 0,
        }
    }

    pub fn bit_count(&self) -> u32 {
        self.bit_count
    }

    /// Value observed during the last evaluation.
    pub fn value(&self) -> u64 {
        self.value
    }
}

impl Element for BusOutput {
    fn component_type(&self) -> ComponentType {
        ComponentType::BusOutput
    }

    fn input_names(&self) -> Vec<String> {
        bus_pin_names("A", self.bit_count)
    }

    fn output_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn evaluate(&mut self, inputs: &[Signal], _outputs: &mut [Signal]) {
        self.value = inputs
            .iter()
            .enumerate()
            .fold(0u64, |acc, (i, s)| acc | (s.bit() << i));
    }

    fn save_params(&self, doc: &mut ComponentDoc) {
        doc.bit_count = Some(self.bit_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_clock_square_wave() {
        // 1 Hz: high for 0.5 s, low for 0.5 s
        let mut clock = Clock::new(1.0);
        assert_eq!(clock.signal(), Signal::High);
        clock.advance(0.25);
        assert_eq!(clock.signal(), Signal::High);
        clock.advance(0.5);
        assert_eq!(clock.signal(), Signal::Low);
        clock.advance(0.5);
        assert_eq!(clock.signal(), Signal::High);
        assert_relative_eq!(clock.elapsed(), 0.25, epsilon = 1e-5);
    }

    #[test]
    fn test_clock_zero_frequency_is_low() {
        let mut clock = Clock::new(0.0);
        clock.advance(3.0);
        assert_eq!(clock.signal(), Signal::Low);
    }

    #[test]
    fn test_bus_input_bits() {
        let mut bus = BusInput::new(4);
        bus.set_value(0b1_0110);
        assert_eq!(bus.value(), 0b0110);
        let mut out = [Signal::Low; 4];
        bus.evaluate(&[], &mut out);
        assert_eq!(out, [Signal::Low, Signal::High, Signal::High, Signal::Low]);
        assert_eq!(bus.output_names(), vec!["Q0", "Q1", "Q2", "Q3"]);
    }

    #[test]
    fn test_bus_output_value() {
        let mut bus = BusOutput::new(3);
        bus.evaluate(&[Signal::High, Signal::Low, Signal::High], &mut []);
        assert_eq!(bus.value(), 0b101);
        assert_eq!(bus.input_names(), vec!["A0", "A1", "A2"]);
    }

    #[test]
    fn test_bus_width_clamped() {
        assert_eq!(BusInput::new(0).bit_count(), 1);
        assert_eq!(BusOutput::new(200).bit_count(), MAX_BUS_WIDTH);
    }
}
