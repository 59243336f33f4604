use embassy_time::Duration;

use crate::registers::{proximity_persistence, Config3, Control, Gconf4};

/// Acquisition settings applied when a measurement is triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// ATIME value. 0xFF is the shortest integration (one 2.78 ms cycle).
    pub adc_integration_time: u8,
    pub control: Control,
    /// CONFIG3.SAI: power down after an interrupt until it is cleared.
    pub sleep_after_interrupt: bool,
    /// How long to wait between triggering and reading the color channels.
    pub conversion_time: Duration,
    pub gesture: GestureConfig,
    /// Armed after every completed read when set.
    pub proximity_interrupt: Option<ProximityInterrupt>,
}

impl Config {
    pub fn config3(&self) -> u8 {
        if self.sleep_after_interrupt {
            Config3::SAI.bits()
        } else {
            Config3::empty().bits()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            adc_integration_time: 0xFF,
            control: Control::default(),
            sleep_after_interrupt: false,
            conversion_time: Duration::from_millis(30),
            gesture: GestureConfig::default(),
            proximity_interrupt: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GestureConfig {
    /// GPULSE: pulse length in bits 7:6, pulse count minus one in 5:0.
    pub pulse: u8,
    /// GCONF4 bits written by `init`.
    pub gconf4: u8,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            // 16 us pulses, 10 per cycle
            pulse: 0x89,
            gconf4: (Gconf4::GMODE | Gconf4::GIEN).bits(),
        }
    }
}

/// Proximity threshold window. PDATA outside `[low, high]` for
/// `persistence` consecutive cycles raises the interrupt line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProximityInterrupt {
    pub low: u8,
    pub high: u8,
    pub persistence: u8,
}

impl ProximityInterrupt {
    pub fn pers(&self) -> u8 {
        proximity_persistence(self.persistence)
    }
}

impl Default for ProximityInterrupt {
    fn default() -> Self {
        Self {
            low: 0x10,
            high: 0xA0,
            persistence: 1,
        }
    }
}

/// Settings used by the reference board firmware, including the proximity
/// interrupt it arms after each read.
pub fn default_apds_settings() -> Config {
    Config {
        proximity_interrupt: Some(ProximityInterrupt::default()),
        ..Config::default()
    }
}
