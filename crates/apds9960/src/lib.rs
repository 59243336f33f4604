//! Async acquisition engine for the Broadcom APDS-9960 proximity, color and
//! gesture sensor.
//!
//! A read triggers the proximity and color engines, waits out the color
//! conversion time (there is no ready interrupt for it), then reads the
//! latched result registers and returns one [`Report`]. Gesture interrupts
//! are serviced independently by a worker task; both paths share one bus
//! lock so multi-byte reads are never interleaved.
//!
//! ```ignore
//! static SENSOR: StaticCell<Apds9960<CriticalSectionRawMutex, I2c, Delay>> = ...;
//!
//! let sensor = SENSOR.init(Apds9960::new("apds9960-00", i2c, Delay, default_apds_settings()));
//! sensor.init().await?;
//! spawner.spawn(gesture_task(sensor, events.sender()))?;
//!
//! let report = sensor.read_report().await?;
//! info!("{}", report.line().as_str());
//! ```
#![no_std]

mod fmt;

pub mod config;
pub mod control;
pub mod device;
pub mod errors;
pub mod gesture;
pub mod interface;
pub mod measurement;
pub mod registers;
pub mod report;
pub mod sample;

pub use config::{default_apds_settings, Config, GestureConfig, ProximityInterrupt};
pub use control::{parse_enable, LINE_LEN};
pub use device::Apds9960;
pub use errors::Error;
pub use gesture::{decode_fifo, Gesture, GestureSink, GestureStats, KeyEvent, FIFO_BURST};
pub use interface::{Bus, RegisterInterface};
pub use measurement::{Channels, Measurement, MeasurementState};
pub use registers::{AlsGain, Control, Enable, LedDrive, ProximityGain, Register, Status};
pub use report::{Report, REPORT_LEN};
pub use sample::ColorSample;
