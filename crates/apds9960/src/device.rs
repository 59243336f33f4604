use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use portable_atomic::{AtomicBool, Ordering};

use crate::config::Config;
use crate::errors::Error;
use crate::gesture::{GestureQueue, GestureStats};
use crate::interface::RegisterInterface;
use crate::registers::{Enable, Register, DEVICE_ID};

/// One APDS-9960 on an I²C bus.
///
/// All methods take `&self` so the read path and the gesture worker can run
/// as separate tasks against a shared (usually `'static`) device. Bus access
/// from both paths is serialized through [`RegisterInterface`].
pub struct Apds9960<M: RawMutex, I2C, D> {
    name: &'static str,
    pub(crate) regs: RegisterInterface<M, I2C>,
    pub(crate) delay: D,
    config: Config,
    pub(crate) gestures: GestureQueue<M>,
    /// Held by the read that currently owns the sensor.
    pub(crate) requests: Mutex<M, ()>,
    /// Aborts the owning read's conversion wait.
    pub(crate) cancel: Signal<M, ()>,
    attached: AtomicBool,
}

impl<M, I2C, D> Apds9960<M, I2C, D>
where
    M: RawMutex,
    I2C: I2c,
    D: DelayNs + Clone,
{
    /// `name` identifies this sensor in logs, e.g. `"apds9960-00"` for the
    /// first one on a board.
    pub fn new(name: &'static str, i2c: I2C, delay: D, config: Config) -> Self {
        Self {
            name,
            regs: RegisterInterface::new(i2c),
            delay,
            config,
            gestures: GestureQueue::new(),
            requests: Mutex::new(()),
            cancel: Signal::new(),
            attached: AtomicBool::new(true),
        }
    }

    /// Checks the chip ID and powers the part up with the gesture engine
    /// running.
    pub async fn init(&self) -> Result<(), Error<I2C::Error>> {
        self.ensure_attached()?;

        let mut bus = self.regs.lock().await;
        let id = bus.read_byte(Register::Id).await.map_err(Error::Bus)?;
        if id != DEVICE_ID {
            error!("{}: unexpected chip id {:#x}", self.name, id);
            return Err(Error::InvalidChipId(id));
        }

        bus.write_byte(Register::Enable, (Enable::PON | Enable::GEN).bits())
            .await
            .map_err(Error::Bus)?;
        bus.write_cached(Register::Gpulse, self.config.gesture.pulse)
            .await
            .map_err(Error::Bus)?;
        bus.write_cached(Register::Gconf4, self.config.gesture.gconf4)
            .await
            .map_err(Error::Bus)?;

        info!("{}: initialized", self.name);
        Ok(())
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// ENABLE as last written by this driver.
    pub async fn enable(&self) -> Option<Enable> {
        self.regs
            .shadow(Register::Enable)
            .await
            .map(Enable::from_bits_retain)
    }

    /// Abandons the conversion wait of the read that currently owns the
    /// sensor.
    ///
    /// Has no effect on a read that is already past its wait. Reads queued
    /// behind it, or started afterwards, are not affected.
    pub fn cancel(&self) {
        self.cancel.signal(());
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    /// Detaches the device: the pending read (if any) is cancelled, the
    /// gesture worker is told to stop and every later request fails with
    /// [`Error::Detached`]. Queued reads fail with `Detached` once they get
    /// the sensor.
    ///
    /// Gesture work still pending at this point is discarded; the worker
    /// does not touch the bus of a detached device.
    pub fn shutdown(&self) {
        if self.attached.swap(false, Ordering::AcqRel) {
            info!("{}: detached", self.name);
        }
        self.cancel.signal(());
        self.stop_gesture_worker();
    }

    /// Gives the bus back. Callers should [`shutdown`](Self::shutdown) and
    /// let the worker exit first.
    pub fn release(self) -> I2C {
        self.regs.into_inner()
    }

    pub fn gesture_stats(&self) -> GestureStats {
        self.gestures.stats()
    }

    pub(crate) fn ensure_attached(&self) -> Result<(), Error<I2C::Error>> {
        if self.is_attached() {
            Ok(())
        } else {
            Err(Error::Detached)
        }
    }
}
