//! Register access over the shared I²C bus.
//!
//! Every multi-register step in the engine locks the bus once and performs
//! all of its transactions through the guard, so a gesture drain can never
//! land between two bytes of a latched color read.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embedded_hal::i2c::Error as _;
use embedded_hal_async::i2c::I2c;
use heapless::LinearMap;

use crate::registers::{Register, I2C_ADDR};

const SHADOW_SLOTS: usize = 16;

/// The raw bus plus a shadow of the last value written to each register.
pub struct Bus<I2C> {
    i2c: I2C,
    shadow: LinearMap<Register, u8, SHADOW_SLOTS>,
}

impl<I2C: I2c> Bus<I2C> {
    fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            shadow: LinearMap::new(),
        }
    }

    pub async fn read_byte(&mut self, reg: Register) -> Result<u8, I2C::Error> {
        let mut buf = [0u8; 1];
        self.read_bytes(reg, &mut buf).await?;
        Ok(buf[0])
    }

    /// Auto-incrementing block read starting at `reg`.
    pub async fn read_bytes(
        &mut self,
        reg: Register,
        buf: &mut [u8],
    ) -> Result<(), I2C::Error> {
        self.i2c
            .write_read(I2C_ADDR, &[reg.addr()], buf)
            .await
            .inspect_err(|e| {
                warn!("read {:#x} failed: {:?}", reg.addr(), e.kind())
            })
    }

    pub async fn write_byte(
        &mut self,
        reg: Register,
        value: u8,
    ) -> Result<(), I2C::Error> {
        self.i2c
            .write(I2C_ADDR, &[reg.addr(), value])
            .await
            .inspect_err(|e| {
                warn!("write {:#x} failed: {:?}", reg.addr(), e.kind())
            })?;
        trace!("wrote {:#x} <- {:#x}", reg.addr(), value);
        // A full shadow only costs a redundant write later.
        let _ = self.shadow.insert(reg, value);
        Ok(())
    }

    /// Writes `value` unless the shadow says the device already holds it.
    ///
    /// Returns `true` when a bus transaction was issued.
    pub async fn write_cached(
        &mut self,
        reg: Register,
        value: u8,
    ) -> Result<bool, I2C::Error> {
        if self.shadow.get(&reg) == Some(&value) {
            return Ok(false);
        }
        self.write_byte(reg, value).await?;
        Ok(true)
    }

    /// Last value written to `reg` through this bus, if any.
    pub fn shadow(&self, reg: Register) -> Option<u8> {
        self.shadow.get(&reg).copied()
    }
}

/// Serializes every transaction to the sensor behind one async mutex.
pub struct RegisterInterface<M: RawMutex, I2C> {
    bus: Mutex<M, Bus<I2C>>,
}

impl<M: RawMutex, I2C: I2c> RegisterInterface<M, I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self {
            bus: Mutex::new(Bus::new(i2c)),
        }
    }

    /// Holds the bus for a multi-transaction step.
    pub async fn lock(&self) -> MutexGuard<'_, M, Bus<I2C>> {
        self.bus.lock().await
    }

    pub async fn read_byte(&self, reg: Register) -> Result<u8, I2C::Error> {
        self.lock().await.read_byte(reg).await
    }

    pub async fn read_bytes(
        &self,
        reg: Register,
        buf: &mut [u8],
    ) -> Result<(), I2C::Error> {
        self.lock().await.read_bytes(reg, buf).await
    }

    pub async fn write_byte(
        &self,
        reg: Register,
        value: u8,
    ) -> Result<(), I2C::Error> {
        self.lock().await.write_byte(reg, value).await
    }

    pub async fn write_cached(
        &self,
        reg: Register,
        value: u8,
    ) -> Result<bool, I2C::Error> {
        self.lock().await.write_cached(reg, value).await
    }

    pub async fn shadow(&self, reg: Register) -> Option<u8> {
        self.lock().await.shadow(reg)
    }

    pub fn into_inner(self) -> I2C {
        self.bus.into_inner().i2c
    }
}
