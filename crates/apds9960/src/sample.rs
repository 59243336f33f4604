use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::device::Apds9960;
use crate::errors::Error;
use crate::interface::Bus;
use crate::registers::{Register, Status};

/// Raw 16-bit counts from the four photodiode channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ColorSample {
    pub clear: u16,
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

/// Low byte first, in the order the part latches them: reading CDATAL
/// freezes all eight data bytes until CDATAH..BDATAH have been read.
const COLOR_REGISTERS: [Register; 8] = [
    Register::Cdatal,
    Register::Cdatah,
    Register::Rdatal,
    Register::Rdatah,
    Register::Gdatal,
    Register::Gdatah,
    Register::Bdatal,
    Register::Bdatah,
];

impl ColorSample {
    /// Reads the latched color block as eight single-byte transactions.
    ///
    /// The caller must hold the bus for the whole call.
    pub async fn read_latched<I2C: I2c>(
        bus: &mut Bus<I2C>,
    ) -> Result<Self, I2C::Error> {
        let mut raw = [0u8; 8];
        for (byte, reg) in raw.iter_mut().zip(COLOR_REGISTERS) {
            *byte = bus.read_byte(reg).await?;
        }

        Ok(Self {
            clear: u16::from_le_bytes([raw[0], raw[1]]),
            red: u16::from_le_bytes([raw[2], raw[3]]),
            green: u16::from_le_bytes([raw[4], raw[5]]),
            blue: u16::from_le_bytes([raw[6], raw[7]]),
        })
    }
}

impl<M, I2C, D> Apds9960<M, I2C, D>
where
    M: RawMutex,
    I2C: I2c,
    D: DelayNs + Clone,
{
    /// Reads PDATA if the last proximity cycle completed.
    pub async fn read_proximity(&self) -> Result<Option<u8>, Error<I2C::Error>> {
        let mut bus = self.regs.lock().await;
        let status = Status::from_bits_retain(
            bus.read_byte(Register::Status).await.map_err(Error::Bus)?,
        );
        if !status.contains(Status::PVALID) {
            debug!("proximity not valid, status {:#x}", status.bits());
            return Ok(None);
        }
        let pdata = bus.read_byte(Register::Pdata).await.map_err(Error::Bus)?;
        Ok(Some(pdata))
    }

    /// Reads the four color channels if the last ALS cycle completed.
    pub async fn read_color(
        &self,
    ) -> Result<Option<ColorSample>, Error<I2C::Error>> {
        let mut bus = self.regs.lock().await;
        let status = Status::from_bits_retain(
            bus.read_byte(Register::Status).await.map_err(Error::Bus)?,
        );
        if !status.contains(Status::AVALID) {
            debug!("color not valid, status {:#x}", status.bits());
            return Ok(None);
        }
        let sample = ColorSample::read_latched(&mut *bus)
            .await
            .map_err(Error::Bus)?;
        trace!(
            "color C={} R={} G={} B={}",
            sample.clear,
            sample.red,
            sample.green,
            sample.blue
        );
        Ok(Some(sample))
    }
}
