//! Line-oriented read/write surface: a read yields one report line, a write
//! sets the ENABLE register from a number typed by the user.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use heapless::String;

use crate::device::Apds9960;
use crate::errors::Error;
use crate::registers::Register;
use crate::report::REPORT_LEN;

pub const LINE_LEN: usize = REPORT_LEN;

/// Parses an ENABLE value the way a C `strtoul(.., 0)` would: `0x` hex,
/// leading-zero octal, otherwise decimal. Trailing newline, NUL or
/// whitespace is ignored. Values above 0xFF are rejected.
pub fn parse_enable(input: &str) -> Option<u8> {
    let text = input
        .trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
        .trim_start();

    let (digits, radix) = if let Some(hex) = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        (hex, 16)
    } else if text.len() > 1 && text.starts_with('0') {
        (&text[1..], 8)
    } else {
        (text, 10)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u8::from_str_radix(digits, radix).ok()
}

impl<M, I2C, D> Apds9960<M, I2C, D>
where
    M: RawMutex,
    I2C: I2c,
    D: DelayNs + Clone,
{
    /// One full read, rendered with a trailing newline.
    pub async fn read_line(&self) -> Result<String<LINE_LEN>, Error<I2C::Error>> {
        let mut line = self.read_report().await?.line();
        // The longest report leaves plenty of room.
        let _ = line.push('\n');
        Ok(line)
    }

    /// Writes the parsed value to ENABLE as-is and returns it.
    pub async fn write_enable(&self, input: &[u8]) -> Result<u8, Error<I2C::Error>> {
        self.ensure_attached()?;
        let text = core::str::from_utf8(input).map_err(|_| Error::InvalidInput)?;
        let Some(value) = parse_enable(text) else {
            debug!("rejected enable input ({} bytes)", input.len());
            return Err(Error::InvalidInput);
        };

        self.regs
            .write_byte(Register::Enable, value)
            .await
            .map_err(Error::Bus)?;
        info!("enable set to {:#x}", value);
        Ok(value)
    }
}
