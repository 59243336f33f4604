use core::fmt::{self, Write as _};

use heapless::String;

use crate::errors::Error;
use crate::measurement::Channels;
use crate::sample::ColorSample;

/// Room for the longest line plus a trailing newline.
pub const REPORT_LEN: usize = 64;

/// One consistent snapshot handed back to the caller.
///
/// A channel that was not requested, or whose status bit was still clear
/// after the conversion wait, is `None` and rendered as dashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Report {
    pub proximity: Option<u8>,
    pub color: Option<ColorSample>,
}

impl Report {
    pub fn assemble<E>(
        channels: Channels,
        proximity: Option<u8>,
        color: Option<ColorSample>,
    ) -> Result<Self, Error<E>> {
        let prox_ok = channels.contains(Channels::PROXIMITY) && proximity.is_some();
        let color_ok = channels.contains(Channels::COLOR) && color.is_some();
        if !prox_ok && !color_ok {
            return Err(Error::DataNotReady);
        }

        Ok(Self {
            proximity: proximity.filter(|_| prox_ok),
            color: color.filter(|_| color_ok),
        })
    }

    pub fn line(&self) -> String<REPORT_LEN> {
        let mut line = String::new();
        // Longest rendering is 47 bytes.
        let _ = write!(line, "{}", self);
        line
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.proximity {
            Some(p) => write!(f, "Prox: {:02x}, ", p)?,
            None => f.write_str("Prox: --, ")?,
        }
        match self.color {
            Some(c) => write!(
                f,
                "CRGB: C({:04x}) R({:04x}) G({:04x}) B({:04x})",
                c.clear, c.red, c.green, c.blue
            ),
            None => f.write_str("CRGB: C(----) R(----) G(----) B(----)"),
        }
    }
}
