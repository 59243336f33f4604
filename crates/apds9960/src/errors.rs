/// Errors surfaced by the acquisition engine.
///
/// `DataNotReady` is recoverable: the caller may simply ask again.
/// `Cancelled` means the caller (or a detach) gave up on the request and is
/// reported separately so the two are never confused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<BusE> {
    /// Bus transaction failed (NACK, timeout, arbitration loss).
    Bus(BusE),
    /// Neither requested channel had its status-valid bit set.
    DataNotReady,
    /// The wait for conversion was abandoned before the color read.
    Cancelled,
    /// The ID register did not read back as an APDS-9960.
    InvalidChipId(u8),
    /// A control-surface write could not be parsed into a register value.
    InvalidInput,
    /// The device has been shut down.
    Detached,
}

impl<BusE> Error<BusE> {
    /// `true` for conditions where retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::DataNotReady)
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Bus(err) => {
                write!(f, "Bus transaction failed: {:?}", err)
            }
            Error::DataNotReady => write!(f, "Data not ready"),
            Error::Cancelled => write!(f, "Measurement cancelled"),
            Error::InvalidChipId(id) => {
                write!(f, "Unexpected chip id: {:#04x}", id)
            }
            Error::InvalidInput => write!(f, "Invalid control input"),
            Error::Detached => write!(f, "Device detached"),
        }
    }
}
