use bitflags::bitflags;

/// Fixed 7-bit bus address of the APDS-9960.
pub const I2C_ADDR: u8 = 0x39;

/// Value of the ID register on a genuine part.
pub const DEVICE_ID: u8 = 0xAB;

/// Register map (datasheet table "Register Set").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    Enable = 0x80,
    Atime = 0x81,
    Wtime = 0x83,
    Ailtl = 0x84,
    Ailth = 0x85,
    Aihtl = 0x86,
    Aihth = 0x87,
    Pilt = 0x89,
    Piht = 0x8B,
    Pers = 0x8C,
    Config1 = 0x8D,
    Ppulse = 0x8E,
    Control = 0x8F,
    Config2 = 0x90,
    Id = 0x92,
    Status = 0x93,
    Cdatal = 0x94,
    Cdatah = 0x95,
    Rdatal = 0x96,
    Rdatah = 0x97,
    Gdatal = 0x98,
    Gdatah = 0x99,
    Bdatal = 0x9A,
    Bdatah = 0x9B,
    Pdata = 0x9C,
    Poffsetur = 0x9D,
    Poffsetdl = 0x9E,
    Config3 = 0x9F,
    Gpenth = 0xA0,
    Gexth = 0xA1,
    Gconf1 = 0xA2,
    Gconf2 = 0xA3,
    Goffsetu = 0xA4,
    Goffsetd = 0xA5,
    Gpulse = 0xA6,
    Goffsetl = 0xA7,
    Goffsetr = 0xA9,
    Gconf3 = 0xAA,
    Gconf4 = 0xAB,
    Gflvl = 0xAE,
    Gstatus = 0xAF,
    Iforce = 0xE4,
    Piclear = 0xE5,
    Ciclear = 0xE6,
    Aiclear = 0xE7,
    GfifoU = 0xFC,
    GfifoD = 0xFD,
    GfifoL = 0xFE,
    GfifoR = 0xFF,
}

impl Register {
    pub const fn addr(self) -> u8 {
        self as u8
    }
}

impl From<Register> for u8 {
    fn from(reg: Register) -> Self {
        reg.addr()
    }
}

bitflags! {
    /// ENABLE (0x80): which measurement engines are powered and active.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Enable: u8 {
        /// Power on.
        const PON  = 1 << 0;
        /// Ambient light / color engine.
        const AEN  = 1 << 1;
        /// Proximity engine.
        const PEN  = 1 << 2;
        /// Wait timer between cycles.
        const WEN  = 1 << 3;
        /// Ambient light interrupt.
        const AIEN = 1 << 4;
        /// Proximity interrupt.
        const PIEN = 1 << 5;
        /// Gesture engine.
        const GEN  = 1 << 6;
    }
}

bitflags! {
    /// STATUS (0x93)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u8 {
        /// Color/ALS conversion complete, CDATA..BDATA valid.
        const AVALID = 1 << 0;
        /// Proximity conversion complete, PDATA valid.
        const PVALID = 1 << 1;
        /// Gesture FIFO has reached its interrupt level.
        const GINT   = 1 << 2;
        const AINT   = 1 << 4;
        const PINT   = 1 << 5;
        /// Proximity/gesture analog saturation.
        const PGSAT  = 1 << 6;
        /// Clear photodiode saturation.
        const CPSAT  = 1 << 7;
    }
}

bitflags! {
    /// CONFIG3 (0x9F)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Config3: u8 {
        /// Sleep after interrupt.
        const SAI  = 1 << 4;
        /// Proximity gain compensation.
        const PCMP = 1 << 5;
    }
}

bitflags! {
    /// GCONF4 (0xAB)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Gconf4: u8 {
        /// Gesture mode: gesture state machine is running.
        const GMODE     = 1 << 0;
        /// Gesture interrupt enable.
        const GIEN      = 1 << 1;
        /// Clears the FIFO and GINT/GVALID/GFIFO_OV/GFLVL.
        const GFIFO_CLR = 1 << 2;
    }
}

/// Color/ALS gain, CONTROL bits 1:0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlsGain {
    X1 = 0b00,
    X4 = 0b01,
    X16 = 0b10,
    #[default]
    X64 = 0b11,
}

impl From<u8> for AlsGain {
    fn from(value: u8) -> Self {
        match value & 0b11 {
            0b00 => Self::X1,
            0b01 => Self::X4,
            0b10 => Self::X16,
            _ => Self::X64,
        }
    }
}

/// Proximity gain, CONTROL bits 3:2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProximityGain {
    X1 = 0b00,
    X2 = 0b01,
    #[default]
    X4 = 0b10,
    X8 = 0b11,
}

impl From<u8> for ProximityGain {
    fn from(value: u8) -> Self {
        match value & 0b11 {
            0b00 => Self::X1,
            0b01 => Self::X2,
            0b10 => Self::X4,
            _ => Self::X8,
        }
    }
}

/// LED drive strength, CONTROL bits 7:6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedDrive {
    #[default]
    Ma100 = 0b00,
    Ma50 = 0b01,
    Ma25 = 0b10,
    Ma12_5 = 0b11,
}

impl From<u8> for LedDrive {
    fn from(value: u8) -> Self {
        match value & 0b11 {
            0b00 => Self::Ma100,
            0b01 => Self::Ma50,
            0b10 => Self::Ma25,
            _ => Self::Ma12_5,
        }
    }
}

/// CONTROL (0x8F): LED drive and the two gain fields packed into one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Control {
    pub als_gain: AlsGain,
    pub proximity_gain: ProximityGain,
    pub led_drive: LedDrive,
}

impl Control {
    pub const fn bits(&self) -> u8 {
        (self.led_drive as u8) << 6
            | (self.proximity_gain as u8) << 2
            | self.als_gain as u8
    }

    pub fn from_bits(bits: u8) -> Self {
        Self {
            als_gain: AlsGain::from(bits),
            proximity_gain: ProximityGain::from(bits >> 2),
            led_drive: LedDrive::from(bits >> 6),
        }
    }
}

impl From<Control> for u8 {
    fn from(control: Control) -> Self {
        control.bits()
    }
}

/// Proximity interrupt persistence lives in PERS bits 7:4.
pub const fn proximity_persistence(cycles: u8) -> u8 {
    (cycles & 0x0F) << 4
}
