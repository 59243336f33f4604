#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use apds9960::{Apds9960, Config};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{ErrorType, I2c, Operation};

pub const ADDR: u8 = 0x39;

pub const ENABLE: u8 = 0x80;
pub const ATIME: u8 = 0x81;
pub const PILT: u8 = 0x89;
pub const PIHT: u8 = 0x8B;
pub const PERS: u8 = 0x8C;
pub const CONTROL: u8 = 0x8F;
pub const ID: u8 = 0x92;
pub const STATUS: u8 = 0x93;
pub const CDATAL: u8 = 0x94;
pub const PDATA: u8 = 0x9C;
pub const CONFIG3: u8 = 0x9F;
pub const GPULSE: u8 = 0xA6;
pub const GCONF4: u8 = 0xAB;
pub const GFIFO_U: u8 = 0xFC;

// ---------------------------------------------------------------------------
// Mock bus
// ---------------------------------------------------------------------------

/// One completed bus transaction, as seen by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Read(u8),
    Burst(u8, usize),
    Write(u8, u8),
}

pub struct Shared {
    pub regs: [u8; 256],
    pub log: Vec<Op>,
    /// Any transaction touching this register NACKs.
    pub fail_on: Option<u8>,
    /// Yield to the executor in the middle of every transaction.
    pub yield_inside: bool,
    in_flight: usize,
    pub max_in_flight: usize,
}

/// Register-file model of the sensor with an access log.
#[derive(Clone)]
pub struct MockI2c {
    shared: Rc<RefCell<Shared>>,
}

impl MockI2c {
    pub fn new() -> Self {
        let mut regs = [0u8; 256];
        regs[ID as usize] = 0xAB;
        Self {
            shared: Rc::new(RefCell::new(Shared {
                regs,
                log: Vec::new(),
                fail_on: None,
                yield_inside: false,
                in_flight: 0,
                max_in_flight: 0,
            })),
        }
    }

    pub fn set(&self, reg: u8, value: u8) {
        self.shared.borrow_mut().regs[reg as usize] = value;
    }

    pub fn set_all(&self, start: u8, values: &[u8]) {
        let mut shared = self.shared.borrow_mut();
        for (i, v) in values.iter().enumerate() {
            shared.regs[start as usize + i] = *v;
        }
    }

    pub fn get(&self, reg: u8) -> u8 {
        self.shared.borrow().regs[reg as usize]
    }

    pub fn log(&self) -> Vec<Op> {
        self.shared.borrow().log.clone()
    }

    pub fn clear_log(&self) {
        self.shared.borrow_mut().log.clear();
    }

    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.log()
            .into_iter()
            .filter_map(|op| match op {
                Op::Write(reg, value) => Some((reg, value)),
                _ => None,
            })
            .collect()
    }

    pub fn fail_on(&self, reg: Option<u8>) {
        self.shared.borrow_mut().fail_on = reg;
    }

    pub fn yield_inside(&self, on: bool) {
        self.shared.borrow_mut().yield_inside = on;
    }

    pub fn max_in_flight(&self) -> usize {
        self.shared.borrow().max_in_flight
    }

    /// Sets the 16-bit C/R/G/B counts, low byte first.
    pub fn set_color(&self, clear: u16, red: u16, green: u16, blue: u16) {
        let mut bytes = Vec::new();
        for v in [clear, red, green, blue] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        self.set_all(CDATAL, &bytes);
    }
}

impl ErrorType for MockI2c {
    type Error = ErrorKind;
}

impl I2c for MockI2c {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        assert_eq!(address, ADDR);

        let yield_inside = {
            let mut shared = self.shared.borrow_mut();
            shared.in_flight += 1;
            shared.max_in_flight = shared.max_in_flight.max(shared.in_flight);
            shared.yield_inside
        };
        if yield_inside {
            embassy_futures::yield_now().await;
        }

        let mut shared = self.shared.borrow_mut();
        shared.in_flight -= 1;

        match operations {
            [Operation::Write(out), Operation::Read(buf)] => {
                let reg = out[0];
                if shared.fail_on == Some(reg) {
                    Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data))
                } else {
                    for (i, byte) in buf.iter_mut().enumerate() {
                        *byte = shared.regs[(reg as usize + i) & 0xFF];
                    }
                    let op = if buf.len() == 1 {
                        Op::Read(reg)
                    } else {
                        Op::Burst(reg, buf.len())
                    };
                    shared.log.push(op);
                    Ok(())
                }
            }
            [Operation::Write(out)] => {
                let (reg, value) = (out[0], out[1]);
                if shared.fail_on == Some(reg) {
                    Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data))
                } else {
                    shared.regs[reg as usize] = value;
                    shared.log.push(Op::Write(reg, value));
                    Ok(())
                }
            }
            other => panic!("unexpected transaction shape ({} ops)", other.len()),
        }
    }
}

// ---------------------------------------------------------------------------
// Mock delay
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayMode {
    Immediate,
    /// The conversion timer never fires.
    Never,
}

#[derive(Clone)]
pub struct MockDelay {
    mode: Rc<RefCell<DelayMode>>,
    requested_ns: Rc<RefCell<Vec<u64>>>,
}

impl MockDelay {
    pub fn new(mode: DelayMode) -> Self {
        Self {
            mode: Rc::new(RefCell::new(mode)),
            requested_ns: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn set_mode(&self, mode: DelayMode) {
        *self.mode.borrow_mut() = mode;
    }

    pub fn requested_ns(&self) -> Vec<u64> {
        self.requested_ns.borrow().clone()
    }

    async fn wait(&self, ns: u64) {
        self.requested_ns.borrow_mut().push(ns);
        let mode = *self.mode.borrow();
        if mode == DelayMode::Never {
            core::future::pending::<()>().await;
        }
    }
}

impl DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.wait(ns as u64).await;
    }

    async fn delay_us(&mut self, us: u32) {
        self.wait(us as u64 * 1_000).await;
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.wait(ms as u64 * 1_000_000).await;
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub type TestDevice = Apds9960<NoopRawMutex, MockI2c, MockDelay>;

pub fn make_device(config: Config, mode: DelayMode) -> (TestDevice, MockI2c, MockDelay) {
    let bus = MockI2c::new();
    let delay = MockDelay::new(mode);
    let device = Apds9960::new("apds9960-00", bus.clone(), delay.clone(), config);
    (device, bus, delay)
}

/// Ops issued by the first trigger with the default config.
pub fn first_trigger_ops() -> Vec<Op> {
    vec![
        Op::Write(ATIME, 0xFF),
        Op::Write(CONTROL, 0x0B),
        Op::Write(ENABLE, 0x07),
        Op::Write(CONFIG3, 0x00),
    ]
}
