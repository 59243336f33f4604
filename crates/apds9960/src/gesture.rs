//! Gesture FIFO servicing.
//!
//! The interrupt line only ever raises a flag ([`Apds9960::on_interrupt`]).
//! A single worker task ([`Apds9960::run_gesture_worker`]) waits on that
//! flag and drains the FIFO through the shared bus lock, so edges arriving
//! while a drain is running collapse into one more drain afterwards.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Sender;
use embassy_sync::signal::Signal;
use embedded_hal::i2c::Error as _;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::digital::Wait;
use embedded_hal_async::i2c::I2c;
use portable_atomic::{AtomicU32, Ordering};

use crate::device::Apds9960;
use crate::errors::Error;
use crate::registers::{Register, Status};

/// Bytes pulled from the FIFO per drain, one per direction register.
pub const FIFO_BURST: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Gesture {
    Up,
    Down,
    Left,
    Right,
}

impl TryFrom<u8> for Gesture {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Gesture::Up),
            0x02 => Ok(Gesture::Down),
            0x03 => Ok(Gesture::Left),
            0x04 => Ok(Gesture::Right),
            other => Err(other),
        }
    }
}

/// Maps FIFO bytes to gestures. Empty slots (0x00) are skipped; anything
/// else unrecognized is logged and dropped.
pub fn decode_fifo(fifo: &[u8]) -> impl Iterator<Item = Gesture> + '_ {
    fifo.iter().filter_map(|&byte| match Gesture::try_from(byte) {
        Ok(gesture) => Some(gesture),
        Err(0x00) => None,
        Err(unknown) => {
            warn!("unknown gesture token {:#x}", unknown);
            None
        }
    })
}

/// One half of a key-style press/release pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyEvent {
    pub gesture: Gesture,
    pub pressed: bool,
}

/// Receives decoded gestures as key events.
///
/// Called from the worker task with the bus lock released; implementations
/// must not block.
pub trait GestureSink {
    fn report(&mut self, gesture: Gesture, pressed: bool);
}

impl<M: RawMutex, const N: usize> GestureSink for Sender<'_, M, KeyEvent, N> {
    fn report(&mut self, gesture: Gesture, pressed: bool) {
        if self.try_send(KeyEvent { gesture, pressed }).is_err() {
            warn!("key event queue full, dropping {:?}", gesture);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GestureStats {
    /// Interrupt edges handed to `on_interrupt`.
    pub raised: u32,
    /// FIFO drains the worker has completed.
    pub serviced: u32,
}

pub(crate) struct GestureQueue<M: RawMutex> {
    pending: Signal<M, ()>,
    stop: Signal<M, ()>,
    raised: AtomicU32,
    serviced: AtomicU32,
}

impl<M: RawMutex> GestureQueue<M> {
    pub(crate) const fn new() -> Self {
        Self {
            pending: Signal::new(),
            stop: Signal::new(),
            raised: AtomicU32::new(0),
            serviced: AtomicU32::new(0),
        }
    }

    pub(crate) fn stats(&self) -> GestureStats {
        GestureStats {
            raised: self.raised.load(Ordering::Relaxed),
            serviced: self.serviced.load(Ordering::Relaxed),
        }
    }
}

impl<M, I2C, D> Apds9960<M, I2C, D>
where
    M: RawMutex,
    I2C: I2c,
    D: DelayNs + Clone,
{
    /// Interrupt-context entry point. Only records that the FIFO needs
    /// checking; never touches the bus.
    pub fn on_interrupt(&self) {
        self.gestures.raised.fetch_add(1, Ordering::Relaxed);
        self.gestures.pending.signal(());
    }

    /// Checks GINT and, if set, drains one FIFO burst into `sink` as
    /// press/release pairs. Returns the number of gestures emitted.
    pub async fn service_gesture_fifo<S: GestureSink>(
        &self,
        sink: &mut S,
    ) -> Result<usize, Error<I2C::Error>> {
        let mut fifo = [0u8; FIFO_BURST];
        {
            let mut bus = self.regs.lock().await;
            let status = Status::from_bits_retain(
                bus.read_byte(Register::Status).await.map_err(Error::Bus)?,
            );
            if !status.contains(Status::GINT) {
                trace!("spurious gesture interrupt, status {:#x}", status.bits());
                return Ok(0);
            }
            bus.read_bytes(Register::GfifoU, &mut fifo)
                .await
                .map_err(Error::Bus)?;
        }

        let mut emitted = 0;
        for gesture in decode_fifo(&fifo) {
            debug!("gesture {:?}", gesture);
            sink.report(gesture, true);
            sink.report(gesture, false);
            emitted += 1;
        }
        Ok(emitted)
    }

    /// Deferred half of the interrupt path. Runs until
    /// [`stop_gesture_worker`](Self::stop_gesture_worker) or
    /// [`shutdown`](Self::shutdown). After a stop, work pending at that
    /// point gets one last drain; after a shutdown it is dropped.
    pub async fn run_gesture_worker<S: GestureSink>(&self, sink: &mut S) {
        info!("{}: gesture worker started", self.name());
        loop {
            match select(self.gestures.stop.wait(), self.gestures.pending.wait())
                .await
            {
                Either::First(()) => {
                    let pending = self.gestures.pending.try_take().is_some();
                    if pending && self.is_attached() {
                        self.drain(sink).await;
                    } else if pending {
                        debug!("{}: dropping gesture work after detach", self.name());
                    }
                    break;
                }
                Either::Second(()) => self.drain(sink).await,
            }
        }
        info!("{}: gesture worker stopped", self.name());
    }

    pub fn stop_gesture_worker(&self) {
        self.gestures.stop.signal(());
    }

    /// Forwards falling edges on the sensor's INT pin to
    /// [`on_interrupt`](Self::on_interrupt) until the device is shut down.
    ///
    /// Shutdown is noticed on the next edge.
    pub async fn watch_interrupt_line<P: Wait>(
        &self,
        pin: &mut P,
    ) -> Result<(), P::Error> {
        while self.is_attached() {
            pin.wait_for_falling_edge().await?;
            self.on_interrupt();
        }
        Ok(())
    }

    async fn drain<S: GestureSink>(&self, sink: &mut S) {
        match self.service_gesture_fifo(sink).await {
            Ok(0) => {}
            Ok(count) => trace!("drained {} gestures", count),
            Err(Error::Bus(e)) => warn!("gesture drain failed: {:?}", e.kind()),
            Err(_) => warn!("gesture drain failed"),
        }
        self.gestures.serviced.fetch_add(1, Ordering::Relaxed);
    }
}
