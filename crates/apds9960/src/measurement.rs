//! Measurement trigger and completion wait.
//!
//! The part has no "conversion done" interrupt for color, so completion is a
//! fixed delay after the trigger. The wait races the caller's cancel future
//! and the device cancel signal; whichever finishes first decides whether
//! the latched color registers are read at all.
//!
//! Reads are serialized: one request owns the sensor (and the device cancel
//! signal) from trigger to report, later requests queue behind it.

use core::future::{pending, Future};
use core::pin::pin;

use bitflags::bitflags;
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::config::ProximityInterrupt;
use crate::device::Apds9960;
use crate::errors::Error;
use crate::registers::{Enable, Register};
use crate::report::Report;

bitflags! {
    /// Channels requested by one read.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Channels: u8 {
        const PROXIMITY = 1 << 0;
        const COLOR     = 1 << 1;
    }
}

impl Channels {
    /// ENABLE bits that power the requested engines.
    pub fn enable_bits(self) -> Enable {
        let mut enable = Enable::PON;
        if self.contains(Channels::PROXIMITY) {
            enable |= Enable::PEN;
        }
        if self.contains(Channels::COLOR) {
            enable |= Enable::AEN;
        }
        enable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MeasurementState {
    Idle,
    Triggered,
    WaitingForTimer,
    Ready,
    Cancelled,
}

/// One read request and how far it got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    channels: Channels,
    state: MeasurementState,
}

impl Measurement {
    pub fn new(channels: Channels) -> Self {
        Self {
            channels,
            state: MeasurementState::Idle,
        }
    }

    pub fn channels(&self) -> Channels {
        self.channels
    }

    pub fn state(&self) -> MeasurementState {
        self.state
    }

    fn advance(&mut self, next: MeasurementState) {
        trace!("measurement {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

impl<M, I2C, D> Apds9960<M, I2C, D>
where
    M: RawMutex,
    I2C: I2c,
    D: DelayNs + Clone,
{
    /// Reads proximity and color, waiting the full conversion time.
    pub async fn read_report(&self) -> Result<Report, Error<I2C::Error>> {
        self.read_report_until(pending()).await
    }

    /// Like [`read_report`](Self::read_report), but gives up with
    /// [`Error::Cancelled`] if `cancel` completes before the conversion
    /// wait does.
    pub async fn read_report_until<C>(
        &self,
        cancel: C,
    ) -> Result<Report, Error<I2C::Error>>
    where
        C: Future<Output = ()>,
    {
        let mut request = Measurement::new(Channels::all());
        self.measure(&mut request, cancel).await
    }

    /// Runs one trigger / wait / read cycle for `request`.
    ///
    /// Proximity is sampled right after the trigger and never waits; the
    /// timer only runs when color was requested. A cancelled request never
    /// touches the color registers. `cancel` also applies while the request
    /// is queued behind another read.
    pub async fn measure<C>(
        &self,
        request: &mut Measurement,
        cancel: C,
    ) -> Result<Report, Error<I2C::Error>>
    where
        C: Future<Output = ()>,
    {
        let channels = request.channels();
        if channels.is_empty() {
            return Err(Error::InvalidInput);
        }

        let mut cancel = pin!(cancel);
        let _owner = match select(self.requests.lock(), cancel.as_mut()).await {
            Either::First(guard) => guard,
            Either::Second(()) => {
                request.advance(MeasurementState::Cancelled);
                debug!("measurement cancelled while queued");
                return Err(Error::Cancelled);
            }
        };
        self.ensure_attached()?;
        // Only cancels raised while this request owns the sensor count.
        self.cancel.reset();

        self.trigger(channels).await?;
        request.advance(MeasurementState::Triggered);

        let proximity = if channels.contains(Channels::PROXIMITY) {
            self.read_proximity().await?
        } else {
            None
        };

        let color = if channels.contains(Channels::COLOR) {
            request.advance(MeasurementState::WaitingForTimer);
            if let Either::Second(_) = select(
                self.wait_conversion(),
                select(cancel.as_mut(), self.cancel.wait()),
            )
            .await
            {
                request.advance(MeasurementState::Cancelled);
                debug!("measurement cancelled during conversion wait");
                return Err(Error::Cancelled);
            }
            // Cancel may land after the timer already won the select.
            if self.cancel.signaled() || !self.is_attached() {
                request.advance(MeasurementState::Cancelled);
                return Err(Error::Cancelled);
            }
            request.advance(MeasurementState::Ready);
            self.read_color().await?
        } else {
            request.advance(MeasurementState::Ready);
            None
        };

        let report = Report::assemble::<I2C::Error>(channels, proximity, color)?;

        if let Some(irq) = self.config().proximity_interrupt {
            self.arm_proximity_interrupt(&irq).await?;
        }

        Ok(report)
    }

    async fn wait_conversion(&self) {
        let micros = self.config().conversion_time.as_micros();
        let mut delay = self.delay.clone();
        delay
            .delay_us(u32::try_from(micros).unwrap_or(u32::MAX))
            .await;
    }

    /// Applies timing and gain, then starts the requested engines. The
    /// gesture engine keeps running if `init` turned it on.
    async fn trigger(&self, channels: Channels) -> Result<(), Error<I2C::Error>> {
        let config = self.config();
        let mut bus = self.regs.lock().await;

        bus.write_cached(Register::Atime, config.adc_integration_time)
            .await
            .map_err(Error::Bus)?;
        bus.write_cached(Register::Control, config.control.bits())
            .await
            .map_err(Error::Bus)?;

        let retained = bus
            .shadow(Register::Enable)
            .map(Enable::from_bits_retain)
            .unwrap_or(Enable::empty())
            & Enable::GEN;
        let enable = channels.enable_bits() | retained;
        bus.write_byte(Register::Enable, enable.bits())
            .await
            .map_err(Error::Bus)?;

        bus.write_cached(Register::Config3, config.config3())
            .await
            .map_err(Error::Bus)?;

        debug!("triggered, enable {:#x}", enable.bits());
        Ok(())
    }

    async fn arm_proximity_interrupt(
        &self,
        irq: &ProximityInterrupt,
    ) -> Result<(), Error<I2C::Error>> {
        let mut bus = self.regs.lock().await;

        bus.write_cached(Register::Pers, irq.pers())
            .await
            .map_err(Error::Bus)?;
        bus.write_cached(Register::Pilt, irq.low)
            .await
            .map_err(Error::Bus)?;
        bus.write_cached(Register::Piht, irq.high)
            .await
            .map_err(Error::Bus)?;

        let retained = bus
            .shadow(Register::Enable)
            .map(Enable::from_bits_retain)
            .unwrap_or(Enable::empty())
            & Enable::GEN;
        let enable = Enable::PON | Enable::PEN | Enable::PIEN | retained;
        bus.write_byte(Register::Enable, enable.bits())
            .await
            .map_err(Error::Bus)?;
        Ok(())
    }
}
