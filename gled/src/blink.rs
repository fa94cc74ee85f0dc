#[cfg(feature = "log")]
use log::info;
#[cfg(feature = "defmt")]
use defmt::info;

use embassy_futures::select::{select, Either};
use embedded_hal_async::delay::DelayNs;

use crate::controller::{LedController, DEFAULT_FLASH_DELAY_MS};
use crate::gpio::Gpio;

/// Number of on/off cycles a background blink sequence still has to run.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlinkCount {
    Finite(u32),
    /// Blinks until the controller gets deactivated or reconnected.
    Unbounded,
}

impl BlinkCount {
    pub fn is_exhausted(self) -> bool {
        self == BlinkCount::Finite(0)
    }

    fn decremented(self) -> Self {
        match self {
            BlinkCount::Finite(count) => BlinkCount::Finite(count.saturating_sub(1)),
            BlinkCount::Unbounded => BlinkCount::Unbounded,
        }
    }
}

impl From<u32> for BlinkCount {
    fn from(count: u32) -> Self {
        BlinkCount::Finite(count)
    }
}

#[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Affinity {
    #[default]
    Any,
    Core(u8),
}

/// Hints handed to the platform when the background blink task gets created.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskOptions {
    pub stack_size: usize,
    pub priority: u8,
    pub affinity: Affinity,
}

impl Default for TaskOptions {
    fn default() -> Self {
        Self {
            stack_size: 2048,
            priority: 2,
            affinity: Affinity::Any,
        }
    }
}

/// Outcome of [`LedController::flash_async`].
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AsyncFlash {
    /// A new background blink task was created.
    Started,
    /// A task was already running. It picks up the new values with its next cycle.
    Updated,
    /// The controller is not active. The values are kept for a later call.
    Stored,
}

/// Platform task creation primitive.
///
/// Implementations start a task which awaits [`BlinkJob::run`]. Returning an
/// error leaves the controller without a running task, the call may be retried.
pub trait BlinkSpawner<'a, G: Gpio> {
    type Error;

    fn spawn(&self, job: BlinkJob<'a, G>, options: TaskOptions) -> Result<(), Self::Error>;
}

/// Count and timing shared between the controller and its blink task.
///
/// The task takes a [`Cycle`] snapshot at the start of every cycle, so updates
/// take effect with the next cycle and are never seen half written.
#[derive(Debug, Copy, Clone)]
pub(crate) struct BlinkParams {
    pub count: BlinkCount,
    pub on_ms: u32,
    pub off_ms: u32,
    // Incremented each time the count gets overwritten.
    epoch: u32,
}

impl BlinkParams {
    pub const fn new() -> Self {
        Self {
            count: BlinkCount::Finite(0),
            on_ms: DEFAULT_FLASH_DELAY_MS,
            off_ms: DEFAULT_FLASH_DELAY_MS,
            epoch: 0,
        }
    }

    pub fn overwrite(&mut self, count: BlinkCount, on_ms: u32, off_ms: u32) {
        self.count = count;
        self.set_timing(on_ms, off_ms);
        self.epoch = self.epoch.wrapping_add(1);
    }

    pub fn set_timing(&mut self, on_ms: u32, off_ms: u32) {
        self.on_ms = on_ms;
        self.off_ms = if off_ms == 0 { on_ms } else { off_ms };
    }

    pub fn cycle(&self) -> Cycle {
        Cycle {
            on_ms: self.on_ms,
            off_ms: self.off_ms,
            epoch: self.epoch,
        }
    }

    /// A cycle only counts against the count it was started with.
    pub fn complete(&mut self, cycle: &Cycle) {
        if cycle.epoch == self.epoch {
            self.count = self.count.decremented();
        }
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub(crate) struct Cycle {
    pub on_ms: u32,
    pub off_ms: u32,
    epoch: u32,
}

struct Stopped;

/// Body of the background blink task of one [`LedController`].
pub struct BlinkJob<'a, G: Gpio> {
    led: &'a LedController<G>,
    restore_lit: bool,
}

impl<'a, G: Gpio> BlinkJob<'a, G> {
    pub(crate) fn new(led: &'a LedController<G>, restore_lit: bool) -> Self {
        Self { led, restore_lit }
    }

    /// Blinks until the count runs out, the controller gets deactivated or a
    /// stop is requested. Afterwards the LED is switched back to the state it
    /// had when the task was started.
    pub async fn run<D: DelayNs>(self, mut delay: D) {
        info!("blink task started (pin: {}, restore lit: {})", self.led.pin(), self.restore_lit);
        let forced = self.blink(&mut delay).await.is_err();
        self.led.finish_blinking(self.restore_lit, forced);
    }

    async fn blink<D: DelayNs>(&self, delay: &mut D) -> Result<(), Stopped> {
        while let Some(cycle) = self.led.begin_cycle() {
            self.led.switch(true);
            self.wait_ms(delay, cycle.on_ms).await?;
            self.led.switch(false);
            self.wait_ms(delay, cycle.off_ms).await?;
            self.led.end_cycle(&cycle);
        }
        Ok(())
    }

    async fn wait_ms<D: DelayNs>(&self, delay: &mut D, duration: u32) -> Result<(), Stopped> {
        match select(delay.delay_ms(duration), self.led.stop_requested()).await {
            Either::First(()) => Ok(()),
            Either::Second(()) => Err(Stopped),
        }
    }
}
