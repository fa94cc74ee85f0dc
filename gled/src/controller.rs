#[cfg(feature = "log")]
use log::{debug, info, warn};
#[cfg(feature = "defmt")]
use defmt::{debug, info, warn};

use core::cell::RefCell;
use core::future::poll_fn;
use core::ops::ControlFlow;
use core::task::Poll;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::waitqueue::{MultiWakerRegistration, WakerRegistration};
use embedded_hal::delay::DelayNs;

use crate::blink::{Affinity, AsyncFlash, BlinkCount, BlinkJob, BlinkParams, BlinkSpawner, Cycle, TaskOptions};
use crate::gpio::{Gpio, PinNumber};
use crate::polarity::Polarity;
use crate::Error;

/// Gpio of the build in LED on NodeMCU v3 and Wemos D1 mini boards.
/// Other boards often use a different gpio.
pub const BUILTIN_LED_PIN: PinNumber = 2;
pub const DEFAULT_FLASH_DELAY_MS: u32 = 64;
pub const DEFAULT_ASYNC_FLASH_COUNT: u32 = 13;
/// Upper bound for the count of [`LedController::flash_sync`].
pub const MAX_FLASH: u32 = 100;

// Callers of deactivate/reconnect_to_pin waiting at the same time. More are
// woken early and register again.
const STOP_WAITERS: usize = 4;

struct Inner<G: Gpio> {
    gpio: G,
    pin: PinNumber,
    polarity: Polarity,
    lit: bool,
    active: bool,
    params: BlinkParams,
    blinking: bool,
    stop_requested: bool,
    // Woken when a stop gets requested.
    task_waker: WakerRegistration,
    // Woken when the blink task has terminated.
    stop_waiters: MultiWakerRegistration<STOP_WAITERS>,
}

impl<G: Gpio> Inner<G> {
    fn switch(&mut self, lit: bool) {
        if self.active {
            self.lit = lit;
            self.gpio.write(self.pin, self.polarity.level(lit));
        }
    }
}

/// One LED on one gpio.
///
/// Every command is a no-op until [`activate`](Self::activate) is called.
/// At most one background blink task exists per controller. It borrows the
/// controller, so the controller usually lives in a `static`.
pub struct LedController<G: Gpio> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Inner<G>>>,
}

impl<G: Gpio> LedController<G> {
    pub fn new(gpio: G, pin: PinNumber, polarity: Polarity) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                gpio,
                pin,
                polarity,
                lit: false,
                active: false,
                params: BlinkParams::new(),
                blinking: false,
                stop_requested: false,
                task_waker: WakerRegistration::new(),
                stop_waiters: MultiWakerRegistration::new(),
            })),
        }
    }

    /// LED powered by the gpio itself and wired to GND.
    pub fn with_pin(gpio: G, pin: PinNumber) -> Self {
        Self::new(gpio, pin, Polarity::ActiveHigh)
    }

    /// The build in LED of NodeMCU v3 like boards. It is wired to VCC.
    pub fn builtin(gpio: G) -> Self {
        Self::new(gpio, BUILTIN_LED_PIN, Polarity::ActiveLow)
    }

    // Note: Runs inside a critical section. Keep logging out of `f`.
    fn with_inner<R>(&self, f: impl FnOnce(&mut Inner<G>) -> R) -> R {
        self.inner.lock(|inner| f(&mut inner.borrow_mut()))
    }

    /// Configures the gpio as output and switches the LED off.
    pub fn activate(&self) {
        let (pin, polarity) = self.with_inner(|inner| {
            inner.gpio.configure_output(inner.pin);
            inner.active = true;
            inner.switch(false);
            (inner.pin, inner.polarity)
        });
        warn!("LED ({}) activated, polarity: {:?}", pin, polarity);
    }

    /// Stops the blink task, switches the LED off and suppresses all further
    /// output until the next [`activate`](Self::activate).
    ///
    /// Returns after the blink task has terminated. Any number of callers may
    /// wait for the same task.
    pub async fn deactivate(&self) {
        warn!("LED ({}) disabled", self.pin());

        poll_fn(|cx| {
            self.with_inner(|inner| {
                if !inner.blinking {
                    return Poll::Ready(());
                }
                inner.stop_requested = true;
                inner.task_waker.wake();
                inner.stop_waiters.register(cx.waker());
                Poll::Pending
            })
        })
        .await;

        self.with_inner(|inner| {
            inner.switch(false);
            inner.active = false;
        });
    }

    /// Takes effect with the next on/off command.
    pub fn set_polarity(&self, polarity: Polarity) {
        self.with_inner(|inner| inner.polarity = polarity);
    }

    pub fn turn_on(&self) {
        self.switch(true);
    }

    pub fn turn_off(&self) {
        self.switch(false);
    }

    pub fn switch(&self, lit: bool) {
        self.with_inner(|inner| inner.switch(lit));
    }

    pub fn toggle(&self) {
        self.with_inner(|inner| {
            let lit = !inner.lit;
            inner.switch(lit);
        });
    }

    /// Blinks `count` times and blocks until done. Afterwards the LED is back
    /// in the state it had before the call.
    ///
    /// `count` is truncated to [`MAX_FLASH`]. An `off_ms` of 0 uses `on_ms`
    /// for both phases.
    pub fn flash_sync<D: DelayNs>(&self, count: u32, on_ms: u32, off_ms: u32, delay: &mut D) {
        let Some(restore_lit) = self.with_inner(|inner| inner.active.then_some(inner.lit)) else {
            return;
        };

        let count = count.min(MAX_FLASH);
        let off_ms = if off_ms == 0 { on_ms } else { off_ms };

        for _ in 0..count {
            self.turn_on();
            delay.delay_ms(on_ms);
            self.turn_off();
            delay.delay_ms(off_ms);
        }

        self.switch(restore_lit);
    }

    /// Blinks in the background without blocking.
    ///
    /// Starts the blink task if none is running. Otherwise the running task
    /// gets the new count and timing and uses them from its next cycle on.
    ///
    /// A call made while another call is still creating the task returns
    /// [`AsyncFlash::Updated`]. Should that creation fail, no task runs and
    /// the values stay stored like with [`AsyncFlash::Stored`].
    pub fn flash_async<'a, S>(
        &'a self,
        count: BlinkCount,
        on_ms: u32,
        off_ms: u32,
        affinity: Affinity,
        spawner: &S,
    ) -> Result<AsyncFlash, Error<S::Error>>
    where
        S: BlinkSpawner<'a, G>,
    {
        let (previous, start) = self.with_inner(|inner| {
            let previous = inner.params;
            inner.params.overwrite(count, on_ms, off_ms);

            if inner.blinking {
                return (previous, ControlFlow::Break(AsyncFlash::Updated));
            }
            if !inner.active {
                return (previous, ControlFlow::Break(AsyncFlash::Stored));
            }
            inner.blinking = true;
            inner.stop_requested = false;
            (previous, ControlFlow::Continue(inner.lit))
        });

        let restore_lit = match start {
            ControlFlow::Continue(restore_lit) => restore_lit,
            ControlFlow::Break(AsyncFlash::Updated) => {
                info!(
                    "blink task already running, remaining: {:?}, timing: ({}, {}) ms",
                    previous.count, previous.on_ms, previous.off_ms
                );
                info!("reset with new parameters: count: {:?}, timing: ({}, {}) ms", count, on_ms, off_ms);
                return Ok(AsyncFlash::Updated);
            }
            ControlFlow::Break(outcome) => return Ok(outcome),
        };

        let options = TaskOptions {
            affinity,
            ..TaskOptions::default()
        };
        info!("starting blink task: count: {:?}, affinity: {:?}", count, affinity);

        match spawner.spawn(BlinkJob::new(self, restore_lit), options) {
            Ok(()) => Ok(AsyncFlash::Started),
            Err(error) => {
                self.with_inner(|inner| {
                    inner.blinking = false;
                    inner.stop_waiters.wake();
                });
                warn!("creating the blink task failed");
                Err(Error::Spawn(error))
            }
        }
    }

    /// Changes the background blink timing, effective with the next cycle.
    pub fn set_async_timing(&self, on_ms: u32, off_ms: u32) {
        let (old, new) = self.with_inner(|inner| {
            let old = inner.params;
            inner.params.set_timing(on_ms, off_ms);
            (old, inner.params)
        });
        debug!("async timing: old on={} off={} ms", old.on_ms, old.off_ms);
        debug!("              new on={} off={} ms", new.on_ms, new.off_ms);
    }

    /// Moves the controller to another gpio.
    ///
    /// The controller ends up off and not active, [`activate`](Self::activate)
    /// has to be called again before the LED can be switched.
    pub async fn reconnect_to_pin(&self, pin: PinNumber, polarity: Polarity) {
        self.deactivate().await;

        self.with_inner(|inner| {
            inner.lit = false;
            inner.polarity = polarity;
            inner.pin = pin;
        });
    }

    pub fn pin(&self) -> PinNumber {
        self.with_inner(|inner| inner.pin)
    }

    pub fn polarity(&self) -> Polarity {
        self.with_inner(|inner| inner.polarity)
    }

    pub fn is_on(&self) -> bool {
        self.with_inner(|inner| inner.lit)
    }

    pub fn is_active(&self) -> bool {
        self.with_inner(|inner| inner.active)
    }

    pub fn is_blinking(&self) -> bool {
        self.with_inner(|inner| inner.blinking)
    }

    pub fn remaining_blinks(&self) -> BlinkCount {
        self.with_inner(|inner| inner.params.count)
    }

    /// Background blink timing as (on, off) in ms.
    pub fn async_timing(&self) -> (u32, u32) {
        self.with_inner(|inner| (inner.params.on_ms, inner.params.off_ms))
    }
}

// Interface of the blink task.
impl<G: Gpio> LedController<G> {
    pub(crate) fn begin_cycle(&self) -> Option<Cycle> {
        self.with_inner(|inner| {
            let running = inner.active && !inner.stop_requested && !inner.params.count.is_exhausted();
            running.then(|| inner.params.cycle())
        })
    }

    pub(crate) fn end_cycle(&self, cycle: &Cycle) {
        self.with_inner(|inner| inner.params.complete(cycle));
    }

    pub(crate) async fn stop_requested(&self) {
        poll_fn(|cx| {
            self.with_inner(|inner| {
                if inner.stop_requested {
                    return Poll::Ready(());
                }
                inner.task_waker.register(cx.waker());
                Poll::Pending
            })
        })
        .await;
    }

    pub(crate) fn finish_blinking(&self, restore_lit: bool, forced: bool) {
        let (remaining, active) = self.with_inner(|inner| {
            inner.switch(restore_lit);
            inner.blinking = false;
            inner.stop_waiters.wake();
            (inner.params.count, inner.active)
        });
        warn!(
            "blink task terminated (remaining: {:?}, active: {}, forced: {})",
            remaining, active, forced
        );
    }
}

impl<G: Gpio> Drop for LedController<G> {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().get_mut();
        inner.switch(false);
        inner.active = false;
    }
}
