//! Control of a single GPIO driven LED.
//!
//! Some LEDs light up when their control pin is HIGH, others when it is LOW.
//! [`LedController`] hides that detail behind on/off commands and offers
//! blocking ([`LedController::flash_sync`]) and background
//! ([`LedController::flash_async`]) blink sequences.

#![cfg_attr(not(test), no_std)]

#[cfg(all(feature = "defmt", feature = "log"))]
compile_error!("Features 'defmt' and 'log' cannot be enabled at the same time.");

#[cfg(not(any(feature = "defmt", feature = "log")))]
compile_error!("One of the features 'defmt' or 'log' must be enabled.");

mod polarity;
pub use polarity::Polarity;

mod gpio;
pub use gpio::{Gpio, PinNumber, PinState};

mod blink;
pub use blink::{Affinity, AsyncFlash, BlinkCount, BlinkJob, BlinkSpawner, TaskOptions};

mod controller;
pub use controller::{
    LedController, BUILTIN_LED_PIN, DEFAULT_ASYNC_FLASH_COUNT, DEFAULT_FLASH_DELAY_MS, MAX_FLASH,
};

#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The platform could not create the background blink task.
    Spawn(E),
}
