pub use embedded_hal::digital::PinState;

#[cfg(test)]
use mockall::automock;

/// GPIO line number.
pub type PinNumber = u8;

/// Digital output primitive of the board.
///
/// Pins are addressed by number so a controller can be moved to another
/// pin at runtime, see [`crate::LedController::reconnect_to_pin`].
#[cfg_attr(test, automock)]
pub trait Gpio {
    fn configure_output(&mut self, pin: PinNumber);

    fn write(&mut self, pin: PinNumber, level: PinState);
}
