use defmt::warn;
use embassy_stm32::gpio::{Flex, Level, Speed};

use gled::{Gpio, PinNumber, PinState};

// Note: Flex allows the controller to decide when a pin becomes an output.
pub struct BoardGpio<const N: usize> {
    pins: [(PinNumber, Flex<'static>); N],
}

impl<const N: usize> BoardGpio<N> {
    pub fn new(pins: [(PinNumber, Flex<'static>); N]) -> Self {
        Self { pins }
    }

    fn pin(&mut self, pin: PinNumber) -> Option<&mut Flex<'static>> {
        self.pins
            .iter_mut()
            .find(|(number, _)| *number == pin)
            .map(|(_, flex)| flex)
    }
}

impl<const N: usize> Gpio for BoardGpio<N> {
    fn configure_output(&mut self, pin: PinNumber) {
        match self.pin(pin) {
            Some(flex) => flex.set_as_output(Speed::Low),
            None => warn!("gpio {} is not wired on this board", pin),
        }
    }

    fn write(&mut self, pin: PinNumber, level: PinState) {
        if let Some(flex) = self.pin(pin) {
            match level {
                PinState::High => flex.set_level(Level::High),
                PinState::Low => flex.set_level(Level::Low),
            }
        }
    }
}
