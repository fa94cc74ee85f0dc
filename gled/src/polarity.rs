use crate::gpio::PinState;

/// Switching logic of the LED circuit.
#[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Lit while the control pin is HIGH. The LED is wired to GND.
    #[default]
    ActiveHigh,
    /// Lit while the control pin is LOW. The LED is wired to VCC.
    ActiveLow,
}

impl Polarity {
    pub fn from_on_is_high(on_is_high: bool) -> Self {
        match on_is_high {
            true => Polarity::ActiveHigh,
            false => Polarity::ActiveLow,
        }
    }

    pub fn on_is_high(self) -> bool {
        self == Polarity::ActiveHigh
    }

    /// Physical level that produces the logical state `lit`.
    pub fn level(self, lit: bool) -> PinState {
        PinState::from(lit ^ (self == Polarity::ActiveLow))
    }

    pub fn off_level(self) -> PinState {
        self.level(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level() {
        let test_cases: &[(Polarity, bool, PinState)] = &[
            // polarity,            lit,   expected
            (Polarity::ActiveHigh,  true,  PinState::High),
            (Polarity::ActiveHigh,  false, PinState::Low),
            (Polarity::ActiveLow,   true,  PinState::Low),
            (Polarity::ActiveLow,   false, PinState::High),
        ];

        for (polarity, lit, expected) in test_cases {
            assert_eq!(polarity.level(*lit), *expected, "polarity: {:?}, lit: {:?}", polarity, lit);
        }
    }

    #[test]
    fn test_off_level() {
        assert_eq!(Polarity::ActiveHigh.off_level(), PinState::Low);
        assert_eq!(Polarity::ActiveLow.off_level(), PinState::High);
    }

    #[test]
    fn test_on_is_high() {
        for on_is_high in [true, false] {
            assert_eq!(Polarity::from_on_is_high(on_is_high).on_is_high(), on_is_high);
        }
        assert_eq!(Polarity::default(), Polarity::ActiveHigh);
    }
}
