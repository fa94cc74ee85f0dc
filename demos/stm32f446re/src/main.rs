//! Blink the user LED (LD2 on PA5) of the NUCLEO-F446RE with a `LedController`.

#![no_main]
#![cfg_attr(not(test), no_std)]

use defmt::*;
use embassy_executor::{main, task, SpawnError, Spawner};
use embassy_stm32::gpio::Flex;
use embassy_time::{Delay, Timer};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

mod board_gpio;
use board_gpio::BoardGpio;

use gled::{
    Affinity, BlinkCount, BlinkJob, BlinkSpawner, LedController, Polarity, TaskOptions,
    DEFAULT_ASYNC_FLASH_COUNT, DEFAULT_FLASH_DELAY_MS,
};

// PA5 drives LD2. PA6 is free for an external LED wired to VCC.
const LD2: u8 = 5;
const EXTERNAL_LED: u8 = 6;

type Gpio = BoardGpio<2>;

static LED: StaticCell<LedController<Gpio>> = StaticCell::new();

#[main]
async fn main(spawner: Spawner) {
    let peripherals = embassy_stm32::init(Default::default());
    info!("Hello World!");

    let gpio = BoardGpio::new([
        (LD2, Flex::new(peripherals.PA5)),
        (EXTERNAL_LED, Flex::new(peripherals.PA6)),
    ]);
    let led: &'static LedController<Gpio> = LED.init(LedController::new(gpio, LD2, Polarity::ActiveHigh));
    let spawner = TaskSpawner(spawner);

    led.activate();
    led.flash_sync(3, 100, 0, &mut Delay);
    Timer::after_millis(1000).await;

    start_blinking(led, BlinkCount::Finite(DEFAULT_ASYNC_FLASH_COUNT), DEFAULT_FLASH_DELAY_MS, 0, &spawner);
    Timer::after_millis(500).await;
    // picked up by the running task with its next cycle
    start_blinking(led, BlinkCount::Finite(20), 20, 80, &spawner);
    Timer::after_millis(3000).await;

    start_blinking(led, BlinkCount::Unbounded, 500, 1500, &spawner);
    Timer::after_millis(10_000).await;

    led.reconnect_to_pin(EXTERNAL_LED, Polarity::ActiveLow).await;
    led.activate();

    loop {
        led.toggle();
        Timer::after_millis(2000).await;
    }
}

fn start_blinking(led: &'static LedController<Gpio>, count: BlinkCount, on_ms: u32, off_ms: u32, spawner: &TaskSpawner) {
    match led.flash_async(count, on_ms, off_ms, Affinity::Any, spawner) {
        Ok(outcome) => info!("flash_async: {:?}", outcome),
        Err(error) => warn!("flash_async failed: {:?}", error),
    }
}

struct TaskSpawner(Spawner);

impl BlinkSpawner<'static, Gpio> for TaskSpawner {
    type Error = SpawnError;

    // Note: The embassy executor has neither stack sizes nor priorities per task.
    fn spawn(&self, job: BlinkJob<'static, Gpio>, options: TaskOptions) -> Result<(), Self::Error> {
        debug!("spawning blink task with {:?}", options);
        self.0.spawn(blink(job))
    }
}

// A finished task only frees its slot after the controller was told, so
// an immediate restart needs a second slot.
#[task(pool_size = 2)]
async fn blink(job: BlinkJob<'static, Gpio>) {
    job.run(Delay).await;
}
