use std::convert::Infallible;

use log::info;
use static_cell::StaticCell;
use tokio::time::{sleep, Duration};

use gled::{Affinity, BlinkCount, BlinkJob, BlinkSpawner, Gpio, LedController, PinNumber, PinState, Polarity, TaskOptions};

/// Prints every level change instead of driving real hardware.
struct ConsoleGpio;

impl Gpio for ConsoleGpio {
    fn configure_output(&mut self, pin: PinNumber) {
        println!("gpio{}: output", pin);
    }

    fn write(&mut self, pin: PinNumber, level: PinState) {
        println!("gpio{}: {:?}", pin, level);
    }
}

struct BlockingDelay;

impl embedded_hal::delay::DelayNs for BlockingDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns.into()));
    }
}

struct TokioDelay;

impl embedded_hal_async::delay::DelayNs for TokioDelay {
    async fn delay_ns(&mut self, ns: u32) {
        sleep(Duration::from_nanos(ns.into())).await;
    }
}

struct TokioSpawner;

impl BlinkSpawner<'static, ConsoleGpio> for TokioSpawner {
    type Error = Infallible;

    fn spawn(&self, job: BlinkJob<'static, ConsoleGpio>, options: TaskOptions) -> Result<(), Self::Error> {
        info!("spawning blink task with {:?}", options);
        tokio::spawn(job.run(TokioDelay));
        Ok(())
    }
}

static LED: StaticCell<LedController<ConsoleGpio>> = StaticCell::new();

#[tokio::main]
async fn main() {
    env_logger::init();

    info!("Hello!!!!");

    let led: &'static LedController<ConsoleGpio> = LED.init(LedController::new(ConsoleGpio, 18, Polarity::ActiveLow));
    led.activate();

    println!("on/off");
    led.turn_on();
    sleep(Duration::from_millis(500)).await;
    led.turn_off();

    println!("flash_sync");
    tokio::task::spawn_blocking(move || led.flash_sync(3, 100, 0, &mut BlockingDelay))
        .await
        .unwrap();

    println!("flash_async with an update while running");
    led.flash_async(BlinkCount::Finite(5), 50, 200, Affinity::Any, &TokioSpawner).unwrap();
    sleep(Duration::from_millis(10)).await;
    led.flash_async(BlinkCount::Finite(2), 10, 10, Affinity::Any, &TokioSpawner).unwrap();
    sleep(Duration::from_secs(1)).await;

    println!("unbounded flash_async, stopped by deactivate");
    led.flash_async(BlinkCount::Unbounded, 100, 100, Affinity::Core(1), &TokioSpawner).unwrap();
    sleep(Duration::from_secs(1)).await;
    led.deactivate().await;

    println!("reconnect to gpio19");
    led.reconnect_to_pin(19, Polarity::ActiveHigh).await;
    led.activate();
    for _ in 0..4 {
        led.toggle();
        sleep(Duration::from_millis(250)).await;
    }
    led.deactivate().await;
}
