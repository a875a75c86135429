#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use embassy_executor::Spawner;
use embassy_time::{Delay, Duration, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::timer::timg::TimerGroup;
use idrelay_core::App;
use idrelay_core::config::Config;
use idrelay_core::display::hd44780::Hd44780I2c;
use idrelay_firmware::http_client::TcpHttpTransport;
use idrelay_firmware::{config, hardware, wifi};
use log::{error, info};
use rtt_target::rprintln;
use static_cell::StaticCell;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rprintln!("PANIC: {}", info);
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

static CONFIG: StaticCell<Config<'static>> = StaticCell::new();

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let hal_config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(hal_config);

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("Embassy initialized");

    let config: &'static Config<'static> = CONFIG.init(config::load());

    let console = hardware::create_console(
        peripherals.UART0,
        peripherals.GPIO43,
        peripherals.GPIO44,
        config.serial.baud_rate,
    );

    let i2c = hardware::create_i2c_bus(peripherals.I2C0, peripherals.GPIO8, peripherals.GPIO9);
    let mut lcd = Hd44780I2c::new(
        i2c,
        Delay,
        config.display.i2c_address,
        config.display.columns,
        config.display.rows,
    );
    // A missing LCD must not stop the relay; the serial side still works
    if let Err(e) = lcd.init().await {
        error!("LCD init at {:#04x} failed: {:?}", config.display.i2c_address, e);
    }

    let link = wifi::init(&spawner, peripherals.WIFI);
    let transport = TcpHttpTransport::new(link.stack(), config.orion.http_timeout_ms);

    let mut app = match App::new(config, console, lcd, link, transport, Delay) {
        Ok(app) => app,
        Err(e) => halt(e).await,
    };

    if let Err(e) = app.boot().await {
        halt(e).await;
    }

    app.run().await
}

async fn halt(reason: impl core::fmt::Display) -> ! {
    error!("Halted: {}", reason);
    loop {
        Timer::after(Duration::from_secs(1)).await;
    }
}
