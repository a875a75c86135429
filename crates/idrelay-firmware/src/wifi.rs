//! WiFi station and network stack

use alloc::string::String;

use embassy_executor::Spawner;
use embassy_net::{Runner, Stack, StackResources};
use esp_hal::peripherals::WIFI;
use esp_hal::rng::Rng;
use esp_radio::Controller as RadioController;
use esp_radio::wifi::{ClientConfig, ModeConfig, WifiController, WifiDevice, WifiError};
use idrelay_core::association::{Connectivity, WifiLink};
use log::info;
use static_cell::StaticCell;

static RADIO_CONTROLLER: StaticCell<RadioController<'static>> = StaticCell::new();
// DHCP, DNS and one HTTP connection at a time
static NET_RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await;
}

/// Bring up the radio and the DHCP network stack.
///
/// The stack runner is spawned immediately; association starts when
/// [`WifiLink::begin`] is called.
pub fn init(spawner: &Spawner, wifi: WIFI<'static>) -> EspWifiLink {
    let radio = RADIO_CONTROLLER
        .init(esp_radio::init().expect("Failed to initialize Wi-Fi/BLE controller"));
    let (controller, interfaces) = esp_radio::wifi::new(radio, wifi, Default::default())
        .expect("Failed to initialize Wi-Fi controller");

    let rng = Rng::new();
    let seed = (u64::from(rng.random()) << 32) | u64::from(rng.random());

    let (stack, runner) = embassy_net::new(
        interfaces.sta,
        embassy_net::Config::dhcpv4(Default::default()),
        NET_RESOURCES.init(StackResources::new()),
        seed,
    );

    spawner
        .spawn(net_task(runner))
        .expect("Failed to spawn network task");
    info!("Network stack started");

    EspWifiLink { controller, stack }
}

pub struct EspWifiLink {
    controller: WifiController<'static>,
    stack: Stack<'static>,
}

impl EspWifiLink {
    pub fn stack(&self) -> Stack<'static> {
        self.stack
    }
}

impl Connectivity for EspWifiLink {
    /// Associated and holding a DHCP lease.
    fn is_connected(&mut self) -> bool {
        self.stack.is_link_up() && self.stack.is_config_up()
    }
}

impl WifiLink for EspWifiLink {
    type Error = WifiError;

    /// Configure and start the station on the first call, then try to join.
    ///
    /// Fails whenever the access point does not accept us right away; the
    /// caller calls again on its next poll.
    async fn begin(&mut self, ssid: &str, password: &str) -> Result<(), Self::Error> {
        if !matches!(self.controller.is_started(), Ok(true)) {
            let mode = ModeConfig::Client(
                ClientConfig::default()
                    .with_ssid(String::from(ssid))
                    .with_password(String::from(password)),
            );
            self.controller.set_config(&mode)?;
            info!("Starting Wi-Fi STA");
            self.controller.start_async().await?;
        }

        // Returns once the access point accepted us; the DHCP lease follows
        self.controller.connect_async().await
    }
}
