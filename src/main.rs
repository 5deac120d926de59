//! VRPC Agent Firmware: Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  MqttAdapter (BrokerPort)   SystemClock (ClockPort)   WiFi     │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  Agent (lifecycle) → Router → Registry → CallTarget    │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use log::{info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::PinDriver;
use esp_idf_svc::hal::prelude::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

use vrpc_agent::adapters::device_id;
use vrpc_agent::adapters::mqtt::MqttAdapter;
use vrpc_agent::adapters::time::SystemClock;
use vrpc_agent::adapters::wifi::WifiSupervisor;
use vrpc_agent::app::ports::ClockPort;
use vrpc_agent::agent::{Agent, AgentIdentity};
use vrpc_agent::config::AgentConfig;
use vrpc_agent::rpc::registry::Registry;
use vrpc_agent::rpc::target::{ValueTarget, VoidTarget};

/// Optional JSON config baked in at build time.
const CONFIG_JSON: Option<&str> = option_env!("VRPC_CONFIG_JSON");

const WIFI_SSID: &str = match option_env!("VRPC_WIFI_SSID") {
    Some(s) => s,
    None => "",
};

const WIFI_PASSWORD: &str = match option_env!("VRPC_WIFI_PASSWORD") {
    Some(s) => s,
    None => "",
};

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  VRPC Agent v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Config ─────────────────────────────────────────────
    let config = match CONFIG_JSON.map(AgentConfig::from_json) {
        Some(Ok(cfg)) => {
            info!("Config loaded");
            cfg
        }
        Some(Err(e)) => {
            warn!("Config invalid ({}), using defaults", e);
            AgentConfig::default()
        }
        None => AgentConfig::default(),
    };

    // ── 3. Network ────────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    let mut wifi = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?,
        sysloop,
    )?;
    wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: WIFI_SSID
            .try_into()
            .map_err(|_| anyhow::anyhow!("SSID too long"))?,
        password: WIFI_PASSWORD
            .try_into()
            .map_err(|_| anyhow::anyhow!("password too long"))?,
        auth_method: if WIFI_PASSWORD.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        },
        ..Default::default()
    }))?;
    wifi.start()?;
    wifi.connect()?;
    wifi.wait_netif_up()?;
    info!("WiFi connected to '{}'", WIFI_SSID);

    // ── 4. Registry ───────────────────────────────────────────
    let led = Rc::new(RefCell::new(PinDriver::output(peripherals.pins.gpio2)?));

    let mut registry = Registry::new();
    let on = Rc::clone(&led);
    registry.register_global(
        "ledOn",
        VoidTarget::new(move || {
            if let Err(e) = on.borrow_mut().set_high() {
                warn!("ledOn: {}", e);
            }
        }),
    );
    let off = Rc::clone(&led);
    registry.register_global(
        "ledOff",
        VoidTarget::new(move || {
            if let Err(e) = off.borrow_mut().set_low() {
                warn!("ledOff: {}", e);
            }
        }),
    );
    registry.register_global("add", ValueTarget::new(|a: i32, b: i32| a.wrapping_add(b)));
    info!("Registered {} functions", registry.len());

    // ── 5. Agent ──────────────────────────────────────────────
    let mac = device_id::read_mac();
    let dev_id = device_id::device_id(&mac);
    let dev_hostname = device_id::hostname(&mac);
    info!("Device ID: {} (hostname: {})", dev_id, dev_hostname);

    let identity = AgentIdentity::new(&config, &dev_id, &dev_hostname);
    let broker = MqttAdapter::new(&config.broker_url(), config.connect_timeout_ms);
    let mut agent = Agent::new(&registry, &config, identity, broker, SystemClock::new())?;

    // ── 6. Control loop ───────────────────────────────────────
    let clock = SystemClock::new();
    let mut link = WifiSupervisor::new();
    loop {
        let up = wifi.is_connected().unwrap_or(false);
        link.poll(clock.now_ms(), up, || match wifi.connect().and_then(|()| wifi.wait_netif_up()) {
            Ok(()) => true,
            Err(e) => {
                warn!("WiFi: reconnect failed: {}", e);
                false
            }
        });
        agent.tick();
        FreeRtos::delay_ms(10);
    }
}
