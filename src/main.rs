//! Nursery AGV Firmware: Main Entry Point
//!
//! Hexagonal architecture with a single cooperative polling loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   NetTransport   SystemClock   │
//! │  (Sensor+Actuator) (EventSink)    (TCP + UDP)    (ClockPort)   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  FSM · line follower · route cursor                    │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  ControlLoop: CommandRouter · Scheduler (telemetry)            │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::net::{SocketAddr, ToSocketAddrs};

use anyhow::{Context, Result, anyhow};
use log::{info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::{AnyInputPin, AnyOutputPin, PinDriver};
use esp_idf_svc::hal::ledc::config::TimerConfig;
use esp_idf_svc::hal::ledc::{LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

use nursery_agv::adapters::hardware::HardwareAdapter;
use nursery_agv::adapters::log_sink::LogEventSink;
use nursery_agv::adapters::net_transport::NetTransport;
use nursery_agv::adapters::time::SystemClock;
use nursery_agv::app::ports::ClockPort;
use nursery_agv::config::SystemConfig;
use nursery_agv::control_loop::ControlLoop;
use nursery_agv::drivers::line_sensor::LineSensorArray;
use nursery_agv::drivers::motor::{BridgePins, MotorDriver};
use nursery_agv::pins;

/// Station credentials, baked in at build time.
const WIFI_SSID: &str = match option_env!("AGV_WIFI_SSID") {
    Some(s) => s,
    None => "nursery",
};
const WIFI_PASS: &str = match option_env!("AGV_WIFI_PASS") {
    Some(s) => s,
    None => "",
};

/// How often a dropped command stream is retried.
const RECONNECT_INTERVAL_MS: u64 = 2_000;

fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| anyhow!("no address for {host}:{port}"))
}

fn output(gpio: i32) -> Result<PinDriver<'static, AnyOutputPin, esp_idf_svc::hal::gpio::Output>> {
    // SAFETY: every GPIO number comes from `pins` and is claimed exactly once.
    Ok(PinDriver::output(unsafe { AnyOutputPin::new(gpio) })?)
}

fn input(gpio: i32) -> Result<PinDriver<'static, AnyInputPin, esp_idf_svc::hal::gpio::Input>> {
    // SAFETY: see `output`.
    Ok(PinDriver::input(unsafe { AnyInputPin::new(gpio) })?)
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Nursery AGV v{}                     ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = SystemConfig::default();
    config.validate().map_err(|e| anyhow!("config: {e}"))?;

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // ── 2. Drive motors (L298N) ───────────────────────────────
    let timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig::new()
            .frequency(Hertz(pins::MOTOR_PWM_FREQ_HZ))
            .resolution(Resolution::Bits8),
    )?;
    // SAFETY: see `output`.
    let ena = LedcDriver::new(peripherals.ledc.channel0, &timer, unsafe {
        AnyOutputPin::new(pins::MOTOR_ENA_GPIO)
    })?;
    let enb = LedcDriver::new(peripherals.ledc.channel1, &timer, unsafe {
        AnyOutputPin::new(pins::MOTOR_ENB_GPIO)
    })?;
    let motors = MotorDriver::new(
        BridgePins {
            in1: output(pins::MOTOR_IN1_GPIO)?,
            in2: output(pins::MOTOR_IN2_GPIO)?,
            in3: output(pins::MOTOR_IN3_GPIO)?,
            in4: output(pins::MOTOR_IN4_GPIO)?,
        },
        ena,
        enb,
    );

    // ── 3. Line sensors ───────────────────────────────────────
    let sensors = LineSensorArray::new([
        input(pins::LINE_S1_GPIO)?,
        input(pins::LINE_S2_GPIO)?,
        input(pins::LINE_S3_GPIO)?,
        input(pins::LINE_S4_GPIO)?,
        input(pins::LINE_S5_GPIO)?,
    ]);

    let mut hw = HardwareAdapter::new(sensors, motors);
    let mut sink = LogEventSink::new();
    let clock = SystemClock::new();

    // ── 4. WiFi station ───────────────────────────────────────
    let mut wifi = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?,
        sysloop,
    )?;
    wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: WIFI_SSID.try_into().map_err(|()| anyhow!("SSID too long"))?,
        password: WIFI_PASS.try_into().map_err(|()| anyhow!("password too long"))?,
        auth_method: if WIFI_PASS.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        },
        ..Default::default()
    }))?;
    wifi.start()?;
    wifi.connect().context("WiFi connect")?;
    wifi.wait_netif_up()?;
    info!("WiFi: connected to '{}'", WIFI_SSID);

    // ── 5. Command link ───────────────────────────────────────
    let transport = NetTransport::connect(
        resolve(&config.server_host, config.command_port)?,
        resolve(&config.server_host, config.telemetry_port)?,
    )?;

    // ── 6. Control loop ───────────────────────────────────────
    let pace_ms = config.control_loop_interval_ms;
    let mut control = ControlLoop::new(config, transport);
    control.start(clock.now_ms(), &mut hw, &mut sink);

    info!("System ready. Entering control loop.");

    let mut last_reconnect_ms = clock.now_ms();
    loop {
        let now_ms = clock.now_ms();
        let _ = control.run_cycle(now_ms, &mut hw, &mut sink);

        // The connect blocks for up to its timeout, so only try while
        // the motors are stopped.
        let link_down = !control.router().transport().is_connected();
        if link_down
            && control.can_block()
            && now_ms.saturating_sub(last_reconnect_ms) >= RECONNECT_INTERVAL_MS
        {
            last_reconnect_ms = now_ms;
            let router = control.router_mut();
            match router.transport_mut().reconnect() {
                Ok(()) => router.reset_link(),
                Err(e) => warn!("NET: reconnect failed: {}", e),
            }
        }

        FreeRtos::delay_ms(pace_ms);
    }
}
