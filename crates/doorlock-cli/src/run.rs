//! Device assembly and the async control loop.

use std::time::Duration;

use anyhow::{Context, Result};
use bytes::{Bytes, BytesMut};
use doorlock_controller::DoorController;
use doorlock_core::constants::DEFAULT_STORAGE_CAPACITY;
use doorlock_hardware::{AnyActuator, LogActuator, PowerFailLatch};
use doorlock_rfid::{AnyTagReader, ChannelSource, SerialTagReader};
use doorlock_storage::FileStorage;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::{DoorConfig, OutputConfig, ReaderConfig};

/// Chunks of stdin buffered between the feed task and the reader.
const STDIN_CHANNEL_CAPACITY: usize = 32;

/// Hardware handles that must outlive the loop.
#[derive(Default)]
struct Board {
    #[cfg(feature = "hardware-spi")]
    power_sense: Option<doorlock_hardware::rpi::RpiPowerSense>,
}

pub async fn run(config: DoorConfig) -> Result<()> {
    let storage = FileStorage::open(&config.storage_path, DEFAULT_STORAGE_CAPACITY)
        .with_context(|| format!("failed to open {}", config.storage_path.display()))?;

    let latch = PowerFailLatch::new();

    let (reader, stdin_feed) = build_reader(&config.reader)?;
    let mut board = Board::default();
    let actuator = build_actuator(config.outputs.as_ref(), &latch, &mut board)?;

    let mut door = DoorController::start(
        reader,
        storage,
        actuator,
        config.authorized()?,
        latch,
        config.controller()?,
    );
    info!(
        storage = %config.storage_path.display(),
        poll_ms = config.poll_interval_ms,
        "control loop running, Ctrl-C to stop"
    );

    let mut poll = tokio::time::interval(config.poll_interval());
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut second = tokio::time::interval(Duration::from_secs(1));
    // The first tick completes immediately; a countdown second has not.
    second.tick().await;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = poll.tick() => {
                door.poll();
            }
            _ = second.tick() => {
                door.on_second_elapsed();
            }
            result = &mut ctrl_c => {
                result.context("failed to listen for Ctrl-C")?;
                info!("interrupt received, saving state before exit");
                door.power_fail();
                break;
            }
        }
    }

    if let Some(task) = stdin_feed {
        task.abort();
    }
    Ok(())
}

fn build_reader(reader: &ReaderConfig) -> Result<(AnyTagReader, Option<JoinHandle<()>>)> {
    match reader {
        ReaderConfig::Simulated => {
            let (source, tx) = ChannelSource::new(STDIN_CHANNEL_CAPACITY);
            let task = spawn_stdin_feed(tx);
            info!("simulated reader on stdin, enter tag identifiers as hex");
            Ok((AnyTagReader::Serial(SerialTagReader::new(source)), Some(task)))
        }
        #[cfg(feature = "hardware-spi")]
        ReaderConfig::Live(live) => {
            use doorlock_hardware::SystemClock;
            use doorlock_hardware::rpi::{RpiOutputPin, RpiSpi};
            use doorlock_rfid::{Mfrc522Reader, RegisterLink};

            let spi = RpiSpi::open(live.spi_bus, live.spi_clock_hz)?;
            let chip_select = RpiOutputPin::claim(live.chip_select_pin, true)?;
            let reset = RpiOutputPin::claim(live.reset_pin, true)?;
            let link = RegisterLink::new(spi, chip_select, reset, SystemClock::new())?;

            let mut reader = Mfrc522Reader::new(link);
            let version = reader.init().context("MFRC522 initialization failed")?;
            info!("live reader ready, VersionReg=0x{version:02X}");
            Ok((AnyTagReader::Live(Box::new(reader)), None))
        }
        #[cfg(not(feature = "hardware-spi"))]
        ReaderConfig::Live(_) => {
            anyhow::bail!("live reader requires a build with the hardware-spi feature")
        }
    }
}

#[cfg_attr(not(feature = "hardware-spi"), allow(unused_variables))]
fn build_actuator(
    outputs: Option<&OutputConfig>,
    latch: &PowerFailLatch,
    board: &mut Board,
) -> Result<AnyActuator> {
    let Some(outputs) = outputs else {
        info!("no lock outputs configured, lock commands are logged");
        return Ok(AnyActuator::Log(LogActuator::new()));
    };

    #[cfg(feature = "hardware-spi")]
    {
        use doorlock_hardware::PinActuator;
        use doorlock_hardware::rpi::{RpiOutputPin, RpiPowerSense};

        let lock = RpiOutputPin::claim(outputs.lock_pin, false)?;
        let led = RpiOutputPin::claim(outputs.led_pin, false)?;
        if let Some(pin) = outputs.power_sense_pin {
            let mut sense = RpiPowerSense::claim(pin)?;
            latch.attach(&mut sense)?;
            info!(pin, "power-fail input attached");
            board.power_sense = Some(sense);
        }
        Ok(AnyActuator::Gpio(PinActuator::new(lock, led)?))
    }

    #[cfg(not(feature = "hardware-spi"))]
    {
        warn!(
            lock_pin = outputs.lock_pin,
            "GPIO outputs need the hardware-spi feature, lock commands are logged"
        );
        Ok(AnyActuator::Log(LogActuator::new()))
    }
}

fn spawn_stdin_feed(tx: mpsc::Sender<Bytes>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut stdin = tokio::io::stdin();
        let mut buf = BytesMut::with_capacity(256);
        loop {
            buf.reserve(256);
            match stdin.read_buf(&mut buf).await {
                Ok(0) => {
                    debug!("stdin closed");
                    break;
                }
                Ok(_) => {
                    if tx.send(buf.split().freeze()).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "stdin read failed");
                    break;
                }
            }
        }
    })
}
