#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc, clippy::float_cmp)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! `filament`: console for the filament spool dispenser.

mod cli;
mod commands;
mod console;
mod error_fmt;
mod logging;

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::console::{Console, Mode};
use clap::Parser;
use eyre::{Result, WrapErr};
use filament_core::{DispenserError, MotorCfg, MotorRamp, TrackerCfg, WeightTracker};
use filament_hardware::{LoadCellHandle, SimulatedDriver};
use filament_traits::LoadCell;
use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", error_fmt::format_error_json(&e));
        } else {
            eprintln!("{}", error_fmt::humanize(&e));
        }
        tracing::error!(error = %format!("{e:#}"), "exiting");
        std::process::exit(error_fmt::exit_code_for_error(&e));
    }
}

fn real_main(cli: Cli) -> Result<()> {
    color_eyre::install()?;

    let cfg = match &cli.config {
        Some(path) => filament_config::load_file(path).wrap_err("invalid configuration")?,
        None => filament_config::Config::default(),
    };

    logging::init_tracing(&cfg.logging, &cli.log_level, cli.json)?;
    tracing::info!(config = ?cli.config, json = cli.json, "starting");

    let (cell, handle) = open_load_cell(&cfg)?;
    match cli.cmd {
        Commands::Console { auto } => run_console(cell, handle, &cfg, cli.json, auto),
        Commands::SelfCheck => self_check(cell, &cfg, cli.json),
    }
}

#[cfg(feature = "hardware")]
fn open_load_cell(
    cfg: &filament_config::Config,
) -> Result<(filament_hardware::HardwareLoadCell, Option<LoadCellHandle>)> {
    let cell = filament_hardware::HardwareLoadCell::new(cfg.pins.hx711_dout, cfg.pins.hx711_sck)
        .wrap_err("open hx711")?;
    Ok((cell, None))
}

#[cfg(not(feature = "hardware"))]
fn open_load_cell(
    _cfg: &filament_config::Config,
) -> Result<(filament_hardware::SimulatedLoadCell, Option<LoadCellHandle>)> {
    let cell = filament_hardware::SimulatedLoadCell::new();
    let handle = cell.handle();
    Ok((cell, Some(handle)))
}

fn build<L: LoadCell>(
    cell: L,
    cfg: &filament_config::Config,
) -> Result<(WeightTracker<L>, MotorRamp<SimulatedDriver>)> {
    let tracker = WeightTracker::new(cell, TrackerCfg::from(cfg))?;
    let motor = MotorRamp::new(SimulatedDriver::new(), MotorCfg::from(&cfg.motor))?;
    Ok((tracker, motor))
}

fn run_console<L: LoadCell>(
    cell: L,
    handle: Option<LoadCellHandle>,
    cfg: &filament_config::Config,
    json: bool,
    auto: bool,
) -> Result<()> {
    let (tracker, motor) = build(cell, cfg)?;
    let stdout = std::io::stdout();
    let mut console = Console::new(tracker, motor, handle, json, stdout.lock());
    if auto {
        console.set_mode(Mode::Auto);
    }
    console.begin()?;

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed))
            .wrap_err("install Ctrl-C handler")?;
    }

    let (tx, rx) = crossbeam_channel::unbounded::<String>();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let poll = Duration::from_millis(cfg.hardware.poll_interval_ms);
    console.run(&rx, &stop, poll)
}

fn self_check<L: LoadCell>(cell: L, cfg: &filament_config::Config, json: bool) -> Result<()> {
    let (mut tracker, mut motor) = build(cell, cfg)?;
    tracker.begin()?;
    motor.begin()?;
    let weight = tracker.read_weight()?;
    let faults = motor.read_faults()?;
    if !faults.is_empty() {
        return Err(eyre::Report::new(DispenserError::HardwareFault(faults.to_string())))
            .wrap_err("self-check");
    }
    if json {
        println!(
            "{}",
            serde_json::json!({ "event": "self-check", "ok": true, "weight_g": weight })
        );
    } else {
        println!(
            "self-check ok: weight {}, {}",
            filament_ui::fmt_grams(weight),
            filament_ui::fmt_faults(faults)
        );
    }
    Ok(())
}
