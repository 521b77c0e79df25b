//! Console command parser.
//!
//! One command per line, case-insensitive except for the material names
//! which are also accepted in upper case.

use filament_core::{Material, RollSize, Units};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Re-tare, keep the mounted spool.
    Reset,
    /// Re-tare with the default spool.
    Default,
    Load,
    Run,
    Auto,
    Manual,
    Material(Material),
    Roll(RollSize),
    Units(Units),
    Feed,
    Pull,
    Stop,
    FeedContinuous,
    PullContinuous,
    /// Advance calibration; the value is the reference weight for phase 3.
    Calibrate(Option<f32>),
    /// A bare number: reference weight during calibration, otherwise a
    /// diameter (1.75 or 3.00).
    Number(f32),
    Config,
    Status,
    Dump,
    Weight,
    Faults,
    /// Put weight on the simulated scale.
    Sim(f32),
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}` (try `help`)")]
    Unknown(String),
    #[error("`{cmd}` expects a number, got `{arg}`")]
    BadNumber { cmd: &'static str, arg: String },
    #[error("`{0}` expects a value")]
    MissingArg(&'static str),
}

fn number(cmd: &'static str, arg: &str) -> Result<f32, ParseError> {
    arg.parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::BadNumber {
            cmd,
            arg: arg.to_string(),
        })
}

pub fn parse(line: &str) -> Result<Command, ParseError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err(ParseError::Empty);
    };
    let arg = words.next();
    let cmd = match head.to_ascii_lowercase().as_str() {
        "reset" => Command::Reset,
        "default" => Command::Default,
        "load" => Command::Load,
        "run" => Command::Run,
        "auto" => Command::Auto,
        "manual" => Command::Manual,
        "pla" => Command::Material(Material::Pla),
        "abs" => Command::Material(Material::Abs),
        "1kg" => Command::Roll(RollSize::OneKg),
        "2kg" => Command::Roll(RollSize::TwoKg),
        "gr" => Command::Units(Units::Grams),
        "cm" => Command::Units(Units::Length),
        "feed" => Command::Feed,
        "pull" => Command::Pull,
        "stop" => Command::Stop,
        "feedcont" => Command::FeedContinuous,
        "pullcont" => Command::PullContinuous,
        "calibrate" => Command::Calibrate(arg.map(|a| number("calibrate", a)).transpose()?),
        "config" => Command::Config,
        "status" => Command::Status,
        "dump" => Command::Dump,
        "weight" => Command::Weight,
        "faults" => Command::Faults,
        "sim" => Command::Sim(number("sim", arg.ok_or(ParseError::MissingArg("sim"))?)?),
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => match other.parse::<f32>() {
            Ok(v) if v.is_finite() => Command::Number(v),
            _ => return Err(ParseError::Unknown(head.to_string())),
        },
    };
    Ok(cmd)
}

pub const HELP: &str = "\
status machine: reset | load | run | default
mode:           auto | manual
spool:          PLA | ABS | 1.75 | 3.00 | 1kg | 2kg
units:          gr | cm
motor:          feed | pull | stop | feedcont | pullcont | faults
calibration:    calibrate, calibrate, <grams> (or `calibrate <grams>`)
queries:        config | status | dump | weight
simulation:     sim <grams>
                quit";
