//! Human-readable error descriptions and structured JSON error formatting.

use crate::commands::ParseError;
use filament_core::{BuildError, DispenserError};
use serde_json::json;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(pe) = err.downcast_ref::<ParseError>() {
        return format!("{pe}");
    }

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::InvalidRamp { min_dc, max_dc } => format!(
                "What happened: A motor ramp starts above its end (min_dc {min_dc} > max_dc {max_dc}).\nLikely causes: Swapped values in a [motor.*] section.\nHow to fix: Set min_dc <= max_dc for the extruder, feed and load ramps."
            ),
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(de) = err.downcast_ref::<DispenserError>() {
        return match de {
            DispenserError::Timeout => "What happened: Load cell read timed out.\nLikely causes: HX711 not wired correctly, no power/ground, or timeout too low.\nHow to fix: Verify DOUT/SCK pins and power, and consider increasing hardware.sensor_read_timeout_ms in the config.".to_string(),
            DispenserError::HardwareFault(msg) => format!(
                "What happened: Hardware fault ({msg}).\nLikely causes: Motor unplugged or overheating driver, supply out of range, or a GPIO pin held by another process.\nHow to fix: Check the motor cable and the supply voltage; set motor.ignore_open_load if no motor is fitted."
            ),
            DispenserError::Hardware(_) => format!(
                "What happened: {de}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("open hx711") {
        return "What happened: Failed to initialize the load cell pins.\nLikely causes: Incorrect pin numbers or insufficient GPIO permissions.\nHow to fix: Fix the [pins] values in the config; ensure the process has permission to access GPIO.".to_string();
    }

    if lower.contains("invalid configuration") {
        let cause = err.source().map(|s| s.to_string()).unwrap_or_default();
        return format!(
            "What happened: Configuration is invalid ({cause}).\nLikely causes: A typo in the TOML or an out-of-range value.\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<ParseError>().is_some() {
        return "Command";
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return "Config";
    }
    match err.downcast_ref::<DispenserError>() {
        Some(DispenserError::Timeout) => "Timeout",
        Some(DispenserError::Hardware(_)) => "Hardware",
        Some(DispenserError::HardwareFault(_)) => "DriverFault",
        None if err.to_string().starts_with("invalid configuration") => "Config",
        None => "Error",
    }
}

/// Stable exit codes: 2 config, 3 load cell timeout, 4 hardware or driver fault, 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match reason_name(err) {
        "Config" => 2,
        "Timeout" => 3,
        "Hardware" | "DriverFault" => 4,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    json!({
        "event": "error",
        "reason": reason_name(err),
        "message": humanize(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::WrapErr;
    use rstest::rstest;

    fn wrapped(e: DispenserError) -> eyre::Report {
        Err::<(), _>(eyre::Report::new(e))
            .wrap_err("tracker begin")
            .unwrap_err()
    }

    #[rstest]
    #[case(wrapped(DispenserError::Timeout), 3, "Timeout")]
    #[case(wrapped(DispenserError::HardwareFault("open load".into())), 4, "DriverFault")]
    #[case(wrapped(DispenserError::Hardware("spi".into())), 4, "Hardware")]
    #[case(eyre::Report::new(BuildError::InvalidRamp { min_dc: 9, max_dc: 3 }), 2, "Config")]
    #[case(eyre::eyre!("boom"), 1, "Error")]
    fn maps_exit_codes(#[case] err: eyre::Report, #[case] code: i32, #[case] reason: &str) {
        assert_eq!(exit_code_for_error(&err), code);
        assert_eq!(reason_name(&err), reason);
    }

    #[test]
    fn config_errors_name_the_cause() {
        let err = Err::<(), _>(eyre::eyre!("scale.samples must be >= 1"))
            .wrap_err("invalid configuration")
            .unwrap_err();
        assert_eq!(exit_code_for_error(&err), 2);
        assert!(humanize(&err).contains("scale.samples must be >= 1"));
    }

    #[test]
    fn json_error_is_one_object() {
        let v: serde_json::Value =
            serde_json::from_str(&format_error_json(&wrapped(DispenserError::Timeout))).unwrap();
        assert_eq!(v["event"], "error");
        assert_eq!(v["reason"], "Timeout");
        assert!(v["message"].as_str().unwrap().contains("timed out"));
    }
}
