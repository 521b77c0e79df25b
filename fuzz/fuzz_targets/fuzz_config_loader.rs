#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Arbitrary TOML must either fail to parse or validate without panicking,
    // and anything that validates must build the core runtime configs.
    let Ok(cfg) = filament_config::load_toml(data) else {
        return;
    };
    if cfg.validate().is_ok() {
        let _tracker: filament_core::TrackerCfg = (&cfg).into();
        let _motor: filament_core::MotorCfg = (&cfg.motor).into();
    }
});
