//! Build script for kibble-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Parses and validates feeder.toml, then generates the constructor
//!   the firmware boots with

use std::env;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use kibble_core::config::{ConfigError, FeederConfig};

fn main() {
    setup_linker();
    generate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Parse feeder.toml and emit `feeder_config()` into OUT_DIR
fn generate_config() {
    println!("cargo:rerun-if-changed=feeder.toml");

    let config_path = Path::new("feeder.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: feeder.toml not found!                                   ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a feeder.toml configuration file.         ║\n\
            ║  Please create one in the kibble-firmware directory.             ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read feeder.toml                               ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: FeederConfig = match toml::from_str(&config_content) {
        Ok(config) => config,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid feeder.toml                                      ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    if let Err(e) = config.validate() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid value in feeder.toml                             ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            format_error_lines(&describe(e))
        );
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    fs::write(out_dir.join("feeder_config.rs"), render(&config)).unwrap();

    println!("cargo:warning=feeder.toml validated successfully");
}

/// Human-readable validation failure
fn describe(e: ConfigError) -> String {
    match e {
        ConfigError::InvalidAddress(a) => {
            format!("rtc_address 0x{:02X} is reserved or not 7-bit", a)
        }
        ConfigError::InvalidBusFrequency => {
            "bus.frequency_hz must be non-zero and at most cpu_frequency_hz / 16".into()
        }
        ConfigError::InvalidThresholds => {
            "thresholds.low_to_medium must be below medium_to_high".into()
        }
        ConfigError::InvalidPortion => "every portion needs at least one step".into(),
        ConfigError::InvalidPulseWidth => "step_pulse_us must be non-zero".into(),
        ConfigError::InvalidFeedTime(i) => format!("feed_times[{}] is not a time of day", i),
        ConfigError::TooManyFeedTimes => "too many feed_times".into(),
        ConfigError::InvalidBaudrate => "report_baudrate must be non-zero".into(),
        ConfigError::InvalidPollInterval => "schedule_poll_secs must be non-zero".into(),
    }
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the configuration as Rust source
///
/// Enum values are written through their `Debug` names, which match the
/// variant identifiers.
fn render(c: &FeederConfig) -> String {
    let mut times = String::new();
    for t in &c.feed_times {
        let _ = write!(
            times,
            "TimeOfDay::new({}, {}, {}), ",
            t.hours, t.minutes, t.seconds
        );
    }

    format!(
        "// Generated from feeder.toml\n\
        pub fn feeder_config() -> FeederConfig {{\n\
        \x20   let mut config = FeederConfig {{\n\
        \x20       rtc_address: {rtc_address},\n\
        \x20       bus: BusSettings {{ frequency_hz: {freq}, cpu_frequency_hz: {cpu}, wait_spins: {spins} }},\n\
        \x20       sample_mode: SampleMode::{sample_mode:?},\n\
        \x20       thresholds: FeedThresholds {{ low_to_medium: {ltm}, medium_to_high: {mth} }},\n\
        \x20       portions: Portions {{ low: {low}, medium: {medium}, high: {high} }},\n\
        \x20       step_pulse_us: {pulse},\n\
        \x20       feed_times: heapless::Vec::new(),\n\
        \x20       square_wave: SquareWave {{\n\
        \x20           enable: SquareWaveEnable::{enable:?},\n\
        \x20           level: OutputLevel::{level:?},\n\
        \x20           frequency: SquareWaveFrequency::{frequency:?},\n\
        \x20       }},\n\
        \x20       report_baudrate: {baud},\n\
        \x20       schedule_poll_secs: {poll},\n\
        \x20   }};\n\
        \x20   // Count checked against the schedule capacity at build time\n\
        \x20   let _ = config.set_feed_times(&[{times}]);\n\
        \x20   config\n\
        }}\n",
        rtc_address = c.rtc_address,
        freq = c.bus.frequency_hz,
        cpu = c.bus.cpu_frequency_hz,
        spins = c.bus.wait_spins,
        sample_mode = c.sample_mode,
        ltm = c.thresholds.low_to_medium,
        mth = c.thresholds.medium_to_high,
        low = c.portions.low,
        medium = c.portions.medium,
        high = c.portions.high,
        pulse = c.step_pulse_us,
        enable = c.square_wave.enable,
        level = c.square_wave.level,
        frequency = c.square_wave.frequency,
        baud = c.report_baudrate,
        poll = c.schedule_poll_secs,
        times = times,
    )
}
