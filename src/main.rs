mod cli;
mod ec;
mod errors;
mod fan;

use std::fs;
use std::fs::File;
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

use cli::{Cli, Commands};
use ec::sim::SimulatedGateway;
use ec::{EcController, PortGateway};
use fan::FanConfig;

type Controller = EcController<Box<dyn PortGateway>>;

fn level_from_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log to ecfanctl.log next to the executable.
    let log_path = std::env::current_exe()
        .unwrap_or_default()
        .parent()
        .unwrap_or(Path::new("."))
        .join("ecfanctl.log");
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let log_level = level_from_verbosity(cli.verbose);
    if let Ok(file) = File::create(&log_path) {
        let _ = WriteLogger::init(log_level, log_config, file);
    }
    info!(
        "ecfanctl started (log level: {}, simulate: {})",
        log_level, cli.simulate
    );

    let mut controller = open_controller(cli.simulate)?;

    match cli.command {
        Commands::Status => cmd_status(&mut controller),
        Commands::Tables => cmd_tables(&mut controller),
        Commands::Info => cmd_info(&mut controller),
        Commands::Export { path } => cmd_export(&mut controller, &path),
        Commands::Apply {
            path,
            verify,
            raw_duty,
        } => cmd_apply(&mut controller, &path, verify, raw_duty),
        Commands::Monitor { interval } => cmd_monitor(&mut controller, interval),
    }
}

/// Build a controller over the hardware gateway, or over the simulator
/// when requested, and bring it up.
fn open_controller(simulate: bool) -> Result<Controller> {
    let gateway: Box<dyn PortGateway> = if simulate {
        Box::new(SimulatedGateway::preset())
    } else {
        ec::create_gateway()?
    };

    let mut controller = EcController::new(gateway);
    controller
        .initialize()
        .context("failed to initialize the EC controller")?;
    Ok(controller)
}

fn cmd_status(controller: &mut Controller) -> Result<()> {
    let status = controller.read_status()?;

    println!(
        "{:<6} {:>8} {:>6} {:>12} {:>12}",
        "FAN", "RPM", "DUTY", "TARGET DUTY", "CURVE VALUE"
    );
    println!("{}", "-".repeat(50));
    println!(
        "{:<6} {:>8} {:>5}% {:>12} {:>12}",
        "fan1",
        status.fan1_speed,
        status.fan1_percent,
        status.fan1_target_duty,
        status.fan1_target_curve_val
    );
    println!(
        "{:<6} {:>8} {:>5}% {:>12} {:>12}",
        "fan2",
        status.fan2_speed,
        status.fan2_percent,
        status.fan2_target_duty,
        status.fan2_target_curve_val
    );
    println!("\nActive curve point: {}", status.fan_cur_point);
    Ok(())
}

fn cmd_tables(controller: &mut Controller) -> Result<()> {
    let status = controller.read_status()?;

    for (name, table) in status.to_config().tables() {
        let cells: Vec<String> = table.iter().map(|value| format!("{value:>3}")).collect();
        println!("{:<16} {}", name, cells.join(" "));
    }
    Ok(())
}

fn cmd_info(controller: &mut Controller) -> Result<()> {
    let status = controller.read_status()?;

    println!(
        "EC chip id:       {:#04X} {:#04X}",
        status.chip_id1, status.chip_id2
    );
    println!("EC chip version:  {:#04X}", status.chip_ver);
    println!("Firmware version: {:#04X}", status.fw_ver);
    Ok(())
}

fn cmd_export(controller: &mut Controller, path: &Path) -> Result<()> {
    let status = controller.read_status()?;
    let config = status.to_config();

    let json = serde_json::to_string_pretty(&config)?;
    fs::write(path, json)
        .with_context(|| format!("failed to write config to {}", path.display()))?;

    println!("Exported EC tables to {}", path.display());
    Ok(())
}

fn cmd_apply(controller: &mut Controller, path: &Path, verify: bool, raw_duty: bool) -> Result<()> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read config from {}", path.display()))?;
    let config: FanConfig = serde_json::from_str(&json)
        .with_context(|| format!("failed to parse config from {}", path.display()))?;

    controller.set_raw_duty_write(raw_duty);
    controller.write_config(&config)?;

    if !controller.last_error().is_empty() {
        println!("Warning: {}", controller.last_error());
    }
    println!("Applied config from {}", path.display());

    if verify {
        // Advisory read-back: the EC does not acknowledge writes, so the
        // only check available is comparing what we read against what we
        // wrote.
        let readback = controller.read_status()?.to_config();

        let mut mismatches = 0;
        for ((name, wanted), (_, actual)) in config.tables().iter().zip(readback.tables()) {
            if *wanted != actual {
                mismatches += 1;
                println!("Verify mismatch in {name}:");
                println!("  wrote: {wanted:?}");
                println!("  read:  {actual:?}");
            }
        }

        if mismatches > 0 {
            bail!("verification failed for {mismatches} table(s)");
        }
        println!("Verified: all tables read back as written.");
    }

    Ok(())
}

fn cmd_monitor(controller: &mut Controller, interval_secs: u64) -> Result<()> {
    println!("Monitoring fans (Ctrl+C to stop)...\n");
    while controller.is_initialized() {
        // Clear screen with ANSI escape
        print!("\x1B[2J\x1B[H");
        println!("Fan Monitor (every {}s) — Ctrl+C to stop\n", interval_secs);

        let status = controller.read_status()?;
        println!("{:<6} {:>8} {:>6}", "FAN", "RPM", "DUTY");
        println!("{}", "-".repeat(24));
        println!(
            "{:<6} {:>8} {:>5}%",
            "fan1", status.fan1_speed, status.fan1_percent
        );
        println!(
            "{:<6} {:>8} {:>5}%",
            "fan2", status.fan2_speed, status.fan2_percent
        );
        println!("\nActive curve point: {}", status.fan_cur_point);

        thread::sleep(Duration::from_secs(interval_secs));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn exported_json_parses_back_into_a_config() {
        let mut controller = open_controller(true).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curves.json");

        cmd_export(&mut controller, &path).unwrap();

        let json = fs::read_to_string(&path).unwrap();
        let config: FanConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.fan1_curve.len(), fan::CURVE_POINTS);
        assert_eq!(config.fan1_curve, vec![0, 10, 20, 30, 40, 55, 70, 85, 95, 100]);
    }

    #[test]
    fn apply_round_trips_through_the_simulated_ec() {
        let mut controller = open_controller(true).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curves.json");

        let mut config = FanConfig::default();
        config.fan1_curve = vec![0, 12, 24, 36, 48, 60, 72, 84, 96, 100];
        let mut file = File::create(&path).unwrap();
        file.write_all(serde_json::to_string(&config).unwrap().as_bytes())
            .unwrap();

        cmd_apply(&mut controller, &path, true, false).unwrap();

        let status = controller.read_status().unwrap();
        assert_eq!(status.fan1_curve, config.fan1_curve);
    }

    #[test]
    fn apply_rejects_malformed_config_files() {
        let mut controller = open_controller(true).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(cmd_apply(&mut controller, &path, false, false).is_err());
    }
}
