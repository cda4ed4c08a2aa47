//! Devices command implementation

use anyhow::Result;
use std::path::PathBuf;

#[cfg(all(feature = "hardware-evdev", target_os = "linux"))]
pub fn execute(config_path: PathBuf) -> Result<()> {
    let config = super::load_config(&config_path, None)?;
    let devices = cardrelay_hardware::list_input_devices();

    println!("\nInput Devices");
    println!("{}", "=".repeat(60));

    if devices.is_empty() {
        println!("No input devices found (is /dev/input readable?)");
        return Ok(());
    }

    for device in &devices {
        let marker = if config.allowed_devices.is_allowed(&device.name) {
            "allowed"
        } else {
            "-"
        };
        let ids = match (device.vendor_id, device.product_id) {
            (Some(vendor), Some(product)) => format!("{vendor:04x}:{product:04x}"),
            _ => "----:----".to_string(),
        };
        println!(
            "  {:<8} {}  {:<24} {}",
            marker,
            ids,
            device.path.display(),
            device.name
        );
    }

    let allowed = devices
        .iter()
        .filter(|d| config.allowed_devices.is_allowed(&d.name))
        .count();
    println!("\n{} of {} device(s) on the allow-list", allowed, devices.len());

    Ok(())
}

#[cfg(not(all(feature = "hardware-evdev", target_os = "linux")))]
pub fn execute(_config_path: PathBuf) -> Result<()> {
    anyhow::bail!("Built without an input backend; enable `hardware-evdev` on Linux")
}
