use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{presets::UTF8_FULL, Table};
use tracing_subscriber::EnvFilter;

use skywallet::messages::builders;
use skywallet::{ButtonPressKind, Device, DeviceType, EngineConfig, MessageKind};

#[derive(Parser)]
#[command(name = "skywallet-cli", version, about = "Talk to a Skywallet hardware wallet")]
struct Cli {
    /// JSON engine configuration; defaults are used for missing fields
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides the configured device type
    #[arg(long, global = true, value_enum)]
    device_type: Option<DeviceTypeArg>,

    /// Emulator only: press this button after every confirmation request
    #[arg(long, global = true, value_enum)]
    auto_press: Option<ButtonArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum DeviceTypeArg {
    Usb,
    Emulator,
}

#[derive(Clone, Copy, ValueEnum)]
enum ButtonArg {
    Left,
    Right,
    Both,
}

#[derive(Subcommand)]
enum Command {
    /// List attached devices
    List,
    /// Print the device features
    Features,
    /// Check that the device answers on its connection
    Ping,
    /// Save device entropy to a file, or `-` for stdout
    Entropy {
        #[arg(long, default_value_t = 1024)]
        bytes: u32,
        #[arg(long, short)]
        out: String,
    },
    /// Flash a firmware image (USB only)
    Firmware { file: PathBuf },
    /// Wipe the device
    Wipe,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(device_type) = cli.device_type {
        config.device_type = match device_type {
            DeviceTypeArg::Usb => DeviceType::Usb,
            DeviceTypeArg::Emulator => DeviceType::Emulator,
        };
    }

    let mut device = Device::with_config(config).context("failed to create device")?;
    if let Some(button) = cli.auto_press {
        let kind = match button {
            ButtonArg::Left => ButtonPressKind::Left,
            ButtonArg::Right => ButtonPressKind::Right,
            ButtonArg::Both => ButtonPressKind::Both,
        };
        device.set_auto_press_button(true, kind)?;
    }

    let result = run(&mut device, cli.command);
    device.close();
    result
}

fn run(device: &mut Device, command: Command) -> Result<()> {
    match command {
        Command::List => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(["Id", "Name", "VID", "PID", "Serial"]);
            for info in device.usb_info()? {
                table.add_row([
                    info.unique_id,
                    info.name,
                    format!("{:04x}", info.vid),
                    format!("{:04x}", info.pid),
                    info.serial_number.unwrap_or_else(|| "<unknown>".to_string()),
                ]);
            }
            println!("{table}");
        }
        Command::Features => {
            let features = device.features()?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "vendor": features.vendor,
                    "version": format!(
                        "{}.{}.{}",
                        features.major_version.unwrap_or_default(),
                        features.minor_version.unwrap_or_default(),
                        features.patch_version.unwrap_or_default()
                    ),
                    "deviceId": features.device_id,
                    "label": features.label,
                    "initialized": features.initialized,
                    "bootloaderMode": features.bootloader_mode,
                    "pinProtection": features.pin_protection,
                    "passphraseProtection": features.passphrase_protection,
                    "needsBackup": features.needs_backup,
                    "model": features.model,
                }))?
            );
        }
        Command::Ping => {
            device.connect()?;
            let alive = device.connected();
            device.disconnect()?;
            if !alive {
                bail!("device did not answer the ping");
            }
            println!("device is connected");
        }
        Command::Entropy { bytes, out } => {
            device.save_device_entropy(&out, bytes, builders::get_entropy)?;
            if out != "-" {
                println!("saved {bytes} bytes of entropy to {out}");
            }
        }
        Command::Firmware { file } => {
            let payload =
                fs::read(&file).with_context(|| format!("failed to read {}", file.display()))?;
            device.firmware_update(&payload)?;
            println!("firmware updated");
        }
        Command::Wipe => {
            let reply = device.wipe()?.into_result()?;
            if !reply.is(MessageKind::Success) {
                bail!("unexpected answer to wipe: {}", reply.kind());
            }
            println!("device wiped");
        }
    }
    Ok(())
}
