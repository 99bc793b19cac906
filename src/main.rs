use clap::{Parser, Subcommand};
use serial_link::config::{ConfigLoader, SerialConfig};
use serial_link::detect::{PortDetector, UsbPortDetector};
use serial_link::link::{acquire_from_config, CancellationToken, DiagnosticSinks};
use serial_link::port::{PortError, SerialLinkPort, SystemPortOpener};
use serial_link::text::sanitize_device_text;
use serial_link::{logging, AppError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info, warn};

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "serial-link",
    version,
    about = "Find and open the serial link to a microcontroller board.",
    long_about = "Opens a serial link from a primary and alternate port (either may be \"auto\" or \"none\"), retrying while the board enumerates. Optionally mirrors all traffic to stdout/stderr for diagnostics."
)]
struct Args {
    /// Configuration file. Defaults to the standard search locations.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level or filter directive (overrides the config file).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Look for a compatible USB board and print its port.
    Detect {
        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Open the serial link using the configured candidates.
    Acquire(AcquireArgs),
    /// Persist a [serial] setting in the config file.
    Set {
        /// Setting name, e.g. "port" or "dump_serial".
        key: String,
        value: String,
    },
}

#[derive(clap::Args, Debug)]
struct AcquireArgs {
    /// Primary port: a device path, "auto" or "none".
    #[arg(long)]
    port: Option<String>,

    /// Alternate port: a device path, "auto" or "none".
    #[arg(long)]
    altport: Option<String>,

    /// Baud rate.
    #[arg(long)]
    baud: Option<u32>,

    /// Number of rounds over the candidates before giving up.
    #[arg(long)]
    rounds: Option<u32>,

    /// Mirror incoming traffic to stdout and outgoing traffic to stderr.
    #[arg(long)]
    dump_serial: bool,

    /// Keep the link open and drain incoming bytes until Ctrl+C.
    #[arg(long)]
    listen: bool,
}

impl AcquireArgs {
    fn apply(&self, serial: &mut SerialConfig) {
        if let Some(port) = &self.port {
            serial.port = Some(port.clone());
        }
        if let Some(altport) = &self.altport {
            serial.altport = Some(altport.clone());
        }
        if let Some(baud) = self.baud {
            serial.baud_rate = baud;
        }
        if let Some(rounds) = self.rounds {
            serial.max_rounds = rounds;
        }
        if self.dump_serial {
            serial.dump_serial = true;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = match &e {
                AppError::Link(link) => link.report(),
                other => other.to_string(),
            };
            eprintln!("serial-link: {message}");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(args: Args) -> Result<(), AppError> {
    let creating = matches!(args.command, Command::Set { .. });
    let mut loader = match &args.config {
        Some(path) if creating && !path.exists() => {
            let mut loader = ConfigLoader::with_defaults()?;
            loader.config_path = Some(path.clone());
            loader
        }
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    if let Some(level) = &args.log_level {
        loader.config_mut().logging.level = level.clone();
    }
    logging::init(&loader.config().logging)?;

    if let Some(path) = &loader.config_path {
        debug!(path = %path.display(), "using configuration file");
    }

    match args.command {
        Command::Detect { json } => detect(json).await,
        Command::Acquire(acquire_args) => {
            let mut serial = loader.config().serial.clone();
            acquire_args.apply(&mut serial);
            acquire(serial, acquire_args.listen).await
        }
        Command::Set { key, value } => {
            loader.set_serial_value(&key, &value)?;
            info!(%key, %value, "setting saved");
            Ok(())
        }
    }
}

async fn detect(json: bool) -> Result<(), AppError> {
    let found = tokio::task::spawn_blocking(|| UsbPortDetector::new().detect()).await??;

    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
        return Ok(());
    }

    match found {
        Some(port) => println!(
            "{} ({})",
            port.port_name,
            port.device_type.as_deref().unwrap_or("unknown device")
        ),
        None => println!("No compatible serial device found"),
    }
    Ok(())
}

async fn acquire(serial: SerialConfig, listen: bool) -> Result<(), AppError> {
    let cancel = CancellationToken::new();
    let watcher = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let task_cancel = cancel.clone();
    let result = tokio::task::spawn_blocking(move || -> Result<(), AppError> {
        let mut link = acquire_from_config(
            &serial,
            SystemPortOpener,
            UsbPortDetector::new(),
            task_cancel.clone(),
            DiagnosticSinks::stdio,
        )?;
        info!(port = %link.name(), dump = serial.dump_serial, "serial link ready");

        if listen {
            drain(&mut link, &task_cancel)?;
        }
        Ok(())
    })
    .await;

    watcher.abort();
    result?
}

/// Read until cancelled. With dumping enabled the tee shows the traffic.
fn drain(link: &mut dyn SerialLinkPort, cancel: &CancellationToken) -> Result<(), PortError> {
    let mut buf = [0u8; 256];
    let mut total = 0usize;

    while !cancel.is_cancelled() {
        match link.read_bytes(&mut buf) {
            Ok(n) => {
                total += n;
                debug!(text = %sanitize_device_text(&buf[..n]), "received");
            }
            Err(PortError::Timeout(_)) => continue,
            Err(e) => return Err(e),
        }
    }

    info!(bytes = total, "stopped listening");
    Ok(())
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("interrupt received, stopping");
        cancel.cancel();
    }
}
