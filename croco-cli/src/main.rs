//! croco CLI
//!
//! Manage ROMs and savegames on a Croco Cartridge from the command line.

mod commands;
mod device;
mod error;
mod progress;

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub(crate) use error::CliError;

#[derive(Parser)]
#[command(name = "croco")]
#[command(about = "Manage ROMs and savegames on a Croco Cartridge", long_about = None)]
struct Cli {
    #[command(flatten)]
    device: DeviceArgs,

    /// Show debug output (repeat for per-frame tracing)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// How to reach the cartridge.
#[derive(clap::Args, Clone, Debug)]
pub(crate) struct DeviceArgs {
    /// Serial device of the cartridge (defaults to the saved port)
    #[arg(short, long, global = true)]
    port: Option<PathBuf>,

    /// Give up on a read or write after this many milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a ROM image without a device
    Analyze {
        /// ROM image to inspect
        rom: PathBuf,
    },

    /// Show firmware, serial number and storage usage
    Info,

    /// List the ROMs stored on the cartridge
    List,

    /// Upload a ROM image
    Upload {
        /// ROM image to upload
        rom: PathBuf,

        /// Name for the slot (defaults to the header title)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Delete the ROM in a slot
    Delete {
        /// Slot index as shown by `croco list`
        slot: u8,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Download or upload savegames
    Save {
        #[command(subcommand)]
        action: SaveAction,
    },

    /// Inspect RTC data in savegame files
    Rtc {
        #[command(subcommand)]
        action: RtcAction,
    },

    /// Manage the settings file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum SaveAction {
    /// Download a slot's save RAM (and RTC) to a file
    Download {
        slot: u8,

        /// Output file (defaults to "<ROM name>.sav")
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Overwrite a slot's save RAM from a file
    Upload {
        slot: u8,

        file: PathBuf,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum RtcAction {
    /// Decode the RTC record at the end of a save file
    Show { file: PathBuf },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the current settings
    Show,

    /// Print the settings file path
    Path,

    /// Remember the serial device of the cartridge
    SetPort { port: PathBuf },

    /// Forget the saved serial device
    ClearPort,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let device = cli.device;
    match cli.command {
        Commands::Analyze { rom } => commands::analyze::run_analyze(&rom),
        Commands::Info => commands::device::run_info(&device),
        Commands::List => commands::device::run_list(&device),
        Commands::Upload { rom, name } => commands::rom::run_upload(&device, &rom, name),
        Commands::Delete { slot, yes } => commands::rom::run_delete(&device, slot, yes),
        Commands::Save { action } => match action {
            SaveAction::Download { slot, output } => {
                commands::save::run_download(&device, slot, output)
            }
            SaveAction::Upload { slot, file, yes } => {
                commands::save::run_upload(&device, slot, &file, yes)
            }
        },
        Commands::Rtc { action } => match action {
            RtcAction::Show { file } => commands::rtc::run_rtc_show(&file),
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::run_config_show(),
            ConfigAction::Path => commands::config::run_config_path(),
            ConfigAction::SetPort { port } => commands::config::run_set_port(port),
            ConfigAction::ClearPort => commands::config::run_clear_port(),
        },
    }
}

/// User-facing output goes through `log::info!`; warnings and errors get a
/// colored level prefix.
fn init_logging(verbose: u8) {
    use owo_colors::OwoColorize;
    use owo_colors::Stream::Stdout;

    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Stdout)
        .format(|buf, record| match record.level() {
            log::Level::Info => writeln!(buf, "{}", record.args()),
            log::Level::Warn => writeln!(
                buf,
                "{} {}",
                "warning:".if_supports_color(Stdout, |t| t.yellow()),
                record.args()
            ),
            log::Level::Error => writeln!(
                buf,
                "{} {}",
                "error:".if_supports_color(Stdout, |t| t.red()),
                record.args()
            ),
            level => writeln!(
                buf,
                "{} [{}] {}",
                level.as_str().to_lowercase(),
                record.target(),
                record.args()
            ),
        })
        .init();
}

pub(crate) fn log_blank() {
    log::info!("");
}

/// Ask a yes/no question on stdin. Anything but "y"/"yes" is a no.
pub(crate) fn confirm(question: &str) -> Result<bool, CliError> {
    print!("{} [y/N] ", question);
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}
