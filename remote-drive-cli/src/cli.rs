//! Argument parsing for the `service` binary, matching spec.md S6's
//! `service [-D]... [-s <baud>] <serial-device> [<root-directory>]`.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about = "Serial remote-drive host service", long_about = None)]
pub struct Cli {
    /// Increase debug verbosity; repeatable (-D, -DD, -DDD, ...).
    #[arg(short = 'D', action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Baud rate for the serial device.
    #[arg(short = 's', long = "baud", default_value_t = remote_drive_transport::DEFAULT_BAUD)]
    pub baud: u32,

    /// Path to the serial device (e.g. `/dev/ttyUSB0`).
    pub device: String,

    /// Directory exported as unit 0. Defaults to the current directory.
    pub root: Option<std::path::PathBuf>,
}

impl Cli {
    /// Maps the `-D` repeat count to an `env_logger` level filter, the
    /// same mapping the original's three-level `DPRINTF1/2/3` macros
    /// gate against (SPEC_FULL.md S3).
    pub fn log_level_filter(&self) -> log::LevelFilter {
        match self.debug {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}
