//! `service`: the host-side binary that speaks the `ZZX` frame protocol
//! over a real serial device (spec.md S6).
//!
//! Ported from `remoteserv.c`'s `main`/`remote_serv` loop: open the
//! port, then repeatedly receive a request frame, dispatch it against
//! the exported root, and send back whatever response (if any) the
//! dispatch produced.

mod cli;

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use remote_drive::transport::{FrameChannel, MAX_PAYLOAD, SerialTransport};
use remote_drive::{ServiceConfig, ServiceSession, StdFs};

use cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level_filter())
        .init();

    if !remote_drive_transport::BAUD_RATES.contains(&cli.baud) {
        log::error!(
            "unsupported baud rate {} (recognized: {:?})",
            cli.baud,
            remote_drive_transport::BAUD_RATES
        );
        return ExitCode::FAILURE;
    }

    let root = cli.root.unwrap_or_else(|| std::path::PathBuf::from("."));
    log::info!("exporting {} as unit 0", root.display());

    let port = match SerialTransport::open(&cli.device, cli.baud, Duration::from_secs(5)) {
        Ok(port) => port,
        Err(e) => {
            log::error!("failed to open {}: {e}", cli.device);
            return ExitCode::FAILURE;
        }
    };

    let shutdown = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            shutdown.store(true, std::sync::atomic::Ordering::SeqCst);
        }) {
            log::warn!("failed to install Ctrl-C handler: {e}");
        }
    }

    let config = ServiceConfig::new(vec![root]);
    let mut session = ServiceSession::new(config, StdFs);
    let mut chan = FrameChannel::new(port);
    let mut buf = [0u8; MAX_PAYLOAD];

    while !shutdown.load(std::sync::atomic::Ordering::SeqCst) {
        let payload = match chan.recv(&mut buf) {
            Ok(payload) => payload,
            Err(e) => {
                log::debug!("frame receive error: {e}");
                continue;
            }
        };
        if let Some(response) = session.dispatch(payload) {
            if let Err(e) = chan.send(&response) {
                log::warn!("frame send error: {e}");
            }
        }
    }

    log::info!("shutting down");
    ExitCode::SUCCESS
}
