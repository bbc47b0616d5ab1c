//! `sim`: pairs an in-process driver session with an in-process service
//! session over the in-memory pipe transport, exercising a scripted
//! sequence of operations against a real directory without needing a
//! serial port or X68000 hardware.
//!
//! Grounded in `remote-drive-transport::pipe`'s `pipe_pair`, built for
//! exactly this kind of manual smoke test (SPEC_FULL.md's workspace
//! layout note on `remote-drive-cli`).

use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use clap::Parser;
use remote_drive::transport::{FrameChannel, MAX_PAYLOAD, pipe_pair};
use remote_drive::{Driver, DriverConfig, SeekWhence, ServiceConfig, ServiceSession, StdFs};
use remote_drive_dtyp::binrw_util::prelude::FixedBytes;
use remote_drive_msg::NameBuf;

#[derive(Parser, Debug)]
#[command(about = "Smoke-tests the protocol against a real directory, no hardware required")]
struct Cli {
    #[arg(short = 'D', action = clap::ArgAction::Count)]
    debug: u8,

    /// Directory exported as unit 0. Defaults to the current directory.
    root: Option<PathBuf>,
}

/// A [`NameBuf`] naming `name`.`ext` at the exported root (no
/// subdirectory path).
fn root_file(name: &[u8], ext: &[u8]) -> NameBuf {
    let mut path = [0u8; 65];
    path[0] = 0x09;
    let mut name1 = [b' '; 8];
    name1[..name.len()].copy_from_slice(name);
    NameBuf {
        flag: 0,
        drive: 0,
        path: FixedBytes(path),
        name1: FixedBytes(name1),
        ext: FixedBytes::from(ext),
        name2: FixedBytes::default(),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(match cli.debug {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        })
        .init();

    let root = cli.root.unwrap_or_else(|| PathBuf::from("."));
    log::info!("simulating against {}", root.display());

    let (client_end, service_end) = pipe_pair(Duration::from_secs(5));
    let config = ServiceConfig::new(vec![root]);

    let service_thread = thread::spawn(move || {
        let mut chan = FrameChannel::new(service_end);
        let mut session = ServiceSession::new(config, StdFs);
        let mut buf = [0u8; MAX_PAYLOAD];
        loop {
            let payload = match chan.recv(&mut buf) {
                Ok(payload) => payload,
                Err(e) => {
                    log::debug!("service side stopping: {e}");
                    break;
                }
            };
            if let Some(response) = session.dispatch(payload) {
                if let Err(e) = chan.send(&response) {
                    log::debug!("service send failed: {e}");
                    break;
                }
            }
        }
    });

    // `run_script` owns the driver (and with it `client_end`); once it
    // returns and drops the driver, the pipe disconnects and the
    // service thread's receive loop ends on its own.
    let result = run_script(client_end);
    let _ = service_thread.join();

    match result {
        Ok(()) => {
            log::info!("simulation completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("simulation failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_script(client_end: remote_drive::transport::PipeEnd) -> remote_drive::Result<()> {
    let mut driver = Driver::new(client_end, &DriverConfig::default());

    const FCB: u32 = 1;
    let path = root_file(b"SIM", b"TXT");

    let mut cursor = driver.create(path, 0, FCB)?;
    let written = driver.write(FCB, &mut cursor, b"hello from the simulator")?;
    log::info!("wrote {written} bytes");
    driver.seek(FCB, &mut cursor, SeekWhence::Start, 0)?;

    let mut readback = vec![0u8; 64];
    let n = driver.read(FCB, &mut cursor, &mut readback)?;
    log::info!("read back {n} bytes: {:?}", String::from_utf8_lossy(&readback[..n]));
    driver.close(FCB)?;

    let free = driver.dskfre(0)?;
    log::info!("free clusters reported: {}", free.free_clusters);

    Ok(())
}
