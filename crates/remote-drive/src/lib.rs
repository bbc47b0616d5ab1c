//! Host-side service and driver logic for the X68000 serial remote-drive
//! protocol.
//!
//! `driver` implements the client-OS-facing dispatcher (spec.md S4.3)
//! together with its two caches; `service` implements the host-facing
//! dispatcher (spec.md S4.4-S4.9) together with its handle tables and
//! path/pattern translation. `config` packs up the per-endpoint state
//! (timeout, cache sizing, exported roots) spec.md S9 asks a
//! re-architecture to thread explicitly instead of leaving at module
//! scope; `error` is the aggregate error/status type both dispatchers
//! propagate through.

#![forbid(unsafe_code)]

pub mod config;
pub mod driver;
pub mod error;
pub mod service;

pub use config::{DriverConfig, NoSuchUnit, RegisterMode, ServiceConfig};
pub use driver::{Driver, FileCursor, SeekWhence};
pub use error::{DriverError, Result, Status};
pub use service::ServiceSession;
pub use service::fsadapter::{FileSystem, StdFs};

pub use remote_drive_transport as transport;
