//! File-system content types for the `remote-drive` protocol: attribute
//! bitmask, directory-entry record, disk-free reply shape, and the
//! Human68k DOS error-code table.

pub mod attr;
pub mod diskfree;
pub mod dostime;
pub mod errcode;
pub mod fileinfo;

pub use attr::FileAttr;
pub use diskfree::DiskFree;
pub use errcode::{ErrnoContext, HumanError, from_io_error};
pub use fileinfo::FileInfo;
