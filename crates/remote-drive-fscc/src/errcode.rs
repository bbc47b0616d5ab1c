//! Human68k DOS error codes and the errno -> Human68k mapping.
//!
//! Codes are taken verbatim from `_DOSE_*` in `x68kremote.h`. The mapping
//! function mirrors `conv_errno` in the original service, including its
//! commented-out per-call overrides, which are exposed here as explicit
//! parameters rather than left as dead code in a `switch`.

use std::io;

/// A Human68k DOS error code, always negative, sent on the wire as a
/// signed byte or (for read/write/seek) a signed 16/32-bit integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum HumanError {
    IllegalFunction = -1,
    NoEntry = -2,
    NoDir = -3,
    TooManyOpenFiles = -4,
    IsDirectory = -5,
    BadFileNumber = -6,
    BrokenMemory = -7,
    NoMemory = -8,
    IllegalMemoryPointer = -9,
    IllegalEnvironment = -10,
    IllegalFormat = -11,
    IllegalArgument = -12,
    IllegalFileName = -13,
    IllegalParameter = -14,
    IllegalDrive = -15,
    IsCurrentDirectory = -16,
    CantIoctl = -17,
    NoMore = -18,
    ReadOnly = -19,
    ExistDir = -20,
    NotEmpty = -21,
    CantRename = -22,
    DiskFull = -23,
    DirFull = -24,
    CantSeek = -25,
    SuperVisorMode = -26,
    DuplicateThreadName = -27,
    CantSend = -28,
    ThreadFull = -29,
    LockFull = -32,
    LockError = -33,
    BusyDrive = -34,
    SymlinkLoop = -35,
    ExistFile = -80,
}

impl HumanError {
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Recovers a `HumanError` from a negative wire result code, the
    /// inverse of [`HumanError::code`] - used on the driver side to turn a
    /// response's `res` field back into a typed error.
    pub const fn from_code(code: i32) -> Option<Self> {
        use HumanError::*;
        Some(match code {
            -1 => IllegalFunction,
            -2 => NoEntry,
            -3 => NoDir,
            -4 => TooManyOpenFiles,
            -5 => IsDirectory,
            -6 => BadFileNumber,
            -7 => BrokenMemory,
            -8 => NoMemory,
            -9 => IllegalMemoryPointer,
            -10 => IllegalEnvironment,
            -11 => IllegalFormat,
            -12 => IllegalArgument,
            -13 => IllegalFileName,
            -14 => IllegalParameter,
            -15 => IllegalDrive,
            -16 => IsCurrentDirectory,
            -17 => CantIoctl,
            -18 => NoMore,
            -19 => ReadOnly,
            -20 => ExistDir,
            -21 => NotEmpty,
            -22 => CantRename,
            -23 => DiskFull,
            -24 => DirFull,
            -25 => CantSeek,
            -26 => SuperVisorMode,
            -27 => DuplicateThreadName,
            -28 => CantSend,
            -29 => ThreadFull,
            -32 => LockFull,
            -33 => LockError,
            -34 => BusyDrive,
            -35 => SymlinkLoop,
            -80 => ExistFile,
            _ => return None,
        })
    }
}

/// What the caller is about to do, so [`from_io_error`] can apply the
/// same per-operation `errno` overrides `conv_errno`'s callers did inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrnoContext {
    Mkdir,
    Rmdir,
    Rename,
    Create,
    Open,
    Generic,
}

/// Maps a host I/O error to a Human68k error code, per `conv_errno` plus
/// the per-call overrides `op_mkdir`/`op_rmdir`/`op_rename`/`op_create`/
/// `op_open` apply inline in the original before falling back to it.
pub fn from_io_error(err: &io::Error, ctx: ErrnoContext) -> HumanError {
    use io::ErrorKind::*;

    if let Some(raw) = err.raw_os_error() {
        match ctx {
            ErrnoContext::Mkdir if raw == EEXIST_RAW => return HumanError::ExistDir,
            ErrnoContext::Rmdir if raw == EINVAL_RAW => return HumanError::IsCurrentDirectory,
            ErrnoContext::Rename if raw == ENOTEMPTY_RAW => return HumanError::CantRename,
            ErrnoContext::Create | ErrnoContext::Open if raw == ENOSPC_RAW => {
                return HumanError::DirFull;
            }
            ErrnoContext::Open if raw == EINVAL_RAW => return HumanError::IllegalArgument,
            _ => {}
        }
    }

    match err.kind() {
        NotFound => HumanError::NoEntry,
        PermissionDenied => HumanError::ReadOnly,
        AlreadyExists => HumanError::ExistFile,
        InvalidInput => HumanError::IllegalParameter,
        _ => match err.raw_os_error() {
            Some(raw) if raw == ENOTDIR_RAW => HumanError::NoDir,
            Some(raw) if raw == EMFILE_RAW => HumanError::TooManyOpenFiles,
            Some(raw) if raw == EISDIR_RAW => HumanError::IsDirectory,
            Some(raw) if raw == EBADF_RAW => HumanError::BadFileNumber,
            Some(raw) if raw == ENOMEM_RAW => HumanError::NoMemory,
            Some(raw) if raw == EFAULT_RAW => HumanError::IllegalMemoryPointer,
            Some(raw) if raw == ENOEXEC_RAW => HumanError::IllegalFormat,
            Some(raw) if raw == ENAMETOOLONG_RAW => HumanError::IllegalFileName,
            Some(raw) if raw == EXDEV_RAW => HumanError::IllegalDrive,
            Some(raw) if raw == EROFS_RAW => HumanError::ReadOnly,
            Some(raw) if raw == ENOTEMPTY_RAW => HumanError::NotEmpty,
            Some(raw) if raw == ENOSPC_RAW => HumanError::DiskFull,
            Some(raw) if raw == EOVERFLOW_RAW => HumanError::CantSeek,
            _ => HumanError::IllegalParameter,
        },
    }
}

// libc errno numbers (Linux x86_64/most POSIX systems) used for the
// raw_os_error comparisons above, since `std::io::ErrorKind` doesn't
// distinguish several of these (ENOTDIR vs ENOENT, EMFILE, etc.).
const ENOEXEC_RAW: i32 = 8;
const ENOTDIR_RAW: i32 = 20;
const EMFILE_RAW: i32 = 24;
const EISDIR_RAW: i32 = 21;
const EBADF_RAW: i32 = 9;
const ENOMEM_RAW: i32 = 12;
const EFAULT_RAW: i32 = 14;
const ENAMETOOLONG_RAW: i32 = 36;
const EXDEV_RAW: i32 = 18;
const EROFS_RAW: i32 = 30;
const ENOTEMPTY_RAW: i32 = 39;
const ENOSPC_RAW: i32 = 28;
const EOVERFLOW_RAW: i32 = 75;
const EEXIST_RAW: i32 = 17;
const EINVAL_RAW: i32 = 22;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_noent() {
        let err = io::Error::from(io::ErrorKind::NotFound);
        assert_eq!(from_io_error(&err, ErrnoContext::Generic), HumanError::NoEntry);
    }

    #[test]
    fn mkdir_eexist_overrides_to_existdir() {
        let err = io::Error::from_raw_os_error(EEXIST_RAW);
        assert_eq!(from_io_error(&err, ErrnoContext::Mkdir), HumanError::ExistDir);
    }

    #[test]
    fn code_round_trips_through_from_code() {
        assert_eq!(HumanError::from_code(HumanError::CantSeek.code()), Some(HumanError::CantSeek));
        assert_eq!(HumanError::from_code(1), None);
    }

    #[test]
    fn rmdir_einval_overrides_to_iscurdir() {
        let err = io::Error::from_raw_os_error(EINVAL_RAW);
        assert_eq!(
            from_io_error(&err, ErrnoContext::Rmdir),
            HumanError::IsCurrentDirectory
        );
    }

    #[test]
    fn erofs_maps_to_readonly() {
        let err = io::Error::from_raw_os_error(EROFS_RAW);
        assert_eq!(from_io_error(&err, ErrnoContext::Generic), HumanError::ReadOnly);
    }

    #[test]
    fn enoexec_maps_to_illegal_format() {
        let err = io::Error::from_raw_os_error(ENOEXEC_RAW);
        assert_eq!(from_io_error(&err, ErrnoContext::Generic), HumanError::IllegalFormat);
    }
}
