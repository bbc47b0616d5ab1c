//! The service-side dispatcher: decodes one request frame's payload,
//! carries out the operation against a [`FileSystem`] adapter, and
//! encodes the matching response.
//!
//! Ported from `remote_serv` and the `op_*` functions in `remoteserv.c`.
//! Command codes `0x40..=0x50` are implemented below, one method per
//! `op_*`; `0x51..=0x58` (reserved, never issued by this driver) get a
//! zero-byte success response, and anything else gets no response at
//! all - both per the dispatch table, not per the original's `switch`,
//! which happens to fall through to its `default:` branch (no response)
//! for the reserved range too in this snapshot.

pub mod fsadapter;
pub mod handles;
pub mod pathtrans;

use std::io;
use std::io::{Read, Seek, SeekFrom, Write};

use binrw::io::Cursor;
use binrw::prelude::*;
use remote_drive_fscc::{ErrnoContext, FileAttr, FileInfo, HumanError, from_io_error};
use remote_drive_msg::{
    ChmodRequest, ChmodResponse, CloseRequest, CloseResponse, CreateRequest, CreateResponse, DskfreRequest,
    FiledateRequest, FiledateResponse, FilesRequest, FilesResponse, NfilesRequest, NfilesResponse, OpenRequest,
    OpenResponse, PathRequest, PathResponse, ReadRequest, ReadResponse, RenameRequest, RenameResponse, WriteRequest,
    WriteResponse,
};

use self::fsadapter::{CreateOptions, FileSystem, OpenMode, Stat};
use self::handles::{DirTable, FileTable};
use crate::config::ServiceConfig;

fn decode<T>(payload: &[u8]) -> Option<T>
where
    T: for<'a> BinRead<Args<'a> = ()>,
{
    T::read(&mut Cursor::new(payload)).ok()
}

fn encode<T>(value: &T) -> Vec<u8>
where
    T: for<'a> BinWrite<Args<'a> = ()>,
{
    let mut buf = Vec::new();
    value
        .write(&mut Cursor::new(&mut buf))
        .expect("encoding a response of statically known shape cannot fail");
    buf
}

fn attr_from_stat(stat: &Stat) -> FileAttr {
    FileAttr::new()
        .with_readonly(stat.readonly)
        .with_directory(stat.is_dir)
        .with_archive(!stat.is_dir)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathOp {
    Chdir,
    Mkdir,
    Rmdir,
    Delete,
}

/// Per-connection state: the exported roots, the host filesystem, and
/// the two client-keyed handle tables. One of these exists per client
/// session (spec.md S5 - exactly one, since the protocol is strictly
/// single-threaded request/response).
pub struct ServiceSession<FS: FileSystem> {
    config: ServiceConfig,
    fs: FS,
    files: FileTable<FS::File>,
    dirs: DirTable,
}

impl<FS: FileSystem> ServiceSession<FS> {
    pub fn new(config: ServiceConfig, fs: FS) -> Self {
        ServiceSession {
            config,
            fs,
            files: FileTable::new(),
            dirs: DirTable::new(),
        }
    }

    /// Decodes `payload`'s command byte and dispatches to the matching
    /// `op_*` handler, returning the encoded response frame payload -
    /// `None` when no response should be sent at all.
    pub fn dispatch(&mut self, payload: &[u8]) -> Option<Vec<u8>> {
        let code = *payload.first()?;
        match code {
            0x40 => Some(encode(&remote_drive_msg::CheckResponse { res: 0 })),
            0x41 => Some(self.op_path(payload, PathOp::Chdir)),
            0x42 => Some(self.op_path(payload, PathOp::Mkdir)),
            0x43 => Some(self.op_path(payload, PathOp::Rmdir)),
            0x44 => Some(self.op_rename(payload)),
            0x45 => Some(self.op_path(payload, PathOp::Delete)),
            0x46 => Some(self.op_chmod(payload)),
            0x47 => Some(self.op_files(payload)),
            0x48 => Some(self.op_nfiles(payload)),
            0x49 => Some(self.op_create(payload)),
            0x4a => Some(self.op_open(payload)),
            0x4b => Some(self.op_close(payload)),
            0x4c => Some(self.op_read(payload)),
            0x4d => Some(self.op_write(payload)),
            0x4f => Some(self.op_filedate(payload)),
            0x50 => Some(self.op_dskfre(payload)),
            0x51..=0x58 => Some(Vec::new()),
            _ => None,
        }
    }

    fn op_path(&mut self, payload: &[u8], op: PathOp) -> Vec<u8> {
        let outcome: Result<(), HumanError> = (|| {
            let req: PathRequest = decode(payload).ok_or(HumanError::IllegalParameter)?;
            let full = op != PathOp::Chdir;
            let path = pathtrans::host_path(&self.config, &req.path, full)?;
            match op {
                PathOp::Chdir => {
                    let stat = self.fs.stat(&path).map_err(|e| from_io_error(&e, ErrnoContext::Generic))?;
                    if !stat.is_dir {
                        return Err(HumanError::NoDir);
                    }
                    Ok(())
                }
                PathOp::Mkdir => self.fs.mkdir(&path).map_err(|e| from_io_error(&e, ErrnoContext::Mkdir)),
                PathOp::Rmdir => self.fs.rmdir(&path).map_err(|e| from_io_error(&e, ErrnoContext::Rmdir)),
                PathOp::Delete => self.fs.unlink(&path).map_err(|e| from_io_error(&e, ErrnoContext::Generic)),
            }
        })();
        encode(&PathResponse {
            res: outcome.err().map(|e| e.code() as i8).unwrap_or(0),
        })
    }

    fn op_rename(&mut self, payload: &[u8]) -> Vec<u8> {
        let outcome: Result<(), HumanError> = (|| {
            let req: RenameRequest = decode(payload).ok_or(HumanError::IllegalParameter)?;
            let from = pathtrans::host_path(&self.config, &req.path_old, true)?;
            let to = pathtrans::host_path(&self.config, &req.path_new, true)?;
            self.fs.rename(&from, &to).map_err(|e| from_io_error(&e, ErrnoContext::Rename))
        })();
        encode(&RenameResponse {
            res: outcome.err().map(|e| e.code() as i8).unwrap_or(0),
        })
    }

    /// `op_chmod`'s get-then-optionally-set shape: on a query (the
    /// request's attribute is [`FileAttr::QUERY_ONLY`]) the response
    /// carries the current attribute byte; on a set, it applies the new
    /// read-only bit and reports plain success (`0`), not the resulting
    /// attribute (`remoteserv.c`'s `op_chmod` only returns the attribute
    /// byte on the query path; a successful `FUNC_CHMOD` leaves `res->res`
    /// at its `0` initializer).
    fn op_chmod(&mut self, payload: &[u8]) -> Vec<u8> {
        let outcome: Result<i8, HumanError> = (|| {
            let req: ChmodRequest = decode(payload).ok_or(HumanError::IllegalParameter)?;
            let path = pathtrans::host_path(&self.config, &req.path, true)?;
            if req.attr == FileAttr::QUERY_ONLY {
                let stat = self.fs.stat(&path).map_err(|e| from_io_error(&e, ErrnoContext::Generic))?;
                return Ok(attr_from_stat(&stat).into_bytes()[0] as i8);
            }
            let readonly = req.attr & 0x01 != 0;
            self.fs.chmod(&path, readonly).map_err(|e| from_io_error(&e, ErrnoContext::Generic))?;
            Ok(0)
        })();
        let res = match outcome {
            Ok(res) => res,
            Err(e) => e.code() as i8,
        };
        encode(&ChmodResponse { res })
    }

    fn op_files(&mut self, payload: &[u8]) -> Vec<u8> {
        let zero_info = || FileInfo::new(FileAttr::new(), 0, 0, 0, b"");
        let Some(req) = decode::<FilesRequest>(payload) else {
            return encode(&FilesResponse {
                res: HumanError::IllegalParameter.code() as i8,
                info: zero_info(),
            });
        };
        self.dirs.discard(req.filbuf);

        let is_root = req.path.is_root_path();
        let pattern = pathtrans::build_pattern(&req.path);

        let outcome: Result<Vec<FileInfo>, HumanError> = (|| {
            let path = pathtrans::host_path(&self.config, &req.path, false)?;
            let iter = self.fs.read_dir(&path).map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    HumanError::NoDir
                } else {
                    from_io_error(&e, ErrnoContext::Generic)
                }
            })?;

            let mut matches = Vec::new();
            if is_root && req.attr & 0x08 != 0 && pathtrans::is_wildcard_all(&pattern) {
                matches.push(FileInfo::volume_label(&pathtrans::volume_label_name(&path)));
            }
            for entry in iter {
                let Ok(entry) = entry else { continue };
                let Ok(name_sjis) = pathtrans::host_name_to_sjis(&entry.file_name) else {
                    continue;
                };
                if !pathtrans::is_valid_candidate_name(&name_sjis) {
                    continue;
                }
                let Some(key) = pathtrans::candidate_key(&name_sjis) else { continue };
                if !pathtrans::matches_pattern(&pattern, &key) {
                    continue;
                }
                let Ok(stat) = self.fs.stat(&path.join(&entry.file_name)) else {
                    continue;
                };
                if stat.size > u32::MAX as u64 {
                    continue;
                }
                let attr = attr_from_stat(&stat);
                if attr.into_bytes()[0] & req.attr == 0 {
                    continue;
                }
                let (date, time) = stat.dos_date_time();
                matches.push(FileInfo::new(attr, time, date, stat.size as u32, &name_sjis));
            }
            Ok(matches)
        })();

        match outcome {
            Ok(matches) => match self.dirs.start(req.filbuf, matches) {
                Some(info) => encode(&FilesResponse { res: 0, info }),
                None => encode(&FilesResponse {
                    res: HumanError::NoMore.code() as i8,
                    info: zero_info(),
                }),
            },
            Err(e) => encode(&FilesResponse {
                res: e.code() as i8,
                info: zero_info(),
            }),
        }
    }

    fn op_nfiles(&mut self, payload: &[u8]) -> Vec<u8> {
        let zero_info = FileInfo::new(FileAttr::new(), 0, 0, 0, b"");
        let Some(req) = decode::<NfilesRequest>(payload) else {
            return encode(&NfilesResponse {
                res: HumanError::IllegalParameter.code() as i8,
                info: zero_info,
            });
        };
        match self.dirs.next(req.filbuf) {
            Some(info) => encode(&NfilesResponse { res: 0, info }),
            None => encode(&NfilesResponse {
                res: HumanError::NoMore.code() as i8,
                info: zero_info,
            }),
        }
    }

    fn op_create(&mut self, payload: &[u8]) -> Vec<u8> {
        let outcome: Result<(), HumanError> = (|| {
            let req: CreateRequest = decode(payload).ok_or(HumanError::IllegalParameter)?;
            let path = pathtrans::host_path(&self.config, &req.path, true)?;
            let file = self
                .fs
                .open(&path, OpenMode::ReadWrite, Some(CreateOptions { exclusive: req.mode == 0 }))
                .map_err(|e| from_io_error(&e, ErrnoContext::Create))?;
            self.files.insert(req.fcb, file);
            Ok(())
        })();
        encode(&CreateResponse {
            res: outcome.err().map(|e| e.code() as i8).unwrap_or(0),
        })
    }

    fn op_open(&mut self, payload: &[u8]) -> Vec<u8> {
        let outcome: Result<u32, HumanError> = (|| {
            let req: OpenRequest = decode(payload).ok_or(HumanError::IllegalParameter)?;
            let path = pathtrans::host_path(&self.config, &req.path, true)?;
            let mode = match req.mode {
                0 => OpenMode::Read,
                1 => OpenMode::Write,
                2 => OpenMode::ReadWrite,
                _ => return Err(HumanError::IllegalArgument),
            };
            let file = self.fs.open(&path, mode, None).map_err(|e| from_io_error(&e, ErrnoContext::Open))?;
            let stat = self.fs.fstat(&file).map_err(|e| from_io_error(&e, ErrnoContext::Generic))?;
            let size = stat.size.min(i32::MAX as u64) as u32;
            self.files.insert(req.fcb, file);
            Ok(size)
        })();
        let res = match outcome {
            Ok(size) => size as i32,
            Err(e) => e.code(),
        };
        encode(&OpenResponse { res })
    }

    fn op_close(&mut self, payload: &[u8]) -> Vec<u8> {
        let outcome: Result<(), HumanError> = (|| {
            let req: CloseRequest = decode(payload).ok_or(HumanError::IllegalParameter)?;
            self.files.remove(req.fcb).ok_or(HumanError::BadFileNumber)?;
            Ok(())
        })();
        encode(&CloseResponse {
            res: outcome.err().map(|e| e.code() as i8).unwrap_or(0),
        })
    }

    /// Seeks only when the client's requested offset doesn't match the
    /// handle's remembered position, same as `op_read`'s `fi->pos != pos`
    /// check - a purely sequential reader never pays for a host seek.
    fn op_read(&mut self, payload: &[u8]) -> Vec<u8> {
        let Some(req) = decode::<ReadRequest>(payload) else {
            return encode(&ReadResponse {
                res: HumanError::IllegalParameter.code(),
                data: Vec::new(),
            });
        };
        let Some(remembered) = self.files.position(req.fcb) else {
            return encode(&ReadResponse {
                res: HumanError::BadFileNumber.code(),
                data: Vec::new(),
            });
        };
        let file = self.files.get_mut(req.fcb).expect("position() just confirmed the slot exists");
        if remembered != req.pos {
            if let Err(e) = file.seek(SeekFrom::Start(req.pos as u64)) {
                return encode(&ReadResponse {
                    res: from_io_error(&e, ErrnoContext::Generic).code(),
                    data: Vec::new(),
                });
            }
        }
        let mut buf = vec![0u8; req.len as usize];
        match file.read(&mut buf) {
            Ok(n) => {
                buf.truncate(n);
                self.files.set_position(req.fcb, req.pos + n as u32);
                encode(&ReadResponse { res: n as i32, data: buf })
            }
            Err(e) => encode(&ReadResponse {
                res: from_io_error(&e, ErrnoContext::Generic).code(),
                data: Vec::new(),
            }),
        }
    }

    /// A zero-length write truncates at `pos` instead (`op_write`'s
    /// `len == 0` branch); the remembered position is left untouched
    /// either way, matching the original.
    fn op_write(&mut self, payload: &[u8]) -> Vec<u8> {
        let Some(req) = decode::<WriteRequest>(payload) else {
            return encode(&WriteResponse {
                res: HumanError::IllegalParameter.code(),
            });
        };
        let Some(remembered) = self.files.position(req.fcb) else {
            return encode(&WriteResponse {
                res: HumanError::BadFileNumber.code(),
            });
        };

        if req.data.is_empty() {
            let file = self.files.get_mut(req.fcb).expect("position() just confirmed the slot exists");
            let res = match self.fs.ftruncate(file, req.pos as u64) {
                Ok(()) => 0,
                Err(e) => from_io_error(&e, ErrnoContext::Generic).code(),
            };
            return encode(&WriteResponse { res });
        }

        let file = self.files.get_mut(req.fcb).expect("position() just confirmed the slot exists");
        if remembered != req.pos {
            if let Err(e) = file.seek(SeekFrom::Start(req.pos as u64)) {
                return encode(&WriteResponse {
                    res: from_io_error(&e, ErrnoContext::Generic).code(),
                });
            }
        }
        match file.write(&req.data) {
            Ok(n) => {
                self.files.set_position(req.fcb, req.pos + n as u32);
                encode(&WriteResponse { res: n as i32 })
            }
            Err(e) => encode(&WriteResponse {
                res: from_io_error(&e, ErrnoContext::Generic).code(),
            }),
        }
    }

    fn op_filedate(&mut self, payload: &[u8]) -> Vec<u8> {
        let Some(req) = decode::<FiledateRequest>(payload) else {
            return encode(&FiledateResponse {
                res: HumanError::IllegalParameter.code() as i8,
                date: 0,
                time: 0,
            });
        };
        let Some(file) = self.files.get_mut(req.fcb) else {
            return encode(&FiledateResponse {
                res: HumanError::BadFileNumber.code() as i8,
                date: 0,
                time: 0,
            });
        };
        if req.is_query() {
            match self.fs.fstat(file) {
                Ok(stat) => {
                    let (date, time) = stat.dos_date_time();
                    encode(&FiledateResponse { res: 0, date, time })
                }
                Err(e) => encode(&FiledateResponse {
                    res: from_io_error(&e, ErrnoContext::Generic).code() as i8,
                    date: 0,
                    time: 0,
                }),
            }
        } else {
            match self.fs.set_mtime(file, req.date, req.time) {
                Ok(()) => encode(&FiledateResponse { res: 0, date: 0, time: 0 }),
                Err(e) => encode(&FiledateResponse {
                    res: from_io_error(&e, ErrnoContext::Generic).code() as i8,
                    date: 0,
                    time: 0,
                }),
            }
        }
    }

    /// `op_dskfre` has no error code on the wire at all - an
    /// unconfigured unit or a host statfs failure both fall back to
    /// reporting zero free/total space rather than failing the call.
    fn op_dskfre(&mut self, payload: &[u8]) -> Vec<u8> {
        let Some(req) = decode::<DskfreRequest>(payload) else {
            return encode(&remote_drive_fscc::DiskFree::from_bytes(0, 0));
        };
        let stats = self
            .config
            .root(req.drive)
            .ok()
            .and_then(|root| self.fs.statfs(root).ok());
        match stats {
            Some(s) => encode(&remote_drive_fscc::DiskFree::from_bytes(s.free_bytes, s.total_bytes)),
            None => encode(&remote_drive_fscc::DiskFree::from_bytes(0, 0)),
        }
    }
}
