//! Shared data types used by the rest of the `remote-drive` workspace:
//! Shift-JIS/UTF-8 conversion and small binrw helper newtypes.

pub mod binrw_util {
    pub mod fixed_bytes;

    pub mod prelude {
        pub use super::fixed_bytes::FixedBytes;
    }
}

pub mod sjis;

pub use sjis::{CharsetError, sjis_to_utf8, utf8_to_sjis};
