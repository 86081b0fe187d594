//! Remote file protocol constants.
//!
//! Every request starts with an `i32` command code. Integers are
//! little-endian, booleans one byte, paths use the stream's string framing.
//!
//! ```text
//! OpenFile   mode:u32 path:string        → handle:i32 (>0, -1 failed, -2 table full)
//! Close      handle:u32                  → (nothing)
//! Read       handle:u32 size:u32         → size bytes, ok:bool
//! Write      handle:u32 size:u32 bytes   → ok:bool
//! Size       handle:u32                  → size:u32
//! Seek       handle:u32 base:u32 off:i32 → pos:u32
//! Pos        handle:u32                  → pos:u32
//! Disconnect                             → (session ends)
//! ```

use std::fs::OpenOptions;
use std::io::SeekFrom;

/// Reply to `OpenFile` when the file could not be opened.
pub const OPEN_FAILED: i32 = -1;

/// Reply to `OpenFile` when no handle is free.
pub const OPEN_TABLE_FULL: i32 = -2;

/// Reply to `Size`, `Seek` and `Pos` for an unknown handle or failed call.
pub const INVALID_POSITION: u32 = u32::MAX;

/// Request command codes.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    OpenFile = 0,
    Close = 1,
    Read = 2,
    Write = 3,
    Size = 4,
    Seek = 5,
    Pos = 6,
    Disconnect = 7,
}

impl TryFrom<i32> for Command {
    type Error = i32;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Command::OpenFile),
            1 => Ok(Command::Close),
            2 => Ok(Command::Read),
            3 => Ok(Command::Write),
            4 => Ok(Command::Size),
            5 => Ok(Command::Seek),
            6 => Ok(Command::Pos),
            7 => Ok(Command::Disconnect),
            other => Err(other),
        }
    }
}

impl From<Command> for i32 {
    fn from(command: Command) -> Self {
        command as i32
    }
}

/// Open mode bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenMode(u32);

impl OpenMode {
    pub const READ: OpenMode = OpenMode(1);
    pub const WRITE: OpenMode = OpenMode(1 << 1);
    /// Create the file, truncating an existing one. Implies write.
    pub const CREATE: OpenMode = OpenMode(1 << 2);

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: OpenMode) -> bool {
        self.0 & other.0 == other.0
    }

    /// Translate into file open options.
    pub fn to_open_options(self) -> OpenOptions {
        let mut options = OpenOptions::new();
        let create = self.contains(OpenMode::CREATE);
        options
            .read(self.contains(OpenMode::READ))
            .write(self.contains(OpenMode::WRITE) || create)
            .create(create)
            .truncate(create);
        options
    }
}

impl std::ops::BitOr for OpenMode {
    type Output = OpenMode;

    fn bitor(self, rhs: OpenMode) -> OpenMode {
        OpenMode(self.0 | rhs.0)
    }
}

/// Origin of a `Seek` request.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekBase {
    Begin = 0,
    Current = 1,
    End = 2,
}

impl SeekBase {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(SeekBase::Begin),
            1 => Some(SeekBase::Current),
            2 => Some(SeekBase::End),
            _ => None,
        }
    }

    /// Combine with an offset. Negative offsets from the beginning are rejected.
    pub fn to_seek_from(self, offset: i32) -> Option<SeekFrom> {
        match self {
            SeekBase::Begin => u64::try_from(offset).ok().map(SeekFrom::Start),
            SeekBase::Current => Some(SeekFrom::Current(i64::from(offset))),
            SeekBase::End => Some(SeekFrom::End(i64::from(offset))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_codes_round_trip() {
        for code in 0..8 {
            let command = Command::try_from(code).unwrap();
            assert_eq!(i32::from(command), code);
        }
        assert_eq!(Command::try_from(42), Err(42));
    }

    #[test]
    fn open_mode_bits() {
        let mode = OpenMode::READ | OpenMode::WRITE;
        assert!(mode.contains(OpenMode::READ));
        assert!(mode.contains(OpenMode::WRITE));
        assert!(!mode.contains(OpenMode::CREATE));
        assert_eq!(mode.bits(), 3);
    }

    #[test]
    fn seek_from_begin_rejects_negative() {
        assert_eq!(SeekBase::Begin.to_seek_from(-1), None);
        assert_eq!(SeekBase::Begin.to_seek_from(5), Some(SeekFrom::Start(5)));
        assert_eq!(SeekBase::End.to_seek_from(-3), Some(SeekFrom::End(-3)));
        assert_eq!(SeekBase::from_code(3), None);
    }
}
