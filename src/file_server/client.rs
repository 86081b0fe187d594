//! Client side of the remote file protocol.

use crate::file_server::protocol::{Command, OpenMode, SeekBase, INVALID_POSITION, OPEN_TABLE_FULL};
use crate::file_server::FileServerError;
use crate::net::{Connector, Stream, Transport};

/// A session with a remote file server.
#[derive(Debug)]
pub struct RemoteFileClient<T: Transport = std::net::TcpStream> {
    stream: Stream<T>,
}

impl RemoteFileClient {
    /// Connect to a file server.
    pub fn connect(
        connector: &Connector,
        ip: Option<&str>,
        port: u16,
    ) -> Result<Self, FileServerError> {
        Ok(Self::from_stream(connector.connect(ip, port)?))
    }
}

impl<T: Transport> RemoteFileClient<T> {
    /// Use an established stream.
    pub fn from_stream(stream: Stream<T>) -> Self {
        Self { stream }
    }

    fn command(&mut self, command: Command) -> Result<(), FileServerError> {
        self.stream.write_value(&i32::from(command))?;
        Ok(())
    }

    /// Open `path` on the server and return its handle.
    pub fn open(&mut self, path: &str, mode: OpenMode) -> Result<u32, FileServerError> {
        self.command(Command::OpenFile)?;
        self.stream.write_value(&mode.bits())?;
        self.stream.write_string(path)?;

        match self.stream.read_value::<i32>()? {
            OPEN_TABLE_FULL => Err(FileServerError::HandleTableFull),
            handle if handle > 0 => Ok(handle as u32),
            _ => Err(FileServerError::OpenFailed(path.to_string())),
        }
    }

    /// Close a handle. The server sends no reply.
    pub fn close(&mut self, handle: u32) -> Result<(), FileServerError> {
        self.command(Command::Close)?;
        self.stream.write_value(&handle)?;
        Ok(())
    }

    /// Fill `buf` from the file's current position.
    pub fn read(&mut self, handle: u32, buf: &mut [u8]) -> Result<(), FileServerError> {
        let size = wire_size(buf.len())?;
        self.command(Command::Read)?;
        self.stream.write_value(&handle)?;
        self.stream.write_value(&size)?;

        self.stream.read(buf)?;
        if self.stream.read_value::<bool>()? {
            Ok(())
        } else {
            Err(FileServerError::RemoteFailure("read"))
        }
    }

    /// Write all of `data` at the file's current position.
    pub fn write(&mut self, handle: u32, data: &[u8]) -> Result<(), FileServerError> {
        let size = wire_size(data.len())?;
        self.command(Command::Write)?;
        self.stream.write_value(&handle)?;
        self.stream.write_value(&size)?;
        self.stream.write(data)?;

        if self.stream.read_value::<bool>()? {
            Ok(())
        } else {
            Err(FileServerError::RemoteFailure("write"))
        }
    }

    /// File size in bytes.
    pub fn size(&mut self, handle: u32) -> Result<u32, FileServerError> {
        self.command(Command::Size)?;
        self.stream.write_value(&handle)?;
        self.position_reply(handle)
    }

    /// Move the file cursor and return the new position.
    pub fn seek(&mut self, handle: u32, base: SeekBase, offset: i32) -> Result<u32, FileServerError> {
        self.command(Command::Seek)?;
        self.stream.write_value(&handle)?;
        self.stream.write_value(&(base as u32))?;
        self.stream.write_value(&offset)?;
        self.position_reply(handle)
    }

    /// Current cursor position.
    pub fn pos(&mut self, handle: u32) -> Result<u32, FileServerError> {
        self.command(Command::Pos)?;
        self.stream.write_value(&handle)?;
        self.position_reply(handle)
    }

    /// End the session and release the connection.
    pub fn disconnect(mut self) -> Result<(), FileServerError> {
        self.command(Command::Disconnect)
    }

    fn position_reply(&mut self, handle: u32) -> Result<u32, FileServerError> {
        match self.stream.read_value::<u32>()? {
            INVALID_POSITION => Err(FileServerError::InvalidHandle(handle)),
            pos => Ok(pos),
        }
    }
}

fn wire_size(len: usize) -> Result<u32, FileServerError> {
    u32::try_from(len).map_err(|_| FileServerError::TooLarge(len))
}
