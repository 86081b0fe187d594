//! Server side of the remote file protocol.
//!
//! Serves one client per session over a single stream. Requests are
//! handled strictly in order; the session ends on `Disconnect`, when the
//! client hangs up between requests, or on the first transport error.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::{Component, Path, PathBuf};
use std::thread::{self, JoinHandle};

use crate::config::FileServerConfig;
use crate::file_server::protocol::{
    Command, OpenMode, SeekBase, INVALID_POSITION, OPEN_FAILED, OPEN_TABLE_FULL,
};
use crate::file_server::FileServerError;
use crate::net::{Acceptor, NetError, Stream, Transport};

/// Open files keyed by handle. Handles start at 1 and are reused after close.
#[derive(Debug)]
struct HandleTable {
    files: HashMap<u32, File>,
    free: Vec<u32>,
    next: u32,
    capacity: usize,
}

impl HandleTable {
    fn new(capacity: usize) -> Self {
        Self {
            files: HashMap::new(),
            free: Vec::new(),
            next: 1,
            capacity,
        }
    }

    fn is_full(&self) -> bool {
        self.files.len() >= self.capacity
    }

    fn insert(&mut self, file: File) -> Option<u32> {
        if self.is_full() {
            return None;
        }
        let id = match self.free.pop() {
            Some(id) => id,
            None => {
                let id = self.next;
                self.next = self.next.checked_add(1)?;
                id
            }
        };
        self.files.insert(id, file);
        Some(id)
    }

    fn get_mut(&mut self, id: u32) -> Option<&mut File> {
        self.files.get_mut(&id)
    }

    fn remove(&mut self, id: u32) -> Option<File> {
        let file = self.files.remove(&id)?;
        self.free.push(id);
        Some(file)
    }
}

/// Remote file server.
#[derive(Debug)]
pub struct FileServer {
    base_path: PathBuf,
    buffer: Vec<u8>,
    max_path_length: usize,
    files: HandleTable,
}

impl FileServer {
    /// Create a server rooted at `config.base_path`.
    pub fn new(config: &FileServerConfig) -> Self {
        Self {
            base_path: PathBuf::from(&config.base_path),
            buffer: vec![0u8; config.buffer_size.max(1)],
            max_path_length: config.max_path_length,
            files: HandleTable::new(config.max_open_files),
        }
    }

    /// Directory requests are resolved against.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Number of currently open handles.
    pub fn open_files(&self) -> usize {
        self.files.files.len()
    }

    /// Map a requested path onto the base path.
    ///
    /// Relative paths are joined to the base. Absolute paths are accepted
    /// only inside the base. Any `..` component is rejected.
    pub fn resolve_path(&self, requested: &str) -> Option<PathBuf> {
        let requested = Path::new(requested);
        if requested
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return None;
        }

        if requested.starts_with(&self.base_path) {
            return Some(requested.to_path_buf());
        }

        if requested.has_root() {
            return None;
        }

        Some(self.base_path.join(requested))
    }

    /// Accept one client and serve it until it disconnects.
    pub fn run(mut self, acceptor: Acceptor) -> Result<(), FileServerError> {
        let mut stream = acceptor.accept()?;
        let result = self.serve(&mut stream);
        acceptor.close(stream);
        result
    }

    /// Run the server on its own thread.
    pub fn spawn(self, acceptor: Acceptor) -> Result<FileServerHandle, FileServerError> {
        let thread = thread::Builder::new()
            .name("tcp-file-server".into())
            .spawn(move || self.run(acceptor))
            .map_err(|e| FileServerError::Thread(e.to_string()))?;
        Ok(FileServerHandle { thread })
    }

    /// Serve requests on `stream` until the session ends.
    pub fn serve<T: Transport>(&mut self, stream: &mut Stream<T>) -> Result<(), FileServerError> {
        tracing::info!(
            connection_id = %stream.id(),
            base_path = %self.base_path.display(),
            "File server session started"
        );

        loop {
            let code = match stream.read_value::<i32>() {
                Ok(code) => code,
                Err(NetError::Closed { received: 0, .. }) => {
                    tracing::info!(connection_id = %stream.id(), "Client hung up");
                    break;
                }
                Err(e) => return Err(e.into()),
            };

            let command = Command::try_from(code).map_err(|code| {
                tracing::error!(connection_id = %stream.id(), code, "Unknown command");
                FileServerError::UnknownCommand(code)
            })?;

            tracing::trace!(connection_id = %stream.id(), ?command, "Request");

            match command {
                Command::OpenFile => self.open_file(stream)?,
                Command::Close => self.close_file(stream)?,
                Command::Read => self.read_file(stream)?,
                Command::Write => self.write_file(stream)?,
                Command::Size => self.size(stream)?,
                Command::Seek => self.seek(stream)?,
                Command::Pos => self.pos(stream)?,
                Command::Disconnect => break,
            }
        }

        tracing::info!(
            connection_id = %stream.id(),
            open_files = self.open_files(),
            "File server session ended"
        );
        Ok(())
    }

    /// Read a requested path. Oversized or malformed paths yield `None`.
    fn read_path<T: Transport>(
        &self,
        stream: &mut Stream<T>,
    ) -> Result<Option<String>, NetError> {
        match stream.read_str_bounded(self.max_path_length) {
            Ok(path) => Ok(Some(path)),
            Err(NetError::Oversized { .. } | NetError::InvalidString(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn open_file<T: Transport>(&mut self, stream: &mut Stream<T>) -> Result<(), NetError> {
        let mode = OpenMode::from_bits(stream.read_value::<u32>()?);
        let requested = self.read_path(stream)?;

        let reply = match requested {
            _ if self.files.is_full() => OPEN_TABLE_FULL,
            None => OPEN_FAILED,
            Some(requested) => match self.resolve_path(&requested) {
                None => {
                    tracing::warn!(path = %requested, "Rejected path outside base");
                    OPEN_FAILED
                }
                Some(path) => match mode.to_open_options().open(&path) {
                    Ok(file) => match self.files.insert(file) {
                        Some(id) => {
                            tracing::debug!(path = %path.display(), handle = id, "File opened");
                            id as i32
                        }
                        None => OPEN_TABLE_FULL,
                    },
                    Err(e) => {
                        tracing::debug!(path = %path.display(), error = %e, "Open failed");
                        OPEN_FAILED
                    }
                },
            },
        };

        stream.write_value(&reply)
    }

    fn close_file<T: Transport>(&mut self, stream: &mut Stream<T>) -> Result<(), NetError> {
        let id = stream.read_value::<u32>()?;
        if self.files.remove(id).is_none() {
            tracing::warn!(handle = id, "Close of unknown handle");
        }
        Ok(())
    }

    fn read_file<T: Transport>(&mut self, stream: &mut Stream<T>) -> Result<(), NetError> {
        let id = stream.read_value::<u32>()?;
        let mut remaining = stream.read_value::<u32>()? as usize;
        let mut ok = true;

        while remaining > 0 {
            let chunk = remaining.min(self.buffer.len());
            let buf = &mut self.buffer[..chunk];
            let read = match self.files.get_mut(id) {
                Some(file) => file.read_exact(buf).is_ok(),
                None => false,
            };
            if !read {
                ok = false;
                buf.fill(0);
            }
            stream.write(buf)?;
            remaining -= chunk;
        }

        stream.write_value(&ok)
    }

    fn write_file<T: Transport>(&mut self, stream: &mut Stream<T>) -> Result<(), NetError> {
        let id = stream.read_value::<u32>()?;
        let mut remaining = stream.read_value::<u32>()? as usize;
        let mut ok = true;

        while remaining > 0 {
            let chunk = remaining.min(self.buffer.len());
            let buf = &mut self.buffer[..chunk];
            stream.read(buf)?;
            let written = match self.files.get_mut(id) {
                Some(file) => file.write_all(buf).is_ok(),
                None => false,
            };
            ok &= written;
            remaining -= chunk;
        }

        stream.write_value(&ok)
    }

    fn size<T: Transport>(&mut self, stream: &mut Stream<T>) -> Result<(), NetError> {
        let id = stream.read_value::<u32>()?;
        let size = self
            .files
            .get_mut(id)
            .and_then(|file| file.metadata().ok())
            .map_or(INVALID_POSITION, |meta| clamp_position(meta.len()));
        stream.write_value(&size)
    }

    fn seek<T: Transport>(&mut self, stream: &mut Stream<T>) -> Result<(), NetError> {
        let id = stream.read_value::<u32>()?;
        let base = stream.read_value::<u32>()?;
        let offset = stream.read_value::<i32>()?;

        let target = SeekBase::from_code(base).and_then(|base| base.to_seek_from(offset));
        let pos = match (self.files.get_mut(id), target) {
            (Some(file), Some(target)) => file
                .seek(target)
                .map_or(INVALID_POSITION, clamp_position),
            _ => INVALID_POSITION,
        };
        stream.write_value(&pos)
    }

    fn pos<T: Transport>(&mut self, stream: &mut Stream<T>) -> Result<(), NetError> {
        let id = stream.read_value::<u32>()?;
        let pos = self
            .files
            .get_mut(id)
            .and_then(|file| file.stream_position().ok())
            .map_or(INVALID_POSITION, clamp_position);
        stream.write_value(&pos)
    }
}

/// Positions past `u32` range cannot be expressed on the wire.
fn clamp_position(pos: u64) -> u32 {
    u32::try_from(pos).unwrap_or(INVALID_POSITION)
}

/// Handle to a file server running on its own thread.
#[derive(Debug)]
pub struct FileServerHandle {
    thread: JoinHandle<Result<(), FileServerError>>,
}

impl FileServerHandle {
    /// Wait for the session to end.
    pub fn join(self) -> Result<(), FileServerError> {
        self.thread
            .join()
            .map_err(|_| FileServerError::Thread("file server thread panicked".into()))?
    }

    /// Whether the server thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_at(base: &str) -> FileServer {
        FileServer::new(&FileServerConfig {
            base_path: base.into(),
            ..Default::default()
        })
    }

    #[test]
    fn relative_paths_join_base() {
        let server = server_at("/srv/assets");
        assert_eq!(
            server.resolve_path("models/cube.msh"),
            Some(PathBuf::from("/srv/assets/models/cube.msh"))
        );
    }

    #[test]
    fn absolute_path_inside_base_is_kept() {
        let server = server_at("/srv/assets");
        assert_eq!(
            server.resolve_path("/srv/assets/a.txt"),
            Some(PathBuf::from("/srv/assets/a.txt"))
        );
    }

    #[test]
    fn escaping_paths_are_rejected() {
        let server = server_at("/srv/assets");
        assert_eq!(server.resolve_path("../etc/passwd"), None);
        assert_eq!(server.resolve_path("/etc/passwd"), None);
        assert_eq!(server.resolve_path("a/../../b"), None);
    }

    #[test]
    fn handle_table_reuses_ids() {
        let dir = tempfile::tempdir().unwrap();
        let open = |name: &str| File::create(dir.path().join(name)).unwrap();

        let mut table = HandleTable::new(2);
        let a = table.insert(open("a")).unwrap();
        let b = table.insert(open("b")).unwrap();
        assert_eq!((a, b), (1, 2));
        assert!(table.insert(open("c")).is_none());

        assert!(table.remove(a).is_some());
        assert!(table.remove(a).is_none());
        assert_eq!(table.insert(open("d")), Some(a));
    }
}
