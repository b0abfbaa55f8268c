use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

use super::{ByteSource, SourceError, SourceRead};

/// Replays a captured `.dat` file as a byte stream.
pub struct FileSource {
    path: PathBuf,
    file: BufReader<File>,
}

impl FileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: BufReader::with_capacity(64 * 1024, file),
        })
    }
}

impl ByteSource for FileSource {
    fn read_available(&mut self, buf: &mut [u8]) -> Result<SourceRead, SourceError> {
        loop {
            match self.file.read(buf) {
                Ok(0) => return Ok(SourceRead::Closed),
                Ok(n) => return Ok(SourceRead::Data(n)),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
