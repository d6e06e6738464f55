//! Physical access to the XLSX ZIP container.
//!
//! Workbook parts are ZIP members; this module wraps `zip` for buffered
//! random access on read and deflate-compressed emission on write.

use crate::common::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};
use std::path::Path;
use zip::ZipArchive;

/// Container reader providing access to workbook parts.
pub struct Container<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl Container<BufReader<File>> {
    /// Open an XLSX container from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::with_capacity(8192, file))
    }
}

impl<R: Read + Seek> Container<R> {
    /// Create a container from a reader.
    pub fn new(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)?;
        Ok(Self { archive })
    }

    /// Get the binary content of a part by member name (no leading '/').
    ///
    /// The returned vector is pre-allocated to the exact member size.
    pub fn blob(&mut self, member: &str) -> Result<Vec<u8>> {
        let mut file = self
            .archive
            .by_name(member)
            .map_err(|_| Error::Xml(format!("workbook part missing: {member}")))?;

        let size = file.size() as usize;
        let mut buffer = Vec::with_capacity(size);
        file.read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    /// Check whether a member exists without reading it.
    pub fn contains(&mut self, member: &str) -> bool {
        self.archive.by_name(member).is_ok()
    }
}

/// Container writer for producing XLSX packages.
pub struct ContainerWriter<W: Write + Seek> {
    archive: zip::ZipWriter<W>,
}

impl<W: Write + Seek> ContainerWriter<W> {
    /// Create a writer over a sink.
    pub fn new(sink: W) -> Self {
        Self {
            archive: zip::ZipWriter::new(sink),
        }
    }

    /// Write one part.
    pub fn write_part(&mut self, member: &str, blob: &[u8]) -> Result<()> {
        use zip::write::SimpleFileOptions;

        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .compression_level(Some(6));

        self.archive.start_file(member, options)?;
        self.archive.write_all(blob)?;
        Ok(())
    }

    /// Finish writing and close the container.
    pub fn finish(self) -> Result<()> {
        self.archive.finish()?;
        Ok(())
    }
}
