//! Read strategies for file contents.
use encoding_rs::{Encoding, UTF_8};
use flate2::read::MultiGzDecoder;
use log::debug;
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, Read};
use std::ops::Deref;
use std::path::Path;

/// Files at least this large are memory-mapped when mapping is enabled.
pub const DEFAULT_MMAP_THRESHOLD: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MmapConfig {
    pub enabled: bool,
    pub min_file_size: u64,
}

impl Default for MmapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_file_size: DEFAULT_MMAP_THRESHOLD,
        }
    }
}

impl MmapConfig {
    fn choose_strategy(&self, file_size: u64) -> ReadStrategy {
        if self.enabled && file_size > 0 && file_size >= self.min_file_size {
            ReadStrategy::MemoryMapped
        } else {
            ReadStrategy::Buffered
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStrategy {
    MemoryMapped,
    Buffered,
}

const GZIP_MAGIC: &[u8] = b"\x1f\x8b";
const XZ_MAGIC: &[u8] = b"\xfd7zXZ\x00";
/// Raw lzma streams carry no magic number; recognize them by extension.
const LZMA_EXTENSION: &str = "lzma";
const TAR_SUFFIXES: [&str; 6] = [".tar.gz", ".tar.xz", ".tar.lzma", ".tgz", ".txz", ".tlz"];

/// Compressed formats searched under `--search-zip`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Xz,
    Lzma,
}

impl Compression {
    /// Tar archives are never unpacked.
    pub fn detect(path: &Path, head: &[u8]) -> Option<Self> {
        if is_tar_archive(path) {
            debug!("tar archives are not searched inside: {}", path.display());
            None
        } else if head.starts_with(GZIP_MAGIC) {
            Some(Compression::Gzip)
        } else if head.starts_with(XZ_MAGIC) {
            Some(Compression::Xz)
        } else if path.extension().is_some_and(|ext| ext == LZMA_EXTENSION) {
            Some(Compression::Lzma)
        } else {
            None
        }
    }

    fn decode(self, compressed: &[u8]) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        match self {
            Compression::Gzip => {
                MultiGzDecoder::new(compressed).read_to_end(&mut buf)?;
            }
            Compression::Xz => {
                xz2::read::XzDecoder::new_multi_decoder(compressed).read_to_end(&mut buf)?;
            }
            Compression::Lzma => {
                let stream = xz2::stream::Stream::new_lzma_decoder(u64::MAX)?;
                xz2::read::XzDecoder::new_stream(compressed, stream).read_to_end(&mut buf)?;
            }
        }
        Ok(buf)
    }
}

fn is_tar_archive(path: &Path) -> bool {
    let name = match path.file_name() {
        Some(name) => name.to_string_lossy().to_ascii_lowercase(),
        None => return false,
    };
    TAR_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Contents of one file or of standard input, viewable as a byte slice.
pub enum ByteSource {
    Mapped(Mmap),
    Buffered(Vec<u8>),
}

impl ByteSource {
    pub fn open(path: &Path, config: &MmapConfig) -> io::Result<Self> {
        let mut file = File::open(path)?;
        let file_size = file.metadata()?.len();

        if config.choose_strategy(file_size) == ReadStrategy::MemoryMapped {
            // SAFETY: the map is read-only and dropped once the file is searched.
            match unsafe { Mmap::map(&file) } {
                Ok(mmap) => return Ok(ByteSource::Mapped(mmap)),
                Err(e) => debug!("mmap failed for {}, reading instead: {e}", path.display()),
            }
        }

        let mut buf = Vec::with_capacity(file_size as usize);
        file.read_to_end(&mut buf)?;
        Ok(ByteSource::Buffered(buf))
    }

    pub fn stdin() -> io::Result<Self> {
        let mut buf = Vec::new();
        io::stdin().lock().read_to_end(&mut buf)?;
        Ok(ByteSource::Buffered(buf))
    }

    /// Swaps compressed contents for their decoded bytes. Anything that is
    /// not a recognized compressed format is returned unchanged.
    pub fn decompress(self, path: &Path) -> io::Result<Self> {
        match Compression::detect(path, &self) {
            Some(format) => {
                debug!("decompressing {} as {format:?}", path.display());
                format.decode(&self).map(ByteSource::Buffered)
            }
            None => Ok(self),
        }
    }

    /// Transcodes to UTF-8. Without an explicit encoding only a UTF-16
    /// byte-order mark triggers decoding; UTF-8 input is never copied.
    pub fn transcode(self, encoding: Option<&'static Encoding>) -> Self {
        let encoding = match encoding.or_else(|| Encoding::for_bom(&self).map(|(enc, _)| enc)) {
            Some(enc) if enc != UTF_8 => enc,
            _ => return self,
        };
        let (text, _, had_errors) = encoding.decode(&self);
        if had_errors {
            debug!("malformed {} input replaced with U+FFFD", encoding.name());
        }
        ByteSource::Buffered(text.into_owned().into_bytes())
    }

    pub fn is_memory_mapped(&self) -> bool {
        matches!(self, ByteSource::Mapped(_))
    }
}

impl Deref for ByteSource {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            ByteSource::Mapped(mmap) => mmap,
            ByteSource::Buffered(buf) => buf,
        }
    }
}

impl AsRef<[u8]> for ByteSource {
    fn as_ref(&self) -> &[u8] {
        self
    }
}
