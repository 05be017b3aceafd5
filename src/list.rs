//! `--files` and `--type-list`.
use crate::file_types::FileTypeCatalog;
use crate::output::path_bytes;
use crate::walker::Walker;
use std::io::{self, Write};

/// Prints every path the walker yields, in walk order. Returns the count.
pub fn print_files<W: Write>(
    walker: Walker,
    wtr: &mut W,
    null: bool,
    separator: Option<u8>,
) -> io::Result<u64> {
    let terminator = if null { b'\0' } else { b'\n' };
    let mut count = 0;
    for entry in walker {
        wtr.write_all(&path_bytes(entry.path(), separator))?;
        wtr.write_all(&[terminator])?;
        count += 1;
    }
    Ok(count)
}

/// `name: glob, glob` for every defined type, sorted by name.
pub fn print_type_list<W: Write>(catalog: &FileTypeCatalog, wtr: &mut W) -> io::Result<()> {
    for def in catalog.definitions() {
        writeln!(wtr, "{}: {}", def.name(), def.globs().join(", "))?;
    }
    Ok(())
}
