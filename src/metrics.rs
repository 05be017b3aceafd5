use crate::processor::FileOutcome;
use byte_unit::{Byte, UnitType};
use std::io::{self, Write};
use std::time::Duration;

/// Totals gathered by the printer thread while results are flushed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchStats {
    pub files_searched: u64,
    pub files_with_matches: u64,
    pub binary_skipped: u64,
    pub errors: u64,
    pub cancelled: u64,
    pub matched_lines: u64,
    pub matches: u64,
    pub bytes_searched: u64,
    pub elapsed: Duration,
}

impl SearchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Searched(result) => {
                self.files_searched += 1;
                self.bytes_searched += result.bytes_searched;
                self.matched_lines += result.matched_lines;
                self.matches += result.matches;
                if result.has_match() {
                    self.files_with_matches += 1;
                }
            }
            FileOutcome::Binary(_) => self.binary_skipped += 1,
            FileOutcome::Failed(_) => self.errors += 1,
            FileOutcome::Cancelled(_) => self.cancelled += 1,
        }
    }

    pub fn write_summary<W: Write>(&self, wtr: &mut W) -> io::Result<()> {
        let bytes = Byte::from_u64(self.bytes_searched).get_appropriate_unit(UnitType::Binary);
        writeln!(wtr)?;
        writeln!(wtr, "{} matches", self.matches)?;
        writeln!(wtr, "{} matched lines", self.matched_lines)?;
        writeln!(wtr, "{} files contained matches", self.files_with_matches)?;
        writeln!(wtr, "{} files searched", self.files_searched)?;
        if self.binary_skipped > 0 {
            writeln!(wtr, "{} binary files skipped", self.binary_skipped)?;
        }
        if self.errors > 0 {
            writeln!(wtr, "{} files could not be read", self.errors)?;
        }
        writeln!(
            wtr,
            "{:.2} {} searched ({} bytes)",
            bytes.get_value(),
            bytes.get_unit(),
            self.bytes_searched
        )?;
        writeln!(wtr, "{:.6} seconds", self.elapsed.as_secs_f64())
    }
}
