//! `--json`: one object per match or context line.
use super::{merge_lines, Line};
use crate::processor::FileResult;
use serde::Serialize;
use std::borrow::Cow;
use std::io::{self, Write};

#[derive(Debug, Serialize)]
struct Submatch<'a> {
    #[serde(rename = "match")]
    text: Cow<'a, str>,
    start: usize,
    end: usize,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum JsonLine<'a> {
    Match {
        path: Cow<'a, str>,
        line_number: u64,
        absolute_offset: u64,
        column: u64,
        text: Cow<'a, str>,
        submatches: Vec<Submatch<'a>>,
    },
    Context {
        path: Cow<'a, str>,
        line_number: u64,
        absolute_offset: u64,
        text: Cow<'a, str>,
    },
}

pub fn write_file<W: Write>(wtr: &mut W, result: &FileResult) -> io::Result<()> {
    let path = result.path.to_string_lossy();
    for (_, line) in merge_lines(&result.records) {
        let json = match line {
            Line::Match(record) => JsonLine::Match {
                path: path.clone(),
                line_number: record.line_number,
                absolute_offset: record.byte_offset,
                column: record.column,
                text: String::from_utf8_lossy(&record.line),
                submatches: record
                    .spans
                    .iter()
                    .map(|span| Submatch {
                        text: String::from_utf8_lossy(&record.line[span.start..span.end]),
                        start: span.start,
                        end: span.end,
                    })
                    .collect(),
            },
            Line::Context(context) => JsonLine::Context {
                path: path.clone(),
                line_number: context.line_number,
                absolute_offset: context.byte_offset,
                text: String::from_utf8_lossy(&context.line),
            },
        };
        serde_json::to_writer(&mut *wtr, &json)?;
        wtr.write_all(b"\n")?;
    }
    Ok(())
}
