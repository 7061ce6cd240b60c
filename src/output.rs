//! Rendering of resolved entries: 4-space-indented JSON or a fixed-width table.

use crate::location::{FaultRecord, ResolvedEntry};
use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter, Serializer};
use std::io;

/// Printed after the results when faults were not requested.
pub const SKIPPED_NOTICE: &str = "Any queries not included was skipped due to an error.  Please use `-e` in the function call to include errors in the output.";

const TABLE_WIDTH: usize = 85;
const TERM_WIDTH: usize = 25;
const NAME_WIDTH: usize = 25;
const COORD_WIDTH: usize = 12;

const INDENT: &[u8] = b"    ";

/// Render entries as a pretty JSON array.
///
/// With `ascii_only`, every non-ASCII character is written as a `\uXXXX`
/// escape (surrogate pairs outside the BMP).
pub fn render_json(entries: &[ResolvedEntry], ascii_only: bool) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    if ascii_only {
        let formatter = AsciiFormatter(PrettyFormatter::with_indent(INDENT));
        entries.serialize(&mut Serializer::with_formatter(&mut buf, formatter))?;
    } else {
        let formatter = PrettyFormatter::with_indent(INDENT);
        entries.serialize(&mut Serializer::with_formatter(&mut buf, formatter))?;
    }
    // serde_json only ever emits UTF-8.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// How a finished batch is reported on stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    /// Fixed-width table instead of JSON.
    pub table: bool,
    /// Escape non-ASCII characters in JSON output.
    pub ascii_only: bool,
    /// List every fault message after the results.
    pub errors: bool,
}

/// Write the results, then either the fault messages (one per line) or,
/// when something was skipped, the skip notice.
pub fn write_report<W: io::Write>(
    out: &mut W,
    entries: &[ResolvedEntry],
    faults: &[FaultRecord],
    options: ReportOptions,
) -> io::Result<()> {
    if options.table {
        out.write_all(render_table(entries).as_bytes())?;
    } else {
        writeln!(out, "{}", render_json(entries, options.ascii_only)?)?;
    }

    if options.errors {
        for fault in faults {
            writeln!(out, "{}", fault.message)?;
        }
    } else if !faults.is_empty() {
        writeln!(out, "{}", SKIPPED_NOTICE)?;
    }
    Ok(())
}

/// Render entries as the fixed-width table, one line per entry plus header
/// and borders. Every line ends with a newline.
pub fn render_table(entries: &[ResolvedEntry]) -> String {
    let border = format!("|{}|\n", "-".repeat(TABLE_WIDTH));

    let mut out = String::new();
    out.push_str(&border);
    out.push_str(&table_row("Search Term", "City/Town Name", "Latitude", "Longitude"));
    out.push_str(&border);
    for entry in entries {
        out.push_str(&table_row(
            &entry.search_term,
            &entry.name,
            &format!("{:?}", entry.lat),
            &format!("{:?}", entry.lon),
        ));
    }
    out.push_str(&border);
    out
}

fn table_row(term: &str, name: &str, lat: &str, lon: &str) -> String {
    format!(
        "| {:<tw$} | {:<nw$} | {:<cw$} | {:<cw$} |\n",
        truncate(term, TERM_WIDTH),
        truncate(name, NAME_WIDTH),
        truncate(lat, COORD_WIDTH),
        truncate(lon, COORD_WIDTH),
        tw = TERM_WIDTH,
        nw = NAME_WIDTH,
        cw = COORD_WIDTH,
    )
}

/// First `max` characters (not bytes).
fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Pretty formatter that escapes everything outside ASCII.
struct AsciiFormatter<'a>(PrettyFormatter<'a>);

impl Formatter for AsciiFormatter<'_> {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut utf16 = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut utf16) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }

    fn begin_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_array(writer)
    }

    fn end_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_array(writer)
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_array_value(writer, first)
    }

    fn end_array_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_array_value(writer)
    }

    fn begin_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_object(writer)
    }

    fn end_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_object(writer)
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_object_key(writer, first)
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_object_value(writer)
    }

    fn end_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_object_value(writer)
    }
}
