//! Sphinx `objects.inv` record format.
//!
//! Four header lines are followed by one record per line:
//!
//! ```text
//! # Sphinx inventory version 2
//! # Project: <project>
//! # Version: <version>
//! # The remainder of this file is compressed using zlib.
//! <name> <domain>:<role> <priority> <uri> <dispname>
//! ```
//!
//! The body is zlib-compressed for `application/x-intersphinx` and plain text
//! for `text/x-intersphinx`. A line that is not a record continues the display
//! name of the record before it.

use super::{Codec, RawInventory};
use crate::error::{InventoryError, Result};
use crate::inventory::Inventory;
use crate::item::InventoryItem;
use anyhow::Context;
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use regex::Regex;
use std::io::{BufRead, Read, Write};
use std::path::Path;
use std::sync::LazyLock;

pub(crate) const HEADER_LINE: &str = "# Sphinx inventory version 2";
const PROJECT_PREFIX: &str = "# Project:";
const VERSION_PREFIX: &str = "# Version:";
const EMPTY_MARKER: &str = "# This file is empty";
const COMPRESSED_LINE: &str = "# The remainder of this file is compressed using zlib.";
const PLAIN_LINE: &str = "# The remainder of this file would be compressed using zlib.";

static RECORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<name>.+?)\s+(?P<domain>[^\s:]+):(?P<role>\S+)\s+(?P<priority>-?\d+)\s+(?P<uri>\S*)\s+(?P<dispname>.+)$",
    )
    .expect("valid regex")
});

/// Codec for the Sphinx record format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntersphinxCodec {
    compressed: bool,
}

impl IntersphinxCodec {
    /// Body compressed with zlib, as in Sphinx's `objects.inv`.
    pub const fn compressed() -> Self {
        Self { compressed: true }
    }

    /// Uncompressed body, convenient for reading and diffing.
    pub const fn plain() -> Self {
        Self { compressed: false }
    }
}

impl Codec for IntersphinxCodec {
    fn parse(&self, bytes: &[u8]) -> anyhow::Result<RawInventory> {
        let (lines, body) = split_header(bytes)?;

        if lines[0] != HEADER_LINE {
            return Err(InventoryError::format(format!(
                "Invalid Sphinx header line: {:?}",
                lines[0]
            ))
            .into());
        }
        let project = header_value(lines[1], PROJECT_PREFIX).ok_or_else(|| {
            InventoryError::format(format!("Invalid project line: {:?}", lines[1]))
        })?;
        let version = header_value(lines[2], VERSION_PREFIX).ok_or_else(|| {
            InventoryError::format(format!("Invalid version line: {:?}", lines[2]))
        })?;

        let mut raw = RawInventory {
            project: project.to_string(),
            version: version.to_string(),
            items: Vec::new(),
        };

        if lines[3] == EMPTY_MARKER {
            return Ok(raw);
        }
        if !lines[3].contains("zlib") {
            return Err(InventoryError::format(format!(
                "Invalid compression line: {:?}",
                lines[3]
            ))
            .into());
        }

        let text = if self.compressed {
            let mut text = String::new();
            ZlibDecoder::new(body)
                .read_to_string(&mut text)
                .context("Failed to decompress inventory body")?;
            text
        } else {
            std::str::from_utf8(body)
                .context("Inventory body is not valid UTF-8")?
                .to_string()
        };

        raw.items = parse_records(&text)?;
        Ok(raw)
    }

    fn render(&self, inventory: &Inventory) -> anyhow::Result<Vec<u8>> {
        for (label, value) in [
            ("project", inventory.project()),
            ("version", inventory.version()),
        ] {
            if value.contains(['\n', '\r']) {
                return Err(InventoryError::argument(format!(
                    "Inventory {} {:?} must be a single line",
                    label, value
                ))
                .into());
            }
        }

        let mut out = Vec::new();
        writeln!(out, "{}", HEADER_LINE)?;
        writeln!(out, "{} {}", PROJECT_PREFIX, inventory.project())?;
        writeln!(out, "{} {}", VERSION_PREFIX, inventory.version())?;
        writeln!(
            out,
            "{}",
            if self.compressed { COMPRESSED_LINE } else { PLAIN_LINE }
        )?;

        let body = render_records(inventory.items());
        if self.compressed {
            let mut encoder = ZlibEncoder::new(out, Compression::default());
            encoder
                .write_all(body.as_bytes())
                .context("Failed to compress inventory body")?;
            out = encoder.finish().context("Failed to finish zlib stream")?;
        } else {
            out.extend_from_slice(body.as_bytes());
        }
        Ok(out)
    }
}

/// Split off the four header lines. Missing lines come back empty so the
/// header checks report them.
fn split_header(bytes: &[u8]) -> anyhow::Result<([&str; 4], &[u8])> {
    let mut lines = [""; 4];
    let mut rest = bytes;
    for line in &mut lines {
        let (head, tail) = match rest.iter().position(|&b| b == b'\n') {
            Some(index) => (&rest[..index], &rest[index + 1..]),
            None => (rest, &rest[rest.len()..]),
        };
        *line = std::str::from_utf8(head)
            .context("Inventory header is not valid UTF-8")?
            .trim_end_matches('\r');
        rest = tail;
    }
    Ok((lines, rest))
}

fn header_value<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let value = line.strip_prefix(prefix)?;
    Some(value.strip_prefix(' ').unwrap_or(value))
}

/// One record while its display name may still grow.
struct Record<'a> {
    line: &'a str,
    name: &'a str,
    domain: &'a str,
    role: &'a str,
    priority: &'a str,
    uri: &'a str,
    dispname: String,
}

fn parse_records(text: &str) -> Result<Vec<InventoryItem>> {
    let mut records: Vec<Record<'_>> = Vec::new();

    for line in text.trim_end_matches(['\n', '\r']).split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if let Some(captures) = RECORD.captures(line) {
            records.push(Record {
                line,
                name: group(&captures, "name"),
                domain: group(&captures, "domain"),
                role: group(&captures, "role"),
                priority: group(&captures, "priority"),
                uri: group(&captures, "uri"),
                dispname: group(&captures, "dispname").to_string(),
            });
        } else if let Some(last) = records.last_mut() {
            last.dispname.push('\n');
            last.dispname.push_str(line);
        } else if line.trim().is_empty() {
            continue;
        } else {
            return Err(InventoryError::format(format!(
                "Unexpected line in inventory body (no preceding record): {:?}",
                line
            )));
        }
    }

    records
        .into_iter()
        .map(|record| {
            let priority = record.priority.parse::<i32>().map_err(|e| {
                InventoryError::format(format!(
                    "Invalid priority in record {:?}: {}",
                    record.line, e
                ))
            })?;
            InventoryItem::new(
                record.name,
                record.domain,
                record.role,
                priority,
                record.uri,
                record.dispname,
            )
            .map_err(|e| {
                InventoryError::format(format!("Invalid record {:?}: {}", record.line, e))
            })
        })
        .collect()
}

fn group<'h>(captures: &regex::Captures<'h>, name: &str) -> &'h str {
    captures.name(name).map_or("", |m| m.as_str())
}

fn render_records(items: &[InventoryItem]) -> String {
    let mut body = String::new();
    for item in items {
        body.push_str(&format!(
            "{} {}:{} {} {} {}\n",
            item.name(),
            item.domain(),
            item.role(),
            item.priority(),
            item.stored_uri(),
            item.stored_dispname()
        ));
    }
    body
}

/// Copy an inventory file, replacing the project and/or version header lines.
///
/// Everything after the third line is copied byte for byte, so a compressed
/// body is never decoded.
pub(crate) fn rewrite_header<R: BufRead, W: Write>(
    mut reader: R,
    mut writer: W,
    project: Option<&str>,
    version: Option<&str>,
    path: &Path,
) -> Result<()> {
    let io_error = |e| InventoryError::io(path, e);
    let mut line = Vec::new();

    for (index, (prefix, replacement)) in [
        ("", None),
        (PROJECT_PREFIX, project),
        (VERSION_PREFIX, version),
    ]
    .into_iter()
    .enumerate()
    {
        line.clear();
        reader.read_until(b'\n', &mut line).map_err(io_error)?;
        let text = String::from_utf8_lossy(&line);
        let content = text.trim_end_matches(['\n', '\r']);

        let valid = if index == 0 {
            content == HEADER_LINE
        } else {
            content.starts_with(prefix)
        };
        if !valid {
            let kind = ["Sphinx header", "project", "version"][index];
            return Err(InventoryError::format(format!(
                "Invalid {} line in {}: {:?}",
                kind,
                path.display(),
                content
            )));
        }

        match replacement {
            Some(value) => {
                let ending = &text[content.len()..];
                let ending = if ending.is_empty() { "\n" } else { ending };
                write!(writer, "{} {}{}", prefix, value, ending).map_err(io_error)?;
            }
            None => writer.write_all(&line).map_err(io_error)?,
        }
    }

    std::io::copy(&mut reader, &mut writer).map_err(io_error)?;
    writer.flush().map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};
    use rstest::rstest;

    fn plain(body: &str) -> String {
        format!(
            "{}\n# Project: Demo\n# Version: 1.0\n{}\n{}",
            HEADER_LINE, PLAIN_LINE, body
        )
    }

    fn parse_plain(text: &str) -> Result<RawInventory> {
        IntersphinxCodec::plain()
            .parse(text.as_bytes())
            .map_err(|e| InventoryError::from_codec(e, "test"))
    }

    #[test]
    fn parses_records() {
        let raw = parse_plain(&plain(
            "demo.run py:function 1 api.html#$ -\n\
             Getting-Started std:label -1 start.html Getting Started\n",
        ))
        .unwrap();
        check!(raw.project == "Demo");
        check!(raw.version == "1.0");
        check!(raw.items.len() == 2);
        check!(raw.items[0].uri("") == "api.html#demo.run");
        check!(raw.items[1].dispname() == "Getting Started");
        check!(raw.items[1].priority() == -1);
    }

    #[test]
    fn continuation_lines_extend_dispname() {
        let raw = parse_plain(&plain("demo.run py:function 1 api.html#$ First line\nsecond line\n"))
            .unwrap();
        check!(raw.items.len() == 1);
        check!(raw.items[0].dispname() == "First line\nsecond line");
    }

    #[test]
    fn orphaned_continuation_is_format_error() {
        let_assert!(Err(err) = parse_plain(&plain("not a record\n")));
        check!(err.is_format());
        check!(err.to_string().contains("not a record"));
    }

    #[test]
    fn crlf_line_endings() {
        let text = plain("demo.run py:function 1 api.html#$ -\n").replace('\n', "\r\n");
        let raw = parse_plain(&text).unwrap();
        check!(raw.project == "Demo");
        check!(raw.items[0].stored_dispname() == "-");
    }

    #[rstest]
    #[case("# Sphinx inventory version 1\n# Project: x\n# Version: 1\n# zlib\n", "Invalid Sphinx header line")]
    #[case("", "Invalid Sphinx header line")]
    #[case("# Sphinx inventory version 2\nProject: x\n# Version: 1\n# zlib\n", "Invalid project line")]
    #[case("# Sphinx inventory version 2\n# Project: x\n# Release: 1\n# zlib\n", "Invalid version line")]
    #[case("# Sphinx inventory version 2\n# Project: x\n# Version: 1\n# gzip\n", "Invalid compression line")]
    #[case("# Sphinx inventory version 2\n# Project: x\n# Version: 1\n", "Invalid compression line")]
    fn header_errors(#[case] text: &str, #[case] message: &str) {
        let_assert!(Err(err) = parse_plain(text));
        check!(err.is_format());
        check!(err.to_string().contains(message));
    }

    #[test]
    fn empty_marker_means_no_items() {
        let text = format!("{}\n# Project: x\n# Version: \n{}", HEADER_LINE, EMPTY_MARKER);
        let raw = parse_plain(&text).unwrap();
        check!(raw.project == "x");
        check!(raw.version.is_empty());
        check!(raw.items.is_empty());
    }

    #[test]
    fn invalid_record_fields_are_format_errors() {
        let_assert!(Err(err) = parse_plain(&plain("#hidden py:function 1 api.html -\n")));
        check!(err.is_format());
    }

    #[test]
    fn zlib_body_round_trip() {
        let mut inventory = Inventory::new("Demo").with_version("2.1");
        inventory.push(InventoryItem::from_spec(":py:function:`demo.run`", "api.html#demo.run").unwrap());
        inventory.push(InventoryItem::from_spec("Getting Started", "start.html").unwrap());

        let codec = IntersphinxCodec::compressed();
        let bytes = codec.render(&inventory).unwrap();
        check!(bytes.starts_with(format!("{}\n# Project: Demo\n# Version: 2.1\n", HEADER_LINE).as_bytes()));

        let raw = codec.parse(&bytes).unwrap();
        check!(raw.project == "Demo");
        check!(raw.version == "2.1");
        check!(raw.items == inventory.items());
    }

    #[test]
    fn corrupt_zlib_body_is_format_error() {
        let text = format!("{}\n# Project: x\n# Version: 1\n{}\nnot zlib", HEADER_LINE, COMPRESSED_LINE);
        let_assert!(Err(err) = IntersphinxCodec::compressed().parse(text.as_bytes()));
        check!(InventoryError::from_codec(err, "objects.inv").is_format());
    }

    #[test]
    fn multiline_project_cannot_be_rendered() {
        let inventory = Inventory::new("two\nlines");
        let_assert!(Err(err) = IntersphinxCodec::plain().render(&inventory));
        check!(InventoryError::from_codec(err, "x").is_argument());
    }

    #[test]
    fn rewrite_header_keeps_body_bytes() {
        let head = format!("{}\n# Project: Old\n# Version: 0.1\n", HEADER_LINE);
        let mut tail = format!("{}\n", COMPRESSED_LINE).into_bytes();
        tail.extend_from_slice(&[0x78, 0x9c, 0xff, 0x00, b'\n', 0x01]);
        let input = [head.as_bytes(), &tail[..]].concat();

        let mut output = Vec::new();
        rewrite_header(&input[..], &mut output, Some("New"), None, Path::new("objects.inv")).unwrap();

        let expected = [
            format!("{}\n# Project: New\n# Version: 0.1\n", HEADER_LINE).as_bytes(),
            &tail[..],
        ]
        .concat();
        check!(output == expected);
    }

    #[test]
    fn rewrite_header_rejects_foreign_files() {
        let mut output = Vec::new();
        let_assert!(
            Err(err) = rewrite_header(&b"# DocInventory version 1\n"[..], &mut output, Some("x"), None, Path::new("x.toml"))
        );
        check!(err.is_format());
    }
}
