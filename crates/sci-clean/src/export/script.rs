//! Standalone Python script that replays the export.
//!
//! The script uses only the Python standard library and reproduces the
//! cleaned file byte for byte from the original input. Every constant it
//! embeds is taken from `crate::utils`, so both sides read values the same
//! way.

use crate::confirmation::ConfirmedSchema;
use crate::utils::{
    BOOLEAN_PAIRS, DATE_FORMATS, DATETIME_FORMATS, DateLayout, MISSING_MARKERS, NUMBER_PATTERN,
    WHITESPACE, YEAR_RANGE,
};
use std::fmt::Write;

/// Inputs recorded in the script header.
#[derive(Debug, Clone, Copy)]
pub struct ScriptSource<'a> {
    pub file_name: &'a str,
    pub file_hash: &'a str,
    /// Name the script is saved under, shown in its usage line.
    pub script_name: &'a str,
}

/// Render the cleaning script for a confirmed schema.
pub fn render_script(schema: &ConfirmedSchema, source: ScriptSource<'_>, forward_fill: bool) -> String {
    let mut script = String::with_capacity(4096);

    script.push_str(&format!(
        r#"#!/usr/bin/env python3
"""Reproducible cleaning pipeline generated by sci-clean {version}.

Source file: {file_name}
SHA-256:     {file_hash}

Usage: python3 {script_name} [INPUT] [OUTPUT]
"""
import hashlib
import math
import os
import re
import sys
from datetime import datetime

SOURCE_FILE = {source_literal}
EXPECTED_SHA256 = {hash_literal}
FORWARD_FILL = {forward_fill}

# Confirmed type of every column, in header order.
COLUMN_TYPES = [
"#,
        version = env!("CARGO_PKG_VERSION"),
        file_name = docstring_safe(source.file_name),
        file_hash = source.file_hash,
        script_name = docstring_safe(source.script_name),
        source_literal = py_literal(source.file_name),
        hash_literal = py_literal(source.file_hash),
        forward_fill = if forward_fill { "True" } else { "False" },
    ));

    for (name, data_type) in schema.columns() {
        // writing into a String cannot fail
        let _ = writeln!(script, "    ({}, {}),", py_literal(name), py_literal(data_type.as_str()));
    }
    script.push_str("]\n\n");

    let _ = writeln!(script, "WHITESPACE = {}", py_literal(WHITESPACE));
    let _ = writeln!(script, "MISSING_MARKERS = {{{}}}", py_list(&MISSING_MARKERS));
    let _ = writeln!(script, "NUMBER_RE = re.compile(r\"{NUMBER_PATTERN}\")");
    write_layouts(&mut script, "DATE_LAYOUTS", &DATE_FORMATS);
    write_layouts(&mut script, "DATETIME_LAYOUTS", &DATETIME_FORMATS);
    let _ = writeln!(script, "YEAR_RANGE = ({}, {})", YEAR_RANGE.0, YEAR_RANGE.1);
    let trues: Vec<&str> = BOOLEAN_PAIRS.iter().map(|(yes, _)| *yes).collect();
    let falses: Vec<&str> = BOOLEAN_PAIRS.iter().map(|(_, no)| *no).collect();
    let _ = writeln!(script, "TRUE_WORDS = {{{}}}", py_list(&trues));
    let _ = writeln!(script, "FALSE_WORDS = {{{}}}", py_list(&falses));

    script.push_str(SCRIPT_BODY);
    script
}

/// Emit a list of `(shape, format)` pairs with compiled shapes.
fn write_layouts(script: &mut String, name: &str, layouts: &[DateLayout]) {
    let _ = writeln!(script, "{name} = [");
    for layout in layouts {
        let _ = writeln!(
            script,
            "    (re.compile({}), {}),",
            py_literal(layout.shape),
            py_literal(layout.format)
        );
    }
    script.push_str("]\n");
}

const SCRIPT_BODY: &str = r#"

def strip(cell):
    return cell.strip(WHITESPACE)


def is_missing(cell):
    return strip(cell).lower() in MISSING_MARKERS


def parse_number(token):
    token = strip(token)
    if NUMBER_RE.fullmatch(token) is None:
        return None
    value = float(token)
    return value if math.isfinite(value) else None


def parse_date(cell):
    value = strip(cell)
    if not value:
        return None
    for shape, fmt in DATE_LAYOUTS + DATETIME_LAYOUTS:
        if shape.fullmatch(value) is None:
            continue
        try:
            parsed = datetime.strptime(value, fmt).date()
        except ValueError:
            continue
        return parsed if YEAR_RANGE[0] <= parsed.year <= YEAR_RANGE[1] else None
    return None


def read_table(text):
    lines = [line[:-1] if line.endswith("\r") else line for line in strip(text).split("\n")]
    if len(lines) < 2:
        return [], []
    header = [strip(name) for name in lines[0].split(",")]
    rows = []
    for line in lines[1:]:
        cells = line.split(",")
        cells += [""] * (len(header) - len(cells))
        rows.append(cells[: len(header)])
    return header, rows


def detect_numeric(rows, width):
    return [
        any(not is_missing(row[index]) and parse_number(row[index]) is not None for row in rows)
        for index in range(width)
    ]


def forward_fill(rows, numeric):
    filled = [list(row) for row in rows]
    for index, is_numeric in enumerate(numeric):
        last = None
        for row in filled:
            if is_missing(row[index]):
                if last is not None:
                    row[index] = last
                else:
                    row[index] = "0" if is_numeric else ""
            else:
                row[index] = strip(row[index])
                last = row[index]
    return filled


def coerce(cell, column_type):
    if is_missing(cell):
        return ""
    value = strip(cell)
    if column_type == "NUMERIC":
        token = value.replace(",", "")
        return token if parse_number(token) is not None else ""
    if column_type == "DATE":
        parsed = parse_date(value)
        return parsed.isoformat() if parsed is not None else ""
    if column_type == "BOOLEAN":
        lowered = value.lower()
        if lowered in TRUE_WORDS:
            return "true"
        if lowered in FALSE_WORDS:
            return "false"
        return ""
    return '"' + value + '"' if "," in value else value


def render(header, rows, types):
    if not header:
        return ""
    lines = [",".join(header)]
    for row in rows:
        lines.append(",".join(coerce(cell, kind) for cell, kind in zip(row, types)))
    return "\n".join(lines) + "\n"


def main(argv):
    source = argv[1] if len(argv) > 1 else SOURCE_FILE
    output = argv[2] if len(argv) > 2 else "cleaned_" + os.path.basename(source)

    with open(source, "rb") as handle:
        raw = handle.read()

    digest = hashlib.sha256(raw).hexdigest()
    if digest != EXPECTED_SHA256:
        print(
            "warning: %s has SHA-256 %s, expected %s" % (source, digest, EXPECTED_SHA256),
            file=sys.stderr,
        )

    header, rows = read_table(raw.decode("utf-8", errors="replace"))
    expected_header = [name for name, _ in COLUMN_TYPES]
    if header != expected_header:
        print("error: input header does not match the confirmed columns", file=sys.stderr)
        return 1

    if FORWARD_FILL:
        rows = forward_fill(rows, detect_numeric(rows, len(header)))

    types = [kind for _, kind in COLUMN_TYPES]
    with open(output, "w", encoding="utf-8", newline="") as handle:
        handle.write(render(header, rows, types))

    print("wrote %d rows to %s" % (len(rows), output))
    return 0


if __name__ == "__main__":
    sys.exit(main(sys.argv))
"#;

/// Quote a string as a Python literal.
pub(crate) fn py_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn py_list(values: &[&str]) -> String {
    values
        .iter()
        .map(|value| py_literal(value))
        .collect::<Vec<_>>()
        .join(", ")
}

/// File names land inside a docstring; keep them from closing it.
fn docstring_safe(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace("\"\"\"", "\\\"\\\"\\\"")
        .replace(['\n', '\r'], " ")
}
