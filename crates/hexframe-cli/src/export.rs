//! Report rendering for `hexframe parse`.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use clap::ValueEnum;
use hexframe_core::{FieldValue, Frame, ParseResult, format_hex};

const RULE_WIDTH: usize = 80;
const NAME_WIDTH: usize = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Serialized parse result
    #[default]
    Json,
    /// Human-readable report
    Text,
    /// One row per frame
    Csv,
}

pub fn render(result: &ParseResult, format: ReportFormat, pretty: bool) -> Result<String> {
    match format {
        ReportFormat::Json if pretty => {
            serde_json::to_string_pretty(result).context("JSON serialization failed")
        }
        ReportFormat::Json => serde_json::to_string(result).context("JSON serialization failed"),
        ReportFormat::Text => Ok(render_text(result)),
        ReportFormat::Csv => Ok(render_csv(result)),
    }
}

pub fn render_text(result: &ParseResult) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let mut out = String::new();

    let _ = writeln!(out, "{heavy}\nFrame analysis report\n{heavy}\n");
    let _ = writeln!(out, "Statistics:");
    let _ = writeln!(out, "  Total frames: {}", result.total_frames());
    let _ = writeln!(out, "  Valid frames: {}", result.valid_frames());
    let _ = writeln!(out, "  Error frames: {}", result.error_frames());
    let _ = writeln!(out, "  Total bytes: {}\n", result.total_bytes());
    let _ = writeln!(out, "{heavy}\nFrame details\n{heavy}\n");

    for frame in result.frames() {
        out.push_str(&frame_details(frame));
        let _ = writeln!(out, "\n{light}\n");
    }
    out
}

fn frame_details(frame: &Frame) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let mut lines = vec![
        heavy.clone(),
        format!("  Frame #{}", frame.frame_number()),
        heavy.clone(),
        format!(
            "  Position: {} - {} ({} bytes)",
            frame.start_position(),
            frame.end_position(),
            frame.raw_data().len()
        ),
        String::new(),
        "  Raw data:".to_string(),
        format!("  {}", frame.raw_data_hex()),
        String::new(),
    ];

    if !frame.fields().is_empty() {
        lines.push(light.clone());
        lines.push("  Fields".to_string());
        lines.push(light.clone());
        for field in frame.fields() {
            lines.push(field_line(field.name(), field.value()));
        }
        lines.push(String::new());
    }

    lines.push(light.clone());
    lines.push("  Checksum".to_string());
    lines.push(light.clone());
    match (frame.expected_checksum(), frame.actual_checksum()) {
        (Some(expected), Some(actual)) => {
            lines.push(format!("  Expected: 0x{expected:02X}"));
            lines.push(format!("  Actual:   0x{actual:02X}"));
            lines.push(format!("  Status: {}", frame.checksum_status()));
        }
        _ => lines.push("  (no checksum configured)".to_string()),
    }

    if frame.has_error() {
        lines.push(String::new());
        lines.push(light.clone());
        lines.push("  Error".to_string());
        lines.push(light);
        lines.push(format!("  ! {}", frame.error_message().unwrap_or_default()));
    }

    lines.push(heavy);
    lines.join("\n")
}

fn field_line(name: &str, value: &FieldValue) -> String {
    match value {
        FieldValue::Unsigned(v) => format!("  {name:<NAME_WIDTH$}: {v:<10} (0x{v:X})"),
        FieldValue::Signed(v) => {
            let sign = if *v < 0 { "-" } else { "" };
            format!(
                "  {name:<NAME_WIDTH$}: {v:<10} (0x{sign}{:X})",
                v.unsigned_abs()
            )
        }
        FieldValue::Float(v) => format!("  {name:<NAME_WIDTH$}: {v:.4}"),
        FieldValue::Text(v) => format!("  {name:<NAME_WIDTH$}: {v}"),
        FieldValue::Bytes(bytes) => {
            let hex = format_hex(bytes);
            match printable_ascii(bytes) {
                Some(ascii) => format!("  {name:<NAME_WIDTH$}: {hex:<40} [{ascii}]"),
                None => format!("  {name:<NAME_WIDTH$}: {hex}"),
            }
        }
    }
}

/// ASCII rendering of `bytes` with non-ASCII bytes dropped, when what is
/// left is non-empty and printable.
fn printable_ascii(bytes: &[u8]) -> Option<String> {
    let ascii: String = bytes
        .iter()
        .filter(|b| b.is_ascii())
        .map(|&b| char::from(b))
        .collect();
    let printable = ascii.chars().all(|c| c == ' ' || c.is_ascii_graphic());
    (!ascii.is_empty() && printable).then_some(ascii)
}

pub fn render_csv(result: &ParseResult) -> String {
    let mut out = String::from(
        "frame_number,start_position,end_position,raw_data,fields,checksum_status,error_message\n",
    );
    for frame in result.frames() {
        let error = if frame.has_error() {
            frame.error_message().unwrap_or_default()
        } else {
            ""
        };
        let row = [
            frame.frame_number().to_string(),
            frame.start_position().to_string(),
            frame.end_position().to_string(),
            frame.raw_data_hex(),
            frame.field_summary(),
            frame.checksum_status().to_string(),
            error.to_string(),
        ];
        let row: Vec<_> = row.iter().map(String::as_str).map(csv_cell).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// RFC 4180 cell: quoted when it holds a comma, quote or line break.
fn csv_cell(value: &str) -> String {
    if value.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use hexframe_core::{Parser, default_protocol};

    use super::*;

    fn sample() -> ParseResult {
        Parser::new(default_protocol()).parse("68 01 02 02 41 42 6A 16")
    }

    #[test]
    fn csv_quotes_field_summary() {
        let csv = render_csv(&sample());
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("frame_number,start_position,end_position,raw_data,fields,checksum_status,error_message")
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("1,0,8,68 01 02 02 41 42 6A 16,\"地址=1, 命令=2, 长度=2, 数据=41 42\",Fail,"));
    }

    #[test]
    fn csv_cell_escapes_quotes() {
        assert_eq!(csv_cell("plain"), "plain");
        assert_eq!(csv_cell("a \"b\""), "\"a \"\"b\"\"\"");
    }

    #[test]
    fn text_report_lists_fields_and_checksum() {
        let text = render_text(&sample());
        assert!(text.contains("  Total frames: 1"));
        assert!(text.contains("  Frame #1"));
        assert!(text.contains("(0x2)"));
        assert!(text.contains("[AB]"));
        assert!(text.contains("  Status: Fail"));
        assert!(text.contains("checksum mismatch"));
    }

    #[test]
    fn field_lines_match_value_kind() {
        assert!(field_line("t", &FieldValue::Float(2.5)).ends_with(": 2.5000"));
        assert!(field_line("s", &FieldValue::Signed(-5)).ends_with("(0x-5)"));
        assert!(field_line("b", &FieldValue::Bytes(vec![0x01])).ends_with(": 01"));
    }

    #[test]
    fn json_output_is_parse_result() {
        let json = render(&sample(), ReportFormat::Json, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total_bytes"], 8);
        assert_eq!(value["frames"][0]["raw_data"], "68 01 02 02 41 42 6A 16");
    }
}
