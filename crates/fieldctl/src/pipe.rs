//! Line-oriented encode/decode loop.
//!
//! For each input line the filter:
//! 1. Treats `\N` as a null column value and passes it through.
//! 2. Otherwise encodes (plaintext → envelope) or decodes (envelope → plaintext)
//!    through the configured [`FieldAdapter`].
//! 3. Writes one JSON record per line: `{"value": ...}` on success,
//!    `{"code": ..., "message": ...}` on failure.
//!
//! A failing line never stops the loop; the caller inspects [`Summary`].

use std::io::{BufRead, Write};
use std::str::FromStr;

use anyhow::{Context, Result};
use common::protocol::{ErrorRecord, ValueRecord};
use common::CodecError;
use fieldcrypt::{value, FieldAdapter};
use tracing::{debug, info};

/// Literal line that stands for a null column value.
pub const NULL_MARKER: &str = "\\N";

/// Which way values flow through the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Plaintext in, envelope out.
    Encode,
    /// Envelope in, plaintext out.
    Decode,
}

impl FromStr for Direction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "encode" => Ok(Direction::Encode),
            "decode" => Ok(Direction::Decode),
            other => anyhow::bail!("unknown direction {other:?}; expected `encode` or `decode`"),
        }
    }
}

/// Line counts after a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub processed: usize,
    pub failed: usize,
}

/// Process every line of `input`, writing one record per line to `output`.
///
/// # Errors
///
/// Returns an error only on I/O failure; per-line codec errors become
/// error records.
pub fn run<R: BufRead, W: Write>(
    adapter: &FieldAdapter,
    direction: Direction,
    input: R,
    mut output: W,
) -> Result<Summary> {
    let mut summary = Summary::default();

    for (lineno, line) in input.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read input line {}", lineno + 1))?;
        let line = line.strip_suffix('\r').unwrap_or(&line);

        let record = match process_line(adapter, direction, line) {
            Ok(value) => serde_json::to_string(&ValueRecord { value }),
            Err(e) => {
                summary.failed += 1;
                debug!(line = lineno + 1, code = e.code(), "line failed");
                serde_json::to_string(&ErrorRecord::new(e.code(), e.to_string()))
            }
        }
        .context("failed to serialise output record")?;

        writeln!(output, "{record}").context("failed to write output record")?;
        summary.processed += 1;
    }

    output.flush().context("failed to flush output")?;
    info!(
        processed = summary.processed,
        failed = summary.failed,
        ?direction,
        "fieldctl run finished"
    );
    Ok(summary)
}

fn process_line(
    adapter: &FieldAdapter,
    direction: Direction,
    line: &str,
) -> Result<Option<String>, CodecError> {
    let input = (line != NULL_MARKER).then_some(line);
    match direction {
        Direction::Encode => {
            let value = input
                .map(|s| value::parse_exact(adapter.spec().kind, s))
                .transpose()?;
            adapter.on_save(value.as_ref())
        }
        Direction::Decode => Ok(adapter.on_load(input)?.map(|v| v.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Arc;

    use common::{BlockMode, FieldKind, FieldSpec};
    use fieldcrypt::{BlockCipherCodec, CodecConfig};
    use serde_json::Value;

    use super::*;

    fn adapter(spec: FieldSpec) -> FieldAdapter {
        let codec = BlockCipherCodec::new(&CodecConfig::new("fieldctl-pipe-test-secret")).unwrap();
        FieldAdapter::new(spec, Arc::new(codec)).unwrap()
    }

    fn run_lines(adapter: &FieldAdapter, direction: Direction, input: &str) -> (Summary, Vec<Value>) {
        let mut out = Vec::new();
        let summary = run(adapter, direction, Cursor::new(input), &mut out).unwrap();
        let records = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        (summary, records)
    }

    #[test]
    fn direction_parses() {
        assert_eq!("encode".parse::<Direction>().unwrap(), Direction::Encode);
        assert_eq!("decode".parse::<Direction>().unwrap(), Direction::Decode);
        assert!("rotate".parse::<Direction>().is_err());
    }

    #[test]
    fn encode_then_decode_round_trips() {
        let field = adapter(FieldSpec::new(FieldKind::Integer).with_mode(BlockMode::Cbc));
        let (summary, encoded) = run_lines(&field, Direction::Encode, "42\n-9223372036854775808\n\\N\n");
        assert_eq!(summary, Summary { processed: 3, failed: 0 });
        assert!(encoded[0]["value"].as_str().unwrap().starts_with("$AES$MODE_CBC$"));
        assert!(encoded[2]["value"].is_null());

        let envelopes: String = encoded
            .iter()
            .map(|r| format!("{}\n", r["value"].as_str().unwrap_or(NULL_MARKER)))
            .collect();
        let (summary, decoded) = run_lines(&field, Direction::Decode, &envelopes);
        assert_eq!(summary.failed, 0);
        assert_eq!(decoded[0]["value"], "42");
        assert_eq!(decoded[1]["value"], "-9223372036854775808");
        assert!(decoded[2]["value"].is_null());
    }

    #[test]
    fn failures_become_error_records() {
        let field = adapter(FieldSpec::new(FieldKind::Text).with_max_length(5));
        let (summary, records) = run_lines(&field, Direction::Encode, "short\ntoo long!\r\n");
        assert_eq!(summary, Summary { processed: 2, failed: 1 });
        assert!(records[0]["value"].is_string());
        assert_eq!(records[1]["code"], "value_too_long");

        let (summary, records) = run_lines(&field, Direction::Decode, "not an envelope\n");
        assert_eq!(summary.failed, 1);
        assert_eq!(records[0]["code"], "malformed_envelope");
    }

    #[test]
    fn encode_rejects_trailing_garbage() {
        let field = adapter(FieldSpec::new(FieldKind::Date));
        let (summary, records) = run_lines(&field, Direction::Encode, "2024-02-29\n2024-02-29x\n");
        assert_eq!(summary.failed, 1);
        assert_eq!(records[1]["code"], "format_error");
    }

    #[test]
    fn error_records_do_not_echo_plaintext() {
        let field = adapter(FieldSpec::new(FieldKind::UsSsn));
        let (_, records) = run_lines(&field, Direction::Encode, "666-12-3456\n");
        assert_eq!(records[0]["code"], "validation_error");
        assert!(!records[0]["message"].as_str().unwrap().contains("666"));
    }
}
