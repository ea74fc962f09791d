//! On-disk line framing.

use std::collections::HashMap;
use tracing::debug;

/// Checksum (8 hex digits) plus one space.
pub(crate) const FRAME_OVERHEAD: usize = 9;

/// Frames `text` as `<crc32 hex> <text>\n`.
pub(crate) fn frame(text: &str) -> Vec<u8> {
    let crc = crc32fast::hash(text.as_bytes());
    let mut line = Vec::with_capacity(FRAME_OVERHEAD + text.len() + 1);
    line.extend_from_slice(format!("{crc:08x} ").as_bytes());
    line.extend_from_slice(text.as_bytes());
    line.push(b'\n');
    line
}

/// Parses the longest run of valid lines at the start of `bytes`.
///
/// Returns the decoded texts and the number of bytes they occupy. Parsing
/// stops at the first torn, oversized or corrupt line.
pub(crate) fn parse_prefix(bytes: &[u8], line_max: usize) -> (Vec<String>, usize) {
    let mut lines = Vec::new();
    let mut consumed = 0;

    while consumed < bytes.len() {
        let rest = &bytes[consumed..];
        let Some(newline) = rest.iter().position(|&b| b == b'\n') else {
            debug!(offset = consumed, "torn line at end of replica");
            break;
        };
        match parse_line(&rest[..newline], line_max) {
            Some(text) => {
                lines.push(text);
                consumed += newline + 1;
            }
            None => {
                debug!(offset = consumed, "corrupt line in replica");
                break;
            }
        }
    }

    (lines, consumed)
}

/// Merges the valid lines of several replicas.
///
/// The first list is kept as is. Lines the merged result lacks are
/// appended from each following list in order; repeated texts are matched
/// by count, so a line held by two replicas appears once.
pub(crate) fn merge_lines(replicas: &[&[String]]) -> Vec<String> {
    let Some((first, rest)) = replicas.split_first() else {
        return Vec::new();
    };
    let mut merged = first.to_vec();

    for lines in rest {
        let extra: Vec<String> = {
            let mut counts: HashMap<&str, usize> = HashMap::new();
            for line in &merged {
                *counts.entry(line.as_str()).or_default() += 1;
            }
            lines
                .iter()
                .filter(|line| match counts.get_mut(line.as_str()) {
                    Some(n) if *n > 0 => {
                        *n -= 1;
                        false
                    }
                    _ => true,
                })
                .cloned()
                .collect()
        };
        merged.extend(extra);
    }

    merged
}

fn parse_line(line: &[u8], line_max: usize) -> Option<String> {
    if line.len() < FRAME_OVERHEAD || line.len() - FRAME_OVERHEAD > line_max {
        return None;
    }
    let (header, text) = line.split_at(FRAME_OVERHEAD);
    if header[8] != b' ' || !header[..8].iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    let expected = u32::from_str_radix(std::str::from_utf8(&header[..8]).ok()?, 16).ok()?;
    if crc32fast::hash(text) != expected {
        return None;
    }
    String::from_utf8(text.to_vec()).ok()
}
