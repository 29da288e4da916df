//! Line-oriented extraction of dotted-quad address tokens from text sources.
//!
//! A token is four groups of one to three decimal digits separated by dots, bounded on both
//! sides by a word boundary. Digits and word boundaries follow Unicode rules, and octet
//! values are not range checked, so `999.1.1.1` is accepted. Lines without a token are
//! skipped and only the first token of a line is taken.
//!
//! Lines end at `\n`, `\r` or `\r\n`. Bytes that are not valid UTF-8 are dropped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::{Error, Result};

lazy_static! {
    static ref ADDRESS: Regex =
        Regex::new(r"\b\d{1,3}(?:\.\d{1,3}){3}\b").expect("address pattern is valid");
}

/// Return the first address token of `line`
pub fn extract_address(line: &str) -> Option<&str> {
    ADDRESS.find(line).map(|m| m.as_str())
}

/// Read `reader` line by line and collect the first address token of every line.
pub fn read_addresses<R: BufRead>(mut reader: R) -> std::io::Result<Vec<String>> {
    let mut addresses = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        // `\r` and `\n` never occur inside a multi-byte sequence
        for line in buf.split(|&b| b == b'\r') {
            let line: String = line.utf8_chunks().map(|chunk| chunk.valid()).collect();
            if let Some(address) = extract_address(&line) {
                addresses.push(address.to_owned());
            }
        }
    }
    Ok(addresses)
}

/// Load address tokens from the file at `path`
pub fn try_load_addresses<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let unavailable = |source| Error::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(unavailable)?;
    let addresses = read_addresses(BufReader::new(file)).map_err(unavailable)?;
    debug!(path = %path.display(), addresses = addresses.len(), "loaded addresses");
    Ok(addresses)
}

/// Load address tokens from the file at `path`, returning nothing when it cannot be read
pub fn load_addresses<P: AsRef<Path>>(path: P) -> Vec<String> {
    try_load_addresses(path).unwrap_or_else(|e| {
        warn!(error = %e, "address source unavailable");
        Vec::new()
    })
}
