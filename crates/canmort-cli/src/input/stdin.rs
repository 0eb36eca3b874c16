use serde_json::Value;
use std::io::{self, Read};

use super::file::{parse_document, DocumentFormat};

/// Read a piped JSON (or YAML) document from stdin.
/// Returns None when stdin is a terminal or the pipe is empty.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_piped(&buffer)
}

fn parse_piped(buffer: &str) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let format = if trimmed.starts_with('{') || trimmed.starts_with('[') {
        DocumentFormat::Json
    } else {
        DocumentFormat::Yaml
    };
    Ok(Some(parse_document(trimmed, format)?))
}
