pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Typed input from `--input`, else piped stdin, else an error naming the command.
pub fn load<T: DeserializeOwned>(
    input_path: &Option<String>,
    command: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(ref path) = input_path {
        return file::read_document(path);
    }
    if let Some(data) = stdin::read_stdin()? {
        return Ok(serde_json::from_value(data)?);
    }
    Err(format!("{command}: provide --input <file> or pipe JSON via stdin").into())
}
