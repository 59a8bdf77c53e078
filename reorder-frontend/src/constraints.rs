use std::path::Path;

use reorder_utils::{Error, ReorderResult};

/// Parses one line of a constraints file: a bit string of length `k`
/// (number of chunks). `1` => reorderable, `0` => frozen.
pub fn parse_constraints_line(line: &str, k: usize) -> ReorderResult<Vec<bool>> {
    let line = line.trim();
    if line.len() != k {
        return Err(Error::malformed_input(format!(
            "constraints line has {} chars, expected {k} (one per chunk)",
            line.len()
        )));
    }
    line.chars()
        .map(|c| match c {
            '1' => Ok(true),
            '0' => Ok(false),
            other => Err(Error::malformed_input(format!(
                "constraints line contains non-bit character '{other}'"
            ))),
        })
        .collect()
}

pub fn load_constraints_file(path: &Path) -> ReorderResult<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(text.lines().map(str::to_string).collect())
}
