//! CLI helpers: mode selection, key parsing and staged output files

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use anyhow::Context;
use tempfile::NamedTempFile;
use crate::StegoResult;

/// Output location used when none is given
pub const DEFAULT_OUTPUT: &str = "out.png";

/// What a run should do, decided by the positional inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Two positionals: hide `payload` inside `image`, writing `output`
    Inject { image: PathBuf, payload: PathBuf, output: PathBuf },
    /// One positional: print the hidden payload of `image`
    Extract { image: PathBuf },
    /// One positional with `--list`: print the chunk table of `image`
    List { image: PathBuf },
}

impl Mode {
    pub fn from_inputs(image: PathBuf, payload: Option<PathBuf>, output: PathBuf, list: bool) -> Self {
        match (payload, list) {
            (Some(payload), _) => Mode::Inject { image, payload, output },
            (None, true) => Mode::List { image },
            (None, false) => Mode::Extract { image },
        }
    }
}

/// Parse an XOR key given as `0x`-prefixed hex or as decimal
pub fn parse_key(s: &str) -> Result<u8, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse::<u8>(),
    };
    parsed.map_err(|_| format!("`{s}` is not a byte value (0-255 or 0x00-0xFF)"))
}

/// Run `write` against a temporary file next to `output`, then move it into
/// place. On failure the temporary file is removed and `output` is untouched.
pub fn write_atomically<T, F>(output: &Path, write: F) -> anyhow::Result<T>
where
    F: FnOnce(&mut BufWriter<&File>) -> StegoResult<T>,
{
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let staged = NamedTempFile::new_in(dir)
        .with_context(|| format!("could not create a temporary file in {}", dir.display()))?;

    let value = {
        let mut writer = BufWriter::new(staged.as_file());
        let value = write(&mut writer)?;
        writer
            .into_inner()
            .map_err(|e| e.into_error())
            .with_context(|| format!("could not flush {}", staged.path().display()))?;
        value
    };

    staged
        .persist(output)
        .with_context(|| format!("could not write {}", output.display()))?;
    Ok(value)
}
