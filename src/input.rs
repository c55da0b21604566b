use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use encoding_rs::WINDOWS_1252;

const SNIFF_LEN: usize = 4096;

/// A NUL byte in the leading window marks the file as binary; anything
/// else gets a text decode attempt.
fn looks_binary(bytes: &[u8]) -> bool {
    bytes.iter().take(SNIFF_LEN).any(|&b| b == 0)
}

/// Loads a file for diffing: refuses binaries, decodes UTF-8 with a
/// Windows-1252 fallback, and folds CRLF and lone CR to LF so the
/// engine only ever sees `\n`.
pub fn read_file_text(path: &Path) -> Result<String> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

    if looks_binary(&bytes) {
        bail!("{} looks like a binary file", path.display());
    }

    let content = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            let (decoded, _, _) = WINDOWS_1252.decode(err.as_bytes());
            decoded.into_owned()
        }
    };

    Ok(content.replace("\r\n", "\n").replace('\r', "\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    #[test]
    fn reads_utf8_and_normalizes_line_endings() {
        let file = write_temp(b"first\r\nsecond\rthird\n");
        let text = read_file_text(file.path()).unwrap();
        assert_eq!(text, "first\nsecond\nthird\n");
    }

    #[test]
    fn falls_back_to_windows_1252() {
        // 0xE9 is 'é' in Windows-1252 and invalid standalone UTF-8.
        let file = write_temp(b"caf\xe9\n");
        let text = read_file_text(file.path()).unwrap();
        assert_eq!(text, "caf\u{e9}\n");
    }

    #[test]
    fn rejects_binary_content() {
        let file = write_temp(b"text\x00more");
        let err = read_file_text(file.path()).unwrap_err();
        assert!(err.to_string().contains("binary"));
    }

    #[test]
    fn missing_file_reports_its_path() {
        let err = read_file_text(Path::new("/no/such/semdiff-input")).unwrap_err();
        assert!(err.to_string().contains("semdiff-input"));
    }
}
