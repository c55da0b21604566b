use sha2::{Digest, Sha256};

/// Lowercases, collapses every whitespace run (spaces, tabs, newlines)
/// to a single space and trims. Idempotent.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        for c in word.chars() {
            out.extend(c.to_lowercase());
        }
    }
    out
}

pub fn sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Fingerprint of the normalized form: two texts share a fingerprint
/// iff their normalized forms match byte-for-byte. Used for single
/// lines and for whole blocks alike.
pub fn fingerprint(text: &str) -> String {
    sha256_hex(&normalize(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_whitespace_and_case() {
        assert_eq!(normalize("  Hello\t\tWorld \n"), "hello world");
        assert_eq!(normalize("A\nB\nC"), "a b c");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \t \n "), "");
    }

    #[test]
    fn normalize_is_idempotent() {
        for s in ["  MiXeD   Case \n text ", "", "single", "a  b\tc"] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn fingerprints_match_iff_normalized_forms_match() {
        assert_eq!(fingerprint("Hello  World"), fingerprint("hello world"));
        assert_eq!(fingerprint("\tfoo bar\n"), fingerprint("FOO   BAR"));
        assert_ne!(fingerprint("foo bar"), fingerprint("foo baz"));
    }

    #[test]
    fn sha256_hex_is_stable() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
