use sha2::{Digest, Sha256};

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

/// Inputs that determine a run's score.
pub struct Context<'a> {
    pub metadata: &'a [u8],
    pub model_outputs: &'a [u8],
    pub answer_format: &'a str,
    pub extraction_regex: Option<&'a str>,
    pub regex_dotall: bool,
}

/// Hash over everything that decides which queries get compared, so a
/// report can be traced back to the exact inputs that produced it.
///
/// Each part is hashed on its own first; that keeps the framing unambiguous
/// without escaping file contents.
pub fn compute(ctx: Context<'_>) -> String {
    let parts = [
        format!("metadata={}", sha256_hex(ctx.metadata)),
        format!("outputs={}", sha256_hex(ctx.model_outputs)),
        format!("answer_format={}", ctx.answer_format),
        format!("extraction_regex={}", ctx.extraction_regex.unwrap_or("")),
        format!("regex_dotall={}", ctx.regex_dotall),
        format!("exacc_version={}", env!("CARGO_PKG_VERSION")),
    ];
    sha256_hex(parts.join("\n").as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(metadata: &'a [u8], outputs: &'a [u8]) -> Context<'a> {
        Context {
            metadata,
            model_outputs: outputs,
            answer_format: "code_block",
            extraction_regex: None,
            regex_dotall: false,
        }
    }

    #[test]
    fn test_stable_for_same_inputs() {
        assert_eq!(compute(ctx(b"m", b"o")), compute(ctx(b"m", b"o")));
    }

    #[test]
    fn test_changes_with_any_input() {
        let base = compute(ctx(b"m", b"o"));
        assert_ne!(base, compute(ctx(b"m2", b"o")));
        assert_ne!(base, compute(ctx(b"m", b"o2")));
        let mut c = ctx(b"m", b"o");
        c.regex_dotall = true;
        assert_ne!(base, compute(c));
    }

    #[test]
    fn test_sha256_hex_known_value() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
