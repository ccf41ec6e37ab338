//! 言語コード。

use std::fmt;

/// ISO 639-2による3文字の言語コード。
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LangCode(pub [u8; 3]);

impl LangCode {
    /// 日本語。
    pub const JPN: LangCode = LangCode(*b"jpn");
    /// 英語。
    pub const ENG: LangCode = LangCode(*b"eng");
}

impl fmt::Debug for LangCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for c in self.0 {
            f.write_str((c as char).encode_utf8(&mut [0; 4]))?;
        }
        Ok(())
    }
}

impl fmt::Display for LangCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lang_code() {
        assert_eq!(LangCode(*b"jpn"), LangCode::JPN);
        assert_eq!(LangCode::JPN.to_string(), "jpn");
    }
}
