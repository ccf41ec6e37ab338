//! ARIB STD-B24の8単位符号。

use std::fmt;

/// 8単位符号の文字列。
#[derive(PartialEq, Eq)]
#[repr(transparent)]
pub struct AribStr([u8]);

impl AribStr {
    /// `bytes`を8単位符号の文字列として扱う`AribStr`を生成する。
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> &AribStr {
        // Safety: repr(transparent)なため[u8]と同一表現
        unsafe { &*(bytes as *const [u8] as *const AribStr) }
    }

    /// 内包するバイト列を返す。
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// バイト列の長さを返す。
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// バイト列が空かどうかを返す。
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 字幕・番組情報向けの初期状態で8単位符号を復号して`String`を返す。
    ///
    /// 2バイト漢字系集合はEUC-JPを介して変換する。表示制御の類は読み飛ばし、
    /// 改行指示（APR・APS）は改行として出力する。DRCS等の変換できない文字は
    /// U+FFFDで置き換える。
    pub fn to_string(&self) -> String {
        Decoder::new(&self.0).decode()
    }
}

impl fmt::Debug for AribStr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&self.to_string(), f)
    }
}

/// 符号集合。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Charset {
    /// 2バイト漢字系集合（追加記号を含む）。
    Kanji,
    /// 英数集合。
    Alnum,
    /// 平仮名集合。
    Hiragana,
    /// 片仮名集合。
    Katakana,
    /// モザイク集合。
    Mosaic,
    /// DRCSなど変換できない集合。
    Drcs,
}

/// 8単位符号の復号器。
struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
    /// G0～G3に指示された集合。
    g: [Charset; 4],
    /// GL領域に呼び出された集合の番号。
    gl: usize,
    /// GR領域に呼び出された集合の番号。
    gr: usize,
    /// シングルシフト中の集合の番号。
    single: Option<usize>,
    buf: String,
}

impl<'a> Decoder<'a> {
    fn new(data: &'a [u8]) -> Decoder<'a> {
        // 字幕・番組情報の初期状態（ARIB TR-B14による）
        Decoder {
            data,
            pos: 0,
            g: [
                Charset::Kanji,
                Charset::Alnum,
                Charset::Hiragana,
                Charset::Katakana,
            ],
            gl: 0,
            gr: 2,
            single: None,
            buf: String::new(),
        }
    }

    fn next_byte(&mut self) -> Option<u8> {
        let b = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    fn skip(&mut self, n: usize) {
        self.pos = usize::min(self.pos + n, self.data.len());
    }

    fn decode(mut self) -> String {
        while let Some(b) = self.next_byte() {
            match b {
                // SP
                0x20 | 0xA0 => self.buf.push(' '),
                // APR
                0x0D => self.buf.push('\n'),
                // APS（パラメーター2バイト）も改行扱い
                0x1C => {
                    self.skip(2);
                    if !self.buf.is_empty() {
                        self.buf.push('\n');
                    }
                }
                // PAPF
                0x16 => self.skip(1),
                // LS1・LS0
                0x0E => self.gl = 1,
                0x0F => self.gl = 0,
                // SS2・SS3
                0x19 => self.single = Some(2),
                0x1D => self.single = Some(3),
                // ESC
                0x1B => self.escape(),
                // その他のC0制御は無視
                0x00..=0x1F => {}
                0x21..=0x7E => self.graphic(b & 0x7F, false),
                0x7F => {}
                0x80..=0x9F => self.control_c1(b),
                0xA1..=0xFE => self.graphic(b & 0x7F, true),
                0xFF => {}
            }
        }
        self.buf
    }

    /// 図形文字1バイト目を処理する。`c`はGL領域に正規化した値。
    fn graphic(&mut self, c: u8, gr: bool) {
        let idx = if gr {
            self.single = None;
            self.gr
        } else {
            self.single.take().unwrap_or(self.gl)
        };

        match self.g[idx] {
            Charset::Kanji => {
                let Some(c2) = self.next_byte() else {
                    return;
                };
                let c2 = c2 & 0x7F;
                if !(0x21..=0x7E).contains(&c2) {
                    self.buf.push(char::REPLACEMENT_CHARACTER);
                    return;
                }

                // JIS X 0208の区点をEUC-JPとして変換する
                let euc = [c | 0x80, c2 | 0x80];
                let (s, _, had_errors) =
                    encoding_rs::EUC_JP.decode(&euc);
                if had_errors {
                    self.buf.push(char::REPLACEMENT_CHARACTER);
                } else {
                    self.buf.push_str(&s);
                }
            }
            Charset::Alnum => self.buf.push(c as char),
            Charset::Hiragana => self.kana(c, 0x3041, 0x73, HIRAGANA_ITERATION),
            Charset::Katakana => self.kana(c, 0x30A1, 0x76, KATAKANA_ITERATION),
            Charset::Mosaic | Charset::Drcs => self.buf.push(char::REPLACEMENT_CHARACTER),
        }
    }

    /// 仮名集合の文字を出力する。連続部分はUnicodeに平行移動し、
    /// 繰返し記号（0x77・0x78）と末尾の記号類（0x79～0x7E）は表から引く。
    fn kana(&mut self, c: u8, base: u32, max: u8, iteration: [char; 2]) {
        match c {
            0x21..=0x76 if c <= max => {
                // Safety相当の検査はchar::from_u32が行う
                if let Some(ch) = char::from_u32(base + u32::from(c - 0x21)) {
                    self.buf.push(ch);
                }
            }
            0x77 | 0x78 => self.buf.push(iteration[usize::from(c - 0x77)]),
            0x79..=0x7E => self.buf.push(KANA_TAIL[usize::from(c - 0x79)]),
            _ => self.buf.push(char::REPLACEMENT_CHARACTER),
        }
    }

    /// ESCに続く指示シーケンスを解釈する。
    fn escape(&mut self) {
        let Some(b) = self.next_byte() else {
            return;
        };
        match b {
            // 2バイト系集合の指示
            0x24 => {
                let Some(b2) = self.next_byte() else {
                    return;
                };
                match b2 {
                    0x28..=0x2B => self.designate((b2 - 0x28) as usize, true),
                    _ => self.g[0] = Decoder::charset(b2, true, false),
                }
            }
            // 1バイト系集合の指示
            0x28..=0x2B => self.designate((b - 0x28) as usize, false),
            // LS2・LS3
            0x6E => self.gl = 2,
            0x6F => self.gl = 3,
            // LS3R・LS2R・LS1R
            0x7C => self.gr = 3,
            0x7D => self.gr = 2,
            0x7E => self.gr = 1,
            _ => {}
        }
    }

    fn designate(&mut self, idx: usize, multi: bool) {
        let Some(mut f) = self.next_byte() else {
            return;
        };
        // 中間文字0x20はDRCS指示
        let drcs = f == 0x20;
        if drcs {
            let Some(f2) = self.next_byte() else {
                return;
            };
            f = f2;
        }
        self.g[idx] = Decoder::charset(f, multi, drcs);
    }

    fn charset(f: u8, multi: bool, drcs: bool) -> Charset {
        match (multi, drcs, f) {
            // 漢字系集合・JIS互換漢字1面2面・追加記号
            (true, false, 0x42 | 0x39 | 0x3A | 0x3B) => Charset::Kanji,
            (false, false, 0x4A) => Charset::Alnum,
            (false, false, 0x30) => Charset::Hiragana,
            (false, false, 0x31) => Charset::Katakana,
            (false, false, 0x32..=0x35) => Charset::Mosaic,
            _ => Charset::Drcs,
        }
    }

    /// C1制御符号を読み飛ばす。
    fn control_c1(&mut self, b: u8) {
        match b {
            // SZX・FLC・POL・WMM・HLC・RPC（パラメーター1バイト）
            0x8B | 0x91 | 0x93 | 0x94 | 0x97 | 0x98 => self.skip(1),
            // COL・CDC・TIME（先頭パラメーターが0x20の場合もう1バイト続く）
            0x90 | 0x92 | 0x9D => {
                if self.next_byte() == Some(0x20) {
                    self.skip(1);
                }
            }
            // CSI（終端文字まで読み飛ばす）
            0x9B => while let Some(b) = self.next_byte() {
                if (0x40..=0x6F).contains(&b) {
                    break;
                }
            },
            // MACRO（終了シーケンスESC 0x4Fまで読み飛ばす）
            0x95 => while let Some(b) = self.next_byte() {
                if b == 0x1B && self.next_byte() == Some(0x4F) {
                    break;
                }
            },
            _ => {}
        }
    }
}

/// 平仮名集合0x77・0x78の繰返し記号。
const HIRAGANA_ITERATION: [char; 2] = ['ゝ', 'ゞ'];
/// 片仮名集合0x77・0x78の繰返し記号。
const KATAKANA_ITERATION: [char; 2] = ['ヽ', 'ヾ'];
/// 仮名集合共通の0x79～0x7Eの記号。
const KANA_TAIL: [char; 6] = ['ー', '。', '「', '」', '、', '・'];

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(data: &[u8]) -> String {
        AribStr::from_bytes(data).to_string()
    }

    #[test]
    fn test_decode_kanji() {
        // JIS X 0208の30区21点＝「亜」
        assert_eq!(decode(&[0x30, 0x21]), "亜");
        // 「天気」
        assert_eq!(decode(&[0x45, 0x37, 0x35, 0x24]), "天気");
    }

    #[test]
    fn test_decode_kana() {
        // GRには初期状態で平仮名集合
        assert_eq!(decode(&[0xA2, 0xF3]), "あん");
        // SS3で片仮名集合
        assert_eq!(decode(&[0x1D, 0x22, 0x1D, 0x73]), "アン");
        // 長音・句読点・括弧・中点
        assert_eq!(decode(&[0xF9]), "ー");
        assert_eq!(decode(&[0xFA, 0xFD]), "。、");
        assert_eq!(decode(&[0xFB, 0xFC]), "「」");
        assert_eq!(decode(&[0xFE]), "・");
        // 繰返し記号は集合ごとに異なる
        assert_eq!(decode(&[0xF7, 0xF8]), "ゝゞ");
        assert_eq!(decode(&[0x1D, 0x77, 0x1D, 0x78]), "ヽヾ");
        // 片仮名集合は0x76の「ヶ」まで連続する
        assert_eq!(decode(&[0x1D, 0x76]), "ヶ");
    }

    #[test]
    fn test_decode_alnum() {
        // LS1で英数集合
        assert_eq!(decode(&[0x0E, 0x41, 0x42, 0x43]), "ABC");
        // 指示でG0を英数集合に変更
        assert_eq!(decode(&[0x1B, 0x28, 0x4A, 0x61, 0x62]), "ab");
    }

    #[test]
    fn test_decode_controls() {
        // APRは改行
        assert_eq!(decode(&[0x30, 0x21, 0x0D, 0x30, 0x21]), "亜\n亜");
        // APSはパラメーターを読み飛ばして改行（先頭では無視）
        assert_eq!(decode(&[0x1C, 0x10, 0x20, 0x30, 0x21]), "亜");
        assert_eq!(decode(&[0x30, 0x21, 0x1C, 0x10, 0x20, 0x30, 0x21]), "亜\n亜");
        // 空白
        assert_eq!(decode(&[0x20]), " ");
        // C1制御（SSZなどパラメーターなし）は無視
        assert_eq!(decode(&[0x88, 0x30, 0x21]), "亜");
        // RPCはパラメーターを1バイト取る
        assert_eq!(decode(&[0x98, 0x30, 0x30, 0x21]), "亜");
        // CSIは終端文字まで読み飛ばす
        assert_eq!(decode(&[0x9B, 0x33, 0x32, 0x3B, 0x53, 0x30, 0x21]), "亜");
    }

    #[test]
    fn test_decode_drcs() {
        // DRCS指示後の文字は置換される
        assert_eq!(decode(&[0x1B, 0x28, 0x20, 0x41, 0x21]), "\u{FFFD}");
    }

    #[test]
    fn test_decode_idempotent() {
        let data = [0x45, 0x37, 0x35, 0x24, 0x0D, 0xA2, 0xF3];
        assert_eq!(decode(&data), decode(&data));
        assert_eq!(decode(&data), "天気\nあん");
    }

    #[test]
    fn test_empty() {
        let s = AribStr::from_bytes(b"");
        assert!(s.is_empty());
        assert_eq!(s.len(), 0);
        assert_eq!(s.to_string(), "");
    }
}
