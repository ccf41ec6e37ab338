//! PSI用のモジュール。

use thiserror::Error;

use crate::utils::BytesExt;

pub mod desc;
pub mod table;

/// [`PsiSection::parse`]で発生するエラー。
///
/// セクション長が確定したあとで発生するエラーにはセクション長が付随する。
#[derive(Debug, Error)]
pub enum PsiError {
    /// PSIセクションの長さが足りない。
    #[error("insufficient length of a PSI section")]
    InsufficientLength,

    /// PSIの終端に到達した。
    #[error("reached to end of PSI sections")]
    EndOfPsi,

    /// PSIセクションに最低限必要なバイト数がなく、壊れたセクションである。
    ///
    /// 内包する`usize`にはPSIのセクション長が入る。
    #[error("corrupt section")]
    Corrupted(usize),

    /// PSIセクションのCRC32が一致しない。
    ///
    /// 内包する`usize`にはPSIのセクション長が入る。
    #[error("crc32 error")]
    Crc32(usize),
}

/// PSIのセクション。
#[derive(Debug)]
pub struct PsiSection<'a> {
    /// テーブル識別。
    pub table_id: u8,
    /// セクションシンタクス。
    pub syntax: Option<PsiSectionSyntax>,
    /// PSIのデータ。
    pub data: &'a [u8],
    /// CRC。
    pub crc32: u32,
}

/// PSIセクションのシンタクス。
#[derive(Debug)]
pub struct PsiSectionSyntax {
    /// テーブル識別拡張。
    pub table_id_extension: u16,
    /// バージョン番号（5ビット）。
    pub version_number: u8,
    /// カレントネクスト指示。
    pub current_next_indicator: bool,
    /// セクション番号。
    pub section_number: u8,
    /// 最終セクション番号。
    pub last_section_number: u8,
}

impl<'a> PsiSection<'a> {
    /// PSIセクションをパースし、[`PsiSection`]とセクション長を返す。
    pub fn parse(buf: &'a [u8]) -> Result<(PsiSection<'a>, usize), PsiError> {
        if buf.len() < 3 {
            return Err(PsiError::InsufficientLength);
        }

        let table_id = buf[0];
        if table_id == 0xFF {
            // スタッフィングバイト
            return Err(PsiError::EndOfPsi);
        }
        let section_syntax_indicator = buf[1] & 0b10000000 != 0;
        let section_length = buf[1..=2].read_be_16() & 0b0000_1111_1111_1111;

        let Some(psi) = buf.get(..3 + section_length as usize) else {
            return Err(PsiError::InsufficientLength);
        };

        if !crate::crc32::calc(psi) {
            return Err(PsiError::Crc32(psi.len()));
        }

        let (syntax, data) = if section_syntax_indicator {
            if psi.len() < 3 + 4 + 5 {
                return Err(PsiError::Corrupted(psi.len()));
            }

            let table_id_extension = psi[3..=4].read_be_16();
            let version_number = (psi[5] & 0b00111110) >> 1;
            let current_next_indicator = psi[5] & 0b00000001 != 0;
            let section_number = psi[6];
            let last_section_number = psi[7];

            let ss = PsiSectionSyntax {
                table_id_extension,
                version_number,
                current_next_indicator,
                section_number,
                last_section_number,
            };
            (Some(ss), &psi[8..psi.len() - 4])
        } else {
            if psi.len() < 3 + 4 {
                return Err(PsiError::Corrupted(psi.len()));
            }

            (None, &psi[3..psi.len() - 4])
        };

        let crc32 = psi[psi.len() - 4..].read_be_32();

        Ok((
            PsiSection {
                table_id,
                syntax,
                data,
                crc32,
            },
            psi.len(),
        ))
    }
}

/// PSIのテーブルを表すトレイト。
pub trait PsiTable<'a>: Sized {
    /// `psi`からテーブルを読み取る。
    ///
    /// 形式が不正な場合は`None`を返す。
    fn read(psi: &PsiSection<'a>) -> Option<Self>;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use assert_matches::assert_matches;

    // セクションシンタクス付きのセクションを構築する
    pub(crate) fn build_section(table_id: u8, extension: u16, number: u8, data: &[u8]) -> Vec<u8> {
        let section_length = 5 + data.len() + 4;
        let mut buf = vec![
            table_id,
            0b10110000 | (section_length >> 8) as u8,
            section_length as u8,
            (extension >> 8) as u8,
            extension as u8,
            0b11000001,
            number,
            number,
        ];
        buf.extend_from_slice(data);
        let crc = crate::crc32::compute(&buf);
        buf.extend_from_slice(&crc.to_be_bytes());
        buf
    }

    #[test]
    fn test_psi_parse() {
        let buf = build_section(0x42, 0x1234, 2, &[0xAA, 0xBB]);

        let (psi, len) = PsiSection::parse(&buf).unwrap();
        assert_eq!(len, buf.len());
        assert_eq!(psi.table_id, 0x42);
        assert_eq!(psi.data, &[0xAA, 0xBB]);

        let syntax = psi.syntax.unwrap();
        assert_eq!(syntax.table_id_extension, 0x1234);
        assert_eq!(syntax.version_number, 0);
        assert!(syntax.current_next_indicator);
        assert_eq!(syntax.section_number, 2);
        assert_eq!(syntax.last_section_number, 2);
    }

    #[test]
    fn test_psi_parse_err() {
        assert_matches!(PsiSection::parse(&[]), Err(PsiError::InsufficientLength));
        assert_matches!(
            PsiSection::parse(&[0x00, 0xB0]),
            Err(PsiError::InsufficientLength)
        );
        assert_matches!(PsiSection::parse(&[0xFF; 10]), Err(PsiError::EndOfPsi));

        let buf = build_section(0x42, 0x1234, 0, &[0xAA, 0xBB]);
        // 完全なセクションに届かない
        assert_matches!(
            PsiSection::parse(&buf[..buf.len() - 1]),
            Err(PsiError::InsufficientLength)
        );

        // 1ビットでも壊れていればCRC32エラー
        let mut broken = buf.clone();
        broken[5] ^= 0x02;
        assert_matches!(
            PsiSection::parse(&broken),
            Err(PsiError::Crc32(len)) if len == buf.len()
        );
    }

    #[test]
    fn test_psi_parse_idempotent() {
        let buf = build_section(0x4E, 0x0001, 0, &[0x12, 0x34, 0x56]);

        let (psi1, len1) = PsiSection::parse(&buf).unwrap();
        let (psi2, len2) = PsiSection::parse(&buf).unwrap();
        assert_eq!(len1, len2);
        assert_eq!(psi1.table_id, psi2.table_id);
        assert_eq!(psi1.data, psi2.data);
        assert_eq!(psi1.crc32, psi2.crc32);
    }
}
