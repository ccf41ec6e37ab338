//! 字幕に関する型。

use std::io;

use crate::eight::AribStr;
use crate::lang::LangCode;
use crate::pes::{IndependentPes, PesUnits};
use crate::pid::Pid;
use crate::psi::desc::{StreamIdDescriptor, StreamType};
use crate::psi::table::Pmt;
use crate::time::Timestamp;
use crate::utils::BytesExt;

/// 字幕のコンポーネントタグ。
pub const COMPONENT_TAG_CAPTION: u8 = 0x87;

/// `pmt`から字幕のPIDを検索する。
///
/// 字幕のストリームが無い場合は`None`を返す。
pub fn find_caption_pid(pmt: &Pmt) -> Option<Pid> {
    pmt.streams
        .iter()
        .filter(|stream| stream.stream_type == StreamType::CAPTION)
        .find(|stream| {
            stream
                .descriptors
                .get::<StreamIdDescriptor>()
                .is_some_and(|desc| desc.component_tag == COMPONENT_TAG_CAPTION)
        })
        .map(|stream| stream.elementary_pid)
}

/// 時刻制御モード。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeControlMode {
    /// フリー。
    Free,
    /// リアルタイム。
    RealTime,
    /// オフセットタイム。
    OffsetTime,
    /// 予約。
    Reserved,
}

impl TimeControlMode {
    fn new(mode: u8) -> TimeControlMode {
        match mode & 0b11 {
            0b00 => TimeControlMode::Free,
            0b01 => TimeControlMode::RealTime,
            0b10 => TimeControlMode::OffsetTime,
            0b11 => TimeControlMode::Reserved,
            _ => unreachable!(),
        }
    }
}

/// 字幕のデータグループ。
#[derive(Debug)]
pub struct DataGroup<'a> {
    /// データグループ識別（6ビット）。
    pub data_group_id: u8,
    /// データグループ版番号（2ビット）。
    pub data_group_version: u8,
    /// データグループリンク番号。
    pub data_group_link_number: u8,
    /// 最終データグループリンク番号。
    pub last_data_group_link_number: u8,
    /// データグループデータ。
    pub data_group_data: &'a [u8],
}

impl<'a> DataGroup<'a> {
    /// 字幕のデータグループを読み取る。
    ///
    /// 形式が不正な場合は`None`を返す。
    pub fn read(data: &'a [u8]) -> Option<DataGroup<'a>> {
        let [b0, link, last_link, len_hi, len_lo, ref rem @ ..] = *data else {
            log::debug!("invalid DataGroup");
            return None;
        };

        let data_group_id = (b0 & 0b11111100) >> 2;
        let data_group_version = b0 & 0b00000011;
        let data_group_size = u16::from_be_bytes([len_hi, len_lo]) as usize;
        let Some(data_group_data) = rem.get(..data_group_size) else {
            log::debug!("invalid DataGroup::data_group_data");
            return None;
        };

        Some(DataGroup {
            data_group_id,
            data_group_version,
            data_group_link_number: link,
            last_data_group_link_number: last_link,
            data_group_data,
        })
    }

    /// このデータグループが字幕管理データかどうかを返す。
    #[inline]
    pub fn is_management(&self) -> bool {
        // 組A・組Bの字幕管理データ
        matches!(self.data_group_id, 0x00 | 0x20)
    }
}

/// 字幕管理データにおける言語の情報。
#[derive(Debug)]
pub struct CaptionLanguage {
    /// 言語識別（3ビット）。
    pub language_tag: u8,
    /// 表示モード（4ビット）。
    pub dmf: u8,
    /// 言語コード。
    pub lang_code: LangCode,
    /// 表示書式（4ビット）。
    pub format: u8,
}

/// 字幕管理データ。
#[derive(Debug)]
pub struct CaptionManagementData<'a> {
    /// 時刻制御モード。
    pub tmd: TimeControlMode,
    /// 言語ごとの情報。
    pub languages: Vec<CaptionLanguage>,
    /// データユニット。
    pub data_units: Vec<DataUnit<'a>>,
}

impl<'a> CaptionManagementData<'a> {
    /// 字幕管理データを読み取る。
    ///
    /// 形式が不正な場合は`None`を返す。
    pub fn read(data: &'a [u8]) -> Option<CaptionManagementData<'a>> {
        let [b0, ref rem @ ..] = *data else {
            log::debug!("invalid CaptionManagementData");
            return None;
        };

        let tmd = TimeControlMode::new((b0 & 0b11000000) >> 6);
        let rem = if tmd == TimeControlMode::OffsetTime {
            // OTM（9桁BCD）
            rem.get(5..)?
        } else {
            rem
        };

        let [num_languages, ref rem @ ..] = *rem else {
            log::debug!("invalid CaptionManagementData::num_languages");
            return None;
        };
        let mut rem = rem;

        let mut languages = Vec::with_capacity(num_languages as usize);
        for _ in 0..num_languages {
            let [b0, l0, l1, l2, b4, ref inner @ ..] = *rem else {
                log::debug!("invalid CaptionLanguage");
                return None;
            };

            let language_tag = (b0 & 0b11100000) >> 5;
            let dmf = b0 & 0b00001111;
            let inner = if matches!(dmf, 0b1100 | 0b1101 | 0b1110) {
                // DC
                inner.get(1..)?
            } else {
                inner
            };

            languages.push(CaptionLanguage {
                language_tag,
                dmf,
                lang_code: LangCode([l0, l1, l2]),
                format: (b4 & 0b11110000) >> 4,
            });
            rem = inner;
        }

        let data_units = DataUnit::read_units(rem)?;
        Some(CaptionManagementData {
            tmd,
            languages,
            data_units,
        })
    }
}

/// 字幕文データ。
#[derive(Debug)]
pub struct CaptionData<'a> {
    /// 時刻制御モード。
    pub tmd: TimeControlMode,
    /// 提示開始時刻（ミリ秒）。
    pub stm: Option<u32>,
    /// データユニット。
    pub data_units: Vec<DataUnit<'a>>,
}

impl<'a> CaptionData<'a> {
    /// 字幕文データを読み取る。
    ///
    /// 形式が不正な場合は`None`を返す。
    pub fn read(data: &'a [u8]) -> Option<CaptionData<'a>> {
        let [b0, ref rem @ ..] = *data else {
            log::debug!("invalid CaptionData");
            return None;
        };

        let tmd = TimeControlMode::new((b0 & 0b11000000) >> 6);
        let (stm, rem) = if matches!(tmd, TimeControlMode::RealTime | TimeControlMode::OffsetTime)
        {
            // STM（9桁BCDのミリ秒）
            let Some((stm, rem)) = rem.split_at_checked(5) else {
                log::debug!("invalid CaptionData::STM");
                return None;
            };
            (Some(stm.read_bcd_milli()), rem)
        } else {
            (None, rem)
        };

        let data_units = DataUnit::read_units(rem)?;
        Some(CaptionData {
            tmd,
            stm,
            data_units,
        })
    }
}

/// 字幕のデータユニット。
#[derive(Debug)]
pub enum DataUnit<'a> {
    /// 本文。
    StatementBody(&'a AribStr),
    /// ジオメトリック。
    Geometric(&'a [u8]),
    /// 1バイトDRCS。
    DrcsSb(&'a [u8]),
    /// 2バイトDRCS。
    DrcsDb(&'a [u8]),
    /// カラーマップ。
    ColorMap(&'a [u8]),
    /// ビットマップ。
    Bitmap(&'a [u8]),
    /// その他のデータユニット。
    Unknown {
        /// データユニットパラメータ。
        data_unit_parameter: u8,
        /// データユニットデータ。
        data_unit_data: &'a [u8],
    },
}

impl<'a> DataUnit<'a> {
    /// 連続するデータユニットを読み取る。
    ///
    /// 形式が不正な場合は`None`を返す。
    pub fn read_units(data: &'a [u8]) -> Option<Vec<DataUnit<'a>>> {
        let [u0, u1, u2, ref rem @ ..] = *data else {
            log::debug!("invalid DataUnit::data_unit_loop_length");
            return None;
        };

        let data_unit_loop_length =
            u32::from_be_bytes([0, u0, u1, u2]) as usize;
        let Some(mut rem) = rem.get(..data_unit_loop_length) else {
            log::debug!("invalid DataUnit::data_unit_loop");
            return None;
        };

        let mut units = Vec::new();
        while !rem.is_empty() {
            let [separator, parameter, s0, s1, s2, ref inner @ ..] = *rem else {
                log::debug!("invalid DataUnit");
                return None;
            };
            if separator != 0x1F {
                log::debug!("invalid DataUnit::unit_separator");
                return None;
            }

            let data_unit_size = u32::from_be_bytes([0, s0, s1, s2]) as usize;
            let Some((data_unit_data, inner)) = inner.split_at_checked(data_unit_size) else {
                log::debug!("invalid DataUnit::data_unit_size");
                return None;
            };

            let unit = match parameter {
                0x20 => DataUnit::StatementBody(AribStr::from_bytes(data_unit_data)),
                0x28 => DataUnit::Geometric(data_unit_data),
                0x30 => DataUnit::DrcsSb(data_unit_data),
                0x31 => DataUnit::DrcsDb(data_unit_data),
                0x34 => DataUnit::ColorMap(data_unit_data),
                0x35 => DataUnit::Bitmap(data_unit_data),
                _ => DataUnit::Unknown {
                    data_unit_parameter: parameter,
                    data_unit_data,
                },
            };
            units.push(unit);
            rem = inner;
        }

        Some(units)
    }
}

/// 1つの字幕文。
#[derive(Debug)]
pub struct Caption {
    /// PESパケットのPTS。
    ///
    /// PTSを持たないPESパケットでは直前のPTSを引き継ぐ。
    pub pts: Option<Timestamp>,
    /// 提示開始時刻（ミリ秒）。
    pub stm: Option<u32>,
    /// 復号済みの字幕文。
    pub text: String,
}

/// TSパケット列から字幕文を取り出すイテレーター。
pub struct Captions<I> {
    pes: PesUnits<I>,
    last_pts: Option<Timestamp>,
}

impl<I> Captions<I>
where
    I: Iterator<Item = io::Result<crate::packet::Packet>>,
{
    /// `pid`で運ばれる字幕を`packets`から取り出す`Captions`を生成する。
    pub fn new(packets: I, pid: Pid) -> Captions<I> {
        Captions {
            pes: PesUnits::new(packets, &[pid]),
            last_pts: None,
        }
    }
}

impl<I> Iterator for Captions<I>
where
    I: Iterator<Item = io::Result<crate::packet::Packet>>,
{
    type Item = io::Result<Caption>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let unit = match self.pes.next()? {
                Ok(unit) => unit,
                Err(e) => return Some(Err(e)),
            };

            let Ok(pes) = unit.packet() else {
                log::debug!("invalid caption PES packet");
                continue;
            };
            if let Some(pts) = pes.header.as_ref().and_then(|h| h.pts) {
                self.last_pts = Some(pts);
            }

            let Some(independent) = IndependentPes::read(pes.data) else {
                continue;
            };
            let Some(group) = DataGroup::read(independent.pes_data) else {
                continue;
            };
            if group.is_management() {
                continue;
            }
            let Some(data) = CaptionData::read(group.data_group_data) else {
                continue;
            };

            let mut text = String::new();
            for data_unit in &data.data_units {
                if let DataUnit::StatementBody(body) = data_unit {
                    text.push_str(&body.to_string());
                }
            }
            if text.is_empty() {
                continue;
            }

            return Some(Ok(Caption {
                pts: self.last_pts,
                stm: data.stm,
                text,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{Packet, PACKET_SIZE};
    use crate::pes::tests::build_pes;
    use crate::psi::PsiTable;

    // データユニット1つ分のバイト列を構築する
    fn build_data_unit(parameter: u8, body: &[u8]) -> Vec<u8> {
        let mut unit = vec![
            0x1F,
            parameter,
            (body.len() >> 16) as u8,
            (body.len() >> 8) as u8,
            body.len() as u8,
        ];
        unit.extend_from_slice(body);
        unit
    }

    // 字幕文データを運ぶデータグループを構築する
    fn build_caption_group(group_id: u8, body: &[u8]) -> Vec<u8> {
        let unit = build_data_unit(0x20, body);

        // TMD=フリー
        let mut data = vec![
            0b00111111,
            (unit.len() >> 16) as u8,
            (unit.len() >> 8) as u8,
            unit.len() as u8,
        ];
        data.extend_from_slice(&unit);

        let mut group = vec![
            group_id << 2,
            0x00,
            0x00,
            (data.len() >> 8) as u8,
            data.len() as u8,
        ];
        group.extend_from_slice(&data);
        group
    }

    fn build_caption_pes(pts: u64, body: &[u8]) -> Vec<u8> {
        let group = build_caption_group(0x01, body);
        let mut payload = vec![0x80, 0xFF, 0xF0];
        payload.extend_from_slice(&group);
        build_pes(0xBD, pts, &payload)
    }

    fn packet(pid: Pid, unit_start: bool, cc: u8, payload: &[u8]) -> io::Result<Packet> {
        assert!(payload.len() <= PACKET_SIZE - 4);
        let mut data = [0xFFu8; PACKET_SIZE];
        data[0] = 0x47;
        data[1] = (u16::from(pid) >> 8) as u8;
        if unit_start {
            data[1] |= 0b01000000;
        }
        data[2] = u16::from(pid) as u8;
        data[3] = 0b00010000 | cc;
        data[4..4 + payload.len()].copy_from_slice(payload);
        Ok(Packet(data))
    }

    #[test]
    fn test_find_caption_pid() {
        // H.264映像＋データ放送＋字幕のPMT
        let data = [
            0x1F, 0xFF, // PCR PID
            0xF0, 0x00, // program_info_length
            0x1B, 0xE1, 0x00, 0xF0, 0x00, // 映像
            0x06, 0xE1, 0x38, 0xF0, 0x03, 0x52, 0x01, 0x30, // 字幕以外のプライベートデータ
            0x06, 0xE1, 0x30, 0xF0, 0x03, 0x52, 0x01, 0x87, // 字幕
        ];
        let buf = crate::psi::tests::build_section(0x02, 0x0400, 0, &data);
        let (psi, _) = crate::psi::PsiSection::parse(&buf).unwrap();
        let pmt = Pmt::read(&psi).unwrap();

        // ストリーム形式種別が同じでもコンポーネントタグが0x87のものを選ぶ
        assert_eq!(find_caption_pid(&pmt), Some(Pid::new(0x0130)));
    }

    #[test]
    fn test_data_group() {
        let group = build_caption_group(0x01, &[0x30, 0x21]);
        let group = DataGroup::read(&group).unwrap();
        assert_eq!(group.data_group_id, 0x01);
        assert!(!group.is_management());

        let management = build_caption_group(0x00, &[]);
        assert!(DataGroup::read(&management).unwrap().is_management());
    }

    #[test]
    fn test_caption_management_data() {
        // TMD=フリー、日本語1言語、データユニットなし
        let data = [
            0x00, 0x01, 0x00, b'j', b'p', b'n', 0x00, 0x00, 0x00, 0x00,
        ];
        let management = CaptionManagementData::read(&data).unwrap();

        assert_eq!(management.tmd, TimeControlMode::Free);
        assert_eq!(management.languages.len(), 1);
        assert_eq!(management.languages[0].language_tag, 0);
        assert_eq!(management.languages[0].lang_code, crate::lang::LangCode::JPN);
        assert!(management.data_units.is_empty());
    }

    #[test]
    fn test_caption_data() {
        let group = build_caption_group(0x01, &[0x30, 0x21]);
        let group = DataGroup::read(&group).unwrap();
        let data = CaptionData::read(group.data_group_data).unwrap();

        assert_eq!(data.tmd, TimeControlMode::Free);
        assert_eq!(data.stm, None);
        assert_eq!(data.data_units.len(), 1);
        let DataUnit::StatementBody(body) = &data.data_units[0] else {
            panic!("expected statement body");
        };
        assert_eq!(body.to_string(), "亜");
    }

    #[test]
    fn test_caption_data_stm() {
        // TMD=リアルタイム、STM=00:01:02.345
        let unit = build_data_unit(0x20, &[0x30, 0x21]);
        let mut data = vec![0b01111111, 0x00, 0x01, 0x02, 0x34, 0x5F];
        data.push((unit.len() >> 16) as u8);
        data.push((unit.len() >> 8) as u8);
        data.push(unit.len() as u8);
        data.extend_from_slice(&unit);

        let data = CaptionData::read(&data).unwrap();
        assert_eq!(data.tmd, TimeControlMode::RealTime);
        assert_eq!(data.stm, Some(62_345));
    }

    #[test]
    fn test_captions() {
        let pid = Pid::new(0x0130);
        let packets = vec![
            // 「亜」
            packet(pid, true, 0, &build_caption_pes(90_000, &[0x30, 0x21])),
            // 字幕管理データは飛ばす
            {
                let group = build_caption_group(0x00, &[]);
                let mut payload = vec![0x80, 0xFF, 0xF0];
                payload.extend_from_slice(&group);
                packet(pid, true, 1, &build_pes(0xBD, 180_000, &payload))
            },
            // 「天気」
            packet(
                pid,
                true,
                2,
                &build_caption_pes(270_000, &[0x45, 0x37, 0x35, 0x24]),
            ),
        ];

        let captions: Vec<_> = Captions::new(packets.into_iter(), pid)
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(captions.len(), 2);
        assert_eq!(captions[0].text, "亜");
        assert_eq!(captions[0].pts, Some(Timestamp::new(90_000, 0)));
        assert_eq!(captions[1].text, "天気");
        assert_eq!(captions[1].pts, Some(Timestamp::new(270_000, 0)));
    }
}
