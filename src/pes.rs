//! PESパケットに関する型。

use std::io;

use arrayvec::ArrayVec;
use thiserror::Error;

use crate::payload::Payloads;
use crate::pid::Pid;
use crate::time::Timestamp;
use crate::utils::BytesExt;

/// PESパケットの最大送出単位長。
///
/// PES_packet_lengthの最大値65535にヘッダーの6バイトを足した値。
const MAX_PES_SIZE: usize = 6 + 0xFFFF;

/// [`PesPacket::parse`]で発生するエラー。
#[derive(Debug, Error)]
pub enum PesError {
    /// PESパケットの長さが足りない。
    #[error("insufficient length of a PES packet")]
    InsufficientLength,

    /// PESパケットの開始コードが不正。
    #[error("invalid start code prefix")]
    InvalidStartCode,

    /// PESパケットとして壊れている。
    #[error("corrupt PES packet")]
    Corrupted,
}

/// PESパケットのストリーム識別子。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamId(pub u8);

impl StreamId {
    /// プライベートストリーム1。
    pub const PRIVATE_STREAM_1: StreamId = StreamId(0xBD);
    /// パディングストリーム。
    pub const PADDING_STREAM: StreamId = StreamId(0xBE);
    /// プライベートストリーム2。
    pub const PRIVATE_STREAM_2: StreamId = StreamId(0xBF);

    /// このストリーム識別子のPESパケットが追加ヘッダーを持つかどうかを返す。
    pub fn has_additional_header(&self) -> bool {
        !matches!(
            *self,
            StreamId::PADDING_STREAM | StreamId::PRIVATE_STREAM_2
        )
    }
}

/// PESパケットの追加ヘッダー。
#[derive(Debug)]
pub struct PesHeaderOption {
    /// PESスクランブル制御（2ビット）。
    pub pes_scrambling_control: u8,
    /// データアライメント指示。
    pub data_alignment_indicator: bool,
    /// PTS。
    pub pts: Option<Timestamp>,
    /// DTS。
    pub dts: Option<Timestamp>,
}

/// PESパケット。
#[derive(Debug)]
pub struct PesPacket<'a> {
    /// ストリーム識別子。
    pub stream_id: StreamId,
    /// 追加ヘッダー。
    pub header: Option<PesHeaderOption>,
    /// PESパケットのデータ。
    pub data: &'a [u8],
}

impl<'a> PesPacket<'a> {
    /// PESパケットをパースして[`PesPacket`]として返す。
    pub fn parse(data: &'a [u8]) -> Result<PesPacket<'a>, PesError> {
        let [0x00, 0x00, prefix, stream_id, len_hi, len_lo, ref rem @ ..] = *data else {
            return Err(PesError::InsufficientLength);
        };
        if prefix != 0x01 {
            return Err(PesError::InvalidStartCode);
        }

        let stream_id = StreamId(stream_id);
        let packet_length = u16::from_be_bytes([len_hi, len_lo]) as usize;
        if packet_length != 0 && rem.len() < packet_length {
            return Err(PesError::InsufficientLength);
        }
        let rem = if packet_length == 0 {
            rem
        } else {
            &rem[..packet_length]
        };

        if !stream_id.has_additional_header() {
            return Ok(PesPacket {
                stream_id,
                header: None,
                data: rem,
            });
        }

        let [b0, b1, header_length, ref rem @ ..] = *rem else {
            return Err(PesError::Corrupted);
        };
        if b0 & 0b11000000 != 0b10000000 {
            return Err(PesError::Corrupted);
        }

        let pes_scrambling_control = (b0 & 0b00110000) >> 4;
        let data_alignment_indicator = b0 & 0b00000100 != 0;
        let pts_dts_flags = (b1 & 0b11000000) >> 6;

        let Some((header_data, data)) = rem.split_at_checked(header_length as usize) else {
            return Err(PesError::Corrupted);
        };

        fn read_ts(data: Option<&[u8]>) -> Result<Timestamp, PesError> {
            data.and_then(|d| Timestamp::read_pts(d.try_into().ok()?))
                .ok_or(PesError::Corrupted)
        }

        let (pts, dts) = match pts_dts_flags {
            0b10 => {
                let pts = read_ts(header_data.get(..5))?;
                (Some(pts), None)
            }
            0b11 => {
                let pts = read_ts(header_data.get(..5))?;
                let dts = read_ts(header_data.get(5..10))?;
                (Some(pts), Some(dts))
            }
            _ => (None, None),
        };

        Ok(PesPacket {
            stream_id,
            header: Some(PesHeaderOption {
                pes_scrambling_control,
                data_alignment_indicator,
                pts,
                dts,
            }),
            data,
        })
    }
}

/// 独立PES伝送方式のデータ。
#[derive(Debug)]
pub struct IndependentPes<'a> {
    /// プライベートデータ。
    pub private_data: &'a [u8],
    /// 同期型・非同期型PESデータ。
    pub pes_data: &'a [u8],
}

impl<'a> IndependentPes<'a> {
    /// 独立PES伝送方式のデータを読み取る。
    ///
    /// 形式が不正な場合は`None`を返す。
    pub fn read(data: &'a [u8]) -> Option<IndependentPes<'a>> {
        let [data_identifier, private_stream_id, flags, ref rem @ ..] = *data else {
            log::debug!("invalid IndependentPes");
            return None;
        };

        // 0x80：同期型PES、0x81：非同期型PES
        if !matches!(data_identifier, 0x80 | 0x81) {
            log::debug!("invalid IndependentPes::data_identifier");
            return None;
        }
        if private_stream_id != 0xFF {
            log::debug!("invalid IndependentPes::private_stream_id");
            return None;
        }

        let pes_data_private_data_length = (flags & 0b00001111) as usize;
        let Some((private_data, pes_data)) = rem.split_at_checked(pes_data_private_data_length)
        else {
            log::debug!("invalid IndependentPes::private_data");
            return None;
        };

        Some(IndependentPes {
            private_data,
            pes_data,
        })
    }
}

/// 組み立て済みのPESパケット1つ分のデータ。
pub struct PesUnit {
    /// このPESパケットを運んでいたPID。
    pub pid: Pid,
    data: Vec<u8>,
}

impl PesUnit {
    /// PESパケット全体のバイト列を返す。
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// PESパケットとしてパースして返す。
    #[inline]
    pub fn packet(&self) -> Result<PesPacket, PesError> {
        PesPacket::parse(&self.data)
    }
}

impl std::fmt::Debug for PesUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("PesUnit")
            .field("pid", &self.pid)
            .field("data", &format_args!("{} bytes", self.data.len()))
            .finish()
    }
}

/// TSパケット列からPESパケットを組み立てるイテレーター。
///
/// PES_packet_lengthが確定するまでペイロードを貯め、確定後に全体が
/// 揃った時点でPESパケットを1つ生じる。長さが0のPESパケット
/// （ビデオ等で使われる不定長）には対応しない。
pub struct PesUnits<I> {
    payloads: Payloads<I>,
    buffer: Box<ArrayVec<u8, MAX_PES_SIZE>>,
    /// 組み立て中のPESパケットを運ぶPID。
    current: Option<Pid>,
}

impl<I> PesUnits<I>
where
    I: Iterator<Item = io::Result<crate::packet::Packet>>,
{
    /// `pids`で指定したPIDのPESパケットを`packets`から組み立てる`PesUnits`を生成する。
    pub fn new(packets: I, pids: &[Pid]) -> PesUnits<I> {
        PesUnits {
            payloads: Payloads::new(packets, pids),
            buffer: Box::new(ArrayVec::new()),
            current: None,
        }
    }

    /// バッファー内のPESパケットが完結していれば取り出す。
    fn take_completed(&mut self) -> Option<PesUnit> {
        let len = {
            let buf = self.buffer.as_slice();
            if buf.len() < 6 {
                return None;
            }
            if buf[..3] != [0x00, 0x00, 0x01] {
                log::debug!("invalid PES start code");
                self.buffer.clear();
                self.current = None;
                return None;
            }

            let packet_length = buf[4..=5].read_be_16() as usize;
            if packet_length == 0 || buf.len() < 6 + packet_length {
                return None;
            }
            6 + packet_length
        };

        let pid = self.current.take()?;
        let data = self.buffer[..len].to_vec();
        self.buffer.clear();
        Some(PesUnit { pid, data })
    }
}

impl<I> Iterator for PesUnits<I>
where
    I: Iterator<Item = io::Result<crate::packet::Packet>>,
{
    type Item = io::Result<PesUnit>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let unit = match self.payloads.next()? {
                Ok(unit) => unit,
                Err(e) => return Some(Err(e)),
            };

            if unit.unit_start {
                self.buffer.clear();
                self.current = Some(unit.pid);
            } else if self.current != Some(unit.pid) || !unit.cc_ok {
                // 先頭が来ていない、または欠落があれば組み立てを諦める
                if self.current == Some(unit.pid) {
                    self.buffer.clear();
                    self.current = None;
                }
                continue;
            }

            let room = self.buffer.remaining_capacity();
            let len = usize::min(unit.data.len(), room);
            self.buffer.extend(unit.data[..len].iter().copied());

            if let Some(unit) = self.take_completed() {
                return Some(Ok(unit));
            }
        }
    }
}
