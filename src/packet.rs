//! MPEG2-TSのパケット。

use std::fmt;
use std::io::{self, Read};

use crate::pid::Pid;
use crate::time::Timestamp;

const SYNC_BYTE: u8 = 0x47;

/// TSパケットの長さ。
pub const PACKET_SIZE: usize = 188;

/// MPEG2-TSのパケット。
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Packet(pub [u8; PACKET_SIZE]);

impl Packet {
    /// `r`からTSパケットを順次読み込むイテレーターを生成する。
    ///
    /// # サンプル
    ///
    /// ```
    /// # fn main() -> std::io::Result<()> {
    /// # let file = &mut (&[] as &[u8]);
    /// for packet in arib_ts::Packet::iter(file) {
    ///     let packet = packet?;
    ///
    ///     // 同期バイトは常に正しい
    ///     assert_eq!(packet.sync_byte(), 0x47);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    #[inline]
    #[must_use]
    pub fn iter<R: Read>(r: R) -> PacketIter<R> {
        PacketIter { r }
    }

    /// `r`からTSパケットを読み込む。
    ///
    /// 原則として188バイトずつ読み込むが、同期バイトで始まらない部分は
    /// 次の同期バイトまで読み飛ばす。入力が尽きた場合は`Ok(None)`を返し、
    /// 末尾の188バイトに満たない断片は捨てられる。
    pub fn read<R: Read>(r: R) -> io::Result<Option<Packet>> {
        fn read_inner<R: Read>(mut r: R) -> io::Result<Packet> {
            let mut packet = Packet([0; PACKET_SIZE]);
            r.read_exact(&mut packet.0)?;

            loop {
                if packet.0[0] == SYNC_BYTE {
                    return Ok(packet);
                }

                // 同期バイト待ち
                match memchr::memchr(SYNC_BYTE, &packet.0) {
                    Some(pos) => {
                        packet.0.copy_within(pos.., 0);
                        r.read_exact(&mut packet.0[PACKET_SIZE - pos..])?;
                    }
                    None => r.read_exact(&mut packet.0)?,
                }
            }
        }

        match read_inner(r) {
            Ok(packet) => Ok(Some(packet)),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// パケットが正常かどうかを返す。
    ///
    /// 同期バイトやトランスポートエラーインジケーターによるエラー検知に加え、
    /// 予約されたPIDなどパケットとしてあり得ない状態であることも判断材料である。
    pub fn is_normal(&self) -> bool {
        if self.sync_byte() != SYNC_BYTE {
            // 同期バイト不正
            return false;
        }
        if self.error_indicator() {
            // ビット誤りあり
            return false;
        }
        if (0x0002..=0x000F).contains(&self.pid().get()) {
            // 未定義PID範囲
            return false;
        }
        if self.scrambling_control() == 0x01 {
            // 未定義スクランブル制御値
            return false;
        }
        if self.adaptation_field_control() == 0b00 {
            // 未定義アダプテーションフィールド制御値
            return false;
        }
        if self.adaptation_field_control() == 0b10 && self.adaptation_field_length_raw() > 183 {
            // アダプテーションフィールド長異常
            return false;
        }
        if self.adaptation_field_control() == 0b11 && self.adaptation_field_length_raw() > 182 {
            // アダプテーションフィールド長異常
            return false;
        }

        true
    }

    /// 同期バイトを返す。
    #[inline]
    pub fn sync_byte(&self) -> u8 {
        self.0[0]
    }

    /// トランスポートエラーインジケーターを返す。
    #[inline]
    pub fn error_indicator(&self) -> bool {
        self.0[1] & 0b10000000 != 0
    }

    /// ペイロードユニット開始インジケーターを返す。
    #[inline]
    pub fn unit_start_indicator(&self) -> bool {
        self.0[1] & 0b01000000 != 0
    }

    /// トランスポート優先度を返す。
    #[inline]
    pub fn priority(&self) -> bool {
        self.0[1] & 0b00100000 != 0
    }

    /// PIDを返す。
    #[inline]
    pub fn pid(&self) -> Pid {
        Pid::read(&self.0[1..])
    }

    /// トランスポートスクランブル制御（2ビット）を返す。
    #[inline]
    pub fn scrambling_control(&self) -> u8 {
        (self.0[3] & 0b11000000) >> 6
    }

    /// パケットがスクランブル処理されているかを返す。
    #[inline]
    pub fn is_scrambled(&self) -> bool {
        self.scrambling_control() & 0b10 != 0
    }

    /// アダプテーションフィールド制御（2ビット）を返す。
    #[inline]
    pub fn adaptation_field_control(&self) -> u8 {
        (self.0[3] & 0b00110000) >> 4
    }

    /// 連続性指標（4ビット）を返す。
    #[inline]
    pub fn continuity_counter(&self) -> u8 {
        self.0[3] & 0b00001111
    }

    /// パケットがアダプテーションフィールドを含むかどうかを返す。
    #[inline]
    pub fn has_adaptation_field(&self) -> bool {
        self.adaptation_field_control() & 0b10 != 0
    }

    #[inline]
    fn adaptation_field_length_raw(&self) -> u8 {
        self.0[4]
    }

    /// アダプテーションフィールドがある場合、adaptation_field_lengthを返す。
    #[inline]
    pub fn adaptation_field_length(&self) -> Option<u8> {
        self.has_adaptation_field()
            .then(|| self.adaptation_field_length_raw())
    }

    /// アダプテーションフィールドを返す。
    #[inline]
    pub fn adaptation_field(&self) -> Option<AdaptationField> {
        AdaptationField::new(self)
    }

    /// パケットがペイロードを含むかどうかを返す。
    #[inline]
    pub fn has_payload(&self) -> bool {
        self.adaptation_field_control() & 0b01 != 0
    }

    /// ペイロードを返す。
    pub fn payload(&self) -> Option<&[u8]> {
        if !self.has_payload() {
            None
        } else if let Some(afl) = self.adaptation_field_length() {
            let offset = 4 + 1 + afl as usize;
            self.0.get(offset..)
        } else {
            self.0.get(4..)
        }
    }

    /// 前回の連続性指標である`last_cc`を元にパケット順の正当性を確認する。
    ///
    /// `last_cc`の初期値は`0x10`以上とする。
    pub fn validate_cc(&self, last_cc: &mut u8) -> bool {
        let pid = self.pid();
        let cc = if self.has_payload() {
            self.continuity_counter()
        } else {
            0x10
        };
        let is_discontinuity = self
            .adaptation_field()
            .map_or(false, |af| af.discontinuity_indicator());
        let cc_ok = pid == Pid::NULL
            || is_discontinuity
            || cc >= 0x10
            || *last_cc >= 0x10
            || (*last_cc + 1) & 0x0F == cc;
        *last_cc = cc;

        cc_ok
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Packet")
            .field("sync_byte", &self.sync_byte())
            .field("error_indicator", &self.error_indicator())
            .field("unit_start_indicator", &self.unit_start_indicator())
            .field("priority", &self.priority())
            .field("pid", &self.pid())
            .field("scrambling_control", &self.scrambling_control())
            .field("adaptation_field_control", &self.adaptation_field_control())
            .field("continuity_counter", &self.continuity_counter())
            .finish_non_exhaustive()
    }
}

/// TSパケット内のアダプテーションフィールド。
#[derive(Debug)]
pub struct AdaptationField<'a>(&'a [u8]);

impl<'a> AdaptationField<'a> {
    #[inline]
    fn new(packet: &'a Packet) -> Option<AdaptationField<'a>> {
        packet
            .adaptation_field_length()
            .filter(|&length| length >= 1)
            .and_then(|length| packet.0.get(5..5 + length as usize))
            .map(AdaptationField)
    }

    /// 不連続性インジケーターを返す。
    #[inline]
    pub fn discontinuity_indicator(&self) -> bool {
        self.0[0] & 0b10000000 != 0
    }

    /// ランダムアクセスインジケーターを返す。
    #[inline]
    pub fn random_access_indicator(&self) -> bool {
        self.0[0] & 0b01000000 != 0
    }

    /// PCRフラグを返す。
    #[inline]
    pub fn pcr_flag(&self) -> bool {
        self.0[0] & 0b00010000 != 0
    }

    /// PCRを返す。
    pub fn pcr(&self) -> Option<Timestamp> {
        if !self.pcr_flag() {
            return None;
        }

        let data: &[u8; 6] = self.0.get(1..1 + 6)?.try_into().ok()?;
        Some(Timestamp::read_pcr(data))
    }
}

/// [`Packet::iter`]から返される。TSパケットを順次読み込むイテレーター。
#[derive(Debug)]
pub struct PacketIter<R> {
    r: R,
}

impl<R: Read> Iterator for PacketIter<R> {
    type Item = io::Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        Packet::read(&mut self.r).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    // https://youzaka.hatenablog.com/entry/2011/11/09/001615
    const PACKET_1: Packet = Packet(hex_literal::hex!(
        "
47 40 12 18 00 4F F0 CC 01 26 FF 01 01 43 11 00
04 01 4F 44 4D DA 15 17 25 00 00 05 00 10 B1 4D
78 6A 70 6E 10 AA A6 C1 CE 3F 40 4D 4D 1B 24 2A
3B 1B 7D FA D6 63 30 61 42 58 A8 CE 35 28 40 61
21 22 32 46 49 7E F2 3C 7D 47 3C B9 EB 41 30 CB
E4 EB B3 C8 C8 CF 1B 7E BF 1B 7D E4 E9 BA CB 3C
7D 47 3C B9 EB C8 33 32 43 6E AC 49 7E F2 39 53
E9 B7 C6 B7 DE A6 B3 C8 E2 21 26 21 26 21 26 40
35 B7 A4 32 46 49 7E 3C 7D 47 3C 4A 7D 4B 21 F2
3E 52 32 70 B7 DE B9 21 23 50 06 F1 03 00 6A 70
6E 54 06 22 FF 2F FF 84 FF C1 02 A4 01 C4 11 F2
03 10 0F FF 6F 6A 70 6E 25 39 25 46
"
    ));
    const PACKET_2: Packet = Packet(hex_literal::hex!(
        "
47 01 11 20 B7 10 D2 2D 74 82 80 F9 FF FF FF FF
FF FF FF FF FF FF FF FF FF FF FF FF FF FF FF FF
FF FF FF FF FF FF FF FF FF FF FF FF FF FF FF FF
FF FF FF FF FF FF FF FF FF FF FF FF FF FF FF FF
FF FF FF FF FF FF FF FF FF FF FF FF FF FF FF FF
FF FF FF FF FF FF FF FF FF FF FF FF FF FF FF FF
FF FF FF FF FF FF FF FF FF FF FF FF FF FF FF FF
FF FF FF FF FF FF FF FF FF FF FF FF FF FF FF FF
FF FF FF FF FF FF FF FF FF FF FF FF FF FF FF FF
FF FF FF FF FF FF FF FF FF FF FF FF FF FF FF FF
FF FF FF FF FF FF FF FF FF FF FF FF FF FF FF FF
FF FF FF FF FF FF FF FF FF FF FF FF
    "
    ));

    #[test]
    fn test_packet_read() {
        for packet in [&PACKET_1, &PACKET_2] {
            let pkt: &[u8] = &packet.0;

            assert_eq!(Packet::read(&mut &pkt[..0]).unwrap(), None);
            assert_eq!(Packet::read(&mut &pkt[1..]).unwrap(), None);
            assert_eq!(Packet::read(&mut &*pkt).unwrap(), Some(packet.clone()));
            // 先頭にゴミがあっても再同期する
            assert_eq!(
                Packet::read(&mut &*[&[0x00], pkt].concat()).unwrap(),
                Some(packet.clone()),
            );
            assert_eq!(
                Packet::read(&mut &*[&[0u8; 200] as &[u8], pkt].concat()).unwrap(),
                Some(packet.clone()),
            );
        }
    }

    #[test]
    fn test_packet_read_err() {
        struct ReadErr(io::ErrorKind);
        impl Read for ReadErr {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(self.0.into())
            }
        }

        assert_matches!(
            Packet::read(ReadErr(io::ErrorKind::UnexpectedEof)),
            Ok(None)
        );
        assert_matches!(
            Packet::read(ReadErr(io::ErrorKind::BrokenPipe)),
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe
        );
    }

    #[test]
    fn test_packet_abnormal() {
        fn packet(head: &[u8]) -> Packet {
            let mut data = [0; PACKET_SIZE];
            data[..head.len()].copy_from_slice(head);
            Packet(data)
        }

        assert!(!packet(&[0x00]).is_normal());
        assert!(!packet(&[0xFF]).is_normal());

        // トランスポートエラーインジケーター
        assert!(!packet(&[SYNC_BYTE, 0b10000000]).is_normal());

        // 未定義PID範囲
        for pid in 0x0002..=0x000F {
            let [hi, lo] = u16::to_be_bytes(pid);
            let packet = packet(&[SYNC_BYTE, hi, lo]);
            assert_eq!(packet.pid().get(), pid);
            assert!(!packet.is_normal());
        }

        // 未定義スクランブル制御値
        assert!(!packet(&[SYNC_BYTE, 0x00, 0x00, 0b01010000]).is_normal());
        // 未定義アダプテーションフィールド制御値
        assert!(!packet(&[SYNC_BYTE, 0x00, 0x00, 0b00000000]).is_normal());
        // アダプテーションフィールド長異常
        assert!(!packet(&[SYNC_BYTE, 0x00, 0x00, 0b00100000, 184]).is_normal());
        assert!(!packet(&[SYNC_BYTE, 0x00, 0x00, 0b00110000, 183]).is_normal());
        // 正常なパケット
        assert!(packet(&[SYNC_BYTE, 0x00, 0x00, 0b00010000]).is_normal());
    }

    #[test]
    fn test_packet_accessor() {
        assert!(PACKET_1.is_normal());
        assert!(!PACKET_1.error_indicator());
        assert!(PACKET_1.unit_start_indicator());
        assert!(!PACKET_1.priority());
        assert_eq!(PACKET_1.pid(), Pid::new(0x0012));
        assert_eq!(PACKET_1.scrambling_control(), 0b00);
        assert!(!PACKET_1.is_scrambled());
        assert_eq!(PACKET_1.adaptation_field_control(), 0b01);
        assert_eq!(PACKET_1.continuity_counter(), 8);

        assert_eq!(PACKET_1.adaptation_field_length(), None);
        assert_matches!(PACKET_1.adaptation_field(), None);

        assert_eq!(PACKET_1.payload(), Some(&PACKET_1.0[4..]));

        //

        assert!(PACKET_2.is_normal());
        assert!(!PACKET_2.error_indicator());
        assert!(!PACKET_2.unit_start_indicator());
        assert_eq!(PACKET_2.pid(), Pid::new(0x0111));
        assert_eq!(PACKET_2.adaptation_field_control(), 0b10);
        assert_eq!(PACKET_2.continuity_counter(), 0);

        assert_eq!(PACKET_2.adaptation_field_length(), Some(183));
        let af = PACKET_2.adaptation_field().unwrap();
        assert!(!af.discontinuity_indicator());
        assert!(!af.random_access_indicator());
        assert_eq!(af.pcr(), Some(Timestamp::new(7052388613, 249)));

        assert_eq!(PACKET_2.payload(), None);
    }

    #[test]
    fn test_packet_iter() {
        let data = [PACKET_1.0, PACKET_2.0].concat();
        let mut iter = Packet::iter(&*data);
        assert_eq!(iter.next().unwrap().unwrap(), PACKET_1);
        assert_eq!(iter.next().unwrap().unwrap(), PACKET_2);
        assert_matches!(iter.next(), None);

        // 入力長を188で割った個数だけ読み込まれ、末尾の断片は捨てられる
        let data = [&PACKET_1.0 as &[u8], &PACKET_2.0, &PACKET_1.0[..100]].concat();
        assert_eq!(Packet::iter(&*data).count(), 2);
    }

    #[test]
    fn test_validate_cc() {
        fn packet(cc: u8) -> Packet {
            let mut data = [0; PACKET_SIZE];
            data[0] = SYNC_BYTE;
            data[3] = 0b00010000 | cc;
            Packet(data)
        }

        let mut last_cc = 0x10;
        assert!(packet(0).validate_cc(&mut last_cc));
        assert!(packet(1).validate_cc(&mut last_cc));
        // 欠落
        assert!(!packet(3).validate_cc(&mut last_cc));
        // 欠落後は再同期する
        assert!(packet(4).validate_cc(&mut last_cc));
        // 一周
        let mut last_cc = 0x0F;
        assert!(packet(0).validate_cc(&mut last_cc));
    }
}
