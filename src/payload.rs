//! ペイロードの取り出し。

use std::io;

use smallvec::SmallVec;

use crate::packet::Packet;
use crate::pid::{Pid, PidTable};
use crate::time::Timestamp;

/// 1パケット分のペイロード。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadUnit {
    /// このペイロードが属するPID。
    pub pid: Pid,
    /// ペイロードユニットの先頭かどうか。
    pub unit_start: bool,
    /// 同一PIDの直前のパケットから連続性指標が連続しているかどうか。
    pub cc_ok: bool,
    /// ペイロードのバイト列。
    pub data: SmallVec<[u8; 184]>,
}

/// 指定したPIDのペイロードを到着順に取り出すイテレーター。
///
/// 異常なパケットやペイロードを含まないパケットは読み飛ばされる。
/// 連続性指標の欠落は[`PayloadUnit::cc_ok`]で報告するのみで補修はしない。
pub struct Payloads<I> {
    packets: I,
    mask: PidTable<bool>,
    last_cc: PidTable<u8>,
}

impl<I> Payloads<I> {
    /// `pids`のペイロードを`packets`から取り出す`Payloads`を生成する。
    pub fn new(packets: I, pids: &[Pid]) -> Payloads<I> {
        let mut mask = PidTable::from_fn(|_| false);
        for &pid in pids {
            mask[pid] = true;
        }

        Payloads {
            packets,
            mask,
            last_cc: PidTable::from_fn(|_| 0x10),
        }
    }
}

impl<I: Iterator<Item = io::Result<Packet>>> Iterator for Payloads<I> {
    type Item = io::Result<PayloadUnit>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let packet = match self.packets.next()? {
                Ok(packet) => packet,
                Err(e) => return Some(Err(e)),
            };
            if !packet.is_normal() {
                continue;
            }

            let pid = packet.pid();
            if !self.mask[pid] {
                continue;
            }

            let cc_ok = packet.validate_cc(&mut self.last_cc[pid]);
            let Some(payload) = packet.payload() else {
                continue;
            };
            if payload.is_empty() {
                continue;
            }

            return Some(Ok(PayloadUnit {
                pid,
                unit_start: packet.unit_start_indicator(),
                cc_ok,
                data: SmallVec::from_slice(payload),
            }));
        }
    }
}

/// アダプテーションフィールドにあるPCRを順に取り出すイテレーター。
pub struct Pcrs<I> {
    packets: I,
}

impl<I> Pcrs<I> {
    /// `packets`からPCRを取り出す`Pcrs`を生成する。
    #[inline]
    pub fn new(packets: I) -> Pcrs<I> {
        Pcrs { packets }
    }
}

impl<I: Iterator<Item = io::Result<Packet>>> Iterator for Pcrs<I> {
    type Item = io::Result<Timestamp>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let packet = match self.packets.next()? {
                Ok(packet) => packet,
                Err(e) => return Some(Err(e)),
            };
            if !packet.is_normal() {
                continue;
            }

            let Some(pcr) = packet.adaptation_field().and_then(|af| af.pcr()) else {
                continue;
            };
            return Some(Ok(pcr));
        }
    }
}

/// PESユニット先頭のヘッダにあるPTSを順に取り出すイテレーター。
///
/// ストリーム全体の基準時刻を得るために使う。
pub struct Ptses<I> {
    packets: I,
}

impl<I> Ptses<I> {
    /// `packets`からPTSを取り出す`Ptses`を生成する。
    #[inline]
    pub fn new(packets: I) -> Ptses<I> {
        Ptses { packets }
    }
}

impl<I: Iterator<Item = io::Result<Packet>>> Iterator for Ptses<I> {
    type Item = io::Result<Timestamp>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let packet = match self.packets.next()? {
                Ok(packet) => packet,
                Err(e) => return Some(Err(e)),
            };
            if !packet.is_normal() || !packet.unit_start_indicator() || packet.is_scrambled() {
                continue;
            }

            let Some(payload) = packet.payload() else {
                continue;
            };
            // PESの開始コードとPTSフラグ
            if payload.len() < 14 || payload[0..3] != [0x00, 0x00, 0x01] {
                continue;
            }
            if payload[7] & 0b10000000 == 0 {
                continue;
            }

            let data: &[u8; 5] = payload[9..14].try_into().unwrap();
            let Some(pts) = Timestamp::read_pts(data) else {
                continue;
            };
            return Some(Ok(pts));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::PACKET_SIZE;

    fn packet(pid: Pid, unit_start: bool, cc: u8, payload: &[u8]) -> io::Result<Packet> {
        let mut data = [0xFF; PACKET_SIZE];
        data[0] = 0x47;
        data[1] = (pid.get() >> 8) as u8 | if unit_start { 0b01000000 } else { 0 };
        data[2] = pid.get() as u8;
        data[3] = 0b00010000 | cc;
        data[4..4 + payload.len()].copy_from_slice(payload);
        Ok(Packet(data))
    }

    #[test]
    fn test_payloads() {
        let packets = vec![
            packet(Pid::new(0x0100), true, 0, &[1, 2, 3]),
            packet(Pid::new(0x0200), true, 0, &[9]),
            packet(Pid::new(0x0100), false, 1, &[4, 5]),
        ];
        let mut payloads = Payloads::new(packets.into_iter(), &[Pid::new(0x0100)]);

        let unit = payloads.next().unwrap().unwrap();
        assert_eq!(unit.pid, Pid::new(0x0100));
        assert!(unit.unit_start);
        assert!(unit.cc_ok);
        assert_eq!(&unit.data[..3], &[1, 2, 3]);

        // PID 0x0200は対象外
        let unit = payloads.next().unwrap().unwrap();
        assert_eq!(unit.pid, Pid::new(0x0100));
        assert!(!unit.unit_start);
        assert!(unit.cc_ok);

        assert!(payloads.next().is_none());
    }

    #[test]
    fn test_payloads_cc_gap() {
        let pid = Pid::new(0x0100);
        let packets = vec![
            packet(pid, true, 0, &[0]),
            packet(pid, false, 1, &[0]),
            // 連続性指標2を欠落
            packet(pid, false, 3, &[0]),
            packet(pid, false, 4, &[0]),
        ];
        let flags: Vec<bool> = Payloads::new(packets.into_iter(), &[pid])
            .map(|unit| unit.unwrap().cc_ok)
            .collect();

        // 欠落は報告されるのみで取り出しは続行される
        assert_eq!(flags, vec![true, true, false, true]);
    }

    #[test]
    fn test_pcrs() {
        let mut data = [0xFF; PACKET_SIZE];
        data[0] = 0x47;
        data[1] = 0x01;
        data[2] = 0x11;
        // アダプテーションフィールドのみ、PCRフラグあり
        data[3] = 0b00100000;
        data[4] = 183;
        data[5] = 0b00010000;
        data[6..12].copy_from_slice(&[0xD2, 0x2D, 0x74, 0x82, 0x80, 0xF9]);

        let packets = vec![
            Ok(Packet(data)),
            // PCRを持たないパケットは読み飛ばされる
            packet(Pid::new(0x0100), true, 0, &[0]),
        ];
        let pcrs: Vec<_> = Pcrs::new(packets.into_iter())
            .map(|pcr| pcr.unwrap())
            .collect();
        assert_eq!(pcrs, vec![Timestamp::new(7052388613, 249)]);
    }

    #[test]
    fn test_ptses() {
        let pid = Pid::new(0x0100);
        let base = 1234567_u64;
        let mut pes = vec![0x00, 0x00, 0x01, 0xBD, 0x00, 0x00, 0x80, 0x80, 5];
        pes.extend_from_slice(&[
            0b0010 << 4 | ((base >> 30) as u8 & 0b111) << 1 | 1,
            (base >> 22) as u8,
            ((base >> 15) as u8) << 1 | 1,
            (base >> 7) as u8,
            (base as u8) << 1 | 1,
        ]);

        let packets = vec![
            packet(pid, true, 0, &pes),
            packet(pid, false, 1, &[0xFF; 10]),
        ];
        let ptses: Vec<_> = Ptses::new(packets.into_iter())
            .map(|pts| pts.unwrap())
            .collect();
        assert_eq!(ptses, vec![Timestamp::new(base, 0)]);
    }
}
