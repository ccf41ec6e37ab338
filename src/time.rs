//! MPEG2-TSにおける時刻。

use std::fmt::{self, Write};

use crate::utils::BytesExt;

/// PCRやPTSとして伝送される90kHz基準のタイムスタンプ。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp {
    /// 90kHzのベース（33ビット）。
    pub base: u64,
    /// 27MHzの拡張（9ビット、0～299）。
    pub extension: u16,
}

impl Timestamp {
    /// ベースが一周する値（2の33乗）。
    pub const BASE_WRAP: u64 = 1 << 33;

    /// `Timestamp`を生成する。
    #[inline]
    pub const fn new(base: u64, extension: u16) -> Timestamp {
        Timestamp { base, extension }
    }

    /// アダプテーションフィールド内のPCRから`Timestamp`を読み取る。
    pub fn read_pcr(data: &[u8; 6]) -> Timestamp {
        let base = (data[0] as u64) << 25
            | (data[1] as u64) << 17
            | (data[2] as u64) << 9
            | (data[3] as u64) << 1
            | (data[4] >> 7) as u64;
        let extension = ((data[4] & 0b1) as u16) << 8 | data[5] as u16;

        Timestamp { base, extension }
    }

    /// PESヘッダのPTS・DTSフィールドから`Timestamp`を読み取る。
    ///
    /// マーカービットが立っていない場合は`None`を返す。
    pub fn read_pts(data: &[u8; 5]) -> Option<Timestamp> {
        if data[0] & 0b1 == 0 || data[2] & 0b1 == 0 || data[4] & 0b1 == 0 {
            return None;
        }

        let base = (((data[0] >> 1) & 0b111) as u64) << 30
            | (data[1] as u64) << 22
            | ((data[2] >> 1) as u64) << 15
            | (data[3] as u64) << 7
            | (data[4] >> 1) as u64;

        Some(Timestamp { base, extension: 0 })
    }

    /// 27MHz単位の値を返す。
    #[inline]
    pub const fn full(&self) -> u64 {
        self.base * 300 + self.extension as u64
    }

    /// ナノ秒単位の値を返す。
    #[inline]
    pub const fn to_nanos(&self) -> u64 {
        self.full() * 1000 / 27
    }

    /// ミリ秒単位の値を返す。
    #[inline]
    pub const fn to_millis(&self) -> u64 {
        self.base / 90
    }

    /// ベースの周回を考慮して`earlier`からの経過を90kHz単位で返す。
    #[inline]
    pub const fn wrapping_base_sub(&self, earlier: Timestamp) -> u64 {
        self.base.wrapping_sub(earlier.base) & (Timestamp::BASE_WRAP - 1)
    }
}

fn write_hundreds<W: Write>(w: &mut W, n: u8) -> fmt::Result {
    let h = b'0' + n / 10;
    let l = b'0' + n % 10;
    w.write_char(h as char)?;
    w.write_char(l as char)
}

/// 修正ユリウス日。
#[derive(Clone, PartialEq, Eq)]
pub struct MjdDate {
    /// 1900年からの年（2003年＝103）。
    pub year: u16,
    /// 月（1月＝1、12月＝12）。
    pub month: u8,
    /// 日（1～31）。
    pub day: u8,
    /// 曜日（月曜日＝1、日曜日＝7）。
    pub day_of_week: u8,
}

impl MjdDate {
    /// `data`から`MjdDate`を読み取る。
    pub fn read(data: &[u8; 2]) -> MjdDate {
        let mjd = data.read_be_16();
        let yd = ((mjd as f32 - 15078.2) / 365.25) as u16;
        let md = ((mjd as f32 - 14956.1 - (yd as f32 * 365.25) as u16 as f32) / 30.6001) as u8;

        let day = (mjd - 14956 - (yd as f32 * 365.25) as u16 - (md as f32 * 30.6001) as u16) as u8;
        let day_of_week = ((mjd + 2) % 7 + 1) as u8;
        let (year, month) = if md == 14 || md == 15 {
            (yd + 1, md - 1 - 12)
        } else {
            (yd, md - 1)
        };

        MjdDate {
            year,
            month,
            day,
            day_of_week,
        }
    }
}

impl fmt::Debug for MjdDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (1900 + self.year).fmt(f)?;

        f.write_char('-')?;
        write_hundreds(f, self.month)?;

        f.write_char('-')?;
        write_hundreds(f, self.day)
    }
}

impl fmt::Display for MjdDate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// 修正ユリウス日と日本標準時からなる日付時刻。
#[derive(Clone, PartialEq, Eq)]
pub struct DateTime {
    /// 修正ユリウス日。
    pub date: MjdDate,
    /// 時（0～23）。
    pub hour: u8,
    /// 分（0～59）。
    pub minute: u8,
    /// 秒（0～60）。
    pub second: u8,
}

impl DateTime {
    /// `data`から`DateTime`を読み取る。
    pub fn read(data: &[u8; 5]) -> DateTime {
        let date = MjdDate::read(&data[0..=1].try_into().unwrap());

        let hour = crate::utils::read_bcd_digit(data[2]);
        let minute = crate::utils::read_bcd_digit(data[3]);
        let second = crate::utils::read_bcd_digit(data[4]);

        DateTime {
            date,
            hour,
            minute,
            second,
        }
    }
}

impl fmt::Debug for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.date.fmt(f)?;
        f.write_char(' ')?;

        write_hundreds(f, self.hour)?;
        f.write_char(':')?;
        write_hundreds(f, self.minute)?;
        f.write_char(':')?;
        write_hundreds(f, self.second)
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
