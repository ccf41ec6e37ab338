//! バイト列読み取りの補助。

/// BCDの1バイトを十進数として読み取る。
#[inline]
pub fn read_bcd_digit(n: u8) -> u8 {
    (n >> 4) * 10 + (n & 0x0F)
}

/// スライスからビッグエンディアンの整数やBCDを読み取るための拡張トレイト。
///
/// いずれのメソッドも、スライスの長さが足りない場合はパニックする。
/// 呼び出し側で長さを確認できるコードであれば最適化が期待できる。
pub trait BytesExt {
    /// ビッグエンディアンで16ビット符号無し整数を読み取る。
    fn read_be_16(&self) -> u16;

    /// ビッグエンディアンで32ビット符号無し整数を読み取る。
    fn read_be_32(&self) -> u32;

    /// 先頭から`digits`桁のBCDを読み取る。
    fn read_bcd(&self, digits: u32) -> u32;

    /// 6桁BCDの時分秒を秒数として読み取る。
    fn read_bcd_second(&self) -> u32;

    /// 9桁BCDの時分秒ミリ秒をミリ秒数として読み取る。
    fn read_bcd_milli(&self) -> u32;
}

impl BytesExt for [u8] {
    #[inline]
    fn read_be_16(&self) -> u16 {
        u16::from_be_bytes(self[..2].try_into().unwrap())
    }

    #[inline]
    fn read_be_32(&self) -> u32 {
        u32::from_be_bytes(self[..4].try_into().unwrap())
    }

    fn read_bcd(&self, digits: u32) -> u32 {
        (0..digits).fold(0, |v, i| {
            let byte = self[(i / 2) as usize];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0F };
            v * 10 + u32::from(nibble)
        })
    }

    fn read_bcd_second(&self) -> u32 {
        let hour = u32::from(read_bcd_digit(self[0]));
        let minute = u32::from(read_bcd_digit(self[1]));
        let second = u32::from(read_bcd_digit(self[2]));
        hour * 3600 + minute * 60 + second
    }

    fn read_bcd_milli(&self) -> u32 {
        self[..3].read_bcd_second() * 1000 + self[3..].read_bcd(3)
    }
}
