//! PSIセクションで使われるCRC32。

const POLY: u32 = 0x04C11DB7;

/// `data`全体のCRC32（MPEG-2方式）を計算する。
///
/// 初期値は全ビット1、入出力の反転および最終XORは行わない。
pub fn compute(data: &[u8]) -> u32 {
    let mut crc = u32::MAX;
    for &byte in data {
        crc ^= u32::from(byte) << 24;
        for _ in 0..8 {
            crc = if crc & 0x8000_0000 != 0 {
                (crc << 1) ^ POLY
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// 末尾4バイトにCRC32が付加された`data`が正当かどうかを返す。
#[inline]
pub fn calc(data: &[u8]) -> bool {
    compute(data) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32() {
        let mut data = b"\x00\xB0\x0D\x04\x01\xC1\x00\x00\x00\x01\xE1\x00".to_vec();
        let crc = compute(&data);
        data.extend_from_slice(&crc.to_be_bytes());
        assert!(calc(&data));

        // 1ビットでも壊れていれば検証に失敗する
        data[3] ^= 0x10;
        assert!(!calc(&data));
    }
}
