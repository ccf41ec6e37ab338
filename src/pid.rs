//! PID関連。

use std::fmt;
use std::ops;

use crate::utils::BytesExt;

/// MPEG2-TSのPID（13ビット）。
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pid(u16);

// 定数のほとんどはARIB STD-B10による。
impl Pid {
    /// PIDの最大値。
    pub const MAX: u16 = 0x1FFF;

    /// プログラムアソシエーションテーブル（Program Association Table）。
    pub const PAT: Pid = Pid::new(0x0000);
    /// 限定受信テーブル（Conditional Access Table）。
    pub const CAT: Pid = Pid::new(0x0001);
    /// ネットワーク情報テーブル（Network Information Table）。
    pub const NIT: Pid = Pid::new(0x0010);
    /// サービス記述テーブル（Service Description Table）。
    pub const SDT: Pid = Pid::new(0x0011);
    /// イベント情報テーブル（Event Information Table）。
    pub const EIT: Pid = Pid::new(0x0012);
    /// 時刻日付オフセットテーブル（Time Offset Table）。
    pub const TOT: Pid = Pid::new(0x0014);
    /// ブロードキャスタ情報テーブル（Broadcaster Information Table）。
    pub const BIT: Pid = Pid::new(0x0024);
    /// 3セグメント受信機での表示を目的としたEITの総称。
    // ARIB TR-B14より。
    pub const M_EIT: Pid = Pid::new(0x0026);
    /// 1セグメント受信機での表示を目的としたEITの総称。
    // ARIB TR-B14より。
    pub const L_EIT: Pid = Pid::new(0x0027);
    /// 全受信機共通データテーブル（Common Data Table）。
    pub const CDT: Pid = Pid::new(0x0029);
    /// ヌルパケット（Null packet）。
    pub const NULL: Pid = Pid::new(0x1FFF);

    /// `Pid`を生成する。
    ///
    /// # パニック
    ///
    /// `pid`の値が範囲外の際はパニックする。
    #[inline]
    pub const fn new(pid: u16) -> Pid {
        assert!(pid <= Pid::MAX);
        Pid(pid)
    }

    /// `pid`がPIDとして範囲内であれば`Pid`を生成する。
    #[inline]
    pub const fn try_new(pid: u16) -> Option<Pid> {
        if pid > Pid::MAX {
            None
        } else {
            Some(Pid(pid))
        }
    }

    /// `data`からPIDを読み出す。
    ///
    /// # パニック
    ///
    /// `data`の長さが2未満の場合、このメソッドはパニックする。
    #[inline]
    pub fn read(data: &[u8]) -> Pid {
        Pid(data[0..=1].read_be_16() & 0x1FFF)
    }

    /// PIDを`u16`で返す。
    #[inline]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

impl Default for Pid {
    fn default() -> Self {
        Pid::NULL
    }
}

impl From<Pid> for u16 {
    fn from(value: Pid) -> Self {
        value.get()
    }
}

impl fmt::Debug for Pid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Pid(0x{:04X})", self.0)
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// [`Pid`]をキーにして値`V`にアクセスができるテーブル。
///
/// データはヒープに確保される。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PidTable<V>(Box<[V]>);

impl<V> PidTable<V> {
    /// `f`を呼び出した戻り値から`PidTable`を生成する。
    pub fn from_fn<F: FnMut(Pid) -> V>(mut f: F) -> PidTable<V> {
        let table = (0..=Pid::MAX).map(|pid| f(Pid(pid))).collect();
        PidTable(table)
    }

    /// テーブルを回すイテレーターを返す。
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<V> {
        self.0.iter()
    }

    /// テーブルを可変で回すイテレーターを返す。
    #[inline]
    pub fn iter_mut(&mut self) -> std::slice::IterMut<V> {
        self.0.iter_mut()
    }
}

impl<V> ops::Index<Pid> for PidTable<V> {
    type Output = V;

    #[inline]
    fn index(&self, pid: Pid) -> &Self::Output {
        &self.0[pid.get() as usize]
    }
}

impl<V> ops::IndexMut<Pid> for PidTable<V> {
    #[inline]
    fn index_mut(&mut self, pid: Pid) -> &mut Self::Output {
        &mut self.0[pid.get() as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid() {
        assert_eq!(Pid::new(0x1FFF), Pid::NULL);
        std::panic::catch_unwind(|| Pid::new(0x2000)).unwrap_err();
        assert_eq!(Pid::try_new(0x1FFF), Some(Pid::NULL));
        assert_eq!(Pid::try_new(0x2000), None);

        assert_eq!(Pid::read(&u16::to_be_bytes(0x0000)), Pid::new(0x0000));
        assert_eq!(Pid::read(&u16::to_be_bytes(0x2000)), Pid::new(0x0000));
        assert_eq!(Pid::read(&u16::to_be_bytes(0x3FFF)), Pid::NULL);

        assert_eq!(Pid::default(), Pid::NULL);

        assert_eq!(Pid::PAT.get(), 0x0000);
        assert_eq!(u16::from(Pid::NULL), 0x1FFF);

        assert_eq!(format!("{}", Pid::NULL), "8191");
        assert_eq!(format!("{:?}", Pid::PAT), "Pid(0x0000)");
    }

    #[test]
    fn test_pid_table() {
        let mut table = PidTable::from_fn(|pid| pid.get());
        assert_eq!(table[Pid::PAT], 0x0000);
        assert_eq!(table[Pid::NULL], 0x1FFF);

        table[Pid::CAT] = 0xFFFF;
        assert_eq!(table[Pid::CAT], 0xFFFF);

        assert_eq!(table.iter().count(), Pid::MAX as usize + 1);
        for v in table.iter_mut() {
            *v = 0;
        }
        assert_eq!(table[Pid::NULL], 0);
    }
}
