//! セクションの再組み立て。

use std::collections::VecDeque;
use std::io;

use arrayvec::ArrayVec;

use crate::payload::{PayloadUnit, Payloads};
use crate::pid::{Pid, PidTable};
use crate::psi::{PsiError, PsiSection, PsiTable};

/// セクション長の最大値による部分バッファーの容量。
const MAX_SECTION_SIZE: usize = 3 + 4093;

/// 完全でCRC32の検証に通ったセクション。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pid: Pid,
    data: Vec<u8>,
}

impl Section {
    /// このセクションが伝送されていたPID。
    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// テーブル識別。
    #[inline]
    pub fn table_id(&self) -> u8 {
        self.data[0]
    }

    /// セクション番号。
    ///
    /// セクションシンタクスがない場合は`None`を返す。
    pub fn section_number(&self) -> Option<u8> {
        self.psi().and_then(|psi| Some(psi.syntax?.section_number))
    }

    /// セクション全体のバイト列。
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// [`PsiSection`]としてパースし直して返す。
    pub fn psi(&self) -> Option<PsiSection> {
        PsiSection::parse(&self.data).ok().map(|(psi, _)| psi)
    }

    /// `T`のテーブルとして読み取る。
    ///
    /// テーブルの形式が不正な場合は`None`を返す。
    pub fn read<'a, T: PsiTable<'a>>(&'a self) -> Option<T> {
        T::read(&self.psi()?)
    }
}

/// PIDごとの組み立て状態。
struct PartialSection {
    buffer: Box<ArrayVec<u8, MAX_SECTION_SIZE>>,
    /// ユニット先頭からの蓄積中かどうか。
    synced: bool,
}

impl PartialSection {
    fn new() -> PartialSection {
        PartialSection {
            buffer: Box::new(ArrayVec::new()),
            synced: false,
        }
    }

    /// 連続性が失われたため次のユニット先頭まで蓄積を破棄する。
    fn desync(&mut self) {
        self.buffer.clear();
        self.synced = false;
    }

    fn write(&mut self, pid: Pid, data: &[u8], is_start: bool, out: &mut SectionSink) {
        if is_start {
            self.buffer.clear();
            self.synced = true;
        } else if !self.synced {
            return;
        }

        let len = usize::min(self.buffer.remaining_capacity(), data.len());
        self.buffer.extend(data[..len].iter().copied());

        let mut buf = self.buffer.as_slice();
        loop {
            match PsiSection::parse(buf) {
                Err(PsiError::InsufficientLength) | Err(PsiError::EndOfPsi) => break,
                Err(PsiError::Corrupted(len)) => {
                    log::debug!("corrupt section: {:?}", pid);
                    buf = &buf[len..];
                }
                Err(PsiError::Crc32(len)) => {
                    log::debug!("section crc32 error: {:?}", pid);
                    buf = &buf[len..];
                }
                Ok((psi, len)) => {
                    if out.table_ids.contains(&psi.table_id) {
                        out.queue.push_back(Section {
                            pid,
                            data: buf[..len].to_vec(),
                        });
                    }
                    buf = &buf[len..];
                }
            }
        }

        // 処理済みの部分を前へ詰める
        let remaining = buf.len();
        let offset = self.buffer.len() - remaining;
        if offset > 0 {
            self.buffer.copy_within(offset.., 0);
            self.buffer.truncate(remaining);
        }
    }
}

struct SectionSink {
    table_ids: Vec<u8>,
    queue: VecDeque<Section>,
}

/// ペイロードから完全なセクションを到着順に取り出すイテレーター。
///
/// PIDごとに独立した部分バッファーを保持し、ユニット先頭のポインターフィールドを
/// 解釈して複数パケットに跨るセクションを組み立てる。CRC32の検証に失敗した
/// セクションは記録して読み飛ばし、同一PIDの後続セクションは引き続き取り出される。
pub struct Sections<I> {
    payloads: Payloads<I>,
    partial: PidTable<Option<PartialSection>>,
    out: SectionSink,
}

impl<I> Sections<I> {
    /// 受け入れる`table_ids`のセクションを`payloads`から取り出す`Sections`を生成する。
    ///
    /// `table_ids`に含まれないテーブルのセクションは黙って捨てられる。
    pub fn new(payloads: Payloads<I>, table_ids: &[u8]) -> Sections<I> {
        Sections {
            payloads,
            partial: PidTable::from_fn(|_| None),
            out: SectionSink {
                table_ids: table_ids.to_vec(),
                queue: VecDeque::new(),
            },
        }
    }

    fn feed(&mut self, unit: PayloadUnit) {
        let partial = self.partial[unit.pid].get_or_insert_with(PartialSection::new);

        if unit.unit_start {
            let Some((&pointer, rest)) = unit.data.split_first() else {
                return;
            };
            let Some((prev, next)) = rest.split_at_checked(pointer as usize) else {
                // ポインターフィールド異常
                partial.desync();
                return;
            };

            // ポインターフィールドまでは前のセクションの続き
            if !prev.is_empty() && unit.cc_ok {
                partial.write(unit.pid, prev, false, &mut self.out);
            }
            partial.write(unit.pid, next, true, &mut self.out);
        } else if unit.cc_ok {
            partial.write(unit.pid, &unit.data, false, &mut self.out);
        } else {
            // 欠落を跨いだセクションは組み立てない
            partial.desync();
        }
    }
}

impl<I: Iterator<Item = io::Result<crate::packet::Packet>>> Iterator for Sections<I> {
    type Item = io::Result<Section>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(section) = self.out.queue.pop_front() {
                return Some(Ok(section));
            }

            let unit = match self.payloads.next()? {
                Ok(unit) => unit,
                Err(e) => return Some(Err(e)),
            };
            self.feed(unit);
        }
    }
}
