//! 字幕をSubRip形式に変換するための型。

use std::fmt::Write;
use std::io;

use crate::caption::{Caption, Captions};
use crate::pid::Pid;
use crate::time::Timestamp;

/// 既定の表示時刻補正値（ミリ秒）。
///
/// 字幕PESのPTSは映像より早めに打たれるため既定で2秒引く。
pub const DEFAULT_CORRECTION_MS: i64 = -2000;

/// 最後の字幕の表示時間（ミリ秒）。
const LAST_DURATION_MS: i64 = 5000;

/// PTSが一周する時間（ミリ秒）。
const WRAP_MS: i64 = (Timestamp::BASE_WRAP / 90) as i64;

/// 基準時刻`base`からの`pts`の経過時間をミリ秒で返す。
///
/// PTSの33ビット周回を考慮し、`correction_ms`で補正した結果を
/// `0..WRAP_MS`に正規化する。
pub fn absolutize(base: Timestamp, pts: Timestamp, correction_ms: i64) -> i64 {
    let elapsed = (pts.wrapping_base_sub(base) / 90) as i64;
    (elapsed + correction_ms).rem_euclid(WRAP_MS)
}

/// SubRip形式の1エントリー。
#[derive(Debug, PartialEq, Eq)]
pub struct SrtEntry {
    /// 連番（1始まり）。
    pub sequence: u32,
    /// 表示開始時刻（ミリ秒）。
    pub start_ms: i64,
    /// 表示終了時刻（ミリ秒）。
    pub end_ms: i64,
    /// 字幕文。
    pub text: String,
}

impl SrtEntry {
    /// SubRip形式のブロックとして整形して返す。
    ///
    /// エントリー間の区切りとなる空行を末尾に含む。
    pub fn to_block(&self) -> String {
        let mut block = String::new();
        let _ = writeln!(block, "{}", self.sequence);
        let _ = writeln!(
            block,
            "{} --> {}",
            format_time(self.start_ms),
            format_time(self.end_ms)
        );
        let _ = writeln!(block, "{}", self.text);
        block.push('\n');
        block
    }
}

/// ミリ秒を`HH:MM:SS,mmm`形式で整形する。
fn format_time(ms: i64) -> String {
    let ms = ms.max(0);
    format!(
        "{:02}:{:02}:{:02},{:03}",
        ms / 3_600_000,
        ms / 60_000 % 60,
        ms / 1000 % 60,
        ms % 1000
    )
}

/// TSパケット列から字幕をSubRip形式のエントリーとして取り出すイテレーター。
///
/// 各エントリーの表示終了時刻は次の字幕の表示開始時刻とする。
/// ストリーム終端では最後の字幕を5秒間表示する。
pub struct Srts<I> {
    captions: Captions<I>,
    correction_ms: i64,
    /// 最初の字幕のPTSを基準時刻とする。
    base: Option<Timestamp>,
    sequence: u32,
    /// 終了時刻が未確定のエントリー。
    pending: Option<(i64, String)>,
    done: bool,
}

impl<I> Srts<I>
where
    I: Iterator<Item = io::Result<crate::packet::Packet>>,
{
    /// `pid`で運ばれる字幕をSubRip形式で取り出す`Srts`を生成する。
    pub fn new(packets: I, pid: Pid) -> Srts<I> {
        Srts::with_correction(packets, pid, DEFAULT_CORRECTION_MS)
    }

    /// 表示時刻の補正値を指定して`Srts`を生成する。
    ///
    /// 基準時刻は補正後に最初の字幕が時刻0となるように取られる。
    pub fn with_correction(packets: I, pid: Pid, correction_ms: i64) -> Srts<I> {
        Srts {
            captions: Captions::new(packets, pid),
            correction_ms,
            base: None,
            sequence: 0,
            pending: None,
            done: false,
        }
    }

    /// ストリーム全体の基準時刻を指定して`Srts`を生成する。
    ///
    /// `base`には[`Ptses`][crate::payload::Ptses]などで得た
    /// ストリーム先頭のPTSを渡す。
    pub fn with_base(packets: I, pid: Pid, base: Timestamp, correction_ms: i64) -> Srts<I> {
        Srts {
            captions: Captions::new(packets, pid),
            correction_ms,
            base: Some(base),
            sequence: 0,
            pending: None,
            done: false,
        }
    }

    fn start_ms(&mut self, caption: &Caption) -> Option<i64> {
        let pts = caption.pts?;
        let correction_ms = self.correction_ms;
        let base = *self.base.get_or_insert_with(|| {
            // 補正により最初の字幕が負の時刻へ回り込まないよう基準をずらす
            let base = pts.base.wrapping_add_signed(correction_ms * 90);
            Timestamp::new(base & (Timestamp::BASE_WRAP - 1), 0)
        });
        Some(absolutize(base, pts, correction_ms))
    }

    fn emit(&mut self, start_ms: i64, end_ms: i64, text: String) -> SrtEntry {
        self.sequence += 1;
        SrtEntry {
            sequence: self.sequence,
            start_ms,
            end_ms,
            text,
        }
    }
}

impl<I> Iterator for Srts<I>
where
    I: Iterator<Item = io::Result<crate::packet::Packet>>,
{
    type Item = io::Result<SrtEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let Some(caption) = self.captions.next() else {
                // ストリーム終端。残っているエントリーを確定させる
                self.done = true;
                let (start_ms, text) = self.pending.take()?;
                return Some(Ok(self.emit(start_ms, start_ms + LAST_DURATION_MS, text)));
            };
            let caption = match caption {
                Ok(caption) => caption,
                Err(e) => return Some(Err(e)),
            };

            let Some(start_ms) = self.start_ms(&caption) else {
                // PTSが無い字幕は時刻を決められない
                log::debug!("caption without PTS");
                continue;
            };

            let next = (start_ms, caption.text);
            if let Some((prev_start, prev_text)) = self.pending.replace(next) {
                return Some(Ok(self.emit(prev_start, start_ms, prev_text)));
            }
        }
    }
}
