//! ARIB規格のMPEG2-TSを扱うためのクレート。
//!
//! TSパケットの同期・分離からPSIセクションの組み立て、各種テーブルの読み取り、
//! 及び字幕のSubRip形式への変換までを、入力を遅延して読み進める
//! イテレーターの連鎖として提供する。
//!
//! - [`Packet::iter`][packet::Packet::iter]：TSパケットの読み取り
//! - [`Payloads`][payload::Payloads]：PIDごとのペイロード分離
//! - [`Sections`][section::Sections]：PSIセクションの組み立て
//! - [`PesUnits`][pes::PesUnits]：PESパケットの組み立て
//! - [`Captions`][caption::Captions]・[`Srts`][srt::Srts]：字幕の取り出しと変換

#![deny(missing_docs)]

pub mod caption;
pub mod crc32;
pub mod eight;
pub mod lang;
pub mod packet;
pub mod payload;
pub mod pes;
pub mod pid;
pub mod psi;
pub mod section;
pub mod srt;
pub mod time;
mod utils;

pub use eight::AribStr;
pub use packet::Packet;
pub use pid::Pid;
pub use section::{Section, Sections};
