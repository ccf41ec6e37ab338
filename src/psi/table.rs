//! セクションで伝送されるテーブルの定義。

use std::num::NonZeroU16;
use std::ops::RangeInclusive;

use crate::pid::Pid;
use crate::psi::desc::{DescriptorBlock, StreamType};
use crate::psi::{PsiSection, PsiTable};
use crate::time::DateTime;
use crate::utils::BytesExt;

/// 進行状態。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RunningStatus {
    /// 未定義。
    Undefined,
    /// 非実行中。
    NotRunning,
    /// 数秒以内に開始（例：映像記録用）。
    StartsSoon,
    /// 停止中。
    Pausing,
    /// 実行中。
    Running,
    /// 予約。
    Reserved,
}

impl From<u8> for RunningStatus {
    #[inline]
    fn from(value: u8) -> RunningStatus {
        match value {
            0 => RunningStatus::Undefined,
            1 => RunningStatus::NotRunning,
            2 => RunningStatus::StartsSoon,
            3 => RunningStatus::Pausing,
            4 => RunningStatus::Running,
            _ => RunningStatus::Reserved,
        }
    }
}

/// PMTのあるPIDの定義。
#[derive(Debug)]
pub struct PatProgram {
    /// 放送番組番号識別。
    pub program_number: NonZeroU16,
    /// PMTのPID。
    pub program_map_pid: Pid,
}

/// PAT（Program Association Table）。
#[derive(Debug)]
pub struct Pat {
    /// トランスポートストリーム識別。
    pub transport_stream_id: u16,

    /// NITのPID。
    pub network_pid: Pid,

    /// PMTのPIDを格納する配列。
    ///
    /// 放送番組番号識別が0のエントリー（NIT）は含まない。
    pub pmts: Vec<PatProgram>,
}

impl Pat {
    /// PATのテーブルID。
    pub const TABLE_ID: u8 = 0x00;
}

impl PsiTable<'_> for Pat {
    fn read(psi: &PsiSection) -> Option<Pat> {
        if psi.table_id != Self::TABLE_ID {
            log::debug!("invalid Pat::table_id");
            return None;
        }
        let Some(syntax) = psi.syntax.as_ref() else {
            log::debug!("invalid Pat::syntax");
            return None;
        };

        let transport_stream_id = syntax.table_id_extension;

        let mut network_pid = Pid::default();
        let mut pmts = Vec::new();
        for chunk in psi.data.chunks_exact(4) {
            let program_number = chunk[0..=1].read_be_16();
            let pid = Pid::read(&chunk[2..=3]);

            if let Some(program_number) = NonZeroU16::new(program_number) {
                // PMT
                pmts.push(PatProgram {
                    program_number,
                    program_map_pid: pid,
                });
            } else {
                // NIT
                network_pid = pid;
            }
        }

        Some(Pat {
            transport_stream_id,
            network_pid,
            pmts,
        })
    }
}

/// CAT（Conditional Access Table）。
#[derive(Debug)]
pub struct Cat<'a> {
    /// 記述子の塊。
    pub descriptors: DescriptorBlock<'a>,
}

impl<'a> Cat<'a> {
    /// CATのテーブルID。
    pub const TABLE_ID: u8 = 0x01;
}

impl<'a> PsiTable<'a> for Cat<'a> {
    fn read(psi: &PsiSection<'a>) -> Option<Cat<'a>> {
        if psi.table_id != Self::TABLE_ID {
            log::debug!("invalid Cat::table_id");
            return None;
        }

        let (descriptors, _) = DescriptorBlock::read_with_len(psi.data, psi.data.len() as u16)?;

        Some(Cat { descriptors })
    }
}

/// 各サービスを構成するストリームのPIDの定義。
#[derive(Debug)]
pub struct PmtStream<'a> {
    /// ストリーム形式種別。
    pub stream_type: StreamType,
    /// エレメンタリーPID。
    pub elementary_pid: Pid,
    /// 記述子の塊。
    pub descriptors: DescriptorBlock<'a>,
}

/// PMT（Program Map Table）。
#[derive(Debug)]
pub struct Pmt<'a> {
    /// 放送番組番号識別。
    pub program_number: u16,
    /// PCRのPID。
    pub pcr_pid: Pid,
    /// 記述子の塊。
    pub descriptors: DescriptorBlock<'a>,
    /// ストリームのPIDを格納する配列。
    pub streams: Vec<PmtStream<'a>>,
}

impl<'a> Pmt<'a> {
    /// PMTのテーブルID。
    pub const TABLE_ID: u8 = 0x02;
}

impl<'a> PsiTable<'a> for Pmt<'a> {
    fn read(psi: &PsiSection<'a>) -> Option<Pmt<'a>> {
        if psi.table_id != Self::TABLE_ID {
            log::debug!("invalid Pmt::table_id");
            return None;
        }
        let Some(syntax) = psi.syntax.as_ref() else {
            log::debug!("invalid Pmt::syntax");
            return None;
        };

        let data = psi.data;
        if data.len() < 4 {
            log::debug!("invalid Pmt");
            return None;
        }

        let program_number = syntax.table_id_extension;
        let pcr_pid = Pid::read(&data[0..=1]);
        let Some((descriptors, mut data)) = DescriptorBlock::read(&data[2..]) else {
            log::debug!("invalid Pmt::descriptors");
            return None;
        };

        let mut streams = Vec::new();
        while !data.is_empty() {
            if data.len() < 5 {
                log::debug!("invalid PmtStream");
                return None;
            }

            let stream_type = StreamType(data[0]);
            let elementary_pid = Pid::read(&data[1..=2]);
            let Some((descriptors, rem)) = DescriptorBlock::read(&data[3..]) else {
                log::debug!("invalid PmtStream::descriptors");
                return None;
            };
            data = rem;

            streams.push(PmtStream {
                stream_type,
                elementary_pid,
                descriptors,
            });
        }

        Some(Pmt {
            program_number,
            pcr_pid,
            descriptors,
            streams,
        })
    }
}

/// トランスポートストリームの物理的構成に関する情報。
#[derive(Debug)]
pub struct TransportStreamConfig<'a> {
    /// トランスポートストリーム識別。
    pub transport_stream_id: u16,
    /// オリジナルネットワーク識別。
    pub original_network_id: u16,
    /// トランスポート記述子の塊。
    pub transport_descriptors: DescriptorBlock<'a>,
}

/// NIT（Network Information Table）。
#[derive(Debug)]
pub struct Nit<'a> {
    /// ネットワーク識別。
    pub network_id: u16,
    /// ネットワーク記述子の塊。
    pub network_descriptors: DescriptorBlock<'a>,
    /// TSの物理的構成を格納する配列。
    pub transport_streams: Vec<TransportStreamConfig<'a>>,
}

impl<'a> Nit<'a> {
    /// 自ネットワークにおけるNITのテーブルID。
    pub const TABLE_ID_ACTUAL: u8 = 0x40;
    /// 他ネットワークにおけるNITのテーブルID。
    pub const TABLE_ID_OTHER: u8 = 0x41;
}

impl<'a> PsiTable<'a> for Nit<'a> {
    fn read(psi: &PsiSection<'a>) -> Option<Nit<'a>> {
        if psi.table_id != Self::TABLE_ID_ACTUAL && psi.table_id != Self::TABLE_ID_OTHER {
            log::debug!("invalid Nit::table_id");
            return None;
        }
        let Some(syntax) = psi.syntax.as_ref() else {
            log::debug!("invalid Nit::syntax");
            return None;
        };

        let data = psi.data;
        if data.len() < 2 {
            log::debug!("invalid Nit");
            return None;
        }

        let network_id = syntax.table_id_extension;
        let Some((network_descriptors, data)) = DescriptorBlock::read(data) else {
            log::debug!("invalid Nit::network_descriptors");
            return None;
        };

        if data.len() < 2 {
            log::debug!("invalid Nit::transport_stream_loop_length");
            return None;
        }
        let transport_stream_loop_length = data[0..=1].read_be_16() & 0b0000_1111_1111_1111;
        let Some(mut data) = data[2..].get(..transport_stream_loop_length as usize) else {
            log::debug!("invalid Nit::transport_streams");
            return None;
        };

        let mut transport_streams = Vec::new();
        while !data.is_empty() {
            if data.len() < 6 {
                log::debug!("invalid NitTransportStream");
                return None;
            }

            let transport_stream_id = data[0..=1].read_be_16();
            let original_network_id = data[2..=3].read_be_16();
            let Some((transport_descriptors, rem)) = DescriptorBlock::read(&data[4..]) else {
                log::debug!("invalid NitTransportStream::transport_descriptors");
                return None;
            };
            data = rem;

            transport_streams.push(TransportStreamConfig {
                transport_stream_id,
                original_network_id,
                transport_descriptors,
            });
        }

        Some(Nit {
            network_id,
            network_descriptors,
            transport_streams,
        })
    }
}

/// 特定のトランスポートストリームに含まれるサービス。
// h_eit_flag等の定義はARIB TR-B14による。
#[derive(Debug, PartialEq, Eq)]
pub struct SdtService<'a> {
    /// サービス識別。
    pub service_id: u16,
    /// 当該サービスに対するH-EITが存在するかどうか。
    pub h_eit_flag: bool,
    /// 当該サービスに対するM-EITが存在するかどうか。
    pub m_eit_flag: bool,
    /// 当該サービスに対するL-EITが存在するかどうか。
    pub l_eit_flag: bool,
    /// EIT［スケジュール］フラグ。
    pub eit_schedule_flag: bool,
    /// EIT［現在／次］フラグ。
    pub eit_present_following_flag: bool,
    /// 進行状態。
    pub running_status: RunningStatus,
    /// スクランブル。
    pub free_ca_mode: bool,
    /// 記述子の塊。
    pub descriptors: DescriptorBlock<'a>,
}

/// SDT（Service Description Table）の共通データ。
#[derive(Debug, PartialEq, Eq)]
pub struct SdtCommon<'a> {
    /// トランスポートストリーム識別。
    pub transport_stream_id: u16,
    /// オリジナルネットワーク識別。
    pub original_network_id: u16,
    /// TSのサービスを格納する配列。
    pub services: Vec<SdtService<'a>>,
}

impl<'a> SdtCommon<'a> {
    fn read(psi: &PsiSection<'a>) -> Option<SdtCommon<'a>> {
        let data = psi.data;
        if data.len() < 3 {
            log::debug!("invalid SdtCommon");
            return None;
        }
        let Some(syntax) = psi.syntax.as_ref() else {
            log::debug!("invalid SdtCommon::syntax");
            return None;
        };

        let transport_stream_id = syntax.table_id_extension;
        let original_network_id = data[0..=1].read_be_16();

        let mut data = &data[3..];
        let mut services = Vec::new();
        while !data.is_empty() {
            if data.len() < 5 {
                log::debug!("invalid SdtService");
                return None;
            }

            let service_id = data[0..=1].read_be_16();
            let h_eit_flag = data[2] & 0b00010000 != 0;
            let m_eit_flag = data[2] & 0b00001000 != 0;
            let l_eit_flag = data[2] & 0b00000100 != 0;
            let eit_schedule_flag = data[2] & 0b00000010 != 0;
            let eit_present_following_flag = data[2] & 0b00000001 != 0;
            let running_status = ((data[3] & 0b11100000) >> 5).into();
            let free_ca_mode = data[3] & 0b00010000 != 0;
            let Some((descriptors, rem)) = DescriptorBlock::read(&data[3..]) else {
                log::debug!("invalid SdtService::descriptors");
                return None;
            };
            data = rem;

            services.push(SdtService {
                service_id,
                h_eit_flag,
                m_eit_flag,
                l_eit_flag,
                eit_schedule_flag,
                eit_present_following_flag,
                running_status,
                free_ca_mode,
                descriptors,
            });
        }

        Some(SdtCommon {
            transport_stream_id,
            original_network_id,
            services,
        })
    }
}

/// SDT（Service Description Table）。
#[derive(Debug, PartialEq, Eq)]
pub enum Sdt<'a> {
    /// 現在のTSにおけるSDT。
    Actual(SdtCommon<'a>),
    /// 他のTSにおけるSDT。
    Other(SdtCommon<'a>),
}

impl<'a> Sdt<'a> {
    /// 現在のTSにおけるSDTのテーブルID。
    pub const TABLE_ID_ACTUAL: u8 = 0x42;
    /// 他のTSにおけるSDTのテーブルID。
    pub const TABLE_ID_OTHER: u8 = 0x46;
}

impl<'a> PsiTable<'a> for Sdt<'a> {
    fn read(psi: &PsiSection<'a>) -> Option<Self> {
        match psi.table_id {
            Self::TABLE_ID_ACTUAL => Some(Sdt::Actual(SdtCommon::read(psi)?)),
            Self::TABLE_ID_OTHER => Some(Sdt::Other(SdtCommon::read(psi)?)),
            _ => {
                log::debug!("invalid Sdt");
                None
            }
        }
    }
}

/// 各サービスに含まれるイベント。
#[derive(Debug, PartialEq, Eq)]
pub struct EitEvent<'a> {
    /// イベント識別。
    pub event_id: u16,
    /// 開始時間。
    pub start_time: DateTime,
    /// 継続時間（単位は秒）。
    pub duration: u32,
    /// 進行状態。
    pub running_status: RunningStatus,
    /// スクランブル。
    pub free_ca_mode: bool,
    /// 記述子の塊。
    pub descriptors: DescriptorBlock<'a>,
}

/// EIT（Event Information Table）の共通データ。
#[derive(Debug, PartialEq, Eq)]
pub struct EitCommon<'a> {
    /// サービス識別。
    pub service_id: u16,
    /// セクション番号。
    ///
    /// EIT［現在／次］ではセクション番号0が現在のイベント、
    /// 1が次のイベントを格納する。
    pub section_number: u8,
    /// トランスポートストリーム識別。
    pub transport_stream_id: u16,
    /// オリジナルネットワーク識別。
    pub original_network_id: u16,
    /// セグメント最終セクション番号。
    pub segment_last_section_number: u8,
    /// 最終テーブル識別。
    pub last_table_id: u8,
    /// イベントを格納する配列。
    pub events: Vec<EitEvent<'a>>,
}

impl<'a> EitCommon<'a> {
    fn read(psi: &PsiSection<'a>) -> Option<EitCommon<'a>> {
        let Some(syntax) = psi.syntax.as_ref() else {
            log::debug!("invalid EitCommon::syntax");
            return None;
        };

        let data = psi.data;
        if data.len() < 6 {
            log::debug!("invalid EitCommon");
            return None;
        }

        let service_id = syntax.table_id_extension;
        let section_number = syntax.section_number;
        let transport_stream_id = data[0..=1].read_be_16();
        let original_network_id = data[2..=3].read_be_16();
        let segment_last_section_number = data[4];
        let last_table_id = data[5];

        let mut data = &data[6..];
        let mut events = Vec::new();
        while !data.is_empty() {
            if data.len() < 12 {
                log::debug!("invalid EitEvent");
                return None;
            }

            let event_id = data[0..=1].read_be_16();
            let start_time = DateTime::read(data[2..=6].try_into().unwrap());
            let duration = data[7..=9].read_bcd_second();
            let running_status = ((data[10] & 0b11100000) >> 5).into();
            let free_ca_mode = data[10] & 0b00010000 != 0;
            let Some((descriptors, rem)) = DescriptorBlock::read(&data[10..]) else {
                log::debug!("invalid EitEvent::descriptors");
                return None;
            };
            data = rem;

            events.push(EitEvent {
                event_id,
                start_time,
                duration,
                running_status,
                free_ca_mode,
                descriptors,
            });
        }

        Some(EitCommon {
            service_id,
            section_number,
            transport_stream_id,
            original_network_id,
            segment_last_section_number,
            last_table_id,
            events,
        })
    }
}

/// EIT（Event Information Table）。
#[derive(Debug, PartialEq, Eq)]
pub enum Eit<'a> {
    /// 自TSにおけるイベント［現在／次］。
    ActualPf(EitCommon<'a>),
    /// 他TSにおけるイベント［現在／次］。
    OtherPf(EitCommon<'a>),
    /// 自TSにおけるイベント［スケジュール］。
    ActualSchedule(EitCommon<'a>),
    /// 他TSにおけるイベント［スケジュール］。
    OtherSchedule(EitCommon<'a>),
}

impl<'a> Eit<'a> {
    /// 自TSにおけるイベント［現在／次］を格納するEITのテーブルID。
    pub const TABLE_ID_PF_ACTUAL: u8 = 0x4E;
    /// 他TSにおけるイベント［現在／次］を格納するEITのテーブルID。
    pub const TABLE_ID_PF_OTHER: u8 = 0x4F;
    /// 自TSにおけるイベント［スケジュール］を格納するEITのテーブルID。
    pub const TABLE_ID_SCHEDULE_ACTUAL: RangeInclusive<u8> = 0x50..=0x5F;
    /// 他TSにおけるイベント［スケジュール］を格納するEITのテーブルID。
    pub const TABLE_ID_SCHEDULE_OTHER: RangeInclusive<u8> = 0x60..=0x6F;

    /// EITが取り得るすべてのテーブルID。
    pub fn table_ids() -> Vec<u8> {
        (Self::TABLE_ID_PF_ACTUAL..=*Self::TABLE_ID_SCHEDULE_OTHER.end()).collect()
    }

    /// 内包する[`EitCommon`]を返す。
    pub fn common(&self) -> &EitCommon<'a> {
        match self {
            Eit::ActualPf(common)
            | Eit::OtherPf(common)
            | Eit::ActualSchedule(common)
            | Eit::OtherSchedule(common) => common,
        }
    }
}

impl<'a> PsiTable<'a> for Eit<'a> {
    fn read(psi: &PsiSection<'a>) -> Option<Eit<'a>> {
        match psi.table_id {
            Self::TABLE_ID_PF_ACTUAL => Some(Eit::ActualPf(EitCommon::read(psi)?)),
            Self::TABLE_ID_PF_OTHER => Some(Eit::OtherPf(EitCommon::read(psi)?)),
            0x50..=0x5F => Some(Eit::ActualSchedule(EitCommon::read(psi)?)),
            0x60..=0x6F => Some(Eit::OtherSchedule(EitCommon::read(psi)?)),
            _ => {
                log::debug!("invalid Eit");
                None
            }
        }
    }
}

/// TOT（Time Offset Table）。
#[derive(Debug, PartialEq, Eq)]
pub struct Tot<'a> {
    /// 現在日付、現在時刻。
    pub jst_time: DateTime,
    /// 記述子の塊。
    pub descriptors: DescriptorBlock<'a>,
}

impl<'a> Tot<'a> {
    /// TOTのテーブルID。
    pub const TABLE_ID: u8 = 0x73;
}

impl<'a> PsiTable<'a> for Tot<'a> {
    fn read(psi: &PsiSection<'a>) -> Option<Tot<'a>> {
        if psi.table_id != Self::TABLE_ID {
            log::debug!("invalid Tot::table_id");
            return None;
        }

        let data = psi.data;
        if data.len() < 7 {
            log::debug!("invalid Tot");
            return None;
        }

        let jst_time = DateTime::read(&data[0..=4].try_into().unwrap());
        let Some((descriptors, _)) = DescriptorBlock::read(&data[5..]) else {
            log::debug!("invalid Tot::descriptors");
            return None;
        };

        Some(Tot {
            jst_time,
            descriptors,
        })
    }
}

/// ブロードキャスタごとの情報。
#[derive(Debug, PartialEq, Eq)]
pub struct BitBroadcaster<'a> {
    /// ブロードキャスタ識別。
    pub broadcaster_id: u8,
    /// ブロードキャスタ記述子の塊。
    pub broadcaster_descriptors: DescriptorBlock<'a>,
}

/// BIT（Broadcaster Information Table）。
#[derive(Debug, PartialEq, Eq)]
pub struct Bit<'a> {
    /// オリジナルネットワーク識別。
    pub original_network_id: u16,
    /// 事業者表示適否。
    pub broadcast_view_propriety: bool,
    /// 第1記述子の塊。
    pub first_descriptors: DescriptorBlock<'a>,
    /// ブロードキャスタごとの情報を格納する配列。
    pub broadcasters: Vec<BitBroadcaster<'a>>,
}

impl<'a> Bit<'a> {
    /// BITのテーブルID。
    pub const TABLE_ID: u8 = 0xC4;
}

impl<'a> PsiTable<'a> for Bit<'a> {
    fn read(psi: &PsiSection<'a>) -> Option<Bit<'a>> {
        if psi.table_id != Self::TABLE_ID {
            log::debug!("invalid Bit::table_id");
            return None;
        }
        let Some(syntax) = psi.syntax.as_ref() else {
            log::debug!("invalid Bit::syntax");
            return None;
        };

        let data = psi.data;
        if data.len() < 2 {
            log::debug!("invalid Bit");
            return None;
        }

        let original_network_id = syntax.table_id_extension;
        let broadcast_view_propriety = data[0] & 0b00010000 != 0;
        let Some((first_descriptors, mut data)) = DescriptorBlock::read(data) else {
            log::debug!("invalid Bit::first_descriptors");
            return None;
        };

        let mut broadcasters = Vec::new();
        while !data.is_empty() {
            if data.len() < 3 {
                log::debug!("invalid Bit::broadcaster_id");
                return None;
            }

            let broadcaster_id = data[0];
            let Some((broadcaster_descriptors, rem)) = DescriptorBlock::read(&data[1..]) else {
                log::debug!("invalid Bit::broadcaster_descriptors");
                return None;
            };
            data = rem;

            broadcasters.push(BitBroadcaster {
                broadcaster_id,
                broadcaster_descriptors,
            });
        }

        Some(Bit {
            original_network_id,
            broadcast_view_propriety,
            first_descriptors,
            broadcasters,
        })
    }
}

/// CDTのデータ属性。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CdtDataType(pub u8);

impl CdtDataType {
    /// ロゴデータを表すデータ属性。
    pub const LOGO: CdtDataType = CdtDataType(0x01);
}

/// CDT（Common Data Table）。
#[derive(Debug)]
pub struct Cdt<'a> {
    /// ダウンロードデータ識別。
    pub download_data_id: u16,
    /// オリジナルネットワーク識別。
    pub original_network_id: u16,
    /// データ属性。
    pub data_type: CdtDataType,
    /// 記述子の塊。
    pub descriptors: DescriptorBlock<'a>,
    /// データモジュールバイト。
    pub data_module: &'a [u8],
}

impl<'a> Cdt<'a> {
    /// CDTのテーブルID。
    pub const TABLE_ID: u8 = 0xC8;
}

impl<'a> PsiTable<'a> for Cdt<'a> {
    fn read(psi: &PsiSection<'a>) -> Option<Cdt<'a>> {
        if psi.table_id != Self::TABLE_ID {
            log::debug!("invalid Cdt::table_id");
            return None;
        }
        let Some(syntax) = psi.syntax.as_ref() else {
            log::debug!("invalid Cdt::syntax");
            return None;
        };

        let data = psi.data;
        if data.len() < 5 {
            log::debug!("invalid Cdt");
            return None;
        }

        let download_data_id = syntax.table_id_extension;
        let original_network_id = data[0..=1].read_be_16();
        let data_type = CdtDataType(data[2]);
        let Some((descriptors, data)) = DescriptorBlock::read(&data[3..]) else {
            log::debug!("invalid Cdt::descriptors");
            return None;
        };

        Some(Cdt {
            download_data_id,
            original_network_id,
            data_type,
            descriptors,
            data_module: data,
        })
    }
}
