//! セクションに現れる記述子。

use std::fmt;

use crate::eight::AribStr;
use crate::lang::LangCode;
use crate::pid::Pid;
use crate::time::DateTime;
use crate::utils::BytesExt;

/// 記述子を表すトレイト。
pub trait Descriptor<'a>: Sized {
    /// この記述子のタグ。
    const TAG: u8;

    /// `data`から記述子を読み取る。
    ///
    /// `data`には`descriptor_tag`と`descriptor_length`は含まない。
    fn read(data: &'a [u8]) -> Option<Self>;
}

/// パース前の記述子。
pub struct RawDescriptor<'a> {
    /// 記述子のタグ。
    pub tag: u8,

    /// 記述子の内容。
    pub data: &'a [u8],
}

impl<'a> fmt::Debug for RawDescriptor<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "RawDescriptor {{ tag: 0x{:02X}, data: {} bytes }}", self.tag, self.data.len())
    }
}

/// 複数の記述子からなる記述子群。
#[derive(Clone, PartialEq, Eq)]
pub struct DescriptorBlock<'a>(&'a [u8]);

impl<'a> DescriptorBlock<'a> {
    /// `data`から`length`バイト分の記述子群を読み取り後続データと共に返す。
    ///
    /// 記述子の内容はパースせず、`get`メソッドで初めてパースする。
    ///
    /// データ長が不足している場合は`None`を返す。
    // `length`が`u16`なのは規格上`u16`以上の長さになることがなく、
    // 呼び出し側でのキャストが無意味であるため。
    pub fn read_with_len(data: &'a [u8], length: u16) -> Option<(DescriptorBlock<'a>, &'a [u8])> {
        let (block, rem) = data.split_at_checked(length as usize)?;
        Some((DescriptorBlock(block), rem))
    }

    /// `data`の先頭2バイトを12ビットの長さとして記述子群を読み取り、後続データと共に返す。
    ///
    /// データ長が不足している場合は`None`を返す。
    #[inline]
    pub fn read(data: &'a [u8]) -> Option<(DescriptorBlock<'a>, &'a [u8])> {
        if data.len() < 2 {
            return None;
        }

        let length = data[0..=1].read_be_16() & 0b0000_1111_1111_1111;
        DescriptorBlock::read_with_len(&data[2..], length)
    }

    /// 内包する記述子群のイテレーターを返す。
    #[inline]
    pub fn iter(&self) -> DescriptorIter<'a> {
        DescriptorIter(self.0)
    }

    /// 内包する記述子群から`T`のタグと一致する記述子を読み取って返す。
    ///
    /// `T`のタグと一致する記述子がない場合は`None`を返す。
    pub fn get<T: Descriptor<'a>>(&self) -> Option<T> {
        self.iter()
            .find(|d| d.tag == T::TAG)
            .and_then(|d| T::read(d.data))
    }

    /// 内包する記述子群から`T`のタグと一致する記述子をすべて読み取って返す。
    pub fn get_all<T: Descriptor<'a>>(&self) -> impl Iterator<Item = T> + 'a {
        self.iter().filter_map(|d| {
            if d.tag == T::TAG {
                T::read(d.data)
            } else {
                None
            }
        })
    }
}

impl<'a> fmt::Debug for DescriptorBlock<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("DescriptorBlock(")?;
        f.debug_list().entries(self).finish()?;
        f.write_str(")")
    }
}

impl<'a> IntoIterator for &DescriptorBlock<'a> {
    type Item = RawDescriptor<'a>;
    type IntoIter = DescriptorIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// [`DescriptorBlock`]のイテレーター。
#[derive(Clone)]
pub struct DescriptorIter<'a>(&'a [u8]);

impl<'a> Iterator for DescriptorIter<'a> {
    type Item = RawDescriptor<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let [tag, length, ref rem @ ..] = *self.0 else {
            return None;
        };
        let (data, tail) = rem.split_at_checked(length as usize)?;

        self.0 = tail;
        Some(RawDescriptor { tag, data })
    }
}

impl<'a> std::iter::FusedIterator for DescriptorIter<'a> {}

impl<'a> fmt::Debug for DescriptorIter<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DescriptorIter(")?;
        f.debug_list().entries(self.clone()).finish()?;
        f.write_str(")")
    }
}

/// ストリーム形式種別。
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamType(pub u8);

impl StreamType {
    /// ISO/IEC 11172-2映像。
    pub const MPEG1_VIDEO: StreamType = StreamType(0x01);
    /// ITU-T勧告H.262|ISO/IEC 13818-2映像。
    pub const MPEG2_VIDEO: StreamType = StreamType(0x02);
    /// ISO/IEC 11172-3音声。
    pub const MPEG1_AUDIO: StreamType = StreamType(0x03);
    /// ISO/IEC 13818-3音声。
    pub const MPEG2_AUDIO: StreamType = StreamType(0x04);
    /// プライベートデータを収容したPESパケット。
    pub const PRIVATE_DATA: StreamType = StreamType(0x06);
    /// ISO/IEC 13818-7音声（ADTSトランスポート構造）。
    pub const AAC: StreamType = StreamType(0x0F);
    /// ISO/IEC 13818-6（タイプD）。
    pub const ISO_IEC_13818_6_TYPE_D: StreamType = StreamType(0x0D);
    /// ITU-T勧告H.264|ISO/IEC 14496-10映像。
    pub const H264: StreamType = StreamType(0x1B);
    /// HEVC映像ストリーム。
    pub const H265: StreamType = StreamType(0x24);

    /// 字幕。
    pub const CAPTION: StreamType = Self::PRIVATE_DATA;
    /// データ放送。
    pub const DATA_CARROUSEL: StreamType = Self::ISO_IEC_13818_6_TYPE_D;
}

impl fmt::Debug for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StreamType(0x{:02X})", self.0)
    }
}

/// サービス形式種別。
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceType(pub u8);

impl ServiceType {
    /// デジタルTVサービス。
    pub const DIGITAL_TV: ServiceType = ServiceType(0x01);
    /// デジタル音声サービス。
    pub const DIGITAL_AUDIO: ServiceType = ServiceType(0x02);
    /// データサービス。
    pub const DATA: ServiceType = ServiceType(0xC0);
}

impl fmt::Debug for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceType(0x{:02X})", self.0)
    }
}

/// 限定受信方式記述子。
#[derive(Debug)]
pub struct ConditionalAccessDescriptor<'a> {
    /// 限定受信方式識別。
    pub ca_system_id: u16,
    /// 限定受信PID。
    pub ca_pid: Pid,
    /// プライベートデータ。
    pub private_data: &'a [u8],
}

impl<'a> Descriptor<'a> for ConditionalAccessDescriptor<'a> {
    const TAG: u8 = 0x09;

    fn read(data: &'a [u8]) -> Option<ConditionalAccessDescriptor<'a>> {
        if data.len() < 4 {
            log::debug!("invalid ConditionalAccessDescriptor");
            return None;
        }

        let ca_system_id = data[0..=1].read_be_16();
        let ca_pid = Pid::read(&data[2..=3]);
        let private_data = &data[4..];

        Some(ConditionalAccessDescriptor {
            ca_system_id,
            ca_pid,
            private_data,
        })
    }
}

/// ネットワーク名記述子。
#[derive(Debug, PartialEq, Eq)]
pub struct NetworkNameDescriptor<'a> {
    /// ネットワーク名。
    pub network_name: &'a AribStr,
}

impl<'a> Descriptor<'a> for NetworkNameDescriptor<'a> {
    const TAG: u8 = 0x40;

    fn read(data: &'a [u8]) -> Option<NetworkNameDescriptor<'a>> {
        Some(NetworkNameDescriptor {
            network_name: AribStr::from_bytes(data),
        })
    }
}

/// サービスリスト記述子におけるサービス。
#[derive(Debug)]
pub struct ServiceEntry {
    /// サービス識別。
    pub service_id: u16,
    /// サービス形式種別。
    pub service_type: ServiceType,
}

/// サービスリスト記述子。
#[derive(Debug)]
pub struct ServiceListDescriptor {
    /// サービスを格納する配列。
    pub services: Vec<ServiceEntry>,
}

impl Descriptor<'_> for ServiceListDescriptor {
    const TAG: u8 = 0x41;

    fn read(data: &[u8]) -> Option<ServiceListDescriptor> {
        let services = data
            .chunks_exact(3)
            .map(|chunk| ServiceEntry {
                service_id: chunk[0..=1].read_be_16(),
                service_type: ServiceType(chunk[2]),
            })
            .collect();

        Some(ServiceListDescriptor { services })
    }
}

/// サービス記述子。
#[derive(Debug, PartialEq, Eq)]
pub struct ServiceDescriptor<'a> {
    /// サービス形式種別。
    pub service_type: ServiceType,
    /// 事業者名。
    pub service_provider_name: &'a AribStr,
    /// サービス名。
    pub service_name: &'a AribStr,
}

impl<'a> Descriptor<'a> for ServiceDescriptor<'a> {
    const TAG: u8 = 0x48;

    fn read(data: &'a [u8]) -> Option<ServiceDescriptor<'a>> {
        let [service_type, service_provider_name_length, ref data @ ..] = *data else {
            log::debug!("invalid ServiceDescriptor");
            return None;
        };
        let Some((service_provider_name, data)) =
            data.split_at_checked(service_provider_name_length as usize)
        else {
            log::debug!("invalid ServiceDescriptor::service_provider_name");
            return None;
        };
        let [service_name_length, ref service_name @ ..] = *data else {
            log::debug!("invalid ServiceDescriptor::service_name_length");
            return None;
        };
        if service_name.len() != service_name_length as usize {
            log::debug!("invalid ServiceDescriptor::service_name");
            return None;
        }

        Some(ServiceDescriptor {
            service_type: ServiceType(service_type),
            service_provider_name: AribStr::from_bytes(service_provider_name),
            service_name: AribStr::from_bytes(service_name),
        })
    }
}

/// 短形式イベント記述子。
#[derive(Debug, PartialEq, Eq)]
pub struct ShortEventDescriptor<'a> {
    /// 言語コード。
    pub lang_code: LangCode,
    /// 番組名。
    pub event_name: &'a AribStr,
    /// 番組記述。
    pub text: &'a AribStr,
}

impl<'a> Descriptor<'a> for ShortEventDescriptor<'a> {
    const TAG: u8 = 0x4D;

    fn read(data: &'a [u8]) -> Option<ShortEventDescriptor<'a>> {
        if data.len() < 4 {
            log::debug!("invalid ShortEventDescriptor");
            return None;
        }

        let lang_code = LangCode(data[0..=2].try_into().unwrap());
        let event_name_length = data[3];
        let Some((event_name, data)) = data[4..].split_at_checked(event_name_length as usize)
        else {
            log::debug!("invalid ShortEventDescriptor::event_name");
            return None;
        };
        let [text_length, ref text @ ..] = *data else {
            log::debug!("invalid ShortEventDescriptor::text_length");
            return None;
        };
        if text.len() != text_length as usize {
            log::debug!("invalid ShortEventDescriptor::text");
            return None;
        }

        Some(ShortEventDescriptor {
            lang_code,
            event_name: AribStr::from_bytes(event_name),
            text: AribStr::from_bytes(text),
        })
    }
}

/// 拡張形式イベント記述子における項目。
#[derive(Debug, PartialEq, Eq)]
pub struct ExtendedEventItem<'a> {
    /// 項目名。
    pub item_description: &'a AribStr,
    /// 項目記述。
    pub item: &'a AribStr,
}

/// 拡張形式イベント記述子。
#[derive(Debug, PartialEq, Eq)]
pub struct ExtendedEventDescriptor<'a> {
    /// 記述子番号（4ビット）。
    pub descriptor_number: u8,
    /// 最終記述子番号（4ビット）。
    pub last_descriptor_number: u8,
    /// 言語コード。
    pub lang_code: LangCode,
    /// 項目を格納する配列。
    pub items: Vec<ExtendedEventItem<'a>>,
    /// 拡張記述。
    pub text: &'a AribStr,
}

impl<'a> Descriptor<'a> for ExtendedEventDescriptor<'a> {
    const TAG: u8 = 0x4E;

    fn read(data: &'a [u8]) -> Option<ExtendedEventDescriptor<'a>> {
        if data.len() < 5 {
            log::debug!("invalid ExtendedEventDescriptor");
            return None;
        }

        let descriptor_number = (data[0] & 0b11110000) >> 4;
        let last_descriptor_number = data[0] & 0b00001111;
        let lang_code = LangCode(data[1..=3].try_into().unwrap());
        let length_of_items = data[4];
        let Some((mut data, rem)) = data[5..].split_at_checked(length_of_items as usize) else {
            log::debug!("invalid ExtendedEventDescriptor::length_of_items");
            return None;
        };

        let mut items = Vec::new();
        while !data.is_empty() {
            let [item_description_length, ref rem @ ..] = *data else {
                log::debug!("invalid ExtendedEventDescriptor::item_description_length");
                return None;
            };
            let Some((item_description, rem)) =
                rem.split_at_checked(item_description_length as usize)
            else {
                log::debug!("invalid ExtendedEventDescriptor::item_description");
                return None;
            };

            let [item_length, ref rem @ ..] = *rem else {
                log::debug!("invalid ExtendedEventDescriptor::item_length");
                return None;
            };
            let Some((item, rem)) = rem.split_at_checked(item_length as usize) else {
                log::debug!("invalid ExtendedEventDescriptor::item");
                return None;
            };
            data = rem;

            items.push(ExtendedEventItem {
                item_description: AribStr::from_bytes(item_description),
                item: AribStr::from_bytes(item),
            });
        }

        let [text_length, ref text @ ..] = *rem else {
            log::debug!("invalid ExtendedEventDescriptor::text_length");
            return None;
        };
        if text.len() != text_length as usize {
            log::debug!("invalid ExtendedEventDescriptor::text");
            return None;
        }

        Some(ExtendedEventDescriptor {
            descriptor_number,
            last_descriptor_number,
            lang_code,
            items,
            text: AribStr::from_bytes(text),
        })
    }
}

/// コンポーネント記述子。
#[derive(Debug, PartialEq, Eq)]
pub struct ComponentDescriptor<'a> {
    /// コンポーネント内容（4ビット）。
    pub stream_content: u8,
    /// コンポーネント種別。
    pub component_type: u8,
    /// コンポーネントタグ。
    pub component_tag: u8,
    /// 言語コード。
    pub lang_code: LangCode,
    /// コンポーネント記述。
    pub text: &'a AribStr,
}

impl<'a> Descriptor<'a> for ComponentDescriptor<'a> {
    const TAG: u8 = 0x50;

    fn read(data: &'a [u8]) -> Option<ComponentDescriptor<'a>> {
        if data.len() < 6 {
            log::debug!("invalid ComponentDescriptor");
            return None;
        }

        Some(ComponentDescriptor {
            stream_content: data[0] & 0b00001111,
            component_type: data[1],
            component_tag: data[2],
            lang_code: LangCode(data[3..=5].try_into().unwrap()),
            text: AribStr::from_bytes(&data[6..]),
        })
    }
}

/// ストリーム識別記述子。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamIdDescriptor {
    /// コンポーネントタグ。
    pub component_tag: u8,
}

impl Descriptor<'_> for StreamIdDescriptor {
    const TAG: u8 = 0x52;

    fn read(data: &[u8]) -> Option<StreamIdDescriptor> {
        let [component_tag] = *data else {
            log::debug!("invalid StreamIdDescriptor");
            return None;
        };

        Some(StreamIdDescriptor { component_tag })
    }
}

/// コンテント分類。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentGenre {
    /// ジャンル1（4ビット）。
    pub large_genre_classification: u8,
    /// ジャンル2（4ビット）。
    pub middle_genre_classification: u8,
    /// ユーザジャンル（4ビット）。
    pub user_genre_1: u8,
    /// ユーザジャンル（4ビット）。
    pub user_genre_2: u8,
}

/// コンテント記述子。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDescriptor {
    /// [`ContentGenre`]の配列。
    pub genres: Vec<ContentGenre>,
}

impl Descriptor<'_> for ContentDescriptor {
    const TAG: u8 = 0x54;

    fn read(data: &[u8]) -> Option<ContentDescriptor> {
        // genresは7要素以下
        if data.len() > 2 * 7 {
            log::debug!("invalid ContentDescriptor");
            return None;
        }

        let genres = data
            .chunks_exact(2)
            .map(|chunk| ContentGenre {
                large_genre_classification: (chunk[0] & 0b11110000) >> 4,
                middle_genre_classification: chunk[0] & 0b00001111,
                user_genre_1: (chunk[1] & 0b11110000) >> 4,
                user_genre_2: chunk[1] & 0b00001111,
            })
            .collect();

        Some(ContentDescriptor { genres })
    }
}

/// ローカル時間オフセット。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTimeOffsetEntry {
    /// 国コード。
    pub country_code: LangCode,
    /// 国地域識別（6ビット）。
    pub country_region_id: u8,
    /// ローカル時間オフセット極性。
    pub local_time_offset_polarity: bool,
    /// ローカル時間オフセット（4桁BCDの時分）。
    pub local_time_offset: u16,
    /// 変更時刻。
    pub time_of_change: DateTime,
    /// 変更後時間オフセット（4桁BCDの時分）。
    pub next_time_offset: u16,
}

/// ローカル時間オフセット記述子。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTimeOffsetDescriptor {
    /// ローカル時間オフセットを格納する配列。
    pub time_offsets: Vec<LocalTimeOffsetEntry>,
}

impl Descriptor<'_> for LocalTimeOffsetDescriptor {
    const TAG: u8 = 0x58;

    fn read(data: &[u8]) -> Option<LocalTimeOffsetDescriptor> {
        let time_offsets = data
            .chunks_exact(13)
            .map(|chunk| LocalTimeOffsetEntry {
                country_code: LangCode(chunk[0..=2].try_into().unwrap()),
                country_region_id: (chunk[3] & 0b11111100) >> 2,
                local_time_offset_polarity: chunk[3] & 0b00000001 != 0,
                local_time_offset: chunk[4..=5].read_be_16(),
                time_of_change: DateTime::read(chunk[6..=10].try_into().unwrap()),
                next_time_offset: chunk[11..=12].read_be_16(),
            })
            .collect();

        Some(LocalTimeOffsetDescriptor { time_offsets })
    }
}

/// TS情報記述子における伝送種別。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsInformationTransmissionType {
    /// 伝送種別情報。
    pub transmission_type_info: u8,
    /// サービス識別。
    pub service_ids: Vec<u16>,
}

/// TS情報記述子。
#[derive(Debug, PartialEq, Eq)]
pub struct TsInformationDescriptor<'a> {
    /// リモコンキー識別。
    pub remote_control_key_id: u8,
    /// TS名記述。
    pub ts_name: &'a AribStr,
    /// 伝送種別を格納する配列。
    pub transmission_types: Vec<TsInformationTransmissionType>,
}

impl<'a> Descriptor<'a> for TsInformationDescriptor<'a> {
    const TAG: u8 = 0xCD;

    fn read(data: &'a [u8]) -> Option<TsInformationDescriptor<'a>> {
        if data.len() < 2 {
            log::debug!("invalid TsInformationDescriptor");
            return None;
        }

        let remote_control_key_id = data[0];
        let length_of_ts_name = (data[1] & 0b11111100) >> 2;
        let transmission_type_count = data[1] & 0b00000011;
        let Some((ts_name, mut data)) = data[2..].split_at_checked(length_of_ts_name as usize)
        else {
            log::debug!("invalid TsInformationDescriptor::ts_name");
            return None;
        };

        let mut transmission_types = Vec::with_capacity(transmission_type_count as usize);
        for _ in 0..transmission_type_count {
            if data.len() < 2 {
                log::debug!("invalid TsInformationTransmissionType");
                return None;
            }

            let transmission_type_info = data[0];
            let num_of_service = data[1];
            let Some((service_ids, rem)) =
                data[2..].split_at_checked(2 * num_of_service as usize)
            else {
                log::debug!("invalid TsInformationTransmissionType::service_ids");
                return None;
            };
            let service_ids = service_ids.chunks_exact(2).map(<[u8]>::read_be_16).collect();
            data = rem;

            transmission_types.push(TsInformationTransmissionType {
                transmission_type_info,
                service_ids,
            });
        }

        Some(TsInformationDescriptor {
            remote_control_key_id,
            ts_name: AribStr::from_bytes(ts_name),
            transmission_types,
        })
    }
}

/// ブロードキャスタ名記述子。
#[derive(Debug, PartialEq, Eq)]
pub struct BroadcasterNameDescriptor<'a> {
    /// ブロードキャスタ名。
    pub broadcaster_name: &'a AribStr,
}

impl<'a> Descriptor<'a> for BroadcasterNameDescriptor<'a> {
    const TAG: u8 = 0xD8;

    fn read(data: &'a [u8]) -> Option<BroadcasterNameDescriptor<'a>> {
        Some(BroadcasterNameDescriptor {
            broadcaster_name: AribStr::from_bytes(data),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_block() {
        // length=9: [0x52, 1, 0x87] + [0x09, 4, ...]
        let data = [
            0x00, 0x09, 0x52, 0x01, 0x87, 0x09, 0x04, 0x00, 0x05, 0xE0, 0x31, 0xAA,
        ];
        let (block, rem) = DescriptorBlock::read(&data).unwrap();
        assert_eq!(rem, &[0xAA]);
        assert_eq!(block.iter().count(), 2);

        let stream_id = block.get::<StreamIdDescriptor>().unwrap();
        assert_eq!(stream_id.component_tag, 0x87);

        let ca = block.get::<ConditionalAccessDescriptor>().unwrap();
        assert_eq!(ca.ca_system_id, 0x0005);
        assert_eq!(ca.ca_pid, Pid::new(0x0031));
        assert!(ca.private_data.is_empty());

        assert!(block.get::<ServiceDescriptor>().is_none());

        // 長さ不足
        assert!(DescriptorBlock::read(&[0x00]).is_none());
        assert!(DescriptorBlock::read(&[0x00, 0x03, 0x52, 0x01]).is_none());
    }

    #[test]
    fn test_service_descriptor() {
        let data = [0x01, 0x02, b'N', b'H', 0x03, b'K', b'1', b'2'];
        let sd = ServiceDescriptor::read(&data).unwrap();
        assert_eq!(sd.service_type, ServiceType::DIGITAL_TV);
        assert_eq!(sd.service_provider_name.as_bytes(), b"NH");
        assert_eq!(sd.service_name.as_bytes(), b"K12");

        // サービス名の長さが合わない
        assert!(ServiceDescriptor::read(&data[..7]).is_none());
    }

    #[test]
    fn test_short_event_descriptor() {
        let data = [b'j', b'p', b'n', 0x02, 0x41, 0x42, 0x01, 0x43];
        let sed = ShortEventDescriptor::read(&data).unwrap();
        assert_eq!(sed.lang_code, LangCode::JPN);
        assert_eq!(sed.event_name.as_bytes(), &[0x41, 0x42]);
        assert_eq!(sed.text.as_bytes(), &[0x43]);
    }

    #[test]
    fn test_content_descriptor() {
        let data = [0x01, 0xFF, 0x23, 0x45];
        let cd = ContentDescriptor::read(&data).unwrap();
        assert_eq!(cd.genres.len(), 2);
        assert_eq!(cd.genres[0].large_genre_classification, 0x0);
        assert_eq!(cd.genres[0].middle_genre_classification, 0x1);
        assert_eq!(cd.genres[1].large_genre_classification, 0x2);
        assert_eq!(cd.genres[1].user_genre_1, 0x4);

        assert!(ContentDescriptor::read(&[0x00; 16]).is_none());
    }
}
