//! 暂存参数枚举：风格、宽高比、房间类型
//!
//! 均为封闭枚举，未知字符串在解析边界被拒绝。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 装修风格
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StagingStyle {
    #[default]
    Modern,
    Classic,
    Futuristic,
    Colonial,
    Scandinavian,
    Industrial,
    Bohemian,
}

impl StagingStyle {
    /// 全部可选风格（界面下拉顺序）
    pub const ALL: [StagingStyle; 7] = [
        StagingStyle::Modern,
        StagingStyle::Classic,
        StagingStyle::Futuristic,
        StagingStyle::Colonial,
        StagingStyle::Scandinavian,
        StagingStyle::Industrial,
        StagingStyle::Bohemian,
    ];

    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            StagingStyle::Modern => "Modern",
            StagingStyle::Classic => "Classic",
            StagingStyle::Futuristic => "Futuristic",
            StagingStyle::Colonial => "Colonial",
            StagingStyle::Scandinavian => "Scandinavian",
            StagingStyle::Industrial => "Industrial",
            StagingStyle::Bohemian => "Bohemian",
        }
    }
}

/// 输出图片宽高比
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "4:3")]
    Standard,
    #[serde(rename = "16:9")]
    Wide,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 3] = [AspectRatio::Square, AspectRatio::Standard, AspectRatio::Wide];

    pub fn name(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Standard => "4:3",
            AspectRatio::Wide => "16:9",
        }
    }
}

/// 房间类型
///
/// `Other` 表示未指定，生成服务需要自行识别房间类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RoomType {
    #[serde(rename = "Living Room")]
    LivingRoom,
    Bedroom,
    Kitchen,
    Bathroom,
    #[serde(rename = "Dining Room")]
    DiningRoom,
    Office,
    #[default]
    Other,
}

impl RoomType {
    pub const ALL: [RoomType; 7] = [
        RoomType::LivingRoom,
        RoomType::Bedroom,
        RoomType::Kitchen,
        RoomType::Bathroom,
        RoomType::DiningRoom,
        RoomType::Office,
        RoomType::Other,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RoomType::LivingRoom => "Living Room",
            RoomType::Bedroom => "Bedroom",
            RoomType::Kitchen => "Kitchen",
            RoomType::Bathroom => "Bathroom",
            RoomType::DiningRoom => "Dining Room",
            RoomType::Office => "Office",
            RoomType::Other => "Other",
        }
    }

    /// 是否需要让生成服务自动识别房间类型
    pub fn is_unspecified(self) -> bool {
        self == RoomType::Other
    }
}

/// 解析失败时返回的错误（携带原始输入）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOption {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "未知的{}: '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownOption {}

/// 按名称匹配（忽略大小写与首尾空白）
fn parse_by_name<T: Copy>(
    all: &[T],
    name: fn(T) -> &'static str,
    kind: &'static str,
    s: &str,
) -> Result<T, UnknownOption> {
    let wanted = s.trim();
    all.iter()
        .copied()
        .find(|v| name(*v).eq_ignore_ascii_case(wanted))
        .ok_or_else(|| UnknownOption {
            kind,
            value: s.to_string(),
        })
}

impl FromStr for StagingStyle {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_by_name(&Self::ALL, Self::name, "风格", s)
    }
}

impl FromStr for AspectRatio {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_by_name(&Self::ALL, Self::name, "宽高比", s)
    }
}

impl FromStr for RoomType {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_by_name(&Self::ALL, Self::name, "房间类型", s)
    }
}

impl fmt::Display for StagingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
