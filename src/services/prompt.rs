//! 暂存提示词构建
//!
//! 指令必须约束生成服务保留房间结构，只添加家具和装饰。

use crate::models::{AspectRatio, RoomType, StagingStyle};

const STRUCTURE_RULES: &str = "Strictly follow these instructions: Do not change the room layout, walls, windows, doors, ceiling structures, or any existing fixtures. Only add furniture and decorative props. The props and furniture should be added without modifying the original picture's structure in any way. Ensure all added furniture is realistically scaled to fit the room's dimensions. The floor must also remain unchanged.";

/// 构建发送给生成服务的指令文本
///
/// # 参数
/// - `style`: 装修风格
/// - `aspect_ratio`: 输出宽高比
/// - `room_type`: 房间类型，`Other` 时要求服务自动识别
/// - `feedback`: 用户反馈，去掉空白后非空才会加入
pub fn build_staging_prompt(
    style: StagingStyle,
    aspect_ratio: AspectRatio,
    room_type: RoomType,
    feedback: Option<&str>,
) -> String {
    let mut prompt = format!(
        "{} Ensure the final image has an aspect ratio of {}. ",
        STRUCTURE_RULES, aspect_ratio
    );

    if room_type.is_unspecified() {
        prompt.push_str(&format!(
            "Please identify the type of this empty room and stage it with appropriate furniture and decor in a {} style.",
            style
        ));
    } else {
        prompt.push_str(&format!(
            "Please stage this empty {} with appropriate furniture and decor in a {} style.",
            room_type, style
        ));
    }

    if let Some(note) = feedback.filter(|note| !note.trim().is_empty()) {
        prompt.push_str(&format!(
            " Please incorporate the following user feedback to refine the image: \"{}\".",
            note
        ));
    }

    prompt
}
