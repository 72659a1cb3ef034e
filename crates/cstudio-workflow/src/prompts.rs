//! Prompt templates sent to the models.

use serde_json::{json, Value};

use cstudio_models::{SCENE_COUNT, VIDEO_PROMPT_MARKER};

/// Appended to every image prompt.
pub const IMAGE_QUALITY_SUFFIX: &str = " 保持产品主体清晰，TikTok高转化率风格，写实摄影，高质量，4k。";

/// Placeholder when the user gave no product description.
pub const UNSPECIFIED_PRODUCT: &str = "未指定产品";

/// Shown when the model returned no analysis for a script.
pub const SCRIPT_ANALYSIS_EMPTY: &str = "无法分析脚本";

/// Shown when the model returned no analysis for a video.
pub const VIDEO_ANALYSIS_EMPTY: &str = "无法分析视频";

/// Shown when the script analysis request fails.
pub const SCRIPT_ANALYSIS_UNAVAILABLE: &str = "分析服务暂时不可用";

/// Shown when the video analysis request fails.
pub const VIDEO_ANALYSIS_UNAVAILABLE: &str = "视频分析失败，可能是文件过大或格式不支持";

/// Scene ideation prompt.
pub fn scene_suggestion_prompt(industry: &str, product_description: &str) -> String {
    let product = if product_description.trim().is_empty() {
        UNSPECIFIED_PRODUCT
    } else {
        product_description.trim()
    };

    format!(
        "作为一个TikTok资深电商运营，请为{industry}行业的产品（{product}）构思{SCENE_COUNT}个极具吸引力的TikTok带货场景。\n\
         请返回JSON格式，包含一个数组，每个元素包含 'title' (场景简短名称) 和 'description' \
         (详细的视觉提示词，用于生成图片，包含光影、氛围、背景细节，要求写实风格)。"
    )
}

/// Strict response schema for scene ideation.
pub fn scene_response_schema() -> Value {
    json!({
        "type": "ARRAY",
        "minItems": SCENE_COUNT,
        "maxItems": SCENE_COUNT,
        "items": {
            "type": "OBJECT",
            "properties": {
                "title": {"type": "STRING"},
                "description": {"type": "STRING"}
            },
            "required": ["title", "description"]
        }
    })
}

/// Final prompt for the image model.
pub fn image_prompt(base: &str) -> String {
    format!("{}{}", base, IMAGE_QUALITY_SUFFIX)
}

/// Script critique prompt.
pub fn script_analysis_prompt(script: &str) -> String {
    format!(
        "分析以下TikTok短视频脚本，并给出3条优化建议以提高完播率和转化率。\
         同时，基于这个脚本生成一个适合Veo视频生成模型的英文提示词(Prompt)。\n\n\
         脚本内容:\n{script}\n\n\
         请按如下格式返回:\n\
         【优化建议】\n1. ...\n2. ...\n3. ...\n\n\
         {VIDEO_PROMPT_MARKER}\n(这里放英文Prompt)\n"
    )
}

/// Reference-video breakdown prompt, sent after the video part.
pub fn video_analysis_prompt() -> String {
    format!(
        "你是一位TikTok短视频专家。请分析这段样片视频的内容、运镜、节奏和脚本。\n\n\
         请输出以下内容：\n\
         1. 【脚本拆解】：详细描述视频发生的事情，分镜脚本。\n\
         2. 【优化建议】：如果我想基于这个视频拍摄类似的产品视频，有什么建议？\n\
         3. {VIDEO_PROMPT_MARKER}：请写一段英文Prompt，用于Veo视频生成模型。\
         这段Prompt需要描述一段类似的视频，但是主角可以被替换为通用的\"Product\"。\
         确保描述清楚光影、动作（Cinematic lighting, dynamic camera movement, etc.）。\n"
    )
}
