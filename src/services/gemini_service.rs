//! Gemini 暂存网关
//!
//! ## 技术栈
//! - 使用 `reqwest` 直接调用 `generateContent` 接口
//! - 客户端在启动时构建一次，之后所有请求复用
//! - 凭据在构建时检查，缺失时返回 `StagingError::Configuration`

use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::StagingError;
use crate::models::ImageRef;
use crate::services::encoding::{encode_inline, InlineImage};
use crate::services::staging_gateway::{StagingGateway, StagingRequest};
use crate::utils::logging::truncate_text;

const NO_IMAGE_MESSAGE: &str =
    "AI did not return a staged image. It might have only returned text.";

/// Gemini 暂存网关
pub struct GeminiGateway {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model_name: String,
}

impl GeminiGateway {
    /// 创建网关
    ///
    /// 凭据只在这里检查一次，构建出的网关由控制器持有并复用。
    pub fn new(config: &Config) -> Result<Self, StagingError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                StagingError::Configuration("API_KEY environment variable not set.".to_string())
            })?;

        let endpoint = format!(
            "{}/models/{}:generateContent",
            config.api_base_url.trim_end_matches('/'),
            config.model_name
        );

        Ok(Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            endpoint,
            model_name: config.model_name.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn generate(&self, request: StagingRequest) -> Result<ImageRef, StagingError> {
        let inline = encode_inline(&request.image)?;
        let instruction = request.instruction();

        debug!(
            "调用生成服务，模型: {}，类型: {}，图片: {} ({})",
            self.model_name, request.mode, request.image.file_name, inline.mime_type
        );
        debug!("指令: {}", truncate_text(&instruction, 120));

        let body = build_request_body(&inline, &instruction);

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!("生成服务请求失败: {}", e);
                StagingError::upstream(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.text().await {
                Ok(text) => extract_error_message(&text).unwrap_or(text),
                Err(e) => e.to_string(),
            };
            warn!("生成服务返回错误 {}: {}", status, truncate_text(&message, 200));
            return Err(StagingError::upstream(format!(
                "HTTP {}: {}",
                status.as_u16(),
                message
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| StagingError::upstream(format!("无法解析响应: {}", e)))?;

        extract_image(parsed)
    }
}

impl StagingGateway for GeminiGateway {
    fn stage(&self, request: StagingRequest) -> BoxFuture<'_, Result<ImageRef, StagingError>> {
        Box::pin(self.generate(request))
    }
}

// ========== 请求与响应 ==========

/// 构建请求体：一张内联图片 + 一段指令文本
fn build_request_body(inline: &InlineImage, instruction: &str) -> JsonValue {
    json!({
        "contents": [{
            "parts": [
                {
                    "inlineData": {
                        "mimeType": inline.mime_type,
                        "data": inline.data,
                    }
                },
                { "text": instruction }
            ]
        }],
        "generationConfig": {
            "responseModalities": ["IMAGE", "TEXT"]
        }
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: Option<String>,
    data: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// 从响应中取出第一张图片
fn extract_image(response: GenerateContentResponse) -> Result<ImageRef, StagingError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .map(|r| format!(" (blocked: {})", r))
            .unwrap_or_default();
        return Err(StagingError::upstream(format!("{}{}", NO_IMAGE_MESSAGE, reason)));
    };

    let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
    let mut texts = Vec::new();

    for part in parts {
        if let Some(inline) = part.inline_data {
            let mime_type = inline.mime_type.as_deref().unwrap_or("image/png");
            return Ok(ImageRef::from_base64(mime_type, &inline.data));
        }
        if let Some(text) = part.text {
            texts.push(text);
        }
    }

    if !texts.is_empty() {
        warn!("生成服务只返回了文本: {}", truncate_text(&texts.join(" "), 200));
    }
    if let Some(reason) = candidate.finish_reason {
        debug!("finishReason: {}", reason);
    }

    Err(StagingError::upstream(NO_IMAGE_MESSAGE))
}

/// 从错误响应体中提取 `error.message`
fn extract_error_message(body: &str) -> Option<String> {
    let value: JsonValue = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .map(|m| m.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AspectRatio, RoomType, SourceImage, StagingStyle};
    use crate::services::staging_gateway::StagingMode;
    use crate::services::test_server::{closed_base_url, OneShotServer};

    fn config_with_key(key: Option<&str>) -> Config {
        Config {
            api_key: key.map(|k| k.to_string()),
            ..Config::default()
        }
    }

    fn parse(body: &str) -> GenerateContentResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let err = GeminiGateway::new(&config_with_key(None)).err().unwrap();
        assert_eq!(err.kind(), "ConfigurationError");
        assert!(GeminiGateway::new(&config_with_key(Some(" "))).is_err());
    }

    #[test]
    fn test_endpoint_built_from_config() {
        let gateway = GeminiGateway::new(&config_with_key(Some("k"))).unwrap();
        assert_eq!(
            gateway.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-image-preview:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let inline = InlineImage {
            mime_type: "image/jpeg".to_string(),
            data: "QUJD".to_string(),
        };
        let body = build_request_body(&inline, "stage it");

        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[0]["inlineData"]["data"], "QUJD");
        assert_eq!(parts[1]["text"], "stage it");
        assert_eq!(
            body["generationConfig"]["responseModalities"],
            json!(["IMAGE", "TEXT"])
        );
    }

    #[test]
    fn test_extract_image_part() {
        let response = parse(
            r#"{"candidates":[{"content":{"parts":[
                {"text":"Here is your room"},
                {"inlineData":{"mimeType":"image/png","data":"iVBORw0"}}
            ]}}]}"#,
        );
        let image = extract_image(response).unwrap();
        assert_eq!(image.as_str(), "data:image/png;base64,iVBORw0");
    }

    #[test]
    fn test_extract_defaults_to_png() {
        let response = parse(r#"{"candidates":[{"content":{"parts":[{"inlineData":{"data":"AAAA"}}]}}]}"#);
        assert_eq!(extract_image(response).unwrap().mime_type(), Some("image/png"));
    }

    #[test]
    fn test_text_only_response_is_upstream_error() {
        let response = parse(
            r#"{"candidates":[{"content":{"parts":[{"text":"I cannot do that"}]},"finishReason":"STOP"}]}"#,
        );
        let err = extract_image(response).unwrap_err();
        assert_eq!(
            err,
            StagingError::Upstream(format!("Failed to stage image: {}", NO_IMAGE_MESSAGE))
        );
    }

    #[test]
    fn test_blocked_prompt_reports_reason() {
        let response = parse(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#);
        let err = extract_image(response).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_extract_error_message() {
        let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(extract_error_message(body).as_deref(), Some("API key not valid"));
        assert_eq!(extract_error_message("not json"), None);
    }

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];

    fn sample_request() -> StagingRequest {
        StagingRequest {
            image: SourceImage::new("room.png", PNG_HEADER.to_vec()),
            style: StagingStyle::Modern,
            aspect_ratio: AspectRatio::Square,
            room_type: RoomType::Other,
            refinement_note: None,
            mode: StagingMode::Stage,
        }
    }

    fn gateway_at(base_url: &str) -> GeminiGateway {
        GeminiGateway::new(&Config {
            api_key: Some("test-key".to_string()),
            api_base_url: base_url.to_string(),
            ..Config::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_error_status_carries_provider_message() {
        let server = OneShotServer::start(
            "400 Bad Request",
            r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#,
        )
        .await;
        let gateway = gateway_at(&server.base_url);

        let err = gateway.stage(sample_request()).await.unwrap_err();
        assert_eq!(
            err,
            StagingError::Upstream("Failed to stage image: HTTP 400: API key not valid".to_string())
        );

        let request = server.request().await;
        assert!(request.starts_with("POST /models/gemini-2.5-flash-image-preview:generateContent"));
        assert!(request.to_lowercase().contains("x-goog-api-key: test-key"));
        assert!(request.contains("\"responseModalities\""));
    }

    #[tokio::test]
    async fn test_success_response_yields_image() {
        let server = OneShotServer::start(
            "200 OK",
            r#"{"candidates":[{"content":{"parts":[{"inlineData":{"mimeType":"image/png","data":"iVBORw0"}}]}}]}"#,
        )
        .await;
        let gateway = gateway_at(&server.base_url);

        let image = gateway.stage(sample_request()).await.unwrap();
        assert_eq!(image.as_str(), "data:image/png;base64,iVBORw0");
        server.request().await;
    }

    #[tokio::test]
    async fn test_unreadable_error_body_keeps_cause() {
        // 声明的长度大于实际发送的字节数，读取响应体会失败
        let server = OneShotServer::start_raw(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 100\r\nConnection: close\r\n\r\n{\"err".to_string(),
        )
        .await;
        let gateway = gateway_at(&server.base_url);

        let err = gateway.stage(sample_request()).await.unwrap_err();
        let prefix = "Failed to stage image: HTTP 500: ";
        assert!(err.to_string().starts_with(prefix));
        assert!(err.to_string().len() > prefix.len());
        server.request().await;
    }

    #[tokio::test]
    async fn test_transport_failure_is_upstream_error() {
        let gateway = gateway_at(&closed_base_url().await);

        let err = gateway.stage(sample_request()).await.unwrap_err();
        assert_eq!(err.kind(), "UpstreamError");
        assert!(err.to_string().starts_with("Failed to stage image: "));
        assert!(err.to_string().len() > "Failed to stage image: ".len());
    }

    /// 测试真实的暂存调用
    ///
    /// 运行方式：
    /// ```bash
    /// API_KEY=... STAGE_SAMPLE=room.jpg cargo test test_live_stage -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_live_stage() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = Config::from_env().unwrap();
        let gateway = GeminiGateway::new(&config).unwrap();
        let path = std::env::var("STAGE_SAMPLE").unwrap();
        let bytes = std::fs::read(&path).unwrap();

        let request = StagingRequest {
            image: SourceImage::new(path, bytes),
            style: StagingStyle::Modern,
            aspect_ratio: AspectRatio::Square,
            room_type: RoomType::Other,
            refinement_note: None,
            mode: StagingMode::Stage,
        };

        match gateway.stage(request).await {
            Ok(image) => {
                println!("✅ 暂存成功: {}", truncate_text(image.as_str(), 60));
                assert!(image.as_str().starts_with("data:image/"));
            }
            Err(e) => panic!("暂存失败: {}", e),
        }
    }
}
