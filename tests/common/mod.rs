#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use virtual_stager::services::encode_inline;
use virtual_stager::{ImageRef, SourceImage, StagingError, StagingGateway, StagingMode, StagingRequest};

pub const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];

pub fn png(name: &str) -> SourceImage {
    SourceImage::new(name, PNG_HEADER.to_vec())
}

/// 网关收到的一次调用
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub file_name: String,
    pub instruction: String,
    pub mode: StagingMode,
}

/// 按脚本返回结果的内存网关
///
/// - 每次调用都会记录文件名、指令和请求类型
/// - `fail_with` 之后该文件的请求都返回 UpstreamError
/// - 带闸门时，请求会一直挂起直到 `release`
#[derive(Default)]
pub struct ScriptedGateway {
    calls: Mutex<Vec<RecordedCall>>,
    failures: Mutex<HashMap<String, String>>,
    gate: Option<Arc<Semaphore>>,
    active: Mutex<HashMap<String, usize>>,
    max_active_same_file: AtomicUsize,
    served: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 所有请求挂起，直到调用 `release`
    pub fn gated() -> Arc<Self> {
        Arc::new(Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::default()
        })
    }

    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn fail_with(&self, file_name: &str, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(file_name.to_string(), message.to_string());
    }

    pub fn succeed(&self, file_name: &str) {
        self.failures.lock().unwrap().remove(file_name);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// 同一文件同时进行中的最大请求数
    pub fn max_active_same_file(&self) -> usize {
        self.max_active_same_file.load(Ordering::SeqCst)
    }

    async fn run(&self, request: StagingRequest) -> Result<ImageRef, StagingError> {
        let file_name = request.image.file_name.clone();
        self.calls.lock().unwrap().push(RecordedCall {
            file_name: file_name.clone(),
            instruction: request.instruction(),
            mode: request.mode,
        });

        {
            let mut active = self.active.lock().unwrap();
            let count = active.entry(file_name.clone()).or_insert(0);
            *count += 1;
            self.max_active_same_file.fetch_max(*count, Ordering::SeqCst);
        }

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        if let Some(count) = self.active.lock().unwrap().get_mut(&file_name) {
            *count -= 1;
        }

        encode_inline(&request.image)?;

        if let Some(message) = self.failures.lock().unwrap().get(&file_name).cloned() {
            return Err(StagingError::Upstream(message));
        }

        let n = self.served.fetch_add(1, Ordering::SeqCst) + 1;
        let payload = STANDARD.encode(format!("staged-{}-{}", file_name, n));
        Ok(ImageRef::from_base64("image/png", &payload))
    }
}

impl StagingGateway for ScriptedGateway {
    fn stage(&self, request: StagingRequest) -> BoxFuture<'_, Result<ImageRef, StagingError>> {
        Box::pin(self.run(request))
    }
}

/// 每个测试独立的临时目录
pub fn temp_dir(tag: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("virtual_stager_{}_{}", tag, uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
