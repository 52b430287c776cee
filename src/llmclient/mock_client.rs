// src/llmclient/mock_client.rs
// Scripted LLM double for phase 2/3 tests without a live inference endpoint.

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{LlmCallError, LlmClient, LlmRequest};

enum Script {
    Respond(String),
    Fail(String),
    Timeout,
}

/// Replays a fixed sequence of responses, one per call, cycling once
/// exhausted. Records every prompt it was given for assertions.
pub struct MockLlmClient {
    script: Mutex<Vec<Script>>,
    captured: Mutex<Vec<String>>,
}

impl MockLlmClient {
    pub fn respond_with(response: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(vec![Script::Respond(response.into())]),
            captured: Mutex::new(Vec::new()),
        }
    }

    pub fn always_times_out() -> Self {
        Self {
            script: Mutex::new(vec![Script::Timeout]),
            captured: Mutex::new(Vec::new()),
        }
    }

    pub fn sequence(responses: Vec<Result<String, String>>) -> Self {
        let script = responses
            .into_iter()
            .map(|r| match r {
                Ok(s) => Script::Respond(s),
                Err(e) => Script::Fail(e),
            })
            .collect();
        Self {
            script: Mutex::new(script),
            captured: Mutex::new(Vec::new()),
        }
    }

    pub fn captured_prompts(&self) -> Vec<String> {
        self.captured.lock().clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: &LlmRequest) -> Result<String, LlmCallError> {
        self.captured.lock().push(request.prompt.clone());

        let mut script = self.script.lock();
        if script.is_empty() {
            return Ok("{}".to_string());
        }
        let next = if script.len() > 1 {
            script.remove(0)
        } else {
            // Keep replaying the last entry once the script is exhausted.
            match &script[0] {
                Script::Respond(s) => Script::Respond(s.clone()),
                Script::Fail(s) => Script::Fail(s.clone()),
                Script::Timeout => Script::Timeout,
            }
        };

        match next {
            Script::Respond(s) => Ok(s),
            Script::Fail(msg) => Err(LlmCallError::Transient(msg)),
            Script::Timeout => Err(LlmCallError::Timeout),
        }
    }
}
