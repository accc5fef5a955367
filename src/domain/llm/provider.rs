use std::fmt::Debug;

use async_trait::async_trait;

use super::{LlmRequest, LlmResponse};
use crate::domain::DomainError;

/// Trait for chat-completion providers
#[async_trait]
pub trait LlmProvider: Send + Sync + Debug {
    /// Send a chat completion request
    async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::domain::llm::Message;

    /// Provider replaying queued replies; the last reply repeats
    #[derive(Debug)]
    pub struct MockLlmProvider {
        name: &'static str,
        replies: Mutex<VecDeque<Result<String, String>>>,
        last: Mutex<Option<Result<String, String>>>,
        pub requests: Mutex<Vec<LlmRequest>>,
    }

    impl MockLlmProvider {
        pub fn new(name: &'static str) -> Self {
            Self {
                name,
                replies: Mutex::new(VecDeque::new()),
                last: Mutex::new(None),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn with_reply(self, content: impl Into<String>) -> Self {
            self.replies.lock().unwrap().push_back(Ok(content.into()));
            self
        }

        pub fn with_error(self, error: impl Into<String>) -> Self {
            self.replies.lock().unwrap().push_back(Err(error.into()));
            self
        }

        pub fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        /// Last user message of the most recent request
        pub fn last_prompt(&self) -> Option<String> {
            self.requests
                .lock()
                .unwrap()
                .last()
                .and_then(|r| r.last_user_content().map(str::to_string))
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError> {
            self.requests.lock().unwrap().push(request);

            let reply = {
                let mut replies = self.replies.lock().unwrap();
                let mut last = self.last.lock().unwrap();
                match replies.pop_front() {
                    Some(reply) => {
                        *last = Some(reply.clone());
                        Some(reply)
                    }
                    None => last.clone(),
                }
            };

            match reply {
                Some(Ok(content)) => Ok(LlmResponse::new(
                    "mock-response",
                    model,
                    Message::assistant(content),
                )),
                Some(Err(error)) => Err(DomainError::provider(self.name, error)),
                None => Err(DomainError::provider(self.name, "No mock response configured")),
            }
        }

        fn provider_name(&self) -> &'static str {
            self.name
        }
    }
}
