//! The external text-generation collaborator
//!
//! The dispatcher calls [`Generator::generate`] once per task and never
//! retries; any retry policy belongs to the generator itself.

mod gemini;

pub use gemini::GeminiGenerator;

use crate::error::GenerateError;
use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;

/// Turns a prompt into generated text
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate text for `prompt`
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

/// Generator that returns the prompt unchanged; used for dry runs
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoGenerator;

#[async_trait]
impl Generator for EchoGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        Ok(prompt.to_string())
    }
}

/// Generator backed by an async closure taking an owned prompt
pub struct FnGenerator<F, Fut> {
    f: F,
    _marker: PhantomData<fn() -> Fut>,
}

impl<F, Fut> FnGenerator<F, Fut>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, GenerateError>> + Send,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<F, Fut> Generator for FnGenerator<F, Fut>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, GenerateError>> + Send,
{
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        (self.f)(prompt.to_string()).await
    }
}
