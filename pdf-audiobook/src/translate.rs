//! Optional translation step between chunking and synthesis.
//!
//! Wraps a `translate-client` provider. A failed call never stops the job:
//! the original text is used instead.

use crate::job::PipelineError;
use crate::text::{TextChunk, split_for_requests};
use std::sync::Arc;
use translate_client::{TranslateProvider, TranslateRequest};

/// Longest text sent in one translation request.
///
/// The Google endpoint carries the text in the query string, so whole
/// documents have to go out in pieces.
pub const MAX_REQUEST_CHARS: usize = 4500;

/// Translates chunk text, or passes it through when disabled.
#[derive(Clone)]
pub struct ChunkTranslator {
    provider: Option<Arc<dyn TranslateProvider>>,
    source_lang: String,
    target_lang: String,
}

impl ChunkTranslator {
    /// Identity translator.
    pub fn disabled() -> Self {
        Self {
            provider: None,
            source_lang: String::new(),
            target_lang: String::new(),
        }
    }

    pub fn new(provider: Arc<dyn TranslateProvider>, source_lang: &str, target_lang: &str) -> Self {
        Self {
            provider: Some(provider),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Translate one piece of text.
    ///
    /// Text longer than `MAX_REQUEST_CHARS` is sent as several requests split
    /// at whitespace, and the translations are joined with a space. Returns
    /// the text to synthesize and whether any part had to keep its original
    /// text because the provider failed.
    pub async fn translate(&self, text: &str, chunk_id: Option<usize>) -> (String, bool) {
        let Some(provider) = &self.provider else {
            return (text.to_string(), false);
        };

        if text.chars().count() <= MAX_REQUEST_CHARS {
            return self.request(provider.as_ref(), text, chunk_id).await;
        }

        let pieces = split_for_requests(text, MAX_REQUEST_CHARS);
        log::debug!(
            "translating {} characters in {} requests",
            text.chars().count(),
            pieces.len()
        );

        let mut translated = Vec::with_capacity(pieces.len());
        let mut fell_back = false;
        for piece in &pieces {
            let (part, failed) = self.request(provider.as_ref(), piece, chunk_id).await;
            fell_back |= failed;
            translated.push(part);
        }

        (translated.join(" "), fell_back)
    }

    async fn request(
        &self,
        provider: &dyn TranslateProvider,
        text: &str,
        chunk_id: Option<usize>,
    ) -> (String, bool) {
        let request = TranslateRequest::new(text, &self.source_lang, &self.target_lang);
        match provider.translate(request).await {
            Ok(response) => (response.text, false),
            Err(e) => {
                let err = PipelineError::Translation {
                    chunk_id,
                    reason: e.to_string(),
                };
                log::warn!("{}; keeping original text", err);
                (text.to_string(), true)
            }
        }
    }

    /// Translate every chunk in order, one call per chunk.
    ///
    /// Returns the chunks to synthesize and the number of fallbacks.
    pub async fn translate_chunks(&self, chunks: Vec<TextChunk>) -> (Vec<TextChunk>, usize) {
        if !self.is_enabled() {
            return (chunks, 0);
        }

        let mut translated = Vec::with_capacity(chunks.len());
        let mut fallbacks = 0;

        for chunk in chunks {
            let (text, fell_back) = self.translate(&chunk.text, Some(chunk.chunk_id)).await;
            if fell_back {
                fallbacks += 1;
            }
            translated.push(TextChunk::new(chunk.chunk_id, text));
        }

        (translated, fallbacks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::process_text;
    use translate_client::MockProvider;

    #[tokio::test]
    async fn test_disabled_is_identity() {
        let chunks = process_text("Hola mundo, esto es una prueba.", 7);
        let (out, fallbacks) = ChunkTranslator::disabled()
            .translate_chunks(chunks.clone())
            .await;
        assert_eq!(out, chunks);
        assert_eq!(fallbacks, 0);
    }

    #[tokio::test]
    async fn test_translates_each_chunk_once() {
        let provider = Arc::new(MockProvider::prefixing("[en]"));
        let translator = ChunkTranslator::new(provider.clone(), "auto", "en");

        let chunks = process_text("aaabbbcc", 3);
        let (out, fallbacks) = translator.translate_chunks(chunks).await;

        let texts: Vec<&str> = out.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["[en]aaa", "[en]bbb", "[en]cc"]);
        assert_eq!(fallbacks, 0);
        assert_eq!(provider.call_count(), 3);
        assert_eq!(provider.received(), vec!["aaa", "bbb", "cc"]);
    }

    #[tokio::test]
    async fn test_failed_chunk_keeps_original() {
        let provider = Arc::new(MockProvider::fails_on_calls(&[1], "[en]"));
        let translator = ChunkTranslator::new(provider, "auto", "en");

        let chunks = process_text("aaabbbcc", 3);
        let (out, fallbacks) = translator.translate_chunks(chunks).await;

        let texts: Vec<&str> = out.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["[en]aaa", "bbb", "[en]cc"]);
        assert_eq!(fallbacks, 1);
        let ids: Vec<usize> = out.iter().map(|c| c.chunk_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_whole_text_fallback() {
        let translator = ChunkTranslator::new(Arc::new(MockProvider::always_fails()), "auto", "en");
        let (text, fell_back) = translator.translate("texto completo", None).await;
        assert_eq!(text, "texto completo");
        assert!(fell_back);
    }

    #[tokio::test]
    async fn test_long_text_is_sent_in_bounded_requests() {
        let provider = Arc::new(MockProvider::prefixing("EN:"));
        let translator = ChunkTranslator::new(provider.clone(), "auto", "en");

        let text = "palabra ".repeat(2000);
        let (out, fell_back) = translator.translate(&text, None).await;
        assert!(!fell_back);

        let received = provider.received();
        assert!(received.len() >= 4);
        assert!(received.iter().all(|r| r.chars().count() <= MAX_REQUEST_CHARS));
        assert_eq!(received.join(" "), text.trim_end());

        let expected: Vec<String> = received.iter().map(|r| format!("EN:{}", r)).collect();
        assert_eq!(out, expected.join(" "));
    }

    #[tokio::test]
    async fn test_long_text_keeps_failed_piece() {
        let provider = Arc::new(MockProvider::fails_on_calls(&[1], "EN:"));
        let translator = ChunkTranslator::new(provider.clone(), "auto", "en");

        let text = "x".repeat(MAX_REQUEST_CHARS) + " " + &"y".repeat(10);
        let (out, fell_back) = translator.translate(&text, None).await;
        assert!(fell_back);
        assert_eq!(provider.call_count(), 2);
        assert_eq!(out, format!("EN:{} {}", "x".repeat(MAX_REQUEST_CHARS), "y".repeat(10)));
    }
}
