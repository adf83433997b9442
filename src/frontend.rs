//! Chat front-end seam.
//!
//! The chat platform itself (message rendering, button menus) is an
//! external collaborator; this module only defines the interface the
//! pipeline talks to, the message segmentation the platform's size limit
//! forces on us, and the caller allow-list gate.

use crate::error::Result;
use async_trait::async_trait;

/// Maximum units per delivered message; longer text must be segmented.
pub const MESSAGE_CHUNK_LIMIT: usize = 4000;

/// Outbound chat interface consumed by the application.
#[async_trait]
pub trait ChatFrontEnd: Send + Sync {
    /// Deliver pre-segmented text chunks in order.
    async fn deliver_text(&self, chunks: &[String]) -> Result<()>;

    /// Present a choice of actions to the caller.
    async fn present_choice(&self, prompt: &str, options: &[String]) -> Result<()>;
}

/// Front end that prints to stdout, used by the CLI.
pub struct StdoutFrontEnd;

#[async_trait]
impl ChatFrontEnd for StdoutFrontEnd {
    async fn deliver_text(&self, chunks: &[String]) -> Result<()> {
        for chunk in chunks {
            println!("{}", chunk);
        }
        Ok(())
    }

    async fn present_choice(&self, prompt: &str, options: &[String]) -> Result<()> {
        println!("{}", prompt);
        for (i, option) in options.iter().enumerate() {
            println!("  {}. {}", i + 1, option);
        }
        Ok(())
    }
}

/// Split `text` into chunks of at most `limit` characters, on character
/// boundaries. An optional header is prepended to the first chunk and
/// counts against its budget.
pub fn split_message(header: Option<&str>, text: &str, limit: usize) -> Vec<String> {
    assert!(limit > 0, "chunk limit must be positive");

    let mut chunks = Vec::new();
    let mut current = String::new();
    if let Some(header) = header {
        current.push_str(header);
    }
    let mut count = current.chars().count();

    for ch in text.chars() {
        if count == limit {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
        current.push(ch);
        count += 1;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Check a caller against the allow-list. An empty list means open access.
pub fn is_caller_allowed(allowed: &[i64], caller: Option<i64>) -> bool {
    if allowed.is_empty() {
        return true;
    }
    matches!(caller, Some(id) if allowed.contains(&id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_message_is_single_chunk() {
        let chunks = split_message(Some("Transcript: Title\n\n"), "hello", MESSAGE_CHUNK_LIMIT);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].starts_with("Transcript: Title"));
        assert!(chunks[0].ends_with("hello"));
    }

    #[test]
    fn test_long_message_is_segmented_within_limit() {
        let text = "x".repeat(9_500);
        let chunks = split_message(None, &text, 4000);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 4000));
        assert_eq!(chunks.iter().map(|c| c.len()).sum::<usize>(), 9_500);
    }

    #[test]
    fn test_multibyte_text_splits_on_char_boundaries() {
        let text = "è".repeat(4001);
        let chunks = split_message(None, &text, 4000);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 4000);
        assert_eq!(chunks[1].chars().count(), 1);
    }

    #[test]
    fn test_header_counts_against_first_chunk() {
        let header = "h".repeat(100);
        let text = "x".repeat(4000);
        let chunks = split_message(Some(&header), &text, 4000);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 4000);
        assert_eq!(chunks[1].chars().count(), 100);
    }

    #[test]
    fn test_caller_gate() {
        assert!(is_caller_allowed(&[], None));
        assert!(is_caller_allowed(&[], Some(7)));
        assert!(is_caller_allowed(&[7, 9], Some(9)));
        assert!(!is_caller_allowed(&[7, 9], Some(8)));
        assert!(!is_caller_allowed(&[7], None));
    }
}
