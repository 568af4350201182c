//! Text chunking for TTS processing.

use super::TextChunk;

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Split text into consecutive windows of `chunk_size` characters.
///
/// Windows are counted in `char`s so multi-byte characters are never cut.
/// The last window may be shorter. Joining the result gives back `text`
/// exactly. A `chunk_size` of 0 is treated as 1.
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::with_capacity(text.len() / chunk_size + 1);
    let mut current = String::new();
    let mut count = 0;

    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == chunk_size {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Split a document's text into indexed TTS-ready chunks.
pub fn process_text(text: &str, chunk_size: usize) -> Vec<TextChunk> {
    chunk_text(text, chunk_size)
        .into_iter()
        .enumerate()
        .map(|(chunk_id, text)| TextChunk::new(chunk_id, text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_chunk_short_text() {
        let chunks = chunk_text("Hello world.", 500);
        assert_eq!(chunks, vec!["Hello world."]);
    }

    #[test]
    fn test_chunk_exact_windows() {
        assert_eq!(chunk_text("abcdefghij", 3), vec!["abc", "def", "ghi", "j"]);
        assert_eq!(chunk_text("abcdef", 3), vec!["abc", "def"]);
    }

    #[test]
    fn test_chunk_empty_text() {
        assert!(chunk_text("", 500).is_empty());
    }

    #[test]
    fn test_chunk_keeps_whitespace() {
        let chunks = chunk_text("  a \n\n b  ", 4);
        assert_eq!(chunks.concat(), "  a \n\n b  ");
    }

    #[test]
    fn test_chunk_multibyte() {
        let chunks = chunk_text("ñandú €uro", 3);
        assert_eq!(chunks, vec!["ñan", "dú ", "€ur", "o"]);
    }

    #[test]
    fn test_chunk_zero_size() {
        assert_eq!(chunk_text("abc", 0), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_process_text_1200_chars() {
        let text = "x".repeat(1200);
        let chunks = process_text(&text, 500);
        let lengths: Vec<usize> = chunks.iter().map(|c| c.text.chars().count()).collect();
        assert_eq!(lengths, vec![500, 500, 200]);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_id, i);
        }
    }

    proptest! {
        #[test]
        fn prop_chunks_partition_text(text in ".{0,400}", size in 1usize..64) {
            let chunks = chunk_text(&text, size);
            prop_assert_eq!(chunks.concat(), text.clone());

            if let Some((last, rest)) = chunks.split_last() {
                prop_assert!(!last.is_empty());
                prop_assert!(last.chars().count() <= size);
                for chunk in rest {
                    prop_assert_eq!(chunk.chars().count(), size);
                }
            } else {
                prop_assert!(text.is_empty());
            }
        }
    }
}
