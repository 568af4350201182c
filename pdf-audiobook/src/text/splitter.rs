//! Whitespace-aware splitting for services with a per-request size limit.

/// Split text into pieces of at most `max_chars` characters, breaking on
/// whitespace where possible.
///
/// Whitespace between pieces is dropped; words longer than `max_chars` are
/// cut hard.
pub fn split_for_requests(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for part in chars.chunks(max_chars) {
                pieces.push(part.iter().collect());
            }
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            pieces.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        pieces.push(current);
    }

    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_short_text() {
        assert_eq!(split_for_requests("Hola mundo.", 100), vec!["Hola mundo."]);
    }

    #[test]
    fn test_split_on_words() {
        let parts = split_for_requests("one two three four five", 10);
        assert_eq!(parts, vec!["one two", "three four", "five"]);
    }

    #[test]
    fn test_split_long_word() {
        let parts = split_for_requests("ab abcdefghij c", 4);
        assert_eq!(parts, vec!["ab", "abcd", "efgh", "ij", "c"]);
    }

    #[test]
    fn test_split_whitespace_only() {
        assert!(split_for_requests(" \n\t ", 100).is_empty());
    }

    #[test]
    fn test_split_respects_char_limit() {
        let text = "áéíóú ".repeat(60);
        for piece in split_for_requests(&text, 100) {
            assert!(piece.chars().count() <= 100);
        }
    }
}
