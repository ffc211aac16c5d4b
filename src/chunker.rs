/// Splits text into word-aligned chunks for the upstream model.
///
/// Words are accumulated greedily; as soon as the single-space join of the
/// running chunk reaches `max_chars`, it is closed and a new one starts. The
/// trailing remainder becomes the last chunk. Words are never dropped or
/// reordered and no chunk is empty.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for word in text.split_whitespace() {
        if !current.is_empty() {
            current.push(' ');
            current_chars += 1;
        }
        current.push_str(word);
        current_chars += word.chars().count();

        if current_chars >= max_chars {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Number of non-empty whitespace-delimited tokens.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
