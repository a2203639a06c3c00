use serde::{Deserialize, Serialize};

const CJK_NGRAM_SIZE: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub word: String,
    pub tag: String,
}

impl Token {
    fn new(word: String, tag: &str) -> Self {
        Self {
            word,
            tag: tag.to_string(),
        }
    }
}

/// Word segmentation seam. Index fields are stored pre-segmented with the
/// same segmenter, so scoring stays consistent on both sides.
pub trait Segmenter: Send + Sync {
    /// Word/tag segmentation used for scoring.
    fn seg(&self, text: &str) -> Vec<Token>;

    /// Finer-grained tokens used to recall index candidates.
    fn seg_for_search(&self, text: &str) -> Vec<String>;

    fn words(&self, text: &str) -> Vec<String> {
        self.seg(text).into_iter().map(|token| token.word).collect()
    }
}

/// Deterministic segmenter: ASCII alphanumeric runs become one token each,
/// CJK text becomes one token per character. The search variant adds CJK
/// bigrams so the index recalls multi-character terms.
#[derive(Debug, Clone, Copy, Default)]
pub struct CjkSegmenter;

impl CjkSegmenter {
    pub fn new() -> Self {
        Self
    }
}

impl Segmenter for CjkSegmenter {
    fn seg(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut buffer = String::new();
        let mut buffer_has_alpha = false;

        for ch in text.chars() {
            if ch.is_ascii_alphanumeric() {
                buffer.push(ch.to_ascii_lowercase());
                buffer_has_alpha |= ch.is_ascii_alphabetic();
            } else {
                flush_ascii(&mut tokens, &mut buffer, &mut buffer_has_alpha);
                if is_cjk(ch) {
                    tokens.push(Token::new(ch.to_string(), "zh"));
                }
            }
        }
        flush_ascii(&mut tokens, &mut buffer, &mut buffer_has_alpha);

        tokens
    }

    fn seg_for_search(&self, text: &str) -> Vec<String> {
        let tokens = self.seg(text);
        let mut words: Vec<String> = tokens.iter().map(|token| token.word.clone()).collect();

        // CJK bigrams over adjacent single-char tokens.
        let cjk_run: Vec<&str> = tokens
            .iter()
            .filter(|token| token.tag == "zh")
            .map(|token| token.word.as_str())
            .collect();
        for window in cjk_run.windows(CJK_NGRAM_SIZE) {
            words.push(window.concat());
        }

        words
    }
}

fn flush_ascii(tokens: &mut Vec<Token>, buffer: &mut String, has_alpha: &mut bool) {
    if !buffer.is_empty() {
        let tag = if *has_alpha { "eng" } else { "m" };
        tokens.push(Token::new(std::mem::take(buffer), tag));
        *has_alpha = false;
    }
}

fn is_cjk(ch: char) -> bool {
    matches!(ch,
        '\u{4E00}'..='\u{9FFF}'      // CJK Unified Ideographs
        | '\u{3400}'..='\u{4DBF}'    // Extension A
        | '\u{3040}'..='\u{30FF}'    // Hiragana / Katakana
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seg_splits_cjk_per_char_and_ascii_per_run() {
        let segmenter = CjkSegmenter::new();
        let tokens = segmenter.seg("细胞凋亡 ATP合成");

        let words: Vec<&str> = tokens.iter().map(|t| t.word.as_str()).collect();
        assert_eq!(words, ["细", "胞", "凋", "亡", "atp", "合", "成"]);
        assert_eq!(tokens[0].tag, "zh");
        assert_eq!(tokens[4].tag, "eng");
    }

    #[test]
    fn digit_runs_are_tagged_numeric() {
        let segmenter = CjkSegmenter::new();
        let tokens = segmenter.seg("46条染色体");
        assert_eq!(tokens[0].word, "46");
        assert_eq!(tokens[0].tag, "m");
    }

    #[test]
    fn search_tokens_include_cjk_bigrams() {
        let segmenter = CjkSegmenter::new();
        let words = segmenter.seg_for_search("细胞核");

        assert!(words.contains(&"细".to_string()));
        assert!(words.contains(&"细胞".to_string()));
        assert!(words.contains(&"胞核".to_string()));
    }

    #[test]
    fn punctuation_is_dropped() {
        let segmenter = CjkSegmenter::new();
        assert!(segmenter.seg("？！、。").is_empty());
    }
}
