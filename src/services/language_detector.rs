//! 语言检测与文本长度分类 - 业务能力层
//!
//! 只做纯计算：
//! - `detect` 先按字符区段规则检测语言，规则无法判断时交给 whatlang
//! - `classify_length` 按词数把文本分为 word / phrase / sentence / paragraph

use phf::phf_map;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::models::EntryType;

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("合法的正则"));
static LATIN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-zA-Z]").expect("合法的正则"));

/// 默认语言
pub const DEFAULT_LANG: &str = "en";

/// 句子与段落的字符长度分界
const PARAGRAPH_MIN_CHARS: usize = 200;

/// 中文字符占比下限（百分比）
const CHINESE_RATIO_PERCENT: usize = 30;

/// whatlang 结果的最低置信度
const MIN_CONFIDENCE: f64 = 0.05;

/// whatlang 的 ISO 639-3 代码 → ISO 639-1 代码
static ISO_639_1: phf::Map<&'static str, &'static str> = phf_map! {
    "rus" => "ru",
    "ukr" => "uk",
    "bel" => "be",
    "bul" => "bg",
    "mkd" => "mk",
    "srp" => "sr",
    "ell" => "el",
    "ara" => "ar",
    "pes" => "fa",
    "urd" => "ur",
    "heb" => "he",
    "yid" => "yi",
    "hin" => "hi",
    "mar" => "mr",
    "nep" => "ne",
    "ben" => "bn",
    "tam" => "ta",
    "tel" => "te",
    "kan" => "kn",
    "mal" => "ml",
    "guj" => "gu",
    "pan" => "pa",
    "ori" => "or",
    "sin" => "si",
    "tha" => "th",
    "khm" => "km",
    "mya" => "my",
    "kat" => "ka",
    "hye" => "hy",
    "amh" => "am",
};

/// 语言检测器
pub struct LanguageDetector;

impl LanguageDetector {
    /// 检测文本语言
    ///
    /// 规则按固定顺序检查，先匹配者胜出：
    /// 1. 中文字符占比 >= 30% → `zh`
    /// 2. 包含平假名 / 片假名 → `ja`
    /// 3. 包含韩文 → `ko`
    /// 4. 包含拉丁字母 → `en`
    /// 5. whatlang 统计检测（西里尔、希腊、阿拉伯等文字）
    /// 6. 其他情况默认 `en`
    pub fn detect(text: &str) -> String {
        let text = text.trim();
        if text.is_empty() {
            return DEFAULT_LANG.to_string();
        }

        Self::detect_by_rule(text)
            .or_else(|| Self::detect_by_library(text))
            .unwrap_or(DEFAULT_LANG)
            .to_string()
    }

    fn detect_by_library(text: &str) -> Option<&'static str> {
        let info = whatlang::detect(text)?;
        let code = info.lang().code();
        if info.confidence() < MIN_CONFIDENCE {
            debug!("whatlang 置信度过低: {} ({:.2})", code, info.confidence());
            return None;
        }
        ISO_639_1.get(code).copied()
    }

    fn detect_by_rule(text: &str) -> Option<&'static str> {
        let total = text.chars().count();

        let chinese = text.chars().filter(|&c| is_han(c)).count();
        if chinese > 0 && chinese * 100 >= total * CHINESE_RATIO_PERCENT {
            return Some("zh");
        }

        if text.chars().any(is_kana) {
            return Some("ja");
        }

        if text.chars().any(is_hangul) {
            return Some("ko");
        }

        if LATIN_RE.is_match(text) {
            return Some("en");
        }

        None
    }

    /// 判断是否包含中日韩文字
    pub fn is_cjk(text: &str) -> bool {
        text.chars().any(is_cjk_char)
    }

    /// 统计词数
    ///
    /// 中日韩文字按字符数统计，其他文字按 `\w+` 分词统计
    pub fn count_words(text: &str) -> usize {
        if Self::is_cjk(text) {
            text.chars().filter(|&c| is_cjk_char(c)).count()
        } else {
            WORD_RE.find_iter(text).count()
        }
    }

    /// 分类文本类型
    ///
    /// # 参数
    /// - `text`: 文本
    /// - `word_threshold`: 词数 <= 该值为单词
    /// - `phrase_threshold`: 词数 <= 该值为短语
    pub fn classify_length(text: &str, word_threshold: usize, phrase_threshold: usize) -> EntryType {
        let text = text.trim();
        let word_count = Self::count_words(text);

        if word_count <= word_threshold {
            EntryType::Word
        } else if word_count <= phrase_threshold {
            EntryType::Phrase
        } else if text.chars().count() < PARAGRAPH_MIN_CHARS {
            EntryType::Sentence
        } else {
            EntryType::Paragraph
        }
    }
}

fn is_han(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

fn is_kana(c: char) -> bool {
    ('\u{3040}'..='\u{309f}').contains(&c) || ('\u{30a0}'..='\u{30ff}').contains(&c)
}

fn is_hangul(c: char) -> bool {
    ('\u{ac00}'..='\u{d7af}').contains(&c)
}

fn is_cjk_char(c: char) -> bool {
    is_han(c) || is_kana(c) || is_hangul(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_rules() {
        assert_eq!(LanguageDetector::detect("你好世界"), "zh");
        assert_eq!(LanguageDetector::detect("hi 世界"), "zh");
        assert_eq!(LanguageDetector::detect("こんにちは"), "ja");
        // 汉字占比过线时先命中中文规则
        assert_eq!(LanguageDetector::detect("日本語を勉強する"), "zh");
        assert_eq!(LanguageDetector::detect("カタカナ"), "ja");
        assert_eq!(LanguageDetector::detect("안녕하세요"), "ko");
        assert_eq!(LanguageDetector::detect("hello world"), "en");
        assert_eq!(LanguageDetector::detect("bonjour"), "en");
    }

    #[test]
    fn test_detect_defaults_to_english() {
        assert_eq!(LanguageDetector::detect(""), "en");
        assert_eq!(LanguageDetector::detect("   "), "en");
        assert_eq!(LanguageDetector::detect("12345 !?"), "en");
        assert_eq!(LanguageDetector::detect("... --- ..."), "en");
    }

    #[test]
    fn test_detect_other_scripts() {
        assert_eq!(
            LanguageDetector::detect("Мы были очень рады видеть вас в этом городе сегодня."),
            "ru"
        );
        assert_eq!(LanguageDetector::detect("Γειά σου κόσμε"), "el");
    }

    #[test]
    fn test_chinese_ratio_threshold() {
        // 1 个汉字 / 10 个字符 = 10%，不满足中文规则，落到拉丁字母规则
        assert_eq!(LanguageDetector::detect("abcdefghi中"), "en");
        // 3 / 10 = 30%
        assert_eq!(LanguageDetector::detect("abcdefg中文字"), "zh");
    }

    #[test]
    fn test_classify_word() {
        assert_eq!(LanguageDetector::classify_length("hello", 1, 5), EntryType::Word);
        assert_eq!(LanguageDetector::classify_length("  hello  ", 1, 5), EntryType::Word);
    }

    #[test]
    fn test_classify_phrase_sentence_paragraph() {
        assert_eq!(
            LanguageDetector::classify_length("take it easy", 1, 5),
            EntryType::Phrase
        );
        assert_eq!(
            LanguageDetector::classify_length("The quick brown fox jumps over the lazy dog.", 1, 5),
            EntryType::Sentence
        );
        let long = "word ".repeat(60);
        assert_eq!(LanguageDetector::classify_length(&long, 1, 5), EntryType::Paragraph);
    }

    #[test]
    fn test_classify_cjk_counts_characters() {
        let passage: String = "学而时习之不亦说乎".chars().cycle().take(50).collect();
        assert_eq!(passage.chars().count(), 50);
        assert_eq!(LanguageDetector::count_words(&passage), 50);

        // 按字符数而非空白分词：整段没有空格也不会被当作 1 个词
        assert_eq!(LanguageDetector::classify_length(&passage, 1, 5), EntryType::Sentence);
        assert_eq!(LanguageDetector::classify_length(&passage, 10, 60), EntryType::Phrase);
        assert_eq!(LanguageDetector::classify_length(&passage, 50, 60), EntryType::Word);
    }

    #[test]
    fn test_count_words_latin_tokens() {
        assert_eq!(LanguageDetector::count_words("don't stop-believing"), 4);
        assert_eq!(LanguageDetector::count_words(""), 0);
    }
}
