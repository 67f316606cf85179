//! 在线词典翻译器
//!
//! 支持两个提供商：
//! - `youdao` - 有道智云文本翻译（v3 签名，需要 app_key / app_secret）
//! - `iciba` - 金山词霸词典接口（需要 api_key）

use async_trait::async_trait;
use phf::phf_map;
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fmt::{self, Display};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

use super::Translator;
use crate::config::OnlineDictConfig;
use crate::error::BackendError;
use crate::models::{BackendKind, EntryType, TranslationResult};

const YOUDAO_API_URL: &str = "https://openapi.youdao.com/api";
const ICIBA_API_URL: &str = "http://dict-co.iciba.com/api/dictionary.php";

/// 有道网络释义最多取几条作为例句
const MAX_WEB_EXAMPLES: usize = 3;

/// 有道语言代码
static YOUDAO_LANG: phf::Map<&'static str, &'static str> = phf_map! {
    "en" => "en",
    "zh" => "zh-CHS",
    "ja" => "ja",
    "ko" => "ko",
};

/// 有道认证类错误码（应用 ID 无效、签名错误、账户异常等）
const YOUDAO_AUTH_CODES: &[&str] = &["101", "108", "110", "111", "202", "401"];

/// 在线词典提供商
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictProvider {
    Youdao,
    Iciba,
}

impl FromStr for DictProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "youdao" => Ok(DictProvider::Youdao),
            "iciba" => Ok(DictProvider::Iciba),
            other => Err(format!("不支持的在线词典提供商: {}", other)),
        }
    }
}

impl Display for DictProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DictProvider::Youdao => f.write_str("youdao"),
            DictProvider::Iciba => f.write_str("iciba"),
        }
    }
}

/// 在线词典翻译器
pub struct OnlineDictionary {
    client: Client,
    provider: DictProvider,
    api_key: String,
    app_key: String,
    app_secret: String,
    timeout_secs: u64,
}

impl OnlineDictionary {
    pub fn new(config: &OnlineDictConfig) -> Self {
        let provider = config.provider.parse().unwrap_or_else(|e: String| {
            warn!("⚠️ {}，改用 youdao", e);
            DictProvider::Youdao
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                warn!("⚠️ HTTP 客户端构建失败，使用默认配置: {}", e);
                Client::new()
            });

        if config.api_key.is_empty() && config.app_key.is_empty() {
            warn!("⚠️ 在线词典 API Key 未配置");
        }

        Self {
            client,
            provider,
            api_key: config.api_key.clone(),
            app_key: config.app_key.clone(),
            app_secret: config.app_secret.clone(),
            timeout_secs: config.timeout_secs,
        }
    }

    pub fn provider(&self) -> DictProvider {
        self.provider
    }

    fn request_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout {
                backend: BackendKind::OnlineDictionary,
                seconds: self.timeout_secs,
            }
        } else {
            BackendError::transport(BackendKind::OnlineDictionary, e.to_string())
        }
    }

    async fn translate_youdao(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<TranslationResult, BackendError> {
        if self.app_key.is_empty() || self.app_secret.is_empty() {
            return Err(BackendError::auth(
                BackendKind::OnlineDictionary,
                "有道词典需要配置 app_key 和 app_secret",
            ));
        }

        let salt = uuid::Uuid::new_v4().to_string();
        let curtime = chrono::Utc::now().timestamp().to_string();
        let sign = youdao_sign(&self.app_key, text, &salt, &curtime, &self.app_secret);

        let from = YOUDAO_LANG.get(source_lang).copied().unwrap_or("auto");
        let to = YOUDAO_LANG.get(target_lang).copied().unwrap_or("zh-CHS");

        let params = [
            ("q", text),
            ("from", from),
            ("to", to),
            ("appKey", self.app_key.as_str()),
            ("salt", salt.as_str()),
            ("sign", sign.as_str()),
            ("signType", "v3"),
            ("curtime", curtime.as_str()),
        ];

        let response: YoudaoResponse = self
            .client
            .post(YOUDAO_API_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| self.request_error(e))?
            .json()
            .await
            .map_err(|e| self.request_error(e))?;

        response.into_result(text, source_lang, target_lang)
    }

    async fn translate_iciba(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<TranslationResult, BackendError> {
        if self.api_key.is_empty() {
            return Err(BackendError::auth(
                BackendKind::OnlineDictionary,
                "金山词霸需要配置 api_key",
            ));
        }

        let response: IcibaResponse = self
            .client
            .get(ICIBA_API_URL)
            .query(&[("w", text), ("type", "json"), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| self.request_error(e))?
            .json()
            .await
            .map_err(|e| self.request_error(e))?;

        response.into_result(text, source_lang, target_lang)
    }
}

#[async_trait]
impl Translator for OnlineDictionary {
    fn kind(&self) -> BackendKind {
        BackendKind::OnlineDictionary
    }

    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<TranslationResult, BackendError> {
        debug!("在线词典查询 ({}): {}", self.provider, text);

        let result = match self.provider {
            DictProvider::Youdao => self.translate_youdao(text, source_lang, target_lang).await,
            DictProvider::Iciba => self.translate_iciba(text, source_lang, target_lang).await,
        };

        if let Err(e) = &result {
            if !e.is_not_found() {
                warn!("⚠️ 在线词典翻译失败: {}", e);
            }
        }
        result
    }
}

// ========== 有道 ==========

/// 有道 v3 签名：sha256(appKey + input + salt + curtime + appSecret)
///
/// input 为 q 的前 10 个字符 + 长度 + 后 10 个字符（q 不超过 20 个字符时取 q 本身）
fn youdao_sign(app_key: &str, q: &str, salt: &str, curtime: &str, app_secret: &str) -> String {
    let raw = format!(
        "{}{}{}{}{}",
        app_key,
        youdao_truncate(q),
        salt,
        curtime,
        app_secret
    );
    format!("{:x}", Sha256::digest(raw.as_bytes()))
}

fn youdao_truncate(q: &str) -> String {
    let chars: Vec<char> = q.chars().collect();
    let len = chars.len();
    if len <= 20 {
        return q.to_string();
    }
    let head: String = chars[..10].iter().collect();
    let tail: String = chars[len - 10..].iter().collect();
    format!("{}{}{}", head, len, tail)
}

#[derive(Debug, Deserialize)]
struct YoudaoResponse {
    #[serde(rename = "errorCode")]
    error_code: String,
    #[serde(default)]
    translation: Vec<String>,
    #[serde(default)]
    basic: Option<YoudaoBasic>,
    #[serde(default)]
    web: Vec<YoudaoWeb>,
}

#[derive(Debug, Default, Deserialize)]
struct YoudaoBasic {
    #[serde(default)]
    phonetic: Option<String>,
    #[serde(default, rename = "us-phonetic")]
    us_phonetic: Option<String>,
    #[serde(default, rename = "uk-phonetic")]
    uk_phonetic: Option<String>,
    #[serde(default)]
    explains: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct YoudaoWeb {
    #[serde(default)]
    key: String,
    #[serde(default)]
    value: Vec<String>,
}

impl YoudaoResponse {
    fn into_result(
        self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<TranslationResult, BackendError> {
        if self.error_code != "0" {
            let message = format!("有道API错误: {}", self.error_code);
            return Err(if YOUDAO_AUTH_CODES.contains(&self.error_code.as_str()) {
                BackendError::auth(BackendKind::OnlineDictionary, message)
            } else {
                BackendError::transport(BackendKind::OnlineDictionary, message)
            });
        }

        let translation = self.translation.join("\n");
        if translation.trim().is_empty() {
            return Err(BackendError::not_found(BackendKind::OnlineDictionary, text));
        }

        let entry_type = if text.split_whitespace().count() <= 2 {
            EntryType::Word
        } else {
            EntryType::Phrase
        };
        let mut result = TranslationResult::new(translation, source_lang, target_lang, entry_type);

        if let Some(basic) = self.basic {
            if !basic.explains.is_empty() {
                result.explanation = Some(basic.explains.join("\n"));
            }
            result.pronunciation = basic
                .phonetic
                .or_else(|| basic.us_phonetic.map(|p| format!("US: {}", p)))
                .or_else(|| basic.uk_phonetic.map(|p| format!("UK: {}", p)));
        }

        result.examples = self
            .web
            .into_iter()
            .take(MAX_WEB_EXAMPLES)
            .map(|w| format!("{}: {}", w.key, w.value.join(", ")))
            .collect();

        Ok(result)
    }
}

// ========== 金山词霸 ==========

#[derive(Debug, Deserialize)]
struct IcibaResponse {
    #[serde(default)]
    symbols: Vec<IcibaSymbol>,
}

#[derive(Debug, Deserialize)]
struct IcibaSymbol {
    #[serde(default)]
    ph_am: Option<String>,
    #[serde(default)]
    ph_en: Option<String>,
    #[serde(default)]
    parts: Vec<IcibaPart>,
}

#[derive(Debug, Deserialize)]
struct IcibaPart {
    #[serde(default)]
    part: String,
    #[serde(default)]
    means: Vec<String>,
}

impl IcibaResponse {
    fn into_result(
        self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<TranslationResult, BackendError> {
        let Some(symbol) = self.symbols.into_iter().next() else {
            return Err(BackendError::not_found(BackendKind::OnlineDictionary, text));
        };

        let translation = symbol
            .parts
            .iter()
            .filter(|p| !p.means.is_empty())
            .map(|p| format!("{} {}", p.part, p.means.join(", ")).trim().to_string())
            .collect::<Vec<_>>()
            .join("\n");

        if translation.is_empty() {
            return Err(BackendError::not_found(BackendKind::OnlineDictionary, text));
        }

        let mut result =
            TranslationResult::new(translation.clone(), source_lang, target_lang, EntryType::Word);
        result.explanation = Some(translation);
        result.pronunciation = symbol
            .ph_am
            .filter(|p| !p.is_empty())
            .map(|p| format!("US: {}", p))
            .or_else(|| symbol.ph_en.filter(|p| !p.is_empty()).map(|p| format!("UK: {}", p)));

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parse() {
        assert_eq!("youdao".parse::<DictProvider>().unwrap(), DictProvider::Youdao);
        assert_eq!(" ICIBA ".parse::<DictProvider>().unwrap(), DictProvider::Iciba);
        assert!("bing".parse::<DictProvider>().is_err());
    }

    #[test]
    fn test_unknown_provider_falls_back_to_youdao() {
        let config = OnlineDictConfig {
            provider: "bing".to_string(),
            ..Default::default()
        };
        assert_eq!(OnlineDictionary::new(&config).provider(), DictProvider::Youdao);
    }

    #[test]
    fn test_youdao_truncate() {
        assert_eq!(youdao_truncate("hello"), "hello");
        let long = "abcdefghijklmnopqrstuvwxyz";
        assert_eq!(youdao_truncate(long), "abcdefghij26qrstuvwxyz");
    }

    #[test]
    fn test_youdao_sign_is_sha256_hex() {
        let sign = youdao_sign("key", "hello", "salt", "1700000000", "secret");
        assert_eq!(sign.len(), 64);
        assert!(sign.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(sign, youdao_sign("key", "hello", "salt", "1700000000", "secret"));
        assert_ne!(sign, youdao_sign("key", "hello", "salt2", "1700000000", "secret"));
    }

    #[test]
    fn test_youdao_response_success() {
        let json = r#"{
            "errorCode": "0",
            "translation": ["你好"],
            "basic": {"us-phonetic": "həˈloʊ", "explains": ["int. 喂；你好"]},
            "web": [
                {"key": "Hello", "value": ["你好", "您好"]},
                {"key": "Hello Kitty", "value": ["凯蒂猫"]}
            ]
        }"#;
        let response: YoudaoResponse = serde_json::from_str(json).unwrap();
        let result = response.into_result("hello", "en", "zh").unwrap();

        assert_eq!(result.translation, "你好");
        assert_eq!(result.pronunciation.as_deref(), Some("US: həˈloʊ"));
        assert_eq!(result.explanation.as_deref(), Some("int. 喂；你好"));
        assert_eq!(result.examples, vec!["Hello: 你好, 您好", "Hello Kitty: 凯蒂猫"]);
        assert_eq!(result.entry_type, EntryType::Word);
    }

    #[test]
    fn test_youdao_response_errors() {
        let response: YoudaoResponse = serde_json::from_str(r#"{"errorCode": "108"}"#).unwrap();
        let err = response.into_result("hello", "en", "zh").unwrap_err();
        assert!(matches!(err, BackendError::Auth { .. }));

        let response: YoudaoResponse = serde_json::from_str(r#"{"errorCode": "411"}"#).unwrap();
        let err = response.into_result("hello", "en", "zh").unwrap_err();
        assert!(matches!(err, BackendError::Transport { .. }));

        let response: YoudaoResponse =
            serde_json::from_str(r#"{"errorCode": "0", "translation": []}"#).unwrap();
        assert!(response.into_result("hello", "en", "zh").unwrap_err().is_not_found());
    }

    #[test]
    fn test_iciba_response() {
        let json = r#"{
            "symbols": [{
                "ph_en": "həˈləʊ",
                "ph_am": "",
                "parts": [{"part": "int.", "means": ["喂", "哈罗"]}, {"part": "n.", "means": ["表示问候"]}]
            }]
        }"#;
        let response: IcibaResponse = serde_json::from_str(json).unwrap();
        let result = response.into_result("hello", "en", "zh").unwrap();
        assert_eq!(result.translation, "int. 喂, 哈罗\nn. 表示问候");
        assert_eq!(result.pronunciation.as_deref(), Some("UK: həˈləʊ"));

        let empty: IcibaResponse = serde_json::from_str(r#"{"symbols": []}"#).unwrap();
        assert!(empty.into_result("xyzzy", "en", "zh").unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_missing_credentials_is_auth_error() {
        let dict = OnlineDictionary::new(&OnlineDictConfig::default());
        let err = dict.translate("hello", "en", "zh").await.unwrap_err();
        assert!(matches!(err, BackendError::Auth { .. }));
    }
}
