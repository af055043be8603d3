//! Best-effort language tagging

use std::fmt;
use whatlang::Lang;

/// Tag used when no language could be assigned
pub const UNKNOWN_LANG: &str = "unknown";

/// Outcome of language detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Detected(Lang),
    Unknown,
}

impl Language {
    /// ISO 639-1 code where one exists, else ISO 639-3, or `unknown`
    pub fn code(&self) -> &'static str {
        match self {
            Language::Detected(lang) => two_letter_code(lang.code()),
            Language::Unknown => UNKNOWN_LANG,
        }
    }
}

/// ISO 639-3 -> ISO 639-1 for the languages the detector knows
fn two_letter_code(code: &'static str) -> &'static str {
    match code {
        "afr" => "af",
        "aka" => "ak",
        "amh" => "am",
        "ara" => "ar",
        "aze" => "az",
        "bel" => "be",
        "ben" => "bn",
        "bul" => "bg",
        "cat" => "ca",
        "ces" => "cs",
        "cmn" => "zh",
        "dan" => "da",
        "deu" => "de",
        "ell" => "el",
        "eng" => "en",
        "epo" => "eo",
        "est" => "et",
        "fin" => "fi",
        "fra" => "fr",
        "guj" => "gu",
        "heb" => "he",
        "hin" => "hi",
        "hrv" => "hr",
        "hun" => "hu",
        "hye" => "hy",
        "ind" => "id",
        "ita" => "it",
        "jav" => "jv",
        "jpn" => "ja",
        "kan" => "kn",
        "kat" => "ka",
        "khm" => "km",
        "kor" => "ko",
        "lat" => "la",
        "lav" => "lv",
        "lit" => "lt",
        "mal" => "ml",
        "mar" => "mr",
        "mkd" => "mk",
        "mya" => "my",
        "nep" => "ne",
        "nld" => "nl",
        "nob" => "no",
        "ori" => "or",
        "pan" => "pa",
        "pes" => "fa",
        "pol" => "pl",
        "por" => "pt",
        "ron" => "ro",
        "rus" => "ru",
        "sin" => "si",
        "slk" => "sk",
        "slv" => "sl",
        "sna" => "sn",
        "spa" => "es",
        "srp" => "sr",
        "swe" => "sv",
        "tam" => "ta",
        "tel" => "te",
        "tgl" => "tl",
        "tha" => "th",
        "tuk" => "tk",
        "tur" => "tr",
        "ukr" => "uk",
        "urd" => "ur",
        "uzb" => "uz",
        "vie" => "vi",
        "yid" => "yi",
        "zul" => "zu",
        other => other,
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Detect the language of `text`; too-short text is [`Language::Unknown`]
pub fn detect_language(text: &str, min_chars: usize) -> Language {
    let text = text.trim();
    if text.is_empty() || text.chars().count() < min_chars {
        return Language::Unknown;
    }

    match whatlang::detect(text) {
        Some(info) => Language::Detected(info.lang()),
        None => Language::Unknown,
    }
}
