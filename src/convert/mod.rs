// =====================================================
// TEXT CONVERSION MODULE
// Chinese variant conversion with a per-variant converter cache
// =====================================================

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};
use thiserror::Error;
use unicode_script::{Script, UnicodeScript};

pub const DEFAULT_VARIANT: &str = "s2twp";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("unsupported conversion variant '{0}'")]
    UnknownVariant(String),
}

/// Conversion targets, named the way OpenCC configurations are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Simplified to Traditional.
    S2T,
    /// Simplified to Taiwan Traditional. Shares the Taiwan table with
    /// [`Variant::S2TWP`], so Taiwanese phrasing is applied too (软件 becomes
    /// 軟體, not 軟件).
    S2TW,
    /// Simplified to Taiwan Traditional with Taiwanese phrases.
    S2TWP,
    /// Simplified to Hong Kong Traditional.
    S2HK,
    /// Traditional to Simplified.
    T2S,
    TW2S,
    /// Taiwan Traditional to Simplified with mainland phrases.
    TW2SP,
    HK2S,
    ZhMO,
    ZhSG,
    ZhMY,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::S2T => "s2t",
            Variant::S2TW => "s2tw",
            Variant::S2TWP => "s2twp",
            Variant::S2HK => "s2hk",
            Variant::T2S => "t2s",
            Variant::TW2S => "tw2s",
            Variant::TW2SP => "tw2sp",
            Variant::HK2S => "hk2s",
            Variant::ZhMO => "zh-mo",
            Variant::ZhSG => "zh-sg",
            Variant::ZhMY => "zh-my",
        }
    }

    fn target(&self) -> zhconv::Variant {
        match self {
            Variant::S2T => zhconv::Variant::ZhHant,
            Variant::S2TW | Variant::S2TWP => zhconv::Variant::ZhTW,
            Variant::S2HK => zhconv::Variant::ZhHK,
            Variant::T2S | Variant::TW2S | Variant::HK2S => zhconv::Variant::ZhHans,
            Variant::TW2SP => zhconv::Variant::ZhCN,
            Variant::ZhMO => zhconv::Variant::ZhMO,
            Variant::ZhSG => zhconv::Variant::ZhSG,
            Variant::ZhMY => zhconv::Variant::ZhMY,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = ConvertError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('_', "-");
        let normalized = normalized.strip_suffix(".json").unwrap_or(&normalized);
        match normalized {
            "s2t" | "zh-hant" => Ok(Variant::S2T),
            "s2tw" | "zh-tw" => Ok(Variant::S2TW),
            "s2twp" => Ok(Variant::S2TWP),
            "s2hk" | "zh-hk" => Ok(Variant::S2HK),
            "t2s" | "zh-hans" => Ok(Variant::T2S),
            "tw2s" => Ok(Variant::TW2S),
            "tw2sp" | "zh-cn" => Ok(Variant::TW2SP),
            "hk2s" => Ok(Variant::HK2S),
            "zh-mo" => Ok(Variant::ZhMO),
            "zh-sg" => Ok(Variant::ZhSG),
            "zh-my" => Ok(Variant::ZhMY),
            _ => Err(ConvertError::UnknownVariant(value.trim().to_string())),
        }
    }
}

pub trait TextConverter: Send + Sync {
    fn convert(&self, text: &str) -> String;
}

struct ZhConverter {
    variant: Variant,
}

impl TextConverter for ZhConverter {
    fn convert(&self, text: &str) -> String {
        zhconv::zhconv(text, self.variant.target())
    }
}

fn build_converter(variant: Variant) -> Arc<dyn TextConverter> {
    Arc::new(ZhConverter { variant })
}

static CONVERTERS: LazyLock<Mutex<HashMap<Variant, Arc<dyn TextConverter>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Returns the process-wide converter for `name`, building it on first use.
pub fn get_converter(name: &str) -> Result<Arc<dyn TextConverter>, ConvertError> {
    let variant = name.parse::<Variant>()?;
    let mut converters = CONVERTERS.lock().unwrap_or_else(PoisonError::into_inner);
    let converter = converters
        .entry(variant)
        .or_insert_with(|| {
            log::debug!("[convert] initializing converter {}", variant);
            build_converter(variant)
        });
    Ok(Arc::clone(converter))
}

pub fn has_chinese(text: &str) -> bool {
    text.chars().any(|ch| ch.script() == Script::Han)
}

pub fn is_ascii_only(text: &str) -> bool {
    text.is_ascii()
}

/// Cheap pre-filter: only non-empty, non-ASCII text containing Han
/// ideographs can change under conversion.
pub fn may_need_conversion(text: &str) -> bool {
    !text.is_empty() && !is_ascii_only(text) && has_chinese(text)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub text: String,
    pub changed: bool,
}

impl Conversion {
    fn unchanged(text: &str) -> Self {
        Self {
            text: text.to_string(),
            changed: false,
        }
    }
}

/// Converts `text` to `variant`, reporting whether the output differs.
pub fn convert_if_needed(variant: &str, text: &str) -> Result<Conversion, ConvertError> {
    if !may_need_conversion(text) {
        return Ok(Conversion::unchanged(text));
    }
    let converter = get_converter(variant)?;
    let output = converter.convert(text);
    if output == text {
        return Ok(Conversion::unchanged(text));
    }
    Ok(Conversion {
        text: output,
        changed: true,
    })
}

/// The conversion function the scan engine and the file path call into.
pub trait ConversionOracle: Send + Sync {
    fn convert(&self, variant: &str, text: &str) -> Result<Conversion, ConvertError>;
}

/// Oracle backed by the shared converter cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZhOracle;

impl ConversionOracle for ZhOracle {
    fn convert(&self, variant: &str, text: &str) -> Result<Conversion, ConvertError> {
        convert_if_needed(variant, text)
    }
}
