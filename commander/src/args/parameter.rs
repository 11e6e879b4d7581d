//! Parameter types: what a placeholder matches and what it converts to.

use super::Value;
use crate::error::ArgsResult;
use crate::platform::Platform;
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

/// Parameter types by name, as referenced from usage templates.
pub type ParameterMap = HashMap<String, Parameter>;

type MatchFn = dyn Fn(&str) -> Option<usize> + Send + Sync;

/// Turns matched text into a [`Value`].
///
/// Converters may consult the platform, e.g. to resolve a channel mention
/// into the channel it names. The error string is shown to the user.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Convert the matched text.
    async fn convert(&self, raw: &str, platform: &dyn Platform) -> Result<Value, String>;
}

/// A named grammar fragment: a matcher plus an optional converter.
#[derive(Clone)]
pub struct Parameter {
    matcher: Arc<MatchFn>,
    converter: Option<Arc<dyn Converter>>,
}

impl std::fmt::Debug for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parameter")
            .field("converter", &self.converter.is_some())
            .finish_non_exhaustive()
    }
}

impl Parameter {
    /// A parameter from a matcher returning the length of the matched
    /// prefix of its input.
    pub fn new(matcher: impl Fn(&str) -> Option<usize> + Send + Sync + 'static) -> Self {
        Self {
            matcher: Arc::new(matcher),
            converter: None,
        }
    }

    /// A parameter matching `pattern` at the start of the input.
    ///
    /// # Errors
    ///
    /// [`ArgsError::Pattern`] if `pattern` does not compile.
    pub fn pattern(pattern: &str) -> ArgsResult<Self> {
        let re = Regex::new(&format!("^(?:{pattern})"))?;
        Ok(Self::new(move |input| re.find(input).map(|m| m.end())))
    }

    /// Attach a converter.
    #[must_use]
    pub fn with_converter(mut self, converter: impl Converter + 'static) -> Self {
        self.converter = Some(Arc::new(converter));
        self
    }

    /// A single whitespace-free word.
    #[must_use]
    pub fn word() -> Self {
        Self::new(|input| {
            let len = input.find(char::is_whitespace).unwrap_or(input.len());
            (len > 0).then_some(len)
        })
    }

    /// Everything up to the end of the input.
    #[must_use]
    pub fn text() -> Self {
        Self::new(|input| (!input.is_empty()).then_some(input.len()))
    }

    /// A signed decimal integer.
    #[must_use]
    pub fn int() -> Self {
        Self::new(|input| {
            let digits_from = usize::from(input.starts_with(['+', '-']));
            let digits = input[digits_from..]
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(input.len() - digits_from);
            (digits > 0).then_some(digits_from + digits)
        })
        .with_converter(IntConverter)
    }

    /// A channel reference: `<#ID>` or a bare numeric id, resolved through
    /// the platform.
    #[must_use]
    pub fn channel() -> Self {
        Self::new(|input| {
            let end = if input.starts_with("<#") {
                input.find('>').map(|i| i + 1)?
            } else {
                input.find(|c: char| !c.is_ascii_digit()).unwrap_or(input.len())
            };
            (end > 0).then_some(end)
        })
        .with_converter(ChannelConverter)
    }

    /// Length of the prefix of `input` this parameter accepts.
    ///
    /// Matcher results that are empty, out of range, or not on a character
    /// boundary are treated as no match.
    #[must_use]
    pub fn matches(&self, input: &str) -> Option<usize> {
        (self.matcher)(input).filter(|&len| len > 0 && input.is_char_boundary(len))
    }

    /// Convert matched text, as-is when no converter is attached.
    ///
    /// # Errors
    ///
    /// The converter's message when the text cannot be converted.
    pub async fn convert(&self, raw: &str, platform: &dyn Platform) -> Result<Value, String> {
        match &self.converter {
            Some(converter) => converter.convert(raw, platform).await,
            None => Ok(Value::Text(raw.to_string())),
        }
    }
}

/// The parameter types every parser knows.
pub(crate) fn defaults() -> ParameterMap {
    HashMap::from([
        ("word".to_string(), Parameter::word()),
        ("int".to_string(), Parameter::int()),
        ("text".to_string(), Parameter::text()),
    ])
}

/// Converts decimal text to [`Value::Integer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IntConverter;

#[async_trait]
impl Converter for IntConverter {
    async fn convert(&self, raw: &str, _platform: &dyn Platform) -> Result<Value, String> {
        raw.parse::<i64>()
            .map(Value::Integer)
            .map_err(|e| e.to_string())
    }
}

/// Resolves `<#ID>` / `ID` to [`Value::Channel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelConverter;

#[async_trait]
impl Converter for ChannelConverter {
    async fn convert(&self, raw: &str, platform: &dyn Platform) -> Result<Value, String> {
        let id = raw
            .strip_prefix("<#")
            .and_then(|rest| rest.strip_suffix('>'))
            .unwrap_or(raw);
        platform
            .channel(id)
            .await
            .map(Value::Channel)
            .map_err(|e| e.to_string())
    }
}
