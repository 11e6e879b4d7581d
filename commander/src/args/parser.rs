//! Compiled usage templates.

use super::parameter::{self, Parameter, ParameterMap};
use super::ParsedArgs;
use crate::error::{ArgsError, ArgsResult};
use crate::platform::Platform;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Element {
    Literal(String),
    Param {
        name: String,
        kind: String,
        optional: bool,
        rest: bool,
    },
}

/// A usage template compiled against a set of parameter types.
#[derive(Clone)]
pub struct Parser {
    usage: String,
    elements: Vec<Element>,
    types: ParameterMap,
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("usage", &self.usage)
            .field("elements", &self.elements)
            .finish_non_exhaustive()
    }
}

impl Parser {
    /// Compile `usage`.
    ///
    /// `types` are added on top of the built-in `word`, `int` and `text`
    /// types and replace them on a name clash. Every type referenced by the
    /// template must be known at this point.
    ///
    /// # Errors
    ///
    /// [`ArgsError::Template`] for a malformed template, or
    /// [`ArgsError::UnknownType`] for an unregistered type name.
    pub fn compile(usage: &str, types: ParameterMap) -> ArgsResult<Self> {
        let mut all = parameter::defaults();
        all.extend(types);

        let tokens: Vec<&str> = usage.split_whitespace().collect();
        let mut elements = Vec::with_capacity(tokens.len());
        for (i, token) in tokens.iter().enumerate() {
            let element = compile_token(token)?;
            if let Element::Param { kind, rest, .. } = &element {
                if !all.contains_key(kind) {
                    return Err(ArgsError::UnknownType(kind.clone()));
                }
                if *rest && i + 1 != tokens.len() {
                    return Err(ArgsError::template(format!(
                        "`{token}` captures the rest of the input and must come last"
                    )));
                }
            }
            elements.push(element);
        }

        Ok(Self {
            usage: usage.trim().to_string(),
            elements,
            types: all,
        })
    }

    /// The template this parser was compiled from.
    #[must_use]
    pub fn usage(&self) -> &str {
        &self.usage
    }

    /// Parse `input` against the template.
    ///
    /// Matching is greedy and left to right. An optional parameter whose
    /// type does not match the next word is skipped. All input must be
    /// consumed.
    ///
    /// # Errors
    ///
    /// Fails when a literal or required parameter does not match, a
    /// conversion fails, or input is left over.
    pub async fn parse(&self, input: &str, platform: &dyn Platform) -> ArgsResult<ParsedArgs> {
        let mut args = ParsedArgs::default();
        let mut input = input.trim();

        for element in &self.elements {
            input = input.trim_start();
            match element {
                Element::Literal(word) => {
                    let found = input.split_whitespace().next().unwrap_or_default();
                    if found != word.as_str() {
                        return Err(ArgsError::Literal {
                            expected: word.clone(),
                            found: found.to_string(),
                        });
                    }
                    input = &input[word.len()..];
                }
                Element::Param {
                    name,
                    kind,
                    optional,
                    rest,
                } => {
                    if input.is_empty() {
                        if *optional {
                            continue;
                        }
                        return Err(ArgsError::Missing(name.clone()));
                    }

                    let parameter = self.parameter(kind)?;
                    let raw = if *rest {
                        input
                    } else {
                        match parameter.matches(input) {
                            Some(len) if ends_token(&input[len..]) => &input[..len],
                            _ if *optional => continue,
                            _ => {
                                return Err(ArgsError::Mismatch {
                                    name: name.clone(),
                                    kind: kind.clone(),
                                    found: input
                                        .split_whitespace()
                                        .next()
                                        .unwrap_or_default()
                                        .to_string(),
                                });
                            }
                        }
                    };

                    let value = parameter
                        .convert(raw, platform)
                        .await
                        .map_err(|reason| ArgsError::convert(name.clone(), reason))?;
                    args.insert(name.clone(), value);
                    input = &input[raw.len()..];
                }
            }
        }

        let leftover = input.trim();
        if leftover.is_empty() {
            Ok(args)
        } else {
            Err(ArgsError::Unexpected(leftover.to_string()))
        }
    }

    fn parameter(&self, kind: &str) -> ArgsResult<&Parameter> {
        self.types
            .get(kind)
            .ok_or_else(|| ArgsError::UnknownType(kind.to_string()))
    }
}

impl fmt::Display for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.usage)
    }
}

fn ends_token(after: &str) -> bool {
    after.chars().next().is_none_or(char::is_whitespace)
}

fn compile_token(token: &str) -> ArgsResult<Element> {
    let (inner, optional) = if let Some(inner) = token.strip_prefix('<') {
        let inner = inner
            .strip_suffix('>')
            .ok_or_else(|| ArgsError::template(format!("unclosed placeholder `{token}`")))?;
        (inner, false)
    } else if let Some(inner) = token.strip_prefix('[') {
        let inner = inner
            .strip_suffix(']')
            .ok_or_else(|| ArgsError::template(format!("unclosed placeholder `{token}`")))?;
        (inner, true)
    } else if token.contains(['<', '>', '[', ']']) {
        return Err(ArgsError::template(format!("malformed token `{token}`")));
    } else {
        return Ok(Element::Literal(token.to_string()));
    };

    let (name, kind) = match inner.split_once(':') {
        Some((name, kind)) => (name, Some(kind)),
        None => (inner, None),
    };
    let (name, rest) = match name.strip_suffix("...") {
        Some(name) => (name, true),
        None => (name, false),
    };

    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(ArgsError::template(format!("invalid parameter name in `{token}`")));
    }

    let kind = match kind {
        Some("") => {
            return Err(ArgsError::template(format!("empty type in `{token}`")));
        }
        Some(kind) => kind,
        None if rest => "text",
        None => "word",
    };

    Ok(Element::Param {
        name: name.to_string(),
        kind: kind.to_string(),
        optional,
        rest,
    })
}
