//! Parsing of console input lines.
//!
//! A line is `command [action] [key=value ...] [word ...]`. Double quotes
//! group words, so `message="see you at 8"` is one argument.

use crate::error::{AppError, AppResult};
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLine {
    pub command: String,
    pub action: Option<String>,
    pub params: Vec<(String, String)>,
    pub words: Vec<String>,
}

impl CommandLine {
    /// `None` for blank lines and comments.
    pub fn parse(line: &str) -> AppResult<Option<Self>> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }

        let mut tokens = tokenize(trimmed)?.into_iter();
        let Some(command) = tokens.next() else {
            return Ok(None);
        };

        let mut parsed = CommandLine {
            command: command.to_ascii_lowercase(),
            ..Self::default()
        };
        for token in tokens {
            match token.split_once('=') {
                Some((key, value)) if !key.is_empty() => {
                    parsed
                        .params
                        .push((key.to_ascii_lowercase(), value.to_string()));
                }
                _ if parsed.action.is_none() && parsed.params.is_empty() && parsed.words.is_empty() => {
                    parsed.action = Some(token.to_ascii_lowercase());
                }
                _ => parsed.words.push(token),
            }
        }
        Ok(Some(parsed))
    }

    pub fn action(&self) -> &str {
        self.action.as_deref().unwrap_or_default()
    }

    /// Last value given for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_or_default(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }

    /// Every value of a repeatable key, comma lists expanded.
    pub fn all(&self, key: &str) -> Vec<String> {
        self.params
            .iter()
            .filter(|(k, _)| k == key)
            .flat_map(|(_, v)| v.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn require(&self, key: &str) -> AppResult<&str> {
        self.get(key)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AppError::Usage(format!("missing {}=...", key)))
    }

    /// Boolean switch. A bare word sets it; absent means `default`.
    pub fn flag(&self, key: &str, default: bool) -> AppResult<bool> {
        let Some(value) = self.get(key) else {
            return Ok(default || self.words.iter().any(|w| w.eq_ignore_ascii_case(key)));
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "yes" | "y" | "true" | "1" | "on" => Ok(true),
            "no" | "n" | "false" | "0" | "off" => Ok(false),
            other => Err(AppError::Usage(format!(
                "{} expects yes or no, got '{}'",
                key, other
            ))),
        }
    }

    pub fn parse_value<T>(&self, key: &str) -> AppResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map(|value| {
                value
                    .trim()
                    .parse()
                    .map_err(|e| AppError::Usage(format!("invalid {}: {}", key, e)))
            })
            .transpose()
    }
}

fn tokenize(line: &str) -> AppResult<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut started = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                started = true;
            }
            '\\' if in_quotes => match chars.next() {
                Some(escaped) => current.push(escaped),
                None => current.push('\\'),
            },
            c if c.is_whitespace() && !in_quotes => {
                if started {
                    tokens.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }

    if in_quotes {
        return Err(AppError::Usage("unterminated quote".into()));
    }
    if started {
        tokens.push(current);
    }
    Ok(tokens)
}
