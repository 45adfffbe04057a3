//! # Date Parser Module
//!
//! Parses date strings against declared token patterns (`yyyy-MM-dd`,
//! `yyyy:MM:dd HH:mm:ss`, ...) relative to a reference date. Fields the
//! pattern does not mention are filled from the reference date.
//!
//! The token vocabulary intentionally mirrors the patterns used by the EXIF
//! date-shape table in `file_ops`: year/month/day/hour/minute/second,
//! milliseconds (`SSS`), a UTC marker (`X`) and `'…'`-quoted literals.

use crate::error::DateParseError;
use chrono::format::{parse as chrono_parse, Parsed, StrftimeItems};
use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};

/// Parses date strings against token-based format patterns.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateParser;

impl DateParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse `input` according to `format`, filling unspecified fields from
    /// `reference`. Fails when the string does not match the pattern's shape
    /// or the result is not a representable calendar date.
    pub fn parse(
        &self,
        input: &str,
        format: &str,
        reference: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, DateParseError> {
        let unparseable = || DateParseError::Unparseable {
            input: input.to_string(),
            format: format.to_string(),
        };

        let strftime = translate_format(format).ok_or_else(unparseable)?;

        let mut parsed = Parsed::new();
        chrono_parse(&mut parsed, input, StrftimeItems::new(&strftime))
            .map_err(|_| unparseable())?;

        let year = parsed
            .year()
            .or_else(|| parsed.year_mod_100().map(|y| 2000 + y))
            .unwrap_or_else(|| reference.year());
        let month = parsed.month().unwrap_or_else(|| reference.month());
        let day = parsed.day().unwrap_or_else(|| reference.day());

        let hour = match (parsed.hour_div_12(), parsed.hour_mod_12()) {
            (Some(div), Some(modulo)) => div * 12 + modulo,
            _ => reference.hour(),
        };
        let minute = parsed.minute().unwrap_or_else(|| reference.minute());
        let second = parsed.second().unwrap_or_else(|| reference.second());
        let nanosecond = parsed.nanosecond().unwrap_or(0);

        let invalid = || DateParseError::InvalidDate {
            input: input.to_string(),
        };

        let naive = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(invalid)?
            .and_hms_nano_opt(hour, minute, second, nanosecond)
            .ok_or_else(invalid)?;

        Ok(DateTime::from_naive_utc_and_offset(naive, Utc))
    }
}

/// Translate a token pattern into a chrono strftime string.
/// Returns `None` when the pattern contains an unknown token.
fn translate_format(format: &str) -> Option<String> {
    let mut out = String::with_capacity(format.len() * 2);
    let chars: Vec<char> = format.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        // Quoted literal, e.g. 'T'
        if c == '\'' {
            i += 1;
            while i < chars.len() && chars[i] != '\'' {
                push_literal(&mut out, chars[i]);
                i += 1;
            }
            // Skip the closing quote; an unbalanced quote fails the pattern
            if i >= chars.len() {
                return None;
            }
            i += 1;
            continue;
        }

        if c.is_ascii_alphabetic() {
            let run_len = chars[i..].iter().take_while(|ch| **ch == c).count();
            let token: String = chars[i..i + run_len].iter().collect();
            let mapped = match token.as_str() {
                "yyyy" => "%Y",
                "yy" => "%y",
                "MM" => "%m",
                "M" => "%-m",
                "dd" => "%d",
                "d" => "%-d",
                "HH" => "%H",
                "mm" => "%M",
                "ss" => "%S",
                "SSS" => "%3f",
                // UTC marker; no timezone conversion beyond recognizing it
                "X" => "Z",
                _ => return None,
            };
            out.push_str(mapped);
            i += run_len;
            continue;
        }

        push_literal(&mut out, c);
        i += 1;
    }

    Some(out)
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}
