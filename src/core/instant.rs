use crate::utils::error::{JsonError, Result};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

const MIN_LEN: usize = 19;

/// Parses an ISO-8601 or RFC 1123 date-time into an instant.
///
/// - ISO: `yyyy-MM-ddTHH:mm:ss[.fraction][Z|±HH|±HH:mm]`. Fractions beyond
///   nanoseconds are truncated and a missing offset means UTC.
/// - RFC 1123: `Fri, 04 Oct 2019 16:06:36 GMT`, recognized by its leading
///   day name.
///
/// Empty text yields `None`.
pub fn parse_instant(text: &str) -> Result<Option<DateTime<Utc>>> {
    if text.is_empty() {
        return Ok(None);
    }
    if text.len() < MIN_LEN {
        return Err(invalid(
            format!("Invalid length, {}, expected at least {} characters ", text.len(), MIN_LEN),
            text,
            0,
        ));
    }
    match text.as_bytes()[0] {
        b'S' | b'T' | b'M' | b'W' | b'F' => parse_rfc_1123(text).map(Some),
        b'0'..=b'9' => parse_iso(text).map(Some),
        _ => Err(invalid("Invalid year ", text, 0)),
    }
}

fn invalid(context: impl Into<String>, text: &str, offset: usize) -> JsonError {
    JsonError::InvalidDateTime {
        context: context.into(),
        input: text.to_string(),
        offset,
    }
}

fn parse_rfc_1123(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| invalid(format!("Invalid RFC 1123 date-time ({}) ", e), text, 0))
}

fn digits(bytes: &[u8], start: usize, count: usize, field: &str, text: &str) -> Result<u32> {
    let mut value = 0u32;
    for i in start..start + count {
        match bytes.get(i) {
            Some(b) if b.is_ascii_digit() => value = value * 10 + u32::from(b - b'0'),
            _ => return Err(invalid(format!("Invalid {} ", field), text, i)),
        }
    }
    Ok(value)
}

fn parse_iso(text: &str) -> Result<DateTime<Utc>> {
    let bytes = text.as_bytes();
    // 分隔字元 (- T :) 不檢查，只看數字欄位
    let year = digits(bytes, 0, 4, "year", text)?;
    let month = digits(bytes, 5, 2, "month", text)?;
    let day = digits(bytes, 8, 2, "day", text)?;
    let hour = digits(bytes, 11, 2, "hour", text)?;
    let minute = digits(bytes, 14, 2, "minute", text)?;
    let second = digits(bytes, 17, 2, "second", text)?;

    let mut i = MIN_LEN;
    let mut nanos = 0u32;
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            if i - start < 9 {
                nanos = nanos * 10 + u32::from(bytes[i] - b'0');
            }
            i += 1;
        }
        let count = i - start;
        if count == 0 {
            return Err(invalid("Invalid fraction ", text, start));
        }
        nanos *= 10u32.pow(9 - count.min(9) as u32);
    }

    let mut offset_seconds = 0i64;
    match bytes.get(i) {
        None => {}
        Some(b'Z') if i + 1 == bytes.len() => {}
        Some(b'+' | b'-') => offset_seconds = parse_offset(bytes, i, text)?,
        Some(_) => return Err(invalid("Invalid offset ", text, i)),
    }

    let naive = NaiveDate::from_ymd_opt(year as i32, month, day)
        .and_then(|date| date.and_hms_nano_opt(hour, minute, second, nanos))
        .ok_or_else(|| invalid("Invalid date-time ", text, 0))?;
    Ok(Utc.from_utc_datetime(&naive) - Duration::seconds(offset_seconds))
}

/// `±HH`、`±HH:mm` 或 `±HHmm`
fn parse_offset(bytes: &[u8], sign_at: usize, text: &str) -> Result<i64> {
    let sign = if bytes[sign_at] == b'-' { -1 } else { 1 };
    let hours = digits(bytes, sign_at + 1, 2, "offset hours", text)?;
    let mut i = sign_at + 3;
    let mut minutes = 0;
    if i < bytes.len() {
        if bytes[i] == b':' {
            i += 1;
        }
        minutes = digits(bytes, i, 2, "offset minutes", text)?;
        i += 2;
    }
    if i != bytes.len() || hours > 18 || minutes > 59 {
        return Err(invalid("Invalid offset ", text, sign_at));
    }
    Ok(sign * i64::from(hours * 3_600 + minutes * 60))
}
