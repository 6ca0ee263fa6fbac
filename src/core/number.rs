use crate::core::input::Input;
use crate::core::instant::parse_instant;
use crate::core::iterator::{describe, JsonIterator};
use crate::core::value_type::ValueType;
use crate::utils::error::Result;
use bigdecimal::num_bigint::BigInt;
use bigdecimal::{BigDecimal, ParseBigDecimalError};
use chrono::{DateTime, Utc};
use serde_json::{Number, Value};
use std::fmt::Display;
use std::str::FromStr;

fn is_number_byte(b: u8) -> bool {
    matches!(b, b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E')
}

impl<I: Input> JsonIterator<I> {
    pub fn read_bool(&mut self) -> Result<bool> {
        match self.next_token()? {
            b't' => {
                self.expect_literal("readBoolean", b"rue")?;
                Ok(true)
            }
            b'f' => {
                self.expect_literal("readBoolean", b"alse")?;
                Ok(false)
            }
            c => Err(self.error("readBoolean", format!("expected t or f, found: {}", describe(c)))),
        }
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        let value = self.read_integer("readShort", "short", i16::MIN.into(), i16::MAX.into())?;
        i16::try_from(value).map_err(|_| self.error("readShort", format!("short overflow: {}", value)))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let value = self.read_integer("readInt", "int", i32::MIN.into(), i32::MAX.into())?;
        i32::try_from(value).map_err(|_| self.error("readInt", format!("int overflow: {}", value)))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.read_integer("readLong", "long", i64::MIN, i64::MAX)
    }

    /// 以負數累加，才能完整表示 i64::MIN
    fn read_integer(&mut self, op: &'static str, target: &str, min: i64, max: i64) -> Result<i64> {
        let first = self.next_token()?;
        let negative = first == b'-';
        let first = if negative { self.read_byte(op)? } else { first };
        let mut value = match first {
            b'0' => {
                self.assert_not_leading_zero(op)?;
                return Ok(0);
            }
            b'1'..=b'9' => -i64::from(first - b'0'),
            c => return Err(self.error(op, format!("expected 0~9, but found: {}", describe(c)))),
        };
        while let Some(b) = self.peek_byte()? {
            if !b.is_ascii_digit() {
                break;
            }
            self.head += 1;
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_sub(i64::from(b - b'0')))
                .filter(|v| *v >= min)
                .ok_or_else(|| self.error(op, format!("value is too large for {}", target)))?;
        }
        if negative {
            return Ok(value);
        }
        if value < -max {
            return Err(self.error(op, format!("value is too large for {}", target)));
        }
        Ok(-value)
    }

    fn assert_not_leading_zero(&mut self, op: &'static str) -> Result<()> {
        match self.peek_byte()? {
            Some(b) if b.is_ascii_digit() => Err(self.error(op, "leading zero is invalid")),
            _ => Ok(()),
        }
    }

    /// 把數字的原始文字收進 scratch
    fn scan_number(&mut self, op: &'static str) -> Result<()> {
        self.scratch.clear();
        self.peek_token()?;
        loop {
            if self.head == self.tail && !self.load_more()? {
                break;
            }
            let window = &self.input.bytes()[self.head..self.tail];
            let end = window
                .iter()
                .position(|&b| !is_number_byte(b))
                .unwrap_or(window.len());
            self.scratch.extend_from_slice(&window[..end]);
            self.head += end;
            if end < window.len() {
                break;
            }
        }
        if self.scratch.is_empty() {
            let c = self.input.bytes()[self.head];
            return Err(self.error(op, format!("expected a number, but found: {}", describe(c))));
        }
        Ok(())
    }

    pub fn read_number_as_string(&mut self) -> Result<String> {
        self.scan_number("readNumberAsString")?;
        Ok(self.scratch_str("readNumberAsString")?.to_owned())
    }

    /// Returns the raw text of a number, of a string holding a number, or
    /// `None` for `null`.
    pub fn read_number_or_number_string(&mut self) -> Result<Option<String>> {
        if !self.read_numeric_text("readNumberOrNumberString")? {
            return Ok(None);
        }
        Ok(Some(self.scratch_str("readNumberOrNumberString")?.to_owned()))
    }

    /// 數字、字串或 null；前兩者的文字放進 scratch
    fn read_numeric_text(&mut self, op: &'static str) -> Result<bool> {
        match self.what_is_next()? {
            ValueType::Number => {
                self.scan_number(op)?;
                Ok(true)
            }
            ValueType::String => {
                self.head += 1;
                self.parse_string(op)?;
                Ok(true)
            }
            ValueType::Null => {
                self.read_null()?;
                Ok(false)
            }
            other => Err(self.error(op, format!("must be a number, string or null but found: {:?}", other))),
        }
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.read_float("readDouble", f64::INFINITY, f64::NEG_INFINITY)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_float("readFloat", f32::INFINITY, f32::NEG_INFINITY)
    }

    fn read_float<T>(&mut self, op: &'static str, infinity: T, neg_infinity: T) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        if self.peek_token()? == b'"' {
            return match self.read_string()?.as_deref() {
                Some("infinity") => Ok(infinity),
                Some("-infinity") => Ok(neg_infinity),
                Some(other) => Err(self.error(op, format!("expected a number but found string: {}", other))),
                None => Err(self.error(op, "expected a number")),
            };
        }
        self.scan_number(op)?;
        let text = self.scratch_str(op)?;
        text.parse::<T>()
            .map_err(|e| self.error(op, format!("{}: {}", e, text)))
    }

    pub fn read_big_decimal(&mut self) -> Result<Option<BigDecimal>> {
        self.read_decimal("readBigDecimal", |text| BigDecimal::from_str(text))
    }

    /// Like [`read_big_decimal`](Self::read_big_decimal) with trailing
    /// fractional zeros removed, so `1.50` reads as `1.5` and `2.0` as `2`.
    pub fn read_big_decimal_strip_trailing_zeros(&mut self) -> Result<Option<BigDecimal>> {
        self.read_decimal("readBigDecimalStripTrailingZeros", strip_trailing_zeros)
    }

    fn read_decimal(
        &mut self,
        op: &'static str,
        parse: impl FnOnce(&str) -> std::result::Result<BigDecimal, ParseBigDecimalError>,
    ) -> Result<Option<BigDecimal>> {
        if !self.read_numeric_text(op)? {
            return Ok(None);
        }
        let text = self.scratch_str(op)?;
        parse(text)
            .map(Some)
            .map_err(|e| self.error(op, format!("{}: {}", e, text)))
    }

    pub fn read_big_int(&mut self) -> Result<Option<BigInt>> {
        const OP: &str = "readBigInteger";
        if !self.read_numeric_text(OP)? {
            return Ok(None);
        }
        let text = self.scratch_str(OP)?;
        BigInt::from_str(text)
            .map(Some)
            .map_err(|e| self.error(OP, format!("{}: {}", e, text)))
    }

    pub fn read_instant(&mut self) -> Result<Option<DateTime<Utc>>> {
        self.apply_chars(parse_instant).map(Option::flatten)
    }

    pub(crate) fn read_number_value(&mut self) -> Result<Value> {
        self.scan_number("readValue")?;
        let text = self.scratch_str("readValue")?;
        if let Ok(v) = text.parse::<i64>() {
            return Ok(Value::from(v));
        }
        if let Ok(v) = text.parse::<u64>() {
            return Ok(Value::from(v));
        }
        let v = text
            .parse::<f64>()
            .map_err(|e| self.error("readValue", format!("{}: {}", e, text)))?;
        Number::from_f64(v)
            .map(Value::Number)
            .ok_or_else(|| self.error("readValue", format!("number out of range: {}", text)))
    }
}

fn strip_trailing_zeros(text: &str) -> std::result::Result<BigDecimal, ParseBigDecimalError> {
    if text.contains(|c| c == 'e' || c == 'E') {
        return BigDecimal::from_str(text).map(|d| d.normalized());
    }
    match text.split_once('.') {
        Some((int_part, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                BigDecimal::from_str(int_part)
            } else {
                BigDecimal::from_str(&text[..int_part.len() + 1 + fraction.len()])
            }
        }
        None => BigDecimal::from_str(text),
    }
}
