use crate::core::input::Input;
use crate::core::iterator::{describe, JsonIterator};
use crate::utils::error::Result;

impl<I: Input> JsonIterator<I> {
    /// 解碼字串內容到 scratch；呼叫前開頭的引號已經讀掉
    pub(crate) fn parse_string(&mut self, op: &'static str) -> Result<()> {
        self.scratch.clear();
        loop {
            if self.head == self.tail && !self.load_more()? {
                return Err(self.error(op, "incomplete string"));
            }
            let window = &self.input.bytes()[self.head..self.tail];
            match window.iter().position(|&b| b == b'"' || b == b'\\') {
                Some(i) => {
                    self.scratch.extend_from_slice(&window[..i]);
                    let b = window[i];
                    self.head += i + 1;
                    if b == b'"' {
                        return Ok(());
                    }
                    self.parse_escape(op)?;
                }
                None => {
                    self.scratch.extend_from_slice(window);
                    self.head = self.tail;
                }
            }
        }
    }

    fn next_string_byte(&mut self, op: &'static str) -> Result<u8> {
        match self.peek_byte()? {
            Some(b) => {
                self.head += 1;
                Ok(b)
            }
            None => Err(self.error(op, "incomplete string")),
        }
    }

    fn parse_escape(&mut self, op: &'static str) -> Result<()> {
        let decoded = match self.next_string_byte(op)? {
            b'b' => 0x08,
            b't' => b'\t',
            b'n' => b'\n',
            b'f' => 0x0c,
            b'r' => b'\r',
            b @ (b'"' | b'/' | b'\\') => b,
            b'u' => return self.parse_unicode_escape(op),
            other => {
                return Err(self.error(op, format!("invalid escape character: {}", describe(other))))
            }
        };
        self.scratch.push(decoded);
        Ok(())
    }

    fn read_hex_unit(&mut self, op: &'static str) -> Result<u32> {
        let mut unit = 0u32;
        for _ in 0..4 {
            let b = self.next_string_byte(op)?;
            let digit = char::from(b)
                .to_digit(16)
                .ok_or_else(|| self.error(op, format!("{} is not a valid hex digit", describe(b))))?;
            unit = (unit << 4) | digit;
        }
        Ok(unit)
    }

    /// `\u` 之後的四個十六進位字元，高代理必須緊接一組低代理
    fn parse_unicode_escape(&mut self, op: &'static str) -> Result<()> {
        let unit = self.read_hex_unit(op)?;
        let code_point = match unit {
            0xD800..=0xDBFF => {
                if self.next_string_byte(op)? != b'\\' || self.next_string_byte(op)? != b'u' {
                    return Err(self.error(op, "invalid surrogate"));
                }
                let low = self.read_hex_unit(op)?;
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return Err(self.error(op, "invalid surrogate"));
                }
                0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00)
            }
            0xDC00..=0xDFFF => return Err(self.error(op, "invalid surrogate")),
            _ => unit,
        };
        let c = char::from_u32(code_point).ok_or_else(|| self.error(op, "invalid unicode character"))?;
        let mut encoded = [0u8; 4];
        self.scratch
            .extend_from_slice(c.encode_utf8(&mut encoded).as_bytes());
        Ok(())
    }
}
