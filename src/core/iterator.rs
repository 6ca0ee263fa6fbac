use crate::core::input::{Input, ReadInput, SliceInput};
use crate::core::value_type::ValueType;
use crate::utils::error::{JsonError, Result};
use serde_json::{Map, Value};
use std::io::Read;

const DEFAULT_CHAR_BUFFER_CAPACITY: usize = 32;
const PEEK_LEN: usize = 10;
const BUFFER_PREVIEW_LEN: usize = 1_024;
/// 與 serde_json 的遞迴上限相同
pub const MAX_NESTING_DEPTH: usize = 128;

/// Pull-style JSON reader.
///
/// Nothing is parsed ahead of the caller: every method consumes exactly the
/// token or value it names. Decoded strings land in one reusable scratch
/// buffer, which the callback methods (`apply_chars`, `test_object`, ...)
/// lend out as `&str` without allocating.
///
/// ```
/// use jsoniter::JsonIterator;
///
/// let mut ji = JsonIterator::from_slice(r#"{"hello": [1, 2, 3]}"#);
/// assert_eq!(ji.read_object().unwrap().as_deref(), Some("hello"));
/// let mut total = 0;
/// while ji.read_array().unwrap() {
///     total += ji.read_i32().unwrap();
/// }
/// assert_eq!(total, 6);
/// assert_eq!(ji.read_object().unwrap(), None);
/// ```
#[derive(Debug)]
pub struct JsonIterator<I> {
    pub(crate) input: I,
    pub(crate) head: usize,
    pub(crate) tail: usize,
    /// 先前補充資料時丟掉的位元組數，用來回報絕對位置
    pub(crate) consumed: usize,
    pub(crate) scratch: Vec<u8>,
}

pub type SliceJsonIterator<'a> = JsonIterator<SliceInput<'a>>;
pub type StreamJsonIterator<R> = JsonIterator<ReadInput<R>>;

impl<'a> JsonIterator<SliceInput<'a>> {
    pub fn from_slice<B: AsRef<[u8]> + ?Sized>(json: &'a B) -> Self {
        let bytes = json.as_ref();
        Self::from_slice_range(bytes, 0, bytes.len())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(json: &'a str) -> Self {
        Self::from_slice(json.as_bytes())
    }

    /// Iterates over `buf[head..tail]`. Out of range bounds are clamped.
    pub fn from_slice_range(buf: &'a [u8], head: usize, tail: usize) -> Self {
        let tail = tail.min(buf.len());
        Self::with_input(SliceInput::new(buf), head.min(tail), tail)
    }

    pub fn reset(&mut self, buf: &'a [u8]) -> &mut Self {
        self.reset_range(buf, 0, buf.len())
    }

    pub fn reset_range(&mut self, buf: &'a [u8], head: usize, tail: usize) -> &mut Self {
        let tail = tail.min(buf.len());
        self.input = SliceInput::new(buf);
        self.head = head.min(tail);
        self.tail = tail;
        self.consumed = 0;
        self
    }
}

impl<R: Read> JsonIterator<ReadInput<R>> {
    pub fn from_reader(reader: R, buffer_size: usize) -> Self {
        Self::with_input(ReadInput::new(reader, buffer_size), 0, 0)
    }

    pub fn reset_reader(&mut self, reader: R) -> &mut Self {
        let buffer_size = self.input.buffer_size();
        self.reset_reader_with_buffer_size(reader, buffer_size)
    }

    pub fn reset_reader_with_buffer_size(&mut self, reader: R, buffer_size: usize) -> &mut Self {
        self.input.replace_reader(reader, buffer_size);
        self.head = 0;
        self.tail = 0;
        self.consumed = 0;
        self
    }
}

impl<I: Input> JsonIterator<I> {
    fn with_input(input: I, head: usize, tail: usize) -> Self {
        Self {
            input,
            head,
            tail,
            consumed: 0,
            scratch: Vec::with_capacity(DEFAULT_CHAR_BUFFER_CAPACITY),
        }
    }

    /// 設定字串暫存區的初始容量，不夠時會自動加倍
    pub fn with_char_buffer_capacity(mut self, capacity: usize) -> Self {
        self.scratch = Vec::with_capacity(capacity);
        self
    }

    /// Releases the underlying input.
    pub fn close(self) -> I {
        self.input
    }

    pub fn supports_mark_reset(&self) -> bool {
        self.input.supports_mark_reset()
    }

    pub fn mark(&self) -> Result<usize> {
        if !self.supports_mark_reset() {
            return Err(JsonError::MarkUnsupported);
        }
        Ok(self.head)
    }

    pub fn reset_to(&mut self, mark: usize) -> Result<&mut Self> {
        if !self.supports_mark_reset() {
            return Err(JsonError::MarkUnsupported);
        }
        if mark > self.tail {
            return Err(self.error("reset", format!("mark {} is past the end of input", mark)));
        }
        self.head = mark;
        Ok(self)
    }

    /// 目前讀取位置（從輸入開頭算起的位元組數）
    pub fn position(&self) -> usize {
        self.consumed + self.head
    }

    pub fn current_buffer(&self) -> String {
        let window = self.window_to(self.tail);
        let preview = &window[..window.len().min(BUFFER_PREVIEW_LEN)];
        format!(
            "head: {}, peek: {}, buf: {}",
            self.position(),
            self.peek_before_head(),
            String::from_utf8_lossy(preview)
        )
    }

    fn window_to(&self, end: usize) -> &[u8] {
        let bytes = self.input.bytes();
        &bytes[..end.min(bytes.len())]
    }

    fn peek_before_head(&self) -> String {
        let window = self.window_to(self.head.min(self.tail));
        let start = window.len().saturating_sub(PEEK_LEN);
        String::from_utf8_lossy(&window[start..]).into_owned()
    }

    pub(crate) fn error(&self, op: &'static str, message: impl Into<String>) -> JsonError {
        JsonError::Syntax {
            op,
            message: message.into(),
            position: self.position(),
            peek: self.peek_before_head(),
        }
    }

    /// 只有在目前視窗已經讀完 (head == tail) 時才會被呼叫
    pub(crate) fn load_more(&mut self) -> Result<bool> {
        let n = self.input.refill()?;
        if n == 0 {
            return Ok(false);
        }
        self.consumed += self.tail;
        self.head = 0;
        self.tail = n;
        tracing::trace!(position = self.consumed, bytes = n, "refilled json input buffer");
        Ok(true)
    }

    /// Skips whitespace and reports whether the input is exhausted.
    pub fn at_end(&mut self) -> Result<bool> {
        loop {
            if self.head == self.tail && !self.load_more()? {
                return Ok(true);
            }
            let window = &self.input.bytes()[self.head..self.tail];
            match window.iter().position(|&b| !is_whitespace(b)) {
                Some(i) => {
                    self.head += i;
                    return Ok(false);
                }
                None => self.head = self.tail,
            }
        }
    }

    pub(crate) fn peek_token(&mut self) -> Result<u8> {
        if self.at_end()? {
            return Err(self.error("nextToken", "unexpected end"));
        }
        Ok(self.input.bytes()[self.head])
    }

    pub(crate) fn next_token(&mut self) -> Result<u8> {
        let b = self.peek_token()?;
        self.head += 1;
        Ok(b)
    }

    /// 必定緊接在 next_token 之後呼叫
    pub(crate) fn unread(&mut self) {
        debug_assert!(self.head > 0);
        self.head -= 1;
    }

    pub(crate) fn peek_byte(&mut self) -> Result<Option<u8>> {
        if self.head == self.tail && !self.load_more()? {
            return Ok(None);
        }
        Ok(Some(self.input.bytes()[self.head]))
    }

    pub(crate) fn read_byte(&mut self, op: &'static str) -> Result<u8> {
        match self.peek_byte()? {
            Some(b) => {
                self.head += 1;
                Ok(b)
            }
            None => Err(self.error(op, "no more to read")),
        }
    }

    pub(crate) fn expect_literal(&mut self, op: &'static str, rest: &[u8]) -> Result<()> {
        for &expected in rest {
            let b = self.read_byte(op)?;
            if b != expected {
                return Err(self.error(
                    op,
                    format!("invalid literal, expected {} but found: {}", describe(expected), describe(b)),
                ));
            }
        }
        Ok(())
    }

    fn expect_token(&mut self, op: &'static str, expected: u8) -> Result<&mut Self> {
        let c = self.next_token()?;
        if c == expected {
            return Ok(self);
        }
        Err(self.error(
            op,
            format!("expected '{}' but found: {}", expected as char, describe(c)),
        ))
    }

    pub fn what_is_next(&mut self) -> Result<ValueType> {
        Ok(ValueType::of(self.peek_token()?))
    }

    // Arrays

    /// Advances into or through an array.
    ///
    /// Returns `true` when another element follows and `false` at the end of
    /// the array, for an empty array, or for `null`.
    pub fn read_array(&mut self) -> Result<bool> {
        match self.next_token()? {
            b'[' => {
                if self.next_token()? == b']' {
                    return Ok(false);
                }
                self.unread();
                Ok(true)
            }
            b',' => Ok(true),
            b']' => Ok(false),
            b'n' => {
                self.expect_literal("readArray", b"ull")?;
                Ok(false)
            }
            c => Err(self.error(
                "readArray",
                format!("expected [ or , or n or ], but found: {}", describe(c)),
            )),
        }
    }

    pub fn open_array(&mut self) -> Result<&mut Self> {
        self.expect_token("openArray", b'[')
    }

    pub fn continue_array(&mut self) -> Result<&mut Self> {
        self.expect_token("continueArray", b',')
    }

    pub fn close_array(&mut self) -> Result<&mut Self> {
        self.expect_token("closeArray", b']')
    }

    // Objects

    /// 讀取下一個欄位名稱到 scratch 並吃掉冒號；物件結束或遇到 null 時回傳 false
    fn next_field(&mut self, op: &'static str) -> Result<bool> {
        match self.next_token()? {
            b'{' => match self.next_token()? {
                b'"' => {}
                b'}' => return Ok(false),
                c => {
                    return Err(self.error(op, format!("expected \" after {{, but found: {}", describe(c))))
                }
            },
            b',' => {
                let c = self.next_token()?;
                if c != b'"' {
                    return Err(self.error(op, format!("expected string field, but found: {}", describe(c))));
                }
            }
            b'}' => return Ok(false),
            b'n' => {
                self.expect_literal(op, b"ull")?;
                return Ok(false);
            }
            c => {
                return Err(self.error(
                    op,
                    format!("expected {{ or , or }} or n, but found: {}", describe(c)),
                ))
            }
        }
        self.parse_string(op)?;
        let c = self.next_token()?;
        if c != b':' {
            return Err(self.error(op, format!("expected :, but found: {}", describe(c))));
        }
        Ok(true)
    }

    pub(crate) fn scratch_str(&self, op: &'static str) -> Result<&str> {
        std::str::from_utf8(&self.scratch)
            .map_err(|e| self.error(op, format!("invalid utf-8 in string: {}", e)))
    }

    /// 把 scratch 借給 callback，同時讓 callback 繼續使用 iterator
    fn with_scratch<R>(
        &mut self,
        op: &'static str,
        f: impl FnOnce(&str, &mut Self) -> Result<R>,
    ) -> Result<R> {
        let mut scratch = std::mem::take(&mut self.scratch);
        let result = match std::str::from_utf8(&scratch) {
            Ok(chars) => f(chars, self),
            Err(e) => Err(self.error(op, format!("invalid utf-8 in string: {}", e))),
        };
        // 巢狀呼叫可能已經把新的 scratch 放大，留下容量較大的那個
        if self.scratch.capacity() > scratch.capacity() {
            scratch = std::mem::take(&mut self.scratch);
        }
        scratch.clear();
        self.scratch = scratch;
        result
    }

    /// Returns the next field name of the current object, or `None` once the
    /// object (or a `null` in its place) has been consumed.
    pub fn read_obj_field(&mut self) -> Result<Option<String>> {
        if !self.next_field("readObjField")? {
            return Ok(None);
        }
        Ok(Some(self.scratch_str("readObjField")?.to_owned()))
    }

    pub fn read_object(&mut self) -> Result<Option<String>> {
        self.read_obj_field()
    }

    /// 跳過欄位名稱，回傳 false 表示物件已結束
    pub fn skip_obj_field(&mut self) -> Result<bool> {
        self.next_field("skipObjField")
    }

    /// Skips fields of the current object until `field` is found, leaving its
    /// value next. Returns `false` if the object ends first.
    pub fn skip_until(&mut self, field: &str) -> Result<bool> {
        while self.next_field("skipUntil")? {
            if self.scratch.as_slice() == field.as_bytes() {
                return Ok(true);
            }
            self.skip()?;
        }
        Ok(false)
    }

    pub fn close_obj(&mut self) -> Result<&mut Self> {
        self.expect_token("closeObj", b'}')
    }

    pub fn test_obj_field(&mut self, f: impl FnOnce(&str) -> bool) -> Result<bool> {
        if !self.next_field("testObjField")? {
            return Ok(false);
        }
        Ok(f(self.scratch_str("testObjField")?))
    }

    /// Hands the next field name and the iterator to `f`, which is expected
    /// to consume the field's value. `None` at the end of the object.
    pub fn apply_object<R>(
        &mut self,
        f: impl FnOnce(&str, &mut Self) -> Result<R>,
    ) -> Result<Option<R>> {
        if !self.next_field("applyObject")? {
            return Ok(None);
        }
        self.with_scratch("applyObject", f).map(Some)
    }

    /// Calls `f` for every field of an object until the object ends or `f`
    /// returns `false`. After an early stop the remaining fields are left
    /// unread.
    pub fn test_object(&mut self, mut f: impl FnMut(&str, &mut Self) -> Result<bool>) -> Result<()> {
        while self.next_field("testObject")? {
            if !self.with_scratch("testObject", &mut f)? {
                return Ok(());
            }
        }
        Ok(())
    }

    // Strings

    /// 下一個值是字串時解碼到 scratch 並回傳 true；null 回傳 false
    fn next_string(&mut self, op: &'static str) -> Result<bool> {
        match self.next_token()? {
            b'"' => {
                self.parse_string(op)?;
                Ok(true)
            }
            b'n' => {
                self.expect_literal(op, b"ull")?;
                Ok(false)
            }
            c => Err(self.error(op, format!("expected string or null, but found: {}", describe(c)))),
        }
    }

    pub fn read_string(&mut self) -> Result<Option<String>> {
        self.apply_chars(|chars| Ok(chars.to_owned()))
    }

    /// Builds a value straight from the decoded characters of the next
    /// string. `f` is not called for `null`.
    pub fn apply_chars<R>(&mut self, f: impl FnOnce(&str) -> Result<R>) -> Result<Option<R>> {
        if !self.next_string("applyChars")? {
            return Ok(None);
        }
        f(self.scratch_str("applyChars")?).map(Some)
    }

    pub fn test_chars(&mut self, f: impl FnOnce(&str) -> bool) -> Result<bool> {
        if !self.next_string("testChars")? {
            return Ok(false);
        }
        Ok(f(self.scratch_str("testChars")?))
    }

    pub fn consume_chars(&mut self, f: impl FnOnce(&str)) -> Result<()> {
        if self.next_string("consumeChars")? {
            f(self.scratch_str("consumeChars")?);
        }
        Ok(())
    }

    // Literals and skipping

    /// Consumes `null` if it is next and returns `true`; otherwise leaves the
    /// iterator where it was.
    pub fn read_null(&mut self) -> Result<bool> {
        if self.peek_token()? != b'n' {
            return Ok(false);
        }
        self.head += 1;
        self.expect_literal("readNull", b"ull")?;
        Ok(true)
    }

    pub fn skip(&mut self) -> Result<&mut Self> {
        match self.next_token()? {
            b'"' => self.skip_string()?,
            b'-' | b'0'..=b'9' => self.skip_until_break()?,
            b't' => self.expect_literal("skip", b"rue")?,
            b'n' => self.expect_literal("skip", b"ull")?,
            b'f' => self.expect_literal("skip", b"alse")?,
            b'[' | b'{' => self.skip_container()?,
            c => return Err(self.error("skip", format!("do not know how to skip: {}", describe(c)))),
        }
        Ok(self)
    }

    fn skip_string(&mut self) -> Result<()> {
        loop {
            if self.head == self.tail && !self.load_more()? {
                return Err(self.error("skipString", "incomplete string"));
            }
            let window = &self.input.bytes()[self.head..self.tail];
            match window.iter().position(|&b| b == b'"' || b == b'\\') {
                Some(i) => {
                    let b = window[i];
                    self.head += i + 1;
                    if b == b'"' {
                        return Ok(());
                    }
                    // 跳脫字元後面那個位元組不可能是字串結尾
                    if self.peek_byte()?.is_none() {
                        return Err(self.error("skipString", "incomplete string"));
                    }
                    self.head += 1;
                }
                None => self.head = self.tail,
            }
        }
    }

    fn skip_until_break(&mut self) -> Result<()> {
        loop {
            if self.head == self.tail && !self.load_more()? {
                return Ok(());
            }
            let window = &self.input.bytes()[self.head..self.tail];
            match window
                .iter()
                .position(|&b| is_whitespace(b) || matches!(b, b',' | b'}' | b']'))
            {
                Some(i) => {
                    self.head += i;
                    return Ok(());
                }
                None => self.head = self.tail,
            }
        }
    }

    /// 開頭的 [ 或 { 已經讀過
    fn skip_container(&mut self) -> Result<()> {
        let mut level = 1usize;
        loop {
            if self.head == self.tail && !self.load_more()? {
                return Err(self.error("skip", "incomplete array or object"));
            }
            let window = &self.input.bytes()[self.head..self.tail];
            match window
                .iter()
                .position(|&b| matches!(b, b'"' | b'[' | b'{' | b']' | b'}'))
            {
                Some(i) => {
                    let b = window[i];
                    self.head += i + 1;
                    match b {
                        b'"' => self.skip_string()?,
                        b'[' | b'{' => level += 1,
                        _ => {
                            level -= 1;
                            if level == 0 {
                                return Ok(());
                            }
                        }
                    }
                }
                None => self.head = self.tail,
            }
        }
    }

    // Generic values

    /// Materializes the next value, whatever its type.
    ///
    /// Containers are built on an explicit stack; nesting deeper than
    /// `MAX_NESTING_DEPTH` is an error.
    pub fn read_value(&mut self) -> Result<Value> {
        let mut stack: Vec<Frame> = Vec::new();
        loop {
            let mut value = match self.what_is_next()? {
                ValueType::String => self.read_string()?.map_or(Value::Null, Value::String),
                ValueType::Number => self.read_number_value()?,
                ValueType::Boolean => Value::Bool(self.read_bool()?),
                ValueType::Null => {
                    self.read_null()?;
                    Value::Null
                }
                ValueType::Array => {
                    if self.read_array()? {
                        self.push_frame(&mut stack, Frame::Array(Vec::new()))?;
                        continue;
                    }
                    Value::Array(Vec::new())
                }
                ValueType::Object => match self.read_obj_field()? {
                    Some(field) => {
                        self.push_frame(&mut stack, Frame::Object(Map::new(), field))?;
                        continue;
                    }
                    None => Value::Object(Map::new()),
                },
                ValueType::Invalid => {
                    let c = self.input.bytes()[self.head];
                    return Err(self.error("readValue", format!("unexpected character: {}", describe(c))));
                }
            };

            // 把完成的值放回上層容器，容器讀完就繼續往外收
            loop {
                let Some(frame) = stack.pop() else {
                    return Ok(value);
                };
                match frame {
                    Frame::Array(mut items) => {
                        items.push(value);
                        if self.read_array()? {
                            stack.push(Frame::Array(items));
                            break;
                        }
                        value = Value::Array(items);
                    }
                    Frame::Object(mut map, field) => {
                        map.insert(field, value);
                        match self.read_obj_field()? {
                            Some(next) => {
                                stack.push(Frame::Object(map, next));
                                break;
                            }
                            None => value = Value::Object(map),
                        }
                    }
                }
            }
        }
    }

    fn push_frame(&self, stack: &mut Vec<Frame>, frame: Frame) -> Result<()> {
        if stack.len() >= MAX_NESTING_DEPTH {
            return Err(self.error(
                "readValue",
                format!("nesting too deep, more than {} levels", MAX_NESTING_DEPTH),
            ));
        }
        stack.push(frame);
        Ok(())
    }
}

/// 組裝中的容器；物件同時記住目前欄位名稱
enum Frame {
    Array(Vec<Value>),
    Object(Map<String, Value>, String),
}

pub(crate) fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\n' | b'\t' | b'\r')
}

pub(crate) fn describe(b: u8) -> String {
    if b.is_ascii_graphic() || b == b' ' {
        format!("'{}'", b as char)
    } else {
        format!("0x{:02x}", b)
    }
}
