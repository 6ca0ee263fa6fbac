use crate::utils::error::Result;
use std::io::{ErrorKind, Read};

/// Byte source behind a [`JsonIterator`](crate::core::iterator::JsonIterator).
///
/// The iterator only calls [`Input::refill`] after it has consumed every byte
/// of the current window, so implementations may overwrite the window freely.
pub trait Input {
    /// 目前的緩衝區視窗
    fn bytes(&self) -> &[u8];

    /// Replaces the window with the next chunk and returns its length.
    /// `0` means the input is exhausted.
    fn refill(&mut self) -> Result<usize>;

    fn supports_mark_reset(&self) -> bool;
}

/// 直接借用記憶體中的位元組，不會再補充資料
#[derive(Debug, Clone, Copy)]
pub struct SliceInput<'a> {
    bytes: &'a [u8],
}

impl<'a> SliceInput<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }
}

impl Input for SliceInput<'_> {
    fn bytes(&self) -> &[u8] {
        self.bytes
    }

    fn refill(&mut self) -> Result<usize> {
        Ok(0)
    }

    fn supports_mark_reset(&self) -> bool {
        true
    }
}

/// Streams from any reader through a fixed-size buffer.
#[derive(Debug)]
pub struct ReadInput<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: Read> ReadInput<R> {
    pub fn new(reader: R, buffer_size: usize) -> Self {
        Self {
            reader,
            buf: vec![0; buffer_size.max(1)],
        }
    }

    pub fn buffer_size(&self) -> usize {
        self.buf.len()
    }

    /// 換一個新的來源，緩衝區大小相同時沿用原本的配置
    pub fn replace_reader(&mut self, reader: R, buffer_size: usize) {
        let buffer_size = buffer_size.max(1);
        if self.buf.len() != buffer_size {
            self.buf = vec![0; buffer_size];
        }
        self.reader = reader;
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> Input for ReadInput<R> {
    fn bytes(&self) -> &[u8] {
        &self.buf
    }

    fn refill(&mut self) -> Result<usize> {
        loop {
            match self.reader.read(&mut self.buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn supports_mark_reset(&self) -> bool {
        false
    }
}
