use crate::core::input::Input;
use crate::core::iterator::JsonIterator;
use crate::core::value_type::ValueType;
use crate::utils::error::Result;
use std::io::Read;

/// Accumulates the fields of one JSON object and builds a value from them.
///
/// `test_field` must consume the value of every field it is handed (read it
/// or `skip` it) and returns `false` to stop reading the object.
pub trait ElementFactory<T> {
    fn test_field<I: Input>(&mut self, field: &str, ji: &mut JsonIterator<I>) -> Result<bool>;

    fn create(self) -> T;
}

/// 讀取物件陣列，每個元素用一個新的 factory 建立
pub fn parse_list<T, F, I>(ji: &mut JsonIterator<I>, mut supplier: impl FnMut() -> F) -> Result<Vec<T>>
where
    F: ElementFactory<T>,
    I: Input,
{
    let mut list = Vec::new();
    while ji.read_array()? {
        list.push(parse_element(ji, &mut supplier)?);
    }
    Ok(list)
}

/// Like [`parse_list`] but also accepts bare strings as elements, converted
/// with `from_string`. `null` elements are dropped.
pub fn parse_list_or_strings<T, F, I>(
    ji: &mut JsonIterator<I>,
    mut supplier: impl FnMut() -> F,
    mut from_string: impl FnMut(&str) -> Result<T>,
) -> Result<Vec<T>>
where
    F: ElementFactory<T>,
    I: Input,
{
    let mut list = Vec::new();
    while ji.read_array()? {
        if ji.what_is_next()? == ValueType::Object {
            list.push(parse_element(ji, &mut supplier)?);
        } else if let Some(element) = ji.apply_chars(&mut from_string)? {
            list.push(element);
        }
    }
    Ok(list)
}

fn parse_element<T, F, I>(ji: &mut JsonIterator<I>, supplier: &mut impl FnMut() -> F) -> Result<T>
where
    F: ElementFactory<T>,
    I: Input,
{
    let mut factory = supplier();
    ji.test_object(|field, ji| factory.test_field(field, ji))?;
    Ok(factory.create())
}

/// A parser from any JSON source to `T`. Only [`parse`](Self::parse) has to
/// be implemented.
pub trait JsonIterParser<T> {
    fn parse<I: Input>(&self, ji: &mut JsonIterator<I>) -> Result<T>;

    fn parse_slice(&self, json: &[u8]) -> Result<T> {
        self.parse(&mut JsonIterator::from_slice(json))
    }

    fn parse_slice_range(&self, buf: &[u8], head: usize, tail: usize) -> Result<T> {
        self.parse(&mut JsonIterator::from_slice_range(buf, head, tail))
    }

    fn parse_str(&self, json: &str) -> Result<T> {
        self.parse_slice(json.as_bytes())
    }

    fn parse_reader<R: Read>(&self, reader: R, buffer_size: usize) -> Result<T> {
        self.parse(&mut JsonIterator::from_reader(reader, buffer_size))
    }
}
