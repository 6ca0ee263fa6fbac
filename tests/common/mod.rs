/// 以記憶體與不同緩衝區大小的串流各跑一次同樣的測試內容
macro_rules! with_iterators {
    ($json:expr, |$ji:ident| $body:block) => {{
        let json: &str = $json;
        {
            let mut iterator = jsoniter::JsonIterator::from_slice(json);
            let $ji = &mut iterator;
            $body
        }
        for buffer_size in [1usize, 2, 3, 64] {
            let mut iterator = jsoniter::JsonIterator::from_reader(
                std::io::Cursor::new(json.as_bytes().to_vec()),
                buffer_size,
            );
            let $ji = &mut iterator;
            $body
        }
    }};
}

pub(crate) use with_iterators;
