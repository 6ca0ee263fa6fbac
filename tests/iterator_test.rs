use anyhow::Result;
use jsoniter::{JsonIterator, ValueType};

mod common;
use common::with_iterators;

#[test]
fn test_empty_object() -> Result<()> {
    with_iterators!("{}", |ji| {
        assert_eq!(ji.read_object()?, None);
    });
    with_iterators!(" { \n } ", |ji| {
        assert!(!ji.skip_obj_field()?);
        assert!(ji.at_end()?);
    });
    Ok(())
}

#[test]
fn test_one_field() -> Result<()> {
    let json = "{ \"field1\"\n:\n\t\"hello\" }";
    with_iterators!(json, |ji| {
        assert_eq!(ji.read_object()?.as_deref(), Some("field1"));
        assert_eq!(ji.read_string()?.as_deref(), Some("hello"));
        assert_eq!(ji.read_object()?, None);
    });
    with_iterators!(json, |ji| {
        assert!(ji.skip_obj_field()?);
        assert_eq!(ji.read_string()?.as_deref(), Some("hello"));
        assert!(!ji.skip_obj_field()?);
    });
    Ok(())
}

#[test]
fn test_apply_object_hands_over_iterator() -> Result<()> {
    let json = "{ \"field1\"\n:\n\t\"hello\" }";
    with_iterators!(json, |ji| {
        let nested = ji.apply_object(|field, ji| {
            assert_eq!(field, "field1");
            assert_eq!(ji.read_string()?.as_deref(), Some("hello"));
            // 物件已結束，callback 不會被呼叫
            ji.apply_object(|_, _| -> jsoniter::Result<()> { panic!("object already ended") })
        })?;
        assert_eq!(nested, Some(None));
    });
    Ok(())
}

#[test]
fn test_two_fields_and_skip_until() -> Result<()> {
    with_iterators!(r#"{ "field1" : "hello" , "field2": "world" }"#, |ji| {
        assert!(ji.skip_until("field2")?);
        assert_eq!(ji.read_string()?.as_deref(), Some("world"));
        assert_eq!(ji.read_object()?, None);
    });
    with_iterators!(
        r#"{ "field1" : "hello" , "field2": {"nested1" : "blah", "nested2": "world"} }"#,
        |ji| {
            assert!(ji.skip_until("field2")?);
            assert!(ji.skip_until("nested2")?);
            assert_eq!(ji.read_string()?.as_deref(), Some("world"));
        }
    );
    with_iterators!(r#"{"a": [1, {"b": "}"}], "c": 2}"#, |ji| {
        assert!(!ji.skip_until("missing")?);
        assert!(ji.at_end()?);
    });
    Ok(())
}

#[test]
fn test_test_object_visits_every_field() -> Result<()> {
    with_iterators!(r#"{"a": 1, "b": [true, false], "c": {"d": null}, "e": "x"}"#, |ji| {
        let mut seen = Vec::new();
        ji.test_object(|field, ji| {
            seen.push(field.to_string());
            ji.skip()?;
            Ok(true)
        })?;
        assert_eq!(seen, ["a", "b", "c", "e"]);
        assert!(ji.at_end()?);
    });
    Ok(())
}

#[test]
fn test_test_object_stops_early() -> Result<()> {
    with_iterators!(r#"{"a": 1, "stop": 2, "c": 3}"#, |ji| {
        let mut seen = 0;
        ji.test_object(|field, ji| {
            seen += 1;
            ji.skip()?;
            Ok(field != "stop")
        })?;
        assert_eq!(seen, 2);
        assert_eq!(ji.read_object()?.as_deref(), Some("c"));
    });
    Ok(())
}

#[test]
fn test_test_obj_field() -> Result<()> {
    with_iterators!(r#"{"price": 1, "qty": 2}"#, |ji| {
        assert!(ji.test_obj_field(|field| field == "price")?);
        ji.skip()?;
        assert!(!ji.test_obj_field(|field| field == "price")?);
        ji.skip()?;
        assert!(!ji.test_obj_field(|_| true)?);
    });
    Ok(())
}

#[test]
fn test_empty_array() -> Result<()> {
    with_iterators!("[]", |ji| {
        assert!(!ji.read_array()?);
    });
    with_iterators!("null", |ji| {
        assert!(!ji.read_array()?);
    });
    Ok(())
}

#[test]
fn test_one_element() -> Result<()> {
    with_iterators!("[1]", |ji| {
        assert!(ji.read_array()?);
        assert_eq!(ji.read_i32()?, 1);
        assert!(!ji.read_array()?);
    });
    with_iterators!(" [ \"hello\" ] ", |ji| {
        assert!(ji.read_array()?);
        assert_eq!(ji.read_string()?.as_deref(), Some("hello"));
        assert!(!ji.read_array()?);
        assert!(ji.at_end()?);
    });
    Ok(())
}

#[test]
fn test_nested_arrays() -> Result<()> {
    with_iterators!("[[1, 2], [], [3]]", |ji| {
        let mut rows = Vec::new();
        while ji.read_array()? {
            let mut row = Vec::new();
            while ji.read_array()? {
                row.push(ji.read_i32()?);
            }
            rows.push(row);
        }
        assert_eq!(rows, vec![vec![1, 2], vec![], vec![3]]);
    });
    Ok(())
}

#[test]
fn test_explicit_array_tokens() -> Result<()> {
    with_iterators!("[1, 2]", |ji| {
        ji.open_array()?;
        assert_eq!(ji.read_i32()?, 1);
        ji.continue_array()?;
        assert_eq!(ji.read_i32()?, 2);
        ji.close_array()?;
    });
    with_iterators!(r#"{"a": 1}"#, |ji| {
        assert!(ji.skip_until("a")?);
        ji.skip()?;
        ji.close_obj()?;
        assert!(ji.at_end()?);
    });
    assert!(JsonIterator::from_slice("{").open_array().is_err());
    assert!(JsonIterator::from_slice("[").close_array().is_err());
    Ok(())
}

#[test]
fn test_array_of_objects() -> Result<()> {
    with_iterators!(r#"[{"id": 1}, {"id": 2, "tags": ["a", "b"]}]"#, |ji| {
        let mut ids = Vec::new();
        while ji.read_array()? {
            while let Some(field) = ji.read_object()? {
                if field == "id" {
                    ids.push(ji.read_i64()?);
                } else {
                    ji.skip()?;
                }
            }
        }
        assert_eq!(ids, vec![1, 2]);
    });
    Ok(())
}

#[test]
fn test_skip_every_kind_of_value() -> Result<()> {
    let json = r#"["str\"ing\\", -1.5e3, 0, true, false, null, [1, [2, "]"]], {"k": {"v": "{"}}, 42]"#;
    with_iterators!(json, |ji| {
        for _ in 0..8 {
            assert!(ji.read_array()?);
            ji.skip()?;
        }
        assert!(ji.read_array()?);
        assert_eq!(ji.read_i32()?, 42);
        assert!(!ji.read_array()?);
    });
    Ok(())
}

#[test]
fn test_skip_errors() {
    assert!(JsonIterator::from_slice(r#""unterminated"#).skip().is_err());
    assert!(JsonIterator::from_slice("[1, [2]").skip().is_err());
    assert!(JsonIterator::from_slice("}").skip().is_err());
    assert!(JsonIterator::from_slice("tru").skip().is_err());
    assert!(JsonIterator::from_slice("trux").skip().is_err());
}

#[test]
fn test_skip_container_only_balances_brackets() -> Result<()> {
    with_iterators!("[trux, {\"a\": nul}] 1", |ji| {
        ji.skip()?;
        assert_eq!(ji.read_i32()?, 1);
    });
    Ok(())
}

#[test]
fn test_read_null() -> Result<()> {
    with_iterators!("null", |ji| {
        assert!(ji.read_null()?);
    });
    with_iterators!("1", |ji| {
        assert!(!ji.read_null()?);
        assert_eq!(ji.read_i32()?, 1);
    });
    with_iterators!("[null, \"x\"]", |ji| {
        assert!(ji.read_array()?);
        assert_eq!(ji.read_string()?, None);
        assert!(ji.read_array()?);
        assert_eq!(ji.read_string()?.as_deref(), Some("x"));
    });
    Ok(())
}

#[test]
fn test_read_bool() -> Result<()> {
    with_iterators!("[true, false]", |ji| {
        assert!(ji.read_array()?);
        assert!(ji.read_bool()?);
        assert!(ji.read_array()?);
        assert!(!ji.read_bool()?);
    });
    assert!(JsonIterator::from_slice("trux").read_bool().is_err());
    assert!(JsonIterator::from_slice("1").read_bool().is_err());
    Ok(())
}

#[test]
fn test_what_is_next() -> Result<()> {
    with_iterators!(r#" [{"a": "b"}, 1, true, null, "s"]"#, |ji| {
        assert_eq!(ji.what_is_next()?, ValueType::Array);
        assert!(ji.read_array()?);
        assert_eq!(ji.what_is_next()?, ValueType::Object);
        ji.skip()?;
        assert!(ji.read_array()?);
        assert_eq!(ji.what_is_next()?, ValueType::Number);
        ji.skip()?;
        assert!(ji.read_array()?);
        assert_eq!(ji.what_is_next()?, ValueType::Boolean);
        ji.skip()?;
        assert!(ji.read_array()?);
        assert_eq!(ji.what_is_next()?, ValueType::Null);
        ji.skip()?;
        assert!(ji.read_array()?);
        assert_eq!(ji.what_is_next()?, ValueType::String);
    });
    Ok(())
}

#[test]
fn test_callbacks_on_strings() -> Result<()> {
    with_iterators!(r#"["abc", null, "xyz", "q"]"#, |ji| {
        assert!(ji.read_array()?);
        assert_eq!(ji.apply_chars(|chars| Ok(chars.len()))?, Some(3));
        assert!(ji.read_array()?);
        assert_eq!(ji.apply_chars(|_| -> jsoniter::Result<()> { panic!("null") })?, None);
        assert!(ji.read_array()?);
        assert!(ji.test_chars(|chars| chars.starts_with('x'))?);
        assert!(ji.read_array()?);
        let mut seen = String::new();
        ji.consume_chars(|chars| seen.push_str(chars))?;
        assert_eq!(seen, "q");
    });
    Ok(())
}

#[test]
fn test_newline_delimited_documents() -> Result<()> {
    with_iterators!("{\"n\": 1}\n{\"n\": 2}\n\n{\"n\": 3}\n", |ji| {
        let mut total = 0;
        while !ji.at_end()? {
            assert!(ji.skip_until("n")?);
            total += ji.read_i32()?;
            assert_eq!(ji.read_object()?, None);
        }
        assert_eq!(total, 6);
    });
    Ok(())
}

#[test]
fn test_read_value_matches_serde_json() -> Result<()> {
    let json = r#"{"a": [1, 2.5, "three", null, false], "b": {"c": {"d": -7}}, "e": "\u00e9"}"#;
    let expected: serde_json::Value = serde_json::from_str(json)?;
    with_iterators!(json, |ji| {
        assert_eq!(ji.read_value()?, expected);
    });
    Ok(())
}

#[test]
fn test_error_position_is_absolute_when_streaming() {
    let json = "[1, 2, 3, x]";
    let mut ji = JsonIterator::from_reader(std::io::Cursor::new(json.as_bytes().to_vec()), 4);
    for expected in 1..=3 {
        assert!(ji.read_array().unwrap());
        assert_eq!(ji.read_i32().unwrap(), expected);
    }
    assert!(ji.read_array().unwrap());
    match ji.read_i32() {
        Err(jsoniter::JsonError::Syntax { position, .. }) => assert_eq!(position, 11),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_read_value_rejects_deep_nesting() -> Result<()> {
    let deep = "[".repeat(20_000) + &"]".repeat(20_000);
    with_iterators!(&deep, |ji| {
        match ji.read_value() {
            Err(jsoniter::JsonError::Syntax { message, .. }) => {
                assert!(message.contains("nesting too deep"), "{}", message)
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    });

    let deep_objects = "{\"a\":".repeat(20_000) + "1" + &"}".repeat(20_000);
    assert!(JsonIterator::from_slice(&deep_objects).read_value().is_err());

    // skip 不組裝值，深度不受限制
    with_iterators!(&deep, |ji| {
        ji.skip()?;
        assert!(ji.at_end()?);
    });
    Ok(())
}

#[test]
fn test_read_value_within_nesting_limit() -> Result<()> {
    let json = "[".repeat(100) + "{\"k\": [1]}" + &"]".repeat(100);
    with_iterators!(&json, |ji| {
        let mut value = ji.read_value()?;
        for _ in 0..100 {
            value = value[0].take();
        }
        assert_eq!(value, serde_json::json!({"k": [1]}));
        assert!(ji.at_end()?);
    });
    Ok(())
}
