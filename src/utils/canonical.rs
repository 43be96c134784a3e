//! Deterministic JSON rendering of serializable values.
//!
//! The output is the byte string signers and verifiers agree on: object keys
//! sorted by UTF-16 code units, arrays in their original order, no
//! insignificant whitespace, and numbers laid out the way ECMAScript's
//! `JSON.stringify` lays them out.

use serde::Serialize;
use serde_json::{Number, Value};

use super::errors::Error;

/// Renders `value` as a canonical JSON string.
pub fn to_canonical_string<T: Serialize + ?Sized>(value: &T) -> Result<String, Error> {
    let value = serde_json::to_value(value)?;
    let mut out = String::new();
    write_value(&mut out, &value)?;
    Ok(out)
}

/// Renders `value` as canonical JSON encoded as UTF-8.
pub fn to_canonical_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, Error> {
    to_canonical_string(value).map(String::into_bytes)
}

fn write_value(out: &mut String, value: &Value) -> Result<(), Error> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => write_number(out, n),
        Value::String(s) => write_string(out, s)?,
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item)?;
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.encode_utf16().cmp(b.encode_utf16()));

            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(out, key)?;
                out.push(':');
                write_value(out, item)?;
            }
            out.push('}');
        }
    }
    Ok(())
}

fn write_string(out: &mut String, s: &str) -> Result<(), Error> {
    // serde_json escapes exactly the set JSON.stringify does for valid UTF-8
    out.push_str(&serde_json::to_string(s)?);
    Ok(())
}

fn write_number(out: &mut String, n: &Number) {
    if let Some(i) = n.as_i64() {
        out.push_str(&i.to_string());
    } else if let Some(u) = n.as_u64() {
        out.push_str(&u.to_string());
    } else if let Some(f) = n.as_f64() {
        out.push_str(&format_f64(f));
    } else {
        out.push_str(&n.to_string());
    }
}

/// Formats a finite float using the ECMAScript Number::toString layout.
fn format_f64(f: f64) -> String {
    if f == 0.0 {
        return "0".to_string();
    }

    let sign = if f < 0.0 { "-" } else { "" };
    // `{:e}` yields the shortest round-trip digits, e.g. "1.2345e-7"
    let sci = format!("{:e}", f.abs());
    let (mantissa, exponent) = match sci.split_once('e') {
        Some(parts) => parts,
        None => return format!("{f}"),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exponent: i32 = match exponent.parse() {
        Ok(e) => e,
        Err(_) => return format!("{f}"),
    };

    let k = digits.len() as i32;
    let n = exponent + 1;

    let body = if k <= n && n <= 21 {
        format!("{digits}{}", "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{int}.{frac}")
    } else if -6 < n && n <= 0 {
        format!("0.{}{digits}", "0".repeat((-n) as usize))
    } else {
        let e = n - 1;
        let e_sign = if e < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{first}e{e_sign}{}", e.abs())
        } else {
            format!("{first}.{rest}e{e_sign}{}", e.abs())
        }
    };

    format!("{sign}{body}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::{BTreeMap, HashMap};

    #[derive(Serialize)]
    struct Ordered {
        b: u32,
        a: u32,
    }

    #[test]
    fn test_keys_sorted_regardless_of_insertion_order() {
        let mut first = HashMap::new();
        first.insert("zeta", 1);
        first.insert("alpha", 2);
        first.insert("mid", 3);

        let mut second = HashMap::new();
        second.insert("mid", 3);
        second.insert("alpha", 2);
        second.insert("zeta", 1);

        let a = to_canonical_bytes(&first).unwrap();
        let b = to_canonical_bytes(&second).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, br#"{"alpha":2,"mid":3,"zeta":1}"#);
    }

    #[test]
    fn test_struct_field_order_is_ignored() {
        let canonical = to_canonical_string(&Ordered { b: 2, a: 1 }).unwrap();
        assert_eq!(canonical, r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn test_nested_objects_are_sorted() {
        let value = json!({
            "outer": { "y": [ { "d": 1, "c": 2 } ], "x": null },
            "alpha": true
        });
        assert_eq!(
            to_canonical_string(&value).unwrap(),
            r#"{"alpha":true,"outer":{"x":null,"y":[{"c":2,"d":1}]}}"#
        );
    }

    #[test]
    fn test_array_order_is_significant() {
        let a = to_canonical_bytes(&json!({ "items": [1, 2, 3] })).unwrap();
        let b = to_canonical_bytes(&json!({ "items": [3, 2, 1] })).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_keys_compare_by_utf16_code_units() {
        // U+FF61 sorts after U+1F600 in UTF-16 but before it in UTF-8
        let mut map = BTreeMap::new();
        map.insert("\u{1F600}", 1);
        map.insert("\u{FF61}", 2);
        assert_eq!(
            to_canonical_string(&map).unwrap(),
            "{\"\u{1F600}\":1,\"\u{FF61}\":2}"
        );
    }

    #[test]
    fn test_uppercase_sorts_before_lowercase() {
        let value = json!({ "b": 1, "B": 2, "a": 3, "_": 4 });
        assert_eq!(
            to_canonical_string(&value).unwrap(),
            r#"{"B":2,"_":4,"a":3,"b":1}"#
        );
    }

    #[test]
    fn test_string_escaping() {
        let value = json!({ "s": "quote\" slash\\ nl\n tab\t bell\u{7} é /" });
        assert_eq!(
            to_canonical_string(&value).unwrap(),
            "{\"s\":\"quote\\\" slash\\\\ nl\\n tab\\t bell\\u0007 é /\"}"
        );
    }

    #[test]
    fn test_number_layout() {
        let cases = [
            (json!(1), "1"),
            (json!(-42), "-42"),
            (json!(u64::MAX), "18446744073709551615"),
            (json!(1.5), "1.5"),
            (json!(100.0), "100"),
            (json!(-0.0), "0"),
            (json!(0.1), "0.1"),
            (json!(123.456), "123.456"),
            (json!(0.000001), "0.000001"),
            (json!(1e-7), "1e-7"),
            (json!(1.25e-10), "1.25e-10"),
            (json!(1e21), "1e+21"),
            (json!(1.5e22), "1.5e+22"),
            (json!(1e20), "100000000000000000000"),
            (json!(-2.5e-8), "-2.5e-8"),
        ];
        for (value, expected) in cases {
            assert_eq!(to_canonical_string(&value).unwrap(), expected, "{value:?}");
        }
    }

    #[test]
    fn test_non_finite_floats_become_null() {
        assert_eq!(to_canonical_string(&f64::NAN).unwrap(), "null");
        assert_eq!(to_canonical_string(&[f64::INFINITY]).unwrap(), "[null]");
    }

    #[test]
    fn test_non_string_map_keys_fail() {
        let mut map = HashMap::new();
        map.insert(vec![1u8], 1);
        assert!(matches!(
            to_canonical_bytes(&map),
            Err(Error::Canonicalization(_))
        ));
    }

    #[test]
    fn test_empty_containers() {
        assert_eq!(
            to_canonical_string(&json!({ "a": [], "b": {} })).unwrap(),
            r#"{"a":[],"b":{}}"#
        );
    }
}
