//! Built-in casters
//!
//! Every caster here returns values it would accept unchanged, so casting
//! a resolved value again is a no-op.

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use super::caster::{CastError, Caster};
use super::value::Value;

/// Text. Scalars are rendered, bytes must be UTF-8.
pub fn string() -> Caster {
    Caster::new("string", |v| match v {
        Value::String(s) => Ok(Value::String(s.clone())),
        Value::Int(n) => Ok(Value::String(n.to_string())),
        Value::Float(n) if n.is_finite() && n.fract() == 0.0 => {
            Ok(Value::String(format!("{:.1}", n)))
        }
        Value::Float(n) => Ok(Value::String(n.to_string())),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        Value::Bytes(b) => String::from_utf8(b.clone())
            .map(Value::String)
            .map_err(|_| CastError::Unparseable {
                expected: "utf-8 string",
                input: format!("{:?}", b),
            }),
        other => Err(CastError::invalid("string", other)),
    })
}

/// 64-bit integer. Floats truncate toward zero, strings are parsed.
pub fn integer() -> Caster {
    Caster::new("int", |v| match v {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Float(n) if n.is_finite() && n.abs() < i64::MAX as f64 => {
            Ok(Value::Int(n.trunc() as i64))
        }
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| CastError::Unparseable {
                expected: "int",
                input: s.clone(),
            }),
        other => Err(CastError::invalid("int", other)),
    })
}

/// 64-bit float. NaN and infinities are rejected.
pub fn float() -> Caster {
    Caster::new("float", |v| {
        let n = match v {
            Value::Float(n) => *n,
            Value::Int(n) => *n as f64,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::String(s) => s.trim().parse::<f64>().map_err(|_| CastError::Unparseable {
                expected: "float",
                input: s.clone(),
            })?,
            other => return Err(CastError::invalid("float", other)),
        };
        if !n.is_finite() {
            return Err(CastError::Unparseable {
                expected: "finite float",
                input: n.to_string(),
            });
        }
        Ok(Value::Float(n))
    })
}

/// Boolean. Numbers are true when non-zero; only explicit words parse.
pub fn boolean() -> Caster {
    Caster::new("bool", |v| match v {
        Value::Bool(b) => Ok(Value::Bool(*b)),
        Value::Int(n) => Ok(Value::Bool(*n != 0)),
        Value::Float(n) => Ok(Value::Bool(*n != 0.0)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(Value::Bool(true)),
            "false" | "no" | "0" => Ok(Value::Bool(false)),
            _ => Err(CastError::Unparseable {
                expected: "bool",
                input: s.clone(),
            }),
        },
        other => Err(CastError::invalid("bool", other)),
    })
}

/// Raw bytes. Strings encode as UTF-8; lists of octets are accepted so that
/// serialized bytes decode back.
pub fn bytes() -> Caster {
    Caster::new("bytes", |v| match v {
        Value::Bytes(b) => Ok(Value::Bytes(b.clone())),
        Value::String(s) => Ok(Value::Bytes(s.as_bytes().to_vec())),
        Value::List(items) => items
            .iter()
            .map(|item| {
                item.as_i64()
                    .and_then(|n| u8::try_from(n).ok())
                    .ok_or_else(|| CastError::invalid("octet", item))
            })
            .collect::<Result<Vec<u8>, _>>()
            .map(Value::Bytes),
        other => Err(CastError::invalid("bytes", other)),
    })
}

/// Accepts anything unchanged
pub fn any() -> Caster {
    Caster::new("any", |v| Ok(v.clone()))
}

/// List of `item`
pub fn list(item: Caster) -> Caster {
    Caster::list(item)
}

/// UUID, normalized to the lowercase hyphenated form
pub fn uuid() -> Caster {
    Caster::new("uuid", |v| match v {
        Value::String(s) => Uuid::parse_str(s.trim())
            .map(|id| Value::String(id.hyphenated().to_string()))
            .map_err(|_| CastError::Unparseable {
                expected: "uuid",
                input: s.clone(),
            }),
        Value::Bytes(b) => Uuid::from_slice(b)
            .map(|id| Value::String(id.hyphenated().to_string()))
            .map_err(|_| CastError::Unparseable {
                expected: "uuid",
                input: format!("{:?}", b),
            }),
        other => Err(CastError::invalid("uuid", other)),
    })
}

/// RFC 3339 timestamp, normalized to UTC. Integers are Unix seconds.
pub fn timestamp() -> Caster {
    Caster::new("timestamp", |v| {
        let parsed: DateTime<Utc> = match v {
            Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| CastError::Unparseable {
                    expected: "timestamp",
                    input: s.clone(),
                })?,
            Value::Int(secs) => {
                DateTime::from_timestamp(*secs, 0).ok_or_else(|| CastError::Unparseable {
                    expected: "timestamp",
                    input: secs.to_string(),
                })?
            }
            other => return Err(CastError::invalid("timestamp", other)),
        };
        Ok(Value::String(
            parsed.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        ))
    })
}

/// Looks up a built-in caster by its declaration name.
///
/// `list<T>` nests any other built-in name.
pub fn by_name(name: &str) -> Option<Caster> {
    let name = name.trim();
    if let Some(inner) = name.strip_prefix("list<").and_then(|s| s.strip_suffix('>')) {
        return by_name(inner).map(list);
    }
    match name {
        "string" | "str" => Some(string()),
        "int" | "integer" => Some(integer()),
        "float" => Some(float()),
        "bool" | "boolean" => Some(boolean()),
        "bytes" => Some(bytes()),
        "any" => Some(any()),
        "uuid" => Some(uuid()),
        "timestamp" => Some(timestamp()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::errors::ModelErrorCode;

    fn cast(caster: Caster, v: impl Into<Value>) -> Value {
        caster.cast(&v.into()).unwrap()
    }

    #[test]
    fn test_string_renders_scalars() {
        assert_eq!(cast(string(), 12), Value::from("12"));
        assert_eq!(cast(string(), "abc"), Value::from("abc"));
        assert_eq!(cast(string(), 2.0), Value::from("2.0"));
        assert_eq!(cast(string(), true), Value::from("true"));
        assert_eq!(cast(string(), b"hi".to_vec()), Value::from("hi"));
        assert!(string().cast(&Value::List(vec![])).is_err());
    }

    #[test]
    fn test_integer() {
        assert_eq!(cast(integer(), 12), Value::Int(12));
        assert_eq!(cast(integer(), " 42 "), Value::Int(42));
        assert_eq!(cast(integer(), 12.7), Value::Int(12));
        assert_eq!(cast(integer(), true), Value::Int(1));
        assert!(integer().cast(&Value::from("abc")).is_err());
        assert!(integer().cast(&Value::Float(f64::NAN)).is_err());
    }

    #[test]
    fn test_float() {
        assert_eq!(cast(float(), 3), Value::Float(3.0));
        assert_eq!(cast(float(), "1.5"), Value::Float(1.5));
        assert!(float().cast(&Value::from("x")).is_err());
    }

    #[test]
    fn test_float_rejects_non_finite() {
        for input in ["NaN", "inf", "-infinity"] {
            let err = float().cast(&Value::from(input)).unwrap_err();
            assert_eq!(err.code(), ModelErrorCode::ModelInvalidValue);
        }
        assert!(float().cast(&Value::Float(f64::NAN)).is_err());
        assert!(float().cast(&Value::Float(f64::INFINITY)).is_err());
    }

    #[test]
    fn test_boolean() {
        assert_eq!(cast(boolean(), "yes"), Value::Bool(true));
        assert_eq!(cast(boolean(), "False"), Value::Bool(false));
        assert_eq!(cast(boolean(), 0), Value::Bool(false));
        assert!(boolean().cast(&Value::from("maybe")).is_err());
    }

    #[test]
    fn test_bytes_accepts_octet_lists() {
        assert_eq!(cast(bytes(), "ab"), Value::Bytes(b"ab".to_vec()));
        assert_eq!(
            cast(bytes(), vec![Value::Int(97), Value::Int(98)]),
            Value::Bytes(b"ab".to_vec())
        );
        assert!(bytes().cast(&Value::List(vec![Value::Int(300)])).is_err());
    }

    #[test]
    fn test_uuid_normalizes() {
        let v = cast(uuid(), "67E55044-10B1-426F-9247-BB680E5FE0C8");
        assert_eq!(v, Value::from("67e55044-10b1-426f-9247-bb680e5fe0c8"));
        assert_eq!(cast(uuid(), v.clone()), v);
        assert!(uuid().cast(&Value::from("nope")).is_err());
    }

    #[test]
    fn test_timestamp_normalizes_to_utc() {
        let v = cast(timestamp(), "2024-03-01T12:00:00+02:00");
        assert_eq!(v, Value::from("2024-03-01T10:00:00Z"));
        assert_eq!(cast(timestamp(), v.clone()), v);
        assert_eq!(cast(timestamp(), 0), Value::from("1970-01-01T00:00:00Z"));
    }

    #[test]
    fn test_casters_are_idempotent_on_output() {
        for caster in [string(), integer(), float(), boolean(), bytes(), any()] {
            let once = caster.cast(&Value::from("1")).unwrap();
            assert_eq!(caster.cast(&once).unwrap(), once, "caster {}", caster.name());
        }
    }

    #[test]
    fn test_by_name() {
        assert_eq!(by_name("string").unwrap().name(), "string");
        assert_eq!(by_name("list<int>").unwrap().name(), "list<int>");
        assert_eq!(by_name("list<list<bool>>").unwrap().name(), "list<list<bool>>");
        assert!(by_name("decimal").is_none());
    }
}
