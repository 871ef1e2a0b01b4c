// Argument deserializer: untyped input values -> ordered, typed call arguments

use crate::error::{ErrItem, Errors};
use crate::request::Request;
use crate::routes::{EnumDef, Param, ParamKind};
use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};

/// Produces the exact argument vector a target expects, in declared order.
///
/// Inputs may arrive as text ( CLI flags, query strings ) or as already
/// structured JSON ( request bodies ); coercion is deterministic per
/// declared kind, with textual parsing for the former and pass-through for
/// the latter. Every uncoercible value yields a field-level error; all
/// failures are collected so the caller sees every problem at once.
pub fn deserialize(params: &[Param], req: &Request) -> Result<Vec<Value>, Errors> {
    let mut args = Vec::with_capacity(params.len());
    let mut errors = Vec::new();

    for param in params {
        let supplied = req.input(&param.name).cloned();
        let raw = match supplied {
            Some(value) => value,
            None => match &param.default {
                // Special case, preserved from the original behavior: a
                // single-parameter method called with zero inputs falls back
                // to the type's neutral value, not the declared default.
                Some(_) if params.len() == 1 && req.data.is_empty() => neutral(&param.kind),
                Some(default) => default.clone(),
                // Presence of required params was checked by the params rule;
                // an absent value here still fails cleanly.
                None => {
                    errors.push(ErrItem::on(&param.name, "", "Missing"));
                    continue;
                }
            },
        };
        match coerce(&raw, &param.kind, &param.name) {
            Ok(value) => args.push(value),
            Err(item) => errors.push(item),
        }
    }

    if errors.is_empty() {
        Ok(args)
    } else {
        Err(Errors::list(errors, "Invalid request"))
    }
}

/// Type-appropriate neutral value used by the single-defaulted-param case.
pub fn neutral(kind: &ParamKind) -> Value {
    match kind {
        ParamKind::Text => Value::String(String::new()),
        ParamKind::Bool => Value::Bool(false),
        ParamKind::Int => Value::Number(Number::from(0)),
        ParamKind::Decimal => json_f64(0.0),
        ParamKind::Date => Value::String(Utc::now().date_naive().to_string()),
        ParamKind::Time => Value::String("00:00:00".to_string()),
        ParamKind::DateTime => Value::String(format_datetime(&Utc::now())),
        ParamKind::List(_) => Value::Array(Vec::new()),
        ParamKind::Map(_, _) => Value::Object(Map::new()),
        ParamKind::Enum(def) => def
            .members
            .first()
            .map(|m| Value::String(m.clone()))
            .unwrap_or(Value::Null),
        ParamKind::Any => Value::Null,
    }
}

fn coerce(raw: &Value, kind: &ParamKind, name: &str) -> Result<Value, ErrItem> {
    match kind {
        ParamKind::Text => Ok(Value::String(to_text(raw))),
        ParamKind::Bool => coerce_bool(raw, name),
        ParamKind::Int => coerce_int(raw, name),
        ParamKind::Decimal => coerce_decimal(raw, name),
        ParamKind::Date => coerce_temporal(raw, name, "date", parse_date),
        ParamKind::Time => coerce_temporal(raw, name, "time", parse_time),
        ParamKind::DateTime => coerce_temporal(raw, name, "datetime", parse_datetime),
        ParamKind::List(inner) => coerce_list(raw, inner, name),
        ParamKind::Map(key, value) => coerce_map(raw, key, value, name),
        ParamKind::Enum(def) => coerce_enum(raw, def, name),
        ParamKind::Any => Ok(raw.clone()),
    }
}

/// Text never fails: nulls and the "null" literal become the empty string.
fn to_text(raw: &Value) -> String {
    match raw {
        Value::Null => String::new(),
        Value::String(s) if s.eq_ignore_ascii_case("null") => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn coerce_bool(raw: &Value, name: &str) -> Result<Value, ErrItem> {
    match raw {
        Value::Bool(_) => Ok(raw.clone()),
        Value::String(s) => s
            .trim()
            .parse::<bool>()
            .map(Value::Bool)
            .map_err(|_| bad(name, raw, "expected a bool")),
        _ => Err(bad(name, raw, "expected a bool")),
    }
}

fn coerce_int(raw: &Value, name: &str) -> Result<Value, ErrItem> {
    match raw {
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(raw.clone()),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(|v| Value::Number(Number::from(v)))
            .map_err(|_| bad(name, raw, "expected an integer")),
        _ => Err(bad(name, raw, "expected an integer")),
    }
}

fn coerce_decimal(raw: &Value, name: &str) -> Result<Value, ErrItem> {
    match raw {
        Value::Number(_) => Ok(raw.clone()),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(json_f64)
            .map_err(|_| bad(name, raw, "expected a decimal")),
        _ => Err(bad(name, raw, "expected a decimal")),
    }
}

fn coerce_temporal(
    raw: &Value,
    name: &str,
    label: &str,
    parse: fn(&str) -> Option<String>,
) -> Result<Value, ErrItem> {
    match raw {
        Value::String(s) => parse(s.trim())
            .map(Value::String)
            .ok_or_else(|| bad(name, raw, &format!("expected a {label}"))),
        _ => Err(bad(name, raw, &format!("expected a {label}"))),
    }
}

fn coerce_list(raw: &Value, inner: &ParamKind, name: &str) -> Result<Value, ErrItem> {
    match raw {
        Value::Array(items) => {
            let coerced: Result<Vec<Value>, ErrItem> =
                items.iter().map(|item| coerce(item, inner, name)).collect();
            Ok(Value::Array(coerced?))
        }
        Value::Null => Ok(Value::Array(Vec::new())),
        Value::String(s) => {
            let text = s.trim();
            if text.is_empty() || text.eq_ignore_ascii_case("null") {
                return Ok(Value::Array(Vec::new()));
            }
            let coerced: Result<Vec<Value>, ErrItem> = text
                .split(',')
                .map(|token| coerce(&Value::String(token.trim().to_string()), inner, name))
                .collect();
            Ok(Value::Array(coerced?))
        }
        _ => Err(bad(name, raw, "expected a list")),
    }
}

fn coerce_map(raw: &Value, key: &ParamKind, value: &ParamKind, name: &str) -> Result<Value, ErrItem> {
    match raw {
        Value::Object(entries) => {
            let mut out = Map::new();
            for (k, v) in entries {
                let key = map_key(&Value::String(k.clone()), key, name)?;
                out.insert(key, coerce(v, value, name)?);
            }
            Ok(Value::Object(out))
        }
        Value::Null => Ok(Value::Object(Map::new())),
        Value::String(s) => {
            let text = s.trim();
            if text.is_empty() || text.eq_ignore_ascii_case("null") {
                return Ok(Value::Object(Map::new()));
            }
            let mut out = Map::new();
            for pair in text.split(',') {
                let (k, v) = pair
                    .split_once('=')
                    .ok_or_else(|| bad(name, raw, "expected key=value pairs"))?;
                let key = map_key(&Value::String(k.trim().to_string()), key, name)?;
                let value = coerce(&Value::String(v.trim().to_string()), value, name)?;
                out.insert(key, value);
            }
            Ok(Value::Object(out))
        }
        _ => Err(bad(name, raw, "expected a map")),
    }
}

/// JSON object keys are strings; the declared key kind still validates them.
fn map_key(raw: &Value, kind: &ParamKind, name: &str) -> Result<String, ErrItem> {
    let coerced = coerce(raw, kind, name)?;
    Ok(to_text(&coerced))
}

/// Enumerations resolve by ordinal, or by case-sensitive member name.
fn coerce_enum(raw: &Value, def: &EnumDef, name: &str) -> Result<Value, ErrItem> {
    match raw {
        Value::Number(n) => {
            let ordinal = n.as_u64().unwrap_or(u64::MAX) as usize;
            def.members
                .get(ordinal)
                .map(|m| Value::String(m.clone()))
                .ok_or_else(|| {
                    bad(name, raw, &format!("no member of {} at that ordinal", def.name))
                })
        }
        Value::String(s) => {
            if def.members.iter().any(|m| m == s) {
                Ok(Value::String(s.clone()))
            } else if let Ok(ordinal) = s.trim().parse::<usize>() {
                def.members
                    .get(ordinal)
                    .map(|m| Value::String(m.clone()))
                    .ok_or_else(|| {
                        bad(name, raw, &format!("no member of {} at that ordinal", def.name))
                    })
            } else {
                Err(bad(name, raw, &format!("not a member of {}", def.name)))
            }
        }
        _ => Err(bad(name, raw, &format!("not a member of {}", def.name))),
    }
}

// Canonical date/time parsing shared by all date-like kinds.

fn parse_datetime(text: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| format_datetime(&dt.with_timezone(&Utc)))
}

fn parse_date(text: &str) -> Option<String> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .map(|d| d.to_string())
}

fn parse_time(text: &str) -> Option<String> {
    NaiveTime::parse_from_str(text, "%H:%M:%S")
        .ok()
        .map(|t| t.to_string())
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn json_f64(value: f64) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn bad(name: &str, raw: &Value, message: &str) -> ErrItem {
    let value = match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    ErrItem::on(name, &value, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn request(data: Vec<(&str, Value)>) -> Request {
        let data = data.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        Request::cli("app.users.activate", HashMap::new(), data)
    }

    #[test]
    fn test_scalars_parse_from_text() {
        let params = vec![
            Param::required("phone", ParamKind::Text),
            Param::required("code", ParamKind::Int),
            Param::required("active", ParamKind::Bool),
            Param::required("score", ParamKind::Decimal),
        ];
        let req = request(vec![
            ("phone", json!("123")),
            ("code", json!("5")),
            ("active", json!("true")),
            ("score", json!("1.5")),
        ]);
        let args = deserialize(&params, &req).unwrap();
        assert_eq!(args, vec![json!("123"), json!(5), json!(true), json!(1.5)]);
    }

    #[test]
    fn test_already_typed_values_pass_through() {
        let params = vec![
            Param::required("code", ParamKind::Int),
            Param::required("active", ParamKind::Bool),
        ];
        let req = request(vec![("code", json!(5)), ("active", json!(true))]);
        let args = deserialize(&params, &req).unwrap();
        assert_eq!(args, vec![json!(5), json!(true)]);
    }

    #[test]
    fn test_delimited_list_roundtrip() {
        let params = vec![Param::required("ids", ParamKind::List(Box::new(ParamKind::Int)))];
        let req = request(vec![("ids", json!("1,2,3,4"))]);
        let args = deserialize(&params, &req).unwrap();
        assert_eq!(args, vec![json!([1, 2, 3, 4])]);
    }

    #[test]
    fn test_null_literal_yields_empty_list() {
        let params = vec![Param::required("ids", ParamKind::List(Box::new(ParamKind::Int)))];
        let req = request(vec![("ids", json!("null"))]);
        let args = deserialize(&params, &req).unwrap();
        assert_eq!(args, vec![json!([])]);
    }

    #[test]
    fn test_structured_list_passes_through() {
        let params = vec![Param::required("ids", ParamKind::List(Box::new(ParamKind::Int)))];
        let req = request(vec![("ids", json!([1, 2, 3]))]);
        let args = deserialize(&params, &req).unwrap();
        assert_eq!(args, vec![json!([1, 2, 3])]);
    }

    #[test]
    fn test_delimited_map_roundtrip() {
        let params = vec![Param::required(
            "counts",
            ParamKind::Map(Box::new(ParamKind::Text), Box::new(ParamKind::Int)),
        )];
        let req = request(vec![("counts", json!("a=1,b=2"))]);
        let args = deserialize(&params, &req).unwrap();
        assert_eq!(args, vec![json!({"a": 1, "b": 2})]);
    }

    #[test]
    fn test_null_literal_yields_empty_map() {
        let params = vec![Param::required(
            "counts",
            ParamKind::Map(Box::new(ParamKind::Text), Box::new(ParamKind::Int)),
        )];
        let req = request(vec![("counts", json!("NULL"))]);
        let args = deserialize(&params, &req).unwrap();
        assert_eq!(args, vec![json!({})]);
    }

    #[test]
    fn test_enum_by_name_and_ordinal() {
        let def = EnumDef::new("Color", &["Red", "Green", "Blue"]);
        let params = vec![Param::required("color", ParamKind::Enum(def))];

        let by_name = request(vec![("color", json!("Green"))]);
        assert_eq!(deserialize(&params, &by_name).unwrap(), vec![json!("Green")]);

        let by_ordinal = request(vec![("color", json!(2))]);
        assert_eq!(deserialize(&params, &by_ordinal).unwrap(), vec![json!("Blue")]);
    }

    #[test]
    fn test_enum_name_is_case_sensitive() {
        let def = EnumDef::new("Color", &["Red", "Green", "Blue"]);
        let params = vec![Param::required("color", ParamKind::Enum(def))];
        let req = request(vec![("color", json!("green"))]);
        assert!(deserialize(&params, &req).is_err());
    }

    #[test]
    fn test_datetime_canonical_parse() {
        let params = vec![Param::required("at", ParamKind::DateTime)];
        let req = request(vec![("at", json!("2026-08-25T10:30:00Z"))]);
        let args = deserialize(&params, &req).unwrap();
        assert_eq!(args, vec![json!("2026-08-25T10:30:00Z")]);
    }

    #[test]
    fn test_date_parse() {
        let params = vec![Param::required("on", ParamKind::Date)];
        let req = request(vec![("on", json!("2026-08-25"))]);
        assert_eq!(deserialize(&params, &req).unwrap(), vec![json!("2026-08-25")]);
    }

    #[test]
    fn test_bad_value_reports_field_error() {
        let params = vec![Param::required("code", ParamKind::Int)];
        let req = request(vec![("code", json!("abc"))]);
        let errs = deserialize(&params, &req).unwrap_err();
        assert_eq!(errs.items.len(), 1);
        match &errs.items[0] {
            ErrItem::Field { field, value, .. } => {
                assert_eq!(field, "code");
                assert_eq!(value, "abc");
            }
            other => panic!("expected field error, got {other:?}"),
        }
    }

    #[test]
    fn test_all_bad_values_reported_at_once() {
        let params = vec![
            Param::required("code", ParamKind::Int),
            Param::required("active", ParamKind::Bool),
        ];
        let req = request(vec![("code", json!("abc")), ("active", json!("maybe"))]);
        let errs = deserialize(&params, &req).unwrap_err();
        assert_eq!(errs.items.len(), 2);
    }

    #[test]
    fn test_declared_default_applies_when_absent() {
        let params = vec![
            Param::required("phone", ParamKind::Text),
            Param::optional("note", ParamKind::Text, json!("none")),
        ];
        let req = request(vec![("phone", json!("123"))]);
        let args = deserialize(&params, &req).unwrap();
        assert_eq!(args, vec![json!("123"), json!("none")]);
    }

    #[test]
    fn test_single_defaulted_param_with_zero_inputs_gets_neutral_value() {
        let params = vec![Param::optional("note", ParamKind::Text, json!("declared"))];
        let req = request(vec![]);
        let args = deserialize(&params, &req).unwrap();
        // Neutral value, not the declared default.
        assert_eq!(args, vec![json!("")]);
    }

    #[test]
    fn test_text_null_literal_becomes_empty_string() {
        let params = vec![Param::required("phone", ParamKind::Text)];
        let req = request(vec![("phone", json!("null"))]);
        assert_eq!(deserialize(&params, &req).unwrap(), vec![json!("")]);
    }

    #[test]
    fn test_neutral_values() {
        assert_eq!(neutral(&ParamKind::Text), json!(""));
        assert_eq!(neutral(&ParamKind::Bool), json!(false));
        assert_eq!(neutral(&ParamKind::Int), json!(0));
        assert_eq!(neutral(&ParamKind::List(Box::new(ParamKind::Int))), json!([]));
    }
}
