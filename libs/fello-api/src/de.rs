//! Lenient field deserializers for backend JSON.
//!
//! Backend отдаёт слабо типизированный JSON: id бывает числом или строкой,
//! age: числом или строкой, массивы: `null`. Каждая функция здесь
//! тотальна по входу: любое JSON значение превращается в значение поля
//! (в худшем случае: default), поэтому разбор записи не падает из-за
//! одного кривого поля.
//!
//! Использование: `#[serde(default, deserialize_with = "de::opt_string")]`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Число или числовая строка → i64. Остальное → 0.
pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    })
}

pub fn opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(number_of(&v).filter(|n| n.is_finite()).map(|n| n as i64))
}

/// Возраст: число или числовая строка. Дробная часть отбрасывается,
/// отрицательные и нечисловые значения → None.
pub fn age<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(number_of(&v)
        .filter(|n| n.is_finite() && *n >= 0.0 && *n <= u32::MAX as f64)
        .map(|n| n.trunc() as u32))
}

/// Строка; числа и bool стрингифицируются, null/объекты → None.
pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(string_of(&v))
}

/// Как [`opt_string`], но с пустой строкой вместо None.
pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(string_of(&v).unwrap_or_default())
}

/// Число или числовая строка → f64.
pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(number_of(&v).filter(|n| n.is_finite()))
}

pub fn f64_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(opt_f64(d)?.unwrap_or_default())
}

pub fn opt_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(bool_of(&v))
}

/// bool; null/absent/непонятное → false.
pub fn bool_or_false<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(opt_bool(d)?.unwrap_or(false))
}

/// Массив тегов. `null` → `[]`, одиночная строка → `[s]`,
/// нестроковые и пустые элементы отбрасываются.
pub fn tags<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(match v {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    })
}

/// Массив вложенных объектов: элементы, которые не разбираются, пропускаются.
pub fn lenient_vec<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let v = Value::deserialize(d)?;
    Ok(match v {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| T::deserialize(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Опциональный вложенный объект: неразбираемое → None.
pub fn lenient_opt<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let v = Value::deserialize(d)?;
    if v.is_null() {
        return Ok(None);
    }
    Ok(T::deserialize(&v).ok())
}

// ════════════════════════════════════════════════════════════════
//  Value helpers
// ════════════════════════════════════════════════════════════════

fn number_of(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn string_of(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn bool_of(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "id")]
        id: i64,
        #[serde(default, deserialize_with = "age")]
        age: Option<u32>,
        #[serde(default, deserialize_with = "tags")]
        tags: Vec<String>,
        #[serde(default, deserialize_with = "opt_string")]
        status: Option<String>,
        #[serde(default, deserialize_with = "bool_or_false")]
        flag: bool,
    }

    fn probe(v: serde_json::Value) -> Probe {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn age_accepts_number_and_numeric_string() {
        assert_eq!(probe(json!({"age": 25})).age, Some(25));
        assert_eq!(probe(json!({"age": "42"})).age, Some(42));
        assert_eq!(probe(json!({"age": " 33.9 "})).age, Some(33));
    }

    #[test]
    fn age_rejects_garbage_without_failing() {
        assert_eq!(probe(json!({"age": "unknown"})).age, None);
        assert_eq!(probe(json!({"age": -4})).age, None);
        assert_eq!(probe(json!({"age": {"years": 3}})).age, None);
        assert_eq!(probe(json!({})).age, None);
    }

    #[test]
    fn tags_default_to_empty() {
        assert!(probe(json!({})).tags.is_empty());
        assert!(probe(json!({"tags": null})).tags.is_empty());
        assert_eq!(
            probe(json!({"tags": ["parenting", 7, "", "drug_use"]})).tags,
            vec!["parenting", "drug_use"]
        );
        assert_eq!(probe(json!({"tags": "parenting"})).tags, vec!["parenting"]);
    }

    #[test]
    fn scalars_are_coerced() {
        let p = probe(json!({"id": "17", "status": 3, "flag": "yes"}));
        assert_eq!(p.id, 17);
        assert_eq!(p.status.as_deref(), Some("3"));
        assert!(p.flag);

        let p = probe(json!({"id": null, "status": null, "flag": null}));
        assert_eq!(p.id, 0);
        assert_eq!(p.status, None);
        assert!(!p.flag);
    }
}
