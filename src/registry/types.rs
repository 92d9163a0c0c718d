use crate::errors::CastError;
use crate::utils::prompt::Prompter;
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Str,
    Int,
    Float,
}

impl Primitive {
    fn name(self) -> &'static str {
        match self {
            Primitive::Str => "str",
            Primitive::Int => "int",
            Primitive::Float => "float",
        }
    }
}

/// Caster attached to a declared argument or return value. `Unconstrained`
/// is the absence of a declaration: identity cast, hidden in help text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Unconstrained,
    Primitive(Primitive),
    Boolean,
    Secret,
    DateTime,
    Date,
    Time,
}

impl Default for ValueType {
    fn default() -> Self {
        ValueType::Unconstrained
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Unconstrained => "",
            ValueType::Primitive(primitive) => primitive.name(),
            ValueType::Boolean => "bool",
            ValueType::Secret => "secret",
            ValueType::DateTime => "datetime",
            ValueType::Date => "date",
            ValueType::Time => "time",
        };
        write!(f, "{}", name)
    }
}

impl ValueType {
    /// Maps a declared type tag to a caster. A missing or empty tag means
    /// unconstrained; an unknown tag is rejected so typos in request
    /// definitions fail at load time instead of at cast time.
    pub fn from_tag(tag: Option<&str>) -> Result<Self, CastError> {
        let Some(tag) = tag else {
            return Ok(ValueType::Unconstrained);
        };
        match tag.trim().to_lowercase().as_str() {
            "" => Ok(ValueType::Unconstrained),
            "str" | "string" => Ok(ValueType::Primitive(Primitive::Str)),
            "int" => Ok(ValueType::Primitive(Primitive::Int)),
            "float" => Ok(ValueType::Primitive(Primitive::Float)),
            "bool" => Ok(ValueType::Boolean),
            "secret" => Ok(ValueType::Secret),
            "datetime" => Ok(ValueType::DateTime),
            "date" => Ok(ValueType::Date),
            "time" => Ok(ValueType::Time),
            other => Err(CastError::UnsupportedTag(other.to_string())),
        }
    }

    /// True when the type constrains values; governs whether the type name
    /// is shown next to an argument in help text.
    pub fn is_constrained(&self) -> bool {
        !matches!(self, ValueType::Unconstrained)
    }

    /// Converts a raw value into this type. Null always casts to Null.
    /// Incompatible values are an error, never a silent coercion.
    pub fn cast(&self, value: &Value) -> Result<Value, CastError> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match self {
            ValueType::Unconstrained => Ok(value.clone()),
            ValueType::Primitive(Primitive::Str) | ValueType::Secret => {
                Ok(Value::String(stringify(value)))
            }
            ValueType::Primitive(Primitive::Int) => cast_int(value),
            ValueType::Primitive(Primitive::Float) => cast_float(value),
            ValueType::Boolean => Ok(Value::Bool(truthy(value))),
            ValueType::DateTime => {
                let parsed = cast_temporal(value, "datetime")?;
                Ok(Value::String(render_datetime(&parsed)))
            }
            ValueType::Date => {
                let parsed = cast_temporal(value, "date")?;
                Ok(Value::String(render_date(&parsed.date())))
            }
            ValueType::Time => {
                let parsed = cast_temporal(value, "time")?;
                Ok(Value::String(render_time(&parsed.time())))
            }
        }
    }

    /// Human display form of a value under this type. Falls back to the raw
    /// form when the cast fails, except for temporal types whose parse
    /// failure must surface.
    pub fn repr_value(&self, value: &Value) -> Result<String, CastError> {
        match self {
            ValueType::DateTime | ValueType::Date | ValueType::Time => {
                let cast = self.cast(value)?;
                let canonical = stringify(&cast);
                let original = stringify(value);
                if original == canonical {
                    Ok(canonical)
                } else {
                    Ok(format!("{} ({})", original, canonical))
                }
            }
            ValueType::Secret => {
                let rendered = match self.cast(value) {
                    Ok(cast) => stringify(&cast),
                    Err(_) => stringify(value),
                };
                Ok(mask_secret(&rendered))
            }
            _ => match self.cast(value) {
                Ok(cast) => Ok(stringify(&cast)),
                Err(_) => Ok(stringify(value)),
            },
        }
    }

    /// Reads one raw line for this type. Secrets go through the non-echoing
    /// channel so they never land in terminal scrollback.
    pub fn read_input(
        &self,
        prompter: &dyn Prompter,
        label: &str,
    ) -> std::io::Result<String> {
        match self {
            ValueType::Secret => prompter.read_secret(label),
            _ => prompter.read_line(label),
        }
    }
}

/// Scalar rendering shared by casts and display; compound values render as
/// compact JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(num) => num.to_string(),
        Value::String(text) => text.clone(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

fn cast_int(value: &Value) -> Result<Value, CastError> {
    match value {
        Value::Bool(flag) => Ok(Value::from(*flag as i64)),
        Value::Number(num) => {
            if let Some(int) = num.as_i64() {
                return Ok(Value::from(int));
            }
            // Float input truncates; float-looking strings do not (below).
            num.as_f64()
                .map(|float| Value::from(float as i64))
                .ok_or_else(|| CastError::incompatible(num, "int"))
        }
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| CastError::incompatible(text, "int")),
        other => Err(CastError::incompatible(stringify(other), "int")),
    }
}

fn cast_float(value: &Value) -> Result<Value, CastError> {
    let float = match value {
        Value::Bool(flag) => *flag as i64 as f64,
        Value::Number(num) => num
            .as_f64()
            .ok_or_else(|| CastError::incompatible(num, "float"))?,
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| CastError::incompatible(text, "float"))?,
        other => return Err(CastError::incompatible(stringify(other), "float")),
    };
    serde_json::Number::from_f64(float)
        .map(Value::Number)
        .ok_or_else(|| CastError::incompatible(stringify(value), "float"))
}

/// Permissive truthiness: a closed falsy set, everything else true. The
/// string "0.0" and empty compounds are truthy; only the listed markers
/// (case-insensitive for strings) count as false.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(num) => num.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(text) => !matches!(
            text.to_lowercase().as_str(),
            "0" | "f" | "false" | "n" | "no"
        ),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 5 {
        return "*".repeat(chars.len());
    }
    format!(
        "{}{}{}",
        chars[0],
        "*".repeat(chars.len() - 2),
        chars[chars.len() - 1]
    )
}

fn cast_temporal(value: &Value, target: &str) -> Result<NaiveDateTime, CastError> {
    let Value::String(text) = value else {
        return Err(CastError::incompatible(stringify(value), target));
    };
    parse_temporal_with(text, Local::now().naive_local())
        .ok_or_else(|| CastError::incompatible(text, target))
}

static RELATIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:in\s+(\d+)\s+(second|minute|hour|day|week)s?|(\d+)\s+(second|minute|hour|day|week)s?\s+ago)$")
        .expect("relative time pattern must compile")
});

/// Parses ISO timestamps plus a small natural-language vocabulary. Missing
/// date or time components are back-filled from `now`.
pub fn parse_temporal_with(input: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_lowercase();
    match lower.as_str() {
        "now" | "today" => return Some(now),
        "yesterday" => return Some(now - Duration::days(1)),
        "tomorrow" => return Some(now + Duration::days(1)),
        "midnight" => return Some(NaiveDateTime::new(now.date(), NaiveTime::MIN)),
        "noon" => {
            let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN);
            return Some(NaiveDateTime::new(now.date(), noon));
        }
        _ => {}
    }

    if let Some(caps) = RELATIVE_RE.captures(&lower) {
        let (amount, unit, forward) = if caps.get(1).is_some() {
            (caps.get(1), caps.get(2), true)
        } else {
            (caps.get(3), caps.get(4), false)
        };
        let amount: i64 = amount?.as_str().parse().ok()?;
        let delta = match unit?.as_str() {
            "second" => Duration::seconds(amount),
            "minute" => Duration::minutes(amount),
            "hour" => Duration::hours(amount),
            "day" => Duration::days(amount),
            "week" => Duration::weeks(amount),
            _ => return None,
        };
        return Some(if forward { now + delta } else { now - delta });
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.naive_local());
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(parsed);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(NaiveDateTime::new(date, now.time()));
    }
    for format in ["%H:%M:%S%.f", "%H:%M"] {
        if let Ok(time) = NaiveTime::parse_from_str(trimmed, format) {
            return Some(NaiveDateTime::new(now.date(), time));
        }
    }
    None
}

fn render_datetime(value: &NaiveDateTime) -> String {
    if value.nanosecond() == 0 {
        value.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        value.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
    }
}

fn render_date(value: &NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

fn render_time(value: &NaiveTime) -> String {
    if value.nanosecond() == 0 {
        value.format("%H:%M:%S").to_string()
    } else {
        value.format("%H:%M:%S%.6f").to_string()
    }
}
