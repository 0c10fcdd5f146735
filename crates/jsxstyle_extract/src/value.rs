use indexmap::IndexMap;

/// A value known at build time.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Str(String),
  Num(f64),
  Bool(bool),
  Null,
  Object(IndexMap<String, Value>),
  Array(Vec<Value>),
}

impl Value {
  pub fn is_scalar(&self) -> bool {
    !matches!(self, Value::Object(_) | Value::Array(_))
  }

  pub fn is_null(&self) -> bool {
    matches!(self, Value::Null)
  }

  /// JavaScript truthiness. Objects and arrays are always truthy.
  pub fn is_truthy(&self) -> bool {
    match self {
      Value::Str(value) => !value.is_empty(),
      Value::Num(value) => *value != 0.0 && !value.is_nan(),
      Value::Bool(value) => *value,
      Value::Null => false,
      Value::Object(_) | Value::Array(_) => true,
    }
  }

  /// String conversion of scalar values, the way `String(value)` would print them.
  pub fn to_js_string(&self) -> Option<String> {
    match self {
      Value::Str(value) => Some(value.clone()),
      Value::Num(value) => Some(format_number(*value)),
      Value::Bool(value) => Some(value.to_string()),
      Value::Null => Some("null".to_string()),
      Value::Object(_) | Value::Array(_) => None,
    }
  }

  /// Property access into objects and arrays.
  pub fn get(&self, key: &str) -> Option<&Value> {
    match self {
      Value::Object(map) => map.get(key),
      Value::Array(items) => key.parse::<usize>().ok().and_then(|index| items.get(index)),
      _ => None,
    }
  }

  /// Strict equality for scalars. Objects and arrays never compare equal since identity is
  /// unknown at build time.
  pub fn strict_eq(&self, other: &Value) -> Option<bool> {
    match (self, other) {
      (Value::Str(a), Value::Str(b)) => Some(a == b),
      (Value::Num(a), Value::Num(b)) => Some(a == b),
      (Value::Bool(a), Value::Bool(b)) => Some(a == b),
      (Value::Null, Value::Null) => Some(true),
      (a, b) if a.is_scalar() && b.is_scalar() => Some(false),
      _ => None,
    }
  }
}

impl From<&serde_json::Value> for Value {
  fn from(value: &serde_json::Value) -> Self {
    match value {
      serde_json::Value::Null => Value::Null,
      serde_json::Value::Bool(value) => Value::Bool(*value),
      serde_json::Value::Number(value) => value.as_f64().map(Value::Num).unwrap_or(Value::Null),
      serde_json::Value::String(value) => Value::Str(value.clone()),
      serde_json::Value::Array(items) => Value::Array(items.iter().map(Value::from).collect()),
      serde_json::Value::Object(map) => Value::Object(
        map
          .iter()
          .map(|(key, value)| (key.clone(), Value::from(value)))
          .collect(),
      ),
    }
  }
}

/// Format a number the way JavaScript's `Number.prototype.toString` does for the values that
/// show up in style props.
pub fn format_number(value: f64) -> String {
  if value.is_nan() {
    return "NaN".to_string();
  }
  if value.is_infinite() {
    return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
  }
  if value == 0.0 {
    return "0".to_string();
  }
  let magnitude = value.abs();
  if !(1e-6..1e21).contains(&magnitude) {
    let formatted = format!("{:e}", value);
    return match formatted.split_once('e') {
      Some((mantissa, exponent)) if !exponent.starts_with('-') => {
        format!("{mantissa}e+{exponent}")
      }
      _ => formatted,
    };
  }
  if value.fract() == 0.0 {
    return format!("{:.0}", value);
  }
  format!("{}", value)
}
