// Data structures shared by the catalog client, the matching core and the API.
// Identifiers and amounts arrive as numbers or strings depending on the source
// (JSON body vs. query param), so they are normalised here, once, into `Lenient`.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::fmt;

/// Numeric types a `Lenient` value can carry.
pub trait Numeric: Copy + PartialEq + PartialOrd + fmt::Debug {
    fn from_number(number: &Number) -> Option<Self>;
    fn parse_text(text: &str) -> Option<Self>;
}

impl Numeric for i64 {
    fn from_number(number: &Number) -> Option<Self> {
        number.as_i64().or_else(|| {
            // 3.0 from a JS client is still brand 3
            number
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        })
    }

    fn parse_text(text: &str) -> Option<Self> {
        text.parse::<i64>().ok()
    }
}

impl Numeric for i32 {
    fn from_number(number: &Number) -> Option<Self> {
        i64::from_number(number).and_then(|v| i32::try_from(v).ok())
    }

    fn parse_text(text: &str) -> Option<Self> {
        text.parse::<i32>().ok()
    }
}

impl Numeric for f64 {
    fn from_number(number: &Number) -> Option<Self> {
        number.as_f64()
    }

    fn parse_text(text: &str) -> Option<Self> {
        // Prices are sometimes stored with thousands separators ("20,000")
        text.replace(',', "")
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
    }
}

/// A field after edge normalisation.
///
/// `Valid` holds the parsed value whatever its source representation was
/// (`3`, `3.0` and `"3"` are all `Valid(3)`). `Invalid` keeps the raw text of
/// a value that was present but could not be read as the expected type;
/// predicates treat it as a non-match instead of failing.
#[derive(Debug, Clone, PartialEq)]
pub enum Lenient<T> {
    Valid(T),
    Invalid(String),
}

impl<T> Lenient<T> {
    pub fn as_valid(&self) -> Option<&T> {
        match self {
            Lenient::Valid(value) => Some(value),
            Lenient::Invalid(_) => None,
        }
    }
}

// Text filters: a string is the wanted value, anything else is unreadable.
impl From<&str> for Lenient<String> {
    fn from(text: &str) -> Self {
        Lenient::Valid(text.to_string())
    }
}

impl<T: Numeric> Lenient<T> {
    /// Parses a textual value. Blank text means "absent" and yields `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(match T::parse_text(trimmed) {
            Some(value) => Lenient::Valid(value),
            None => Lenient::Invalid(trimmed.to_string()),
        })
    }

    /// Normalises any JSON value. `null` and blank strings are absent.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(text) => Self::parse(text),
            Value::Number(number) => Some(match T::from_number(number) {
                Some(v) => Lenient::Valid(v),
                None => Lenient::Invalid(number.to_string()),
            }),
            other => Some(Lenient::Invalid(other.to_string())),
        }
    }

    pub fn valid(&self) -> Option<T> {
        match self {
            Lenient::Valid(value) => Some(*value),
            Lenient::Invalid(_) => None,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Lenient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lenient::Valid(value) => value.fmt(f),
            Lenient::Invalid(raw) => f.write_str(raw),
        }
    }
}

impl<T: Serialize> Serialize for Lenient<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Lenient::Valid(value) => value.serialize(serializer),
            Lenient::Invalid(raw) => serializer.serialize_str(raw),
        }
    }
}

/// Serde helpers for `Lenient` fields.
pub mod lenient {
    use super::{Lenient, Numeric};
    use serde::{de::Error, Deserialize, Deserializer};
    use serde_json::Value;

    /// Optional lenient field: missing, `null` and `""` all become `None`.
    pub fn optional<'de, D, T>(deserializer: D) -> Result<Option<Lenient<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Numeric,
    {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(raw.as_ref().and_then(Lenient::from_json))
    }

    /// Required integer identifier given as a number or a numeric string.
    pub fn integer<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        match Lenient::<i64>::from_json(&raw) {
            Some(Lenient::Valid(id)) => Ok(id),
            _ => Err(D::Error::custom(format!("expected an integer id, got {}", raw))),
        }
    }

    /// Denormalised brand name on a car: either a plain string or a joined
    /// brand object, from which only `name` is kept.
    pub fn brand_name<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Value>::deserialize(deserializer)?;
        let name = match raw {
            Some(Value::String(name)) => Some(name),
            Some(Value::Object(map)) => map.get("name").and_then(Value::as_str).map(str::to_string),
            _ => None,
        };
        Ok(name.filter(|n| !n.trim().is_empty()))
    }
}

// Brand record as returned by the catalog API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    #[serde(deserialize_with = "lenient::integer")]
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    #[serde(default)]
    pub popular: bool,
    #[serde(default)]
    pub sponsored: bool,
}

// Car record as returned by the catalog API.
// Only the filterable dimensions are typed; the remaining descriptive
// attributes (engine, dimensions, safety features...) are display-only and
// carried through verbatim in `specs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    #[serde(deserialize_with = "lenient::integer")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<Lenient<i64>>,
    #[serde(default, deserialize_with = "lenient::brand_name", skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    pub year: Option<Lenient<i32>>,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    pub price: Option<Lenient<f64>>,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    pub starting_price: Option<Lenient<f64>>,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    pub ending_price: Option<Lenient<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transmission: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(flatten)]
    pub specs: Map<String, Value>,
}

impl Car {
    /// Lower bound of the car's price: `startingPrice`, falling back to `price`.
    pub fn effective_starting_price(&self) -> Option<&Lenient<f64>> {
        self.starting_price.as_ref().or(self.price.as_ref())
    }

    /// Upper bound of the car's price: `endingPrice`, falling back to `price`.
    pub fn effective_ending_price(&self) -> Option<&Lenient<f64>> {
        self.ending_price.as_ref().or(self.price.as_ref())
    }
}

/// Canonical brand identity used to match cars to their manufacturer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandIdentity {
    pub id: Option<i64>,
    pub name: String,
}

impl From<&Brand> for BrandIdentity {
    fn from(brand: &Brand) -> Self {
        BrandIdentity {
            id: Some(brand.id),
            name: brand.name.clone(),
        }
    }
}

/// Brand carried over from the previous page's navigation state.
/// Either half may be missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NavigationBrand {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub id: Option<Lenient<i64>>,
    #[serde(default)]
    pub name: Option<String>,
}

// Deserialize a whole `Car` list leniently: a single malformed record is
// skipped with a warning instead of failing the listing.
pub fn cars_from_json(value: Value) -> Vec<Car> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<Car>(item) {
                Ok(car) => Some(car),
                Err(e) => {
                    tracing::warn!("Skipping malformed car record: {}", e);
                    None
                }
            })
            .collect(),
        other => {
            tracing::warn!("Expected a JSON array of cars, got: {}", value_kind(&other));
            Vec::new()
        }
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
