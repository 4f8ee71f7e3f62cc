// Filter specification consumed by the car matcher, plus the two wire forms it
// is built from: a JSON body (POST /api/search) and URL query params.

use serde::Deserialize;
use serde_json::Value;

use crate::models::{BrandIdentity, Lenient};

/// Inclusive price bounds. Open sides are infinite.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRange {
    pub min: Lenient<f64>,
    pub max: Lenient<f64>,
}

impl PriceRange {
    pub fn new(min: f64, max: f64) -> Self {
        PriceRange {
            min: Lenient::Valid(min),
            max: Lenient::Valid(max),
        }
    }
}

/// The two shapes a year constraint comes in.
#[derive(Debug, Clone, PartialEq)]
pub enum YearFilter {
    Exact(Lenient<i32>),
    Range { min: Lenient<i32>, max: Lenient<i32> },
}

/// User-chosen constraints narrowing a car list. `None` means "no constraint
/// on this dimension"; blank strings never reach this type. A text value that
/// arrived as something other than a string is kept as `Lenient::Invalid` and
/// matches no car.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawFilterSpec")]
pub struct FilterSpec {
    pub brand: Option<Lenient<i64>>,
    pub brand_name: Option<Lenient<String>>,
    pub price_range: Option<PriceRange>,
    pub year: Option<YearFilter>,
    pub fuel_type: Option<Lenient<String>>,
    pub body_type: Option<Lenient<String>>,
    pub transmission: Option<Lenient<String>>,
    pub keyword: Option<Lenient<String>>,
}

impl FilterSpec {
    /// Brand-only filter for a resolved identity.
    pub fn for_brand(identity: &BrandIdentity) -> Self {
        FilterSpec {
            brand: identity.id.map(Lenient::Valid),
            brand_name: non_blank(Some(identity.name.clone())).map(Lenient::Valid),
            ..FilterSpec::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == FilterSpec::default()
    }

    /// Combines two specs; every field set in `other` replaces the one in `self`.
    pub fn merged_with(self, other: FilterSpec) -> FilterSpec {
        FilterSpec {
            brand: other.brand.or(self.brand),
            brand_name: other.brand_name.or(self.brand_name),
            price_range: other.price_range.or(self.price_range),
            year: other.year.or(self.year),
            fuel_type: other.fuel_type.or(self.fuel_type),
            body_type: other.body_type.or(self.body_type),
            transmission: other.transmission.or(self.transmission),
            keyword: other.keyword.or(self.keyword),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn text_from_query(value: &Option<String>) -> Option<Lenient<String>> {
    non_blank(value.clone()).map(Lenient::Valid)
}

// Strings become the wanted text; numbers, objects and the like are kept as
// unreadable so their clause excludes every car instead of being dropped.
fn text_from_json(value: Option<Value>) -> Option<Lenient<String>> {
    match value? {
        Value::Null => None,
        Value::String(text) => non_blank(Some(text)).map(Lenient::Valid),
        other => {
            tracing::debug!("Text filter is not a string: {}", other);
            Some(Lenient::Invalid(other.to_string()))
        }
    }
}

// JSON form as sent by the storefront. Every field is taken as a raw value and
// normalised in `From`, so a malformed filter never fails the request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawFilterSpec {
    brand: Option<Value>,
    brand_name: Option<Value>,
    price_range: Option<Value>,
    year: Option<Value>,
    fuel_type: Option<Value>,
    body_type: Option<Value>,
    transmission: Option<Value>,
    keyword: Option<Value>,
}

impl From<RawFilterSpec> for FilterSpec {
    fn from(raw: RawFilterSpec) -> Self {
        FilterSpec {
            brand: raw.brand.as_ref().and_then(Lenient::from_json),
            brand_name: text_from_json(raw.brand_name),
            price_range: raw.price_range.as_ref().and_then(price_range_from_json),
            year: raw.year.as_ref().and_then(year_from_json),
            fuel_type: text_from_json(raw.fuel_type),
            body_type: text_from_json(raw.body_type),
            transmission: text_from_json(raw.transmission),
            keyword: text_from_json(raw.keyword),
        }
    }
}

// `[min, max]` only; any other shape is ignored.
fn price_range_from_json(value: &Value) -> Option<PriceRange> {
    match value.as_array().map(Vec::as_slice) {
        Some([min, max]) => Some(PriceRange {
            min: Lenient::from_json(min).unwrap_or(Lenient::Valid(f64::NEG_INFINITY)),
            max: Lenient::from_json(max).unwrap_or(Lenient::Valid(f64::INFINITY)),
        }),
        _ => {
            tracing::debug!("Ignoring priceRange that is not a two-element array: {}", value);
            None
        }
    }
}

fn year_from_json(value: &Value) -> Option<YearFilter> {
    match value {
        Value::Object(map) => {
            let min = map.get("min").and_then(Lenient::from_json);
            let max = map.get("max").and_then(Lenient::from_json);
            match (min, max) {
                (Some(min), Some(max)) => Some(YearFilter::Range { min, max }),
                _ => {
                    tracing::debug!("Ignoring year range without both bounds: {}", value);
                    None
                }
            }
        }
        other => Lenient::from_json(other).map(YearFilter::Exact),
    }
}

/// Filter, sort and page parameters of `GET /api/cars`.
/// All values are kept as text and parsed leniently.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarQuery {
    #[serde(alias = "brandId")]
    pub brand: Option<String>,
    pub brand_name: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub year: Option<String>,
    pub year_min: Option<String>,
    pub year_max: Option<String>,
    pub fuel_type: Option<String>,
    pub body_type: Option<String>,
    pub transmission: Option<String>,
    pub q: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl CarQuery {
    pub fn filter_spec(&self) -> FilterSpec {
        let min_price = self.min_price.as_deref().and_then(Lenient::parse);
        let max_price = self.max_price.as_deref().and_then(Lenient::parse);
        let price_range = match (min_price, max_price) {
            (None, None) => None,
            (min, max) => Some(PriceRange {
                min: min.unwrap_or(Lenient::Valid(f64::NEG_INFINITY)),
                max: max.unwrap_or(Lenient::Valid(f64::INFINITY)),
            }),
        };

        let year = match self.year.as_deref().and_then(Lenient::parse) {
            Some(exact) => Some(YearFilter::Exact(exact)),
            None => {
                let min = self.year_min.as_deref().and_then(Lenient::parse);
                let max = self.year_max.as_deref().and_then(Lenient::parse);
                match (min, max) {
                    (Some(min), Some(max)) => Some(YearFilter::Range { min, max }),
                    _ => None,
                }
            }
        };

        FilterSpec {
            brand: self.brand.as_deref().and_then(Lenient::parse),
            brand_name: text_from_query(&self.brand_name),
            price_range,
            year,
            fuel_type: text_from_query(&self.fuel_type),
            body_type: text_from_query(&self.body_type),
            transmission: text_from_query(&self.transmission),
            keyword: text_from_query(&self.q),
        }
    }

    /// Requested page, 1-based. Missing or unreadable means the first page.
    pub fn page(&self) -> usize {
        parse_count(self.page.as_deref()).unwrap_or(1)
    }

    pub fn page_size(&self) -> Option<usize> {
        parse_count(self.page_size.as_deref())
    }
}

pub(crate) fn parse_count(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|r| r.trim().parse::<usize>().ok())
}
