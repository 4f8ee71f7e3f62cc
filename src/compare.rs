// Side-by-side comparison of a handful of cars.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use thiserror::Error;

use crate::models::Car;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompareError {
    #[error("No cars selected for comparison")]
    NothingSelected,
    #[error("At most {limit} cars can be compared, got {requested}")]
    TooMany { requested: usize, limit: usize },
    #[error("Invalid car id '{0}'")]
    InvalidId(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarComparison {
    /// Selected cars in the order they were requested.
    pub cars: Vec<Car>,
    /// Requested IDs with no car in the list.
    pub missing: Vec<i64>,
    /// Attributes whose values are not the same on every selected car.
    pub differing: Vec<String>,
}

/// Parses `"1, 2,3"` into IDs, dropping repeats.
pub fn parse_ids(raw: &str) -> Result<Vec<i64>, CompareError> {
    let mut ids = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let id = part
            .parse::<i64>()
            .map_err(|_| CompareError::InvalidId(part.to_string()))?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Rejects empty selections and selections larger than `limit`.
pub fn check_selection(ids: &[i64], limit: usize) -> Result<(), CompareError> {
    if ids.is_empty() {
        return Err(CompareError::NothingSelected);
    }
    if ids.len() > limit {
        return Err(CompareError::TooMany {
            requested: ids.len(),
            limit,
        });
    }
    Ok(())
}

pub fn compare_cars(cars: &[Car], ids: &[i64], limit: usize) -> Result<CarComparison, CompareError> {
    check_selection(ids, limit)?;

    let mut selected = Vec::with_capacity(ids.len());
    let mut missing = Vec::new();
    for id in ids {
        match cars.iter().find(|car| car.id == *id) {
            Some(car) => selected.push(car.clone()),
            None => missing.push(*id),
        }
    }

    let differing = differing_attributes(&selected);
    Ok(CarComparison {
        cars: selected,
        missing,
        differing,
    })
}

fn differing_attributes(cars: &[Car]) -> Vec<String> {
    let rows: Vec<serde_json::Map<String, Value>> = cars
        .iter()
        .filter_map(|car| match serde_json::to_value(car) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        })
        .collect();

    let keys: BTreeSet<&String> = rows.iter().flat_map(|row| row.keys()).collect();
    keys.into_iter()
        .filter(|key| key.as_str() != "id")
        .filter(|key| {
            let mut values = rows.iter().map(|row| row.get(key.as_str()).unwrap_or(&Value::Null));
            match values.next() {
                Some(first) => values.any(|v| v != first),
                None => false,
            }
        })
        .cloned()
        .collect()
}
