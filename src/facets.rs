// Option lists for the storefront filter panel, derived from a car list.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::models::{Car, Lenient};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceBounds {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterFacets {
    pub fuel_types: Vec<String>,
    pub body_types: Vec<String>,
    pub transmissions: Vec<String>,
    /// Newest first.
    pub years: Vec<i32>,
    pub price_bounds: Option<PriceBounds>,
}

fn distinct<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    values
        .flatten()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

pub fn collect_facets(cars: &[Car]) -> FilterFacets {
    let years: BTreeSet<i32> = cars
        .iter()
        .filter_map(|car| car.year.as_ref().and_then(Lenient::valid))
        .collect();

    let prices = cars.iter().flat_map(|car| {
        [car.effective_starting_price(), car.effective_ending_price()]
            .into_iter()
            .flatten()
            .filter_map(Lenient::valid)
    });
    let price_bounds = prices.fold(None, |bounds: Option<PriceBounds>, price| {
        Some(match bounds {
            None => PriceBounds { min: price, max: price },
            Some(b) => PriceBounds {
                min: b.min.min(price),
                max: b.max.max(price),
            },
        })
    });

    FilterFacets {
        fuel_types: distinct(cars.iter().map(|c| c.fuel_type.as_deref())),
        body_types: distinct(cars.iter().map(|c| c.body_type.as_deref())),
        transmissions: distinct(cars.iter().map(|c| c.transmission.as_deref())),
        years: years.into_iter().rev().collect(),
        price_bounds,
    }
}
