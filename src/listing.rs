// Ordering and page slicing of a matched car list.

use serde::Serialize;
use std::cmp::Ordering;

use crate::models::{Car, Lenient};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    PriceAsc,
    PriceDesc,
    YearDesc,
    /// Keep matcher output order.
    #[default]
    Unsorted,
}

impl SortKey {
    /// Parses the storefront's sort parameter. Unknown or blank keys keep the
    /// matcher order.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("price-asc") => SortKey::PriceAsc,
            Some("price-desc") => SortKey::PriceDesc,
            Some("year-desc") => SortKey::YearDesc,
            None | Some("") => SortKey::Unsorted,
            Some(other) => {
                tracing::debug!("Unknown sort key '{}', keeping input order", other);
                SortKey::Unsorted
            }
        }
    }
}

/// One page of results plus the totals a pager needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarPage {
    pub items: Vec<Car>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

fn starting_price(car: &Car) -> Option<f64> {
    car.effective_starting_price().and_then(Lenient::valid)
}

fn year(car: &Car) -> Option<i32> {
    car.year.as_ref().and_then(Lenient::valid)
}

// Cars without a usable key go last whatever the direction.
fn keyed<T>(a: Option<T>, b: Option<T>, cmp: impl Fn(T, T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp(a, b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort in place; ties keep their relative order.
pub fn sort_cars(cars: &mut [Car], key: SortKey) {
    match key {
        SortKey::Unsorted => {}
        SortKey::PriceAsc => {
            cars.sort_by(|a, b| keyed(starting_price(a), starting_price(b), |x, y| x.total_cmp(&y)))
        }
        SortKey::PriceDesc => {
            cars.sort_by(|a, b| keyed(starting_price(a), starting_price(b), |x, y| y.total_cmp(&x)))
        }
        SortKey::YearDesc => cars.sort_by(|a, b| keyed(year(a), year(b), |x, y| y.cmp(&x))),
    }
}

/// `items[(page-1)*page_size .. page*page_size]`, 1-based. Out-of-range pages,
/// page 0 and a zero page size all give an empty slice.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = match (page - 1).checked_mul(page_size) {
        Some(start) if start < items.len() => start,
        _ => return &[],
    };
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

pub fn sort_and_paginate(cars: &[Car], key: SortKey, page: usize, page_size: usize) -> Vec<Car> {
    let mut sorted = cars.to_vec();
    sort_cars(&mut sorted, key);
    paginate(&sorted, page, page_size).to_vec()
}

/// Sorts and slices, returning the page with its totals.
pub fn page_of(cars: Vec<Car>, key: SortKey, page: usize, page_size: usize) -> CarPage {
    let mut sorted = cars;
    sort_cars(&mut sorted, key);
    let total = sorted.len();
    let total_pages = if page_size == 0 { 0 } else { total.div_ceil(page_size) };
    CarPage {
        items: paginate(&sorted, page, page_size).to_vec(),
        total,
        page,
        page_size,
        total_pages,
    }
}
