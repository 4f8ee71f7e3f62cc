// Car matcher: narrows a car list by a `FilterSpec`.
//
// Every active clause must hold (logical AND). Inactive clauses are vacuously
// true. Malformed values never panic; they make their clause a non-match for
// that car only. Input order is preserved.

use crate::filters::{FilterSpec, PriceRange, YearFilter};
use crate::models::{Car, Lenient};

/// Returns the cars satisfying every active clause of `filters`, in input order.
pub fn match_cars(cars: &[Car], filters: &FilterSpec) -> Vec<Car> {
    if filters.is_empty() {
        return cars.to_vec();
    }
    let matched: Vec<Car> = cars
        .iter()
        .filter(|car| car_matches(car, filters))
        .cloned()
        .collect();
    tracing::debug!(total = cars.len(), matched = matched.len(), "Matched cars against filters");
    matched
}

pub fn car_matches(car: &Car, filters: &FilterSpec) -> bool {
    matches_brand(car, filters)
        && filters
            .price_range
            .as_ref()
            .is_none_or(|range| matches_price(car, range))
        && filters.year.as_ref().is_none_or(|year| matches_year(car, year))
        && matches_text(car.body_type.as_deref(), filters.body_type.as_ref())
        && matches_text(car.fuel_type.as_deref(), filters.fuel_type.as_ref())
        && matches_text(car.transmission.as_deref(), filters.transmission.as_ref())
        && filters.keyword.as_ref().is_none_or(|keyword| match keyword {
            Lenient::Valid(keyword) => matches_keyword(car, keyword),
            Lenient::Invalid(_) => false,
        })
}

// ID path OR name path. Active when either half of the brand filter is set.
fn matches_brand(car: &Car, filters: &FilterSpec) -> bool {
    if filters.brand.is_none() && filters.brand_name.is_none() {
        return true;
    }

    let by_id = match (
        filters.brand.as_ref().and_then(Lenient::valid),
        car.brand_id.as_ref().and_then(Lenient::valid),
    ) {
        (Some(wanted), Some(actual)) => wanted == actual,
        _ => false,
    };

    let by_name = match (
        filters.brand_name.as_ref().and_then(Lenient::as_valid),
        car.brand.as_deref(),
    ) {
        (Some(wanted), Some(actual)) => wanted.trim().to_lowercase() == actual.trim().to_lowercase(),
        _ => false,
    };

    by_id || by_name
}

// A missing price side does not exclude the car; an unreadable one does.
fn matches_price(car: &Car, range: &PriceRange) -> bool {
    let (Some(min), Some(max)) = (range.min.valid(), range.max.valid()) else {
        return false;
    };

    let low_ok = match car.effective_starting_price() {
        None => true,
        Some(price) => price.valid().is_some_and(|p| p >= min),
    };
    let high_ok = match car.effective_ending_price() {
        None => true,
        Some(price) => price.valid().is_some_and(|p| p <= max),
    };

    low_ok && high_ok
}

fn matches_year(car: &Car, filter: &YearFilter) -> bool {
    let Some(year) = car.year.as_ref().and_then(Lenient::valid) else {
        return false;
    };
    match filter {
        YearFilter::Exact(wanted) => wanted.valid() == Some(year),
        YearFilter::Range { min, max } => match (min.valid(), max.valid()) {
            (Some(min), Some(max)) => min <= year && year <= max,
            _ => false,
        },
    }
}

fn matches_text(actual: Option<&str>, wanted: Option<&Lenient<String>>) -> bool {
    match wanted {
        None => true,
        Some(Lenient::Valid(wanted)) => actual == Some(wanted.as_str()),
        Some(Lenient::Invalid(_)) => false,
    }
}

fn matches_keyword(car: &Car, keyword: &str) -> bool {
    let needle = keyword.to_lowercase();
    [car.brand.as_deref(), Some(car.model.as_str()), car.variant.as_deref()]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn car(value: serde_json::Value) -> Car {
        serde_json::from_value(value).unwrap()
    }

    fn sample() -> Vec<Car> {
        vec![
            car(json!({ "id": 1, "brandId": 3, "brand": "Tata", "model": "Nexon", "price": 20000,
                        "year": 2022, "fuelType": "Diesel", "bodyType": "SUV", "transmission": "Manual" })),
            car(json!({ "id": 2, "brandId": 4, "brand": "Hyundai", "model": "i20", "price": 15000,
                        "year": 2021, "fuelType": "Petrol", "bodyType": "Hatchback", "transmission": "Automatic" })),
            car(json!({ "id": 3, "brandId": "7", "brand": "Kia", "model": "Seltos",
                        "startingPrice": 18000, "endingPrice": 26000, "year": "2023", "fuelType": "Petrol" })),
        ]
    }

    fn ids(cars: &[Car]) -> Vec<i64> {
        cars.iter().map(|c| c.id).collect()
    }

    #[test]
    fn empty_filter_returns_everything_in_order() {
        let cars = sample();
        assert_eq!(match_cars(&cars, &FilterSpec::default()), cars);
    }

    #[test]
    fn brand_id_path_with_string_filter() {
        let filters = FilterSpec {
            brand: Some(Lenient::Valid(3)),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&match_cars(&sample(), &filters)), vec![1]);
    }

    #[test]
    fn brand_name_path_without_id() {
        let filters = FilterSpec {
            brand_name: Some("tata".into()),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&match_cars(&sample(), &filters)), vec![1]);
    }

    #[test]
    fn string_brand_id_on_car_matches_numeric_filter() {
        let filters: FilterSpec = serde_json::from_value(json!({ "brand": 7 })).unwrap();
        assert_eq!(ids(&match_cars(&sample(), &filters)), vec![3]);
    }

    #[test]
    fn brand_is_an_or_between_id_and_name() {
        // wrong id, right name
        let filters = FilterSpec {
            brand: Some(Lenient::Valid(99)),
            brand_name: Some("HYUNDAI".into()),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&match_cars(&sample(), &filters)), vec![2]);
    }

    #[test]
    fn malformed_brand_matches_nothing_without_panicking() {
        let filters: FilterSpec = serde_json::from_value(json!({ "brand": "abc" })).unwrap();
        assert!(match_cars(&sample(), &filters).is_empty());
    }

    #[test]
    fn car_without_brand_fields_is_skipped_not_fatal() {
        let mut cars = sample();
        cars.push(car(json!({ "id": 9, "model": "Mystery" })));
        let filters = FilterSpec {
            brand_name: Some("kia".into()),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&match_cars(&cars, &filters)), vec![3]);
    }

    #[test]
    fn price_bounds_are_inclusive() {
        let filters = FilterSpec {
            price_range: Some(PriceRange::new(15000.0, 20000.0)),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&match_cars(&sample(), &filters)), vec![1, 2]);
    }

    #[test]
    fn price_range_uses_starting_and_ending_price() {
        let inside = FilterSpec {
            price_range: Some(PriceRange::new(18000.0, 26000.0)),
            ..FilterSpec::default()
        };
        assert!(car_matches(&sample()[2], &inside));

        let too_narrow = FilterSpec {
            price_range: Some(PriceRange::new(18000.0, 25000.0)),
            ..FilterSpec::default()
        };
        assert!(!car_matches(&sample()[2], &too_narrow));
    }

    #[test]
    fn missing_price_is_not_excluded_but_malformed_is() {
        let no_price = car(json!({ "id": 10, "model": "Concept" }));
        let bad_price = car(json!({ "id": 11, "model": "Ask", "price": "on request" }));
        let filters = FilterSpec {
            price_range: Some(PriceRange::new(0.0, 1000.0)),
            ..FilterSpec::default()
        };
        assert!(car_matches(&no_price, &filters));
        assert!(!car_matches(&bad_price, &filters));
    }

    #[test]
    fn year_exact_and_range() {
        let exact = FilterSpec {
            year: Some(YearFilter::Exact(Lenient::Valid(2023))),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&match_cars(&sample(), &exact)), vec![3]);

        let range = FilterSpec {
            year: Some(YearFilter::Range {
                min: Lenient::Valid(2021),
                max: Lenient::Valid(2022),
            }),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&match_cars(&sample(), &range)), vec![1, 2]);

        let nonsense = FilterSpec {
            year: Some(YearFilter::Exact(Lenient::Invalid("soon".into()))),
            ..FilterSpec::default()
        };
        assert!(match_cars(&sample(), &nonsense).is_empty());
    }

    #[test]
    fn text_filters_are_exact() {
        let filters = FilterSpec {
            fuel_type: Some("Petrol".into()),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&match_cars(&sample(), &filters)), vec![2, 3]);

        let lower = FilterSpec {
            fuel_type: Some("petrol".into()),
            ..FilterSpec::default()
        };
        assert!(match_cars(&sample(), &lower).is_empty());

        let combined = FilterSpec {
            fuel_type: Some("Petrol".into()),
            transmission: Some("Automatic".into()),
            body_type: Some("Hatchback".into()),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&match_cars(&sample(), &combined)), vec![2]);
    }

    #[test]
    fn unreadable_text_filter_excludes_only_through_its_clause() {
        let fuel: FilterSpec = serde_json::from_value(json!({ "fuelType": 5 })).unwrap();
        assert!(match_cars(&sample(), &fuel).is_empty());

        // the name path fails, the id path still matches
        let brand: FilterSpec = serde_json::from_value(json!({ "brand": "3", "brandName": 3 })).unwrap();
        assert_eq!(ids(&match_cars(&sample(), &brand)), vec![1]);

        let keyword = FilterSpec {
            keyword: Some(Lenient::Invalid("{}".into())),
            ..FilterSpec::default()
        };
        assert!(match_cars(&sample(), &keyword).is_empty());
    }

    #[test]
    fn keyword_searches_brand_and_model() {
        let filters = FilterSpec {
            keyword: Some("selt".into()),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&match_cars(&sample(), &filters)), vec![3]);

        let by_brand = FilterSpec {
            keyword: Some("HYUN".into()),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&match_cars(&sample(), &by_brand)), vec![2]);
    }
}
