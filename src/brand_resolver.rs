// Brand identity resolution.
//
// A brand page can be reached with the brand in the route (`/brands/3` or
// `/brands/land-rover`), in the query string (`?brandId=3&brandName=Tata`) or
// in state handed over from the previous page. These sources may be partial
// or disagree; `resolve_brand` reduces them to one canonical identity.

use crate::models::{Brand, BrandIdentity, Lenient, NavigationBrand};

/// Everything the caller knows about the requested brand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrandQuery {
    pub route_brand_id: Option<String>,
    pub route_brand_name: Option<String>,
    pub query_brand_id: Option<String>,
    pub query_brand_name: Option<String>,
    pub navigation_state: Option<NavigationBrand>,
}

impl BrandQuery {
    /// Valid numeric IDs, most specific source first.
    fn id_candidates(&self) -> Vec<i64> {
        let route = self.route_brand_id.as_deref().and_then(Lenient::<i64>::parse);
        let query = self.query_brand_id.as_deref().and_then(Lenient::<i64>::parse);
        let navigation = self.navigation_state.as_ref().and_then(|nav| nav.id.clone());

        [route, query, navigation]
            .into_iter()
            .flatten()
            .filter_map(|id| id.valid())
            .collect()
    }

    /// Normalised names, most specific source first. A route ID that is not
    /// numeric is a slug and counts as a name.
    fn name_candidates(&self) -> Vec<String> {
        let route_slug = self
            .route_brand_id
            .as_deref()
            .filter(|raw| matches!(Lenient::<i64>::parse(raw), Some(Lenient::Invalid(_))));

        [
            self.route_brand_name.as_deref(),
            route_slug,
            self.query_brand_name.as_deref(),
            self.navigation_state.as_ref().and_then(|nav| nav.name.as_deref()),
        ]
        .into_iter()
        .flatten()
        .map(normalize_brand_name)
        .filter(|name| !name.is_empty())
        .collect()
    }
}

/// URL slugs use `-` in place of spaces.
pub fn normalize_brand_name(raw: &str) -> String {
    raw.replace('-', " ").trim().to_string()
}

pub fn find_brand_by_id(directory: &[Brand], id: i64) -> Option<&Brand> {
    directory.iter().find(|brand| brand.id == id)
}

pub fn find_brand_by_name<'a>(directory: &'a [Brand], name: &str) -> Option<&'a Brand> {
    let wanted = name.trim().to_lowercase();
    directory
        .iter()
        .find(|brand| brand.name.trim().to_lowercase() == wanted)
}

/// Resolves a brand identity against a brand directory.
///
/// IDs are tried before names, so an ID wins over a conflicting name. An
/// unmatched name still yields `{id: None, name}` so cars can be matched by
/// name; an unmatched ID with no name yields `{id, name: ""}`. `None` is
/// returned only when the query carries no brand information at all.
pub fn resolve_brand(query: &BrandQuery, directory: &[Brand]) -> Option<BrandIdentity> {
    let ids = query.id_candidates();
    if let Some(brand) = ids.iter().find_map(|id| find_brand_by_id(directory, *id)) {
        tracing::trace!(brand_id = brand.id, "Brand resolved by id");
        return Some(BrandIdentity::from(brand));
    }

    let names = query.name_candidates();
    if let Some(brand) = names.iter().find_map(|name| find_brand_by_name(directory, name)) {
        tracing::trace!(brand_id = brand.id, "Brand resolved by name");
        return Some(BrandIdentity::from(brand));
    }

    if let Some(name) = names.into_iter().next() {
        tracing::debug!(name = %name, "Brand not in directory, falling back to name matching");
        return Some(BrandIdentity { id: None, name });
    }

    if let Some(id) = ids.first() {
        tracing::debug!(brand_id = id, "Brand id not in directory, keeping id for matching");
        return Some(BrandIdentity {
            id: Some(*id),
            name: String::new(),
        });
    }

    None
}
