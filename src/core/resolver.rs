use crate::domain::model::{City, Country, Id, University};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionKind {
    Country,
    City,
    University,
}

#[derive(Debug, Default)]
struct DimensionTable {
    index: HashMap<(String, Option<Id>), Id>,
    entries: Vec<(Id, String, Option<Id>)>,
}

impl DimensionTable {
    fn resolve(&mut self, name: &str, parent: Option<Id>) -> Id {
        let key = (name.to_string(), parent);
        if let Some(id) = self.index.get(&key) {
            return *id;
        }

        let id = self.entries.len() as Id + 1;
        self.entries.push((id, key.0.clone(), parent));
        self.index.insert(key, id);
        id
    }
}

/// The country, city and university tables built by one pass.
#[derive(Debug, Default)]
pub struct Dimensions {
    pub countries: BTreeMap<Id, Country>,
    pub cities: BTreeMap<Id, City>,
    pub universities: BTreeMap<Id, University>,
}

/// Name → id lookup for the dimension entities of a single import pass.
///
/// Ids start at 1 per kind and follow first-sighting order. A resolver is
/// created for one pass and consumed by [`DimensionResolver::into_dimensions`];
/// nothing is carried over to the next pass.
#[derive(Debug, Default)]
pub struct DimensionResolver {
    countries: DimensionTable,
    cities: DimensionTable,
    universities: DimensionTable,
}

impl DimensionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `name`, creating the entity on first sighting.
    ///
    /// Blank names resolve to `None`. `parent` is the country id and only
    /// takes part in the key for [`DimensionKind::City`].
    pub fn resolve(&mut self, kind: DimensionKind, name: Option<&str>, parent: Option<Id>) -> Option<Id> {
        let name = name.map(str::trim).filter(|n| !n.is_empty())?;

        let id = match kind {
            DimensionKind::Country => self.countries.resolve(name, None),
            DimensionKind::City => self.cities.resolve(name, parent),
            DimensionKind::University => self.universities.resolve(name, None),
        };
        Some(id)
    }

    #[cfg(test)]
    pub fn len(&self, kind: DimensionKind) -> usize {
        match kind {
            DimensionKind::Country => self.countries.entries.len(),
            DimensionKind::City => self.cities.entries.len(),
            DimensionKind::University => self.universities.entries.len(),
        }
    }

    pub fn into_dimensions(self) -> Dimensions {
        Dimensions {
            countries: self
                .countries
                .entries
                .into_iter()
                .map(|(id, name, _)| (id, Country { id, name }))
                .collect(),
            cities: self
                .cities
                .entries
                .into_iter()
                .map(|(id, name, country_id)| {
                    (
                        id,
                        City {
                            id,
                            name,
                            country_id,
                        },
                    )
                })
                .collect(),
            universities: self
                .universities
                .entries
                .into_iter()
                .map(|(id, name, _)| (id, University { id, name }))
                .collect(),
        }
    }
}
