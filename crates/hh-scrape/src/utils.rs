use std::collections::HashSet;

use crate::types::Listing;

#[derive(Debug, Default)]
pub struct ExportFilter {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl ExportFilter {
    pub fn apply<T>(self, mut listings: Vec<T>) -> Vec<T> {
        if let Some(off) = self.offset {
            listings = listings.into_iter().skip(off).collect();
        }
        if let Some(lim) = self.limit {
            listings.truncate(lim);
        }
        listings
    }

    pub fn validate(self) -> Result<Self, String> {
        if self.offset.is_some_and(|o| o == 0) {
            return Err("Offset must be greater than 0".to_string());
        }
        if self.limit.is_some_and(|l| l == 0) {
            return Err("Limit must be greater than 0".to_string());
        }
        Ok(self)
    }
}

#[derive(Debug)]
pub struct ListingStats {
    pub total: usize,
    pub with_skills: usize,
    pub most_skills: usize,
    pub distinct_areas: usize,
}

impl ListingStats {
    pub fn from_listings<T: Listing>(listings: &[T]) -> ListingStats {
        ListingStats {
            total: listings.len(),
            with_skills: listings.iter().filter(|l| !l.skills().is_empty()).count(),
            most_skills: listings.iter().map(|l| l.skills().len()).max().unwrap_or(0),
            distinct_areas: listings
                .iter()
                .map(Listing::location)
                .collect::<HashSet<_>>()
                .len(),
        }
    }
}

impl std::fmt::Display for ListingStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nStatistics:")?;
        writeln!(f, "  Listings:        {}", self.total)?;
        writeln!(f, "  With skill tags: {}", self.with_skills)?;
        writeln!(f, "  Most skills:     {}", self.most_skills)?;
        writeln!(f, "  Distinct areas:  {}", self.distinct_areas)
    }
}
