use crate::domain::model::{
    CatalogStatistics, Category, Place, RatingBucket, Review, ReviewStatistics,
};
use std::collections::BTreeMap;

/// Mean of the ratings rounded to one decimal (half away from zero), or 0 for an empty set.
///
/// Scales the sum before dividing so that exact halves like 34.5 are not lost to an
/// inexact intermediate mean.
pub fn aggregate_rating<I>(ratings: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = ratings
        .into_iter()
        .fold((0.0_f64, 0_usize), |(sum, count), r| (sum + r, count + 1));
    if count == 0 {
        return 0.0;
    }
    (sum * 10.0 / count as f64).round() / 10.0
}

impl ReviewStatistics {
    pub fn from_reviews(reviews: &[Review]) -> Self {
        Self::from_ratings(reviews.iter().map(|r| r.rating))
    }

    pub fn from_ratings<I>(ratings: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let ratings: Vec<f64> = ratings.into_iter().collect();
        let rating_distribution = (1..=5u8)
            .rev()
            .map(|bucket| RatingBucket {
                rating: bucket,
                count: ratings
                    .iter()
                    .filter(|r| r.trunc() == f64::from(bucket))
                    .count(),
            })
            .collect();

        Self {
            total_reviews: ratings.len(),
            average_rating: aggregate_rating(ratings.iter().copied()),
            rating_distribution,
        }
    }

    pub fn bucket(&self, rating: u8) -> usize {
        self.rating_distribution
            .iter()
            .find(|b| b.rating == rating)
            .map_or(0, |b| b.count)
    }
}

impl CatalogStatistics {
    pub fn from_places(places: &[Place]) -> Self {
        let mut by_category = BTreeMap::new();
        for place in places {
            *by_category.entry(place.category).or_insert(0) += 1;
        }

        // ties go to the earlier category in the fixed order
        let mut favorite_category: Option<(Category, usize)> = None;
        for category in Category::ALL {
            let count = by_category.get(&category).copied().unwrap_or(0);
            if count > 0 && favorite_category.map_or(true, |(_, best)| count > best) {
                favorite_category = Some((category, count));
            }
        }

        Self {
            total: places.len(),
            visited: places.iter().filter(|p| p.visited).count(),
            favorites: places.iter().filter(|p| p.is_favorite).count(),
            by_category,
            average_rating: aggregate_rating(places.iter().map(|p| p.rating)),
            favorite_category: favorite_category.map(|(c, _)| c),
        }
    }
}
