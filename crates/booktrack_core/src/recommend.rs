//! crates/booktrack_core/src/recommend.rs
//!
//! The Recommendation Generator: ranks a candidate book pool against a
//! user's Reading DNA. Pure and deterministic; identical inputs always
//! produce the same ordered list.

use std::collections::HashSet;

use uuid::Uuid;

use crate::domain::{Book, LengthBucket, ReadingDna};

/// Relative weight of each scoring component. Components are normalized to
/// [0, 1] before weighting. Defaults are exposed through service
/// configuration rather than baked into call sites.
#[derive(Debug, Clone, Copy)]
pub struct ScoringWeights {
    pub genre: f64,
    pub length: f64,
    pub popularity: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            genre: 0.6,
            length: 0.3,
            popularity: 0.1,
        }
    }
}

/// Page-count midpoint a candidate's length is compared against.
fn bucket_midpoint(bucket: LengthBucket) -> f64 {
    match bucket {
        LengthBucket::Short => 120.0,
        LengthBucket::Medium => 325.0,
        LengthBucket::Long => 600.0,
    }
}

/// Normalization span for the length-distance term.
const LENGTH_SPAN: f64 = 600.0;

/// Ranks `pool` for a user: filters out owned books, scores the rest, and
/// returns the top `limit` in descending score order with a stable id
/// tiebreak. A pool smaller than `limit` comes back whole; nothing is ever
/// padded or duplicated.
///
/// An empty DNA (new user) degrades to a popularity-only ranking rather
/// than failing.
pub fn recommend(
    dna: &ReadingDna,
    pool: &[Book],
    already_owned: &HashSet<Uuid>,
    limit: usize,
    weights: ScoringWeights,
) -> Vec<Book> {
    let candidates: Vec<&Book> = pool
        .iter()
        .filter(|b| !already_owned.contains(&b.id))
        .collect();

    let max_popularity = candidates.iter().map(|b| b.popularity).max().unwrap_or(0);

    let mut scored: Vec<(f64, &Book)> = candidates
        .into_iter()
        .map(|book| (score(dna, book, max_popularity, weights), book))
        .collect();

    // Descending score; ascending id keeps equal scores deterministic.
    scored.sort_by(|(sa, a), (sb, b)| {
        sb.total_cmp(sa).then_with(|| a.id.cmp(&b.id))
    });

    scored
        .into_iter()
        .take(limit)
        .map(|(_, book)| book.clone())
        .collect()
}

fn score(dna: &ReadingDna, book: &Book, max_popularity: u32, weights: ScoringWeights) -> f64 {
    let popularity = if max_popularity > 0 {
        book.popularity as f64 / max_popularity as f64
    } else {
        0.0
    };

    // A user with no taste signal gets a straight popularity ranking.
    if dna.is_empty() {
        return popularity;
    }

    weights.genre * genre_affinity(dna, book)
        + weights.length * length_fit(dna, book)
        + weights.popularity * popularity
}

/// Rank-weighted overlap between the candidate's genre tags and the DNA's
/// ranked genres: the top DNA genre carries full weight, lower ranks decay
/// linearly. Normalized so matching every DNA genre scores 1.0.
fn genre_affinity(dna: &ReadingDna, book: &Book) -> f64 {
    let k = dna.top_genres.len();
    if k == 0 {
        return 0.0;
    }

    let mut matched = 0.0;
    let mut total = 0.0;
    for (rank, genre) in dna.top_genres.iter().enumerate() {
        let weight = (k - rank) as f64 / k as f64;
        total += weight;
        if book.genres.iter().any(|g| g.eq_ignore_ascii_case(genre)) {
            matched += weight;
        }
    }
    matched / total
}

/// Inverted, normalized distance between the candidate's page count and the
/// preferred length bucket's midpoint. Unknown page count or no stated
/// preference scores a neutral 0.5.
fn length_fit(dna: &ReadingDna, book: &Book) -> f64 {
    match (dna.preferred_length, book.page_count) {
        (Some(bucket), Some(pages)) => {
            let distance = (pages as f64 - bucket_midpoint(bucket)).abs() / LENGTH_SPAN;
            (1.0 - distance).clamp(0.0, 1.0)
        }
        _ => 0.5,
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn book(n: u128, title: &str, genres: &[&str], pages: Option<u32>, popularity: u32) -> Book {
        Book {
            id: Uuid::from_u128(n),
            title: title.to_string(),
            authors: vec!["Author".to_string()],
            page_count: pages,
            genres: genres.iter().map(|g| g.to_string()).collect(),
            external_ref: None,
            popularity,
        }
    }

    fn dna(genres: &[&str], length: Option<LengthBucket>) -> ReadingDna {
        ReadingDna {
            top_genres: genres.iter().map(|g| g.to_string()).collect(),
            preferred_length: length,
            completion_velocity: Some(2.0),
            mood_tags: vec![],
        }
    }

    fn pool() -> Vec<Book> {
        vec![
            book(1, "Space Saga", &["science fiction"], Some(320), 80),
            book(2, "Cozy Garden", &["cozy", "mystery"], Some(250), 95),
            book(3, "Dragon March", &["fantasy"], Some(700), 60),
            book(4, "Starlit Noir", &["science fiction", "mystery"], Some(310), 40),
        ]
    }

    #[test]
    fn identical_inputs_give_identical_output() {
        let dna = dna(&["science fiction", "mystery"], Some(LengthBucket::Medium));
        let owned = HashSet::new();

        let first = recommend(&dna, &pool(), &owned, 3, ScoringWeights::default());
        let second = recommend(&dna, &pool(), &owned, 3, ScoringWeights::default());

        let first_ids: Vec<_> = first.iter().map(|b| b.id).collect();
        let second_ids: Vec<_> = second.iter().map(|b| b.id).collect();
        assert_eq!(first_ids, second_ids);
    }

    #[test]
    fn owned_books_are_never_recommended() {
        let dna = dna(&["science fiction"], None);
        let owned: HashSet<Uuid> = [Uuid::from_u128(1), Uuid::from_u128(4)].into();

        let results = recommend(&dna, &pool(), &owned, 10, ScoringWeights::default());

        assert!(results.iter().all(|b| !owned.contains(&b.id)));
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn small_pool_returns_everything_without_duplicates() {
        let dna = dna(&["fantasy"], None);
        let owned: HashSet<Uuid> = [Uuid::from_u128(2)].into();

        let results = recommend(&dna, &pool(), &owned, 10, ScoringWeights::default());

        assert_eq!(results.len(), 3);
        let mut ids: Vec<_> = results.iter().map(|b| b.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn empty_dna_falls_back_to_popularity_order() {
        let results = recommend(
            &ReadingDna::default(),
            &pool(),
            &HashSet::new(),
            4,
            ScoringWeights::default(),
        );

        let ids: Vec<_> = results.iter().map(|b| b.id).collect();
        // Popularity 95, 80, 60, 40.
        assert_eq!(
            ids,
            vec![
                Uuid::from_u128(2),
                Uuid::from_u128(1),
                Uuid::from_u128(3),
                Uuid::from_u128(4)
            ]
        );
    }

    #[test]
    fn top_ranked_dna_genre_outweighs_lower_ranks() {
        // Two otherwise-identical candidates, one matching the user's top
        // genre and one matching the second.
        let candidates = vec![
            book(10, "Top Genre Match", &["science fiction"], Some(300), 50),
            book(11, "Second Genre Match", &["mystery"], Some(300), 50),
        ];
        let dna = dna(&["science fiction", "mystery"], Some(LengthBucket::Medium));

        let results = recommend(&dna, &candidates, &HashSet::new(), 2, ScoringWeights::default());

        assert_eq!(results[0].id, Uuid::from_u128(10));
        assert_eq!(results[1].id, Uuid::from_u128(11));
    }

    #[test]
    fn ties_break_on_catalog_id() {
        let candidates = vec![
            book(7, "Twin B", &["fantasy"], Some(400), 50),
            book(5, "Twin A", &["fantasy"], Some(400), 50),
        ];
        let dna = dna(&["fantasy"], None);

        let results = recommend(&dna, &candidates, &HashSet::new(), 2, ScoringWeights::default());

        assert_eq!(results[0].id, Uuid::from_u128(5));
        assert_eq!(results[1].id, Uuid::from_u128(7));
    }

    #[test]
    fn length_preference_prefers_closer_page_counts() {
        let candidates = vec![
            book(20, "Doorstop", &["fantasy"], Some(900), 50),
            book(21, "Right Size", &["fantasy"], Some(320), 50),
        ];
        let dna = dna(&["fantasy"], Some(LengthBucket::Medium));

        let results = recommend(&dna, &candidates, &HashSet::new(), 2, ScoringWeights::default());

        assert_eq!(results[0].id, Uuid::from_u128(21));
    }

    #[test]
    fn zero_limit_returns_nothing() {
        let dna = dna(&["fantasy"], None);
        let results = recommend(&dna, &pool(), &HashSet::new(), 0, ScoringWeights::default());
        assert!(results.is_empty());
    }
}
