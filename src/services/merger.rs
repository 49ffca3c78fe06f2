use std::collections::HashSet;

use rand::{seq::SliceRandom, Rng};

use crate::models::Recommendation;

/// Scores closer than this are treated as tied and ordered randomly
pub const TIE_WINDOW: f64 = 0.05;
/// Intermediate cap of the user-based pipeline
pub const USER_BASED_CAP: usize = 15;
/// Intermediate cap of the friend-based pipeline
pub const FRIEND_BASED_CAP: usize = 10;

/// Sorts by score, highest first, breaking near-ties randomly.
///
/// The score-sorted list is cut into runs: a run starts at its highest item
/// and takes every following item scoring less than `TIE_WINDOW` below it.
/// Each run is shuffled uniformly, so items inside one window are equally
/// likely in any order while items `TIE_WINDOW` or more apart never swap.
/// `relevance_score` itself is untouched.
pub fn rank<R: Rng>(mut recs: Vec<Recommendation>, rng: &mut R) -> Vec<Recommendation> {
    recs.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));

    let mut start = 0;
    while start < recs.len() {
        let anchor = recs[start].relevance_score;
        let end = recs[start..]
            .iter()
            .position(|rec| anchor - rec.relevance_score >= TIE_WINDOW)
            .map_or(recs.len(), |offset| start + offset);
        recs[start..end].shuffle(rng);
        start = end;
    }

    recs
}

/// Drops later items sharing an entity ID or a trimmed, case-folded title
pub fn dedup(recs: Vec<Recommendation>) -> Vec<Recommendation> {
    let mut seen_ids = HashSet::new();
    let mut seen_titles = HashSet::new();

    recs.into_iter()
        .filter(|rec| {
            let title_key = rec.title.trim().to_lowercase();
            let fresh_id = !seen_ids.contains(&rec.entity_id);
            let fresh_title = !seen_titles.contains(&title_key);
            if fresh_id && fresh_title {
                seen_ids.insert(rec.entity_id.clone());
                seen_titles.insert(title_key);
                true
            } else {
                false
            }
        })
        .collect()
}

/// Keeps at most `n` items in their current order, reserving a slot for the
/// first item of every domain present.
///
/// Remaining slots go to the earliest non-leading items. When `n` is smaller
/// than the number of domains, only the first `n` domain leaders are kept.
pub fn take_covering(recs: Vec<Recommendation>, n: usize) -> Vec<Recommendation> {
    let mut domains = HashSet::new();
    let leaders: Vec<bool> = recs.iter().map(|rec| domains.insert(rec.entity_type)).collect();

    let mut leader_slots = domains.len().min(n);
    let mut spare_slots = n - leader_slots;

    recs.into_iter()
        .zip(leaders)
        .filter_map(|(rec, leader)| {
            let slots = if leader {
                &mut leader_slots
            } else {
                &mut spare_slots
            };
            if *slots == 0 {
                return None;
            }
            *slots -= 1;
            Some(rec)
        })
        .collect()
}

/// Rank, dedup, then cut to `cap` without dropping a domain
pub fn merge_ranked<R: Rng>(
    recs: Vec<Recommendation>,
    cap: usize,
    rng: &mut R,
) -> Vec<Recommendation> {
    take_covering(dedup(rank(recs, rng)), cap)
}

/// Aggregate mode: concatenate already-ranked lists, dedup across them,
/// shuffle, and cut to `limit` without dropping a domain
pub fn diversify<R: Rng>(
    lists: Vec<Vec<Recommendation>>,
    limit: usize,
    rng: &mut R,
) -> Vec<Recommendation> {
    let mut merged = dedup(lists.into_iter().flatten().collect());
    merged.shuffle(rng);
    take_covering(merged, limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Domain, ExternalRatings, RecommendationType};
    use rand::{rngs::StdRng, SeedableRng};

    fn rec(id: &str, title: &str, score: f64) -> Recommendation {
        Recommendation {
            entity_id: id.to_string(),
            entity_type: Domain::Books,
            title: title.to_string(),
            description: String::new(),
            tags: vec![],
            popularity: 0.0,
            image_url: None,
            external_ratings: ExternalRatings::default(),
            relevance_score: score,
            explanation: "Popular Fiction books you might enjoy".to_string(),
            recommendation_type: RecommendationType::UserBased,
        }
    }

    fn ids(recs: &[Recommendation]) -> Vec<&str> {
        recs.iter().map(|r| r.entity_id.as_str()).collect()
    }

    #[test]
    fn test_rank_keeps_separated_scores_in_order() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let ranked = rank(
                vec![rec("c", "C", 0.2), rec("a", "A", 0.9), rec("b", "B", 0.5)],
                &mut rng,
            );
            assert_eq!(ids(&ranked), vec!["a", "b", "c"]);
        }
    }

    #[test]
    fn test_rank_breaks_near_ties_both_ways() {
        let mut orders = HashSet::new();
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let ranked = rank(vec![rec("a", "A", 0.70), rec("b", "B", 0.69)], &mut rng);
            orders.insert(ids(&ranked).join(","));
        }
        assert!(orders.contains("a,b"));
        assert!(orders.contains("b,a"));
    }

    #[test]
    fn test_rank_swaps_window_edge_pairs_often() {
        let trials = 1000;
        let lower_first = (0..trials)
            .filter(|&seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let ranked = rank(vec![rec("a", "A", 0.70), rec("b", "B", 0.655)], &mut rng);
                ranked[0].entity_id == "b"
            })
            .count();
        assert!(
            (350..=650).contains(&lower_first),
            "lower item first in {lower_first} of {trials}"
        );
    }

    #[test]
    fn test_rank_never_swaps_across_window() {
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let ranked = rank(
                vec![rec("low", "L", 0.64), rec("high", "H", 0.70), rec("mid", "M", 0.68)],
                &mut rng,
            );
            assert_eq!(ranked[2].entity_id, "low");
        }
    }

    #[test]
    fn test_rank_is_reproducible_with_pinned_seed() {
        let input = vec![
            rec("a", "A", 0.61),
            rec("b", "B", 0.60),
            rec("c", "C", 0.62),
        ];
        let first = rank(input.clone(), &mut StdRng::seed_from_u64(5));
        let second = rank(input, &mut StdRng::seed_from_u64(5));
        assert_eq!(first, second);
    }

    #[test]
    fn test_rank_does_not_touch_scores() {
        let mut rng = StdRng::seed_from_u64(1);
        let ranked = rank(vec![rec("a", "A", 0.4)], &mut rng);
        assert_eq!(ranked[0].relevance_score, 0.4);
    }

    #[test]
    fn test_dedup_by_title_key() {
        let deduped = dedup(vec![
            rec("1", "Dune", 0.9),
            rec("2", "  dune ", 0.8),
            rec("3", "Emma", 0.7),
        ]);
        assert_eq!(ids(&deduped), vec!["1", "3"]);
    }

    #[test]
    fn test_dedup_by_entity_id() {
        let deduped = dedup(vec![
            rec("1", "Dune", 0.9),
            rec("1", "Dune Messiah", 0.8),
        ]);
        assert_eq!(ids(&deduped), vec!["1"]);
    }

    #[test]
    fn test_merge_ranked_first_occurrence_wins() {
        let mut rng = StdRng::seed_from_u64(3);
        let merged = merge_ranked(
            vec![rec("low", "Dune", 0.3), rec("high", "DUNE", 0.9)],
            10,
            &mut rng,
        );
        assert_eq!(ids(&merged), vec!["high"]);
    }

    #[test]
    fn test_merge_ranked_truncates() {
        let mut rng = StdRng::seed_from_u64(3);
        let recs = (0..30)
            .map(|i| rec(&i.to_string(), &format!("T{i}"), i as f64 / 30.0))
            .collect();
        let merged = merge_ranked(recs, USER_BASED_CAP, &mut rng);
        assert_eq!(merged.len(), USER_BASED_CAP);
    }

    fn rec_in(domain: Domain, id: &str, score: f64) -> Recommendation {
        Recommendation {
            entity_type: domain,
            ..rec(id, id, score)
        }
    }

    #[test]
    fn test_take_covering_reserves_each_domain() {
        let recs = vec![
            rec_in(Domain::Books, "b1", 0.9),
            rec_in(Domain::Books, "b2", 0.9),
            rec_in(Domain::Books, "b3", 0.8),
            rec_in(Domain::Movies, "m1", 0.4),
            rec_in(Domain::Books, "b4", 0.3),
            rec_in(Domain::Podcasts, "p1", 0.2),
        ];
        let kept = take_covering(recs, 4);
        assert_eq!(ids(&kept), vec!["b1", "b2", "m1", "p1"]);
    }

    #[test]
    fn test_take_covering_fewer_slots_than_domains() {
        let recs = vec![
            rec_in(Domain::Books, "b1", 0.9),
            rec_in(Domain::Books, "b2", 0.8),
            rec_in(Domain::Movies, "m1", 0.4),
            rec_in(Domain::Podcasts, "p1", 0.2),
        ];
        let kept = take_covering(recs, 2);
        assert_eq!(ids(&kept), vec!["b1", "m1"]);
    }

    #[test]
    fn test_take_covering_short_input_is_unchanged() {
        let recs = vec![rec_in(Domain::Books, "b1", 0.9), rec_in(Domain::Movies, "m1", 0.4)];
        assert_eq!(ids(&take_covering(recs, 10)), vec!["b1", "m1"]);
    }

    #[test]
    fn test_merge_ranked_keeps_outscored_domains() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut recs: Vec<Recommendation> = (0..20)
            .map(|i| rec_in(Domain::Books, &format!("b{i}"), 0.85))
            .collect();
        recs.push(rec_in(Domain::Movies, "m", 0.35));
        recs.push(rec_in(Domain::Podcasts, "p", 0.2));

        let merged = merge_ranked(recs, FRIEND_BASED_CAP, &mut rng);
        assert_eq!(merged.len(), FRIEND_BASED_CAP);
        let domains: HashSet<Domain> = merged.iter().map(|r| r.entity_type).collect();
        assert_eq!(domains.len(), 3);
        assert_eq!(merged[FRIEND_BASED_CAP - 1].entity_id, "p");
    }

    #[test]
    fn test_diversify_dedups_across_lists() {
        let mut rng = StdRng::seed_from_u64(9);
        let merged = diversify(
            vec![
                vec![rec("1", "Dune", 0.9), rec("2", "Emma", 0.5)],
                vec![rec("1", "Dune", 0.7), rec("3", "Ulysses", 0.4)],
            ],
            10,
            &mut rng,
        );
        let mut got = ids(&merged);
        got.sort();
        assert_eq!(got, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_diversify_truncates_to_limit() {
        let mut rng = StdRng::seed_from_u64(9);
        let merged = diversify(
            vec![vec![rec("1", "A", 0.9), rec("2", "B", 0.5), rec("3", "C", 0.4)]],
            2,
            &mut rng,
        );
        assert_eq!(merged.len(), 2);
    }
}
