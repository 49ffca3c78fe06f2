use std::collections::HashSet;

use crate::{
    models::{Domain, UserPreferenceProfile},
    services::{cascade::Signal, genres::GenreTagMapper},
};

/// Builds the first-tier signal for the friend-based pipeline.
///
/// Peers' labels for the domain are pooled (first spelling wins), and labels
/// the subject already holds are removed so only novel interests remain. With
/// nothing novel left, the domain's fallback labels minus the subject's are
/// used instead, and failing that the full fallback list.
pub fn peer_signal(
    subject: &UserPreferenceProfile,
    peers: &[UserPreferenceProfile],
    domain: Domain,
    mapper: &GenreTagMapper,
) -> Signal {
    let mut seen = HashSet::new();
    let mut novel = Vec::new();

    for peer in peers.iter().filter(|p| p.user_id != subject.user_id) {
        for label in peer.interests(domain) {
            let label = label.trim();
            if label.is_empty() || subject.has_interest(domain, label) {
                continue;
            }
            if seen.insert(label.to_lowercase()) {
                novel.push(label.to_string());
            }
        }
    }

    if !novel.is_empty() {
        return Signal::peers(novel);
    }

    let fallbacks = mapper.fallback_labels(domain);
    let unexplored: Vec<String> = fallbacks
        .iter()
        .filter(|l| !subject.has_interest(domain, l))
        .cloned()
        .collect();

    if unexplored.is_empty() {
        Signal::substituted(fallbacks.to_vec())
    } else {
        Signal::substituted(unexplored)
    }
}
