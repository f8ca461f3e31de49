use std::collections::HashMap;

use tracing::debug;

use super::TRAY_SIZE;
use crate::models::Candidate;

/// Choose up to `target` candidates, biased toward USPS discount-tier
/// efficiency. In strict-150 mode, whole 150-piece multiples per ZIP5 are
/// taken first; the remainder and smaller groups fill greedily, then a ZIP3
/// regrouping pass mops up. Each group is shuffled so an oversized ZIP does
/// not always contribute the same geographic sub-cluster; pass a seeded
/// `rng` for reproducible selections.
pub fn select(
    candidates: &[Candidate],
    target: usize,
    strict_150: bool,
    rng: &mut fastrand::Rng,
) -> Vec<Candidate> {
    if target == 0 || candidates.is_empty() {
        return Vec::new();
    }

    let mut taken = vec![false; candidates.len()];
    let mut chosen: Vec<usize> = Vec::new();

    if strict_150 {
        for (_, mut members) in zip5_groups(candidates, &taken) {
            if chosen.len() >= target {
                break;
            }
            rng.shuffle(&mut members);
            let whole_trays = (members.len() / TRAY_SIZE) * TRAY_SIZE;
            if whole_trays == 0 {
                continue;
            }
            let room = target - chosen.len();
            for &idx in members.iter().take(whole_trays.min(room)) {
                taken[idx] = true;
                chosen.push(idx);
            }
        }
        debug!("Strict pass selected {} whole-tray pieces", chosen.len());
    }

    // Greedy fill over what is left, biggest ZIP5 groups first.
    if chosen.len() < target {
        for (_, mut members) in zip5_groups(candidates, &taken) {
            if chosen.len() >= target {
                break;
            }
            rng.shuffle(&mut members);
            for idx in members {
                if chosen.len() >= target {
                    break;
                }
                taken[idx] = true;
                chosen.push(idx);
            }
        }
    }

    // ZIP3 fallback for whatever remains (covers empty-ZIP stragglers).
    if chosen.len() < target {
        let mut by_zip3: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, candidate) in candidates.iter().enumerate() {
            if !taken[idx] {
                by_zip3
                    .entry(candidate.lead.zip3())
                    .or_default()
                    .push(idx);
            }
        }
        let mut groups: Vec<(String, Vec<usize>)> = by_zip3.into_iter().collect();
        groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then(a.0.cmp(&b.0)));
        for (_, mut members) in groups {
            if chosen.len() >= target {
                break;
            }
            rng.shuffle(&mut members);
            for idx in members {
                if chosen.len() >= target {
                    break;
                }
                taken[idx] = true;
                chosen.push(idx);
            }
        }
    }

    chosen.truncate(target);
    chosen.into_iter().map(|i| candidates[i].clone()).collect()
}

/// Group untaken candidate indices by ZIP5, ordered by `(size, non-empty)`
/// descending so big, concrete ZIPs come first and the empty-ZIP bucket
/// sorts last among equals.
fn zip5_groups(candidates: &[Candidate], taken: &[bool]) -> Vec<(String, Vec<usize>)> {
    let mut by_zip5: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, candidate) in candidates.iter().enumerate() {
        if !taken[idx] {
            by_zip5
                .entry(candidate.lead.zip5.clone())
                .or_default()
                .push(idx);
        }
    }
    let mut groups: Vec<(String, Vec<usize>)> = by_zip5.into_iter().collect();
    groups.sort_by(|a, b| {
        (b.1.len(), !b.0.is_empty())
            .cmp(&(a.1.len(), !a.0.is_empty()))
            .then(a.0.cmp(&b.0))
    });
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csvio::Row;
    use crate::models::{Lead, SourceBucket};
    use std::collections::HashSet;

    fn candidates(zip_counts: &[(&str, usize)]) -> Vec<Candidate> {
        let mut out = Vec::new();
        for (zip, count) in zip_counts {
            for i in 0..*count {
                out.push(Candidate {
                    lead: Lead {
                        address: format!("{} {} St", i, zip),
                        owner: format!("Owner {} {}", zip, i),
                        zip5: zip.to_string(),
                    },
                    bucket: SourceBucket::Pool,
                    source_row: Row::new(),
                });
            }
        }
        out
    }

    fn count_zip(selection: &[Candidate], zip: &str) -> usize {
        selection.iter().filter(|c| c.lead.zip5 == zip).count()
    }

    #[test]
    fn never_exceeds_target_and_never_repeats_a_lead() {
        let pool = candidates(&[("95835", 200), ("95833", 90), ("", 40)]);
        let mut rng = fastrand::Rng::with_seed(7);
        let selection = select(&pool, 120, true, &mut rng);
        assert_eq!(selection.len(), 120);
        let keys: HashSet<_> = selection.iter().map(|c| c.lead.key()).collect();
        assert_eq!(keys.len(), 120);
    }

    #[test]
    fn strict_mode_takes_whole_trays_first() {
        // 320 pieces in one ZIP5: the strict pass may take exactly 300.
        let pool = candidates(&[("95835", 320)]);
        let mut rng = fastrand::Rng::with_seed(42);
        let selection = select(&pool, 300, true, &mut rng);
        assert_eq!(selection.len(), 300);
        assert_eq!(count_zip(&selection, "95835"), 300);

        // With room for more, the remaining 20 arrive via the fill passes.
        let mut rng = fastrand::Rng::with_seed(42);
        let selection = select(&pool, 1000, true, &mut rng);
        assert_eq!(selection.len(), 320);
    }

    #[test]
    fn strict_mode_skips_groups_below_a_tray() {
        let pool = candidates(&[("95835", 149), ("95833", 150)]);
        let mut rng = fastrand::Rng::with_seed(1);
        let selection = select(&pool, 150, true, &mut rng);
        // only 95833 has a whole tray; strict pass fills the target with it
        assert_eq!(count_zip(&selection, "95833"), 150);
        assert_eq!(count_zip(&selection, "95835"), 0);
    }

    #[test]
    fn non_strict_fills_biggest_groups_first() {
        let pool = candidates(&[("95835", 100), ("95833", 10)]);
        let mut rng = fastrand::Rng::with_seed(9);
        let selection = select(&pool, 100, false, &mut rng);
        assert_eq!(count_zip(&selection, "95835"), 100);
    }

    #[test]
    fn empty_zip_sorts_behind_equal_sized_groups() {
        let pool = candidates(&[("", 50), ("95835", 50)]);
        let mut rng = fastrand::Rng::with_seed(3);
        let selection = select(&pool, 50, false, &mut rng);
        assert_eq!(count_zip(&selection, "95835"), 50);
    }

    #[test]
    fn zero_target_returns_empty() {
        let pool = candidates(&[("95835", 10)]);
        let mut rng = fastrand::Rng::with_seed(5);
        assert!(select(&pool, 0, true, &mut rng).is_empty());
    }

    #[test]
    fn seeded_rng_makes_selection_reproducible() {
        let pool = candidates(&[("95835", 400), ("95833", 200)]);
        let a = select(&pool, 250, true, &mut fastrand::Rng::with_seed(11));
        let b = select(&pool, 250, true, &mut fastrand::Rng::with_seed(11));
        let keys = |sel: &[Candidate]| sel.iter().map(|c| c.lead.key()).collect::<Vec<_>>();
        assert_eq!(keys(&a), keys(&b));
    }
}
