//! Ranking and truncation selection.

use std::cmp::Ordering;

use crate::schema::Creature;

/// Total order used for ranking: higher fitness first, then lower id first.
///
/// Unevaluated creatures rank below every evaluated one.
pub fn rank_order(a: &Creature, b: &Creature) -> Ordering {
    let fa = a.fitness.unwrap_or(f64::NEG_INFINITY);
    let fb = b.fitness.unwrap_or(f64::NEG_INFINITY);
    fb.total_cmp(&fa).then_with(|| a.id.cmp(&b.id))
}

/// Number of creatures removed from a population of `population` creatures
/// at `deletion_percentage` percent.
#[inline]
pub fn removal_count(population: usize, deletion_percentage: u32) -> usize {
    population * deletion_percentage as usize / 100
}

/// Sort `creatures` best first and split off the `removal_count` lowest
/// ranked ones, which are returned. The survivors stay in `creatures`, best
/// first.
///
/// Returns `None` if any creature has not been evaluated yet.
pub fn truncate_worst(creatures: &mut Vec<Creature>, deletion_percentage: u32) -> Option<Vec<Creature>> {
    if creatures.iter().any(|c| !c.is_evaluated()) {
        return None;
    }

    let removed = removal_count(creatures.len(), deletion_percentage);
    creatures.sort_by(rank_order);
    let cutoff = creatures.len() - removed;
    Some(creatures.split_off(cutoff))
}

/// Index of the best evaluated creature.
pub fn best_index(creatures: &[Creature]) -> Option<usize> {
    creatures
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_evaluated())
        .min_by(|(_, a), (_, b)| rank_order(a, b))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::schema::Move;

    fn creature(id: u64, fitness: f64) -> Creature {
        Creature {
            fitness: Some(fitness),
            ..Creature::new(id, vec![Move::N; 5], 0)
        }
    }

    #[test]
    fn test_removes_exact_count() {
        let mut creatures: Vec<_> = (0..100).map(|i| creature(i, i as f64)).collect();
        let removed = truncate_worst(&mut creatures, 80).unwrap();

        assert_eq!(removed.len(), 80);
        assert_eq!(creatures.len(), 20);
        assert_eq!(creatures[0].id, 99);
        assert!(creatures.iter().all(|c| c.id >= 80));
    }

    #[test]
    fn test_ties_keep_lower_ids() {
        let mut creatures: Vec<_> = (0..10).map(|i| creature(i, 1.0)).collect();
        let removed = truncate_worst(&mut creatures, 30).unwrap();

        let kept: Vec<u64> = creatures.iter().map(|c| c.id).collect();
        let gone: Vec<u64> = removed.iter().map(|c| c.id).collect();
        assert_eq!(kept, vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(gone, vec![7, 8, 9]);
    }

    #[test]
    fn test_unevaluated_rejected() {
        let mut creatures = vec![creature(0, 1.0), Creature::new(1, vec![Move::E; 5], 0)];
        assert!(truncate_worst(&mut creatures, 50).is_none());
        assert_eq!(creatures.len(), 2);
    }

    #[test]
    fn test_best_index() {
        let creatures = vec![
            creature(3, 2.0),
            creature(1, 5.0),
            creature(0, 5.0),
            Creature::new(9, vec![Move::E; 5], 0),
        ];
        assert_eq!(best_index(&creatures), Some(2));
        assert_eq!(best_index(&[Creature::new(9, vec![Move::E; 5], 0)]), None);
    }

    #[test]
    fn test_removal_count_floors() {
        assert_eq!(removal_count(100, 80), 80);
        assert_eq!(removal_count(101, 33), 33);
        assert_eq!(removal_count(999, 20), 199);
    }

    proptest! {
        #[test]
        fn prop_removed_never_outrank_survivors(
            fitness in prop::collection::vec(0u8..6, 100..300),
            percentage in 20u32..=80,
        ) {
            let mut creatures: Vec<_> = fitness
                .iter()
                .enumerate()
                .map(|(i, f)| creature(i as u64, *f as f64))
                .collect();
            let total = creatures.len();
            let best = creatures[best_index(&creatures).unwrap()].id;

            let removed = truncate_worst(&mut creatures, percentage).unwrap();

            prop_assert_eq!(removed.len(), total * percentage as usize / 100);
            prop_assert_eq!(creatures.len() + removed.len(), total);
            prop_assert_eq!(creatures[0].id, best);
            for kept in &creatures {
                for gone in &removed {
                    prop_assert_eq!(rank_order(kept, gone), Ordering::Less);
                }
            }
        }
    }
}
