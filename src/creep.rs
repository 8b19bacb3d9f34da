use crate::constants::*;
use crate::game::*;
use rand::rngs::StdRng;
use rand::Rng;

/// Declarative body recipe: a fixed head and tail around a repeated segment
/// grown as far as energy and the part ceiling allow.
pub struct SpawnBodyDefinition<'a> {
    pub maximum_energy: u32,
    pub minimum_repeat: Option<usize>,
    pub maximum_repeat: Option<usize>,
    pub pre_body: &'a [Part],
    pub repeat_body: &'a [Part],
    pub post_body: &'a [Part],
}

pub fn create_body(definition: &SpawnBodyDefinition) -> Result<Vec<Part>, ()> {
    let pre_body_cost = body_cost(definition.pre_body);
    let post_body_cost = body_cost(definition.post_body);

    let fixed_body_cost = pre_body_cost + post_body_cost;

    if fixed_body_cost > definition.maximum_energy {
        return Err(());
    }

    let fixed_body_length = definition.pre_body.len() + definition.post_body.len();

    if fixed_body_length > MAX_CREEP_SIZE {
        return Err(());
    }

    let repeat_body_cost = body_cost(definition.repeat_body);
    let remaining_available_energy = definition.maximum_energy - fixed_body_cost;

    let max_possible_repeat_by_cost = if repeat_body_cost > 0 {
        (remaining_available_energy / repeat_body_cost) as usize
    } else {
        0
    };

    let max_possible_repeat_by_length = if !definition.repeat_body.is_empty() {
        (MAX_CREEP_SIZE - fixed_body_length) / definition.repeat_body.len()
    } else {
        0
    };

    let max_possible_repeat = max_possible_repeat_by_cost.min(max_possible_repeat_by_length);

    if let Some(min_repeat) = definition.minimum_repeat {
        if max_possible_repeat < min_repeat {
            return Err(());
        }
    }

    let repeat_count = max_possible_repeat.clamp(
        definition.minimum_repeat.unwrap_or(0),
        definition.maximum_repeat.unwrap_or(usize::MAX),
    );

    let full_repeat_body = definition
        .repeat_body
        .iter()
        .cycle()
        .take(repeat_count * definition.repeat_body.len());

    let body = definition
        .pre_body
        .iter()
        .chain(full_repeat_body)
        .chain(definition.post_body.iter())
        .copied()
        .collect();

    Ok(body)
}

/// Trim a fixed loadout down to a budget by deleting random parts. Fails if
/// the trimmed body would have no offense or no mobility left.
pub fn trim_body_randomly(template: &[Part], maximum_energy: u32, rng: &mut StdRng) -> Result<Vec<Part>, ()> {
    let mut body: Vec<Part> = template.to_vec();

    while body_cost(&body) > maximum_energy && !body.is_empty() {
        let index = rng.random_range(0..body.len());
        body.remove(index);
    }

    let has_offense = body
        .iter()
        .any(|p| matches!(p, Part::Attack | Part::RangedAttack));
    let has_mobility = body.iter().any(|p| *p == Part::Move);

    if !has_offense || !has_mobility {
        return Err(());
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn body_grows_with_energy_and_respects_the_ceiling() {
        let definition = SpawnBodyDefinition {
            maximum_energy: 500,
            minimum_repeat: Some(1),
            maximum_repeat: None,
            pre_body: &[Part::Carry, Part::Move],
            repeat_body: &[Part::Work],
            post_body: &[],
        };

        let body = create_body(&definition).unwrap();

        // 500 - 100 fixed leaves room for exactly four work parts.
        assert_eq!(body.iter().filter(|p| **p == Part::Work).count(), 4);
        assert!(body.len() <= MAX_CREEP_SIZE);
    }

    #[test]
    fn unaffordable_minimum_is_rejected() {
        let definition = SpawnBodyDefinition {
            maximum_energy: 120,
            minimum_repeat: Some(1),
            maximum_repeat: None,
            pre_body: &[Part::Carry, Part::Move],
            repeat_body: &[Part::Work],
            post_body: &[],
        };

        assert!(create_body(&definition).is_err());
    }

    #[test]
    fn repeat_count_never_exceeds_the_part_ceiling() {
        let definition = SpawnBodyDefinition {
            maximum_energy: 1_000_000,
            minimum_repeat: Some(1),
            maximum_repeat: None,
            pre_body: &[],
            repeat_body: &[Part::Move],
            post_body: &[],
        };

        let body = create_body(&definition).unwrap();

        assert_eq!(body.len(), MAX_CREEP_SIZE);
    }

    #[test]
    fn trimming_keeps_offense_and_mobility_or_fails() {
        let template = [
            Part::Tough,
            Part::Tough,
            Part::Attack,
            Part::Attack,
            Part::Move,
            Part::Move,
        ];

        // The trim is random: any particular seed may gut the loadout, but
        // every accepted body must be affordable and still a viable fighter.
        let mut accepted = 0;

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);

            if let Ok(body) = trim_body_randomly(&template, 300, &mut rng) {
                accepted += 1;
                assert!(body_cost(&body) <= 300);
                assert!(body.iter().any(|p| *p == Part::Attack));
                assert!(body.iter().any(|p| *p == Part::Move));
            }
        }

        assert!(accepted > 0, "no seed produced a viable trimmed body");

        // A budget too small for even one attack and one move part can never
        // produce a viable fighter.
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert!(trim_body_randomly(&template, 60, &mut rng).is_err());
        }
    }
}
