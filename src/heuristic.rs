//! "100 minus age" allocation rule of thumb
//!
//! Before retirement the risky share is (100 - age) / 100. After retirement
//! it keeps falling at half that slope, starting from the retirement value.

use crate::calibration::LifecycleAges;

/// (age, share) points for every age from `age_born` to `age_death` inclusive
pub fn hundred_minus_age_rule(ages: &LifecycleAges) -> Vec<(u32, f64)> {
    let retire_share = (100.0 - ages.age_retire as f64) / 100.0;
    (ages.age_born..=ages.age_death)
        .map(|age| {
            let share = if age <= ages.age_retire {
                (100.0 - age as f64) / 100.0
            } else {
                (100.0 - age as f64) / 100.0 * 0.5 + retire_share * 0.5
            };
            (age, share)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_rule_covers_whole_life() {
        let ages = LifecycleAges::default();
        let rule = hundred_minus_age_rule(&ages);
        assert_eq!(rule.len(), 81);
        assert_eq!(rule.first().unwrap().0, 20);
        assert_eq!(rule.last().unwrap().0, 100);
    }

    #[test]
    fn test_rule_values() {
        let ages = LifecycleAges::default();
        let rule = hundred_minus_age_rule(&ages);

        assert_abs_diff_eq!(rule[0].1, 0.80, epsilon = 1e-12);
        // Retirement age still on the first segment
        assert_abs_diff_eq!(rule[45].1, 0.35, epsilon = 1e-12);
        // Half slope afterwards
        assert_abs_diff_eq!(rule[46].1, 0.345, epsilon = 1e-12);
        assert_abs_diff_eq!(rule[80].1, 0.175, epsilon = 1e-12);
    }

    #[test]
    fn test_rule_is_non_increasing() {
        let ages = LifecycleAges::default();
        let rule = hundred_minus_age_rule(&ages);
        assert!(rule.windows(2).all(|w| w[1].1 <= w[0].1));

        let steps: Vec<f64> = rule.windows(2).map(|w| w[0].1 - w[1].1).collect();
        assert_abs_diff_eq!(steps[0], 0.01, epsilon = 1e-12);
        assert_abs_diff_eq!(steps[79], 0.005, epsilon = 1e-12);
    }

    #[test]
    fn test_rule_starts_at_one_from_age_zero() {
        let ages = LifecycleAges {
            age_born: 0,
            age_retire: 65,
            age_death: 100,
        };
        let rule = hundred_minus_age_rule(&ages);
        assert_eq!(rule[0], (0, 1.0));
    }
}
