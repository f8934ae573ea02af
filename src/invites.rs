//! Invite quota arithmetic and email normalization.
//!
//! Remaining quota is either the explicit per-person assignation or the
//! configured base allowance, minus invites already sent, floored at zero.

/// Invite emails are stored trimmed and lower-cased so that
/// " uSeR@email.com " and "user@email.com" are the same recipient.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn remaining(base: i32, assignation: Option<i32>, sent: i64) -> i64 {
    let allowance = i64::from(assignation.unwrap_or(base));
    (allowance - sent).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_trims_and_lowercases() {
        assert_eq!(normalize_email(" uSeR@email.com "), "user@email.com");
        assert_eq!(normalize_email("user@email.com"), "user@email.com");
        assert_eq!(normalize_email("   "), "");
    }

    #[test]
    fn base_allowance_decreases_by_one_per_send() {
        let base = 5;
        for sent in 0..5 {
            assert_eq!(remaining(base, None, sent), 5 - sent);
        }
        assert_eq!(remaining(base, None, 5), 0);
    }

    #[test]
    fn exhausted_base_allowance_clamps_at_zero() {
        assert_eq!(remaining(5, None, 6), 0);
        assert_eq!(remaining(5, None, 100), 0);
    }

    #[test]
    fn assignation_overrides_the_base() {
        assert_eq!(remaining(5, Some(100), 0), 100);
        assert_eq!(remaining(5, Some(100), 3), 97);
    }

    #[test]
    fn negative_assignation_never_yields_negative_remaining() {
        assert_eq!(remaining(5, Some(-100), 0), 0);
        assert_eq!(remaining(5, Some(-1), 4), 0);
    }
}
