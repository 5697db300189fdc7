use yelp_core::Cap;

/// Whether a pass may take another record after `processed` have been counted.
pub fn should_continue(processed: u64, cap: Cap) -> bool {
    match cap {
        Cap::Unbounded => true,
        Cap::Skip => false,
        Cap::Limit(limit) => processed < limit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_always_continues() {
        assert!(should_continue(0, Cap::Unbounded));
        assert!(should_continue(u64::MAX, Cap::Unbounded));
    }

    #[test]
    fn skip_never_starts() {
        assert!(!should_continue(0, Cap::Skip));
    }

    #[test]
    fn limit_stops_at_cap() {
        let cap = Cap::from_signed(3);
        assert!(should_continue(0, cap));
        assert!(should_continue(2, cap));
        assert!(!should_continue(3, cap));
        assert!(!should_continue(4, cap));
    }
}
