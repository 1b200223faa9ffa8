use crate::contract::OptionKind;

/// Immediate exercise value: max(S - K, 0) for a call, max(K - S, 0) for a put.
#[inline]
pub fn intrinsic(kind: OptionKind, spot: f64, strike: f64) -> f64 {
    match kind {
        OptionKind::Call => (spot - strike).max(0.0),
        OptionKind::Put => (strike - spot).max(0.0),
    }
}

/// Payoff direction: +1 for call, -1 for put.
#[inline]
pub fn phi(kind: OptionKind) -> f64 {
    match kind {
        OptionKind::Call => 1.0,
        OptionKind::Put => -1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intrinsic() {
        assert_eq!(intrinsic(OptionKind::Call, 110.0, 100.0), 10.0);
        assert_eq!(intrinsic(OptionKind::Call, 90.0, 100.0), 0.0);
        assert_eq!(intrinsic(OptionKind::Put, 90.0, 100.0), 10.0);
        assert_eq!(intrinsic(OptionKind::Put, 110.0, 100.0), 0.0);
    }

    #[test]
    fn test_phi() {
        assert_eq!(phi(OptionKind::Call), 1.0);
        assert_eq!(phi(OptionKind::Put), -1.0);
    }
}
