//! Rejection causes reported by the external lending system as revert codes.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// 112: the reserve is not registered or not active.
    InvalidReserve,
    /// 113: the borrow asset is not an accepted stable coin.
    InvalidStableCoin,
    /// 114: the collateral amount is zero or not accepted.
    InvalidCollateralAmount,
    /// 115: the requested borrow amount is not accepted.
    InvalidBorrowAmount,
    /// 118: the (vault, user) pair is not whitelisted.
    NotWhitelisted,
    Unrecognized(String),
}

impl RejectionReason {
    /// The revert code the external system uses for this reason.
    pub fn code(&self) -> &str {
        match self {
            RejectionReason::InvalidReserve => "112",
            RejectionReason::InvalidStableCoin => "113",
            RejectionReason::InvalidCollateralAmount => "114",
            RejectionReason::InvalidBorrowAmount => "115",
            RejectionReason::NotWhitelisted => "118",
            RejectionReason::Unrecognized(code) => code,
        }
    }

    pub fn is_authorization(&self) -> bool {
        matches!(self, RejectionReason::NotWhitelisted)
    }
}

impl FromStr for RejectionReason {
    type Err = std::convert::Infallible;

    /// Accepts a bare code or a full revert message ending in the code,
    /// e.g. `"reverted with reason string '118'"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s
            .trim()
            .trim_end_matches(['\'', '"'])
            .rsplit(|c: char| !c.is_ascii_digit())
            .next()
            .unwrap_or_default();

        Ok(match code {
            "112" => RejectionReason::InvalidReserve,
            "113" => RejectionReason::InvalidStableCoin,
            "114" => RejectionReason::InvalidCollateralAmount,
            "115" => RejectionReason::InvalidBorrowAmount,
            "118" => RejectionReason::NotWhitelisted,
            "" => RejectionReason::Unrecognized(s.trim().to_string()),
            other => RejectionReason::Unrecognized(other.to_string()),
        })
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectionReason::InvalidReserve => write!(f, "invalid reserve (112)"),
            RejectionReason::InvalidStableCoin => write!(f, "invalid stable coin (113)"),
            RejectionReason::InvalidCollateralAmount => {
                write!(f, "invalid collateral amount (114)")
            }
            RejectionReason::InvalidBorrowAmount => write!(f, "invalid borrow amount (115)"),
            RejectionReason::NotWhitelisted => write!(f, "vault user not whitelisted (118)"),
            RejectionReason::Unrecognized(code) => write!(f, "unrecognized rejection {}", code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_codes() {
        assert_eq!("112".parse(), Ok(RejectionReason::InvalidReserve));
        assert_eq!("113".parse(), Ok(RejectionReason::InvalidStableCoin));
        assert_eq!("114".parse(), Ok(RejectionReason::InvalidCollateralAmount));
        assert_eq!("115".parse(), Ok(RejectionReason::InvalidBorrowAmount));
        assert_eq!("118".parse(), Ok(RejectionReason::NotWhitelisted));
    }

    #[test]
    fn test_parse_revert_message() {
        let reason: RejectionReason = "VM Exception: reverted with reason string '118'"
            .parse()
            .unwrap();
        assert_eq!(reason, RejectionReason::NotWhitelisted);
        assert!(reason.is_authorization());
    }

    #[test]
    fn test_unknown_code_is_preserved() {
        let reason: RejectionReason = "77".parse().unwrap();
        assert_eq!(reason, RejectionReason::Unrecognized("77".to_string()));
        assert_eq!(reason.code(), "77");
        assert!(!reason.is_authorization());
    }

    #[test]
    fn test_unknown_code_extracted_from_revert_message() {
        let reason: RejectionReason = "reverted with reason string '77'".parse().unwrap();
        assert_eq!(reason.code(), "77");

        let reason: RejectionReason = "execution reverted".parse().unwrap();
        assert_eq!(reason.code(), "execution reverted");
    }

    #[test]
    fn test_code_roundtrip() {
        for code in ["112", "113", "114", "115", "118"] {
            let reason: RejectionReason = code.parse().unwrap();
            assert_eq!(reason.code(), code);
        }
    }
}
