//! Answer-selection strategies for synthetic respondents

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// How a synthetic respondent picks an option position
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Any option, uniformly
    #[default]
    Uniform,
    /// Always the first option
    First,
    /// Always the last option
    Last,
    /// Uniformly among options that are neither first nor last;
    /// falls back to uniform when there are fewer than three options
    Inner,
}

impl Strategy {
    /// All strategies
    pub const ALL: [Strategy; 4] = [Self::Uniform, Self::First, Self::Last, Self::Inner];

    /// Pick a position in `0..option_count`
    ///
    /// `option_count` must be non-zero.
    pub fn pick<R: Rng + ?Sized>(self, option_count: usize, rng: &mut R) -> usize {
        debug_assert!(option_count > 0, "question without options");
        match self {
            Self::First => 0,
            Self::Last => option_count.saturating_sub(1),
            Self::Inner if option_count >= 3 => rng.gen_range(1..option_count - 1),
            Self::Uniform | Self::Inner => rng.gen_range(0..option_count.max(1)),
        }
    }

    /// Strategy name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Uniform => "uniform",
            Self::First => "first",
            Self::Last => "last",
            Self::Inner => "inner",
        }
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unrecognized strategy name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown strategy {0:?}")]
pub struct UnknownStrategy(pub String);

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownStrategy(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn fixed_strategies() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(Strategy::First.pick(5, &mut rng), 0);
        assert_eq!(Strategy::Last.pick(5, &mut rng), 4);
        assert_eq!(Strategy::Last.pick(1, &mut rng), 0);
    }

    #[test]
    fn inner_avoids_extremes() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let p = Strategy::Inner.pick(5, &mut rng);
            assert!((1..4).contains(&p));
        }
        for _ in 0..50 {
            assert!(Strategy::Inner.pick(2, &mut rng) < 2);
        }
    }

    #[test]
    fn uniform_reaches_every_option() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = [false; 4];
        for _ in 0..500 {
            seen[Strategy::Uniform.pick(4, &mut rng)] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn parse_names() {
        assert_eq!("INNER".parse::<Strategy>().unwrap(), Strategy::Inner);
        assert_eq!(Strategy::Last.to_string(), "last");
        assert!("sneaky".parse::<Strategy>().is_err());
    }
}
