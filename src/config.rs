//! Calling and resolution settings.

/// The default minimum supporting count for any call.
pub const DEFAULT_MIN_DEPTH: u32 = 2;

/// The default minimum fraction of position evidence for a base call.
pub const DEFAULT_MIN_PURITY: f64 = 0.5;

/// The default number of alignment columns ignored at each end of a hit.
pub const DEFAULT_TRIM: usize = 0;

/// The default runner-up score ratio still treated as a tie.
pub const DEFAULT_INFIDELITY: f64 = 1.0;

/// An error related to building a [`Config`].
#[derive(Debug, PartialEq)]
pub enum Error {
    /// The minimum depth was zero.
    ZeroMinDepth,

    /// The minimum purity was outside of `[0, 1]`.
    InvalidMinPurity(f64),

    /// The infidelity was outside of `(0, 1]`.
    InvalidInfidelity(f64),

    /// A mate suffix was empty.
    EmptySuffix,

    /// Both mate suffixes were the same.
    IdenticalSuffixes(String),

    /// One mate suffix ends with the other, so mates cannot be told apart.
    OverlappingSuffixes(String, String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ZeroMinDepth => write!(f, "minimum depth must be at least 1"),
            Error::InvalidMinPurity(purity) => {
                write!(f, "minimum purity must be within [0, 1], found {purity}")
            }
            Error::InvalidInfidelity(infidelity) => {
                write!(f, "infidelity must be within (0, 1], found {infidelity}")
            }
            Error::EmptySuffix => write!(f, "mate suffixes cannot be empty"),
            Error::IdenticalSuffixes(suffix) => {
                write!(f, "mate suffixes must differ, both are `{suffix}`")
            }
            Error::OverlappingSuffixes(a, b) => write!(
                f,
                "mate suffix `{a}` ends with mate suffix `{b}`, so mates cannot be told apart"
            ),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// How mate pairs are recognized and which placements of them are valid.
#[derive(Clone, Debug, PartialEq)]
pub struct Pairing {
    /// The suffix of the first mate's read id.
    suffix1: String,

    /// The suffix of the second mate's read id.
    suffix2: String,

    /// Whether mates are expected to align in the same orientation.
    same_direction: bool,

    /// The largest allowed separation between mates.
    max_pair_sep: i64,
}

impl Pairing {
    /// Creates a new [`Pairing`].
    ///
    /// The suffixes are validated when the [`Config`] is built.
    pub fn new(
        suffix1: impl Into<String>,
        suffix2: impl Into<String>,
        same_direction: bool,
        max_pair_sep: i64,
    ) -> Self {
        Self {
            suffix1: suffix1.into(),
            suffix2: suffix2.into(),
            same_direction,
            max_pair_sep,
        }
    }

    /// Paired-end Illumina reads: `/1` and `/2`, in opposite orientations.
    ///
    /// # Examples
    ///
    /// ```
    /// use refcons::config::Pairing;
    ///
    /// let pairing = Pairing::illumina(500);
    /// assert_eq!(pairing.suffix1(), "/1");
    /// assert_eq!(pairing.suffix2(), "/2");
    /// assert!(!pairing.same_direction());
    /// ```
    pub fn illumina(max_pair_sep: i64) -> Self {
        Self::new("/1", "/2", false, max_pair_sep)
    }

    /// Mate-paired SOLiD reads: `_R3` and `_F3`, in the same orientation.
    pub fn solid(max_pair_sep: i64) -> Self {
        Self::new("_R3", "_F3", true, max_pair_sep)
    }

    /// Gets the suffix of the first mate's read id.
    pub fn suffix1(&self) -> &str {
        &self.suffix1
    }

    /// Gets the suffix of the second mate's read id.
    pub fn suffix2(&self) -> &str {
        &self.suffix2
    }

    /// Gets whether mates are expected to align in the same orientation.
    pub fn same_direction(&self) -> bool {
        self.same_direction
    }

    /// Gets the largest allowed separation between mates.
    pub fn max_pair_sep(&self) -> i64 {
        self.max_pair_sep
    }

    /// Checks that mates can be told apart by their suffixes.
    fn validate(&self) -> Result<()> {
        if self.suffix1.is_empty() || self.suffix2.is_empty() {
            return Err(Error::EmptySuffix);
        }

        if self.suffix1 == self.suffix2 {
            return Err(Error::IdenticalSuffixes(self.suffix1.clone()));
        }

        if self.suffix1.ends_with(&self.suffix2) {
            return Err(Error::OverlappingSuffixes(
                self.suffix1.clone(),
                self.suffix2.clone(),
            ));
        }

        if self.suffix2.ends_with(&self.suffix1) {
            return Err(Error::OverlappingSuffixes(
                self.suffix2.clone(),
                self.suffix1.clone(),
            ));
        }

        Ok(())
    }
}

/// Calling and resolution settings for one run.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// The minimum supporting count for any call.
    min_depth: u32,

    /// The minimum fraction of position evidence for a base call.
    min_purity: f64,

    /// The number of alignment columns ignored at each end of a hit.
    trim: usize,

    /// The runner-up score ratio still treated as a tie.
    infidelity: f64,

    /// Whether base calls may use IUPAC ambiguity codes.
    ambiguity_codes: bool,

    /// The mate pairing, if reads are paired.
    pairing: Option<Pairing>,
}

impl Config {
    /// Gets the minimum supporting count for any call.
    pub fn min_depth(&self) -> u32 {
        self.min_depth
    }

    /// Gets the minimum fraction of position evidence for a base call.
    pub fn min_purity(&self) -> f64 {
        self.min_purity
    }

    /// Gets the number of alignment columns ignored at each end of a hit.
    pub fn trim(&self) -> usize {
        self.trim
    }

    /// Gets the runner-up score ratio still treated as a tie.
    pub fn infidelity(&self) -> f64 {
        self.infidelity
    }

    /// Gets whether base calls may use IUPAC ambiguity codes.
    pub fn ambiguity_codes(&self) -> bool {
        self.ambiguity_codes
    }

    /// Gets the mate pairing, if reads are paired.
    pub fn pairing(&self) -> Option<&Pairing> {
        self.pairing.as_ref()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_depth: DEFAULT_MIN_DEPTH,
            min_purity: DEFAULT_MIN_PURITY,
            trim: DEFAULT_TRIM,
            infidelity: DEFAULT_INFIDELITY,
            ambiguity_codes: true,
            pairing: None,
        }
    }
}

/// A builder for a [`Config`].
#[derive(Debug, Default)]
pub struct Builder {
    /// The config being built.
    inner: Config,
}

impl Builder {
    /// Sets the minimum supporting count for any call.
    pub fn min_depth(mut self, min_depth: u32) -> Self {
        self.inner.min_depth = min_depth;
        self
    }

    /// Sets the minimum fraction of position evidence for a base call.
    pub fn min_purity(mut self, min_purity: f64) -> Self {
        self.inner.min_purity = min_purity;
        self
    }

    /// Sets the number of alignment columns ignored at each end of a hit.
    pub fn trim(mut self, trim: usize) -> Self {
        self.inner.trim = trim;
        self
    }

    /// Sets the runner-up score ratio still treated as a tie.
    pub fn infidelity(mut self, infidelity: f64) -> Self {
        self.inner.infidelity = infidelity;
        self
    }

    /// Sets whether base calls may use IUPAC ambiguity codes.
    pub fn ambiguity_codes(mut self, ambiguity_codes: bool) -> Self {
        self.inner.ambiguity_codes = ambiguity_codes;
        self
    }

    /// Sets the mate pairing.
    pub fn pairing(mut self, pairing: Pairing) -> Self {
        self.inner.pairing = Some(pairing);
        self
    }

    /// Consumes `self` to attempt to build a [`Config`].
    ///
    /// # Examples
    ///
    /// ```
    /// use refcons::config::Builder;
    /// use refcons::config::Pairing;
    ///
    /// let config = Builder::default()
    ///     .min_depth(3)
    ///     .pairing(Pairing::solid(2000))
    ///     .try_build()?;
    ///
    /// assert_eq!(config.min_depth(), 3);
    /// assert_eq!(config.min_purity(), 0.5);
    /// assert_eq!(config.pairing().unwrap().suffix1(), "_R3");
    ///
    /// let err = Builder::default()
    ///     .pairing(Pairing::new("/1", "/1", false, 500))
    ///     .try_build()
    ///     .unwrap_err();
    /// assert_eq!(err.to_string(), "mate suffixes must differ, both are `/1`");
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_build(self) -> Result<Config> {
        let config = self.inner;

        if config.min_depth == 0 {
            return Err(Error::ZeroMinDepth);
        }

        if !(0.0..=1.0).contains(&config.min_purity) {
            return Err(Error::InvalidMinPurity(config.min_purity));
        }

        if !(config.infidelity > 0.0 && config.infidelity <= 1.0) {
            return Err(Error::InvalidInfidelity(config.infidelity));
        }

        if let Some(pairing) = &config.pairing {
            pairing.validate()?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let config = Builder::default().try_build()?;
        assert_eq!(config, Config::default());
        assert_eq!(config.min_depth(), 2);
        assert_eq!(config.trim(), 0);
        assert_eq!(config.infidelity(), 1.0);
        assert!(config.ambiguity_codes());
        assert!(config.pairing().is_none());
        Ok(())
    }

    #[test]
    fn test_zero_min_depth() {
        let err = Builder::default().min_depth(0).try_build().unwrap_err();
        assert_eq!(err.to_string(), "minimum depth must be at least 1");
    }

    #[test]
    fn test_invalid_min_purity() {
        let err = Builder::default().min_purity(1.5).try_build().unwrap_err();
        assert_eq!(
            err.to_string(),
            "minimum purity must be within [0, 1], found 1.5"
        );
    }

    #[test]
    fn test_invalid_infidelity() {
        let err = Builder::default().infidelity(0.0).try_build().unwrap_err();
        assert_eq!(err.to_string(), "infidelity must be within (0, 1], found 0");

        let err = Builder::default().infidelity(f64::NAN).try_build().unwrap_err();
        assert_eq!(err.to_string(), "infidelity must be within (0, 1], found NaN");
    }

    #[test]
    fn test_empty_suffix() {
        let err = Builder::default()
            .pairing(Pairing::new("", "/2", false, 500))
            .try_build()
            .unwrap_err();
        assert_eq!(err, Error::EmptySuffix);
    }

    #[test]
    fn test_overlapping_suffixes() {
        let err = Builder::default()
            .pairing(Pairing::new("/1", "a/1", false, 500))
            .try_build()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "mate suffix `a/1` ends with mate suffix `/1`, so mates cannot be told apart"
        );
    }

    #[test]
    fn test_presets_are_valid() {
        for pairing in [Pairing::illumina(500), Pairing::solid(500)] {
            assert!(Builder::default().pairing(pairing).try_build().is_ok());
        }
    }
}
