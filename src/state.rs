/*!

The closed enumerations that make up a person's state, plus the labels used by parameter
tables and accounting.

Every enumeration is declared with [`define_state!`], which gives it one canonical snake_case
name per variant. That name is used for `Display`, `FromStr`, and serde, so configuration
files, trace output, and log lines all agree. Variants are declared in their natural order
(for fibrosis, least to most severe), and the derived `Ord` follows that order.

*/

use crate::error::HepceError;

/// Declares a closed state enumeration with a single name table.
///
/// ```
/// hepce_core::define_state!(
///     /// Weather on a given cycle.
///     Weather {
///         Sunny => "sunny",
///         Raining => "raining",
///     }
/// );
/// assert_eq!(Weather::Raining.name(), "raining");
/// assert_eq!("sunny".parse::<Weather>().unwrap(), Weather::Sunny);
/// assert_eq!(Weather::COUNT, 2);
/// ```
#[macro_export]
macro_rules! define_state {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(
            Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
            $crate::serde::Serialize, $crate::serde::Deserialize
        )]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
            pub const COUNT: usize = $name::ALL.len();

            #[must_use]
            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            /// Position in declaration order, for per-variant arrays.
            #[must_use]
            pub fn index(self) -> usize {
                self as usize
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.name())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::error::HepceError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok($name::$variant),)+
                    _ => Err($crate::error::HepceError::UnknownStateName {
                        kind: stringify!($name),
                        name: s.to_string(),
                    }),
                }
            }
        }
    };
}

define_state!(
    InfectionType {
        Hcv => "hcv",
        Hiv => "hiv",
    }
);

define_state!(
    Hcv {
        None => "none",
        Acute => "acute",
        Chronic => "chronic",
    }
);

define_state!(
    /// HIV status, split by CD4 count (high/low) and viral suppression.
    Hiv {
        None => "none",
        HighUnsuppressed => "hi_un",
        HighSuppressed => "hi_su",
        LowUnsuppressed => "lo_un",
        LowSuppressed => "lo_su",
    }
);

define_state!(
    DeathReason {
        NotApplicable => "na",
        Background => "background",
        Liver => "liver",
        Infection => "infection",
        Age => "age",
        Overdose => "overdose",
        Hiv => "hiv",
    }
);

define_state!(
    /// Drug-use history.
    Behavior {
        Never => "never",
        FormerNoninjection => "former_noninjection",
        FormerInjection => "former_injection",
        Noninjection => "noninjection",
        Injection => "injection",
    }
);

define_state!(
    LinkageType {
        NotApplicable => "na",
        Background => "background",
        Intervention => "intervention",
    }
);

define_state!(
    LinkageState {
        Never => "never",
        Linked => "linked",
        Unlinked => "unlinked",
    }
);

define_state!(
    /// True liver fibrosis stage. `None` means the person has never been infected.
    FibrosisState {
        None => "none",
        F0 => "f0",
        F1 => "f1",
        F2 => "f2",
        F3 => "f3",
        F4 => "f4",
        Decomp => "decomp",
    }
);

define_state!(
    HccState {
        None => "none",
        Early => "early",
        Late => "late",
    }
);

define_state!(
    /// Fibrosis stage as observed by a clinician; coarser than [`FibrosisState`].
    MeasuredFibrosisState {
        None => "none",
        F01 => "f01",
        F23 => "f23",
        F4 => "f4",
        Decomp => "decomp",
    }
);

define_state!(
    /// Medication for opioid use disorder.
    Moud {
        None => "none",
        Current => "current",
        Post => "post",
    }
);

define_state!(
    Sex {
        Male => "male",
        Female => "female",
    }
);

define_state!(
    PregnancyState {
        NotApplicable => "na",
        None => "none",
        Pregnant => "pregnant",
        Postpartum => "postpartum",
    }
);

define_state!(
    ScreeningChannel {
        Background => "background",
        Intervention => "intervention",
    }
);

define_state!(
    ScreeningTest {
        Ab => "ab",
        Rna => "rna",
    }
);

define_state!(
    InterventionType {
        None => "none",
        OneTime => "one_time",
        Periodic => "periodic",
    }
);

define_state!(
    /// How two staging results are combined.
    MultitestResultMethod {
        Latest => "latest",
        Maximum => "maximum",
    }
);

define_state!(
    /// How simultaneous utility weights combine into one weight.
    UtilityMode {
        Min => "min",
        Mult => "mult",
    }
);

define_state!(
    CostCategory {
        Misc => "misc",
        Behavior => "behavior",
        Screening => "screening",
        Linking => "linking",
        Staging => "staging",
        Liver => "liver",
        Treatment => "treatment",
        Background => "background",
        Hiv => "hiv",
    }
);

define_state!(
    UtilityCategory {
        Behavior => "behavior",
        Liver => "liver",
        Treatment => "treatment",
        Background => "background",
        Hiv => "hiv",
    }
);

impl Hcv {
    #[must_use]
    pub fn is_infected(self) -> bool {
        self != Hcv::None
    }
}

impl Hiv {
    #[must_use]
    pub fn is_infected(self) -> bool {
        self != Hiv::None
    }

    #[must_use]
    pub fn is_suppressed(self) -> bool {
        matches!(self, Hiv::HighSuppressed | Hiv::LowSuppressed)
    }

    #[must_use]
    pub fn has_high_cd4(self) -> bool {
        matches!(self, Hiv::HighUnsuppressed | Hiv::HighSuppressed)
    }

    #[must_use]
    pub fn suppressed(self) -> Hiv {
        match self {
            Hiv::HighUnsuppressed => Hiv::HighSuppressed,
            Hiv::LowUnsuppressed => Hiv::LowSuppressed,
            other => other,
        }
    }

    #[must_use]
    pub fn unsuppressed(self) -> Hiv {
        match self {
            Hiv::HighSuppressed => Hiv::HighUnsuppressed,
            Hiv::LowSuppressed => Hiv::LowUnsuppressed,
            other => other,
        }
    }

    #[must_use]
    pub fn with_high_cd4(self) -> Hiv {
        match self {
            Hiv::LowUnsuppressed => Hiv::HighUnsuppressed,
            Hiv::LowSuppressed => Hiv::HighSuppressed,
            other => other,
        }
    }

    #[must_use]
    pub fn with_low_cd4(self) -> Hiv {
        match self {
            Hiv::HighUnsuppressed => Hiv::LowUnsuppressed,
            Hiv::HighSuppressed => Hiv::LowSuppressed,
            other => other,
        }
    }
}

impl Behavior {
    /// Currently using drugs.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Behavior::Noninjection | Behavior::Injection)
    }
}

impl FibrosisState {
    /// The next stage of progression, or `None` at the end of the chain (and for the
    /// never-infected state, which does not progress).
    #[must_use]
    pub fn next(self) -> Option<FibrosisState> {
        match self {
            FibrosisState::F0 => Some(FibrosisState::F1),
            FibrosisState::F1 => Some(FibrosisState::F2),
            FibrosisState::F2 => Some(FibrosisState::F3),
            FibrosisState::F3 => Some(FibrosisState::F4),
            FibrosisState::F4 => Some(FibrosisState::Decomp),
            FibrosisState::Decomp | FibrosisState::None => None,
        }
    }

    #[must_use]
    pub fn is_cirrhotic(self) -> bool {
        matches!(self, FibrosisState::F4 | FibrosisState::Decomp)
    }
}

impl MeasuredFibrosisState {
    #[must_use]
    pub fn is_cirrhotic(self) -> bool {
        matches!(self, MeasuredFibrosisState::F4 | MeasuredFibrosisState::Decomp)
    }
}

impl HccState {
    #[must_use]
    pub fn next(self) -> Option<HccState> {
        match self {
            HccState::None => Some(HccState::Early),
            HccState::Early => Some(HccState::Late),
            HccState::Late => None,
        }
    }
}

impl From<ScreeningChannel> for LinkageType {
    fn from(channel: ScreeningChannel) -> Self {
        match channel {
            ScreeningChannel::Background => LinkageType::Background,
            ScreeningChannel::Intervention => LinkageType::Intervention,
        }
    }
}

impl Default for UtilityMode {
    fn default() -> Self {
        UtilityMode::Mult
    }
}

impl Default for InterventionType {
    fn default() -> Self {
        InterventionType::None
    }
}

impl Default for MultitestResultMethod {
    fn default() -> Self {
        MultitestResultMethod::Latest
    }
}

/// Parses a list of names, as found in eligibility settings.
pub fn parse_names<T>(names: &[&str]) -> Result<Vec<T>, HepceError>
where
    T: std::str::FromStr<Err = HepceError>,
{
    names.iter().map(|name| name.parse()).collect()
}
