//! Row values for the parameter tables.

use crate::parameters::table::{
    Validate, check_cost, check_partition, check_probability, check_utility,
};
use crate::state::{Behavior, MeasuredFibrosisState, Moud};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Probability {
    pub probability: f64,
}

impl Validate for Probability {
    fn validate(&self) -> Result<(), String> {
        check_probability("event", self.probability)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cost {
    pub cost: f64,
}

impl Validate for Cost {
    fn validate(&self) -> Result<(), String> {
        check_cost(self.cost)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Utility {
    pub utility: f64,
}

impl Validate for Utility {
    fn validate(&self) -> Result<(), String> {
        check_utility(self.utility)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostUtility {
    pub cost: f64,
    pub utility: f64,
}

impl CostUtility {
    /// No cost and full health.
    pub const NEUTRAL: CostUtility = CostUtility {
        cost: 0.0,
        utility: 1.0,
    };
}

impl Default for CostUtility {
    fn default() -> Self {
        CostUtility::NEUTRAL
    }
}

impl Validate for CostUtility {
    fn validate(&self) -> Result<(), String> {
        check_cost(self.cost)?;
        check_utility(self.utility)
    }
}

/// Background mortality and the standardized mortality ratio applied to it.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mortality {
    pub probability: f64,
    pub smr: f64,
}

impl Mortality {
    #[must_use]
    pub fn adjusted(&self) -> f64 {
        (self.probability * self.smr).clamp(0.0, 1.0)
    }
}

impl Validate for Mortality {
    fn validate(&self) -> Result<(), String> {
        check_probability("background mortality", self.probability)?;
        if !self.smr.is_finite() || self.smr < 0.0 {
            return Err(format!("SMR {} must be a non-negative number", self.smr));
        }
        Ok(())
    }
}

/// Next-cycle drug-use distribution.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BehaviorTransition {
    pub never: f64,
    pub former_noninjection: f64,
    pub former_injection: f64,
    pub noninjection: f64,
    pub injection: f64,
}

impl BehaviorTransition {
    /// Probabilities in `Behavior::ALL` order.
    #[must_use]
    pub fn probabilities(&self) -> [f64; Behavior::COUNT] {
        [
            self.never,
            self.former_noninjection,
            self.former_injection,
            self.noninjection,
            self.injection,
        ]
    }

    /// Stays in `behavior` with certainty.
    #[must_use]
    pub fn staying(behavior: Behavior) -> Self {
        let mut probabilities = [0.0; Behavior::COUNT];
        probabilities[behavior.index()] = 1.0;
        BehaviorTransition {
            never: probabilities[0],
            former_noninjection: probabilities[1],
            former_injection: probabilities[2],
            noninjection: probabilities[3],
            injection: probabilities[4],
        }
    }
}

impl Validate for BehaviorTransition {
    fn validate(&self) -> Result<(), String> {
        check_partition(&self.probabilities())
    }
}

/// Next-cycle MOUD distribution.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoudTransition {
    pub none: f64,
    pub current: f64,
    pub post: f64,
}

impl MoudTransition {
    /// Probabilities in `Moud::ALL` order.
    #[must_use]
    pub fn probabilities(&self) -> [f64; Moud::COUNT] {
        [self.none, self.current, self.post]
    }

    #[must_use]
    pub fn staying(moud: Moud) -> Self {
        MoudTransition {
            none: f64::from(u8::from(moud == Moud::None)),
            current: f64::from(u8::from(moud == Moud::Current)),
            post: f64::from(u8::from(moud == Moud::Post)),
        }
    }
}

impl Validate for MoudTransition {
    fn validate(&self) -> Result<(), String> {
        check_partition(&self.probabilities())
    }
}

/// Distribution of a staging test's result given the true stage.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StagingAccuracy {
    pub f01: f64,
    pub f23: f64,
    pub f4: f64,
    pub decomp: f64,
}

impl StagingAccuracy {
    /// The measurable outcomes, in the order of [`StagingAccuracy::probabilities`].
    pub const OUTCOMES: [MeasuredFibrosisState; 4] = [
        MeasuredFibrosisState::F01,
        MeasuredFibrosisState::F23,
        MeasuredFibrosisState::F4,
        MeasuredFibrosisState::Decomp,
    ];

    #[must_use]
    pub fn probabilities(&self) -> [f64; 4] {
        [self.f01, self.f23, self.f4, self.decomp]
    }

    /// A perfectly accurate test for a measured stage.
    #[must_use]
    pub fn exact(measured: MeasuredFibrosisState) -> Self {
        let hit = |state| f64::from(u8::from(measured == state));
        StagingAccuracy {
            f01: hit(MeasuredFibrosisState::F01),
            f23: hit(MeasuredFibrosisState::F23),
            f4: hit(MeasuredFibrosisState::F4),
            decomp: hit(MeasuredFibrosisState::Decomp),
        }
    }
}

impl Validate for StagingAccuracy {
    fn validate(&self) -> Result<(), String> {
        check_partition(&self.probabilities())
    }
}

/// A probability for each screening channel (or link type).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelProbability {
    pub background: f64,
    pub intervention: f64,
}

impl Validate for ChannelProbability {
    fn validate(&self) -> Result<(), String> {
        check_probability("background", self.background)?;
        check_probability("intervention", self.intervention)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PregnancyRates {
    pub pregnancy: f64,
    pub miscarriage: f64,
}

impl Validate for PregnancyRates {
    fn validate(&self) -> Result<(), String> {
        check_probability("pregnancy", self.pregnancy)?;
        check_probability("miscarriage", self.miscarriage)
    }
}

/// An HCV treatment course.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreatmentCourse {
    /// Cycles from initiation to completion.
    pub duration: u32,
    /// Cost per cycle on treatment.
    pub cost: f64,
    pub svr_probability: f64,
    pub toxicity_probability: f64,
    pub withdrawal_probability: f64,
}

impl Validate for TreatmentCourse {
    fn validate(&self) -> Result<(), String> {
        if self.duration == 0 {
            return Err("course duration must be positive".to_string());
        }
        check_cost(self.cost)?;
        check_probability("svr", self.svr_probability)?;
        check_probability("toxicity", self.toxicity_probability)?;
        check_probability("withdrawal", self.withdrawal_probability)
    }
}
