/*!

Cost and utility accounting.

Events report what they cost and how they change a person's quality of life through a
[`CycleEffect`]. The [`Accountant`] consumes each effect as soon as the event returns: costs are
charged at the discount factor of the person's current cycle, and utility weights replace the
weight of their category. Once a cycle's events are done, [`Accountant::close_cycle`] accrues one
cycle of utility and life span.

Discounting uses a per-cycle rate of `annual_rate / cycles_per_year` and a factor of
`1 / (1 + rate)^cycle` for the 1-based cycle index.

*/

use crate::{
    error::HepceError,
    events::CycleEffect,
    people::Person,
    state::{CostCategory, UtilityCategory, UtilityMode},
};
use serde::{Deserialize, Serialize};

/// Converts a probability over `time` cycles into a constant rate.
#[must_use]
pub fn probability_to_rate(probability: f64, time: f64) -> f64 {
    -(1.0 - probability).ln() / time
}

/// Converts a constant rate into the probability of at least one event over `time` cycles.
#[must_use]
pub fn rate_to_probability(rate: f64, time: f64) -> f64 {
    1.0 - (-rate * time).exp()
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Discounting {
    annual_rate: f64,
    cycles_per_year: u32,
}

impl Discounting {
    pub fn new(annual_rate: f64, cycles_per_year: u32) -> Result<Self, HepceError> {
        if !annual_rate.is_finite() || annual_rate < 0.0 {
            return Err(HepceError::invalid_config(format!(
                "discount rate must be a non-negative number, got {annual_rate}"
            )));
        }
        if cycles_per_year == 0 {
            return Err(HepceError::invalid_config("cycles per year must be positive"));
        }
        Ok(Discounting {
            annual_rate,
            cycles_per_year,
        })
    }

    #[must_use]
    pub fn none() -> Self {
        Discounting {
            annual_rate: 0.0,
            cycles_per_year: 12,
        }
    }

    #[must_use]
    pub fn per_cycle_rate(&self) -> f64 {
        self.annual_rate / f64::from(self.cycles_per_year)
    }

    #[must_use]
    pub fn factor(&self, cycle: u32) -> f64 {
        let rate = self.per_cycle_rate();
        if rate == 0.0 {
            return 1.0;
        }
        1.0 / (1.0 + rate).powf(f64::from(cycle))
    }

    #[must_use]
    pub fn discount(&self, value: f64, cycle: u32) -> f64 {
        value * self.factor(cycle)
    }
}

/// Nominal and discounted cost totals per category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostTracker {
    nominal: [f64; CostCategory::COUNT],
    discounted: [f64; CostCategory::COUNT],
}

impl Default for CostTracker {
    fn default() -> Self {
        CostTracker {
            nominal: [0.0; CostCategory::COUNT],
            discounted: [0.0; CostCategory::COUNT],
        }
    }
}

impl CostTracker {
    pub fn add(&mut self, category: CostCategory, nominal: f64, discounted: f64) {
        self.nominal[category.index()] += nominal;
        self.discounted[category.index()] += discounted;
    }

    #[must_use]
    pub fn nominal(&self, category: CostCategory) -> f64 {
        self.nominal[category.index()]
    }

    #[must_use]
    pub fn discounted(&self, category: CostCategory) -> f64 {
        self.discounted[category.index()]
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.nominal.iter().sum()
    }

    #[must_use]
    pub fn discounted_total(&self) -> f64 {
        self.discounted.iter().sum()
    }
}

/// The current utility weight of each category; a person starts at full health (1.0) in all of them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UtilityTracker {
    weights: [f64; UtilityCategory::COUNT],
}

impl Default for UtilityTracker {
    fn default() -> Self {
        UtilityTracker {
            weights: [1.0; UtilityCategory::COUNT],
        }
    }
}

impl UtilityTracker {
    /// Sets a category's weight, which must lie in `[0, 1]`.
    pub fn set(&mut self, category: UtilityCategory, weight: f64) -> Result<(), HepceError> {
        if !(0.0..=1.0).contains(&weight) {
            return Err(HepceError::invalid_parameter(
                format!("{category} utility"),
                format!("weight {weight} is outside [0, 1]"),
            ));
        }
        self.weights[category.index()] = weight;
        Ok(())
    }

    #[must_use]
    pub fn get(&self, category: UtilityCategory) -> f64 {
        self.weights[category.index()]
    }

    #[must_use]
    pub fn min(&self) -> f64 {
        self.weights.iter().copied().fold(1.0, f64::min)
    }

    #[must_use]
    pub fn mult(&self) -> f64 {
        if self.min() == 0.0 {
            return 0.0;
        }
        self.weights.iter().product()
    }

    #[must_use]
    pub fn combined(&self, mode: UtilityMode) -> f64 {
        match mode {
            UtilityMode::Min => self.min(),
            UtilityMode::Mult => self.mult(),
        }
    }
}

/// Quality-adjusted life accumulated so far, under both combination modes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LifetimeUtility {
    pub min_utility: f64,
    pub mult_utility: f64,
    pub discounted_min_utility: f64,
    pub discounted_mult_utility: f64,
}

impl LifetimeUtility {
    pub fn accrue(&mut self, utilities: &UtilityTracker, factor: f64) {
        let min = utilities.min();
        let mult = utilities.mult();
        self.min_utility += min;
        self.mult_utility += mult;
        self.discounted_min_utility += min * factor;
        self.discounted_mult_utility += mult * factor;
    }

    #[must_use]
    pub fn selected(&self, mode: UtilityMode) -> f64 {
        match mode {
            UtilityMode::Min => self.min_utility,
            UtilityMode::Mult => self.mult_utility,
        }
    }

    #[must_use]
    pub fn discounted(&self, mode: UtilityMode) -> f64 {
        match mode {
            UtilityMode::Min => self.discounted_min_utility,
            UtilityMode::Mult => self.discounted_mult_utility,
        }
    }
}

/// Applies event effects and per-cycle accruals to a person's accounts.
#[derive(Copy, Clone, Debug)]
pub struct Accountant {
    discounting: Discounting,
    mode: UtilityMode,
}

impl Accountant {
    #[must_use]
    pub fn new(discounting: Discounting, mode: UtilityMode) -> Self {
        Accountant { discounting, mode }
    }

    #[must_use]
    pub fn mode(&self) -> UtilityMode {
        self.mode
    }

    #[must_use]
    pub fn discounting(&self) -> &Discounting {
        &self.discounting
    }

    /// Charges the effect's costs at the current cycle's discount factor and records its utility weights.
    pub fn apply(&self, person: &mut Person, effect: &CycleEffect) -> Result<(), HepceError> {
        if !person.accepts_accounting() {
            return Ok(());
        }
        let factor = self.discounting.factor(person.current_cycle());
        let accounts = person.accounts_mut();
        for &(category, amount) in effect.costs() {
            accounts.costs.add(category, amount, amount * factor);
        }
        for &(category, weight) in effect.utilities() {
            accounts.utilities.set(category, weight)?;
        }
        Ok(())
    }

    /// Accrues one cycle of utility and life span. Nothing accrues for cycles after death.
    pub fn close_cycle(&self, person: &mut Person) {
        if !person.accepts_accounting() {
            return;
        }
        let factor = self.discounting.factor(person.current_cycle());
        let accounts = person.accounts_mut();
        accounts.lifetime_utility.accrue(&accounts.utilities, factor);
        accounts.life_span += 1;
        accounts.discounted_life_span += factor;
    }
}

/// A person's running totals, kept on the person so workers never share an accumulator.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Accounts {
    pub costs: CostTracker,
    pub utilities: UtilityTracker,
    pub lifetime_utility: LifetimeUtility,
    /// Cycles lived.
    pub life_span: u32,
    pub discounted_life_span: f64,
}
