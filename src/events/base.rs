use super::{CycleEffect, Transition};
use crate::{
    error::HepceError,
    parameters::{
        Parameters,
        keys::{DemographicKey, HcvStateKey, HivStateKey, SubstanceKey},
    },
    people::Person,
    random::Sampler,
    state::{CostCategory, DeathReason, HccState, UtilityCategory},
};

/// Charges the background cost and utility of the person's age, sex, and drug use.
pub(super) fn aging(
    person: &Person,
    parameters: &Parameters,
    effect: &mut CycleEffect,
) -> Result<(), HepceError> {
    let impact = parameters
        .background
        .impacts
        .require("background.impacts", &DemographicKey::of(person))?;
    effect.cost(CostCategory::Background, impact.cost);
    effect.utility(UtilityCategory::Background, impact.utility);
    Ok(())
}

pub(super) fn death(
    person: &mut Person,
    sampler: &mut Sampler,
    parameters: &Parameters,
    effect: &mut CycleEffect,
) -> Result<(), HepceError> {
    if let Some(reason) = cause_of_death(person, sampler, parameters)? {
        person.set_death(reason);
        effect.transition(Transition::Died(reason));
    }
    Ok(())
}

/// Competing risks, checked in priority order; the first cause that fires wins. Each cause that
/// applies to the person takes its own draw.
fn cause_of_death(
    person: &mut Person,
    sampler: &mut Sampler,
    parameters: &Parameters,
) -> Result<Option<DeathReason>, HepceError> {
    let mortality = &parameters.mortality;

    if person.age() >= mortality.max_age {
        return Ok(Some(DeathReason::Age));
    }

    if person.currently_overdosing() {
        let fatal = mortality
            .fatal_overdose
            .require("mortality.fatal_overdose", &SubstanceKey::of(person))?;
        if sampler.bernoulli(fatal.probability) {
            return Ok(Some(DeathReason::Overdose));
        }
        person.end_overdose();
    }

    let background = parameters
        .background
        .mortality
        .require("background.mortality", &DemographicKey::of(person))?;
    if sampler.bernoulli(background.adjusted()) {
        return Ok(Some(DeathReason::Background));
    }

    let fibrosis = mortality.fibrosis_mortality(person.fibrosis_state(), person.hcv());
    let hcc = match person.hcc_details().hcc_state {
        HccState::None => 0.0,
        HccState::Early => mortality.hcc_early,
        HccState::Late => mortality.hcc_late,
    };
    if (fibrosis > 0.0 || hcc > 0.0) && sampler.bernoulli(1.0 - (1.0 - fibrosis) * (1.0 - hcc)) {
        return Ok(Some(DeathReason::Liver));
    }

    if person.hcv().is_infected() {
        let infection = mortality
            .infection
            .require("mortality.infection", &HcvStateKey { hcv: person.hcv() })?;
        if sampler.bernoulli(infection.probability) {
            return Ok(Some(DeathReason::Infection));
        }
    }

    if person.hiv().is_infected() {
        let hiv = mortality
            .hiv
            .require("mortality.hiv", &HivStateKey { hiv: person.hiv() })?;
        if sampler.bernoulli(hiv.probability) {
            return Ok(Some(DeathReason::Hiv));
        }
    }

    Ok(None)
}
