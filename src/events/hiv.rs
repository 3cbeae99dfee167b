use super::{CycleEffect, Transition, care};
use crate::{
    error::HepceError,
    parameters::{
        Parameters,
        keys::{DemographicKey, HivStateKey, HivUtilityKey},
    },
    people::Person,
    random::Sampler,
    state::{CostCategory, Hiv, InfectionType, LinkageState, UtilityCategory},
};

const HIV: InfectionType = InfectionType::Hiv;

/// New infections and CD4 decline, then the cost and utility of the person's HIV state.
pub(super) fn infection(
    person: &mut Person,
    sampler: &mut Sampler,
    parameters: &Parameters,
    effect: &mut CycleEffect,
) -> Result<(), HepceError> {
    let hiv = &parameters.hiv;
    match person.hiv() {
        Hiv::None => {
            let incidence = hiv
                .incidence
                .require("hiv.incidence", &DemographicKey::of(person))?;
            if sampler.bernoulli(incidence.probability) {
                person.infect_hiv();
                effect.transition(Transition::Hiv(person.hiv()));
            }
        }
        Hiv::HighUnsuppressed => {
            if sampler.bernoulli(hiv.cd4_decline_probability) {
                person.set_hiv(Hiv::LowUnsuppressed);
                effect.transition(Transition::Hiv(Hiv::LowUnsuppressed));
            }
        }
        Hiv::HighSuppressed | Hiv::LowUnsuppressed | Hiv::LowSuppressed => {}
    }

    if person.hiv().is_infected() {
        let impact = hiv
            .impacts
            .require("hiv.impacts", &HivStateKey { hiv: person.hiv() })?;
        effect.cost(CostCategory::Hiv, impact.cost);
        effect.utility(UtilityCategory::Hiv, impact.utility);
    }
    Ok(())
}

/// Antiretroviral treatment. Suppression comes after `suppression_cycles` on treatment and a
/// low CD4 count recovers after `restore_high_cd4_cycles`; withdrawing loses suppression.
pub(super) fn treatment(
    person: &mut Person,
    sampler: &mut Sampler,
    parameters: &Parameters,
    effect: &mut CycleEffect,
) -> Result<(), HepceError> {
    let treatment = &parameters.hiv.treatment;
    let course = &parameters.hiv.course;
    if person.link_state(HIV) != LinkageState::Linked {
        return Ok(());
    }
    if care::lost_to_follow_up(person, sampler, HIV, treatment, effect) {
        return Ok(());
    }
    care::charge_visit(person, HIV, treatment, effect);

    if !person.in_treatment(HIV) {
        if !care::is_eligible(person, HIV, treatment)
            || !sampler.bernoulli(treatment.initiation_probability)
        {
            return Ok(());
        }
        person.initiate_treatment(HIV);
        effect.transition(Transition::TreatmentStarted {
            infection: HIV,
            retreatment: false,
        });
    }

    effect.cost(CostCategory::Hiv, course.cost);
    let mut utility_cap = 1.0;
    if sampler.bernoulli(course.toxicity_probability) {
        person.record_toxic_reaction(HIV);
        effect.cost(CostCategory::Hiv, treatment.toxicity_cost);
        effect.transition(Transition::ToxicReaction(HIV));
        utility_cap = treatment.toxicity_utility;
    }

    if sampler.bernoulli(course.withdrawal_probability) {
        person.withdraw_treatment(HIV);
        person.set_hiv(person.hiv().unsuppressed());
        effect.transition(Transition::Withdrew(HIV));
        care::end_engagement(person, HIV, effect);
    } else {
        let cycles_on_treatment = person
            .cycles_since(person.treatment_details(HIV).time_of_treatment_initiation)
            .map_or(0, |since| since + 1);
        let before = person.hiv();
        if cycles_on_treatment >= course.suppression_cycles {
            person.set_hiv(person.hiv().suppressed());
        }
        if cycles_on_treatment >= course.restore_high_cd4_cycles {
            person.set_hiv(person.hiv().with_high_cd4());
        }
        if person.hiv() != before {
            effect.transition(Transition::Hiv(person.hiv()));
        }
    }

    let key = HivUtilityKey {
        on_treatment: person.in_treatment(HIV),
        high_cd4: person.hiv().has_high_cd4(),
    };
    let utility = parameters.hiv.utilities.require("hiv.utilities", &key)?;
    effect.utility(UtilityCategory::Hiv, utility.utility.min(utility_cap));
    Ok(())
}
