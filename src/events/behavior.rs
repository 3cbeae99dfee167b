use super::{CycleEffect, Transition};
use crate::{
    error::HepceError,
    parameters::{
        Parameters,
        keys::{AgeKey, BehaviorImpactKey, BehaviorTransitionKey, MoudKey, SubstanceKey},
    },
    people::{Child, Person},
    random::Sampler,
    state::{Behavior, CostCategory, Hcv, Moud, PregnancyState, Sex, UtilityCategory},
};

pub(super) fn behavior_changes(
    person: &mut Person,
    sampler: &mut Sampler,
    parameters: &Parameters,
    effect: &mut CycleEffect,
) -> Result<(), HepceError> {
    let transition = parameters
        .behavior
        .transitions
        .require("behavior.transitions", &BehaviorTransitionKey::of(person))?;
    let next = Behavior::ALL[sampler.categorical(&transition.probabilities())?];
    let previous = person.behavior();
    person.set_behavior(next);
    if person.behavior() != previous {
        effect.transition(Transition::Behavior(next));
    }

    let impact = parameters.behavior.impacts.require(
        "behavior.impacts",
        &BehaviorImpactKey {
            sex: person.sex(),
            behavior: person.behavior(),
        },
    )?;
    effect.cost(CostCategory::Behavior, impact.cost);
    effect.utility(UtilityCategory::Behavior, impact.utility);
    Ok(())
}

/// MOUD applies to active users and to anyone already in or after treatment.
pub(super) fn moud(
    person: &mut Person,
    sampler: &mut Sampler,
    parameters: &Parameters,
    effect: &mut CycleEffect,
) -> Result<(), HepceError> {
    if !person.is_active_user() && person.moud() == Moud::None {
        return Ok(());
    }

    let transition = parameters
        .moud
        .transitions
        .require("moud.transitions", &SubstanceKey::of(person))?;
    let next = Moud::ALL[sampler.categorical(&transition.probabilities())?];
    let previous = person.moud();
    person.transition_moud(next);
    if person.moud() != previous {
        effect.transition(Transition::Moud(next));
    }

    let cost = parameters
        .moud
        .costs
        .require("moud.costs", &MoudKey { moud: person.moud() })?;
    effect.cost(CostCategory::Behavior, cost.cost);
    Ok(())
}

pub(super) fn overdose(
    person: &mut Person,
    sampler: &mut Sampler,
    parameters: &Parameters,
    effect: &mut CycleEffect,
) -> Result<(), HepceError> {
    if !person.is_active_user() {
        return Ok(());
    }
    let probability = parameters
        .overdose
        .probability
        .require("overdose.probability", &SubstanceKey::of(person))?;
    if sampler.bernoulli(probability.probability) {
        person.begin_overdose();
        effect.transition(Transition::OverdoseBegan);
    }
    Ok(())
}

/// Conception, pregnancy loss, delivery, and the end of the postpartum period.
///
/// The age window limits who can become pregnant; a pregnancy already underway runs to its end.
pub(super) fn pregnancy(
    person: &mut Person,
    sampler: &mut Sampler,
    parameters: &Parameters,
    effect: &mut CycleEffect,
) -> Result<(), HepceError> {
    let pregnancy = &parameters.pregnancy;
    if person.sex() != Sex::Female {
        return Ok(());
    }
    let since_change = person
        .cycles_since(person.pregnancy_details().time_of_pregnancy_change)
        .unwrap_or(u32::MAX);

    match person.pregnancy_state() {
        PregnancyState::NotApplicable => {}
        PregnancyState::Postpartum => {
            if since_change >= pregnancy.postpartum_cycles {
                person.end_postpartum();
                effect.transition(Transition::Pregnancy(PregnancyState::None));
            }
        }
        PregnancyState::Pregnant => {
            let rates = pregnancy
                .rates
                .require("pregnancy.rates", &AgeKey { age_years: person.age_years() })?;
            if since_change >= pregnancy.gestation_cycles {
                if sampler.bernoulli(rates.miscarriage) {
                    person.stillbirth();
                    effect.transition(Transition::Pregnancy(PregnancyState::Postpartum));
                } else {
                    let children = deliver(person, sampler, parameters);
                    person.birth(&children);
                    effect.transition(Transition::Births(children.len() as u32));
                }
            } else if sampler.bernoulli(rates.miscarriage) {
                person.miscarry();
                effect.transition(Transition::Pregnancy(PregnancyState::None));
            }
        }
        PregnancyState::None => {
            if person.age() < pregnancy.min_age || person.age() > pregnancy.max_age {
                return Ok(());
            }
            let rates = pregnancy
                .rates
                .require("pregnancy.rates", &AgeKey { age_years: person.age_years() })?;
            if sampler.bernoulli(rates.pregnancy) {
                person.impregnate();
                effect.transition(Transition::Pregnancy(PregnancyState::Pregnant));
            }
        }
    }
    Ok(())
}

fn deliver(person: &mut Person, sampler: &mut Sampler, parameters: &Parameters) -> Vec<Child> {
    let pregnancy = &parameters.pregnancy;
    let count = if sampler.bernoulli(pregnancy.multiple_delivery_probability) {
        2
    } else {
        1
    };

    let mut children = Vec::with_capacity(count);
    for _ in 0..count {
        let mut child = Child {
            hcv: Hcv::None,
            tested: false,
        };
        if person.hcv().is_infected() {
            person.add_infant_exposure();
            if sampler.bernoulli(pregnancy.vertical_hcv_transmission_probability) {
                child.hcv = Hcv::Chronic;
            }
            child.tested = sampler.bernoulli(pregnancy.infant_hcv_tested_probability);
        }
        children.push(child);
    }
    children
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        events::Event,
        parameters::values::{BehaviorTransition, MoudTransition},
        people::PersonInit,
        testing::{alive_person, parameters},
    };

    #[test]
    fn behavior_follows_the_transition_row() {
        let mut parameters = parameters();
        for row in parameters.behavior.transitions.values_mut() {
            *row = BehaviorTransition::staying(Behavior::FormerInjection);
        }
        for impact in parameters.behavior.impacts.values_mut() {
            impact.utility = 0.8;
        }
        let mut person =
            alive_person(PersonInit::new(300, Sex::Male).with_behavior(Behavior::Injection));
        let effect = Event::BehaviorChanges
            .execute(&mut person, &mut Sampler::new(3), &parameters)
            .unwrap();
        assert_eq!(person.behavior(), Behavior::FormerInjection);
        assert_eq!(
            effect.transitions(),
            &[Transition::Behavior(Behavior::FormerInjection)]
        );
        assert_eq!(effect.utility_for(UtilityCategory::Behavior), Some(0.8));
    }

    #[test]
    fn nobody_returns_to_never() {
        let mut parameters = parameters();
        for row in parameters.behavior.transitions.values_mut() {
            *row = BehaviorTransition::staying(Behavior::Never);
        }
        let mut person =
            alive_person(PersonInit::new(300, Sex::Male).with_behavior(Behavior::Noninjection));
        let effect = Event::BehaviorChanges
            .execute(&mut person, &mut Sampler::new(3), &parameters)
            .unwrap();
        assert_eq!(person.behavior(), Behavior::Noninjection);
        assert!(effect.transitions().is_empty());
    }

    #[test]
    fn moud_skips_people_who_do_not_use() {
        let mut parameters = parameters();
        for row in parameters.moud.transitions.values_mut() {
            *row = MoudTransition::staying(Moud::Current);
        }
        let mut sampler = Sampler::new(3);
        let mut never = alive_person(PersonInit::new(300, Sex::Male));
        Event::Moud.execute(&mut never, &mut sampler, &parameters).unwrap();
        assert_eq!(never.moud(), Moud::None);
        assert_eq!(sampler.draws(), 0);

        let mut user =
            alive_person(PersonInit::new(300, Sex::Male).with_behavior(Behavior::Injection));
        for row in parameters.moud.costs.values_mut() {
            row.cost = 40.0;
        }
        let effect = Event::Moud.execute(&mut user, &mut sampler, &parameters).unwrap();
        assert_eq!(user.moud(), Moud::Current);
        assert_eq!(effect.costs(), &[(CostCategory::Behavior, 40.0)]);
    }

    #[test]
    fn overdose_only_for_active_users() {
        let mut parameters = parameters();
        for row in parameters.overdose.probability.values_mut() {
            row.probability = 1.0;
        }
        let mut former = alive_person(
            PersonInit::new(300, Sex::Male).with_behavior(Behavior::FormerInjection),
        );
        Event::Overdose
            .execute(&mut former, &mut Sampler::new(3), &parameters)
            .unwrap();
        assert!(!former.currently_overdosing());

        let mut active =
            alive_person(PersonInit::new(300, Sex::Male).with_behavior(Behavior::Injection));
        Event::Overdose
            .execute(&mut active, &mut Sampler::new(3), &parameters)
            .unwrap();
        assert!(active.currently_overdosing());
        assert_eq!(active.num_overdoses(), 1);
    }

    #[test]
    fn pregnancy_runs_to_delivery_and_postpartum() {
        let mut parameters = parameters();
        for row in parameters.pregnancy.rates.values_mut() {
            row.pregnancy = 1.0;
        }
        parameters.pregnancy.vertical_hcv_transmission_probability = 1.0;
        parameters.pregnancy.infant_hcv_tested_probability = 1.0;

        let mut person = alive_person(PersonInit::new(300, Sex::Female).with_hcv(Hcv::Chronic));
        let mut sampler = Sampler::new(11);
        Event::Pregnancy
            .execute(&mut person, &mut sampler, &parameters)
            .unwrap();
        assert_eq!(person.pregnancy_state(), PregnancyState::Pregnant);

        for _ in 0..parameters.pregnancy.gestation_cycles {
            person.advance_cycle();
            Event::Pregnancy
                .execute(&mut person, &mut sampler, &parameters)
                .unwrap();
        }
        assert_eq!(person.pregnancy_state(), PregnancyState::Postpartum);
        let details = person.pregnancy_details();
        assert_eq!(details.num_infants, 1);
        assert_eq!(details.num_hcv_exposures, 1);
        assert_eq!(details.num_hcv_infections, 1);
        assert_eq!(details.num_hcv_tests, 1);

        for _ in 0..parameters.pregnancy.postpartum_cycles {
            person.advance_cycle();
            Event::Pregnancy
                .execute(&mut person, &mut sampler, &parameters)
                .unwrap();
        }
        assert_eq!(person.pregnancy_state(), PregnancyState::None);
    }

    #[test]
    fn pregnancy_respects_the_age_window() {
        let mut parameters = parameters();
        for row in parameters.pregnancy.rates.values_mut() {
            row.pregnancy = 1.0;
        }
        let mut young = alive_person(PersonInit::new(100, Sex::Female));
        Event::Pregnancy
            .execute(&mut young, &mut Sampler::new(1), &parameters)
            .unwrap();
        assert_eq!(young.pregnancy_state(), PregnancyState::None);

        let mut man = alive_person(PersonInit::new(300, Sex::Male));
        Event::Pregnancy
            .execute(&mut man, &mut Sampler::new(1), &parameters)
            .unwrap();
        assert_eq!(man.pregnancy_state(), PregnancyState::NotApplicable);
    }

    #[test]
    fn early_loss_is_a_miscarriage() {
        let mut parameters = parameters();
        for row in parameters.pregnancy.rates.values_mut() {
            row.miscarriage = 1.0;
        }
        let mut person =
            alive_person(PersonInit::new(300, Sex::Female).with_pregnancy_state(PregnancyState::Pregnant));
        person.advance_cycle();
        Event::Pregnancy
            .execute(&mut person, &mut Sampler::new(1), &parameters)
            .unwrap();
        assert_eq!(person.pregnancy_state(), PregnancyState::None);
        assert_eq!(person.pregnancy_details().num_miscarriages, 1);
    }
}
