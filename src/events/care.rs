//! Screening, linking, and treatment engagement shared by the HCV and HIV care pathways.

use super::{CycleEffect, Transition};
use crate::{
    accounting::{probability_to_rate, rate_to_probability},
    error::HepceError,
    parameters::{
        LinkingParameters, ScreeningParameters, TreatmentParameters,
        keys::{DemographicKey, LinkingKey},
    },
    people::Person,
    random::Sampler,
    state::{
        CostCategory, Hcv, InfectionType, InterventionType, LinkageState, LinkageType,
        ScreeningChannel, ScreeningTest, UtilityCategory,
    },
};

fn is_infected(person: &Person, infection: InfectionType) -> bool {
    match infection {
        InfectionType::Hcv => person.hcv().is_infected(),
        InfectionType::Hiv => person.hiv().is_infected(),
    }
}

/// Cost categories for linking charges and for treatment charges.
pub(super) fn care_category(infection: InfectionType) -> (CostCategory, CostCategory) {
    match infection {
        InfectionType::Hcv => (CostCategory::Linking, CostCategory::Treatment),
        InfectionType::Hiv => (CostCategory::Hiv, CostCategory::Hiv),
    }
}

fn screening_table(infection: InfectionType) -> &'static str {
    match infection {
        InfectionType::Hcv => "hcv.screening.probability",
        InfectionType::Hiv => "hiv.screening.probability",
    }
}

fn linking_table(infection: InfectionType) -> &'static str {
    match infection {
        InfectionType::Hcv => "hcv.linking.probability",
        InfectionType::Hiv => "hiv.linking.probability",
    }
}

/// Which channel screens the person this cycle.
fn screening_channel(
    person: &Person,
    infection: InfectionType,
    parameters: &ScreeningParameters,
) -> ScreeningChannel {
    let intervention = match parameters.intervention_type {
        InterventionType::None => false,
        InterventionType::OneTime => person.current_cycle() == 1,
        InterventionType::Periodic => person
            .cycles_since(person.screening_details(infection).time_of_last_screening)
            .is_none_or(|since| since >= parameters.period),
    };
    if intervention {
        ScreeningChannel::Intervention
    } else {
        ScreeningChannel::Background
    }
}

/// Probability that a test comes back positive given the person's true state.
fn positive_probability(
    person: &Person,
    infection: InfectionType,
    test: ScreeningTest,
    parameters: &ScreeningParameters,
    channel: ScreeningChannel,
) -> f64 {
    let characteristics = parameters.test(channel, test);
    let status = match infection {
        InfectionType::Hcv => match (person.hcv(), test) {
            (Hcv::Acute, _) => Some(characteristics.acute_sensitivity),
            (Hcv::Chronic, _) => Some(characteristics.chronic_sensitivity),
            // Antibodies persist after the infection ends.
            (Hcv::None, ScreeningTest::Ab) if person.hcv_details().seropositive => {
                Some(characteristics.chronic_sensitivity)
            }
            (Hcv::None, _) => None,
        },
        InfectionType::Hiv => person
            .hiv()
            .is_infected()
            .then_some(characteristics.chronic_sensitivity),
    };
    status.unwrap_or(1.0 - characteristics.specificity)
}

fn run_test(
    person: &mut Person,
    sampler: &mut Sampler,
    infection: InfectionType,
    test: ScreeningTest,
    channel: ScreeningChannel,
    parameters: &ScreeningParameters,
    effect: &mut CycleEffect,
) -> bool {
    let p = positive_probability(person, infection, test, parameters, channel);
    let positive = sampler.bernoulli(p);
    person.record_test(infection, test, positive);
    effect.cost(CostCategory::Screening, parameters.test(channel, test).cost);
    effect.transition(Transition::Tested {
        infection,
        test,
        positive,
    });
    positive
}

/// A screening draw followed, if screened, by an antibody test and a confirmatory RNA test.
pub(super) fn screening(
    person: &mut Person,
    sampler: &mut Sampler,
    infection: InfectionType,
    parameters: &ScreeningParameters,
    effect: &mut CycleEffect,
) -> Result<(), HepceError> {
    if person.link_state(infection) == LinkageState::Linked {
        return Ok(());
    }

    let channel = screening_channel(person, infection, parameters);
    let row = parameters
        .probability
        .require(screening_table(infection), &DemographicKey::of(person))?;
    let mut probability = match channel {
        ScreeningChannel::Background => row.background,
        ScreeningChannel::Intervention => row.intervention,
    };
    if infection == InfectionType::Hcv && person.is_boomer() {
        probability = (probability * parameters.seropositivity_multiplier_boomer).min(1.0);
    }
    if !sampler.bernoulli(probability) {
        return Ok(());
    }

    person.mark_screened(infection, channel);
    effect.transition(Transition::Screened { infection, channel });

    let details = person.screening_details(infection);
    let skip_antibody = details.ab_positive
        || (channel == ScreeningChannel::Intervention && details.identified);
    if !skip_antibody
        && !run_test(person, sampler, infection, ScreeningTest::Ab, channel, parameters, effect)
    {
        return Ok(());
    }

    if run_test(person, sampler, infection, ScreeningTest::Rna, channel, parameters, effect) {
        person.diagnose(infection);
        person.set_link_type(infection, LinkageType::from(channel));
        effect.transition(Transition::Identified(infection));
    }
    Ok(())
}

/// Brings an identified person into care. People identified by a false-positive result are
/// found out here and lose the diagnosis instead.
pub(super) fn linking(
    person: &mut Person,
    sampler: &mut Sampler,
    infection: InfectionType,
    parameters: &LinkingParameters,
    effect: &mut CycleEffect,
) -> Result<(), HepceError> {
    if !person.is_identified(infection) || person.link_state(infection) == LinkageState::Linked {
        return Ok(());
    }
    let (category, _) = care_category(infection);

    if !is_infected(person, infection) {
        person.clear_diagnosis(infection);
        effect.cost(category, parameters.false_positive_test_cost);
        effect.transition(Transition::FalsePositive(infection));
        return Ok(());
    }

    let row = parameters.probability.require(
        linking_table(infection),
        &LinkingKey::of(person, parameters.stratify_by_pregnancy),
    )?;
    let link_type = match person.linkage_details(infection).link_type {
        LinkageType::Intervention => LinkageType::Intervention,
        LinkageType::Background | LinkageType::NotApplicable => LinkageType::Background,
    };
    let mut probability = match link_type {
        LinkageType::Intervention => row.intervention,
        _ => row.background,
    };

    let recently_screened = person
        .cycles_since(person.screening_details(infection).time_of_last_screening)
        .is_some_and(|since| since <= parameters.recent_screen_cutoff);
    if recently_screened && probability < 1.0 {
        probability = rate_to_probability(
            probability_to_rate(probability, 1.0) * parameters.recent_screen_multiplier,
            1.0,
        );
    }

    if !sampler.bernoulli(probability) {
        return Ok(());
    }
    person.link(infection, link_type);
    if link_type == LinkageType::Intervention {
        effect.cost(category, parameters.intervention_cost);
    }
    effect.transition(Transition::Linked {
        infection,
        link_type,
    });
    Ok(())
}

/// Whether a linked person may start treatment this cycle.
pub(super) fn is_eligible(
    person: &Person,
    infection: InfectionType,
    parameters: &TreatmentParameters,
) -> bool {
    let eligibility = &parameters.eligibility;

    if eligibility.ineligible_behaviors.contains(&person.behavior())
        || eligibility
            .ineligible_pregnancy_states
            .contains(&person.pregnancy_state())
    {
        return false;
    }
    if infection == InfectionType::Hcv
        && eligibility
            .ineligible_fibrosis_stages
            .contains(&person.measured_fibrosis_state())
    {
        return false;
    }

    let cycles_linked = person
        .cycles_since(person.linkage_details(infection).time_link_change)
        .unwrap_or(0);
    if cycles_linked < eligibility.min_cycles_linked {
        return false;
    }
    let since_active = person.cycles_since(person.behavior_details().time_last_active);
    if since_active.is_some_and(|since| since < eligibility.min_cycles_since_active) {
        return false;
    }

    parameters
        .treatment_limit
        .is_none_or(|limit| person.treatment_details(infection).num_starts < limit)
}

/// Loss to follow-up of a linked person who has not started treatment.
pub(super) fn lost_to_follow_up(
    person: &mut Person,
    sampler: &mut Sampler,
    infection: InfectionType,
    parameters: &TreatmentParameters,
    effect: &mut CycleEffect,
) -> bool {
    if person.in_treatment(infection) || !sampler.bernoulli(parameters.ltfu_probability) {
        return false;
    }
    person.unlink(infection);
    effect.transition(Transition::Unlinked(infection));
    true
}

/// The cost of a care visit. HCV patients whose earlier course ended, by completion or
/// withdrawal, are on salvage care; HIV visits always cost the standard rate.
pub(super) fn charge_visit(
    person: &Person,
    infection: InfectionType,
    parameters: &TreatmentParameters,
    effect: &mut CycleEffect,
) {
    let (_, category) = care_category(infection);
    let details = person.treatment_details(infection);
    let salvage = infection == InfectionType::Hcv
        && details.num_withdrawals + details.num_completed > 0;
    let cost = if salvage {
        parameters.salvage_cost
    } else {
        parameters.treatment_cost
    };
    effect.cost(category, cost);
}

/// Ends treatment and care for one infection. Only that infection's treatment weight is reset:
/// HCV treatment returns to full health here, while HIV care sets its off-treatment weight from
/// `hiv.utilities` after engagement ends.
pub(super) fn end_engagement(person: &mut Person, infection: InfectionType, effect: &mut CycleEffect) {
    person.end_treatment(infection);
    person.unlink(infection);
    if infection == InfectionType::Hcv {
        effect.utility(UtilityCategory::Treatment, 1.0);
    }
    effect.transition(Transition::Unlinked(infection));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        events::Event,
        parameters::Eligibility,
        people::PersonInit,
        state::{Behavior, Hiv, MeasuredFibrosisState, Sex},
        testing::{alive_person, parameters},
    };

    fn screened_everywhere() -> crate::parameters::Parameters {
        let mut parameters = parameters();
        for row in parameters.hcv.screening.probability.values_mut() {
            row.background = 1.0;
            row.intervention = 1.0;
        }
        parameters.hcv.screening.background_ab.cost = 10.0;
        parameters.hcv.screening.background_rna.cost = 50.0;
        parameters
    }

    #[test]
    fn screening_identifies_the_infected() {
        let parameters = screened_everywhere();
        let mut person = alive_person(PersonInit::new(300, Sex::Male).with_hcv(Hcv::Chronic));
        let effect = Event::HcvScreening
            .execute(&mut person, &mut Sampler::new(5), &parameters)
            .unwrap();

        assert!(person.is_identified(InfectionType::Hcv));
        assert_eq!(
            person.linkage_details(InfectionType::Hcv).link_type,
            LinkageType::Background
        );
        let details = person.screening_details(InfectionType::Hcv);
        assert_eq!(details.number_ab_tests, 1);
        assert_eq!(details.number_rna_tests, 1);
        assert_eq!(effect.total_cost(), 60.0);
    }

    #[test]
    fn negative_antibody_test_ends_the_screen() {
        let parameters = screened_everywhere();
        let mut person = alive_person(PersonInit::new(300, Sex::Male));
        let effect = Event::HcvScreening
            .execute(&mut person, &mut Sampler::new(5), &parameters)
            .unwrap();

        assert!(!person.is_identified(InfectionType::Hcv));
        let details = person.screening_details(InfectionType::Hcv);
        assert_eq!(details.number_ab_tests, 1);
        assert_eq!(details.number_rna_tests, 0);
        assert_eq!(effect.costs(), &[(CostCategory::Screening, 10.0)]);
    }

    #[test]
    fn antibody_positive_people_go_straight_to_rna() {
        let parameters = screened_everywhere();
        let mut person = alive_person(PersonInit::new(300, Sex::Male).with_hcv(Hcv::Chronic));
        person.record_test(InfectionType::Hcv, ScreeningTest::Ab, true);
        Event::HcvScreening
            .execute(&mut person, &mut Sampler::new(5), &parameters)
            .unwrap();
        let details = person.screening_details(InfectionType::Hcv);
        assert_eq!(details.number_ab_tests, 1);
        assert_eq!(details.number_rna_tests, 1);
    }

    #[test]
    fn one_time_intervention_runs_in_the_first_cycle() {
        let mut parameters = parameters();
        parameters.hiv.screening.intervention_type = InterventionType::OneTime;
        for row in parameters.hiv.screening.probability.values_mut() {
            row.intervention = 1.0;
        }
        let mut person = alive_person(PersonInit::new(300, Sex::Male).with_hiv(Hiv::HighUnsuppressed));
        Event::HivScreening
            .execute(&mut person, &mut Sampler::new(5), &parameters)
            .unwrap();
        assert!(person.is_identified(InfectionType::Hiv));
        assert_eq!(
            person.linkage_details(InfectionType::Hiv).link_type,
            LinkageType::Intervention
        );

        let mut later = alive_person(PersonInit::new(300, Sex::Male).with_hiv(Hiv::HighUnsuppressed));
        later.advance_cycle();
        Event::HivScreening
            .execute(&mut later, &mut Sampler::new(5), &parameters)
            .unwrap();
        assert!(!later.is_identified(InfectionType::Hiv));
    }

    #[test]
    fn linking_moves_identified_people_into_care() {
        let mut parameters = parameters();
        for row in parameters.hcv.linking.probability.values_mut() {
            row.background = 1.0;
        }
        let mut person = alive_person(
            PersonInit::new(300, Sex::Male)
                .with_hcv(Hcv::Chronic)
                .diagnosed_with_hcv(false),
        );
        let effect = Event::HcvLinking
            .execute(&mut person, &mut Sampler::new(5), &parameters)
            .unwrap();
        assert_eq!(person.link_state(InfectionType::Hcv), LinkageState::Linked);
        assert_eq!(
            effect.transitions(),
            &[Transition::Linked {
                infection: InfectionType::Hcv,
                link_type: LinkageType::Background,
            }]
        );
    }

    #[test]
    fn false_positives_lose_their_diagnosis() {
        let mut parameters = parameters();
        parameters.hcv.linking.false_positive_test_cost = 80.0;
        let mut person = alive_person(PersonInit::new(300, Sex::Male));
        person.diagnose(InfectionType::Hcv);
        let effect = Event::HcvLinking
            .execute(&mut person, &mut Sampler::new(5), &parameters)
            .unwrap();
        assert!(!person.is_identified(InfectionType::Hcv));
        assert_eq!(effect.costs(), &[(CostCategory::Linking, 80.0)]);
    }

    #[test]
    fn recent_screen_multiplier_works_on_the_rate_scale() {
        let mut parameters = parameters();
        for row in parameters.hcv.linking.probability.values_mut() {
            row.background = 0.5;
        }
        parameters.hcv.linking.recent_screen_multiplier = 0.0;
        parameters.hcv.linking.recent_screen_cutoff = 12;

        let mut person = alive_person(
            PersonInit::new(300, Sex::Male)
                .with_hcv(Hcv::Chronic)
                .diagnosed_with_hcv(false),
        );
        person.mark_screened(InfectionType::Hcv, ScreeningChannel::Background);
        for seed in 0..50 {
            Event::HcvLinking
                .execute(&mut person, &mut Sampler::new(seed), &parameters)
                .unwrap();
        }
        assert_eq!(person.link_state(InfectionType::Hcv), LinkageState::Never);
    }

    #[test]
    fn eligibility_rules() {
        let mut treatment = TreatmentParameters {
            eligibility: Eligibility {
                ineligible_behaviors: vec![Behavior::Injection],
                ineligible_fibrosis_stages: vec![MeasuredFibrosisState::Decomp],
                min_cycles_linked: 2,
                ..Eligibility::default()
            },
            treatment_limit: Some(1),
            ..TreatmentParameters::default()
        };

        let mut person = alive_person(
            PersonInit::new(300, Sex::Male)
                .with_hcv(Hcv::Chronic)
                .diagnosed_with_hcv(true),
        );
        assert!(!is_eligible(&person, InfectionType::Hcv, &treatment));
        person.advance_cycle();
        assert!(is_eligible(&person, InfectionType::Hcv, &treatment));

        person.diagnose_fibrosis(MeasuredFibrosisState::Decomp);
        assert!(!is_eligible(&person, InfectionType::Hcv, &treatment));
        // Measured fibrosis does not apply to HIV care.
        treatment.eligibility.min_cycles_linked = 0;
        let hiv_person = alive_person(
            PersonInit::new(300, Sex::Male)
                .with_hiv(Hiv::HighUnsuppressed)
                .diagnosed_with_hiv(true),
        );
        assert!(is_eligible(&hiv_person, InfectionType::Hiv, &treatment));

        let user = alive_person(
            PersonInit::new(300, Sex::Male)
                .with_behavior(Behavior::Injection)
                .with_hcv(Hcv::Chronic)
                .diagnosed_with_hcv(true),
        );
        assert!(!is_eligible(&user, InfectionType::Hcv, &treatment));
    }

    #[test]
    fn ending_hiv_care_keeps_the_hcv_treatment_weight() {
        let mut person = alive_person(
            PersonInit::new(300, Sex::Male)
                .with_hcv(Hcv::Chronic)
                .diagnosed_with_hcv(true)
                .with_hiv(Hiv::HighUnsuppressed)
                .diagnosed_with_hiv(true),
        );
        person.initiate_treatment(InfectionType::Hcv);
        person.initiate_treatment(InfectionType::Hiv);

        let mut effect = CycleEffect::default();
        end_engagement(&mut person, InfectionType::Hiv, &mut effect);
        assert_eq!(effect.utility_for(UtilityCategory::Treatment), None);
        assert_eq!(effect.transitions(), &[Transition::Unlinked(InfectionType::Hiv)]);
        assert!(!person.in_treatment(InfectionType::Hiv));
        assert!(person.in_treatment(InfectionType::Hcv));
        assert_eq!(person.link_state(InfectionType::Hcv), LinkageState::Linked);

        let mut effect = CycleEffect::default();
        end_engagement(&mut person, InfectionType::Hcv, &mut effect);
        assert_eq!(effect.utility_for(UtilityCategory::Treatment), Some(1.0));
        assert_eq!(person.link_state(InfectionType::Hcv), LinkageState::Unlinked);
    }
}
