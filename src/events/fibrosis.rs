use super::{CycleEffect, Transition};
use crate::{
    error::HepceError,
    parameters::{
        Parameters,
        keys::{FibrosisKey, LiverKey},
        values::StagingAccuracy,
    },
    people::Person,
    random::Sampler,
    state::{
        CostCategory, FibrosisState, HccState, InfectionType, MeasuredFibrosisState,
        MultitestResultMethod, UtilityCategory,
    },
};

/// Advances true fibrosis for infected people, then charges the liver cost and utility of the
/// current stage. Fibrosis never regresses; a cured person keeps their stage.
pub(super) fn progression(
    person: &mut Person,
    sampler: &mut Sampler,
    parameters: &Parameters,
    effect: &mut CycleEffect,
) -> Result<(), HepceError> {
    let fibrosis = &parameters.fibrosis;
    if person.fibrosis_state() == FibrosisState::None {
        return Ok(());
    }

    if person.hcv().is_infected() {
        let probability = fibrosis.progression_probability(person.fibrosis_state());
        let advanced = if sampler.bernoulli(probability) {
            person.advance_fibrosis()
        } else {
            None
        };
        if let Some(next) = advanced {
            effect.transition(Transition::Fibrosis(next));
        }
    }

    let impact = fibrosis.impacts.require(
        "fibrosis.impacts",
        &LiverKey {
            hcv: person.hcv(),
            fibrosis: person.fibrosis_state(),
        },
    )?;
    if !fibrosis.add_cost_only_if_identified || person.is_identified(InfectionType::Hcv) {
        effect.cost(CostCategory::Liver, impact.cost);
    }
    effect.utility(UtilityCategory::Liver, impact.utility);
    Ok(())
}

fn stage(
    sampler: &mut Sampler,
    accuracy: &StagingAccuracy,
) -> Result<MeasuredFibrosisState, HepceError> {
    Ok(StagingAccuracy::OUTCOMES[sampler.categorical(&accuracy.probabilities())?])
}

/// Measures fibrosis with one test, or two when the first result falls in a stage that calls
/// for confirmation.
pub(super) fn staging(
    person: &mut Person,
    sampler: &mut Sampler,
    parameters: &Parameters,
    effect: &mut CycleEffect,
) -> Result<(), HepceError> {
    let staging = &parameters.staging;
    if person.fibrosis_state() == FibrosisState::None {
        return Ok(());
    }
    let due = person
        .cycles_since(person.staging_details().time_of_last_staging)
        .is_none_or(|since| since >= staging.period);
    if !due {
        return Ok(());
    }

    let key = FibrosisKey {
        fibrosis: person.fibrosis_state(),
    };
    let first = staging.test_one.require("staging.test_one", &key)?;
    let mut measured = stage(sampler, first)?;
    effect.cost(CostCategory::Staging, staging.test_one_cost);

    let mut had_second_test = false;
    if !staging.test_two.is_empty() && staging.test_two_eligible_stages.contains(&measured) {
        let second = staging.test_two.require("staging.test_two", &key)?;
        let confirmed = stage(sampler, second)?;
        effect.cost(CostCategory::Staging, staging.test_two_cost);
        measured = match staging.multitest_result_method {
            MultitestResultMethod::Latest => confirmed,
            MultitestResultMethod::Maximum => measured.max(confirmed),
        };
        had_second_test = true;
    }

    person.diagnose_fibrosis(measured);
    person.set_had_second_test(had_second_test);
    effect.transition(Transition::MeasuredFibrosis(measured));
    Ok(())
}

/// Hepatocellular carcinoma: onset in advanced fibrosis, progression, and diagnosis.
pub(super) fn hcc(
    person: &mut Person,
    sampler: &mut Sampler,
    parameters: &Parameters,
    effect: &mut CycleEffect,
) {
    let hcc = &parameters.hcc;
    let state = person.hcc_details().hcc_state;
    if state == HccState::None && person.fibrosis_state() < FibrosisState::F3 {
        return;
    }

    let onset = match state {
        HccState::None => Some(hcc.early_probability),
        HccState::Early => Some(hcc.late_probability),
        HccState::Late => None,
    };
    let developed = if onset.is_some_and(|p| sampler.bernoulli(p)) {
        person.develop_hcc()
    } else {
        None
    };
    if let Some(next) = developed {
        effect.transition(Transition::Hcc(next));
    }

    let (impact, diagnosis) = match person.hcc_details().hcc_state {
        HccState::None => return,
        HccState::Early => (hcc.early, hcc.early_diagnosis_probability),
        HccState::Late => (hcc.late, hcc.late_diagnosis_probability),
    };
    if !person.hcc_details().hcc_diagnosed && sampler.bernoulli(diagnosis) {
        person.diagnose_hcc();
        effect.transition(Transition::HccDiagnosed);
    }
    if person.hcc_details().hcc_diagnosed {
        effect.cost(CostCategory::Liver, impact.cost);
    }
    let liver = person.accounts().utilities.get(UtilityCategory::Liver);
    effect.utility(UtilityCategory::Liver, liver.min(impact.utility));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        events::Event,
        parameters::values::CostUtility,
        people::PersonInit,
        state::{Hcv, Sex},
        testing::{alive_person, parameters},
    };

    fn infected(fibrosis: FibrosisState) -> Person {
        alive_person(
            PersonInit::new(400, Sex::Male)
                .with_hcv(Hcv::Chronic)
                .with_fibrosis(fibrosis),
        )
    }

    #[test]
    fn progression_moves_one_stage() {
        let mut parameters = parameters();
        parameters.fibrosis.f23 = 1.0;
        for row in parameters.fibrosis.impacts.values_mut() {
            *row = CostUtility {
                cost: 20.0,
                utility: 0.95,
            };
        }
        let mut person = infected(FibrosisState::F2);
        let effect = Event::FibrosisProgression
            .execute(&mut person, &mut Sampler::new(8), &parameters)
            .unwrap();
        assert_eq!(person.fibrosis_state(), FibrosisState::F3);
        assert_eq!(effect.transitions(), &[Transition::Fibrosis(FibrosisState::F3)]);
        assert_eq!(effect.costs(), &[(CostCategory::Liver, 20.0)]);
        assert_eq!(effect.utility_for(UtilityCategory::Liver), Some(0.95));
    }

    #[test]
    fn cured_fibrosis_holds_and_costs_can_wait_for_diagnosis() {
        let mut parameters = parameters();
        parameters.fibrosis.f4d = 1.0;
        parameters.fibrosis.add_cost_only_if_identified = true;
        for row in parameters.fibrosis.impacts.values_mut() {
            row.cost = 20.0;
        }
        let mut person = infected(FibrosisState::F4);
        person.clear_hcv(false);
        let effect = Event::FibrosisProgression
            .execute(&mut person, &mut Sampler::new(8), &parameters)
            .unwrap();
        assert_eq!(person.fibrosis_state(), FibrosisState::F4);
        assert!(effect.costs().is_empty());
    }

    #[test]
    fn staging_is_periodic() {
        let mut parameters = parameters();
        parameters.staging.period = 6;
        parameters.staging.test_one_cost = 120.0;
        let mut person = infected(FibrosisState::F3);
        let mut sampler = Sampler::new(8);

        let effect = Event::FibrosisStaging
            .execute(&mut person, &mut sampler, &parameters)
            .unwrap();
        assert_eq!(person.measured_fibrosis_state(), MeasuredFibrosisState::F23);
        assert_eq!(effect.total_cost(), 120.0);

        person.advance_cycle();
        let effect = Event::FibrosisStaging
            .execute(&mut person, &mut sampler, &parameters)
            .unwrap();
        assert_eq!(effect, CycleEffect::default());
    }

    #[test]
    fn second_test_combines_by_maximum() {
        let mut parameters = parameters();
        parameters.staging.test_two = [(
            FibrosisKey {
                fibrosis: FibrosisState::F3,
            },
            StagingAccuracy::exact(MeasuredFibrosisState::F01),
        )]
        .into_iter()
        .collect();
        parameters.staging.test_two_eligible_stages = vec![MeasuredFibrosisState::F23];
        parameters.staging.multitest_result_method = MultitestResultMethod::Maximum;

        let mut person = infected(FibrosisState::F3);
        Event::FibrosisStaging
            .execute(&mut person, &mut Sampler::new(8), &parameters)
            .unwrap();
        assert_eq!(person.measured_fibrosis_state(), MeasuredFibrosisState::F23);
        assert!(person.staging_details().had_second_test);

        parameters.staging.multitest_result_method = MultitestResultMethod::Latest;
        let mut person = infected(FibrosisState::F3);
        Event::FibrosisStaging
            .execute(&mut person, &mut Sampler::new(8), &parameters)
            .unwrap();
        assert_eq!(person.measured_fibrosis_state(), MeasuredFibrosisState::F01);
    }

    #[test]
    fn hcc_develops_and_lowers_liver_utility() {
        let mut parameters = parameters();
        parameters.hcc.early_probability = 1.0;
        parameters.hcc.early_diagnosis_probability = 1.0;
        parameters.hcc.early = CostUtility {
            cost: 500.0,
            utility: 0.6,
        };
        let mut person = infected(FibrosisState::F4);
        let effect = Event::Hcc
            .execute(&mut person, &mut Sampler::new(8), &parameters)
            .unwrap();
        assert_eq!(person.hcc_details().hcc_state, HccState::Early);
        assert!(person.hcc_details().hcc_diagnosed);
        assert_eq!(effect.costs(), &[(CostCategory::Liver, 500.0)]);
        assert_eq!(effect.utility_for(UtilityCategory::Liver), Some(0.6));

        let mut mild = infected(FibrosisState::F1);
        let mut sampler = Sampler::new(8);
        Event::Hcc.execute(&mut mild, &mut sampler, &parameters).unwrap();
        assert_eq!(mild.hcc_details().hcc_state, HccState::None);
        assert_eq!(sampler.draws(), 0);
    }
}
