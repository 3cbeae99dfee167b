//! Fixtures shared by the unit tests.
//!
//! [`parameters`] covers every covariate combination a person can reach (ages 0 through 100
//! years) with every probability set to zero, every cost to zero, and every utility to one.
//! Each test turns on only the mechanism it exercises.

use crate::{
    PersonId,
    parameters::{
        Parameters,
        keys::{
            AgeKey, BehaviorImpactKey, BehaviorTransitionKey, CourseKey, DemographicKey,
            FibrosisKey, HcvStateKey, HivStateKey, HivUtilityKey, LinkingKey, LiverKey, MoudKey,
            SubstanceKey,
        },
        table::LookupTable,
        values::{
            BehaviorTransition, ChannelProbability, Cost, CostUtility, Mortality, MoudTransition,
            PregnancyRates, Probability, StagingAccuracy, TreatmentCourse, Utility,
        },
    },
    people::{Person, PersonInit},
    state::{Behavior, FibrosisState, Hcv, Hiv, MeasuredFibrosisState, Moud, PregnancyState, Sex},
};

pub(crate) const MAX_AGE_YEARS: u32 = 100;

pub(crate) fn demographic_keys() -> impl Iterator<Item = DemographicKey> {
    (0..=MAX_AGE_YEARS).flat_map(|age_years| {
        Sex::ALL.iter().flat_map(move |&sex| {
            Behavior::ALL.iter().map(move |&behavior| DemographicKey {
                age_years,
                sex,
                behavior,
            })
        })
    })
}

fn demographic_table<V: Copy>(value: V) -> LookupTable<DemographicKey, V> {
    demographic_keys().map(|key| (key, value)).collect()
}

fn substance_table<V: Copy>(value: impl Fn(Moud) -> V) -> LookupTable<SubstanceKey, V> {
    Moud::ALL
        .iter()
        .flat_map(|&moud| {
            Behavior::ALL
                .iter()
                .map(move |&behavior| SubstanceKey { moud, behavior })
        })
        .map(|key| (key, value(key.moud)))
        .collect()
}

/// The measured stage a perfect test reports.
pub(crate) fn measured(fibrosis: FibrosisState) -> MeasuredFibrosisState {
    match fibrosis {
        FibrosisState::None => MeasuredFibrosisState::None,
        FibrosisState::F0 | FibrosisState::F1 => MeasuredFibrosisState::F01,
        FibrosisState::F2 | FibrosisState::F3 => MeasuredFibrosisState::F23,
        FibrosisState::F4 => MeasuredFibrosisState::F4,
        FibrosisState::Decomp => MeasuredFibrosisState::Decomp,
    }
}

pub(crate) fn parameters() -> Parameters {
    let zero = Probability { probability: 0.0 };
    let mut parameters = Parameters::default();

    parameters.background.mortality = demographic_table(Mortality {
        probability: 0.0,
        smr: 1.0,
    });
    parameters.background.impacts = demographic_table(CostUtility::NEUTRAL);

    let mortality = &mut parameters.mortality;
    mortality.fatal_overdose = substance_table(|_| zero);
    mortality.infection = Hcv::ALL.iter().map(|&hcv| (HcvStateKey { hcv }, zero)).collect();
    mortality.hiv = Hiv::ALL.iter().map(|&hiv| (HivStateKey { hiv }, zero)).collect();

    parameters.behavior.transitions = (0..=MAX_AGE_YEARS)
        .flat_map(|age_years| {
            Sex::ALL.iter().flat_map(move |&sex| {
                Moud::ALL.iter().flat_map(move |&moud| {
                    Behavior::ALL.iter().map(move |&behavior| BehaviorTransitionKey {
                        age_years,
                        sex,
                        moud,
                        behavior,
                    })
                })
            })
        })
        .map(|key| (key, BehaviorTransition::staying(key.behavior)))
        .collect();
    parameters.behavior.impacts = Sex::ALL
        .iter()
        .flat_map(|&sex| {
            Behavior::ALL
                .iter()
                .map(move |&behavior| BehaviorImpactKey { sex, behavior })
        })
        .map(|key| (key, CostUtility::NEUTRAL))
        .collect();

    parameters.moud.transitions = substance_table(MoudTransition::staying);
    parameters.moud.costs = Moud::ALL
        .iter()
        .map(|&moud| (MoudKey { moud }, Cost { cost: 0.0 }))
        .collect();
    parameters.overdose.probability = substance_table(|_| zero);

    parameters.pregnancy.rates = (0..=MAX_AGE_YEARS)
        .map(|age_years| {
            (
                AgeKey { age_years },
                PregnancyRates {
                    pregnancy: 0.0,
                    miscarriage: 0.0,
                },
            )
        })
        .collect();

    parameters.fibrosis.impacts = Hcv::ALL
        .iter()
        .flat_map(|&hcv| {
            FibrosisState::ALL
                .iter()
                .map(move |&fibrosis| LiverKey { hcv, fibrosis })
        })
        .map(|key| (key, CostUtility::NEUTRAL))
        .collect();

    let exact: LookupTable<FibrosisKey, StagingAccuracy> = FibrosisState::ALL
        .iter()
        .filter(|&&fibrosis| fibrosis != FibrosisState::None)
        .map(|&fibrosis| {
            (
                FibrosisKey { fibrosis },
                StagingAccuracy::exact(measured(fibrosis)),
            )
        })
        .collect();
    parameters.staging.test_one = exact;

    let no_screening = ChannelProbability {
        background: 0.0,
        intervention: 0.0,
    };
    let linking: LookupTable<LinkingKey, ChannelProbability> = demographic_keys()
        .flat_map(|key| {
            PregnancyState::ALL.iter().map(move |&pregnancy| LinkingKey {
                age_years: key.age_years,
                sex: key.sex,
                behavior: key.behavior,
                pregnancy,
            })
        })
        .map(|key| (key, no_screening))
        .collect();

    let hcv = &mut parameters.hcv;
    hcv.incidence = demographic_table(zero);
    hcv.clearance_probability = Some(0.0);
    hcv.screening.probability = demographic_table(no_screening);
    hcv.linking.probability = linking.clone();
    hcv.courses = [false, true]
        .iter()
        .flat_map(|&retreatment| {
            [false, true].iter().flat_map(move |&genotype_three| {
                [false, true].iter().map(move |&cirrhotic| CourseKey {
                    retreatment,
                    genotype_three,
                    cirrhotic,
                })
            })
        })
        .map(|key| {
            (
                key,
                TreatmentCourse {
                    duration: 3,
                    cost: 0.0,
                    svr_probability: 0.0,
                    toxicity_probability: 0.0,
                    withdrawal_probability: 0.0,
                },
            )
        })
        .collect();

    let hiv = &mut parameters.hiv;
    hiv.incidence = demographic_table(zero);
    hiv.impacts = Hiv::ALL
        .iter()
        .map(|&hiv| (HivStateKey { hiv }, CostUtility::NEUTRAL))
        .collect();
    hiv.screening.probability = demographic_table(no_screening);
    hiv.linking.probability = linking;
    hiv.utilities = [false, true]
        .iter()
        .flat_map(|&on_treatment| {
            [false, true]
                .iter()
                .map(move |&high_cd4| HivUtilityKey { on_treatment, high_cd4 })
        })
        .map(|key| (key, Utility { utility: 1.0 }))
        .collect();

    parameters
}

/// A person who has entered their first cycle.
pub(crate) fn alive_person(init: PersonInit) -> Person {
    let mut person = Person::from_init(PersonId(0), &init).unwrap();
    person.advance_cycle();
    person
}

#[test]
fn fixture_parameters_validate() {
    parameters().validate().unwrap();
}
