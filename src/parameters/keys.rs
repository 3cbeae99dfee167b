//! Covariate keys for the parameter tables. Field names double as the column names in
//! parameter files.

use crate::{
    people::Person,
    state::{Behavior, FibrosisState, Hcv, Hiv, Moud, PregnancyState, Sex},
};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DemographicKey {
    pub age_years: u32,
    pub sex: Sex,
    pub behavior: Behavior,
}

impl DemographicKey {
    #[must_use]
    pub fn of(person: &Person) -> Self {
        DemographicKey {
            age_years: person.age_years(),
            sex: person.sex(),
            behavior: person.behavior(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BehaviorTransitionKey {
    pub age_years: u32,
    pub sex: Sex,
    pub moud: Moud,
    pub behavior: Behavior,
}

impl BehaviorTransitionKey {
    #[must_use]
    pub fn of(person: &Person) -> Self {
        BehaviorTransitionKey {
            age_years: person.age_years(),
            sex: person.sex(),
            moud: person.moud(),
            behavior: person.behavior(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BehaviorImpactKey {
    pub sex: Sex,
    pub behavior: Behavior,
}

/// MOUD state and drug use: the covariates of overdose and MOUD transitions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubstanceKey {
    pub moud: Moud,
    pub behavior: Behavior,
}

impl SubstanceKey {
    #[must_use]
    pub fn of(person: &Person) -> Self {
        SubstanceKey {
            moud: person.moud(),
            behavior: person.behavior(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoudKey {
    pub moud: Moud,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgeKey {
    pub age_years: u32,
}

/// Linking covariates. `pregnancy` is `na` in every row unless linking is stratified by
/// pregnancy, in which case rows exist for each pregnancy state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkingKey {
    pub age_years: u32,
    pub sex: Sex,
    pub behavior: Behavior,
    #[serde(default = "not_applicable")]
    pub pregnancy: PregnancyState,
}

fn not_applicable() -> PregnancyState {
    PregnancyState::NotApplicable
}

impl LinkingKey {
    #[must_use]
    pub fn of(person: &Person, stratify_by_pregnancy: bool) -> Self {
        LinkingKey {
            age_years: person.age_years(),
            sex: person.sex(),
            behavior: person.behavior(),
            pregnancy: if stratify_by_pregnancy {
                person.pregnancy_state()
            } else {
                PregnancyState::NotApplicable
            },
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LiverKey {
    pub hcv: Hcv,
    pub fibrosis: FibrosisState,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FibrosisKey {
    pub fibrosis: FibrosisState,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HcvStateKey {
    pub hcv: Hcv,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HivStateKey {
    pub hiv: Hiv,
}

/// Selects an HCV treatment course.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CourseKey {
    pub retreatment: bool,
    pub genotype_three: bool,
    pub cirrhotic: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HivUtilityKey {
    pub on_treatment: bool,
    pub high_cd4: bool,
}
