//! Sub-records of a person's state. Each is owned by exactly one `Person`.
//!
//! Times are cycle indices; `None` means the thing has never happened.

use crate::state::{
    Behavior, FibrosisState, Hcv, HccState, Hiv, InfectionType, LinkageState, LinkageType,
    MeasuredFibrosisState, Moud, PregnancyState, ScreeningChannel, ScreeningTest,
};
use serde::{Deserialize, Serialize};

/// One value per infection type, for the records HCV and HIV keep separately.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PerInfection<T> {
    pub hcv: T,
    pub hiv: T,
}

impl<T> PerInfection<T> {
    pub fn get(&self, infection: InfectionType) -> &T {
        match infection {
            InfectionType::Hcv => &self.hcv,
            InfectionType::Hiv => &self.hiv,
        }
    }

    pub fn get_mut(&mut self, infection: InfectionType) -> &mut T {
        match infection {
            InfectionType::Hcv => &mut self.hcv,
            InfectionType::Hiv => &mut self.hiv,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HcvDetails {
    pub hcv: Hcv,
    pub fibrosis_state: FibrosisState,
    pub is_genotype_three: bool,
    pub seropositive: bool,
    pub time_changed: Option<u32>,
    pub time_fibrosis_state_changed: Option<u32>,
    pub times_infected: u32,
    pub times_acute_cleared: u32,
    pub svrs: u32,
}

impl Default for HcvDetails {
    fn default() -> Self {
        HcvDetails {
            hcv: Hcv::None,
            fibrosis_state: FibrosisState::None,
            is_genotype_three: false,
            seropositive: false,
            time_changed: None,
            time_fibrosis_state_changed: None,
            times_infected: 0,
            times_acute_cleared: 0,
            svrs: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HivDetails {
    pub hiv: Hiv,
    pub time_changed: Option<u32>,
    pub low_cd4_cycles: u32,
}

impl Default for HivDetails {
    fn default() -> Self {
        HivDetails {
            hiv: Hiv::None,
            time_changed: None,
            low_cd4_cycles: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HccDetails {
    pub hcc_state: HccState,
    pub hcc_diagnosed: bool,
}

impl Default for HccDetails {
    fn default() -> Self {
        HccDetails {
            hcc_state: HccState::None,
            hcc_diagnosed: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BehaviorDetails {
    pub behavior: Behavior,
    pub time_last_active: Option<u32>,
}

impl Default for BehaviorDetails {
    fn default() -> Self {
        BehaviorDetails {
            behavior: Behavior::Never,
            time_last_active: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkageDetails {
    pub link_state: LinkageState,
    pub time_link_change: Option<u32>,
    pub link_type: LinkageType,
    pub link_count: u32,
}

impl Default for LinkageDetails {
    fn default() -> Self {
        LinkageDetails {
            link_state: LinkageState::Never,
            time_link_change: None,
            link_type: LinkageType::NotApplicable,
            link_count: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoudDetails {
    pub moud_state: Moud,
    pub time_started_moud: Option<u32>,
    /// Cycles spent in the current MOUD state.
    pub current_state_concurrent_cycles: u32,
    pub total_moud_cycles: u32,
}

impl Default for MoudDetails {
    fn default() -> Self {
        MoudDetails {
            moud_state: Moud::None,
            time_started_moud: None,
            current_state_concurrent_cycles: 0,
            total_moud_cycles: 0,
        }
    }
}

/// An infant delivered by the person, recorded at birth.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Child {
    pub hcv: Hcv,
    pub tested: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PregnancyDetails {
    pub pregnancy_state: PregnancyState,
    pub time_of_pregnancy_change: Option<u32>,
    pub count: u32,
    pub num_infants: u32,
    pub num_miscarriages: u32,
    pub num_hcv_exposures: u32,
    pub num_hcv_infections: u32,
    pub num_hcv_tests: u32,
    pub children: Vec<Child>,
}

impl PregnancyDetails {
    pub fn with_state(pregnancy_state: PregnancyState) -> Self {
        PregnancyDetails {
            pregnancy_state,
            time_of_pregnancy_change: None,
            count: 0,
            num_infants: 0,
            num_miscarriages: 0,
            num_hcv_exposures: 0,
            num_hcv_infections: 0,
            num_hcv_tests: 0,
            children: Vec::new(),
        }
    }
}

impl Default for PregnancyDetails {
    fn default() -> Self {
        PregnancyDetails::with_state(PregnancyState::NotApplicable)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StagingDetails {
    pub measured_fibrosis_state: MeasuredFibrosisState,
    pub had_second_test: bool,
    pub time_of_last_staging: Option<u32>,
}

impl Default for StagingDetails {
    fn default() -> Self {
        StagingDetails {
            measured_fibrosis_state: MeasuredFibrosisState::None,
            had_second_test: false,
            time_of_last_staging: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreeningDetails {
    pub time_of_last_screening: Option<u32>,
    pub number_ab_tests: u32,
    pub number_rna_tests: u32,
    pub ab_positive: bool,
    pub identified: bool,
    pub time_identified: Option<u32>,
    pub last_test: Option<ScreeningTest>,
    pub last_channel: Option<ScreeningChannel>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TreatmentDetails {
    pub initiated_treatment: bool,
    pub time_of_treatment_initiation: Option<u32>,
    pub num_starts: u32,
    pub num_withdrawals: u32,
    pub num_toxic_reactions: u32,
    pub num_completed: u32,
    pub num_retreatments: u32,
    pub retreatment: bool,
}
