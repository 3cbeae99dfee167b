/*!

Read-only model parameters: one table family (plus scalar settings) per event.

Parameters are deserialized from JSON and validated once, before any person is simulated; after
that they are shared read-only (behind an `Arc`) by every worker. A table row that an event asks
for but that is absent aborts the run with the table's name and the covariate key.

Tables are written as arrays of flat rows:

```json
{
  "hcv": {
    "incidence": [
      { "age_years": 20, "sex": "male", "behavior": "injection", "probability": 0.05 }
    ]
  }
}
```

*/

pub mod keys;
pub mod table;
pub mod values;

use crate::{
    context::{Context, DataPlugin},
    error::HepceError,
    log::{debug, trace},
    state::{
        Behavior, FibrosisState, Hcv, InterventionType, MeasuredFibrosisState,
        MultitestResultMethod, PregnancyState, ScreeningChannel, ScreeningTest,
    },
};
use keys::{
    AgeKey, BehaviorImpactKey, BehaviorTransitionKey, CourseKey, DemographicKey, FibrosisKey,
    HcvStateKey, HivStateKey, HivUtilityKey, LinkingKey, LiverKey, MoudKey, SubstanceKey,
};
use serde::Deserialize;
use std::{path::Path, sync::Arc};
use table::LookupTable;
use values::{
    BehaviorTransition, ChannelProbability, Cost, CostUtility, Mortality, MoudTransition,
    PregnancyRates, Probability, StagingAccuracy, TreatmentCourse, Utility,
};

pub use table::Validate;

fn check_probability(name: &str, p: f64) -> Result<(), HepceError> {
    table::check_probability(name, p).map_err(|reason| HepceError::invalid_parameter(name, reason))
}

fn check_cost(name: &str, c: f64) -> Result<(), HepceError> {
    table::check_cost(c).map_err(|reason| HepceError::invalid_parameter(name, reason))
}

fn check_utility(name: &str, u: f64) -> Result<(), HepceError> {
    table::check_utility(u).map_err(|reason| HepceError::invalid_parameter(name, reason))
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackgroundParameters {
    pub mortality: LookupTable<DemographicKey, Mortality>,
    pub impacts: LookupTable<DemographicKey, CostUtility>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MortalityParameters {
    /// Age in cycles at which everyone dies.
    pub max_age: u32,
    pub f4_infected: f64,
    pub f4_uninfected: f64,
    pub decomp_infected: f64,
    pub decomp_uninfected: f64,
    pub hcc_early: f64,
    pub hcc_late: f64,
    /// Infection-related mortality by HCV state; consulted only for infected people.
    pub infection: LookupTable<HcvStateKey, Probability>,
    /// HIV-related mortality by HIV state; consulted only for infected people.
    pub hiv: LookupTable<HivStateKey, Probability>,
    pub fatal_overdose: LookupTable<SubstanceKey, Probability>,
}

impl Default for MortalityParameters {
    fn default() -> Self {
        MortalityParameters {
            max_age: 1200,
            f4_infected: 0.0,
            f4_uninfected: 0.0,
            decomp_infected: 0.0,
            decomp_uninfected: 0.0,
            hcc_early: 0.0,
            hcc_late: 0.0,
            infection: LookupTable::default(),
            hiv: LookupTable::default(),
            fatal_overdose: LookupTable::default(),
        }
    }
}

impl MortalityParameters {
    /// Liver-related mortality from the true fibrosis stage.
    #[must_use]
    pub fn fibrosis_mortality(&self, fibrosis: FibrosisState, hcv: Hcv) -> f64 {
        match (fibrosis, hcv.is_infected()) {
            (FibrosisState::F4, true) => self.f4_infected,
            (FibrosisState::F4, false) => self.f4_uninfected,
            (FibrosisState::Decomp, true) => self.decomp_infected,
            (FibrosisState::Decomp, false) => self.decomp_uninfected,
            _ => 0.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BehaviorParameters {
    pub transitions: LookupTable<BehaviorTransitionKey, BehaviorTransition>,
    pub impacts: LookupTable<BehaviorImpactKey, CostUtility>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MoudParameters {
    pub transitions: LookupTable<SubstanceKey, MoudTransition>,
    /// Per-cycle cost of each MOUD state.
    pub costs: LookupTable<MoudKey, Cost>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverdoseParameters {
    pub probability: LookupTable<SubstanceKey, Probability>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PregnancyParameters {
    pub rates: LookupTable<AgeKey, PregnancyRates>,
    pub multiple_delivery_probability: f64,
    pub infant_hcv_tested_probability: f64,
    pub vertical_hcv_transmission_probability: f64,
    /// Youngest age, in cycles, at which pregnancy is modeled.
    pub min_age: u32,
    pub max_age: u32,
    pub postpartum_cycles: u32,
    pub gestation_cycles: u32,
}

impl Default for PregnancyParameters {
    fn default() -> Self {
        PregnancyParameters {
            rates: LookupTable::default(),
            multiple_delivery_probability: 0.0,
            infant_hcv_tested_probability: 0.0,
            vertical_hcv_transmission_probability: 0.0,
            min_age: 180,
            max_age: 540,
            postpartum_cycles: 3,
            gestation_cycles: 9,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FibrosisParameters {
    pub f01: f64,
    pub f12: f64,
    pub f23: f64,
    pub f34: f64,
    pub f4d: f64,
    pub add_cost_only_if_identified: bool,
    pub impacts: LookupTable<LiverKey, CostUtility>,
}

impl FibrosisParameters {
    /// Per-cycle probability of leaving `state` for the next stage.
    #[must_use]
    pub fn progression_probability(&self, state: FibrosisState) -> f64 {
        match state {
            FibrosisState::F0 => self.f01,
            FibrosisState::F1 => self.f12,
            FibrosisState::F2 => self.f23,
            FibrosisState::F3 => self.f34,
            FibrosisState::F4 => self.f4d,
            FibrosisState::Decomp | FibrosisState::None => 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StagingParameters {
    /// Cycles between stagings.
    pub period: u32,
    pub test_one: LookupTable<FibrosisKey, StagingAccuracy>,
    pub test_one_cost: f64,
    /// Leave empty to stage with a single test.
    pub test_two: LookupTable<FibrosisKey, StagingAccuracy>,
    pub test_two_cost: f64,
    pub test_two_eligible_stages: Vec<MeasuredFibrosisState>,
    pub multitest_result_method: MultitestResultMethod,
}

impl Default for StagingParameters {
    fn default() -> Self {
        StagingParameters {
            period: 12,
            test_one: LookupTable::default(),
            test_one_cost: 0.0,
            test_two: LookupTable::default(),
            test_two_cost: 0.0,
            test_two_eligible_stages: Vec::new(),
            multitest_result_method: MultitestResultMethod::Latest,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HccParameters {
    pub early_probability: f64,
    pub late_probability: f64,
    pub early_diagnosis_probability: f64,
    pub late_diagnosis_probability: f64,
    pub early: CostUtility,
    pub late: CostUtility,
}

/// Accuracy and cost of one test used on one screening channel.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestCharacteristics {
    pub acute_sensitivity: f64,
    pub chronic_sensitivity: f64,
    pub specificity: f64,
    pub cost: f64,
}

impl Default for TestCharacteristics {
    fn default() -> Self {
        TestCharacteristics {
            acute_sensitivity: 1.0,
            chronic_sensitivity: 1.0,
            specificity: 1.0,
            cost: 0.0,
        }
    }
}

impl TestCharacteristics {
    fn validate(&self, name: &str) -> Result<(), HepceError> {
        check_probability(&format!("{name}.acute_sensitivity"), self.acute_sensitivity)?;
        check_probability(&format!("{name}.chronic_sensitivity"), self.chronic_sensitivity)?;
        check_probability(&format!("{name}.specificity"), self.specificity)?;
        check_cost(&format!("{name}.cost"), self.cost)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScreeningParameters {
    pub probability: LookupTable<DemographicKey, ChannelProbability>,
    pub background_ab: TestCharacteristics,
    pub background_rna: TestCharacteristics,
    pub intervention_ab: TestCharacteristics,
    pub intervention_rna: TestCharacteristics,
    /// Cycles between periodic intervention screens.
    pub period: u32,
    pub intervention_type: InterventionType,
    /// Scales the screening probability of people in the boomer birth cohort.
    pub seropositivity_multiplier_boomer: f64,
}

impl Default for ScreeningParameters {
    fn default() -> Self {
        ScreeningParameters {
            probability: LookupTable::default(),
            background_ab: TestCharacteristics::default(),
            background_rna: TestCharacteristics::default(),
            intervention_ab: TestCharacteristics::default(),
            intervention_rna: TestCharacteristics::default(),
            period: 12,
            intervention_type: InterventionType::None,
            seropositivity_multiplier_boomer: 1.0,
        }
    }
}

impl ScreeningParameters {
    #[must_use]
    pub fn test(&self, channel: ScreeningChannel, test: ScreeningTest) -> &TestCharacteristics {
        match (channel, test) {
            (ScreeningChannel::Background, ScreeningTest::Ab) => &self.background_ab,
            (ScreeningChannel::Background, ScreeningTest::Rna) => &self.background_rna,
            (ScreeningChannel::Intervention, ScreeningTest::Ab) => &self.intervention_ab,
            (ScreeningChannel::Intervention, ScreeningTest::Rna) => &self.intervention_rna,
        }
    }

    fn validate(&self, name: &'static str) -> Result<(), HepceError> {
        self.probability.validate(name)?;
        self.background_ab.validate(&format!("{name}.background_ab"))?;
        self.background_rna.validate(&format!("{name}.background_rna"))?;
        self.intervention_ab.validate(&format!("{name}.intervention_ab"))?;
        self.intervention_rna.validate(&format!("{name}.intervention_rna"))?;
        if self.intervention_type == InterventionType::Periodic && self.period == 0 {
            return Err(HepceError::invalid_parameter(
                format!("{name}.period"),
                "periodic screening needs a positive period",
            ));
        }
        if !self.seropositivity_multiplier_boomer.is_finite() || self.seropositivity_multiplier_boomer < 0.0 {
            return Err(HepceError::invalid_parameter(
                format!("{name}.seropositivity_multiplier_boomer"),
                "must be a non-negative number",
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkingParameters {
    pub probability: LookupTable<LinkingKey, ChannelProbability>,
    pub stratify_by_pregnancy: bool,
    pub intervention_cost: f64,
    pub false_positive_test_cost: f64,
    /// Scales the linking rate of people screened within `recent_screen_cutoff` cycles.
    pub recent_screen_multiplier: f64,
    pub recent_screen_cutoff: u32,
}

impl Default for LinkingParameters {
    fn default() -> Self {
        LinkingParameters {
            probability: LookupTable::default(),
            stratify_by_pregnancy: false,
            intervention_cost: 0.0,
            false_positive_test_cost: 0.0,
            recent_screen_multiplier: 1.0,
            recent_screen_cutoff: 0,
        }
    }
}

impl LinkingParameters {
    fn validate(&self, name: &'static str) -> Result<(), HepceError> {
        self.probability.validate(name)?;
        check_cost(&format!("{name}.intervention_cost"), self.intervention_cost)?;
        check_cost(&format!("{name}.false_positive_test_cost"), self.false_positive_test_cost)?;
        if !self.recent_screen_multiplier.is_finite() || self.recent_screen_multiplier < 0.0 {
            return Err(HepceError::invalid_parameter(
                format!("{name}.recent_screen_multiplier"),
                "must be a non-negative number",
            ));
        }
        Ok(())
    }
}

/// Who may start treatment.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Eligibility {
    pub ineligible_behaviors: Vec<Behavior>,
    pub ineligible_fibrosis_stages: Vec<MeasuredFibrosisState>,
    pub ineligible_pregnancy_states: Vec<PregnancyState>,
    /// Cycles a person must have been linked before starting.
    pub min_cycles_linked: u32,
    /// Cycles since last drug use required before starting.
    pub min_cycles_since_active: u32,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TreatmentParameters {
    pub eligibility: Eligibility,
    /// Maximum number of treatment starts; unlimited when absent.
    pub treatment_limit: Option<u32>,
    pub ltfu_probability: f64,
    pub initiation_probability: f64,
    /// Cost of each cycle's care visit while linked.
    pub treatment_cost: f64,
    /// Visit cost for people who have been treated before.
    pub salvage_cost: f64,
    pub toxicity_cost: f64,
    pub treatment_utility: f64,
    pub toxicity_utility: f64,
}

impl Default for TreatmentParameters {
    fn default() -> Self {
        TreatmentParameters {
            eligibility: Eligibility::default(),
            treatment_limit: None,
            ltfu_probability: 0.0,
            initiation_probability: 0.0,
            treatment_cost: 0.0,
            salvage_cost: 0.0,
            toxicity_cost: 0.0,
            treatment_utility: 1.0,
            toxicity_utility: 1.0,
        }
    }
}

impl TreatmentParameters {
    fn validate(&self, name: &str) -> Result<(), HepceError> {
        check_probability(&format!("{name}.ltfu_probability"), self.ltfu_probability)?;
        check_probability(&format!("{name}.initiation_probability"), self.initiation_probability)?;
        check_cost(&format!("{name}.treatment_cost"), self.treatment_cost)?;
        check_cost(&format!("{name}.salvage_cost"), self.salvage_cost)?;
        check_cost(&format!("{name}.toxicity_cost"), self.toxicity_cost)?;
        check_utility(&format!("{name}.treatment_utility"), self.treatment_utility)?;
        check_utility(&format!("{name}.toxicity_utility"), self.toxicity_utility)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VoluntaryRelinkParameters {
    pub probability: f64,
    /// Cycles after unlinking during which a person may relink.
    pub duration: u32,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HcvParameters {
    pub incidence: LookupTable<DemographicKey, Probability>,
    pub genotype_three_probability: f64,
    /// Per-cycle spontaneous clearance of acute infection; see [`HcvParameters::clearance`].
    pub clearance_probability: Option<f64>,
    /// Cycles before an acute infection becomes chronic.
    pub acute_duration: u32,
    pub screening: ScreeningParameters,
    pub linking: LinkingParameters,
    pub voluntary_relink: VoluntaryRelinkParameters,
    pub treatment: TreatmentParameters,
    pub courses: LookupTable<CourseKey, TreatmentCourse>,
}

impl Default for HcvParameters {
    fn default() -> Self {
        HcvParameters {
            incidence: LookupTable::default(),
            genotype_three_probability: 0.0,
            clearance_probability: None,
            acute_duration: 6,
            screening: ScreeningParameters::default(),
            linking: LinkingParameters::default(),
            voluntary_relink: VoluntaryRelinkParameters::default(),
            treatment: TreatmentParameters::default(),
            courses: LookupTable::default(),
        }
    }
}

impl HcvParameters {
    /// The configured clearance probability, or by default a quarter of acute infections
    /// clearing over the six-cycle acute phase.
    #[must_use]
    pub fn clearance(&self) -> f64 {
        self.clearance_probability
            .unwrap_or_else(|| crate::accounting::rate_to_probability(0.25, 1.0) / 6.0)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HivCourse {
    /// Cost per cycle on treatment.
    pub cost: f64,
    /// Cycles on treatment before viral suppression.
    pub suppression_cycles: u32,
    /// Cycles on treatment before a low CD4 count recovers.
    pub restore_high_cd4_cycles: u32,
    pub withdrawal_probability: f64,
    pub toxicity_probability: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HivParameters {
    pub incidence: LookupTable<DemographicKey, Probability>,
    /// Per-cycle probability that an unsuppressed high CD4 count falls.
    pub cd4_decline_probability: f64,
    pub impacts: LookupTable<HivStateKey, CostUtility>,
    pub screening: ScreeningParameters,
    pub linking: LinkingParameters,
    pub treatment: TreatmentParameters,
    pub course: HivCourse,
    pub utilities: LookupTable<HivUtilityKey, Utility>,
}

/// Every parameter the events read.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Parameters {
    pub background: BackgroundParameters,
    pub mortality: MortalityParameters,
    pub behavior: BehaviorParameters,
    pub moud: MoudParameters,
    pub overdose: OverdoseParameters,
    pub pregnancy: PregnancyParameters,
    pub fibrosis: FibrosisParameters,
    pub staging: StagingParameters,
    pub hcc: HccParameters,
    pub hcv: HcvParameters,
    pub hiv: HivParameters,
}

impl Parameters {
    pub fn from_json_str(json: &str) -> Result<Self, HepceError> {
        let parameters: Parameters = serde_json::from_str(json)?;
        parameters.validate()?;
        Ok(parameters)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, HepceError> {
        let path = path.as_ref();
        debug!("loading parameters from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Checks every probability, cost, utility, and partition.
    pub fn validate(&self) -> Result<(), HepceError> {
        self.background.mortality.validate("background.mortality")?;
        self.background.impacts.validate("background.impacts")?;

        let mortality = &self.mortality;
        if mortality.max_age == 0 {
            return Err(HepceError::invalid_parameter("mortality.max_age", "must be positive"));
        }
        for (name, p) in [
            ("mortality.f4_infected", mortality.f4_infected),
            ("mortality.f4_uninfected", mortality.f4_uninfected),
            ("mortality.decomp_infected", mortality.decomp_infected),
            ("mortality.decomp_uninfected", mortality.decomp_uninfected),
            ("mortality.hcc_early", mortality.hcc_early),
            ("mortality.hcc_late", mortality.hcc_late),
        ] {
            check_probability(name, p)?;
        }
        mortality.infection.validate("mortality.infection")?;
        mortality.hiv.validate("mortality.hiv")?;
        mortality.fatal_overdose.validate("mortality.fatal_overdose")?;

        self.behavior.transitions.validate("behavior.transitions")?;
        self.behavior.impacts.validate("behavior.impacts")?;
        self.moud.transitions.validate("moud.transitions")?;
        self.moud.costs.validate("moud.costs")?;
        self.overdose.probability.validate("overdose.probability")?;

        let pregnancy = &self.pregnancy;
        pregnancy.rates.validate("pregnancy.rates")?;
        check_probability(
            "pregnancy.multiple_delivery_probability",
            pregnancy.multiple_delivery_probability,
        )?;
        check_probability(
            "pregnancy.infant_hcv_tested_probability",
            pregnancy.infant_hcv_tested_probability,
        )?;
        check_probability(
            "pregnancy.vertical_hcv_transmission_probability",
            pregnancy.vertical_hcv_transmission_probability,
        )?;

        let fibrosis = &self.fibrosis;
        for (name, p) in [
            ("fibrosis.f01", fibrosis.f01),
            ("fibrosis.f12", fibrosis.f12),
            ("fibrosis.f23", fibrosis.f23),
            ("fibrosis.f34", fibrosis.f34),
            ("fibrosis.f4d", fibrosis.f4d),
        ] {
            check_probability(name, p)?;
        }
        fibrosis.impacts.validate("fibrosis.impacts")?;

        self.staging.test_one.validate("staging.test_one")?;
        self.staging.test_two.validate("staging.test_two")?;
        check_cost("staging.test_one_cost", self.staging.test_one_cost)?;
        check_cost("staging.test_two_cost", self.staging.test_two_cost)?;

        let hcc = &self.hcc;
        for (name, p) in [
            ("hcc.early_probability", hcc.early_probability),
            ("hcc.late_probability", hcc.late_probability),
            ("hcc.early_diagnosis_probability", hcc.early_diagnosis_probability),
            ("hcc.late_diagnosis_probability", hcc.late_diagnosis_probability),
        ] {
            check_probability(name, p)?;
        }
        hcc.early
            .validate()
            .map_err(|reason| HepceError::invalid_parameter("hcc.early", reason))?;
        hcc.late
            .validate()
            .map_err(|reason| HepceError::invalid_parameter("hcc.late", reason))?;

        let hcv = &self.hcv;
        hcv.incidence.validate("hcv.incidence")?;
        check_probability("hcv.genotype_three_probability", hcv.genotype_three_probability)?;
        check_probability("hcv.clearance_probability", hcv.clearance())?;
        hcv.screening.validate("hcv.screening")?;
        hcv.linking.validate("hcv.linking")?;
        check_probability("hcv.voluntary_relink.probability", hcv.voluntary_relink.probability)?;
        hcv.treatment.validate("hcv.treatment")?;
        hcv.courses.validate("hcv.courses")?;

        let hiv = &self.hiv;
        hiv.incidence.validate("hiv.incidence")?;
        check_probability("hiv.cd4_decline_probability", hiv.cd4_decline_probability)?;
        hiv.impacts.validate("hiv.impacts")?;
        hiv.screening.validate("hiv.screening")?;
        hiv.linking.validate("hiv.linking")?;
        hiv.treatment.validate("hiv.treatment")?;
        check_cost("hiv.course.cost", hiv.course.cost)?;
        check_probability("hiv.course.withdrawal_probability", hiv.course.withdrawal_probability)?;
        check_probability("hiv.course.toxicity_probability", hiv.course.toxicity_probability)?;
        hiv.utilities.validate("hiv.utilities")?;

        Ok(())
    }
}

/// Holds the validated parameter snapshot for the run.
#[derive(Default)]
struct ParametersPlugin {
    parameters: Option<Arc<Parameters>>,
}

impl DataPlugin for ParametersPlugin {
    const new: &'static dyn Fn() -> Self = &ParametersPlugin::default;
}

pub trait ContextParametersExt {
    /// Validates and stores the parameters, replacing any loaded earlier.
    fn set_parameters(&mut self, parameters: Parameters) -> Result<(), HepceError>;

    fn load_parameters_from_json(&mut self, path: impl AsRef<Path>) -> Result<(), HepceError>;

    /// A shared handle to the loaded parameters.
    fn get_parameters(&self) -> Result<Arc<Parameters>, HepceError>;
}

impl ContextParametersExt for Context {
    fn set_parameters(&mut self, parameters: Parameters) -> Result<(), HepceError> {
        parameters.validate()?;
        trace!("storing validated parameters");
        self.get_data_container_mut::<ParametersPlugin>().parameters = Some(Arc::new(parameters));
        Ok(())
    }

    fn load_parameters_from_json(&mut self, path: impl AsRef<Path>) -> Result<(), HepceError> {
        let parameters = Parameters::from_json_file(path)?;
        self.set_parameters(parameters)
    }

    fn get_parameters(&self) -> Result<Arc<Parameters>, HepceError> {
        self.get_data_container::<ParametersPlugin>()
            .and_then(|plugin| plugin.parameters.clone())
            .ok_or(HepceError::ParametersNotLoaded)
    }
}
