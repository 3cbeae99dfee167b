use crate::{
    error::HepceError,
    state::{
        Behavior, FibrosisState, Hcv, HccState, Hiv, LinkageState, MeasuredFibrosisState, Moud,
        PregnancyState, Sex,
    },
};
use serde::{Deserialize, Serialize};

/// The initial attributes of one member of the cohort.
///
/// Cohorts are usually supplied as a JSON array of these rows; every field except `age` and
/// `sex` has a default describing a never-infected, never-using person.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonInit {
    /// Age in cycles.
    pub age: u32,
    pub sex: Sex,
    pub behavior: Behavior,
    pub hcv: Hcv,
    pub fibrosis_state: FibrosisState,
    pub is_genotype_three: bool,
    pub seropositive: bool,
    pub hcv_identified: bool,
    pub hcv_link_state: LinkageState,
    pub measured_fibrosis_state: MeasuredFibrosisState,
    pub hcc_state: HccState,
    pub hiv: Hiv,
    pub hiv_identified: bool,
    pub hiv_link_state: LinkageState,
    pub moud: Moud,
    /// Defaults to `none` for women and `na` for men.
    pub pregnancy_state: Option<PregnancyState>,
    pub is_boomer: bool,
}

impl Default for PersonInit {
    fn default() -> Self {
        PersonInit::new(0, Sex::Male)
    }
}

impl PersonInit {
    #[must_use]
    pub fn new(age: u32, sex: Sex) -> Self {
        PersonInit {
            age,
            sex,
            behavior: Behavior::Never,
            hcv: Hcv::None,
            fibrosis_state: FibrosisState::None,
            is_genotype_three: false,
            seropositive: false,
            hcv_identified: false,
            hcv_link_state: LinkageState::Never,
            measured_fibrosis_state: MeasuredFibrosisState::None,
            hcc_state: HccState::None,
            hiv: Hiv::None,
            hiv_identified: false,
            hiv_link_state: LinkageState::Never,
            moud: Moud::None,
            pregnancy_state: None,
            is_boomer: false,
        }
    }

    #[must_use]
    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// An existing HCV infection; fibrosis starts at f0 if not otherwise given.
    #[must_use]
    pub fn with_hcv(mut self, hcv: Hcv) -> Self {
        self.hcv = hcv;
        if hcv.is_infected() {
            self.seropositive = true;
            if self.fibrosis_state == FibrosisState::None {
                self.fibrosis_state = FibrosisState::F0;
            }
        }
        self
    }

    #[must_use]
    pub fn with_fibrosis(mut self, fibrosis_state: FibrosisState) -> Self {
        self.fibrosis_state = fibrosis_state;
        self
    }

    #[must_use]
    pub fn with_hiv(mut self, hiv: Hiv) -> Self {
        self.hiv = hiv;
        self
    }

    #[must_use]
    pub fn with_moud(mut self, moud: Moud) -> Self {
        self.moud = moud;
        self
    }

    #[must_use]
    pub fn with_pregnancy_state(mut self, state: PregnancyState) -> Self {
        self.pregnancy_state = Some(state);
        self
    }

    /// Marks the person as already diagnosed with HCV and, optionally, linked to care.
    #[must_use]
    pub fn diagnosed_with_hcv(mut self, linked: bool) -> Self {
        self.hcv_identified = true;
        if linked {
            self.hcv_link_state = LinkageState::Linked;
        }
        self
    }

    #[must_use]
    pub fn diagnosed_with_hiv(mut self, linked: bool) -> Self {
        self.hiv_identified = true;
        if linked {
            self.hiv_link_state = LinkageState::Linked;
        }
        self
    }

    #[must_use]
    pub fn boomer(mut self) -> Self {
        self.is_boomer = true;
        self
    }

    pub(crate) fn resolved_pregnancy_state(&self) -> PregnancyState {
        self.pregnancy_state.unwrap_or(match self.sex {
            Sex::Female => PregnancyState::None,
            Sex::Male => PregnancyState::NotApplicable,
        })
    }

    /// Rejects rows no sequence of events could produce.
    pub fn validate(&self) -> Result<(), HepceError> {
        let invalid = |reason: &str| Err(HepceError::invalid_parameter("cohort", reason));

        if self.hcv.is_infected() && self.fibrosis_state == FibrosisState::None {
            return invalid("an HCV infection needs a fibrosis stage");
        }
        if self.hcv_link_state == LinkageState::Linked
            && !(self.hcv.is_infected() && self.hcv_identified)
        {
            return invalid("only identified, infected people can be linked to HCV care");
        }
        if self.hiv_link_state == LinkageState::Linked
            && !(self.hiv.is_infected() && self.hiv_identified)
        {
            return invalid("only identified, infected people can be linked to HIV care");
        }
        if self.sex == Sex::Male && self.resolved_pregnancy_state() != PregnancyState::NotApplicable {
            return invalid("pregnancy states apply only to women");
        }
        if self.moud != Moud::None && self.behavior == Behavior::Never {
            return invalid("people who have never used cannot be in MOUD");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_a_healthy_person() {
        let init = PersonInit::new(240, Sex::Female);
        assert!(init.validate().is_ok());
        assert_eq!(init.resolved_pregnancy_state(), PregnancyState::None);
        assert_eq!(
            PersonInit::new(240, Sex::Male).resolved_pregnancy_state(),
            PregnancyState::NotApplicable
        );
    }

    #[test]
    fn infection_sets_fibrosis() {
        let init = PersonInit::new(240, Sex::Male).with_hcv(Hcv::Chronic);
        assert_eq!(init.fibrosis_state, FibrosisState::F0);
        assert!(init.seropositive);
        assert!(init.validate().is_ok());
    }

    #[test]
    fn rejects_impossible_rows() {
        let linked_uninfected = PersonInit::new(240, Sex::Male).diagnosed_with_hcv(true);
        assert!(linked_uninfected.validate().is_err());

        let pregnant_man =
            PersonInit::new(240, Sex::Male).with_pregnancy_state(PregnancyState::Pregnant);
        assert!(pregnant_man.validate().is_err());

        let never_user_on_moud = PersonInit::new(240, Sex::Male).with_moud(Moud::Current);
        assert!(never_user_on_moud.validate().is_err());
    }

    #[test]
    fn deserializes_with_defaults() {
        let init: PersonInit =
            serde_json::from_str(r#"{"age": 240, "sex": "female", "behavior": "injection"}"#)
                .unwrap();
        assert_eq!(init.age, 240);
        assert_eq!(init.behavior, Behavior::Injection);
        assert_eq!(init.hcv, Hcv::None);
        assert_eq!(init.pregnancy_state, None);
    }
}
