use crate::{
    PersonId,
    accounting::Accounts,
    error::HepceError,
    people::{
        PersonInit,
        details::{
            BehaviorDetails, Child, HccDetails, HcvDetails, HivDetails, LinkageDetails,
            MoudDetails, PerInfection, PregnancyDetails, ScreeningDetails, StagingDetails,
            TreatmentDetails,
        },
    },
    state::{
        Behavior, DeathReason, FibrosisState, Hcv, HccState, Hiv, InfectionType, LinkageState,
        LinkageType, MeasuredFibrosisState, Moud, PregnancyState, ScreeningChannel,
        ScreeningTest, Sex,
    },
};

/// Cycles per year of age; tables are keyed by whole years.
pub const CYCLES_PER_YEAR: u32 = 12;

/// One simulated individual.
///
/// State changes go through the mutators below, each of which only touches this person. Once
/// the person is dead every mutator is a no-op, so nothing can change a record after its death
/// cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct Person {
    id: PersonId,
    age: u32,
    sex: Sex,
    current_cycle: u32,
    is_boomer: bool,
    death_reason: DeathReason,
    death_cycle: Option<u32>,
    currently_overdosing: bool,
    num_overdoses: u32,
    hcv: HcvDetails,
    hiv: HivDetails,
    hcc: HccDetails,
    behavior: BehaviorDetails,
    moud: MoudDetails,
    pregnancy: PregnancyDetails,
    staging: StagingDetails,
    linkage: PerInfection<LinkageDetails>,
    screening: PerInfection<ScreeningDetails>,
    treatment: PerInfection<TreatmentDetails>,
    accounts: Accounts,
}

impl Person {
    pub fn from_init(id: PersonId, init: &PersonInit) -> Result<Self, HepceError> {
        init.validate()?;

        let mut person = Person {
            id,
            age: init.age,
            sex: init.sex,
            current_cycle: 0,
            is_boomer: init.is_boomer,
            death_reason: DeathReason::NotApplicable,
            death_cycle: None,
            currently_overdosing: false,
            num_overdoses: 0,
            hcv: HcvDetails {
                hcv: init.hcv,
                fibrosis_state: init.fibrosis_state,
                is_genotype_three: init.is_genotype_three,
                seropositive: init.seropositive || init.hcv.is_infected(),
                times_infected: u32::from(init.hcv.is_infected()),
                ..HcvDetails::default()
            },
            hiv: HivDetails {
                hiv: init.hiv,
                ..HivDetails::default()
            },
            hcc: HccDetails {
                hcc_state: init.hcc_state,
                hcc_diagnosed: false,
            },
            behavior: BehaviorDetails {
                behavior: init.behavior,
                time_last_active: init.behavior.is_active().then_some(0),
            },
            moud: MoudDetails {
                moud_state: init.moud,
                time_started_moud: (init.moud == Moud::Current).then_some(0),
                ..MoudDetails::default()
            },
            pregnancy: PregnancyDetails {
                time_of_pregnancy_change: matches!(
                    init.resolved_pregnancy_state(),
                    PregnancyState::Pregnant | PregnancyState::Postpartum
                )
                .then_some(0),
                count: u32::from(init.resolved_pregnancy_state() == PregnancyState::Pregnant),
                ..PregnancyDetails::with_state(init.resolved_pregnancy_state())
            },
            staging: StagingDetails {
                measured_fibrosis_state: init.measured_fibrosis_state,
                ..StagingDetails::default()
            },
            linkage: PerInfection::default(),
            screening: PerInfection::default(),
            treatment: PerInfection::default(),
            accounts: Accounts::default(),
        };

        for (infection, identified, link_state) in [
            (InfectionType::Hcv, init.hcv_identified, init.hcv_link_state),
            (InfectionType::Hiv, init.hiv_identified, init.hiv_link_state),
        ] {
            if identified {
                person.diagnose(infection);
            }
            if link_state != LinkageState::Never {
                let linkage = person.linkage.get_mut(infection);
                linkage.link_state = link_state;
                linkage.link_type = LinkageType::Background;
                linkage.time_link_change = Some(0);
                linkage.link_count = u32::from(link_state == LinkageState::Linked);
            }
        }

        Ok(person)
    }

    // region Lifecycle

    #[must_use]
    pub fn id(&self) -> PersonId {
        self.id
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.death_reason == DeathReason::NotApplicable
    }

    /// Marks the person dead in the current cycle. Calling it again does nothing.
    pub fn set_death(&mut self, reason: DeathReason) {
        if !self.is_alive() || reason == DeathReason::NotApplicable {
            return;
        }
        self.death_reason = reason;
        self.death_cycle = Some(self.current_cycle);
        self.currently_overdosing = false;
    }

    #[must_use]
    pub fn death_reason(&self) -> DeathReason {
        self.death_reason
    }

    #[must_use]
    pub fn death_cycle(&self) -> Option<u32> {
        self.death_cycle
    }

    /// Moves the person into the next cycle: one cycle older, with every running timer advanced.
    pub fn advance_cycle(&mut self) {
        if !self.is_alive() {
            return;
        }
        self.current_cycle += 1;
        self.age += 1;

        if self.behavior.behavior.is_active() {
            self.behavior.time_last_active = Some(self.current_cycle);
        }
        if self.moud.moud_state == Moud::Current {
            self.moud.total_moud_cycles += 1;
        }
        self.moud.current_state_concurrent_cycles += 1;
        if matches!(self.hiv.hiv, Hiv::LowUnsuppressed | Hiv::LowSuppressed) {
            self.hiv.low_cd4_cycles += 1;
        }
    }

    #[must_use]
    pub fn current_cycle(&self) -> u32 {
        self.current_cycle
    }

    /// Cycles elapsed since `time`, or `None` if it never happened.
    #[must_use]
    pub fn cycles_since(&self, time: Option<u32>) -> Option<u32> {
        time.map(|t| self.current_cycle.saturating_sub(t))
    }

    /// Whether this cycle's effects should still be booked: true while alive and during the
    /// cycle of death.
    #[must_use]
    pub fn accepts_accounting(&self) -> bool {
        self.is_alive() || self.death_cycle == Some(self.current_cycle)
    }

    // endregion Lifecycle

    // region Demographics

    /// Age in cycles.
    #[must_use]
    pub fn age(&self) -> u32 {
        self.age
    }

    #[must_use]
    pub fn age_years(&self) -> u32 {
        self.age / CYCLES_PER_YEAR
    }

    #[must_use]
    pub fn sex(&self) -> Sex {
        self.sex
    }

    #[must_use]
    pub fn is_boomer(&self) -> bool {
        self.is_boomer
    }

    // endregion Demographics

    // region HCV

    #[must_use]
    pub fn hcv_details(&self) -> &HcvDetails {
        &self.hcv
    }

    #[must_use]
    pub fn hcv(&self) -> Hcv {
        self.hcv.hcv
    }

    #[must_use]
    pub fn fibrosis_state(&self) -> FibrosisState {
        self.hcv.fibrosis_state
    }

    #[must_use]
    pub fn is_cirrhotic(&self) -> bool {
        self.hcv.fibrosis_state.is_cirrhotic()
    }

    /// A new acute infection. Already-infected people are unaffected.
    pub fn infect_hcv(&mut self) {
        if !self.is_alive() || self.hcv.hcv.is_infected() {
            return;
        }
        self.hcv.hcv = Hcv::Acute;
        self.hcv.time_changed = Some(self.current_cycle);
        self.hcv.seropositive = true;
        self.hcv.times_infected += 1;
        if self.hcv.fibrosis_state == FibrosisState::None {
            self.hcv.fibrosis_state = FibrosisState::F0;
            self.hcv.time_fibrosis_state_changed = Some(self.current_cycle);
        }
    }

    pub fn progress_to_chronic(&mut self) {
        if !self.is_alive() || self.hcv.hcv != Hcv::Acute {
            return;
        }
        self.hcv.hcv = Hcv::Chronic;
        self.hcv.time_changed = Some(self.current_cycle);
    }

    /// Ends the infection. Fibrosis stays where it is.
    pub fn clear_hcv(&mut self, acute: bool) {
        if !self.is_alive() || !self.hcv.hcv.is_infected() {
            return;
        }
        self.hcv.hcv = Hcv::None;
        self.hcv.time_changed = Some(self.current_cycle);
        if acute {
            self.hcv.times_acute_cleared += 1;
        }
    }

    pub fn set_genotype_three(&mut self, is_genotype_three: bool) {
        if !self.is_alive() {
            return;
        }
        self.hcv.is_genotype_three = is_genotype_three;
    }

    /// Moves fibrosis one stage forward. Returns the new stage, if it moved.
    pub fn advance_fibrosis(&mut self) -> Option<FibrosisState> {
        if !self.is_alive() {
            return None;
        }
        let next = self.hcv.fibrosis_state.next()?;
        self.hcv.fibrosis_state = next;
        self.hcv.time_fibrosis_state_changed = Some(self.current_cycle);
        Some(next)
    }

    pub fn add_svr(&mut self) {
        if !self.is_alive() {
            return;
        }
        self.hcv.svrs += 1;
    }

    // endregion HCV

    // region HIV

    #[must_use]
    pub fn hiv_details(&self) -> &HivDetails {
        &self.hiv
    }

    #[must_use]
    pub fn hiv(&self) -> Hiv {
        self.hiv.hiv
    }

    /// New infections start with a high CD4 count and no suppression.
    pub fn infect_hiv(&mut self) {
        if !self.is_alive() || self.hiv.hiv.is_infected() {
            return;
        }
        self.set_hiv(Hiv::HighUnsuppressed);
    }

    pub fn set_hiv(&mut self, hiv: Hiv) {
        if !self.is_alive() || self.hiv.hiv == hiv {
            return;
        }
        self.hiv.hiv = hiv;
        self.hiv.time_changed = Some(self.current_cycle);
    }

    // endregion HIV

    // region HCC

    #[must_use]
    pub fn hcc_details(&self) -> &HccDetails {
        &self.hcc
    }

    pub fn develop_hcc(&mut self) -> Option<HccState> {
        if !self.is_alive() {
            return None;
        }
        let next = self.hcc.hcc_state.next()?;
        self.hcc.hcc_state = next;
        Some(next)
    }

    pub fn diagnose_hcc(&mut self) {
        if !self.is_alive() || self.hcc.hcc_state == HccState::None {
            return;
        }
        self.hcc.hcc_diagnosed = true;
    }

    // endregion HCC

    // region Behavior

    #[must_use]
    pub fn behavior_details(&self) -> &BehaviorDetails {
        &self.behavior
    }

    #[must_use]
    pub fn behavior(&self) -> Behavior {
        self.behavior.behavior
    }

    #[must_use]
    pub fn is_active_user(&self) -> bool {
        self.behavior.behavior.is_active()
    }

    /// Changes drug-use behavior. Nobody returns to `never` once they have used.
    pub fn set_behavior(&mut self, behavior: Behavior) {
        if !self.is_alive() || behavior == self.behavior.behavior || behavior == Behavior::Never {
            return;
        }
        if behavior.is_active() {
            self.behavior.time_last_active = Some(self.current_cycle);
        }
        self.behavior.behavior = behavior;
    }

    #[must_use]
    pub fn currently_overdosing(&self) -> bool {
        self.currently_overdosing
    }

    #[must_use]
    pub fn num_overdoses(&self) -> u32 {
        self.num_overdoses
    }

    pub fn begin_overdose(&mut self) {
        if !self.is_alive() || self.currently_overdosing {
            return;
        }
        self.currently_overdosing = true;
        self.num_overdoses += 1;
    }

    pub fn end_overdose(&mut self) {
        if !self.is_alive() {
            return;
        }
        self.currently_overdosing = false;
    }

    // endregion Behavior

    // region MOUD

    #[must_use]
    pub fn moud_details(&self) -> &MoudDetails {
        &self.moud
    }

    #[must_use]
    pub fn moud(&self) -> Moud {
        self.moud.moud_state
    }

    /// Moves to a new MOUD state. People who have never used stay out of MOUD.
    pub fn transition_moud(&mut self, next: Moud) {
        if !self.is_alive() || self.behavior.behavior == Behavior::Never || next == self.moud.moud_state {
            return;
        }
        if next == Moud::Current {
            self.moud.time_started_moud = Some(self.current_cycle);
        }
        self.moud.moud_state = next;
        self.moud.current_state_concurrent_cycles = 0;
    }

    // endregion MOUD

    // region Pregnancy

    #[must_use]
    pub fn pregnancy_details(&self) -> &PregnancyDetails {
        &self.pregnancy
    }

    #[must_use]
    pub fn pregnancy_state(&self) -> PregnancyState {
        self.pregnancy.pregnancy_state
    }

    fn set_pregnancy_state(&mut self, state: PregnancyState) {
        self.pregnancy.pregnancy_state = state;
        self.pregnancy.time_of_pregnancy_change = Some(self.current_cycle);
    }

    pub fn impregnate(&mut self) {
        if !self.is_alive() || self.sex != Sex::Female {
            return;
        }
        self.pregnancy.count += 1;
        self.set_pregnancy_state(PregnancyState::Pregnant);
    }

    /// Pregnancy loss before term; the person returns to not pregnant.
    pub fn miscarry(&mut self) {
        if !self.is_alive() || self.pregnancy.pregnancy_state != PregnancyState::Pregnant {
            return;
        }
        self.pregnancy.num_miscarriages += 1;
        self.set_pregnancy_state(PregnancyState::None);
    }

    /// Pregnancy loss at term; the person still enters the postpartum period.
    pub fn stillbirth(&mut self) {
        if !self.is_alive() || self.pregnancy.pregnancy_state != PregnancyState::Pregnant {
            return;
        }
        self.pregnancy.num_miscarriages += 1;
        self.set_pregnancy_state(PregnancyState::Postpartum);
    }

    /// A live birth of one or more infants.
    pub fn birth(&mut self, children: &[Child]) {
        if !self.is_alive() || self.pregnancy.pregnancy_state != PregnancyState::Pregnant {
            return;
        }
        for child in children {
            if child.tested {
                self.pregnancy.num_hcv_tests += 1;
            }
            if child.hcv.is_infected() {
                self.pregnancy.num_hcv_infections += 1;
            }
            self.pregnancy.num_infants += 1;
            self.pregnancy.children.push(*child);
        }
        self.set_pregnancy_state(PregnancyState::Postpartum);
    }

    pub fn add_infant_exposure(&mut self) {
        if !self.is_alive() {
            return;
        }
        self.pregnancy.num_hcv_exposures += 1;
    }

    pub fn end_postpartum(&mut self) {
        if !self.is_alive() || self.pregnancy.pregnancy_state != PregnancyState::Postpartum {
            return;
        }
        self.set_pregnancy_state(PregnancyState::None);
    }

    // endregion Pregnancy

    // region Staging

    #[must_use]
    pub fn staging_details(&self) -> &StagingDetails {
        &self.staging
    }

    #[must_use]
    pub fn measured_fibrosis_state(&self) -> MeasuredFibrosisState {
        self.staging.measured_fibrosis_state
    }

    pub fn diagnose_fibrosis(&mut self, measured: MeasuredFibrosisState) {
        if !self.is_alive() {
            return;
        }
        self.staging.measured_fibrosis_state = measured;
        self.staging.time_of_last_staging = Some(self.current_cycle);
    }

    pub fn set_had_second_test(&mut self, had_second_test: bool) {
        if !self.is_alive() {
            return;
        }
        self.staging.had_second_test = had_second_test;
    }

    // endregion Staging

    // region Screening

    #[must_use]
    pub fn screening_details(&self, infection: InfectionType) -> &ScreeningDetails {
        self.screening.get(infection)
    }

    #[must_use]
    pub fn is_identified(&self, infection: InfectionType) -> bool {
        self.screening.get(infection).identified
    }

    pub fn mark_screened(&mut self, infection: InfectionType, channel: ScreeningChannel) {
        if !self.is_alive() {
            return;
        }
        let screening = self.screening.get_mut(infection);
        screening.time_of_last_screening = Some(self.current_cycle);
        screening.last_channel = Some(channel);
    }

    pub fn record_test(&mut self, infection: InfectionType, test: ScreeningTest, positive: bool) {
        if !self.is_alive() {
            return;
        }
        let screening = self.screening.get_mut(infection);
        match test {
            ScreeningTest::Ab => {
                screening.number_ab_tests += 1;
                if positive {
                    screening.ab_positive = true;
                }
            }
            ScreeningTest::Rna => screening.number_rna_tests += 1,
        }
        screening.last_test = Some(test);
    }

    pub fn diagnose(&mut self, infection: InfectionType) {
        if !self.is_alive() {
            return;
        }
        let current_cycle = self.current_cycle;
        let screening = self.screening.get_mut(infection);
        screening.identified = true;
        screening.time_identified = Some(current_cycle);
        screening.ab_positive = true;
    }

    pub fn clear_diagnosis(&mut self, infection: InfectionType) {
        if !self.is_alive() {
            return;
        }
        self.screening.get_mut(infection).identified = false;
    }

    // endregion Screening

    // region Linkage

    #[must_use]
    pub fn linkage_details(&self, infection: InfectionType) -> &LinkageDetails {
        self.linkage.get(infection)
    }

    #[must_use]
    pub fn link_state(&self, infection: InfectionType) -> LinkageState {
        self.linkage.get(infection).link_state
    }

    /// Records how the person will be linked once they are; set when a screen identifies them.
    pub fn set_link_type(&mut self, infection: InfectionType, link_type: LinkageType) {
        if !self.is_alive() {
            return;
        }
        self.linkage.get_mut(infection).link_type = link_type;
    }

    pub fn link(&mut self, infection: InfectionType, link_type: LinkageType) {
        if !self.is_alive() {
            return;
        }
        let current_cycle = self.current_cycle;
        let linkage = self.linkage.get_mut(infection);
        linkage.link_state = LinkageState::Linked;
        linkage.time_link_change = Some(current_cycle);
        linkage.link_type = link_type;
        linkage.link_count += 1;
    }

    pub fn unlink(&mut self, infection: InfectionType) {
        if !self.is_alive() || self.link_state(infection) != LinkageState::Linked {
            return;
        }
        let current_cycle = self.current_cycle;
        let linkage = self.linkage.get_mut(infection);
        linkage.link_state = LinkageState::Unlinked;
        linkage.time_link_change = Some(current_cycle);
    }

    // endregion Linkage

    // region Treatment

    #[must_use]
    pub fn treatment_details(&self, infection: InfectionType) -> &TreatmentDetails {
        self.treatment.get(infection)
    }

    #[must_use]
    pub fn in_treatment(&self, infection: InfectionType) -> bool {
        self.treatment.get(infection).initiated_treatment
    }

    pub fn initiate_treatment(&mut self, infection: InfectionType) {
        if !self.is_alive() {
            return;
        }
        let current_cycle = self.current_cycle;
        let treatment = self.treatment.get_mut(infection);
        treatment.initiated_treatment = true;
        treatment.time_of_treatment_initiation = Some(current_cycle);
        treatment.num_starts += 1;
    }

    /// Starts a second course after a failed first one. The failed course used up this cycle,
    /// so the new course's first cycle is the next one.
    pub fn initiate_retreatment(&mut self, infection: InfectionType) {
        if !self.is_alive() {
            return;
        }
        let next_cycle = self.current_cycle + 1;
        let treatment = self.treatment.get_mut(infection);
        treatment.initiated_treatment = true;
        treatment.retreatment = true;
        treatment.num_retreatments += 1;
        treatment.time_of_treatment_initiation = Some(next_cycle);
    }

    pub fn record_toxic_reaction(&mut self, infection: InfectionType) {
        if !self.is_alive() {
            return;
        }
        self.treatment.get_mut(infection).num_toxic_reactions += 1;
    }

    pub fn withdraw_treatment(&mut self, infection: InfectionType) {
        if !self.is_alive() {
            return;
        }
        self.treatment.get_mut(infection).num_withdrawals += 1;
    }

    pub fn complete_treatment(&mut self, infection: InfectionType) {
        if !self.is_alive() {
            return;
        }
        self.treatment.get_mut(infection).num_completed += 1;
    }

    pub fn end_treatment(&mut self, infection: InfectionType) {
        if !self.is_alive() {
            return;
        }
        let treatment = self.treatment.get_mut(infection);
        treatment.initiated_treatment = false;
        treatment.retreatment = false;
    }

    // endregion Treatment

    // region Accounting

    #[must_use]
    pub fn accounts(&self) -> &Accounts {
        &self.accounts
    }

    pub(crate) fn accounts_mut(&mut self) -> &mut Accounts {
        &mut self.accounts
    }

    // endregion Accounting

    /// Checks combinations of state that no sequence of events should produce.
    pub fn check_invariants(&self) -> Result<(), HepceError> {
        let violation = |detail: String| {
            Err(HepceError::InvariantViolation {
                person: self.id.0,
                detail,
            })
        };

        if self.is_alive() == self.death_cycle.is_some() {
            return violation(format!(
                "death reason {} with death cycle {:?}",
                self.death_reason, self.death_cycle
            ));
        }
        for infection in InfectionType::ALL {
            let infected = match infection {
                InfectionType::Hcv => self.hcv.hcv.is_infected(),
                InfectionType::Hiv => self.hiv.hiv.is_infected(),
            };
            let linked = self.link_state(*infection) == LinkageState::Linked;
            if linked && !infected {
                return violation(format!("linked to {infection} care without an infection"));
            }
            if self.in_treatment(*infection) && !linked {
                return violation(format!("in {infection} treatment without being linked"));
            }
        }
        if self.sex == Sex::Male && self.pregnancy.pregnancy_state != PregnancyState::NotApplicable {
            return violation(format!("male with pregnancy state {}", self.pregnancy.pregnancy_state));
        }
        if self.hcv.hcv.is_infected() && self.hcv.fibrosis_state == FibrosisState::None {
            return violation("HCV infection without a fibrosis stage".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(init: PersonInit) -> Person {
        Person::from_init(PersonId(0), &init).unwrap()
    }

    #[test]
    fn advance_cycle_ages_and_updates_timers() {
        let mut p = person(
            PersonInit::new(239, Sex::Male)
                .with_behavior(Behavior::Injection)
                .with_moud(Moud::Current)
                .with_hiv(Hiv::LowUnsuppressed),
        );
        assert_eq!(p.age_years(), 19);
        p.advance_cycle();
        assert_eq!(p.age(), 240);
        assert_eq!(p.age_years(), 20);
        assert_eq!(p.current_cycle(), 1);
        assert_eq!(p.behavior_details().time_last_active, Some(1));
        assert_eq!(p.moud_details().total_moud_cycles, 1);
        assert_eq!(p.hiv_details().low_cd4_cycles, 1);
    }

    #[test]
    fn set_death_is_idempotent_and_freezes() {
        let mut p = person(PersonInit::new(240, Sex::Female));
        p.advance_cycle();
        p.advance_cycle();
        p.set_death(DeathReason::Background);
        assert!(!p.is_alive());
        assert_eq!(p.death_cycle(), Some(2));

        p.set_death(DeathReason::Liver);
        assert_eq!(p.death_reason(), DeathReason::Background);

        let frozen = p.clone();
        p.advance_cycle();
        p.infect_hcv();
        p.impregnate();
        p.set_behavior(Behavior::Injection);
        assert_eq!(p, frozen);
    }

    #[test]
    fn hcv_infection_lifecycle() {
        let mut p = person(PersonInit::new(240, Sex::Male));
        p.advance_cycle();
        p.infect_hcv();
        assert_eq!(p.hcv(), Hcv::Acute);
        assert_eq!(p.fibrosis_state(), FibrosisState::F0);
        assert!(p.hcv_details().seropositive);

        // Reinfection while infected is ignored.
        p.infect_hcv();
        assert_eq!(p.hcv_details().times_infected, 1);

        p.clear_hcv(true);
        assert_eq!(p.hcv(), Hcv::None);
        assert_eq!(p.hcv_details().times_acute_cleared, 1);
        // Fibrosis is not reversed by clearance.
        assert_eq!(p.fibrosis_state(), FibrosisState::F0);
    }

    #[test]
    fn behavior_never_returns_to_never() {
        let mut p = person(PersonInit::new(240, Sex::Male));
        p.advance_cycle();
        p.set_behavior(Behavior::Noninjection);
        assert_eq!(p.behavior_details().time_last_active, Some(1));
        p.set_behavior(Behavior::Never);
        assert_eq!(p.behavior(), Behavior::Noninjection);
        p.set_behavior(Behavior::FormerNoninjection);
        assert_eq!(p.behavior(), Behavior::FormerNoninjection);
    }

    #[test]
    fn moud_requires_use_history() {
        let mut p = person(PersonInit::new(240, Sex::Male));
        p.transition_moud(Moud::Current);
        assert_eq!(p.moud(), Moud::None);

        p.set_behavior(Behavior::Injection);
        p.transition_moud(Moud::Current);
        assert_eq!(p.moud(), Moud::Current);
        assert_eq!(p.moud_details().time_started_moud, Some(0));
    }

    #[test]
    fn pregnancy_transitions() {
        let mut p = person(PersonInit::new(300, Sex::Female));
        p.impregnate();
        assert_eq!(p.pregnancy_state(), PregnancyState::Pregnant);
        p.birth(&[
            Child { hcv: Hcv::Chronic, tested: true },
            Child { hcv: Hcv::None, tested: false },
        ]);
        let details = p.pregnancy_details();
        assert_eq!(details.pregnancy_state, PregnancyState::Postpartum);
        assert_eq!(details.num_infants, 2);
        assert_eq!(details.num_hcv_infections, 1);
        assert_eq!(details.num_hcv_tests, 1);
        p.end_postpartum();
        assert_eq!(p.pregnancy_state(), PregnancyState::None);

        let mut man = person(PersonInit::new(300, Sex::Male));
        man.impregnate();
        assert_eq!(man.pregnancy_state(), PregnancyState::NotApplicable);
    }

    #[test]
    fn linkage_and_treatment_counters() {
        let mut p = person(PersonInit::new(300, Sex::Male).with_hcv(Hcv::Chronic));
        p.diagnose(InfectionType::Hcv);
        p.link(InfectionType::Hcv, LinkageType::Intervention);
        p.initiate_treatment(InfectionType::Hcv);
        assert!(p.check_invariants().is_ok());

        let treatment = p.treatment_details(InfectionType::Hcv);
        assert!(treatment.initiated_treatment);
        assert_eq!(treatment.num_starts, 1);
        assert_eq!(p.linkage_details(InfectionType::Hcv).link_count, 1);
        // HIV records are untouched.
        assert_eq!(p.link_state(InfectionType::Hiv), LinkageState::Never);

        p.end_treatment(InfectionType::Hcv);
        p.unlink(InfectionType::Hcv);
        assert_eq!(p.link_state(InfectionType::Hcv), LinkageState::Unlinked);
    }

    #[test]
    fn invariants_catch_linked_without_infection() {
        let mut p = person(PersonInit::new(300, Sex::Male).with_hcv(Hcv::Chronic));
        p.diagnose(InfectionType::Hcv);
        p.link(InfectionType::Hcv, LinkageType::Background);
        p.clear_hcv(false);
        let err = p.check_invariants().unwrap_err();
        assert!(matches!(err, HepceError::InvariantViolation { person: 0, .. }));
    }

    #[test]
    fn cohort_links_are_restored() {
        let p = person(
            PersonInit::new(300, Sex::Male)
                .with_hcv(Hcv::Chronic)
                .diagnosed_with_hcv(true),
        );
        assert!(p.is_identified(InfectionType::Hcv));
        assert_eq!(p.link_state(InfectionType::Hcv), LinkageState::Linked);
        assert!(p.check_invariants().is_ok());
    }
}
