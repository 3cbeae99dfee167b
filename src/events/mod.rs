/*!

The per-cycle events.

An [`Event`] is one step of a person's cycle. Events hold no per-person data: everything an
event needs comes from the [`Person`], the person's [`Sampler`], and the read-only
[`Parameters`]. Executing an event mutates the person and returns a [`CycleEffect`] describing
what it cost, which utility weights it set, and which transitions it took. The driver hands the
effect to the `Accountant` before running the next event, so later events observe the utility
weights set earlier in the same cycle.

Events run in a single fixed order, the declaration order of [`Event`]:

1. base and behavior: aging, behavior changes, MOUD, overdose, pregnancy
2. infection: HCV infection and clearance, HIV infection
3. care: HCV screening, linking, voluntary relinking, and treatment, then the same for HIV
4. liver: fibrosis progression, fibrosis staging, HCC
5. death

Death runs last so that it sees this cycle's disease progression.

*/

mod base;
mod behavior;
mod care;
mod fibrosis;
mod hcv;
mod hiv;

use crate::{
    error::HepceError,
    parameters::Parameters,
    people::Person,
    random::Sampler,
    state::{
        Behavior, CostCategory, DeathReason, FibrosisState, Hcv, HccState, Hiv, InfectionType,
        LinkageType, MeasuredFibrosisState, Moud, PregnancyState, ScreeningChannel,
        ScreeningTest, UtilityCategory,
    },
};
use serde::Serialize;

crate::define_state!(
    /// Every event, declared in execution order.
    Event {
        Aging => "aging",
        BehaviorChanges => "behavior_changes",
        Moud => "moud",
        Overdose => "overdose",
        Pregnancy => "pregnancy",
        HcvInfection => "hcv_infection",
        HcvClearance => "hcv_clearance",
        HivInfection => "hiv_infection",
        HcvScreening => "hcv_screening",
        HcvLinking => "hcv_linking",
        HcvVoluntaryRelink => "hcv_voluntary_relink",
        HcvTreatment => "hcv_treatment",
        HivScreening => "hiv_screening",
        HivLinking => "hiv_linking",
        HivTreatment => "hiv_treatment",
        FibrosisProgression => "fibrosis_progression",
        FibrosisStaging => "fibrosis_staging",
        Hcc => "hcc",
        Death => "death",
    }
);

impl Event {
    /// Runs the event for one person. Dead people are left alone and produce an empty effect.
    pub fn execute(
        self,
        person: &mut Person,
        sampler: &mut Sampler,
        parameters: &Parameters,
    ) -> Result<CycleEffect, HepceError> {
        let mut effect = CycleEffect::default();
        if !person.is_alive() {
            return Ok(effect);
        }

        match self {
            Event::Aging => base::aging(person, parameters, &mut effect)?,
            Event::BehaviorChanges => {
                behavior::behavior_changes(person, sampler, parameters, &mut effect)?;
            }
            Event::Moud => behavior::moud(person, sampler, parameters, &mut effect)?,
            Event::Overdose => behavior::overdose(person, sampler, parameters, &mut effect)?,
            Event::Pregnancy => behavior::pregnancy(person, sampler, parameters, &mut effect)?,
            Event::HcvInfection => hcv::infection(person, sampler, parameters, &mut effect)?,
            Event::HcvClearance => hcv::clearance(person, sampler, parameters, &mut effect),
            Event::HivInfection => hiv::infection(person, sampler, parameters, &mut effect)?,
            Event::HcvScreening => care::screening(
                person,
                sampler,
                InfectionType::Hcv,
                &parameters.hcv.screening,
                &mut effect,
            )?,
            Event::HcvLinking => care::linking(
                person,
                sampler,
                InfectionType::Hcv,
                &parameters.hcv.linking,
                &mut effect,
            )?,
            Event::HcvVoluntaryRelink => {
                hcv::voluntary_relink(person, sampler, parameters, &mut effect);
            }
            Event::HcvTreatment => hcv::treatment(person, sampler, parameters, &mut effect)?,
            Event::HivScreening => care::screening(
                person,
                sampler,
                InfectionType::Hiv,
                &parameters.hiv.screening,
                &mut effect,
            )?,
            Event::HivLinking => care::linking(
                person,
                sampler,
                InfectionType::Hiv,
                &parameters.hiv.linking,
                &mut effect,
            )?,
            Event::HivTreatment => hiv::treatment(person, sampler, parameters, &mut effect)?,
            Event::FibrosisProgression => {
                fibrosis::progression(person, sampler, parameters, &mut effect)?;
            }
            Event::FibrosisStaging => fibrosis::staging(person, sampler, parameters, &mut effect)?,
            Event::Hcc => fibrosis::hcc(person, sampler, parameters, &mut effect),
            Event::Death => base::death(person, sampler, parameters, &mut effect)?,
        }
        Ok(effect)
    }
}

/// A state change taken by an event, kept for tracing.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Behavior(Behavior),
    Moud(Moud),
    OverdoseBegan,
    Pregnancy(PregnancyState),
    Births(u32),
    Hcv(Hcv),
    Hiv(Hiv),
    Screened {
        infection: InfectionType,
        channel: ScreeningChannel,
    },
    Tested {
        infection: InfectionType,
        test: ScreeningTest,
        positive: bool,
    },
    Identified(InfectionType),
    FalsePositive(InfectionType),
    Linked {
        infection: InfectionType,
        link_type: LinkageType,
    },
    Unlinked(InfectionType),
    TreatmentStarted {
        infection: InfectionType,
        retreatment: bool,
    },
    ToxicReaction(InfectionType),
    Withdrew(InfectionType),
    TreatmentCompleted(InfectionType),
    Svr,
    Fibrosis(FibrosisState),
    MeasuredFibrosis(MeasuredFibrosisState),
    Hcc(HccState),
    HccDiagnosed,
    Died(DeathReason),
}

/// What one event did to one person in one cycle.
///
/// Costs are nominal; the accountant discounts them. Utility entries replace the current weight
/// of their category, and when a category appears more than once the last entry wins.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CycleEffect {
    costs: Vec<(CostCategory, f64)>,
    utilities: Vec<(UtilityCategory, f64)>,
    transitions: Vec<Transition>,
}

impl CycleEffect {
    pub fn cost(&mut self, category: CostCategory, amount: f64) {
        if amount != 0.0 {
            self.costs.push((category, amount));
        }
    }

    pub fn utility(&mut self, category: UtilityCategory, weight: f64) {
        self.utilities.push((category, weight));
    }

    pub fn transition(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    #[must_use]
    pub fn costs(&self) -> &[(CostCategory, f64)] {
        &self.costs
    }

    #[must_use]
    pub fn utilities(&self) -> &[(UtilityCategory, f64)] {
        &self.utilities
    }

    #[must_use]
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.costs.iter().map(|(_, amount)| amount).sum()
    }

    /// The last weight this effect sets for `category`.
    #[must_use]
    pub fn utility_for(&self, category: UtilityCategory) -> Option<f64> {
        self.utilities
            .iter()
            .rev()
            .find(|(c, _)| *c == category)
            .map(|(_, weight)| *weight)
    }

    /// True when nothing was charged and no state changed.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.costs.is_empty() && self.transitions.is_empty()
    }
}

/// The events of a run, fixed once before the first cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct EventPipeline {
    events: Vec<Event>,
}

impl EventPipeline {
    /// Every event.
    #[must_use]
    pub fn standard() -> Self {
        EventPipeline {
            events: Event::ALL.to_vec(),
        }
    }

    /// A subset of the events. Whatever order they are given in, they run in the standard order,
    /// each at most once.
    #[must_use]
    pub fn from_events(events: &[Event]) -> Self {
        let mut events = events.to_vec();
        events.sort_unstable();
        events.dedup();
        EventPipeline { events }
    }

    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    #[must_use]
    pub fn contains(&self, event: Event) -> bool {
        self.events.binary_search(&event).is_ok()
    }
}

impl Default for EventPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        people::PersonInit,
        state::Sex,
        testing::{alive_person, parameters},
    };

    #[test]
    fn pipeline_runs_in_canonical_order() {
        let pipeline =
            EventPipeline::from_events(&[Event::Death, Event::Aging, Event::Hcc, Event::Aging]);
        assert_eq!(pipeline.events(), &[Event::Aging, Event::Hcc, Event::Death]);
        assert!(pipeline.contains(Event::Hcc));
        assert!(!pipeline.contains(Event::Moud));

        let standard = EventPipeline::standard();
        assert_eq!(standard.events().len(), 19);
        assert_eq!(standard.events().first(), Some(&Event::Aging));
        assert_eq!(standard.events().last(), Some(&Event::Death));
    }

    #[test]
    fn event_names_parse() {
        assert_eq!("hcv_voluntary_relink".parse::<Event>().unwrap(), Event::HcvVoluntaryRelink);
        assert!("vaccination".parse::<Event>().is_err());
    }

    #[test]
    fn dead_people_are_left_alone() {
        let parameters = parameters();
        let mut person = alive_person(PersonInit::new(300, Sex::Male));
        person.set_death(DeathReason::Background);
        let before = person.clone();

        let mut sampler = Sampler::new(7);
        for event in Event::ALL {
            let effect = event.execute(&mut person, &mut sampler, &parameters).unwrap();
            assert_eq!(effect, CycleEffect::default());
        }
        assert_eq!(person, before);
        assert_eq!(sampler.draws(), 0);
    }

    #[test]
    fn zero_costs_are_dropped() {
        let mut effect = CycleEffect::default();
        effect.cost(CostCategory::Screening, 0.0);
        effect.cost(CostCategory::Screening, 12.5);
        effect.utility(UtilityCategory::Liver, 0.9);
        effect.utility(UtilityCategory::Liver, 0.7);
        assert_eq!(effect.costs(), &[(CostCategory::Screening, 12.5)]);
        assert_eq!(effect.utility_for(UtilityCategory::Liver), Some(0.7));
        assert_eq!(effect.utility_for(UtilityCategory::Hiv), None);
        assert!(!effect.is_quiet());
    }

    #[test]
    fn transitions_serialize_with_state_names() {
        let json = serde_json::to_string(&Transition::Hcv(Hcv::Acute)).unwrap();
        assert_eq!(json, r#"{"hcv":"acute"}"#);
        let json = serde_json::to_string(&Transition::OverdoseBegan).unwrap();
        assert_eq!(json, r#""overdose_began""#);
    }
}
