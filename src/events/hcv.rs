use super::{CycleEffect, Transition, care};
use crate::{
    error::HepceError,
    parameters::{
        Parameters,
        keys::{CourseKey, DemographicKey},
    },
    people::Person,
    random::Sampler,
    state::{CostCategory, Hcv, InfectionType, LinkageState, LinkageType, UtilityCategory},
};

const HCV: InfectionType = InfectionType::Hcv;

/// New infections, and the end of the acute phase for existing ones.
pub(super) fn infection(
    person: &mut Person,
    sampler: &mut Sampler,
    parameters: &Parameters,
    effect: &mut CycleEffect,
) -> Result<(), HepceError> {
    let hcv = &parameters.hcv;
    match person.hcv() {
        Hcv::Chronic => {}
        Hcv::Acute => {
            let since_infection = person.cycles_since(person.hcv_details().time_changed);
            if since_infection.is_some_and(|since| since >= hcv.acute_duration) {
                person.progress_to_chronic();
                effect.transition(Transition::Hcv(Hcv::Chronic));
            }
        }
        Hcv::None => {
            let incidence = hcv
                .incidence
                .require("hcv.incidence", &DemographicKey::of(person))?;
            if !sampler.bernoulli(incidence.probability) {
                return Ok(());
            }
            person.infect_hcv();
            effect.transition(Transition::Hcv(Hcv::Acute));
            person.set_genotype_three(sampler.bernoulli(hcv.genotype_three_probability));
        }
    }
    Ok(())
}

/// Spontaneous clearance of an acute infection. People on treatment are left to it, so their
/// cure counts as an SVR.
pub(super) fn clearance(
    person: &mut Person,
    sampler: &mut Sampler,
    parameters: &Parameters,
    effect: &mut CycleEffect,
) {
    if person.hcv() != Hcv::Acute || person.in_treatment(HCV) {
        return;
    }
    if sampler.bernoulli(parameters.hcv.clearance()) {
        person.clear_hcv(true);
        person.clear_diagnosis(HCV);
        person.unlink(HCV);
        effect.transition(Transition::Hcv(Hcv::None));
    }
}

/// People who left care recently may come back on their own.
pub(super) fn voluntary_relink(
    person: &mut Person,
    sampler: &mut Sampler,
    parameters: &Parameters,
    effect: &mut CycleEffect,
) {
    let relink = &parameters.hcv.voluntary_relink;
    if person.link_state(HCV) != LinkageState::Unlinked || !person.hcv().is_infected() {
        return;
    }
    let since_unlinked = person.cycles_since(person.linkage_details(HCV).time_link_change);
    if !since_unlinked.is_some_and(|since| since <= relink.duration) {
        return;
    }
    if sampler.bernoulli(relink.probability) {
        effect.cost(
            CostCategory::Screening,
            parameters.hcv.screening.background_rna.cost,
        );
        person.link(HCV, LinkageType::Background);
        effect.transition(Transition::Linked {
            infection: HCV,
            link_type: LinkageType::Background,
        });
    }
}

/// Treatment engagement for a linked person: loss to follow-up, care visits, initiation, and
/// the course itself through toxicity, withdrawal, and completion.
pub(super) fn treatment(
    person: &mut Person,
    sampler: &mut Sampler,
    parameters: &Parameters,
    effect: &mut CycleEffect,
) -> Result<(), HepceError> {
    let treatment = &parameters.hcv.treatment;
    if person.link_state(HCV) != LinkageState::Linked {
        return Ok(());
    }
    if care::lost_to_follow_up(person, sampler, HCV, treatment, effect) {
        return Ok(());
    }
    care::charge_visit(person, HCV, treatment, effect);

    if !person.in_treatment(HCV) {
        if !care::is_eligible(person, HCV, treatment)
            || !sampler.bernoulli(treatment.initiation_probability)
        {
            return Ok(());
        }
        person.initiate_treatment(HCV);
        effect.transition(Transition::TreatmentStarted {
            infection: HCV,
            retreatment: false,
        });
    }

    let key = CourseKey {
        retreatment: person.treatment_details(HCV).retreatment,
        genotype_three: person.hcv_details().is_genotype_three,
        cirrhotic: person.measured_fibrosis_state().is_cirrhotic(),
    };
    let course = parameters.hcv.courses.require("hcv.courses", &key)?;
    effect.cost(CostCategory::Treatment, course.cost);
    effect.utility(UtilityCategory::Treatment, treatment.treatment_utility);

    if sampler.bernoulli(course.toxicity_probability) {
        person.record_toxic_reaction(HCV);
        effect.cost(CostCategory::Treatment, treatment.toxicity_cost);
        effect.utility(UtilityCategory::Treatment, treatment.toxicity_utility);
        effect.transition(Transition::ToxicReaction(HCV));
    }

    if sampler.bernoulli(course.withdrawal_probability) {
        person.withdraw_treatment(HCV);
        effect.transition(Transition::Withdrew(HCV));
        care::end_engagement(person, HCV, effect);
        return Ok(());
    }

    // The cycle of initiation counts as the first cycle on treatment.
    let cycles_on_treatment = person
        .cycles_since(person.treatment_details(HCV).time_of_treatment_initiation)
        .map_or(0, |since| since + 1);
    if cycles_on_treatment < course.duration {
        return Ok(());
    }

    person.complete_treatment(HCV);
    effect.transition(Transition::TreatmentCompleted(HCV));
    if sampler.bernoulli(course.svr_probability) {
        person.clear_hcv(false);
        person.add_svr();
        effect.transition(Transition::Svr);
        effect.transition(Transition::Hcv(Hcv::None));
        care::end_engagement(person, HCV, effect);
        person.clear_diagnosis(HCV);
    } else if !person.treatment_details(HCV).retreatment {
        person.initiate_retreatment(HCV);
        effect.transition(Transition::TreatmentStarted {
            infection: HCV,
            retreatment: true,
        });
    } else {
        care::end_engagement(person, HCV, effect);
    }
    Ok(())
}
