use crate::{
    PersonId,
    context::Context,
    error::HepceError,
    log::trace,
    people::{Person, PersonInit, people_data::PeopleData},
};

pub trait ContextPeopleExt {
    fn get_current_population(&self) -> usize;

    /// Adds a new person with the given initial attributes.
    fn add_person(&mut self, init: PersonInit) -> Result<PersonId, HepceError>;

    /// Adds every row of a cohort, stopping at the first invalid row.
    fn add_cohort(&mut self, cohort: &[PersonInit]) -> Result<Vec<PersonId>, HepceError>;

    fn get_person(&self, person_id: PersonId) -> Option<&Person>;

    /// Ids of everyone matching `predicate`, in id order.
    fn query_people(&self, predicate: impl Fn(&Person) -> bool) -> Vec<PersonId>;

    fn query_people_count(&self, predicate: impl Fn(&Person) -> bool) -> usize;
}

impl ContextPeopleExt for Context {
    fn get_current_population(&self) -> usize {
        match self.get_data_container::<PeopleData>() {
            None => 0,
            Some(people_data) => people_data.people.len(),
        }
    }

    fn add_person(&mut self, init: PersonInit) -> Result<PersonId, HepceError> {
        let person_id = self.get_data_container_mut::<PeopleData>().add_person(&init)?;
        trace!("added person {person_id}");
        Ok(person_id)
    }

    fn add_cohort(&mut self, cohort: &[PersonInit]) -> Result<Vec<PersonId>, HepceError> {
        let people_data = self.get_data_container_mut::<PeopleData>();
        cohort.iter().map(|init| people_data.add_person(init)).collect()
    }

    fn get_person(&self, person_id: PersonId) -> Option<&Person> {
        self.get_data_container::<PeopleData>()
            .and_then(|people_data| people_data.get_person(person_id))
    }

    fn query_people(&self, predicate: impl Fn(&Person) -> bool) -> Vec<PersonId> {
        self.get_data_container::<PeopleData>()
            .map(|people_data| {
                people_data
                    .people
                    .iter()
                    .filter(|person| predicate(person))
                    .map(Person::id)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn query_people_count(&self, predicate: impl Fn(&Person) -> bool) -> usize {
        self.get_data_container::<PeopleData>()
            .map_or(0, |people_data| {
                people_data.people.iter().filter(|person| predicate(person)).count()
            })
    }
}

/// Moves the population in and out of the context around a run.
pub(crate) trait ContextPeopleExtInternal {
    fn take_population(&mut self) -> Vec<Person>;
    fn restore_population(&mut self, people: Vec<Person>);
}

impl ContextPeopleExtInternal for Context {
    fn take_population(&mut self) -> Vec<Person> {
        std::mem::take(&mut self.get_data_container_mut::<PeopleData>().people)
    }

    fn restore_population(&mut self, people: Vec<Person>) {
        self.get_data_container_mut::<PeopleData>().people = people;
    }
}
