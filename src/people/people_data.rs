use crate::{
    PersonId,
    context::DataPlugin,
    error::HepceError,
    people::{Person, PersonInit},
};

/// Stores the population. Person ids are indices into `people`.
#[derive(Default)]
pub(crate) struct PeopleData {
    pub(crate) people: Vec<Person>,
}

impl DataPlugin for PeopleData {
    const new: &'static dyn Fn() -> Self = &PeopleData::default;
}

impl PeopleData {
    pub fn add_person(&mut self, init: &PersonInit) -> Result<PersonId, HepceError> {
        let person_id = PersonId(self.people.len());
        self.people.push(Person::from_init(person_id, init)?);
        Ok(person_id)
    }

    pub fn get_person(&self, person_id: PersonId) -> Option<&Person> {
        self.people.get(person_id.0)
    }
}
