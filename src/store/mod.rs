// Wizard state container
//
// `AppStore` is the single source of truth for the in-progress application.
// All mutation goes through the named reducers below; each reducer merges a
// slice-level patch, bumps the revision counter, and persists synchronously.
// Step screens keep their own edit buffers and resync when the revision they
// last observed differs from the current one.

pub mod repository;

use crate::models::application::{
    ApplicationData, FamilyAndFinancialInformation, Gender, PersonalInformation,
    SituationInformation, Step,
};
use log::info;
use repository::ApplicationRepository;

/// Partial update for the personal slice. `None` leaves a field untouched;
/// the nested options allow clearing date of birth / gender explicitly.
#[derive(Debug, Clone, Default)]
pub struct PersonalPatch {
    pub name: Option<String>,
    pub national_id: Option<String>,
    pub date_of_birth: Option<Option<String>>,
    pub gender: Option<Option<Gender>>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl From<PersonalInformation> for PersonalPatch {
    fn from(p: PersonalInformation) -> Self {
        Self {
            name: Some(p.name),
            national_id: Some(p.national_id),
            date_of_birth: Some(p.date_of_birth),
            gender: Some(p.gender),
            address: Some(p.address),
            city: Some(p.city),
            state: Some(p.state),
            country: Some(p.country),
            phone: Some(p.phone),
            email: Some(p.email),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FamilyPatch {
    pub marital_status: Option<crate::models::application::MaritalStatus>,
    pub dependents: Option<u32>,
    pub employment_status: Option<crate::models::application::EmploymentStatus>,
    pub monthly_income: Option<f64>,
    pub housing_status: Option<crate::models::application::HousingStatus>,
}

impl From<FamilyAndFinancialInformation> for FamilyPatch {
    fn from(f: FamilyAndFinancialInformation) -> Self {
        Self {
            marital_status: Some(f.marital_status),
            dependents: Some(f.dependents),
            employment_status: Some(f.employment_status),
            monthly_income: Some(f.monthly_income),
            housing_status: Some(f.housing_status),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SituationPatch {
    pub current_financial_situation: Option<String>,
    pub employment_circumstances: Option<String>,
    pub reason_for_applying: Option<String>,
}

impl From<SituationInformation> for SituationPatch {
    fn from(s: SituationInformation) -> Self {
        Self {
            current_financial_situation: Some(s.current_financial_situation),
            employment_circumstances: Some(s.employment_circumstances),
            reason_for_applying: Some(s.reason_for_applying),
        }
    }
}

pub struct AppStore {
    data: ApplicationData,
    step: Step,
    revision: u64,
    repo: ApplicationRepository,
}

impl AppStore {
    /// Hydrate from the repository. This is the one read per session;
    /// everything after goes through the reducers.
    pub fn open(repo: ApplicationRepository) -> Self {
        let (data, step) = repo.load();
        info!(
            "[PHASE: store] [STEP: open] Hydrated application state at step {}",
            step.index()
        );
        Self {
            data,
            step,
            revision: 0,
            repo,
        }
    }

    pub fn data(&self) -> &ApplicationData {
        &self.data
    }

    pub fn step(&self) -> Step {
        self.step
    }

    /// Monotonic counter, bumped on every persisted mutation. Buffers compare
    /// against it to decide when to reseed.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn update_personal(&mut self, patch: PersonalPatch) {
        let p = &mut self.data.personal;
        if let Some(v) = patch.name {
            p.name = v;
        }
        if let Some(v) = patch.national_id {
            p.national_id = v;
        }
        if let Some(v) = patch.date_of_birth {
            p.date_of_birth = v;
        }
        if let Some(v) = patch.gender {
            p.gender = v;
        }
        if let Some(v) = patch.address {
            p.address = v;
        }
        if let Some(v) = patch.city {
            p.city = v;
        }
        if let Some(v) = patch.state {
            p.state = v;
        }
        if let Some(v) = patch.country {
            p.country = v;
        }
        if let Some(v) = patch.phone {
            p.phone = v;
        }
        if let Some(v) = patch.email {
            p.email = v;
        }
        self.committed();
    }

    pub fn update_family(&mut self, patch: FamilyPatch) {
        let f = &mut self.data.family;
        if let Some(v) = patch.marital_status {
            f.marital_status = v;
        }
        if let Some(v) = patch.dependents {
            f.dependents = v;
        }
        if let Some(v) = patch.employment_status {
            f.employment_status = v;
        }
        if let Some(v) = patch.monthly_income {
            f.monthly_income = v;
        }
        if let Some(v) = patch.housing_status {
            f.housing_status = v;
        }
        self.committed();
    }

    pub fn update_situation(&mut self, patch: SituationPatch) {
        let s = &mut self.data.situation;
        if let Some(v) = patch.current_financial_situation {
            s.current_financial_situation = v;
        }
        if let Some(v) = patch.employment_circumstances {
            s.employment_circumstances = v;
        }
        if let Some(v) = patch.reason_for_applying {
            s.reason_for_applying = v;
        }
        self.committed();
    }

    /// Record forward progress. Persists along with the data.
    pub fn set_step(&mut self, step: Step) {
        self.step = step;
        self.committed();
    }

    /// Move to an earlier step without recording it, so returning "back" does
    /// not officially regress the user's progress.
    pub fn set_step_transient(&mut self, step: Step) {
        self.step = step;
    }

    /// Clear everything back to the empty template at step 0.
    pub fn reset(&mut self) {
        self.data = repository::empty_application();
        self.step = Step::PersonalInformation;
        self.committed();
        info!("[PHASE: store] [STEP: reset] Application state reset to empty template");
    }

    fn committed(&mut self) {
        self.revision += 1;
        self.repo.save(&self.data, self.step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::application::{EmploymentStatus, MaritalStatus};

    fn store_in(dir: &tempfile::TempDir) -> AppStore {
        AppStore::open(ApplicationRepository::new(
            dir.path().join("application.json"),
        ))
    }

    #[test]
    fn fresh_session_starts_at_step_zero_with_empty_data() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.step(), Step::PersonalInformation);
        assert_eq!(store.data(), &repository::empty_application());
    }

    #[test]
    fn partial_patch_merges_without_clobbering_other_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        store.update_personal(PersonalPatch {
            name: Some("Jane Doe".to_string()),
            ..Default::default()
        });
        store.update_personal(PersonalPatch {
            email: Some("jane@example.com".to_string()),
            ..Default::default()
        });

        assert_eq!(store.data().personal.name, "Jane Doe");
        assert_eq!(store.data().personal.email, "jane@example.com");
    }

    #[test]
    fn every_mutation_bumps_revision_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let repo = ApplicationRepository::new(dir.path().join("application.json"));
        let mut store = AppStore::open(repo.clone());
        assert_eq!(store.revision(), 0);

        store.update_family(FamilyPatch {
            marital_status: Some(MaritalStatus::Married),
            dependents: Some(2),
            ..Default::default()
        });
        assert_eq!(store.revision(), 1);

        store.set_step(Step::FamilyAndFinancialInformation);
        assert_eq!(store.revision(), 2);

        let (data, step) = repo.load();
        assert_eq!(data.family.marital_status, MaritalStatus::Married);
        assert_eq!(data.family.dependents, 2);
        assert_eq!(step, Step::FamilyAndFinancialInformation);
    }

    #[test]
    fn transient_step_change_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let repo = ApplicationRepository::new(dir.path().join("application.json"));
        let mut store = AppStore::open(repo.clone());

        store.set_step(Step::SituationInformation);
        store.set_step_transient(Step::FamilyAndFinancialInformation);
        assert_eq!(store.step(), Step::FamilyAndFinancialInformation);

        // On disk the recorded progress is still the later step.
        let (_, step) = repo.load();
        assert_eq!(step, Step::SituationInformation);
    }

    #[test]
    fn reset_restores_template_and_step_zero() {
        let dir = tempfile::tempdir().unwrap();
        let repo = ApplicationRepository::new(dir.path().join("application.json"));
        let mut store = AppStore::open(repo.clone());

        store.update_situation(SituationPatch {
            reason_for_applying: Some("Help with rent while job hunting".to_string()),
            ..Default::default()
        });
        store.set_step(Step::SituationInformation);
        store.reset();

        assert_eq!(store.step(), Step::PersonalInformation);
        assert_eq!(store.data(), &repository::empty_application());
        assert_eq!(store.data().family.employment_status, EmploymentStatus::Unemployed);

        let (data, step) = repo.load();
        assert_eq!(data, repository::empty_application());
        assert_eq!(step, Step::PersonalInformation);
    }
}
