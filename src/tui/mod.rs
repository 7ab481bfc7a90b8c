//! Headless terminal wizard.
//!
//! Screen layout:
//! - Outer frame titled "Social Support Application"
//! - Header with the step title, "Step N of 3" and a progress gauge
//! - Main content panel with the active step's form
//! - Bottom button row: [ Back ] [ Next ] [ Cancel ]
//! - Modal overlays (cancel confirmation, AI-assist suggestion)
//!
//! Note: Logging is file-only in TUI mode (stdout logging is disabled) to
//! avoid corrupting the terminal UI.

use crate::ai::{self, AssistOutcome, FieldKey, OpenAiProvider};
use crate::api::submission;
use crate::geo;
use crate::models::application::{
    EmploymentStatus, FamilyAndFinancialInformation, Gender, HousingStatus, MaritalStatus,
    PersonalInformation, SituationInformation, Step,
};
use crate::settings::Settings;
use crate::store::repository::ApplicationRepository;
use crate::store::{AppStore, FamilyPatch, PersonalPatch, SituationPatch};
use crate::utils::validation;
use crate::wizard;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use log::{info, warn};
use ratatui::backend::{CrosstermBackend, TestBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap};
use ratatui::Frame;
use ratatui::Terminal;
use std::collections::HashMap;
use std::io::{self, Stdout};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ButtonFocus {
    Back,
    Next,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FocusTarget {
    Field(usize),
    Button(ButtonFocus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssistStatus {
    Requesting,
    Ready { used_fallback: bool },
}

#[derive(Debug, Clone, PartialEq)]
enum Modal {
    ConfirmCancel,
    Assist {
        field: FieldKey,
        status: AssistStatus,
        text: TextInput,
        request_id: u64,
    },
}

#[derive(Debug, Clone)]
enum UiMsg {
    SuggestionReady {
        request_id: u64,
        outcome: AssistOutcome,
    },
    // worker_ran only says the submission worker executed; delivery outcomes
    // are swallowed by the best-effort contract and reach the log alone.
    SubmitFinished {
        worker_ran: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TextInput {
    value: String,
    cursor: usize,
}

impl TextInput {
    fn new(value: impl Into<String>) -> Self {
        let v = value.into();
        Self {
            cursor: v.len(),
            value: v,
        }
    }

    fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.value.len();
    }

    /// Byte offset of the char boundary before the cursor.
    fn prev_boundary(&self) -> usize {
        self.value[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    /// Byte offset of the char boundary after the cursor.
    fn next_boundary(&self) -> usize {
        self.value[self.cursor..]
            .chars()
            .next()
            .map(|c| self.cursor + c.len_utf8())
            .unwrap_or(self.value.len())
    }

    fn handle_key(&mut self, code: KeyCode) -> bool {
        // The cursor is a byte offset and must always sit on a char
        // boundary, so every move steps by whole chars.
        match code {
            KeyCode::Char(c) => {
                self.value.insert(self.cursor, c);
                self.cursor += c.len_utf8();
                true
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    let idx = self.prev_boundary();
                    self.value.remove(idx);
                    self.cursor = idx;
                }
                true
            }
            KeyCode::Delete => {
                if self.cursor < self.value.len() {
                    self.value.remove(self.cursor);
                }
                true
            }
            KeyCode::Left => {
                self.cursor = self.prev_boundary();
                true
            }
            KeyCode::Right => {
                self.cursor = self.next_boundary();
                true
            }
            KeyCode::Home => {
                self.cursor = 0;
                true
            }
            KeyCode::End => {
                self.cursor = self.value.len();
                true
            }
            _ => false,
        }
    }
}

/// Personal-information edit buffer. Country/state/city are selections over
/// the geographic provider; changing a country repopulates the state list and
/// clears selections that are no longer valid, changing a state does the same
/// for cities.
#[derive(Debug, Clone)]
struct PersonalBuffer {
    name: TextInput,
    national_id: TextInput,
    date_of_birth: TextInput,
    gender: Option<Gender>,
    address: TextInput,
    phone: TextInput,
    email: TextInput,
    countries: Vec<geo::Country>,
    states: Vec<geo::StateProvince>,
    cities: Vec<geo::City>,
    country_index: Option<usize>,
    state_index: Option<usize>,
    city_index: Option<usize>,
    errors: HashMap<usize, String>,
}

// Personal field order (indexes into FocusTarget::Field)
const P_NAME: usize = 0;
const P_NATIONAL_ID: usize = 1;
const P_DOB: usize = 2;
const P_GENDER: usize = 3;
const P_COUNTRY: usize = 4;
const P_STATE: usize = 5;
const P_CITY: usize = 6;
const P_ADDRESS: usize = 7;
const P_PHONE: usize = 8;
const P_EMAIL: usize = 9;
const PERSONAL_FIELDS: usize = 10;

impl PersonalBuffer {
    fn new() -> Self {
        Self {
            name: TextInput::new(""),
            national_id: TextInput::new(""),
            date_of_birth: TextInput::new(""),
            gender: None,
            address: TextInput::new(""),
            phone: TextInput::new(""),
            email: TextInput::new(""),
            countries: geo::all_countries(),
            states: Vec::new(),
            cities: Vec::new(),
            country_index: None,
            state_index: None,
            city_index: None,
            errors: HashMap::new(),
        }
    }

    fn seed(&mut self, p: &PersonalInformation) {
        self.name.set(p.name.clone());
        self.national_id.set(p.national_id.clone());
        self.date_of_birth
            .set(p.date_of_birth.clone().unwrap_or_default());
        self.gender = p.gender;
        self.address.set(p.address.clone());
        self.phone.set(p.phone.clone());
        self.email.set(p.email.clone());
        self.errors.clear();

        self.country_index = None;
        self.state_index = None;
        self.city_index = None;
        self.states = Vec::new();
        self.cities = Vec::new();

        let Some(country) = geo::find_country_by_name(&p.country) else {
            return;
        };
        self.country_index = self
            .countries
            .iter()
            .position(|c| c.iso_code == country.iso_code);
        self.states = geo::states_of_country(country.iso_code);

        let Some(state) = geo::find_state_by_name(&p.state, country.iso_code) else {
            return;
        };
        self.state_index = self.states.iter().position(|s| s.iso_code == state.iso_code);
        self.cities = geo::cities_of_state(country.iso_code, state.iso_code);
        self.city_index = self
            .cities
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(&p.city));
    }

    fn selected_country(&self) -> Option<geo::Country> {
        self.country_index.and_then(|i| self.countries.get(i)).copied()
    }

    fn selected_state(&self) -> Option<geo::StateProvince> {
        self.state_index.and_then(|i| self.states.get(i)).copied()
    }

    fn selected_city(&self) -> Option<geo::City> {
        self.city_index.and_then(|i| self.cities.get(i)).copied()
    }

    fn cycle_gender(&mut self, forward: bool) {
        const ORDER: [Option<Gender>; 4] = [
            None,
            Some(Gender::Male),
            Some(Gender::Female),
            Some(Gender::Other),
        ];
        let pos = ORDER.iter().position(|g| *g == self.gender).unwrap_or(0);
        let next = if forward {
            (pos + 1) % ORDER.len()
        } else {
            (pos + ORDER.len() - 1) % ORDER.len()
        };
        self.gender = ORDER[next];
    }

    fn cycle_country(&mut self, forward: bool) {
        if self.countries.is_empty() {
            return;
        }
        let next = cycle_index(self.country_index, self.countries.len(), forward);
        self.country_index = Some(next);

        // Cascade: the state list follows the country; previous state/city
        // selections are no longer valid.
        let iso = self.countries[next].iso_code;
        self.states = geo::states_of_country(iso);
        self.state_index = None;
        self.cities = Vec::new();
        self.city_index = None;
    }

    fn cycle_state(&mut self, forward: bool) {
        if self.states.is_empty() {
            return;
        }
        let next = cycle_index(self.state_index, self.states.len(), forward);
        self.state_index = Some(next);

        let state = self.states[next];
        self.cities = geo::cities_of_state(state.country_code, state.iso_code);
        self.city_index = None;
    }

    fn cycle_city(&mut self, forward: bool) {
        if self.cities.is_empty() {
            return;
        }
        self.city_index = Some(cycle_index(self.city_index, self.cities.len(), forward));
    }

    fn to_slice(&self) -> PersonalInformation {
        let dob = self.date_of_birth.value.trim();
        PersonalInformation {
            name: self.name.value.clone(),
            national_id: self.national_id.value.clone(),
            date_of_birth: if dob.is_empty() {
                None
            } else {
                Some(dob.to_string())
            },
            gender: self.gender,
            address: self.address.value.clone(),
            city: self.selected_city().map(|c| c.name.to_string()).unwrap_or_default(),
            state: self
                .selected_state()
                .map(|s| s.name.to_string())
                .unwrap_or_default(),
            country: self
                .selected_country()
                .map(|c| c.name.to_string())
                .unwrap_or_default(),
            phone: self.phone.value.clone(),
            email: self.email.value.clone(),
        }
    }

    fn validate(&mut self) -> bool {
        let slice = self.to_slice();
        let mut errors = HashMap::new();

        if let Err(e) = validation::validate_name(&slice.name) {
            errors.insert(P_NAME, e.to_string());
        }
        if let Err(e) = validation::validate_national_id(&slice.national_id) {
            errors.insert(P_NATIONAL_ID, e.to_string());
        }
        if let Err(e) = validation::validate_date_of_birth(&self.date_of_birth.value) {
            errors.insert(P_DOB, e.to_string());
        }
        if let Err(e) = validation::validate_required("Country", &slice.country) {
            errors.insert(P_COUNTRY, e.to_string());
        }
        if let Err(e) = validation::validate_required("State", &slice.state) {
            errors.insert(P_STATE, e.to_string());
        }
        if let Err(e) = validation::validate_required("City", &slice.city) {
            errors.insert(P_CITY, e.to_string());
        }
        if let Err(e) = validation::validate_required("Address", &slice.address) {
            errors.insert(P_ADDRESS, e.to_string());
        }
        if let Err(e) = validation::validate_phone(&slice.phone) {
            errors.insert(P_PHONE, e.to_string());
        }
        if let Err(e) = validation::validate_email(&slice.email) {
            errors.insert(P_EMAIL, e.to_string());
        }

        self.errors = errors;
        self.errors.is_empty()
    }
}

fn cycle_index(current: Option<usize>, len: usize, forward: bool) -> usize {
    match current {
        None => 0,
        Some(i) if forward => (i + 1) % len,
        Some(i) => (i + len - 1) % len,
    }
}

// Family field order
const F_MARITAL: usize = 0;
const F_DEPENDENTS: usize = 1;
const F_EMPLOYMENT: usize = 2;
const F_INCOME: usize = 3;
const F_HOUSING: usize = 4;
const FAMILY_FIELDS: usize = 5;

#[derive(Debug, Clone)]
struct FamilyBuffer {
    marital_status: MaritalStatus,
    dependents: TextInput,
    employment_status: EmploymentStatus,
    monthly_income: TextInput,
    housing_status: HousingStatus,
    errors: HashMap<usize, String>,
}

impl FamilyBuffer {
    fn new() -> Self {
        Self {
            marital_status: MaritalStatus::default(),
            dependents: TextInput::new("0"),
            employment_status: EmploymentStatus::default(),
            monthly_income: TextInput::new("0"),
            housing_status: HousingStatus::default(),
            errors: HashMap::new(),
        }
    }

    fn seed(&mut self, f: &FamilyAndFinancialInformation) {
        self.marital_status = f.marital_status;
        self.dependents.set(f.dependents.to_string());
        self.employment_status = f.employment_status;
        self.monthly_income.set(format_income(f.monthly_income));
        self.housing_status = f.housing_status;
        self.errors.clear();
    }

    fn cycle_marital(&mut self, forward: bool) {
        self.marital_status = cycle_enum(&MaritalStatus::ALL, self.marital_status, forward);
    }

    fn cycle_employment(&mut self, forward: bool) {
        self.employment_status = cycle_enum(&EmploymentStatus::ALL, self.employment_status, forward);
    }

    fn cycle_housing(&mut self, forward: bool) {
        self.housing_status = cycle_enum(&HousingStatus::ALL, self.housing_status, forward);
    }

    /// Validate and build the slice; numeric parse failures become inline errors.
    fn validate(&mut self) -> Option<FamilyAndFinancialInformation> {
        let mut errors = HashMap::new();

        let dependents = match validation::parse_dependents(&self.dependents.value) {
            Ok(n) => n,
            Err(e) => {
                errors.insert(F_DEPENDENTS, e.to_string());
                0
            }
        };
        let monthly_income = match validation::parse_monthly_income(&self.monthly_income.value) {
            Ok(n) => n,
            Err(e) => {
                errors.insert(F_INCOME, e.to_string());
                0.0
            }
        };

        self.errors = errors;
        if !self.errors.is_empty() {
            return None;
        }

        Some(FamilyAndFinancialInformation {
            marital_status: self.marital_status,
            dependents,
            employment_status: self.employment_status,
            monthly_income,
            housing_status: self.housing_status,
        })
    }
}

fn cycle_enum<T: Copy + PartialEq>(all: &[T], current: T, forward: bool) -> T {
    let pos = all.iter().position(|v| *v == current).unwrap_or(0);
    let next = if forward {
        (pos + 1) % all.len()
    } else {
        (pos + all.len() - 1) % all.len()
    };
    all[next]
}

fn format_income(income: f64) -> String {
    if income == income.trunc() {
        format!("{}", income as i64)
    } else {
        format!("{}", income)
    }
}

// Situation field order
const S_FINANCIAL: usize = 0;
const S_EMPLOYMENT: usize = 1;
const S_REASON: usize = 2;
const SITUATION_FIELDS: usize = 3;

#[derive(Debug, Clone)]
struct SituationBuffer {
    current_financial_situation: TextInput,
    employment_circumstances: TextInput,
    reason_for_applying: TextInput,
    errors: HashMap<usize, String>,
}

impl SituationBuffer {
    fn new() -> Self {
        Self {
            current_financial_situation: TextInput::new(""),
            employment_circumstances: TextInput::new(""),
            reason_for_applying: TextInput::new(""),
            errors: HashMap::new(),
        }
    }

    fn seed(&mut self, s: &SituationInformation) {
        self.current_financial_situation
            .set(s.current_financial_situation.clone());
        self.employment_circumstances
            .set(s.employment_circumstances.clone());
        self.reason_for_applying.set(s.reason_for_applying.clone());
        self.errors.clear();
    }

    fn field_text(&self, idx: usize) -> &str {
        match idx {
            S_FINANCIAL => &self.current_financial_situation.value,
            S_EMPLOYMENT => &self.employment_circumstances.value,
            _ => &self.reason_for_applying.value,
        }
    }

    fn set_field_text(&mut self, field: FieldKey, text: &str) {
        match field {
            FieldKey::CurrentFinancialSituation => self.current_financial_situation.set(text),
            FieldKey::EmploymentCircumstances => self.employment_circumstances.set(text),
            FieldKey::ReasonForApplying => self.reason_for_applying.set(text),
            FieldKey::Generic => {}
        }
    }

    fn to_slice(&self) -> SituationInformation {
        SituationInformation {
            current_financial_situation: self.current_financial_situation.value.clone(),
            employment_circumstances: self.employment_circumstances.value.clone(),
            reason_for_applying: self.reason_for_applying.value.clone(),
        }
    }

    fn validate(&mut self) -> bool {
        let mut errors = HashMap::new();
        if let Err(e) = validation::validate_narrative(
            "Current financial situation",
            &self.current_financial_situation.value,
        ) {
            errors.insert(S_FINANCIAL, e.to_string());
        }
        if let Err(e) = validation::validate_narrative(
            "Employment circumstances",
            &self.employment_circumstances.value,
        ) {
            errors.insert(S_EMPLOYMENT, e.to_string());
        }
        if let Err(e) =
            validation::validate_narrative("Reason for applying", &self.reason_for_applying.value)
        {
            errors.insert(S_REASON, e.to_string());
        }
        self.errors = errors;
        self.errors.is_empty()
    }
}

struct WizardTui {
    store: AppStore,
    settings: Settings,
    page: Step,
    route: &'static str,
    focus: FocusTarget,
    modal: Option<Modal>,
    notice: Option<String>,
    quit: bool,
    personal: PersonalBuffer,
    family: FamilyBuffer,
    situation: SituationBuffer,
    // Store revision last observed by the buffers; when it differs from the
    // store's, the buffers reseed from the committed slices.
    synced_revision: u64,
    next_request_id: u64,
}

impl WizardTui {
    fn new(store: AppStore, settings: Settings) -> Self {
        let saved = store.step();

        // One redirect per session mount: land on the route matching the
        // persisted step unless the application is already submitted.
        let mut route: &'static str = "/";
        if let Some(redirect) = wizard::reconcile_initial_route(saved, route) {
            info!(
                "[PHASE: tui] [STEP: reconcile] Redirecting to {} for persisted step {}",
                redirect,
                saved.index()
            );
            route = redirect;
        }
        let page = wizard::step_for_route(route).unwrap_or(saved);
        // No redirect happens for an already-submitted record; pair the route
        // with the landing page in that case too.
        let route = wizard::route_for_step(page);

        let mut tui = Self {
            store,
            settings,
            page,
            route,
            focus: FocusTarget::Field(0),
            modal: None,
            notice: None,
            quit: false,
            personal: PersonalBuffer::new(),
            family: FamilyBuffer::new(),
            situation: SituationBuffer::new(),
            synced_revision: u64::MAX, // force the initial seed
            next_request_id: 0,
        };
        tui.sync_buffers();
        tui.reset_focus();
        tui
    }

    /// Reseed the edit buffers whenever the store has moved past the revision
    /// they were seeded from (commit, accept, reset).
    fn sync_buffers(&mut self) {
        if self.synced_revision == self.store.revision() {
            return;
        }
        let data = self.store.data().clone();
        self.personal.seed(&data.personal);
        self.family.seed(&data.family);
        self.situation.seed(&data.situation);
        self.synced_revision = self.store.revision();
    }

    fn field_count(&self) -> usize {
        match self.page {
            Step::PersonalInformation => PERSONAL_FIELDS,
            Step::FamilyAndFinancialInformation => FAMILY_FIELDS,
            Step::SituationInformation => SITUATION_FIELDS,
            Step::Submit => 0,
        }
    }

    fn reset_focus(&mut self) {
        self.focus = if self.field_count() > 0 {
            FocusTarget::Field(0)
        } else {
            FocusTarget::Button(ButtonFocus::Next)
        };
    }

    /// Navigate to a step, honoring the forward-entry guard: a step ahead of
    /// the recorded progress silently redirects to the recorded step.
    fn goto(&mut self, target: Step) {
        let landed = if wizard::is_invalid_navigation(self.store.step(), target) {
            info!(
                "[PHASE: tui] [STEP: guard] Blocked entry to step {} ahead of progress {}, redirecting",
                target.index(),
                self.store.step().index()
            );
            self.store.step()
        } else {
            target
        };
        self.page = landed;
        self.route = wizard::route_for_step(landed);
        self.reset_focus();
    }

    /// Validate and commit the active page's slice. Returns false (and leaves
    /// inline errors behind) when validation blocks the commit.
    fn commit_current_page(&mut self) -> bool {
        match self.page {
            Step::PersonalInformation => {
                if !self.personal.validate() {
                    return false;
                }
                let slice = self.personal.to_slice();
                self.store.update_personal(PersonalPatch::from(slice));
                self.synced_revision = self.store.revision();
                true
            }
            Step::FamilyAndFinancialInformation => {
                let Some(slice) = self.family.validate() else {
                    return false;
                };
                self.store.update_family(FamilyPatch::from(slice));
                self.synced_revision = self.store.revision();
                true
            }
            Step::SituationInformation => {
                if !self.situation.validate() {
                    return false;
                }
                let slice = self.situation.to_slice();
                self.store.update_situation(SituationPatch::from(slice));
                self.synced_revision = self.store.revision();
                true
            }
            Step::Submit => true,
        }
    }

    fn go_next(&mut self, tx: &mpsc::Sender<UiMsg>) {
        match self.page {
            Step::PersonalInformation | Step::FamilyAndFinancialInformation => {
                if self.commit_current_page() {
                    let next = wizard::advance(self.page);
                    self.store.set_step(next);
                    self.goto(next);
                }
            }
            Step::SituationInformation => self.submit_application(tx),
            Step::Submit => {
                // "Home" on the terminal page.
                self.store.set_step(Step::PersonalInformation);
                self.goto(Step::PersonalInformation);
            }
        }
    }

    fn go_back(&mut self) {
        if self.page == Step::PersonalInformation || self.page == Step::Submit {
            return;
        }
        let prev = wizard::retreat(self.page);
        // Back does not officially regress recorded progress.
        self.store.set_step_transient(prev);
        self.goto(prev);
    }

    /// Final submission: merge the situation slice, fire the best-effort
    /// transmission, then reset and advance regardless of its outcome.
    fn submit_application(&mut self, tx: &mpsc::Sender<UiMsg>) {
        if !self.commit_current_page() {
            return;
        }

        let payload = self.store.data().clone();
        let endpoint = self.settings.submit_endpoint.clone();
        let tx = tx.clone();
        thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build();
            match rt {
                Ok(rt) => {
                    rt.block_on(submission::submit_best_effort(&endpoint, &payload));
                    let _ = tx.send(UiMsg::SubmitFinished { worker_ran: true });
                }
                Err(e) => {
                    warn!(
                        "[PHASE: submission] [STEP: post] Could not start runtime for submission: {}",
                        e
                    );
                    let _ = tx.send(UiMsg::SubmitFinished { worker_ran: false });
                }
            }
        });

        self.notice = Some("Application submitted successfully.".to_string());
        self.store.reset();
        self.store.set_step(Step::Submit);
        self.goto(Step::Submit);
    }

    /// Open the AI-assist modal for the focused narrative field.
    fn open_assist(&mut self, tx: &mpsc::Sender<UiMsg>) {
        if self.page != Step::SituationInformation {
            return;
        }
        let FocusTarget::Field(idx) = self.focus else {
            return;
        };
        let field = match idx {
            S_FINANCIAL => FieldKey::CurrentFinancialSituation,
            S_EMPLOYMENT => FieldKey::EmploymentCircumstances,
            S_REASON => FieldKey::ReasonForApplying,
            _ => return,
        };

        let existing = self.situation.field_text(idx).to_string();
        let prompt = ai::seed_prompt(field, self.settings.language, &existing);

        self.next_request_id += 1;
        let request_id = self.next_request_id;
        self.modal = Some(Modal::Assist {
            field,
            status: AssistStatus::Requesting,
            text: TextInput::new(""),
            request_id,
        });

        let endpoint = self.settings.ai_endpoint.clone();
        let api_key = self.settings.ai_api_key.clone();
        let model = self.settings.ai_model.clone();
        let tx = tx.clone();
        thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build();
            let outcome = match rt {
                Ok(rt) => rt.block_on(async {
                    match OpenAiProvider::new(endpoint, api_key, model, Duration::from_secs(12)) {
                        Ok(provider) => ai::resolve_suggestion(&provider, &prompt, field).await,
                        Err(e) => {
                            warn!(
                                "[PHASE: ai_assist] [STEP: fallback] Could not build provider: {}",
                                e
                            );
                            AssistOutcome {
                                text: ai::fallback_template(field).to_string(),
                                used_fallback: true,
                            }
                        }
                    }
                }),
                Err(_) => AssistOutcome {
                    text: ai::fallback_template(field).to_string(),
                    used_fallback: true,
                },
            };
            // The receiver decides whether this request is still current.
            let _ = tx.send(UiMsg::SuggestionReady {
                request_id,
                outcome,
            });
        });
    }

    /// Accept the assist text: write it into the step buffer and persist it
    /// through the situation reducer immediately.
    fn accept_assist(&mut self, field: FieldKey, text: String) {
        self.situation.set_field_text(field, &text);
        let patch = match field {
            FieldKey::CurrentFinancialSituation => SituationPatch {
                current_financial_situation: Some(text),
                ..Default::default()
            },
            FieldKey::EmploymentCircumstances => SituationPatch {
                employment_circumstances: Some(text),
                ..Default::default()
            },
            FieldKey::ReasonForApplying => SituationPatch {
                reason_for_applying: Some(text),
                ..Default::default()
            },
            FieldKey::Generic => return,
        };
        self.store.update_situation(patch);
        // The buffer already reflects this commit; keep its other in-progress
        // edits instead of reseeding.
        self.synced_revision = self.store.revision();
    }
}

fn drain_messages(state: &mut WizardTui, rx: &mpsc::Receiver<UiMsg>) {
    while let Ok(msg) = rx.try_recv() {
        match msg {
            UiMsg::SuggestionReady { request_id, outcome } => {
                // A dismissed or superseded request: the result is discarded
                // without touching any state.
                let Some(Modal::Assist {
                    status,
                    text,
                    request_id: active,
                    ..
                }) = &mut state.modal
                else {
                    continue;
                };
                if *active != request_id || *status != AssistStatus::Requesting {
                    continue;
                }
                *status = AssistStatus::Ready {
                    used_fallback: outcome.used_fallback,
                };
                text.set(outcome.text);
                if outcome.used_fallback {
                    state.notice = Some(ai::FALLBACK_NOTICE.to_string());
                }
            }
            UiMsg::SubmitFinished { worker_ran } => {
                // Best-effort contract: the outcome only reaches the log.
                info!(
                    "[PHASE: submission] [STEP: finished] Submission worker finished (worker_ran={})",
                    worker_ran
                );
            }
        }
    }
}

fn focused_text_input_mut(state: &mut WizardTui) -> Option<&mut TextInput> {
    let FocusTarget::Field(idx) = state.focus else {
        return None;
    };

    match state.page {
        Step::PersonalInformation => match idx {
            P_NAME => Some(&mut state.personal.name),
            P_NATIONAL_ID => Some(&mut state.personal.national_id),
            P_DOB => Some(&mut state.personal.date_of_birth),
            P_ADDRESS => Some(&mut state.personal.address),
            P_PHONE => Some(&mut state.personal.phone),
            P_EMAIL => Some(&mut state.personal.email),
            _ => None,
        },
        Step::FamilyAndFinancialInformation => match idx {
            F_DEPENDENTS => Some(&mut state.family.dependents),
            F_INCOME => Some(&mut state.family.monthly_income),
            _ => None,
        },
        Step::SituationInformation => match idx {
            S_FINANCIAL => Some(&mut state.situation.current_financial_situation),
            S_EMPLOYMENT => Some(&mut state.situation.employment_circumstances),
            S_REASON => Some(&mut state.situation.reason_for_applying),
            _ => None,
        },
        Step::Submit => None,
    }
}

/// Selection fields cycle with Left/Right instead of editing text.
fn cycle_focused_selection(state: &mut WizardTui, forward: bool) -> bool {
    let FocusTarget::Field(idx) = state.focus else {
        return false;
    };
    match state.page {
        Step::PersonalInformation => match idx {
            P_GENDER => {
                state.personal.cycle_gender(forward);
                true
            }
            P_COUNTRY => {
                state.personal.cycle_country(forward);
                true
            }
            P_STATE => {
                state.personal.cycle_state(forward);
                true
            }
            P_CITY => {
                state.personal.cycle_city(forward);
                true
            }
            _ => false,
        },
        Step::FamilyAndFinancialInformation => match idx {
            F_MARITAL => {
                state.family.cycle_marital(forward);
                true
            }
            F_EMPLOYMENT => {
                state.family.cycle_employment(forward);
                true
            }
            F_HOUSING => {
                state.family.cycle_housing(forward);
                true
            }
            _ => false,
        },
        _ => false,
    }
}

fn focus_next(state: &mut WizardTui) {
    let fields = state.field_count();
    state.focus = match state.focus {
        FocusTarget::Field(i) if i + 1 < fields => FocusTarget::Field(i + 1),
        FocusTarget::Field(_) => FocusTarget::Button(first_button(state.page)),
        FocusTarget::Button(ButtonFocus::Back) => FocusTarget::Button(ButtonFocus::Next),
        FocusTarget::Button(ButtonFocus::Next) => FocusTarget::Button(ButtonFocus::Cancel),
        FocusTarget::Button(ButtonFocus::Cancel) => {
            if fields > 0 {
                FocusTarget::Field(0)
            } else {
                FocusTarget::Button(first_button(state.page))
            }
        }
    };
}

fn focus_prev(state: &mut WizardTui) {
    let fields = state.field_count();
    state.focus = match state.focus {
        FocusTarget::Field(0) => FocusTarget::Button(ButtonFocus::Cancel),
        FocusTarget::Field(i) => FocusTarget::Field(i - 1),
        FocusTarget::Button(ButtonFocus::Cancel) => FocusTarget::Button(ButtonFocus::Next),
        FocusTarget::Button(ButtonFocus::Next) => FocusTarget::Button(first_button(state.page)),
        FocusTarget::Button(ButtonFocus::Back) => {
            if fields > 0 {
                FocusTarget::Field(fields - 1)
            } else {
                FocusTarget::Button(ButtonFocus::Cancel)
            }
        }
    };
}

fn first_button(page: Step) -> ButtonFocus {
    if can_go_back(page) {
        ButtonFocus::Back
    } else {
        ButtonFocus::Next
    }
}

fn can_go_back(page: Step) -> bool {
    !matches!(page, Step::PersonalInformation | Step::Submit)
}

fn next_label(page: Step) -> &'static str {
    match page {
        Step::SituationInformation => "Submit",
        Step::Submit => "Home",
        _ => "Next",
    }
}

fn handle_key(state: &mut WizardTui, code: KeyCode, tx: &mpsc::Sender<UiMsg>) {
    // Modal handling first
    if let Some(modal) = state.modal.clone() {
        match modal {
            Modal::ConfirmCancel => match code {
                KeyCode::Enter => {
                    state.modal = None;
                    state.quit = true;
                }
                KeyCode::Esc => {
                    state.modal = None;
                }
                _ => {}
            },
            Modal::Assist { field, status, .. } => match status {
                AssistStatus::Requesting => {
                    // Closing while requesting discards the eventual result.
                    if code == KeyCode::Esc {
                        state.modal = None;
                    }
                }
                AssistStatus::Ready { .. } => match code {
                    KeyCode::Esc => {
                        state.modal = None;
                    }
                    KeyCode::Enter => {
                        let text = match &state.modal {
                            Some(Modal::Assist { text, .. }) => text.value.clone(),
                            _ => String::new(),
                        };
                        if text.trim().is_empty() {
                            state.notice = Some(
                                "Please wait for a suggestion or close this dialog.".to_string(),
                            );
                            return;
                        }
                        state.modal = None;
                        state.accept_assist(field, text);
                    }
                    other => {
                        if let Some(Modal::Assist { text, .. }) = &mut state.modal {
                            text.handle_key(other);
                        }
                    }
                },
            },
        }
        return;
    }

    // Global keys
    if code == KeyCode::Esc {
        state.modal = Some(Modal::ConfirmCancel);
        return;
    }

    if code == KeyCode::F(2) {
        state.open_assist(tx);
        return;
    }

    match code {
        KeyCode::Tab | KeyCode::Down => {
            focus_next(state);
            return;
        }
        KeyCode::BackTab | KeyCode::Up => {
            focus_prev(state);
            return;
        }
        _ => {}
    }

    // Selection fields cycle with Left/Right before text handling.
    if matches!(code, KeyCode::Left | KeyCode::Right)
        && cycle_focused_selection(state, code == KeyCode::Right)
    {
        return;
    }

    // Button activation / form submission
    if code == KeyCode::Enter {
        match state.focus {
            FocusTarget::Button(ButtonFocus::Back) => {
                if can_go_back(state.page) {
                    state.go_back();
                }
            }
            FocusTarget::Button(ButtonFocus::Cancel) => {
                state.modal = Some(Modal::ConfirmCancel);
            }
            _ => state.go_next(tx),
        }
        return;
    }

    // Text input
    if let Some(input) = focused_text_input_mut(state) {
        input.handle_key(code);
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn field_line<'a>(
    label: &'a str,
    value: String,
    focused: bool,
    error: Option<&'a String>,
) -> Vec<Line<'a>> {
    let marker = if focused { "▸ " } else { "  " };
    let value_style = if focused {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let mut lines = vec![Line::from(vec![
        Span::raw(marker),
        Span::styled(format!("{:<28}", format!("{}:", label)), Style::default()),
        Span::styled(value, value_style),
    ])];
    if let Some(err) = error {
        lines.push(Line::from(Span::styled(
            format!("    {}", err),
            Style::default().fg(Color::Red),
        )));
    }
    lines
}

fn selection_display(value: Option<&str>, options_available: bool) -> String {
    match value {
        Some(v) => format!("< {} >", v),
        None if options_available => "< select >".to_string(),
        None => "< none available >".to_string(),
    }
}

fn draw(area: Rect, frame: &mut Frame, state: &WizardTui) {
    let outer = Block::default()
        .borders(Borders::ALL)
        .title(" Social Support Application ");
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Min(5),    // content
            Constraint::Length(1), // notice
            Constraint::Length(3), // buttons
        ])
        .split(inner);

    draw_header(rows[0], frame, state);
    match state.page {
        Step::PersonalInformation => draw_personal(rows[1], frame, state),
        Step::FamilyAndFinancialInformation => draw_family(rows[1], frame, state),
        Step::SituationInformation => draw_situation(rows[1], frame, state),
        Step::Submit => draw_submit(rows[1], frame),
    }
    draw_notice(rows[2], frame, state);
    draw_buttons(rows[3], frame, state);

    if let Some(modal) = &state.modal {
        draw_modal(area, frame, state, modal);
    }
}

fn draw_header(area: Rect, frame: &mut Frame, state: &WizardTui) {
    let cols = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Length(1)])
        .split(area);

    let editable = Step::EDITABLE.len();
    let position = state.page.index().min(editable - 1) + 1;
    let title = Paragraph::new(vec![
        Line::from(Span::styled(
            state.page.title(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("Step {} of {}", position, editable)),
    ]);
    frame.render_widget(title, cols[0]);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan))
        .percent(wizard::progress_percent(state.page))
        .label(format!("{}%", wizard::progress_percent(state.page)));
    frame.render_widget(gauge, cols[1]);
}

fn draw_personal(area: Rect, frame: &mut Frame, state: &WizardTui) {
    let p = &state.personal;
    let focused = |idx: usize| state.focus == FocusTarget::Field(idx);
    let err = |idx: usize| p.errors.get(&idx);

    let mut lines = Vec::new();
    lines.extend(field_line("Name", p.name.value.clone(), focused(P_NAME), err(P_NAME)));
    lines.extend(field_line(
        "National ID",
        p.national_id.value.clone(),
        focused(P_NATIONAL_ID),
        err(P_NATIONAL_ID),
    ));
    lines.extend(field_line(
        "Date of birth (YYYY-MM-DD)",
        p.date_of_birth.value.clone(),
        focused(P_DOB),
        err(P_DOB),
    ));
    lines.extend(field_line(
        "Gender",
        selection_display(p.gender.map(|g| g.label()), true),
        focused(P_GENDER),
        err(P_GENDER),
    ));
    lines.extend(field_line(
        "Country",
        selection_display(p.selected_country().map(|c| c.name), !p.countries.is_empty()),
        focused(P_COUNTRY),
        err(P_COUNTRY),
    ));
    lines.extend(field_line(
        "State",
        selection_display(p.selected_state().map(|s| s.name), !p.states.is_empty()),
        focused(P_STATE),
        err(P_STATE),
    ));
    lines.extend(field_line(
        "City",
        selection_display(p.selected_city().map(|c| c.name), !p.cities.is_empty()),
        focused(P_CITY),
        err(P_CITY),
    ));
    lines.extend(field_line(
        "Address",
        p.address.value.clone(),
        focused(P_ADDRESS),
        err(P_ADDRESS),
    ));
    lines.extend(field_line("Phone", p.phone.value.clone(), focused(P_PHONE), err(P_PHONE)));
    lines.extend(field_line("Email", p.email.value.clone(), focused(P_EMAIL), err(P_EMAIL)));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn draw_family(area: Rect, frame: &mut Frame, state: &WizardTui) {
    let f = &state.family;
    let focused = |idx: usize| state.focus == FocusTarget::Field(idx);
    let err = |idx: usize| f.errors.get(&idx);

    let mut lines = Vec::new();
    lines.extend(field_line(
        "Marital status",
        selection_display(Some(f.marital_status.label()), true),
        focused(F_MARITAL),
        err(F_MARITAL),
    ));
    lines.extend(field_line(
        "Dependents",
        f.dependents.value.clone(),
        focused(F_DEPENDENTS),
        err(F_DEPENDENTS),
    ));
    lines.extend(field_line(
        "Employment status",
        selection_display(Some(f.employment_status.label()), true),
        focused(F_EMPLOYMENT),
        err(F_EMPLOYMENT),
    ));
    lines.extend(field_line(
        "Monthly income",
        f.monthly_income.value.clone(),
        focused(F_INCOME),
        err(F_INCOME),
    ));
    lines.extend(field_line(
        "Housing status",
        selection_display(Some(f.housing_status.label()), true),
        focused(F_HOUSING),
        err(F_HOUSING),
    ));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn draw_situation(area: Rect, frame: &mut Frame, state: &WizardTui) {
    let s = &state.situation;
    let focused = |idx: usize| state.focus == FocusTarget::Field(idx);
    let err = |idx: usize| s.errors.get(&idx);

    let mut lines = Vec::new();
    lines.extend(field_line(
        "Current financial situation",
        s.current_financial_situation.value.clone(),
        focused(S_FINANCIAL),
        err(S_FINANCIAL),
    ));
    lines.extend(field_line(
        "Employment circumstances",
        s.employment_circumstances.value.clone(),
        focused(S_EMPLOYMENT),
        err(S_EMPLOYMENT),
    ));
    lines.extend(field_line(
        "Reason for applying",
        s.reason_for_applying.value.clone(),
        focused(S_REASON),
        err(S_REASON),
    ));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Press F2 on a field for \"Help me write\"",
        Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn draw_submit(area: Rect, frame: &mut Frame) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Application submitted successfully",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Thank you. Your application has been received."),
        Line::from("Press Enter to start a new application."),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn draw_notice(area: Rect, frame: &mut Frame, state: &WizardTui) {
    if let Some(notice) = &state.notice {
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                notice.clone(),
                Style::default().fg(Color::Yellow),
            ))),
            area,
        );
    }
}

fn draw_buttons(area: Rect, frame: &mut Frame, state: &WizardTui) {
    let button = |label: &str, focus: ButtonFocus| {
        let style = if state.focus == FocusTarget::Button(focus) {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Span::styled(format!("[ {} ]", label), style)
    };

    let mut spans = Vec::new();
    if can_go_back(state.page) {
        spans.push(button("Back", ButtonFocus::Back));
        spans.push(Span::raw("  "));
    }
    spans.push(button(next_label(state.page), ButtonFocus::Next));
    spans.push(Span::raw("  "));
    spans.push(button("Cancel", ButtonFocus::Cancel));

    frame.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
        area,
    );
}

fn draw_modal(area: Rect, frame: &mut Frame, state: &WizardTui, modal: &Modal) {
    match modal {
        Modal::ConfirmCancel => {
            let rect = centered_rect(46, 6, area);
            frame.render_widget(Clear, rect);
            let block = Block::default().borders(Borders::ALL).title(" Cancel ");
            let body = Paragraph::new(vec![
                Line::from("Leave the application wizard?"),
                Line::from("Your committed progress is saved."),
                Line::from(""),
                Line::from("Enter = leave    Esc = stay"),
            ])
            .block(block)
            .alignment(Alignment::Center);
            frame.render_widget(body, rect);
        }
        Modal::Assist {
            field,
            status,
            text,
            ..
        } => {
            let rect = centered_rect(area.width.saturating_sub(10).min(70), 14, area);
            frame.render_widget(Clear, rect);
            let block = Block::default()
                .borders(Borders::ALL)
                .title(format!(" Suggestion: {} ", field.label()));
            let inner = block.inner(rect);
            frame.render_widget(block, rect);

            let mut lines = Vec::new();
            match status {
                AssistStatus::Requesting => {
                    lines.push(Line::from("Generating suggestion..."));
                    lines.push(Line::from(""));
                    lines.push(Line::from(Span::styled(
                        "Esc = close (discards the result)",
                        Style::default().fg(Color::DarkGray),
                    )));
                }
                AssistStatus::Ready { used_fallback } => {
                    if *used_fallback {
                        lines.push(Line::from(Span::styled(
                            ai::TEMPLATE_NOTE,
                            Style::default().fg(Color::Yellow),
                        )));
                        lines.push(Line::from(""));
                    }
                    lines.push(Line::from(text.value.clone()));
                    lines.push(Line::from(""));
                    lines.push(Line::from(Span::styled(
                        "Edit freely.  Enter = accept    Esc = discard",
                        Style::default().fg(Color::DarkGray),
                    )));
                }
            }
            frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

pub fn run(settings: Settings) -> Result<()> {
    info!("[PHASE: tui] [STEP: start] Starting wizard");

    let store = AppStore::open(ApplicationRepository::at_default_location());
    let mut terminal = setup_terminal()?;
    let result = run_loop(&mut terminal, store, settings);
    restore_terminal(&mut terminal)?;

    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    store: AppStore,
    settings: Settings,
) -> Result<()> {
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();
    let mut state = WizardTui::new(store, settings);
    let (tx, rx) = mpsc::channel::<UiMsg>();

    while !state.quit {
        drain_messages(&mut state, &rx);
        state.sync_buffers();
        terminal.draw(|f| draw(f.size(), f, &state))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_millis(0));

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => handle_key(&mut state, key.code, &tx),
                Event::Resize(_, _) => {}
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }

    Ok(())
}

fn new_smoke_wizard_state(target: &str) -> WizardTui {
    // Smoke-only: seeded state for deterministic page rendering in CI/tooling.
    let repo = ApplicationRepository::new(
        std::env::temp_dir().join("support-wizard-smoke/application.json"),
    );
    let mut state = WizardTui::new(AppStore::open(repo), Settings::default());

    match target {
        "family" => {
            state.page = Step::FamilyAndFinancialInformation;
            state.family.marital_status = MaritalStatus::Married;
            state.family.dependents.set("2");
            state.family.monthly_income.set("1500");
            state.reset_focus();
        }
        "situation" => {
            state.page = Step::SituationInformation;
            state
                .situation
                .current_financial_situation
                .set("My income no longer covers rent and utilities.");
            state.reset_focus();
        }
        "submit" => {
            state.page = Step::Submit;
            state.reset_focus();
        }
        "assist" => {
            state.page = Step::SituationInformation;
            state.modal = Some(Modal::Assist {
                field: FieldKey::ReasonForApplying,
                status: AssistStatus::Ready { used_fallback: true },
                text: TextInput::new(ai::fallback_template(FieldKey::ReasonForApplying)),
                request_id: 1,
            });
            state.reset_focus();
        }
        _ => {
            // default: personal
            state.page = Step::PersonalInformation;
            state.personal.name.set("Jane Doe");
            state.personal.national_id.set("AB1234");
            state.reset_focus();
        }
    }

    state
}

/// Non-interactive smoke mode: render a single frame and exit.
/// Target pages: personal|family|situation|submit|assist
pub fn smoke(target: &str) -> Result<()> {
    info!(
        "[PHASE: tui] [STEP: smoke] Rendering single-frame smoke target={}",
        target
    );

    let t = target.trim().to_ascii_lowercase();
    let state = new_smoke_wizard_state(t.as_str());

    // In-memory backend so this runs in CI/tooling without touching the real
    // terminal (no raw mode / alternate screen).
    let backend = TestBackend::new(100, 30);
    let mut terminal = Terminal::new(backend)?;
    terminal.draw(|f| draw(f.size(), f, &state))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state(dir: &tempfile::TempDir) -> WizardTui {
        let repo = ApplicationRepository::new(dir.path().join("application.json"));
        WizardTui::new(AppStore::open(repo), Settings::default())
    }

    fn fill_valid_personal(state: &mut WizardTui) {
        state.personal.name.set("Jane Doe");
        state.personal.national_id.set("AB1234");
        state.personal.date_of_birth.set("1990-01-01");
        state.personal.gender = Some(Gender::Female);
        select_country(state, "Canada");
        select_state(state, "Ontario");
        select_city(state, "Toronto");
        state.personal.address.set("1 Main St");
        state.personal.phone.set("+1 416-555-0100");
        state.personal.email.set("jane@example.com");
    }

    fn select_country(state: &mut WizardTui, name: &str) {
        for _ in 0..state.personal.countries.len() {
            state.personal.cycle_country(true);
            if state.personal.selected_country().map(|c| c.name) == Some(name) {
                return;
            }
        }
        panic!("country not found: {}", name);
    }

    fn select_state(state: &mut WizardTui, name: &str) {
        for _ in 0..state.personal.states.len() {
            state.personal.cycle_state(true);
            if state.personal.selected_state().map(|s| s.name) == Some(name) {
                return;
            }
        }
        panic!("state not found: {}", name);
    }

    fn select_city(state: &mut WizardTui, name: &str) {
        for _ in 0..state.personal.cities.len() {
            state.personal.cycle_city(true);
            if state.personal.selected_city().map(|c| c.name) == Some(name) {
                return;
            }
        }
        panic!("city not found: {}", name);
    }

    #[test]
    fn fresh_session_starts_on_personal_information() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        assert_eq!(state.page, Step::PersonalInformation);
        assert_eq!(state.route, "/personalInformation");
        assert!(state.personal.name.value.is_empty());
    }

    #[test]
    fn session_resumes_at_persisted_step() {
        let dir = tempfile::tempdir().unwrap();
        let repo = ApplicationRepository::new(dir.path().join("application.json"));
        let mut store = AppStore::open(repo.clone());
        store.set_step(Step::FamilyAndFinancialInformation);
        drop(store);

        let state = WizardTui::new(AppStore::open(repo), Settings::default());
        assert_eq!(state.page, Step::FamilyAndFinancialInformation);
        assert_eq!(state.route, "/familyAndFinancialInformation");
    }

    #[test]
    fn submitted_record_lands_on_the_submit_route() {
        let dir = tempfile::tempdir().unwrap();
        let repo = ApplicationRepository::new(dir.path().join("application.json"));
        let mut store = AppStore::open(repo.clone());
        store.set_step(Step::Submit);
        drop(store);

        let state = WizardTui::new(AppStore::open(repo), Settings::default());
        assert_eq!(state.page, Step::Submit);
        assert_eq!(state.route, "/submit");
    }

    #[test]
    fn text_input_edits_multibyte_text_by_chars() {
        let mut input = TextInput::new("");
        input.handle_key(KeyCode::Char('م'));
        input.handle_key(KeyCode::Char('ر'));
        input.handle_key(KeyCode::Char('ح'));
        assert_eq!(input.value, "مرح");

        input.handle_key(KeyCode::Left);
        input.handle_key(KeyCode::Char('ب'));
        assert_eq!(input.value, "مربح");

        input.handle_key(KeyCode::Backspace);
        assert_eq!(input.value, "مرح");

        input.handle_key(KeyCode::Home);
        input.handle_key(KeyCode::Right);
        input.handle_key(KeyCode::Delete);
        assert_eq!(input.value, "مح");
    }

    #[test]
    fn committing_valid_personal_info_advances_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let repo = ApplicationRepository::new(dir.path().join("application.json"));
        let mut state = WizardTui::new(AppStore::open(repo.clone()), Settings::default());
        let (tx, _rx) = mpsc::channel();

        fill_valid_personal(&mut state);
        state.go_next(&tx);

        assert_eq!(state.page, Step::FamilyAndFinancialInformation);
        let personal = &state.store.data().personal;
        assert_eq!(personal.name, "Jane Doe");
        assert_eq!(personal.national_id, "AB1234");
        assert_eq!(personal.date_of_birth.as_deref(), Some("1990-01-01"));
        assert_eq!(personal.gender, Some(Gender::Female));
        assert_eq!(personal.country, "Canada");
        assert_eq!(personal.state, "Ontario");
        assert_eq!(personal.city, "Toronto");
        assert_eq!(personal.phone, "+1 416-555-0100");
        assert_eq!(personal.email, "jane@example.com");

        let (data, step) = repo.load();
        assert_eq!(data.personal.name, "Jane Doe");
        assert_eq!(step, Step::FamilyAndFinancialInformation);
    }

    #[test]
    fn invalid_fields_block_commit_and_surface_messages() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = test_state(&dir);
        let (tx, _rx) = mpsc::channel();

        fill_valid_personal(&mut state);
        state.personal.email.set("not-an-email");
        state.go_next(&tx);

        assert_eq!(state.page, Step::PersonalInformation);
        assert!(state.personal.errors.contains_key(&P_EMAIL));
        assert!(state.store.data().personal.name.is_empty());
    }

    #[test]
    fn changing_country_clears_state_and_city() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = test_state(&dir);

        select_country(&mut state, "Canada");
        select_state(&mut state, "Ontario");
        select_city(&mut state, "Toronto");

        select_country(&mut state, "France");
        assert!(state.personal.selected_state().is_none());
        assert!(state.personal.selected_city().is_none());
        assert!(state.personal.cities.is_empty());
        assert!(state
            .personal
            .states
            .iter()
            .any(|s| s.name == "Ile-de-France"));
    }

    #[test]
    fn back_does_not_persist_the_step_regression() {
        let dir = tempfile::tempdir().unwrap();
        let repo = ApplicationRepository::new(dir.path().join("application.json"));
        let mut state = WizardTui::new(AppStore::open(repo.clone()), Settings::default());
        let (tx, _rx) = mpsc::channel();

        fill_valid_personal(&mut state);
        state.go_next(&tx);
        assert_eq!(state.page, Step::FamilyAndFinancialInformation);

        state.go_back();
        assert_eq!(state.page, Step::PersonalInformation);

        let (_, step) = repo.load();
        assert_eq!(step, Step::FamilyAndFinancialInformation);
    }

    #[test]
    fn goto_ahead_of_progress_redirects_to_recorded_step() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = test_state(&dir);

        state.goto(Step::SituationInformation);
        assert_eq!(state.page, Step::PersonalInformation);
        assert_eq!(state.route, "/personalInformation");
    }

    #[test]
    fn submit_resets_state_even_with_unreachable_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let repo = ApplicationRepository::new(dir.path().join("application.json"));
        let mut store = AppStore::open(repo.clone());
        store.set_step(Step::SituationInformation);
        drop(store);

        let mut settings = Settings::default();
        settings.submit_endpoint = "http://127.0.0.1:9/submit".to_string();
        let mut state = WizardTui::new(AppStore::open(repo.clone()), settings);
        let (tx, rx) = mpsc::channel();

        state
            .situation
            .current_financial_situation
            .set("My income no longer covers rent and utilities.");
        state
            .situation
            .employment_circumstances
            .set("I was laid off last month and am actively interviewing.");
        state
            .situation
            .reason_for_applying
            .set("I need short-term support to keep my housing.");
        state.go_next(&tx);

        assert_eq!(state.page, Step::Submit);
        assert_eq!(state.store.data().situation.reason_for_applying, "");
        assert_eq!(
            state.notice.as_deref(),
            Some("Application submitted successfully.")
        );

        let (data, step) = repo.load();
        assert_eq!(data.situation.current_financial_situation, "");
        assert_eq!(step, Step::Submit);

        // The background worker still reports in; its outcome is only logged.
        let msg = rx.recv_timeout(Duration::from_secs(30)).unwrap();
        assert!(matches!(msg, UiMsg::SubmitFinished { .. }));
    }

    #[test]
    fn situation_validation_blocks_short_narratives() {
        let dir = tempfile::tempdir().unwrap();
        let repo = ApplicationRepository::new(dir.path().join("application.json"));
        let mut store = AppStore::open(repo.clone());
        store.set_step(Step::SituationInformation);
        drop(store);

        let mut state = WizardTui::new(AppStore::open(repo), Settings::default());
        let (tx, _rx) = mpsc::channel();

        state.situation.current_financial_situation.set("short");
        state.go_next(&tx);

        assert_eq!(state.page, Step::SituationInformation);
        assert!(state.situation.errors.contains_key(&S_FINANCIAL));
        assert!(state.situation.errors.contains_key(&S_EMPLOYMENT));
        assert!(state.situation.errors.contains_key(&S_REASON));
    }

    #[test]
    fn accepting_assist_text_updates_buffer_and_store() {
        let dir = tempfile::tempdir().unwrap();
        let repo = ApplicationRepository::new(dir.path().join("application.json"));
        let mut store = AppStore::open(repo.clone());
        store.set_step(Step::SituationInformation);
        drop(store);

        let mut state = WizardTui::new(AppStore::open(repo.clone()), Settings::default());
        let template = ai::fallback_template(FieldKey::ReasonForApplying).to_string();
        state.accept_assist(FieldKey::ReasonForApplying, template.clone());

        assert_eq!(state.situation.reason_for_applying.value, template);
        assert_eq!(state.store.data().situation.reason_for_applying, template);

        let (data, _) = repo.load();
        assert_eq!(data.situation.reason_for_applying, template);
    }

    #[test]
    fn stale_suggestion_results_are_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = test_state(&dir);
        let (_tx, rx) = mpsc::channel::<UiMsg>();
        drop(_tx);

        // Simulate a result arriving after the modal was dismissed.
        state.modal = None;
        let (tx2, rx2) = mpsc::channel::<UiMsg>();
        tx2.send(UiMsg::SuggestionReady {
            request_id: 42,
            outcome: AssistOutcome {
                text: "late arrival".to_string(),
                used_fallback: false,
            },
        })
        .unwrap();
        drain_messages(&mut state, &rx2);
        drain_messages(&mut state, &rx);

        assert!(state.modal.is_none());
        assert!(state.notice.is_none());
        assert!(state.store.data().situation.reason_for_applying.is_empty());
    }

    #[test]
    fn fallback_suggestion_sets_notice_and_modal_text() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = test_state(&dir);

        state.modal = Some(Modal::Assist {
            field: FieldKey::CurrentFinancialSituation,
            status: AssistStatus::Requesting,
            text: TextInput::new(""),
            request_id: 7,
        });

        let (tx, rx) = mpsc::channel::<UiMsg>();
        tx.send(UiMsg::SuggestionReady {
            request_id: 7,
            outcome: AssistOutcome {
                text: ai::fallback_template(FieldKey::CurrentFinancialSituation).to_string(),
                used_fallback: true,
            },
        })
        .unwrap();
        drain_messages(&mut state, &rx);

        match &state.modal {
            Some(Modal::Assist { status, text, .. }) => {
                assert_eq!(*status, AssistStatus::Ready { used_fallback: true });
                assert_eq!(
                    text.value,
                    ai::fallback_template(FieldKey::CurrentFinancialSituation)
                );
            }
            other => panic!("unexpected modal: {:?}", other),
        }
        assert_eq!(state.notice.as_deref(), Some(ai::FALLBACK_NOTICE));
    }

    #[test]
    fn smoke_targets_render_without_panicking() {
        for target in ["personal", "family", "situation", "submit", "assist"] {
            let state = new_smoke_wizard_state(target);
            let backend = TestBackend::new(100, 30);
            let mut terminal = Terminal::new(backend).unwrap();
            terminal.draw(|f| draw(f.size(), f, &state)).unwrap();
        }
    }
}
