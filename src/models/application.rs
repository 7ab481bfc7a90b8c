// Application domain model
// Shapes match the persisted record: { personal, family, situation, step }

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaritalStatus {
    #[default]
    Single,
    Married,
    Divorced,
    Widowed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmploymentStatus {
    Employed,
    #[default]
    Unemployed,
    Student,
    Retired,
    // Stored as "self" for compatibility with existing records.
    #[serde(rename = "self")]
    SelfEmployed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HousingStatus {
    #[default]
    Rent,
    Own,
    Family,
    Subsidized,
}

impl Gender {
    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

impl MaritalStatus {
    pub const ALL: [MaritalStatus; 4] = [
        MaritalStatus::Single,
        MaritalStatus::Married,
        MaritalStatus::Divorced,
        MaritalStatus::Widowed,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MaritalStatus::Single => "Single",
            MaritalStatus::Married => "Married",
            MaritalStatus::Divorced => "Divorced",
            MaritalStatus::Widowed => "Widowed",
        }
    }
}

impl EmploymentStatus {
    pub const ALL: [EmploymentStatus; 5] = [
        EmploymentStatus::Employed,
        EmploymentStatus::Unemployed,
        EmploymentStatus::Student,
        EmploymentStatus::Retired,
        EmploymentStatus::SelfEmployed,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EmploymentStatus::Employed => "Employed",
            EmploymentStatus::Unemployed => "Unemployed",
            EmploymentStatus::Student => "Student",
            EmploymentStatus::Retired => "Retired",
            EmploymentStatus::SelfEmployed => "Self-employed",
        }
    }
}

impl HousingStatus {
    pub const ALL: [HousingStatus; 4] = [
        HousingStatus::Rent,
        HousingStatus::Own,
        HousingStatus::Family,
        HousingStatus::Subsidized,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            HousingStatus::Rent => "Rent",
            HousingStatus::Own => "Own",
            HousingStatus::Family => "Living with family",
            HousingStatus::Subsidized => "Subsidized housing",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInformation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub national_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyAndFinancialInformation {
    #[serde(default)]
    pub marital_status: MaritalStatus,
    #[serde(default)]
    pub dependents: u32,
    #[serde(default)]
    pub employment_status: EmploymentStatus,
    #[serde(default)]
    pub monthly_income: f64,
    #[serde(default)]
    pub housing_status: HousingStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SituationInformation {
    #[serde(default)]
    pub current_financial_situation: String,
    #[serde(default)]
    pub employment_circumstances: String,
    #[serde(default)]
    pub reason_for_applying: String,
}

/// Full application payload: the three slices owned by the editable steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationData {
    #[serde(default)]
    pub personal: PersonalInformation,
    #[serde(default)]
    pub family: FamilyAndFinancialInformation,
    #[serde(default)]
    pub situation: SituationInformation,
}

/// Wizard step. Ordinals are the traversal order; `Submit` is terminal and
/// has no editable form. Persisted as the bare integer 0-3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Step {
    #[default]
    PersonalInformation = 0,
    FamilyAndFinancialInformation = 1,
    SituationInformation = 2,
    Submit = 3,
}

impl Step {
    /// Steps with an editable form, in traversal order.
    pub const EDITABLE: [Step; 3] = [
        Step::PersonalInformation,
        Step::FamilyAndFinancialInformation,
        Step::SituationInformation,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn title(&self) -> &'static str {
        match self {
            Step::PersonalInformation => "Personal Information",
            Step::FamilyAndFinancialInformation => "Family & Financial Information",
            Step::SituationInformation => "Situation Information",
            Step::Submit => "Application Submitted",
        }
    }
}

impl From<Step> for u8 {
    fn from(step: Step) -> Self {
        step as u8
    }
}

impl TryFrom<u8> for Step {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Step::PersonalInformation),
            1 => Ok(Step::FamilyAndFinancialInformation),
            2 => Ok(Step::SituationInformation),
            3 => Ok(Step::Submit),
            other => Err(format!("invalid step ordinal: {}", other)),
        }
    }
}

/// Prompt language for AI-assist suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ar")]
    Arabic,
}

impl Language {
    pub fn label(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Arabic => "Arabic (العربية)",
        }
    }
}
