//! Inspection record model and its request bodies.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{FormType, ReportFamily};

/// Review status of a record. Any status may follow any other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    #[default]
    Draft,
    #[serde(alias = "submitted")]
    Pending,
    Approved,
    Rejected,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Draft => "draft",
            RecordStatus::Pending => "pending",
            RecordStatus::Approved => "approved",
            RecordStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(RecordStatus::Draft),
            "pending" | "submitted" => Some(RecordStatus::Pending),
            "approved" => Some(RecordStatus::Approved),
            "rejected" => Some(RecordStatus::Rejected),
            _ => None,
        }
    }
}

/// Overall outcome stated on the report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Satisfactory,
    Unsatisfactory,
    Conditional,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Satisfactory => "satisfactory",
            Verdict::Unsatisfactory => "unsatisfactory",
            Verdict::Conditional => "conditional",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "satisfactory" => Some(Verdict::Satisfactory),
            "unsatisfactory" => Some(Verdict::Unsatisfactory),
            "conditional" => Some(Verdict::Conditional),
            _ => None,
        }
    }
}

/// A submitted inspection report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionRecord {
    pub id: String,
    pub family: ReportFamily,
    pub report_no: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_token: Option<String>,
    pub created_by: String,
    pub form_type: FormType,
    pub status: RecordStatus,
    pub client_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspection_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspector_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Verdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    pub details: Map<String, Value>,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating a record, after payload sanitising.
///
/// There is deliberately no `reportNo` or `createdBy` here: both are
/// assigned by the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordRequest {
    #[serde(default)]
    pub form_type: Option<FormType>,
    #[serde(default)]
    pub status: Option<RecordStatus>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub inspection_date: Option<NaiveDate>,
    #[serde(default)]
    pub inspector_name: Option<String>,
    #[serde(default)]
    pub result: Option<Verdict>,
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub details: Map<String, Value>,
}

/// Validated content of a record about to be inserted.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub form_type: FormType,
    pub status: RecordStatus,
    pub client_name: String,
    pub location: Option<String>,
    pub inspection_date: Option<NaiveDate>,
    pub inspector_name: Option<String>,
    pub result: Option<Verdict>,
    pub service_id: Option<String>,
    pub details: Map<String, Value>,
}

/// Request body for updating a record, after payload sanitising.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecordRequest {
    #[serde(default)]
    pub form_type: Option<FormType>,
    #[serde(default)]
    pub status: Option<RecordStatus>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub inspection_date: Option<NaiveDate>,
    #[serde(default)]
    pub inspector_name: Option<String>,
    #[serde(default)]
    pub result: Option<Verdict>,
    #[serde(default)]
    pub service_id: Option<String>,
    /// Merged key by key into the stored details.
    #[serde(default)]
    pub details: Map<String, Value>,
}

/// Query parameters accepted by record listings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRecordsQuery {
    #[serde(default)]
    pub status: Option<RecordStatus>,
    #[serde(default)]
    pub form_type: Option<FormType>,
}

/// Public view of an approved record, served by the verification endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationSummary {
    pub report_no: String,
    pub family: ReportFamily,
    pub form_type: FormType,
    pub status: RecordStatus,
    pub client_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspection_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Verdict>,
}

impl From<&InspectionRecord> for VerificationSummary {
    fn from(record: &InspectionRecord) -> Self {
        Self {
            report_no: record.report_no.clone(),
            family: record.family,
            form_type: record.form_type,
            status: record.status,
            client_name: record.client_name.clone(),
            inspection_date: record.inspection_date,
            result: record.result,
        }
    }
}

/// Family description served to clients building forms.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyDescriptor {
    pub family: ReportFamily,
    pub slug: &'static str,
    pub code: &'static str,
    pub default_form_type: FormType,
    pub form_types: Vec<FormTypeDescriptor>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormTypeDescriptor {
    pub form_type: FormType,
    pub fields: &'static [super::FieldSpec],
}

impl From<ReportFamily> for FamilyDescriptor {
    fn from(family: ReportFamily) -> Self {
        Self {
            family,
            slug: family.slug(),
            code: family.code(),
            default_form_type: family.default_form_type(),
            form_types: family
                .form_types()
                .iter()
                .map(|form_type| FormTypeDescriptor {
                    form_type: *form_type,
                    fields: form_type.fields(),
                })
                .collect(),
        }
    }
}
