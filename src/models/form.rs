//! Form types and the closed field set each one accepts in `details`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::FieldError;

/// Discriminator naming the report template a record was filled from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FormType {
    LiftingEquipment,
    PressureVessel,
    ThirdPartyInspection,
    SafetyAudit,
    Ultrasonic,
    LiquidPenetrant,
    MagneticParticle,
    WeldingAssessmentAudit,
    PostWeldHeatTreatment,
}

/// JSON shape a details field must have.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    /// `YYYY-MM-DD` string.
    Date,
    Boolean,
    List,
    Object,
}

impl FieldKind {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldKind::Text => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::Date => value
                .as_str()
                .is_some_and(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::List => value.is_array(),
            FieldKind::Object => value.is_object(),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            FieldKind::Text => "a string",
            FieldKind::Number => "a number",
            FieldKind::Date => "a date (YYYY-MM-DD)",
            FieldKind::Boolean => "a boolean",
            FieldKind::List => "a list",
            FieldKind::Object => "an object",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn req(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required: true,
    }
}

const fn opt(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required: false,
    }
}

use FieldKind::{Boolean, Date, List, Number, Object, Text};

const LIFTING_EQUIPMENT: &[FieldSpec] = &[
    req("equipmentId", Text),
    opt("equipmentType", Text),
    opt("manufacturer", Text),
    req("safeWorkingLoad", Number),
    opt("proofLoad", Number),
    opt("lastInspectionDate", Date),
    opt("nextInspectionDate", Date),
    opt("defects", List),
    opt("remarks", Text),
];

const PRESSURE_VESSEL: &[FieldSpec] = &[
    req("vesselId", Text),
    req("designPressure", Number),
    opt("testPressure", Number),
    opt("hydrotestDate", Date),
    opt("safetyValveTested", Boolean),
    opt("remarks", Text),
];

const THIRD_PARTY_INSPECTION: &[FieldSpec] = &[
    req("purchaseOrder", Text),
    req("vendor", Text),
    opt("itemsInspected", List),
    opt("witnessPoints", List),
    opt("documentsReviewed", List),
    opt("remarks", Text),
];

const SAFETY_AUDIT: &[FieldSpec] = &[
    req("site", Text),
    opt("auditor", Text),
    req("findings", List),
    opt("score", Number),
    opt("correctiveActions", List),
    opt("remarks", Text),
];

const ULTRASONIC: &[FieldSpec] = &[
    req("componentId", Text),
    opt("material", Text),
    opt("thickness", Number),
    opt("probeFrequencyMhz", Number),
    opt("couplant", Text),
    opt("calibrationBlock", Text),
    opt("indications", List),
    opt("acceptanceStandard", Text),
];

const LIQUID_PENETRANT: &[FieldSpec] = &[
    req("componentId", Text),
    opt("penetrantType", Text),
    opt("developer", Text),
    opt("dwellTimeMinutes", Number),
    opt("surfaceCondition", Text),
    opt("indications", List),
    opt("acceptanceStandard", Text),
];

const MAGNETIC_PARTICLE: &[FieldSpec] = &[
    req("componentId", Text),
    opt("magnetizationTechnique", Text),
    opt("currentType", Text),
    opt("fieldStrength", Number),
    opt("indications", List),
    opt("acceptanceStandard", Text),
];

const WELDING_ASSESSMENT_AUDIT: &[FieldSpec] = &[
    req("welderId", Text),
    req("wpsNumber", Text),
    opt("process", Text),
    opt("position", Text),
    opt("checklist", Object),
    opt("findings", List),
];

const POST_WELD_HEAT_TREATMENT: &[FieldSpec] = &[
    req("jointId", Text),
    req("soakTemperatureC", Number),
    req("soakTimeMinutes", Number),
    opt("heatingRateCPerHour", Number),
    opt("coolingRateCPerHour", Number),
    opt("chartRecorder", Text),
    opt("thermocouples", List),
];

impl FormType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormType::LiftingEquipment => "lifting_equipment",
            FormType::PressureVessel => "pressure_vessel",
            FormType::ThirdPartyInspection => "third_party_inspection",
            FormType::SafetyAudit => "safety_audit",
            FormType::Ultrasonic => "ultrasonic",
            FormType::LiquidPenetrant => "liquid_penetrant",
            FormType::MagneticParticle => "magnetic_particle",
            FormType::WeldingAssessmentAudit => "welding_assessment_audit",
            FormType::PostWeldHeatTreatment => "post_weld_heat_treatment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "lifting_equipment" => Some(FormType::LiftingEquipment),
            "pressure_vessel" => Some(FormType::PressureVessel),
            "third_party_inspection" => Some(FormType::ThirdPartyInspection),
            "safety_audit" => Some(FormType::SafetyAudit),
            "ultrasonic" => Some(FormType::Ultrasonic),
            "liquid_penetrant" => Some(FormType::LiquidPenetrant),
            "magnetic_particle" => Some(FormType::MagneticParticle),
            "welding_assessment_audit" => Some(FormType::WeldingAssessmentAudit),
            "post_weld_heat_treatment" => Some(FormType::PostWeldHeatTreatment),
            _ => None,
        }
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            FormType::LiftingEquipment => LIFTING_EQUIPMENT,
            FormType::PressureVessel => PRESSURE_VESSEL,
            FormType::ThirdPartyInspection => THIRD_PARTY_INSPECTION,
            FormType::SafetyAudit => SAFETY_AUDIT,
            FormType::Ultrasonic => ULTRASONIC,
            FormType::LiquidPenetrant => LIQUID_PENETRANT,
            FormType::MagneticParticle => MAGNETIC_PARTICLE,
            FormType::WeldingAssessmentAudit => WELDING_ASSESSMENT_AUDIT,
            FormType::PostWeldHeatTreatment => POST_WELD_HEAT_TREATMENT,
        }
    }

    /// Check a details map against this form type's field set.
    ///
    /// Collects every problem instead of stopping at the first one, so the
    /// caller can show all offending fields together.
    pub fn validate_details(&self, details: &Map<String, Value>) -> Vec<FieldError> {
        let spec = self.fields();
        let mut errors = Vec::new();

        for field in spec {
            match details.get(field.name) {
                None if field.required => errors.push(FieldError::new(
                    format!("details.{}", field.name),
                    format!("details.{} is required", field.name),
                )),
                Some(value) if !field.kind.accepts(value) => errors.push(FieldError::new(
                    format!("details.{}", field.name),
                    format!("details.{} must be {}", field.name, field.kind.describe()),
                )),
                _ => {}
            }
        }

        for key in details.keys() {
            if !spec.iter().any(|field| field.name == key) {
                errors.push(FieldError::new(
                    format!("details.{}", key),
                    format!("details.{} is not a field of {}", key, self.as_str()),
                ));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_valid_lifting_equipment_details() {
        let details = map(json!({
            "equipmentId": "CR-12",
            "safeWorkingLoad": 5000,
            "lastInspectionDate": "2025-02-01",
            "defects": []
        }));
        assert!(FormType::LiftingEquipment.validate_details(&details).is_empty());
    }

    #[test]
    fn test_missing_required_and_wrong_kind_reported_together() {
        let details = map(json!({ "safeWorkingLoad": "heavy" }));
        let errors = FormType::LiftingEquipment.validate_details(&details);
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["details.equipmentId", "details.safeWorkingLoad"]);
        assert_eq!(errors[1].message, "details.safeWorkingLoad must be a number");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let details = map(json!({
            "componentId": "P-7",
            "probeFrequency": 5
        }));
        let errors = FormType::Ultrasonic.validate_details(&details);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "details.probeFrequency");
    }

    #[test]
    fn test_date_kind_requires_calendar_date() {
        let details = map(json!({
            "vesselId": "V-1",
            "designPressure": 12.5,
            "hydrotestDate": "2025-13-40"
        }));
        let errors = FormType::PressureVessel.validate_details(&details);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "details.hydrotestDate");
    }

    #[test]
    fn test_parse_matches_as_str() {
        for form_type in [
            FormType::LiftingEquipment,
            FormType::PressureVessel,
            FormType::ThirdPartyInspection,
            FormType::SafetyAudit,
            FormType::Ultrasonic,
            FormType::LiquidPenetrant,
            FormType::MagneticParticle,
            FormType::WeldingAssessmentAudit,
            FormType::PostWeldHeatTreatment,
        ] {
            assert_eq!(FormType::parse(form_type.as_str()), Some(form_type));
        }
    }
}
