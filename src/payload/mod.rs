//! Request payload preparation for inspection records.
//!
//! Client payloads are loosely shaped JSON objects. Before they are decoded
//! into typed requests, server-assigned keys are dropped and semantically
//! empty values are stripped. The decoded request is then checked against the
//! record's family and form type.

use serde_json::{Map, Value};

use crate::db::Repository;
use crate::errors::{AppError, FieldError};
use crate::models::{
    CreateRecordRequest, InspectionRecord, NewRecord, ReportFamily, UpdateRecordRequest,
};

/// Keys kept even when their value is empty.
const ALWAYS_KEEP: [&str; 4] = ["createdBy", "formType", "status", "clientName"];

/// Report numbers are only ever assigned by the server.
const REPORT_NUMBER_KEYS: [&str; 2] = ["reportNo", "report_no"];

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Drop report-number keys and empty values from a raw payload.
pub fn sanitize(mut payload: Map<String, Value>) -> Map<String, Value> {
    for key in REPORT_NUMBER_KEYS {
        if payload.remove(key).is_some() {
            tracing::debug!("Ignoring client-supplied {}", key);
        }
    }

    payload.retain(|key, value| ALWAYS_KEEP.contains(&key.as_str()) || !is_empty_value(value));

    if let Some(Value::Object(details)) = payload.get_mut("details") {
        details.retain(|_, value| !is_empty_value(value));
    }

    payload
}

/// Reject values that cannot be record or service identifiers.
pub fn check_id(field: &str, value: &str) -> Result<(), AppError> {
    uuid::Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|_| AppError::cast(field, value))
}

/// Decode and validate a create payload for `family`.
pub fn prepare_create(
    family: ReportFamily,
    payload: Map<String, Value>,
) -> Result<NewRecord, AppError> {
    let request: CreateRecordRequest = serde_json::from_value(Value::Object(sanitize(payload)))?;
    if let Some(service_id) = &request.service_id {
        check_id("serviceId", service_id)?;
    }

    let record = NewRecord {
        form_type: request
            .form_type
            .unwrap_or_else(|| family.default_form_type()),
        status: request.status.unwrap_or_default(),
        client_name: request
            .client_name
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
        location: request.location,
        inspection_date: request.inspection_date,
        inspector_name: request.inspector_name,
        result: request.result,
        service_id: request.service_id,
        details: request.details,
    };

    let errors = check_fields(family, &record.client_name, record.form_type, &record.details);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    Ok(record)
}

/// Merge an update payload into `record` and validate the result.
///
/// Supplied fixed fields replace stored ones; supplied `details` keys are
/// merged into the stored details. A change of form type starts the details
/// over from the supplied map, since the old form's fields are not valid
/// under the new one. Identity fields are never touched.
pub fn apply_update(record: &mut InspectionRecord, payload: Map<String, Value>) -> Result<(), AppError> {
    let request: UpdateRecordRequest = serde_json::from_value(Value::Object(sanitize(payload)))?;
    if let Some(service_id) = &request.service_id {
        check_id("serviceId", service_id)?;
    }

    let details = request.details;
    match request.form_type {
        Some(form_type) if form_type != record.form_type => {
            record.form_type = form_type;
            record.details = details;
        }
        _ => record.details.extend(details),
    }
    if let Some(status) = request.status {
        record.status = status;
    }
    if let Some(client_name) = request.client_name {
        record.client_name = client_name.trim().to_string();
    }
    if request.location.is_some() {
        record.location = request.location;
    }
    if request.inspection_date.is_some() {
        record.inspection_date = request.inspection_date;
    }
    if request.inspector_name.is_some() {
        record.inspector_name = request.inspector_name;
    }
    if request.result.is_some() {
        record.result = request.result;
    }
    if request.service_id.is_some() {
        record.service_id = request.service_id;
    }

    let errors = check_fields(
        record.family,
        &record.client_name,
        record.form_type,
        &record.details,
    );
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    Ok(())
}

/// Ensure a referenced service exists and is still offered.
pub async fn check_service(repo: &Repository, service_id: Option<&str>) -> Result<(), AppError> {
    let Some(service_id) = service_id else {
        return Ok(());
    };
    match repo.get_service(service_id).await? {
        Some(service) if service.is_active => Ok(()),
        _ => Err(AppError::validation(
            "serviceId",
            format!("serviceId {} does not reference an active service", service_id),
        )),
    }
}

fn check_fields(
    family: ReportFamily,
    client_name: &str,
    form_type: crate::models::FormType,
    details: &Map<String, Value>,
) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if client_name.is_empty() {
        errors.push(FieldError::new("clientName", "clientName is required"));
    }

    if !family.accepts(form_type) {
        errors.push(FieldError::new(
            "formType",
            format!(
                "formType {} is not valid for {} reports",
                form_type.as_str(),
                family.code()
            ),
        ));
        return errors;
    }

    errors.extend(form_type.validate_details(details));
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FormType, RecordStatus};
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn stored_record() -> InspectionRecord {
        InspectionRecord {
            id: "5f0c6a53-8d0c-4a53-8f5e-3c1b1bd7c9a1".to_string(),
            family: ReportFamily::Inspection,
            report_no: "LIR-2025-0007".to_string(),
            verification_token: None,
            created_by: "owner".to_string(),
            form_type: FormType::LiftingEquipment,
            status: RecordStatus::Draft,
            client_name: "Acme Cranes".to_string(),
            location: Some("Yard 3".to_string()),
            inspection_date: None,
            inspector_name: None,
            result: None,
            service_id: None,
            details: map(json!({ "equipmentId": "CR-12", "safeWorkingLoad": 5000 })),
            created_at: "2025-01-01T00:00:00Z".to_string(),
            updated_at: "2025-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_sanitize_strips_report_number_and_empty_values() {
        let cleaned = sanitize(map(json!({
            "reportNo": "LIR-2025-0001",
            "report_no": "LIR-2025-0002",
            "location": "",
            "inspectorName": "   ",
            "result": null,
            "clientName": "",
            "status": null,
            "details": { "remarks": "", "equipmentId": "CR-1" }
        })));

        assert!(!cleaned.contains_key("reportNo"));
        assert!(!cleaned.contains_key("report_no"));
        assert!(!cleaned.contains_key("location"));
        assert!(!cleaned.contains_key("inspectorName"));
        assert!(!cleaned.contains_key("result"));
        assert_eq!(cleaned["clientName"], json!(""));
        assert_eq!(cleaned["status"], json!(null));
        assert_eq!(cleaned["details"], json!({ "equipmentId": "CR-1" }));
    }

    #[test]
    fn test_prepare_create_defaults_form_type_and_status() {
        let record = prepare_create(
            ReportFamily::Inspection,
            map(json!({
                "clientName": "  Acme Cranes ",
                "details": { "equipmentId": "CR-12", "safeWorkingLoad": 5000 }
            })),
        )
        .unwrap();
        assert_eq!(record.form_type, FormType::LiftingEquipment);
        assert_eq!(record.status, RecordStatus::Draft);
        assert_eq!(record.client_name, "Acme Cranes");
    }

    #[test]
    fn test_prepare_create_rejects_foreign_form_type() {
        let err = prepare_create(
            ReportFamily::Ultrasonic,
            map(json!({ "clientName": "Acme", "formType": "safety_audit" })),
        )
        .unwrap_err();
        match err {
            AppError::Validation(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "formType");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_prepare_create_reports_all_missing_fields() {
        let err = prepare_create(
            ReportFamily::Pwht,
            map(json!({ "clientName": "", "details": { "jointId": "J-1" } })),
        )
        .unwrap_err();
        assert_eq!(
            err.message(),
            "clientName is required, details.soakTemperatureC is required, details.soakTimeMinutes is required"
        );
    }

    #[test]
    fn test_malformed_service_id_is_cast_error() {
        let err = prepare_create(
            ReportFamily::Inspection,
            map(json!({ "clientName": "Acme", "serviceId": "12345" })),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Cast { ref field, .. } if field == "serviceId"));
    }

    #[test]
    fn test_update_never_touches_report_number_or_creator() {
        let mut record = stored_record();
        apply_update(
            &mut record,
            map(json!({
                "reportNo": "HACKED-0001",
                "report_no": "HACKED-0002",
                "createdBy": "intruder",
                "status": "submitted"
            })),
        )
        .unwrap();
        assert_eq!(record.report_no, "LIR-2025-0007");
        assert_eq!(record.created_by, "owner");
        assert_eq!(record.status, RecordStatus::Pending);
    }

    #[test]
    fn test_update_merges_details_and_keeps_blank_fields() {
        let mut record = stored_record();
        apply_update(
            &mut record,
            map(json!({
                "location": "",
                "details": { "proofLoad": 6250, "remarks": "" }
            })),
        )
        .unwrap();
        assert_eq!(record.location.as_deref(), Some("Yard 3"));
        assert_eq!(record.details["equipmentId"], json!("CR-12"));
        assert_eq!(record.details["proofLoad"], json!(6250));
        assert!(!record.details.contains_key("remarks"));
    }

    #[test]
    fn test_update_revalidates_against_new_form_type() {
        let mut record = stored_record();
        let err = apply_update(&mut record, map(json!({ "formType": "pressure_vessel" }))).unwrap_err();
        let AppError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["details.vesselId", "details.designPressure"]);
    }

    #[test]
    fn test_update_switches_form_type_with_new_details() {
        let mut record = stored_record();
        apply_update(
            &mut record,
            map(json!({
                "formType": "pressure_vessel",
                "details": {
                    "vesselId": "V-1",
                    "designPressure": 12.5,
                    "equipmentId": null,
                    "safeWorkingLoad": null
                }
            })),
        )
        .unwrap();

        assert_eq!(record.form_type, FormType::PressureVessel);
        assert_eq!(
            record.details,
            map(json!({ "vesselId": "V-1", "designPressure": 12.5 }))
        );
        assert_eq!(record.report_no, "LIR-2025-0007");
    }

    #[test]
    fn test_update_with_same_form_type_still_merges() {
        let mut record = stored_record();
        apply_update(
            &mut record,
            map(json!({ "formType": "lifting_equipment", "details": { "proofLoad": 6250 } })),
        )
        .unwrap();

        assert_eq!(record.details["equipmentId"], "CR-12");
        assert_eq!(record.details["proofLoad"], 6250);
    }

    #[test]
    fn test_check_id() {
        assert!(check_id("id", "5f0c6a53-8d0c-4a53-8f5e-3c1b1bd7c9a1").is_ok());
        assert!(check_id("id", "not-a-uuid").is_err());
    }
}
