//! Inspection record operations, one table per report family.
//!
//! Every read and write that addresses existing records takes an
//! [`OwnerScope`]; rows outside the scope behave as if they did not exist.

use chrono::{Datelike, NaiveDate, Utc};
use sqlx::{QueryBuilder, Row, Sqlite};

use super::numbering;
use super::{OwnerScope, Repository};
use crate::errors::AppError;
use crate::models::{
    FormType, InspectionRecord, ListRecordsQuery, NewRecord, RecordStatus, ReportFamily, Verdict,
};

/// Attempts at inserting a record when its report number collides.
const MAX_CREATE_ATTEMPTS: u32 = 3;

const RECORD_COLUMNS: &str = "id, report_no, verification_token, created_by, form_type, status, \
     client_name, location, inspection_date, inspector_name, result, service_id, details, \
     created_at, updated_at";

impl Repository {
    /// List the records of a family visible under `scope`, newest first.
    pub async fn list_records(
        &self,
        family: ReportFamily,
        scope: &OwnerScope,
        filter: &ListRecordsQuery,
    ) -> Result<Vec<InspectionRecord>, AppError> {
        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM {} WHERE 1 = 1",
            RECORD_COLUMNS,
            family.table()
        ));
        scope.push_filter(&mut builder);
        if let Some(status) = filter.status {
            builder.push(" AND status = ");
            builder.push_bind(status.as_str());
        }
        if let Some(form_type) = filter.form_type {
            builder.push(" AND form_type = ");
            builder.push_bind(form_type.as_str());
        }
        builder.push(" ORDER BY created_at DESC, report_no DESC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(|row| record_from_row(family, row)).collect()
    }

    /// Get a record by ID, if visible under `scope`.
    pub async fn get_record(
        &self,
        family: ReportFamily,
        scope: &OwnerScope,
        id: &str,
    ) -> Result<Option<InspectionRecord>, AppError> {
        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM {} WHERE id = ",
            RECORD_COLUMNS,
            family.table()
        ));
        builder.push_bind(id);
        scope.push_filter(&mut builder);

        let row = builder.build().fetch_optional(&self.pool).await?;
        row.as_ref()
            .map(|row| record_from_row(family, row))
            .transpose()
    }

    /// Create a record numbered in the current calendar year.
    pub async fn create_record(
        &self,
        family: ReportFamily,
        created_by: &str,
        record: &NewRecord,
    ) -> Result<InspectionRecord, AppError> {
        self.create_record_in_year(family, created_by, record, Utc::now().year())
            .await
    }

    /// Create a record numbered in `year`.
    ///
    /// A duplicate report number can only come from rows that bypassed the
    /// counter; the counter is then reconciled with the stored numbers and the
    /// insert retried, up to [`MAX_CREATE_ATTEMPTS`] times.
    pub async fn create_record_in_year(
        &self,
        family: ReportFamily,
        created_by: &str,
        record: &NewRecord,
        year: i32,
    ) -> Result<InspectionRecord, AppError> {
        let mut attempt = 1;
        loop {
            match self
                .try_insert_record(family, created_by, record, year, attempt > 1)
                .await?
            {
                Ok(created) => {
                    tracing::info!(
                        "Created {} record {} for {}",
                        family.as_str(),
                        created.report_no,
                        created_by
                    );
                    return Ok(created);
                }
                Err(report_no) if attempt < MAX_CREATE_ATTEMPTS => {
                    tracing::warn!(
                        "Report number {} already taken (attempt {}/{}), retrying",
                        report_no,
                        attempt,
                        MAX_CREATE_ATTEMPTS
                    );
                    attempt += 1;
                }
                Err(report_no) => return Err(AppError::DuplicateReportNumber(report_no)),
            }
        }
    }

    /// One numbering-plus-insert transaction.
    ///
    /// The inner `Err` carries a report number that hit the unique constraint.
    async fn try_insert_record(
        &self,
        family: ReportFamily,
        created_by: &str,
        record: &NewRecord,
        year: i32,
        reconcile: bool,
    ) -> Result<Result<InspectionRecord, String>, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let verification_token = (record.status == RecordStatus::Approved).then(new_token);
        let details_json = serde_json::to_string(&record.details)
            .map_err(|e| AppError::Internal(format!("Failed to encode details: {}", e)))?;

        let mut tx = self.pool.begin().await?;
        let report_no = numbering::allocate(&mut *tx, family, year, reconcile).await?;

        let insert = sqlx::query(&format!(
            "INSERT INTO {} ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            family.table(),
            RECORD_COLUMNS
        ))
        .bind(&id)
        .bind(&report_no)
        .bind(&verification_token)
        .bind(created_by)
        .bind(record.form_type.as_str())
        .bind(record.status.as_str())
        .bind(&record.client_name)
        .bind(&record.location)
        .bind(record.inspection_date.map(|d| d.to_string()))
        .bind(&record.inspector_name)
        .bind(record.result.map(|r| r.as_str()))
        .bind(&record.service_id)
        .bind(&details_json)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await;

        match insert {
            Ok(_) => {}
            Err(sqlx::Error::Database(ref db))
                if db.is_unique_violation() && db.message().contains("report_no") =>
            {
                tx.rollback().await?;
                return Ok(Err(report_no));
            }
            Err(e) => return Err(e.into()),
        }

        tx.commit().await?;

        Ok(Ok(InspectionRecord {
            id,
            family,
            report_no,
            verification_token,
            created_by: created_by.to_string(),
            form_type: record.form_type,
            status: record.status,
            client_name: record.client_name.clone(),
            location: record.location.clone(),
            inspection_date: record.inspection_date,
            inspector_name: record.inspector_name.clone(),
            result: record.result,
            service_id: record.service_id.clone(),
            details: record.details.clone(),
            created_at: now.clone(),
            updated_at: now,
        }))
    }

    /// Persist the mutable fields of an already merged record.
    ///
    /// `report_no` and `created_by` are not part of the statement, so they
    /// keep their stored values whatever `record` holds.
    pub async fn update_record(
        &self,
        scope: &OwnerScope,
        record: &InspectionRecord,
    ) -> Result<InspectionRecord, AppError> {
        let family = record.family;
        let now = Utc::now().to_rfc3339();
        let verification_token = match (&record.verification_token, record.status) {
            (Some(token), _) => Some(token.clone()),
            (None, RecordStatus::Approved) => Some(new_token()),
            (None, _) => None,
        };
        let details_json = serde_json::to_string(&record.details)
            .map_err(|e| AppError::Internal(format!("Failed to encode details: {}", e)))?;

        let mut builder =
            QueryBuilder::<Sqlite>::new(format!("UPDATE {} SET form_type = ", family.table()));
        builder.push_bind(record.form_type.as_str());
        builder.push(", status = ");
        builder.push_bind(record.status.as_str());
        builder.push(", client_name = ");
        builder.push_bind(record.client_name.clone());
        builder.push(", location = ");
        builder.push_bind(record.location.clone());
        builder.push(", inspection_date = ");
        builder.push_bind(record.inspection_date.map(|d| d.to_string()));
        builder.push(", inspector_name = ");
        builder.push_bind(record.inspector_name.clone());
        builder.push(", result = ");
        builder.push_bind(record.result.map(|r| r.as_str()));
        builder.push(", service_id = ");
        builder.push_bind(record.service_id.clone());
        builder.push(", details = ");
        builder.push_bind(details_json);
        builder.push(", verification_token = ");
        builder.push_bind(verification_token.clone());
        builder.push(", updated_at = ");
        builder.push_bind(now.clone());
        builder.push(" WHERE id = ");
        builder.push_bind(record.id.clone());
        scope.push_filter(&mut builder);

        let result = builder.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Record {} not found", record.id)));
        }

        self.get_record(family, scope, &record.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Record {} not found", record.id)))
    }

    /// Delete a record visible under `scope`.
    pub async fn delete_record(
        &self,
        family: ReportFamily,
        scope: &OwnerScope,
        id: &str,
    ) -> Result<(), AppError> {
        let mut builder =
            QueryBuilder::<Sqlite>::new(format!("DELETE FROM {} WHERE id = ", family.table()));
        builder.push_bind(id);
        scope.push_filter(&mut builder);

        let result = builder.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Record {} not found", id)));
        }

        tracing::info!("Deleted {} record {}", family.as_str(), id);
        Ok(())
    }

    /// Every record of every family, for rebuilding the search index.
    pub async fn list_all_records(&self) -> Result<Vec<InspectionRecord>, AppError> {
        let mut records = Vec::new();
        for family in ReportFamily::ALL {
            records.extend(
                self.list_records(family, &OwnerScope::Everyone, &ListRecordsQuery::default())
                    .await?,
            );
        }
        Ok(records)
    }

    /// Find an approved record by its verification token, in any family.
    pub async fn find_approved_by_token(
        &self,
        token: &str,
    ) -> Result<Option<InspectionRecord>, AppError> {
        for family in ReportFamily::ALL {
            let row = sqlx::query(&format!(
                "SELECT {} FROM {} WHERE verification_token = ? AND status = ?",
                RECORD_COLUMNS,
                family.table()
            ))
            .bind(token)
            .bind(RecordStatus::Approved.as_str())
            .fetch_optional(&self.pool)
            .await?;

            if let Some(row) = row {
                return record_from_row(family, &row).map(Some);
            }
        }
        Ok(None)
    }
}

fn new_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn record_from_row(
    family: ReportFamily,
    row: &sqlx::sqlite::SqliteRow,
) -> Result<InspectionRecord, AppError> {
    let id: String = row.get("id");
    let corrupt = |column: &str, value: &str| {
        AppError::Internal(format!(
            "Record {} in {} has unreadable {}: {}",
            id,
            family.table(),
            column,
            value
        ))
    };

    let form_type_str: String = row.get("form_type");
    let form_type = FormType::parse(&form_type_str).ok_or_else(|| corrupt("form_type", &form_type_str))?;
    let status_str: String = row.get("status");
    let status = RecordStatus::parse(&status_str).ok_or_else(|| corrupt("status", &status_str))?;
    let result = match row.get::<Option<String>, _>("result") {
        Some(s) => Some(Verdict::parse(&s).ok_or_else(|| corrupt("result", &s))?),
        None => None,
    };
    let inspection_date = match row.get::<Option<String>, _>("inspection_date") {
        Some(s) => Some(
            NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| corrupt("inspection_date", &s))?,
        ),
        None => None,
    };
    let details_str: String = row.get("details");
    let details = serde_json::from_str(&details_str).map_err(|_| corrupt("details", &details_str))?;

    Ok(InspectionRecord {
        id: id.clone(),
        family,
        report_no: row.get("report_no"),
        verification_token: row.get("verification_token"),
        created_by: row.get("created_by"),
        form_type,
        status,
        client_name: row.get("client_name"),
        location: row.get("location"),
        inspection_date,
        inspector_name: row.get("inspector_name"),
        result,
        service_id: row.get("service_id"),
        details,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
