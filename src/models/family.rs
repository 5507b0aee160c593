//! Report families: one storage table and one numbering sequence each.

use serde::{Deserialize, Serialize};

use super::FormType;

/// A report family owns a table, a report number code and a set of form types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReportFamily {
    Inspection,
    Ultrasonic,
    LiquidPenetrant,
    MagneticParticle,
    WeldingAudit,
    Pwht,
}

impl ReportFamily {
    pub const ALL: [ReportFamily; 6] = [
        ReportFamily::Inspection,
        ReportFamily::Ultrasonic,
        ReportFamily::LiquidPenetrant,
        ReportFamily::MagneticParticle,
        ReportFamily::WeldingAudit,
        ReportFamily::Pwht,
    ];

    /// Code used as the first segment of report numbers.
    pub fn code(&self) -> &'static str {
        match self {
            ReportFamily::Inspection => "LIR",
            ReportFamily::Ultrasonic => "UT",
            ReportFamily::LiquidPenetrant => "PT",
            ReportFamily::MagneticParticle => "MPT",
            ReportFamily::WeldingAudit => "WAA",
            ReportFamily::Pwht => "PWHT",
        }
    }

    /// Storage table. Only ever interpolated from this closed set.
    pub fn table(&self) -> &'static str {
        match self {
            ReportFamily::Inspection => "inspection_records",
            ReportFamily::Ultrasonic => "ultrasonic_records",
            ReportFamily::LiquidPenetrant => "liquid_penetrant_records",
            ReportFamily::MagneticParticle => "magnetic_particle_records",
            ReportFamily::WeldingAudit => "welding_audit_records",
            ReportFamily::Pwht => "pwht_records",
        }
    }

    /// Path segment under `/api/records`.
    pub fn slug(&self) -> &'static str {
        match self {
            ReportFamily::Inspection => "inspections",
            ReportFamily::Ultrasonic => "ultrasonic",
            ReportFamily::LiquidPenetrant => "liquid-penetrant",
            ReportFamily::MagneticParticle => "magnetic-particle",
            ReportFamily::WeldingAudit => "welding-audits",
            ReportFamily::Pwht => "pwht",
        }
    }

    pub fn from_slug(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|family| family.slug() == s)
    }

    /// Key used in the counter table and the search index.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFamily::Inspection => "inspection",
            ReportFamily::Ultrasonic => "ultrasonic",
            ReportFamily::LiquidPenetrant => "liquid_penetrant",
            ReportFamily::MagneticParticle => "magnetic_particle",
            ReportFamily::WeldingAudit => "welding_audit",
            ReportFamily::Pwht => "pwht",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|family| family.as_str() == s)
    }

    /// Form types a record of this family may carry.
    pub fn form_types(&self) -> &'static [FormType] {
        match self {
            ReportFamily::Inspection => &[
                FormType::LiftingEquipment,
                FormType::PressureVessel,
                FormType::ThirdPartyInspection,
                FormType::SafetyAudit,
            ],
            ReportFamily::Ultrasonic => &[FormType::Ultrasonic],
            ReportFamily::LiquidPenetrant => &[FormType::LiquidPenetrant],
            ReportFamily::MagneticParticle => &[FormType::MagneticParticle],
            ReportFamily::WeldingAudit => &[FormType::WeldingAssessmentAudit],
            ReportFamily::Pwht => &[FormType::PostWeldHeatTreatment],
        }
    }

    /// Form type assumed when a payload does not name one.
    pub fn default_form_type(&self) -> FormType {
        self.form_types()[0]
    }

    pub fn accepts(&self, form_type: FormType) -> bool {
        self.form_types().contains(&form_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_round_trip_for_every_family() {
        for family in ReportFamily::ALL {
            assert_eq!(ReportFamily::from_slug(family.slug()), Some(family));
            assert_eq!(ReportFamily::parse(family.as_str()), Some(family));
        }
        assert_eq!(ReportFamily::from_slug("unknown"), None);
    }

    #[test]
    fn test_codes_and_tables_are_distinct() {
        let mut codes: Vec<_> = ReportFamily::ALL.iter().map(|f| f.code()).collect();
        let mut tables: Vec<_> = ReportFamily::ALL.iter().map(|f| f.table()).collect();
        codes.sort();
        codes.dedup();
        tables.sort();
        tables.dedup();
        assert_eq!(codes.len(), ReportFamily::ALL.len());
        assert_eq!(tables.len(), ReportFamily::ALL.len());
    }

    #[test]
    fn test_inspection_family_accepts_generic_form_types() {
        let family = ReportFamily::Inspection;
        assert_eq!(family.default_form_type(), FormType::LiftingEquipment);
        assert!(family.accepts(FormType::SafetyAudit));
        assert!(!family.accepts(FormType::Ultrasonic));
        assert!(!ReportFamily::Ultrasonic.accepts(FormType::LiftingEquipment));
    }
}
