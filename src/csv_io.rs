use std::path::Path;

use crate::db::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{CompanySize, NewLead};

const LEAD_HEADERS: [&str; 9] = [
    "lead_id",
    "name",
    "email",
    "phone",
    "source",
    "status",
    "location",
    "industry",
    "company_size",
];

pub fn export_leads(db: &Database, path: &Path) -> AppResult<usize> {
    let leads = db.list_leads()?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(LEAD_HEADERS)?;

    for lead in &leads {
        writer.write_record([
            lead.lead_id.to_string(),
            lead.name.clone(),
            lead.email.clone(),
            lead.phone.clone().unwrap_or_default(),
            lead.source.clone(),
            lead.status.clone(),
            lead.location.clone().unwrap_or_default(),
            lead.industry.clone().unwrap_or_default(),
            lead.company_size.map(CompanySize::as_str).unwrap_or_default().to_string(),
        ])?;
    }
    writer.flush().map_err(|err| AppError::Io(err.to_string()))?;

    tracing::info!(count = leads.len(), path = %path.display(), "exported leads");
    Ok(leads.len())
}

/// Imports every row as a new lead. The lead_id and status columns are
/// ignored: imported leads always start fresh with status 'new'.
pub fn import_leads(db: &Database, path: &Path) -> AppResult<usize> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|header| header == name);

    let name_idx = column("name").ok_or_else(|| AppError::Validation("missing 'name' column".to_string()))?;
    let email_idx = column("email").ok_or_else(|| AppError::Validation("missing 'email' column".to_string()))?;
    let phone_idx = column("phone");
    let source_idx = column("source");
    let location_idx = column("location");
    let industry_idx = column("industry");
    let size_idx = column("company_size");

    let optional = |record: &csv::StringRecord, idx: Option<usize>| {
        idx.and_then(|idx| record.get(idx))
            .filter(|value| !value.is_empty())
            .map(ToString::to_string)
    };

    let mut imported = 0;
    for record in reader.records() {
        let record = record?;
        let company_size = optional(&record, size_idx)
            .map(|raw| CompanySize::parse(&raw))
            .transpose()?;

        db.insert_lead(&NewLead {
            name: record.get(name_idx).unwrap_or_default().to_string(),
            email: record.get(email_idx).unwrap_or_default().to_string(),
            phone: optional(&record, phone_idx),
            source: optional(&record, source_idx).unwrap_or_else(|| "import".to_string()),
            location: optional(&record, location_idx),
            industry: optional(&record, industry_idx),
            company_size,
        })?;
        imported += 1;
    }

    tracing::info!(count = imported, path = %path.display(), "imported leads");
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::{export_leads, import_leads};
    use crate::db::Database;
    use crate::errors::AppError;
    use crate::models::{CompanySize, NewLead};

    #[test]
    fn export_then_import_preserves_lead_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = Database::new(&dir.path().join("source.db")).expect("source db");
        source
            .insert_lead(&NewLead {
                name: "AutoMech GmbH".to_string(),
                email: "contact@automech.de".to_string(),
                phone: Some("+49-30-12345".to_string()),
                source: "trade_show".to_string(),
                location: Some("Germany".to_string()),
                industry: Some("automotive".to_string()),
                company_size: Some(CompanySize::Large),
            })
            .expect("insert");
        source
            .insert_lead(&NewLead {
                name: "Sparse Lead".to_string(),
                email: "sparse@example.com".to_string(),
                phone: None,
                source: "web".to_string(),
                location: None,
                industry: None,
                company_size: None,
            })
            .expect("insert sparse");

        let csv_path = dir.path().join("leads.csv");
        let exported = export_leads(&source, &csv_path).expect("export");
        assert_eq!(exported, 2);

        let target = Database::new(&dir.path().join("target.db")).expect("target db");
        let imported = import_leads(&target, &csv_path).expect("import");
        assert_eq!(imported, 2);

        let leads = target.list_leads().expect("list");
        assert_eq!(leads[0].name, "AutoMech GmbH");
        assert_eq!(leads[0].industry.as_deref(), Some("automotive"));
        assert_eq!(leads[0].company_size, Some(CompanySize::Large));
        assert_eq!(leads[1].phone, None);
        assert_eq!(leads[1].location, None);
    }

    #[test]
    fn import_rejects_files_without_required_columns() {
        let dir = tempfile::tempdir().expect("tempdir");
        let csv_path = dir.path().join("bad.csv");
        std::fs::write(&csv_path, "foo,bar\n1,2\n").expect("write csv");

        let db = Database::new(&dir.path().join("test.db")).expect("db");
        let result = import_leads(&db, &csv_path);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
