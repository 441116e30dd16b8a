use crate::errors::{AppError, AppResult};
use crate::models::{
    CompanySize, Lead, NewLead, NewOpportunity, NewOrder, NewQuote, Opportunity, OpportunityStage, Order,
    OrderStatus, Quote, QuoteStatus,
};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// SQLite storage collaborator for the four funnel collections.
///
/// The connection is acquired for the duration of a single method call and
/// released on every exit path, including failure.
#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl Database {
    pub fn new(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| AppError::Io(err.to_string()))?;
            }
        }
        let conn = Connection::open(path).map_err(AppError::from)?;
        conn.execute_batch(SCHEMA_SQL).map_err(AppError::from)?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Internal("database mutex poisoned".to_string()))
    }

    pub fn insert_lead(&self, payload: &NewLead) -> AppResult<Lead> {
        payload.validate()?;
        let now = Utc::now();

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO leads (name, email, phone, source, status, location, industry, company_size, created_at)
             VALUES (?1, ?2, ?3, ?4, 'new', ?5, ?6, ?7, ?8)",
            params![
                payload.name,
                payload.email,
                payload.phone,
                payload.source,
                payload.location,
                payload.industry,
                payload.company_size.map(CompanySize::as_str),
                now.to_rfc3339(),
            ],
        )?;
        let lead_id = conn.last_insert_rowid();

        Ok(Lead {
            lead_id,
            name: payload.name.clone(),
            email: payload.email.clone(),
            phone: payload.phone.clone(),
            source: payload.source.clone(),
            status: "new".to_string(),
            location: payload.location.clone(),
            industry: payload.industry.clone(),
            company_size: payload.company_size,
            created_at: now,
        })
    }

    pub fn insert_opportunity(&self, payload: &NewOpportunity) -> AppResult<Opportunity> {
        payload.validate()?;
        let now = Utc::now();

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO opportunities (lead_id, title, estimated_value, stage, probability, expected_close, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                payload.lead_id,
                payload.title,
                payload.estimated_value,
                payload.stage.as_str(),
                payload.probability,
                payload.expected_close,
                now.to_rfc3339(),
            ],
        )?;
        let opp_id = conn.last_insert_rowid();

        Ok(Opportunity {
            opp_id,
            lead_id: payload.lead_id,
            title: payload.title.clone(),
            estimated_value: payload.estimated_value,
            stage: payload.stage,
            probability: payload.probability,
            expected_close: payload.expected_close,
            created_at: now,
        })
    }

    pub fn insert_quote(&self, payload: &NewQuote) -> AppResult<Quote> {
        payload.validate()?;
        let now = Utc::now();

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO quotes (opp_id, quote_number, quoted_amount, valid_until, payment_terms, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                payload.opp_id,
                payload.quote_number,
                payload.quoted_amount,
                payload.valid_until,
                payload.payment_terms,
                payload.status.as_str(),
                now.to_rfc3339(),
            ],
        )?;
        let quote_id = conn.last_insert_rowid();

        Ok(Quote {
            quote_id,
            opp_id: payload.opp_id,
            quote_number: payload.quote_number.clone(),
            quoted_amount: payload.quoted_amount,
            valid_until: payload.valid_until,
            payment_terms: payload.payment_terms.clone(),
            status: payload.status,
            created_at: now,
        })
    }

    pub fn insert_order(&self, payload: &NewOrder) -> AppResult<Order> {
        payload.validate()?;
        let now = Utc::now();

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO orders (quote_id, status, final_amount, close_date, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                payload.quote_id,
                payload.status.as_str(),
                payload.final_amount,
                payload.close_date,
                payload.notes,
                now.to_rfc3339(),
            ],
        )?;
        let order_id = conn.last_insert_rowid();

        Ok(Order {
            order_id,
            quote_id: payload.quote_id,
            status: payload.status,
            final_amount: payload.final_amount,
            close_date: payload.close_date,
            notes: payload.notes.clone(),
            created_at: now,
        })
    }

    pub fn get_lead(&self, lead_id: i64) -> AppResult<Option<Lead>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT lead_id, name, email, phone, source, status, location, industry, company_size, created_at
             FROM leads WHERE lead_id = ?1",
            [lead_id],
            parse_lead_row,
        )
        .optional()
        .map_err(AppError::from)
    }

    pub fn list_leads(&self) -> AppResult<Vec<Lead>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT lead_id, name, email, phone, source, status, location, industry, company_size, created_at
             FROM leads ORDER BY lead_id ASC",
        )?;
        let rows = stmt.query_map([], parse_lead_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(AppError::from)
    }

    pub fn list_opportunities(&self) -> AppResult<Vec<Opportunity>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT opp_id, lead_id, title, estimated_value, stage, probability, expected_close, created_at
             FROM opportunities ORDER BY opp_id ASC",
        )?;
        let rows = stmt.query_map([], parse_opportunity_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(AppError::from)
    }

    pub fn list_quotes(&self) -> AppResult<Vec<Quote>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT quote_id, opp_id, quote_number, quoted_amount, valid_until, payment_terms, status, created_at
             FROM quotes ORDER BY quote_id ASC",
        )?;
        let rows = stmt.query_map([], parse_quote_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(AppError::from)
    }

    pub fn list_orders(&self) -> AppResult<Vec<Order>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT order_id, quote_id, status, final_amount, close_date, notes, created_at
             FROM orders ORDER BY order_id ASC",
        )?;
        let rows = stmt.query_map([], parse_order_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(AppError::from)
    }

    pub fn count_leads(&self) -> AppResult<i64> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM leads", [], |row| row.get(0))
            .map_err(AppError::from)
    }

    pub fn count_opportunities(&self) -> AppResult<i64> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM opportunities", [], |row| row.get(0))
            .map_err(AppError::from)
    }

    pub fn count_quotes(&self) -> AppResult<i64> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM quotes", [], |row| row.get(0))
            .map_err(AppError::from)
    }

    pub fn count_orders(&self) -> AppResult<i64> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))
            .map_err(AppError::from)
    }

    pub fn count_won_orders(&self) -> AppResult<i64> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM orders WHERE status = 'won'", [], |row| row.get(0))
            .map_err(AppError::from)
    }

    pub fn sum_opportunity_values(&self) -> AppResult<f64> {
        let conn = self.lock()?;
        let sum: Option<f64> =
            conn.query_row("SELECT SUM(estimated_value) FROM opportunities", [], |row| row.get(0))?;
        Ok(sum.unwrap_or(0.0))
    }

    pub fn sum_quote_amounts(&self) -> AppResult<f64> {
        let conn = self.lock()?;
        let sum: Option<f64> = conn.query_row("SELECT SUM(quoted_amount) FROM quotes", [], |row| row.get(0))?;
        Ok(sum.unwrap_or(0.0))
    }

    pub fn sum_won_order_amounts(&self) -> AppResult<f64> {
        let conn = self.lock()?;
        let sum: Option<f64> = conn.query_row(
            "SELECT SUM(final_amount) FROM orders WHERE status = 'won'",
            [],
            |row| row.get(0),
        )?;
        Ok(sum.unwrap_or(0.0))
    }

    pub fn sum_order_amounts(&self) -> AppResult<f64> {
        let conn = self.lock()?;
        let sum: Option<f64> = conn.query_row("SELECT SUM(final_amount) FROM orders", [], |row| row.get(0))?;
        Ok(sum.unwrap_or(0.0))
    }

    /// Distinct non-null industries in first-encountered scan order.
    pub fn distinct_industries(&self) -> AppResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT DISTINCT industry FROM leads WHERE industry IS NOT NULL")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(AppError::from)
    }

    /// Distinct non-null locations in first-encountered scan order.
    pub fn distinct_locations(&self) -> AppResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT DISTINCT location FROM leads WHERE location IS NOT NULL")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(AppError::from)
    }

    pub fn count_leads_by_industry(&self, industry: &str) -> AppResult<i64> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM leads WHERE industry = ?1", [industry], |row| {
            row.get(0)
        })
        .map_err(AppError::from)
    }

    pub fn count_leads_by_location(&self, location: &str) -> AppResult<i64> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM leads WHERE location = ?1", [location], |row| {
            row.get(0)
        })
        .map_err(AppError::from)
    }

    /// Won orders reached through the full Order->Quote->Opportunity->Lead
    /// chain for leads of the given industry. A lead with several
    /// opportunities contributes one row per won descendant.
    pub fn count_won_orders_by_industry(&self, industry: &str) -> AppResult<i64> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT COUNT(*)
             FROM orders o
             JOIN quotes q ON o.quote_id = q.quote_id
             JOIN opportunities opp ON q.opp_id = opp.opp_id
             JOIN leads l ON opp.lead_id = l.lead_id
             WHERE l.industry = ?1 AND o.status = 'won'",
            [industry],
            |row| row.get(0),
        )
        .map_err(AppError::from)
    }

    pub fn count_won_orders_by_location(&self, location: &str) -> AppResult<i64> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT COUNT(*)
             FROM orders o
             JOIN quotes q ON o.quote_id = q.quote_id
             JOIN opportunities opp ON q.opp_id = opp.opp_id
             JOIN leads l ON opp.lead_id = l.lead_id
             WHERE l.location = ?1 AND o.status = 'won'",
            [location],
            |row| row.get(0),
        )
        .map_err(AppError::from)
    }

    pub fn avg_won_amount_by_industry(&self, industry: &str) -> AppResult<f64> {
        let conn = self.lock()?;
        let avg: Option<f64> = conn.query_row(
            "SELECT AVG(o.final_amount)
             FROM orders o
             JOIN quotes q ON o.quote_id = q.quote_id
             JOIN opportunities opp ON q.opp_id = opp.opp_id
             JOIN leads l ON opp.lead_id = l.lead_id
             WHERE l.industry = ?1 AND o.status = 'won'",
            [industry],
            |row| row.get(0),
        )?;
        Ok(avg.unwrap_or(0.0))
    }

    /// Summed estimated value of every opportunity belonging to leads of the
    /// given location, regardless of funnel progress.
    pub fn sum_pipeline_by_location(&self, location: &str) -> AppResult<f64> {
        let conn = self.lock()?;
        let sum: Option<f64> = conn.query_row(
            "SELECT SUM(opp.estimated_value)
             FROM opportunities opp
             JOIN leads l ON opp.lead_id = l.lead_id
             WHERE l.location = ?1",
            [location],
            |row| row.get(0),
        )?;
        Ok(sum.unwrap_or(0.0))
    }
}

fn parse_lead_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Lead> {
    Ok(Lead {
        lead_id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        source: row.get(4)?,
        status: row.get(5)?,
        location: row.get(6)?,
        industry: row.get(7)?,
        company_size: row
            .get::<_, Option<String>>(8)?
            .map(|raw| parse_enum_text(&raw, CompanySize::parse))
            .transpose()?,
        created_at: parse_time(&row.get::<_, String>(9)?)?,
    })
}

fn parse_opportunity_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Opportunity> {
    Ok(Opportunity {
        opp_id: row.get(0)?,
        lead_id: row.get(1)?,
        title: row.get(2)?,
        estimated_value: row.get(3)?,
        stage: parse_enum_text(&row.get::<_, String>(4)?, OpportunityStage::parse)?,
        probability: row.get(5)?,
        expected_close: row.get::<_, Option<NaiveDate>>(6)?,
        created_at: parse_time(&row.get::<_, String>(7)?)?,
    })
}

fn parse_quote_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Quote> {
    Ok(Quote {
        quote_id: row.get(0)?,
        opp_id: row.get(1)?,
        quote_number: row.get(2)?,
        quoted_amount: row.get(3)?,
        valid_until: row.get::<_, Option<NaiveDate>>(4)?,
        payment_terms: row.get(5)?,
        status: parse_enum_text(&row.get::<_, String>(6)?, QuoteStatus::parse)?,
        created_at: parse_time(&row.get::<_, String>(7)?)?,
    })
}

fn parse_order_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        order_id: row.get(0)?,
        quote_id: row.get(1)?,
        status: parse_enum_text(&row.get::<_, String>(2)?, OrderStatus::parse)?,
        final_amount: row.get(3)?,
        close_date: row.get::<_, Option<NaiveDate>>(4)?,
        notes: row.get(5)?,
        created_at: parse_time(&row.get::<_, String>(6)?)?,
    })
}

fn parse_enum_text<T>(raw: &str, parse: fn(&str) -> AppResult<T>) -> rusqlite::Result<T> {
    parse(raw).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, error.to_string())),
        )
    })
}

fn parse_time(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, error.to_string())),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::Database;
    use crate::errors::AppError;
    use crate::models::{
        CompanySize, NewLead, NewOpportunity, NewOrder, NewQuote, OpportunityStage, OrderStatus, QuoteStatus,
    };

    fn lead_payload(name: &str) -> NewLead {
        NewLead {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: Some("555-0001".to_string()),
            source: "web".to_string(),
            location: Some("Germany".to_string()),
            industry: Some("automotive".to_string()),
            company_size: Some(CompanySize::Large),
        }
    }

    #[test]
    fn lead_round_trips_through_storage() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(&dir.path().join("test.db")).expect("db");

        let inserted = db.insert_lead(&lead_payload("AutoCorp")).expect("insert lead");
        assert_eq!(inserted.lead_id, 1);
        assert_eq!(inserted.status, "new");

        let loaded = db.get_lead(inserted.lead_id).expect("get lead").expect("lead exists");
        assert_eq!(loaded.name, "AutoCorp");
        assert_eq!(loaded.industry.as_deref(), Some("automotive"));
        assert_eq!(loaded.company_size, Some(CompanySize::Large));

        let all = db.list_leads().expect("list leads");
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn chain_inserts_preserve_references() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(&dir.path().join("test.db")).expect("db");

        let lead = db.insert_lead(&lead_payload("AutoCorp")).expect("lead");
        let opp = db
            .insert_opportunity(&NewOpportunity {
                lead_id: lead.lead_id,
                title: "Robot Cell".to_string(),
                estimated_value: 150_000.0,
                stage: OpportunityStage::Negotiation,
                probability: 80,
                expected_close: None,
            })
            .expect("opportunity");
        let quote = db
            .insert_quote(&NewQuote {
                opp_id: opp.opp_id,
                quote_number: "Q-2024-001".to_string(),
                quoted_amount: 145_000.0,
                valid_until: None,
                payment_terms: Some("Net 30".to_string()),
                status: QuoteStatus::Sent,
            })
            .expect("quote");
        let order = db
            .insert_order(&NewOrder {
                quote_id: quote.quote_id,
                status: OrderStatus::Won,
                final_amount: 142_000.0,
                close_date: None,
                notes: None,
            })
            .expect("order");

        let orders = db.list_orders().expect("list orders");
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id, order.order_id);
        assert_eq!(orders[0].quote_id, quote.quote_id);
        assert_eq!(orders[0].status, OrderStatus::Won);

        let quotes = db.list_quotes().expect("list quotes");
        assert_eq!(quotes[0].opp_id, opp.opp_id);
        assert_eq!(quotes[0].status, QuoteStatus::Sent);
    }

    #[test]
    fn orphan_child_is_rejected_by_foreign_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(&dir.path().join("test.db")).expect("db");

        let result = db.insert_opportunity(&NewOpportunity {
            lead_id: 999,
            title: "Ghost".to_string(),
            estimated_value: 1_000.0,
            stage: OpportunityStage::InitialInquiry,
            probability: 10,
            expected_close: None,
        });
        assert!(matches!(result, Err(AppError::Storage(_))));
    }

    #[test]
    fn validation_failures_do_not_touch_storage() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(&dir.path().join("test.db")).expect("db");
        let lead = db.insert_lead(&lead_payload("AutoCorp")).expect("lead");

        let result = db.insert_opportunity(&NewOpportunity {
            lead_id: lead.lead_id,
            title: "Bad".to_string(),
            estimated_value: 1_000.0,
            stage: OpportunityStage::Qualification,
            probability: 250,
            expected_close: None,
        });
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(db.count_opportunities().expect("count"), 0);
    }

    #[test]
    fn aggregate_sums_read_empty_collections_as_zero() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(&dir.path().join("test.db")).expect("db");

        assert_eq!(db.sum_opportunity_values().expect("opps"), 0.0);
        assert_eq!(db.sum_quote_amounts().expect("quotes"), 0.0);
        assert_eq!(db.sum_won_order_amounts().expect("won"), 0.0);
        assert_eq!(db.sum_order_amounts().expect("orders"), 0.0);
        assert_eq!(db.avg_won_amount_by_industry("automotive").expect("avg"), 0.0);
        assert_eq!(db.sum_pipeline_by_location("Germany").expect("pipeline"), 0.0);
    }
}
