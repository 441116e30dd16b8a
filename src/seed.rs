use chrono::NaiveDate;
use serde::Serialize;

use crate::db::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{
    CompanySize, NewLead, NewOpportunity, NewOrder, NewQuote, OpportunityStage, OrderStatus, QuoteStatus,
};

#[derive(Debug, Clone, Serialize)]
pub struct SeedSummary {
    pub leads: usize,
    pub opportunities: usize,
    pub quotes: usize,
    pub orders: usize,
}

/// Populates a representative funnel: 8 leads, 5 opportunities, 3 quotes
/// and 3 orders of which 2 are won.
pub fn populate_sample_data(db: &Database) -> AppResult<SeedSummary> {
    let leads_data: [(&str, &str, &str, &str, &str, &str, CompanySize); 8] = [
        ("AutoMech GmbH", "contact@automech.de", "+49-30-12345", "trade_show", "Germany", "automotive", CompanySize::Large),
        ("TechComponents SRL", "info@techcomp.it", "+39-02-98765", "referral", "Italy", "industrial_components", CompanySize::Medium),
        ("BeveragePack SA", "sales@bevpack.fr", "+33-1-55443", "linkedin", "France", "food_beverage", CompanySize::Large),
        ("LogiFlow BV", "contact@logiflow.nl", "+31-20-77889", "website", "Benelux", "logistics", CompanySize::Medium),
        ("Precision Auto DE", "info@precisionauto.de", "+49-89-33221", "cold_call", "Germany", "automotive", CompanySize::Large),
        ("FoodTech Italia", "sales@foodtech.it", "+39-06-44556", "referral", "Italy", "food_beverage", CompanySize::Medium),
        ("AutoAssembly FR", "contact@autoassembly.fr", "+33-4-66778", "website", "France", "automotive", CompanySize::Medium),
        ("Industrial Parts BE", "info@indparts.be", "+32-2-99887", "linkedin", "Benelux", "industrial_components", CompanySize::Small),
    ];

    let mut lead_ids = Vec::with_capacity(leads_data.len());
    for (name, email, phone, source, location, industry, size) in leads_data {
        let lead = db.insert_lead(&NewLead {
            name: name.to_string(),
            email: email.to_string(),
            phone: Some(phone.to_string()),
            source: source.to_string(),
            location: Some(location.to_string()),
            industry: Some(industry.to_string()),
            company_size: Some(size),
        })?;
        tracing::debug!(lead_id = lead.lead_id, name, "seeded lead");
        lead_ids.push(lead.lead_id);
    }

    let opportunities_data: [(usize, &str, f64, OpportunityStage, i64, &str); 5] = [
        (0, "Robotic Welding Cell", 150_000.0, OpportunityStage::Negotiation, 75, "2025-02-28"),
        (1, "CNC Machining Center", 85_000.0, OpportunityStage::ProposalDevelopment, 60, "2025-03-15"),
        (2, "Automated Packaging Line", 200_000.0, OpportunityStage::Qualification, 50, "2025-04-30"),
        (3, "Warehouse Robotics System", 120_000.0, OpportunityStage::InitialInquiry, 30, "2025-05-15"),
        (4, "Assembly Line Robot", 95_000.0, OpportunityStage::Negotiation, 70, "2025-02-15"),
    ];

    let mut opp_ids = Vec::with_capacity(opportunities_data.len());
    for (lead_idx, title, value, stage, probability, close) in opportunities_data {
        let opp = db.insert_opportunity(&NewOpportunity {
            lead_id: lead_ids[lead_idx],
            title: title.to_string(),
            estimated_value: value,
            stage,
            probability,
            expected_close: Some(parse_date(close)?),
        })?;
        opp_ids.push(opp.opp_id);
    }

    let quotes_data: [(usize, &str, f64, &str, &str, QuoteStatus); 3] = [
        (0, "Q-2024-PIPE-001", 145_000.0, "2025-01-31", "50% upfront, 50% on delivery", QuoteStatus::Sent),
        (1, "Q-2024-PIPE-002", 82_000.0, "2025-02-28", "Net 30 days", QuoteStatus::Sent),
        (4, "Q-2024-PIPE-003", 92_000.0, "2025-01-15", "Net 45 days", QuoteStatus::Accepted),
    ];

    let mut quote_ids = Vec::with_capacity(quotes_data.len());
    for (opp_idx, number, amount, valid_until, terms, status) in quotes_data {
        let quote = db.insert_quote(&NewQuote {
            opp_id: opp_ids[opp_idx],
            quote_number: number.to_string(),
            quoted_amount: amount,
            valid_until: Some(parse_date(valid_until)?),
            payment_terms: Some(terms.to_string()),
            status,
        })?;
        quote_ids.push(quote.quote_id);
    }

    let orders_data: [(usize, OrderStatus, f64, &str, &str); 3] = [
        (0, OrderStatus::Won, 142_000.0, "2024-12-20", "Closed with 2% discount. Installation scheduled for March."),
        (1, OrderStatus::Lost, 0.0, "2024-12-21", "Lost to competitor - price too high"),
        (2, OrderStatus::Won, 90_000.0, "2024-12-22", "Customer negotiated 2.2% discount. Delivery in February."),
    ];

    for (quote_idx, status, amount, close_date, notes) in orders_data {
        db.insert_order(&NewOrder {
            quote_id: quote_ids[quote_idx],
            status,
            final_amount: amount,
            close_date: Some(parse_date(close_date)?),
            notes: Some(notes.to_string()),
        })?;
    }

    let summary = SeedSummary {
        leads: lead_ids.len(),
        opportunities: opp_ids.len(),
        quotes: quote_ids.len(),
        orders: 3,
    };
    tracing::info!(
        leads = summary.leads,
        opportunities = summary.opportunities,
        quotes = summary.quotes,
        orders = summary.orders,
        "sample data populated"
    );
    Ok(summary)
}

fn parse_date(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|error| AppError::Internal(format!("bad seed date '{}': {}", raw, error)))
}
