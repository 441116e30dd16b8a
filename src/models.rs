use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanySize {
    Small,
    Medium,
    Large,
}

impl CompanySize {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    pub fn parse(raw: &str) -> AppResult<Self> {
        match raw {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            other => Err(AppError::Validation(format!(
                "unknown company size '{}' (expected small, medium or large)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityStage {
    InitialInquiry,
    Qualification,
    ProposalDevelopment,
    Negotiation,
    OrderConfirmation,
    Delivery,
}

impl OpportunityStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InitialInquiry => "initial_inquiry",
            Self::Qualification => "qualification",
            Self::ProposalDevelopment => "proposal_development",
            Self::Negotiation => "negotiation",
            Self::OrderConfirmation => "order_confirmation",
            Self::Delivery => "delivery",
        }
    }

    pub fn parse(raw: &str) -> AppResult<Self> {
        match raw {
            "initial_inquiry" => Ok(Self::InitialInquiry),
            "qualification" => Ok(Self::Qualification),
            "proposal_development" => Ok(Self::ProposalDevelopment),
            "negotiation" => Ok(Self::Negotiation),
            "order_confirmation" => Ok(Self::OrderConfirmation),
            "delivery" => Ok(Self::Delivery),
            other => Err(AppError::Validation(format!("unknown opportunity stage '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Draft,
    Sent,
    Accepted,
    Rejected,
    Expired,
}

impl QuoteStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
        }
    }

    pub fn parse(raw: &str) -> AppResult<Self> {
        match raw {
            "draft" => Ok(Self::Draft),
            "sent" => Ok(Self::Sent),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "expired" => Ok(Self::Expired),
            other => Err(AppError::Validation(format!("unknown quote status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Won,
    Lost,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Won => "won",
            Self::Lost => "lost",
        }
    }

    pub fn parse(raw: &str) -> AppResult<Self> {
        match raw {
            "won" => Ok(Self::Won),
            "lost" => Ok(Self::Lost),
            other => Err(AppError::Validation(format!(
                "unknown order status '{}' (expected won or lost)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub lead_id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub source: String,
    pub status: String,
    pub location: Option<String>,
    pub industry: Option<String>,
    pub company_size: Option<CompanySize>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLead {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub source: String,
    pub location: Option<String>,
    pub industry: Option<String>,
    pub company_size: Option<CompanySize>,
}

impl NewLead {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("lead name must not be empty".to_string()));
        }
        if self.email.trim().is_empty() {
            return Err(AppError::Validation("lead email must not be empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opportunity {
    pub opp_id: i64,
    pub lead_id: i64,
    pub title: String,
    pub estimated_value: f64,
    pub stage: OpportunityStage,
    pub probability: i64,
    pub expected_close: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOpportunity {
    pub lead_id: i64,
    pub title: String,
    pub estimated_value: f64,
    pub stage: OpportunityStage,
    pub probability: i64,
    pub expected_close: Option<NaiveDate>,
}

impl NewOpportunity {
    pub fn validate(&self) -> AppResult<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("opportunity title must not be empty".to_string()));
        }
        if !(0..=100).contains(&self.probability) {
            return Err(AppError::Validation(format!(
                "opportunity probability must be 0-100, got {}",
                self.probability
            )));
        }
        if self.estimated_value < 0.0 {
            return Err(AppError::Validation("opportunity value must not be negative".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub quote_id: i64,
    pub opp_id: i64,
    pub quote_number: String,
    pub quoted_amount: f64,
    pub valid_until: Option<NaiveDate>,
    pub payment_terms: Option<String>,
    pub status: QuoteStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewQuote {
    pub opp_id: i64,
    pub quote_number: String,
    pub quoted_amount: f64,
    pub valid_until: Option<NaiveDate>,
    pub payment_terms: Option<String>,
    pub status: QuoteStatus,
}

impl NewQuote {
    pub fn validate(&self) -> AppResult<()> {
        if self.quote_number.trim().is_empty() {
            return Err(AppError::Validation("quote number must not be empty".to_string()));
        }
        if self.quoted_amount < 0.0 {
            return Err(AppError::Validation("quoted amount must not be negative".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: i64,
    pub quote_id: i64,
    pub status: OrderStatus,
    pub final_amount: f64,
    pub close_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub quote_id: i64,
    pub status: OrderStatus,
    pub final_amount: f64,
    pub close_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl NewOrder {
    pub fn validate(&self) -> AppResult<()> {
        // A lost order legitimately carries a 0 amount; only negatives are rejected.
        if self.final_amount < 0.0 {
            return Err(AppError::Validation("order amount must not be negative".to_string()));
        }
        Ok(())
    }
}

/// Stage-to-stage funnel counts and percentage ratios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRates {
    pub total_leads: i64,
    pub total_opportunities: i64,
    pub total_quotes: i64,
    pub total_orders: i64,
    pub total_won: i64,
    pub lead_to_opportunity: f64,
    pub opportunity_to_quote: f64,
    pub quote_to_order: f64,
    pub order_win_rate: f64,
    pub overall_conversion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinRateReport {
    pub won_orders: i64,
    pub total_orders: i64,
    pub win_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineValue {
    pub opportunities_value: f64,
    pub quotes_value: f64,
    pub won_value: f64,
    pub total_closed_value: f64,
    pub total_pipeline: f64,
}

/// Per-industry segment. The value metric is the average final amount of
/// won orders reached through the full funnel chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryPerformance {
    pub industry: String,
    pub leads: i64,
    pub won_orders: i64,
    pub win_rate: f64,
    pub avg_deal_value: f64,
}

/// Per-location segment. Unlike the industry report, the value metric is
/// the summed estimated value of every opportunity in that market,
/// whether or not it ever reached an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationPerformance {
    pub location: String,
    pub leads: i64,
    pub won_orders: i64,
    pub win_rate: f64,
    pub pipeline_value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn company_size_round_trips_through_parse() {
        for size in [CompanySize::Small, CompanySize::Medium, CompanySize::Large] {
            assert_eq!(CompanySize::parse(size.as_str()).unwrap(), size);
        }
        assert!(CompanySize::parse("enterprise").is_err());
    }

    #[test]
    fn opportunity_stage_rejects_unknown_values() {
        assert_eq!(
            OpportunityStage::parse("negotiation").unwrap(),
            OpportunityStage::Negotiation
        );
        assert!(OpportunityStage::parse("prospecting").is_err());
    }

    #[test]
    fn order_status_is_won_or_lost_only() {
        assert_eq!(OrderStatus::parse("won").unwrap(), OrderStatus::Won);
        assert_eq!(OrderStatus::parse("lost").unwrap(), OrderStatus::Lost);
        assert!(OrderStatus::parse("pending").is_err());
    }

    #[test]
    fn new_opportunity_validates_probability_range() {
        let mut opp = NewOpportunity {
            lead_id: 1,
            title: "Big Sale".to_string(),
            estimated_value: 10_000.0,
            stage: OpportunityStage::Qualification,
            probability: 50,
            expected_close: None,
        };
        assert!(opp.validate().is_ok());

        opp.probability = 101;
        assert!(opp.validate().is_err());
        opp.probability = -1;
        assert!(opp.validate().is_err());
    }

    #[test]
    fn new_order_allows_zero_amount_for_lost_deals() {
        let order = NewOrder {
            quote_id: 1,
            status: OrderStatus::Lost,
            final_amount: 0.0,
            close_date: None,
            notes: Some("price too high".to_string()),
        };
        assert!(order.validate().is_ok());
    }

    #[test]
    fn new_lead_requires_name_and_email() {
        let lead = NewLead {
            name: "".to_string(),
            email: "test@example.com".to_string(),
            phone: None,
            source: "web".to_string(),
            location: None,
            industry: None,
            company_size: None,
        };
        assert!(lead.validate().is_err());
    }
}
