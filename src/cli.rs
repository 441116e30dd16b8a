use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::analytics::FunnelAnalytics;
use crate::csv_io;
use crate::db::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{
    CompanySize, NewLead, NewOpportunity, NewOrder, NewQuote, OpportunityStage, OrderStatus, QuoteStatus,
};
use crate::seed;

#[derive(Debug, Parser)]
#[command(name = "salespipe", version, about = "Sales funnel tracker and analytics")]
pub struct Cli {
    /// Path to the SQLite database file.
    #[arg(long, global = true, env = "SALESPIPE_DB", default_value = "sales_pipeline.db")]
    pub db: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a new lead
    AddLead(AddLeadArgs),
    /// Add an opportunity for an existing lead
    AddOpportunity(AddOpportunityArgs),
    /// Add a quote for an existing opportunity
    AddQuote(AddQuoteArgs),
    /// Record a won or lost order for an existing quote
    AddOrder(AddOrderArgs),
    /// List all leads
    ListLeads,
    /// List all opportunities
    ListOpportunities,
    /// List all quotes
    ListQuotes,
    /// List all orders
    ListOrders,
    /// Funnel analytics reports
    Report(ReportArgs),
    /// Export leads to a CSV file
    Export {
        #[arg(long, default_value = "leads_export.csv")]
        output: PathBuf,
    },
    /// Import leads from a CSV file
    Import {
        #[arg(long)]
        input: PathBuf,
    },
    /// Populate the database with sample funnel data
    Seed,
}

#[derive(Debug, Args)]
pub struct AddLeadArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long, default_value = "manual")]
    pub source: String,
    /// Operating market, e.g. "Germany"
    #[arg(long)]
    pub location: Option<String>,
    /// Industry category, e.g. "automotive"
    #[arg(long)]
    pub industry: Option<String>,
    /// small, medium or large
    #[arg(long)]
    pub company_size: Option<String>,
}

#[derive(Debug, Args)]
pub struct AddOpportunityArgs {
    #[arg(long)]
    pub lead_id: i64,
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub value: f64,
    #[arg(long, default_value = "initial_inquiry")]
    pub stage: String,
    #[arg(long, default_value_t = 0)]
    pub probability: i64,
    /// Expected close date (YYYY-MM-DD)
    #[arg(long)]
    pub expected_close: Option<String>,
}

#[derive(Debug, Args)]
pub struct AddQuoteArgs {
    #[arg(long)]
    pub opp_id: i64,
    #[arg(long)]
    pub number: String,
    #[arg(long)]
    pub amount: f64,
    /// Validity date (YYYY-MM-DD)
    #[arg(long)]
    pub valid_until: Option<String>,
    #[arg(long)]
    pub terms: Option<String>,
    #[arg(long, default_value = "draft")]
    pub status: String,
}

#[derive(Debug, Args)]
pub struct AddOrderArgs {
    #[arg(long)]
    pub quote_id: i64,
    /// won or lost
    #[arg(long)]
    pub status: String,
    #[arg(long)]
    pub amount: f64,
    /// Close date (YYYY-MM-DD)
    #[arg(long)]
    pub close_date: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Emit the report as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub kind: ReportKind,
}

#[derive(Debug, Subcommand)]
pub enum ReportKind {
    /// Stage-to-stage conversion rates
    Conversion,
    /// Won orders versus total orders
    WinRate,
    /// Summed value per funnel stage
    Pipeline,
    /// Performance segmented by lead industry
    Industry,
    /// Performance segmented by lead location
    Location,
}

pub fn run(cli: Cli) -> AppResult<()> {
    let db = Arc::new(Database::new(&cli.db)?);

    match cli.command {
        Command::AddLead(args) => {
            let lead = db.insert_lead(&NewLead {
                name: args.name,
                email: args.email,
                phone: args.phone,
                source: args.source,
                location: args.location,
                industry: args.industry,
                company_size: args.company_size.as_deref().map(CompanySize::parse).transpose()?,
            })?;
            println!("Lead added with ID {}", lead.lead_id);
        }
        Command::AddOpportunity(args) => {
            if db.get_lead(args.lead_id)?.is_none() {
                return Err(AppError::NotFound(format!("lead {} does not exist", args.lead_id)));
            }
            let opp = db.insert_opportunity(&NewOpportunity {
                lead_id: args.lead_id,
                title: args.title,
                estimated_value: args.value,
                stage: OpportunityStage::parse(&args.stage)?,
                probability: args.probability,
                expected_close: args.expected_close.as_deref().map(parse_date).transpose()?,
            })?;
            println!("Opportunity added with ID {}", opp.opp_id);
        }
        Command::AddQuote(args) => {
            let quote = db.insert_quote(&NewQuote {
                opp_id: args.opp_id,
                quote_number: args.number,
                quoted_amount: args.amount,
                valid_until: args.valid_until.as_deref().map(parse_date).transpose()?,
                payment_terms: args.terms,
                status: QuoteStatus::parse(&args.status)?,
            })?;
            println!("Quote added with ID {}", quote.quote_id);
        }
        Command::AddOrder(args) => {
            let order = db.insert_order(&NewOrder {
                quote_id: args.quote_id,
                status: OrderStatus::parse(&args.status)?,
                final_amount: args.amount,
                close_date: args.close_date.as_deref().map(parse_date).transpose()?,
                notes: args.notes,
            })?;
            println!("Order added with ID {}", order.order_id);
        }
        Command::ListLeads => {
            let leads = db.list_leads()?;
            if leads.is_empty() {
                println!("No leads found.");
                return Ok(());
            }
            println!("{:<5} {:<24} {:<30} {:<10} {:<20} {:<14}", "ID", "Name", "Email", "Status", "Industry", "Location");
            for lead in &leads {
                println!(
                    "{:<5} {:<24} {:<30} {:<10} {:<20} {:<14}",
                    lead.lead_id,
                    lead.name,
                    lead.email,
                    lead.status,
                    lead.industry.as_deref().unwrap_or("-"),
                    lead.location.as_deref().unwrap_or("-"),
                );
            }
            println!("\nTotal: {} leads", leads.len());
        }
        Command::ListOpportunities => {
            let opportunities = db.list_opportunities()?;
            if opportunities.is_empty() {
                println!("No opportunities found.");
                return Ok(());
            }
            println!("{:<5} {:<8} {:<30} {:>12} {:<22} {:>5}", "ID", "Lead", "Title", "Value", "Stage", "Prob");
            for opp in &opportunities {
                println!(
                    "{:<5} {:<8} {:<30} {:>12.2} {:<22} {:>4}%",
                    opp.opp_id, opp.lead_id, opp.title, opp.estimated_value, opp.stage.as_str(), opp.probability,
                );
            }
            println!("\nTotal: {} opportunities", opportunities.len());
        }
        Command::ListQuotes => {
            let quotes = db.list_quotes()?;
            if quotes.is_empty() {
                println!("No quotes found.");
                return Ok(());
            }
            println!("{:<5} {:<8} {:<20} {:>12} {:<10}", "ID", "Opp", "Number", "Amount", "Status");
            for quote in &quotes {
                println!(
                    "{:<5} {:<8} {:<20} {:>12.2} {:<10}",
                    quote.quote_id, quote.opp_id, quote.quote_number, quote.quoted_amount, quote.status.as_str(),
                );
            }
            println!("\nTotal: {} quotes", quotes.len());
        }
        Command::ListOrders => {
            let orders = db.list_orders()?;
            if orders.is_empty() {
                println!("No orders found.");
                return Ok(());
            }
            println!("{:<5} {:<8} {:<8} {:>12} {:<12}", "ID", "Quote", "Status", "Amount", "Closed");
            for order in &orders {
                println!(
                    "{:<5} {:<8} {:<8} {:>12.2} {:<12}",
                    order.order_id,
                    order.quote_id,
                    order.status.as_str(),
                    order.final_amount,
                    order.close_date.map(|date| date.to_string()).unwrap_or_else(|| "-".to_string()),
                );
            }
            println!("\nTotal: {} orders", orders.len());
        }
        Command::Report(args) => {
            run_report(&FunnelAnalytics::new(db), &args)?;
        }
        Command::Export { output } => {
            let count = csv_io::export_leads(&db, &output)?;
            println!("Exported {} leads to {}", count, output.display());
        }
        Command::Import { input } => {
            let count = csv_io::import_leads(&db, &input)?;
            println!("Imported {} leads from {}", count, input.display());
        }
        Command::Seed => {
            let summary = seed::populate_sample_data(&db)?;
            println!(
                "Seeded {} leads, {} opportunities, {} quotes, {} orders",
                summary.leads, summary.opportunities, summary.quotes, summary.orders
            );
        }
    }
    Ok(())
}

fn run_report(analytics: &FunnelAnalytics, args: &ReportArgs) -> AppResult<()> {
    match args.kind {
        ReportKind::Conversion => {
            let rates = analytics.conversion_rates()?;
            if args.json {
                return print_json(&rates);
            }
            println!("Funnel counts");
            println!("  leads          {:>8}", rates.total_leads);
            println!("  opportunities  {:>8}", rates.total_opportunities);
            println!("  quotes         {:>8}", rates.total_quotes);
            println!("  orders         {:>8}", rates.total_orders);
            println!("  won            {:>8}", rates.total_won);
            println!("Conversion rates");
            println!("  lead -> opportunity  {:>7.2}%", rates.lead_to_opportunity);
            println!("  opportunity -> quote {:>7.2}%", rates.opportunity_to_quote);
            println!("  quote -> order       {:>7.2}%", rates.quote_to_order);
            println!("  order win rate       {:>7.2}%", rates.order_win_rate);
            println!("  overall (lead->won)  {:>7.2}%", rates.overall_conversion);
        }
        ReportKind::WinRate => {
            let report = analytics.win_rate()?;
            if args.json {
                return print_json(&report);
            }
            println!(
                "Won {} of {} orders ({:.2}%)",
                report.won_orders, report.total_orders, report.win_rate
            );
        }
        ReportKind::Pipeline => {
            let value = analytics.pipeline_value()?;
            if args.json {
                return print_json(&value);
            }
            println!("Pipeline value");
            println!("  opportunities  {:>14.2}", value.opportunities_value);
            println!("  quotes         {:>14.2}", value.quotes_value);
            println!("  won orders     {:>14.2}", value.won_value);
            println!("  closed orders  {:>14.2}", value.total_closed_value);
            println!("  total pipeline {:>14.2}", value.total_pipeline);
        }
        ReportKind::Industry => {
            let segments = analytics.performance_by_industry()?;
            if args.json {
                return print_json(&segments);
            }
            if segments.is_empty() {
                println!("No industries recorded.");
                return Ok(());
            }
            println!("{:<24} {:>6} {:>6} {:>9} {:>14}", "Industry", "Leads", "Won", "Win %", "Avg deal");
            for segment in &segments {
                println!(
                    "{:<24} {:>6} {:>6} {:>8.2}% {:>14.2}",
                    segment.industry, segment.leads, segment.won_orders, segment.win_rate, segment.avg_deal_value,
                );
            }
        }
        ReportKind::Location => {
            let segments = analytics.performance_by_location()?;
            if args.json {
                return print_json(&segments);
            }
            if segments.is_empty() {
                println!("No locations recorded.");
                return Ok(());
            }
            println!("{:<24} {:>6} {:>6} {:>9} {:>14}", "Location", "Leads", "Won", "Win %", "Pipeline");
            for segment in &segments {
                println!(
                    "{:<24} {:>6} {:>6} {:>8.2}% {:>14.2}",
                    segment.location, segment.leads, segment.won_orders, segment.win_rate, segment.pipeline_value,
                );
            }
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_date(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|error| AppError::Validation(format!("bad date '{}' (expected YYYY-MM-DD): {}", raw, error)))
}
