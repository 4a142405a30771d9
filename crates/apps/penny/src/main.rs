//! Penny - terminal dashboard for the invoice-extraction service
//!
//! Thin driver over the `invoices` crate: login, sync a label, browse
//! and delete extracted invoices, export CSV.

use anyhow::{Context, Result, bail};
use log::{error, warn};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use invoices::{
    AuthError, Dashboard, ExtractionMode, HttpBackend, InvoiceId, Session, Settings,
    Severity, format_amount, interactive_login,
};

const USAGE: &str = "\
Penny - invoice dashboard

Usage: penny <command> [args]

Commands:
  login [local|openai]   Connect a mail account
  status                 Show the signed-in account
  labels                 List mail labels available to sync
  sync <label-id>        Extract invoices from emails under a label
  list [page]            Show one page of invoices
  summary                Show per-currency spending totals
  delete <invoice-id>    Delete one invoice (asks for confirmation)
  export [path]          Download all invoices as CSV
  mode <local|openai>    Change the extraction mode
  logout                 Sign out and clear the stored credential
";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();

    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    let settings = Settings::load().unwrap_or_else(|e| {
        warn!("Failed to load settings, using defaults: {}", e);
        Settings::default()
    });

    let session = Arc::new(Session::open()?);
    let backend = Arc::new(HttpBackend::new(&settings.api_url, session.clone())?);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("login") => {
            let mode = match args.get(1).map(String::as_str) {
                Some(raw) => ExtractionMode::parse(raw)
                    .with_context(|| format!("Unknown extraction mode: {}", raw))?,
                None => ExtractionMode::Local,
            };
            interactive_login(&session, backend.as_ref(), mode)?;
            let mut dashboard = open_dashboard(backend, session)?;
            print_status(&dashboard);
            flush_notifications(&mut dashboard);
            Ok(())
        }
        Some("status") => {
            let dashboard = open_dashboard(backend, session)?;
            print_status(&dashboard);
            Ok(())
        }
        Some("labels") => {
            let dashboard = open_dashboard(backend, session)?;
            for label in dashboard.labels() {
                println!("{:<24} {}", label.id.as_str(), label.name);
            }
            Ok(())
        }
        Some("sync") => {
            let label = args.get(1).context("Usage: penny sync <label-id>")?;
            let mut dashboard = open_dashboard(backend, session)?;
            dashboard.select_label(Some(label.as_str().into()));
            let result = dashboard.sync();
            flush_notifications(&mut dashboard);
            if let Ok(report) = result {
                for line in &report.errors {
                    println!("  error: {}", line);
                }
            }
            Ok(())
        }
        Some("list") => {
            let mut dashboard = open_dashboard(backend, session)?;
            if let Some(raw) = args.get(1) {
                let page: u32 = raw.parse().context("Page must be a number")?;
                dashboard.set_page(page);
            }
            print_invoices(&dashboard);
            Ok(())
        }
        Some("summary") => {
            let dashboard = open_dashboard(backend, session)?;
            print_summary(&dashboard);
            Ok(())
        }
        Some("delete") => {
            let raw = args.get(1).context("Usage: penny delete <invoice-id>")?;
            let id: i64 = raw.parse().context("Invoice id must be a number")?;
            let mut dashboard = open_dashboard(backend, session)?;
            delete_with_confirmation(&mut dashboard, InvoiceId::new(id))?;
            flush_notifications(&mut dashboard);
            Ok(())
        }
        Some("export") => {
            let path = args
                .get(1)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("invoices.csv"));
            let mut dashboard = open_dashboard(backend, session)?;
            let result = dashboard.export_csv(&path);
            flush_notifications(&mut dashboard);
            result
        }
        Some("mode") => {
            let raw = args.get(1).context("Usage: penny mode <local|openai>")?;
            let mode = ExtractionMode::parse(raw)
                .with_context(|| format!("Unknown extraction mode: {}", raw))?;
            let mut dashboard = open_dashboard(backend, session)?;
            let result = dashboard.set_extraction_mode(mode);
            flush_notifications(&mut dashboard);
            result
        }
        Some("logout") => {
            let mut dashboard = open_dashboard(backend, session)?;
            dashboard.logout();
            println!("Signed out.");
            Ok(())
        }
        _ => {
            print!("{}", USAGE);
            Ok(())
        }
    }
}

/// Authorize and load initial state, or explain how to log in
fn open_dashboard(
    backend: Arc<HttpBackend>,
    session: Arc<Session>,
) -> Result<Dashboard> {
    let mut dashboard = Dashboard::new(backend, session);
    match dashboard.open() {
        Ok(_) => Ok(dashboard),
        Err(AuthError::Missing | AuthError::Invalid) => {
            bail!("Not signed in. Run `penny login` first.")
        }
        Err(AuthError::Backend(e)) => {
            Err(anyhow::Error::from(e)).context("Could not reach the backend")
        }
    }
}

fn print_status(dashboard: &Dashboard) {
    if let Some(user) = dashboard.user() {
        println!("Signed in as {}", user.email);
        println!("Extraction mode: {}", user.extraction_mode);
        println!(
            "Connected since: {}",
            user.created_at.with_timezone(&chrono::Local).format("%Y-%m-%d")
        );
        println!(
            "Invoices on record: {} ({} cached)",
            dashboard.cache().total(),
            dashboard.cache().len()
        );
    }
}

fn print_invoices(dashboard: &Dashboard) {
    let invoices = dashboard.visible_invoices();
    if invoices.is_empty() {
        println!("No invoices on this page.");
        return;
    }

    println!(
        "{:>6}  {:<24} {:<14} {:>14}  {:<10}",
        "id", "vendor", "number", "amount", "date"
    );
    for invoice in invoices {
        let amount = invoice
            .total_amount
            .map(|a| format_amount(a, &invoice.currency))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>6}  {:<24} {:<14} {:>14}  {:<10}",
            invoice.id,
            invoice.vendor_name.as_deref().unwrap_or("-"),
            invoice.invoice_number.as_deref().unwrap_or("-"),
            amount,
            invoice.invoice_date.as_deref().unwrap_or("-"),
        );
    }
    println!("Page {} of {}", dashboard.page(), dashboard.total_pages());
    if dashboard.cache().truncated() {
        warn!(
            "Backend holds {} invoices but only {} are cached locally",
            dashboard.cache().total(),
            dashboard.cache().len()
        );
    }
}

fn print_summary(dashboard: &Dashboard) {
    let summary = dashboard.summary();
    if summary.total_invoices == 0 {
        println!("No spending data yet. Sync your invoices to see the summary.");
        return;
    }

    for row in &summary.totals {
        println!(
            "{:<6} {:>14}  ({} invoices)",
            row.currency,
            format_amount(row.total, &row.currency),
            row.count
        );
    }
    println!(
        "{} invoices, {} currencies, {} with a known vendor",
        summary.total_invoices, summary.distinct_currencies, summary.vendors_known
    );
}

/// Ask before deleting, mirroring the dashboard's confirm dialog
fn delete_with_confirmation(dashboard: &mut Dashboard, id: InvoiceId) -> Result<()> {
    dashboard.request_delete(id)?;

    print!("Delete invoice {}? [y/N] ", id);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;

    if answer.trim().eq_ignore_ascii_case("y") {
        dashboard.confirm_delete()?;
    } else {
        dashboard.cancel_delete();
        println!("Cancelled.");
    }
    Ok(())
}

fn flush_notifications(dashboard: &mut Dashboard) {
    for note in dashboard.notifications().drain() {
        match note.severity {
            Severity::Success => println!("{}", note.message),
            Severity::Info => println!("{}", note.message),
            Severity::Error => eprintln!("error: {}", note.message),
        }
    }
}
