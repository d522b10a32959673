//! # Text Preview
//!
//! Renders a [`DocumentLayout`] as plain text, one block per printed page,
//! for `docket show`. Layout decisions (what goes on which page, footers,
//! totals) all come from docket-core; this module only formats.

use docket_core::layout::{PageBody, PrintedPage, Summary};
use docket_core::pagination::GroupEntry;
use docket_core::{DocumentLayout, DocumentRecord, LineItem, Money};

use crate::config::OrganizationConfig;

const WIDTH: usize = 78;

/// Full preview of a laid-out record.
pub fn render_text(layout: &DocumentLayout, record: &DocumentRecord, org: &OrganizationConfig) -> String {
    let mut out: Vec<String> = Vec::new();
    for page in &layout.pages {
        render_page(&mut out, page, layout, record, org);
    }
    out.join("\n")
}

fn render_page(
    out: &mut Vec<String>,
    page: &PrintedPage,
    layout: &DocumentLayout,
    record: &DocumentRecord,
    org: &OrganizationConfig,
) {
    out.push("=".repeat(WIDTH));
    if page.number == 1 {
        render_letterhead(out, layout, record, org);
    }

    match &page.body {
        PageBody::Items {
            first_serial,
            rows,
            summary,
        } => {
            if rows.is_continuation {
                out.push("(continued)".to_string());
            }
            render_items(out, *first_serial, &rows.content);
            if let Some(summary) = summary {
                render_summary(out, summary, record);
            }
        }
        PageBody::BankDetails => render_bank(out, org),
        PageBody::Terms(terms) => {
            out.push(heading("TERMS & CONDITIONS", terms.is_continuation));
            render_groups(out, &terms.content);
        }
        PageBody::Technicals(technicals) => {
            out.push(heading("TECHNICAL SPECIFICATIONS", technicals.is_continuation));
            render_groups(out, &technicals.content);
        }
    }

    out.push("-".repeat(WIDTH));
    out.push(format!("{:>width$}", page.footer, width = WIDTH));
    out.push(String::new());
}

fn heading(title: &str, continued: bool) -> String {
    if continued {
        format!("{} (continued)", title)
    } else {
        title.to_string()
    }
}

fn render_letterhead(
    out: &mut Vec<String>,
    layout: &DocumentLayout,
    record: &DocumentRecord,
    org: &OrganizationConfig,
) {
    out.push(org.name.clone());
    out.extend(org.address.iter().cloned());
    if let Some(gstin) = &org.gstin {
        out.push(format!("GSTIN: {}", gstin));
    }
    out.push(String::new());

    let details = &record.content.quote_details;
    out.push(layout.document_type.label().to_uppercase());
    out.push(format!(
        "No: {}",
        layout.document_number.as_deref().unwrap_or("(assigned on save)")
    ));
    if let Some(date) = details.document_date {
        out.push(format!("Date: {}", date.format("%d-%m-%Y")));
    }
    out.push(String::new());
    out.push(format!("To: {}", details.client_name));
    out.extend(details.client_address.iter().map(|line| format!("    {}", line)));
    if let Some(attention) = &details.kind_attention {
        out.push(format!("Kind Attn: {}", attention));
    }
    if let Some(subject) = &details.subject {
        out.push(format!("Subject: {}", subject));
    }
    if let Some(reference) = &details.reference {
        out.push(format!("Ref: {}", reference));
    }
    out.push(String::new());
}

fn render_items(out: &mut Vec<String>, first_serial: usize, rows: &[LineItem]) {
    out.push(format!(
        "{:>4}  {:<34} {:>8} {:<5} {:>10} {:>11}",
        "S.No", "Description", "Qty", "Unit", "Rate", "Amount"
    ));
    for (offset, item) in rows.iter().enumerate() {
        out.push(format!(
            "{:>4}  {:<34} {:>8} {:<5} {:>10} {:>11}",
            first_serial + offset,
            truncate(&item.description, 34),
            item.quantity.normalize().to_string(),
            truncate(&item.unit, 5),
            item.unit_price.to_string(),
            item.line_total.to_string(),
        ));
    }
}

fn render_summary(out: &mut Vec<String>, summary: &Summary, record: &DocumentRecord) {
    let totals = &summary.totals;
    out.push(String::new());
    out.push(amount_line("Subtotal", totals.subtotal));
    if !record.content.discount.is_zero() {
        out.push(amount_line(
            &format!("Discount ({}%)", record.content.discount.percentage()),
            totals.discount_amount,
        ));
        out.push(amount_line("Taxable amount", totals.taxable_base));
    }
    out.push(amount_line("CGST", totals.cgst));
    out.push(amount_line("SGST", totals.sgst));
    out.push(amount_line("Grand total", totals.grand_total));
    if let Some(balance) = summary.balance_due {
        out.push(amount_line("Balance due", balance));
    }
    out.push(format!("Amount in words: {}", summary.amount_in_words));
}

fn amount_line(label: &str, amount: Money) -> String {
    format!("{:>60} {:>17}", label, amount.to_string())
}

fn render_bank(out: &mut Vec<String>, org: &OrganizationConfig) {
    let bank = &org.bank;
    out.push("BANK DETAILS".to_string());
    out.push(format!("Account name:   {}", bank.account_name));
    out.push(format!("Account number: {}", bank.account_number));
    out.push(format!("Bank:           {}", bank.bank_name));
    out.push(format!("Branch:         {}", bank.branch));
    out.push(format!("IFSC:           {}", bank.ifsc));
}

fn render_groups(out: &mut Vec<String>, entries: &[GroupEntry]) {
    for entry in entries {
        match entry {
            GroupEntry::Header { group } => out.push(format!("{}:", group)),
            GroupEntry::Body { text, .. } => out.push(format!("  • {}", text)),
            GroupEntry::Spacer => out.push(String::new()),
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
