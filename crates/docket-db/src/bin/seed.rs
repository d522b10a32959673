//! # Catalog Seeder
//!
//! Populates `catalog_items` and `clauses` with a small development catalog
//! so the console has something to quote against.
//!
//! ## Usage
//! ```bash
//! # Uses DATABASE_URL
//! cargo run -p docket-db --bin seed
//!
//! # Explicit database
//! cargo run -p docket-db --bin seed -- --db postgres://docket@localhost/docket_dev
//! ```
//!
//! Every row is upserted by id, so running it twice is harmless.

use std::env;

use docket_core::{CatalogItem, ClauseEntry, ClauseKind, ItemKind, Money, ServiceAttributes};
use docket_db::{Database, DbConfig};

/// (id, description, unit, price in rupees, HSN/SAC, term groups, technical groups)
type Entry = (&'static str, &'static str, &'static str, i64, &'static str, &'static [&'static str], &'static [&'static str]);

const SERVICES: &[Entry] = &[
    ("svc-bh-150", "Borehole drilling, 150 mm dia", "m", 1_450, "998341", &["General", "Drilling"], &["Drilling"]),
    ("svc-spt", "Standard penetration test in borehole", "nos", 650, "998341", &["General", "Drilling"], &["Field Testing"]),
    ("svc-udss", "Undisturbed soil sampling", "nos", 900, "998341", &["Drilling"], &["Sampling"]),
    ("svc-plt", "Plate load test", "nos", 18_000, "998341", &["General", "Field Testing"], &["Field Testing"]),
    ("svc-mob", "Mobilisation and demobilisation of rig", "lot", 25_000, "998341", &["General"], &[]),
];

const TESTS: &[Entry] = &[
    ("tst-gsa", "Grain size analysis (sieve)", "nos", 750, "998346", &["Laboratory"], &["Soil Classification"]),
    ("tst-atterberg", "Atterberg limits", "nos", 850, "998346", &["Laboratory"], &["Soil Classification"]),
    ("tst-ucs", "Unconfined compressive strength", "nos", 1_100, "998346", &["Laboratory"], &["Strength"]),
    ("tst-triax-uu", "Triaxial shear test (UU)", "nos", 3_200, "998346", &["Laboratory"], &["Strength"]),
    ("tst-chem", "Chemical analysis of soil and water", "set", 2_400, "998346", &["Laboratory"], &[]),
];

/// (id, group, text)
const TERMS: &[(&str, &str, &str)] = &[
    ("term-gen-1", "General", "Rates are valid for 30 days from the date of this document."),
    ("term-gen-2", "General", "GST will be charged extra as applicable."),
    ("term-gen-3", "General", "Payment within 15 days of submission of invoice."),
    ("term-drl-1", "Drilling", "Water for drilling to be provided by the client free of cost."),
    ("term-drl-2", "Drilling", "Standby charges apply for delays not attributable to us."),
    ("term-lab-1", "Laboratory", "Samples are retained for 30 days after the report is issued."),
    ("term-fld-1", "Field Testing", "Kentledge for load tests to be arranged by the client."),
];

const TECHNICALS: &[(&str, &str, &str)] = &[
    ("tech-drl-1", "Drilling", "Drilling by rotary method with bentonite slurry as required."),
    ("tech-drl-2", "Drilling", "Termination depth as per site conditions or refusal."),
    ("tech-fld-1", "Field Testing", "SPT as per IS 2131 at 1.5 m intervals."),
    ("tech-smp-1", "Sampling", "Undisturbed samples in thin-walled tubes, sealed with wax."),
    ("tech-cls-1", "Soil Classification", "Classification as per IS 1498."),
    ("tech-str-1", "Strength", "Specimens prepared at field density and moisture."),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let mut database_url = env::var("DATABASE_URL").ok();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    database_url = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Docket Catalog Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <URL>     Postgres URL (default: $DATABASE_URL)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let Some(database_url) = database_url else {
        eprintln!("No database given: pass --db or set DATABASE_URL");
        std::process::exit(2);
    };

    println!("Docket Catalog Seeder");
    println!("=====================");

    let db = Database::new(DbConfig::new(database_url)).await?;
    let catalog = db.catalog();
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let mut items = 0;
    for (kind, entries) in [(ItemKind::Service, SERVICES), (ItemKind::Test, TESTS)] {
        for entry in entries {
            let item = catalog_item(kind, entry);
            if let Err(e) = catalog.upsert_item(&item).await {
                eprintln!("Failed to upsert {}: {}", item.id, e);
                continue;
            }
            items += 1;
        }
    }
    println!("✓ {} catalog items", items);

    let mut clauses = 0;
    for (kind, entries) in [(ClauseKind::Term, TERMS), (ClauseKind::Technical, TECHNICALS)] {
        for (order, (id, group, text)) in entries.iter().enumerate() {
            let clause = ClauseEntry {
                id: id.to_string(),
                group_type: group.to_string(),
                text: text.to_string(),
                sort_order: (order as i32 + 1) * 10,
            };
            if let Err(e) = catalog.upsert_clause(kind, &clause).await {
                eprintln!("Failed to upsert {}: {}", clause.id, e);
                continue;
            }
            clauses += 1;
        }
    }
    println!("✓ {} clauses", clauses);

    db.close().await;
    println!();
    println!("✓ Seed complete!");
    Ok(())
}

fn catalog_item(kind: ItemKind, entry: &Entry) -> CatalogItem {
    let (id, description, unit, rupees, hsn, terms, technicals) = *entry;

    let service_attributes = (kind == ItemKind::Service).then(|| ServiceAttributes {
        sampling_method: id.contains("udss").then(|| "Thin-walled tube".to_string()),
        borehole_count: None,
        measure_unit: Some(unit.to_string()),
    });

    CatalogItem {
        id: id.to_string(),
        kind,
        description: description.to_string(),
        unit: unit.to_string(),
        price: Money::from_rupees(rupees),
        hsn_code: hsn.to_string(),
        term_groups: terms.iter().map(|s| s.to_string()).collect(),
        technical_groups: technicals.iter().map(|s| s.to_string()).collect(),
        service_attributes,
    }
}
