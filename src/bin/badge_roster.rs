use std::env;

use dotenvy::dotenv;

use conference_desk::database::{self, delegate_repo};
use conference_desk::services::checkin_service;

/// Prints the seeded roster with each delegate's badge QR payload.
/// An optional argument filters by name, email or badge id.
#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let term = env::args().nth(1).unwrap_or_default();

    let pool = match database::open_seeded().await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("badge roster: could not open store: {}", e);
            std::process::exit(1);
        }
    };
    let roster = match delegate_repo::list_roster(&pool).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("badge roster: could not load delegates: {}", e);
            std::process::exit(1);
        }
    };

    let matches = checkin_service::filter_roster(&roster, &term);
    let count = matches.clone().count();
    for d in matches {
        println!(
            "{:<10} {:<24} {:<16} {}",
            d.badge_id,
            d.name,
            d.check_in_status,
            d.qr_payload()
        );
    }
    println!("badge roster: {} of {} delegates", count, roster.len());
}
