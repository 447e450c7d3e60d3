//! # Seed Data Generator
//!
//! Populates the database with development data.
//!
//! ## Usage
//! ```bash
//! # Seed ./rihla_dev.db with 25 pending bookings (default)
//! cargo run -p rihla-db --bin seed
//!
//! # Custom booking count
//! cargo run -p rihla-db --bin seed -- --bookings 100
//!
//! # Specify database path
//! cargo run -p rihla-db --bin seed -- --db ./data/rihla.db
//! ```
//!
//! ## Generated Data
//! - Commission setting: 10%
//! - Coupons: SAVE10 (10%, 100 uses), WELCOME50 (50.00 flat, unbounded),
//!   ONCE (25%, single use), EXPIRED5 (5%, expired yesterday)
//! - Services from a handful of providers (tours, cruises, desert camps)
//! - Pending bookings priced through the real pricing code, ready for
//!   webhook testing

use chrono::{Duration, Utc};
use std::env;
use uuid::Uuid;

use rihla_core::pricing::compute_breakdown;
use rihla_core::{Coupon, DiscountType, Money, Service, REFERENCE_COMMISSION_RATE};
use rihla_db::{Database, DbConfig, NewBooking};

/// Providers and the services they run: (provider id, title, base price in cents)
const CATALOG: &[(&str, &[(&str, i64)])] = &[
    (
        "prov-nile",
        &[
            ("Nile Felucca Sunset Ride", 45_000),
            ("Luxor to Aswan Cruise (3 nights)", 1_250_000),
            ("Karnak Sound and Light Show", 30_000),
        ],
    ),
    (
        "prov-sahara",
        &[
            ("White Desert Overnight Camp", 320_000),
            ("Siwa Oasis Day Trip", 180_000),
            ("Quad Bike Safari", 95_000),
        ],
    ),
    (
        "prov-redsea",
        &[
            ("Giftun Island Snorkeling", 120_000),
            ("Ras Mohammed Dive (2 tanks)", 210_000),
            ("Glass Boat Reef Tour", 60_000),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut bookings: usize = 25;
    let mut db_path = String::from("./rihla_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bookings" | "-b" => {
                if i + 1 < args.len() {
                    bookings = args[i + 1].parse().unwrap_or(25);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Rihla Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -b, --bookings <N>  Pending bookings to generate (default: 25)");
                println!("  -d, --db <PATH>     Database file path (default: ./rihla_dev.db)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Rihla Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!("Bookings: {}", bookings);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.coupons().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} coupons", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let commission = db.commission().set_rate(REFERENCE_COMMISSION_RATE).await?;
    println!("✓ Commission rate set to {}%", commission.rate.percentage());

    for coupon in coupons() {
        db.coupons().insert(&coupon).await?;
        println!("  + coupon {}", coupon.code);
    }

    let mut services = Vec::new();
    for (provider_id, titles) in CATALOG {
        for (title, base_cents) in titles.iter() {
            let service = Service {
                id: Uuid::new_v4().to_string(),
                provider_id: provider_id.to_string(),
                title: title.to_string(),
            };
            db.services().insert(&service).await?;
            services.push((service, Money::from_cents(*base_cents)));
        }
    }
    println!("✓ Inserted {} services", services.len());

    let save10 = db.coupons().get_by_code("SAVE10").await?;
    let now = Utc::now();

    for n in 0..bookings {
        let (service, base) = &services[n % services.len()];
        // Every third booking uses SAVE10
        let coupon = if n % 3 == 0 { save10.as_ref() } else { None };
        let price = compute_breakdown(*base, coupon, commission.rate, now)?;

        let booking = db
            .bookings()
            .create_pending(&NewBooking {
                user_id: format!("user-{:03}", n % 7),
                service_id: service.id.clone(),
                booking_date: (now + Duration::days(7 + n as i64)).date_naive(),
                check_in: None,
                check_out: None,
                guests_count: 1 + (n % 4) as i64,
                price,
            })
            .await?;

        println!(
            "  + booking rihla-{}  {}  {}",
            booking.id, booking.price.final_price, service.title
        );
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn coupons() -> Vec<Coupon> {
    let now = Utc::now();
    let coupon = |code: &str, discount_type, value, max_usage, expires_at| Coupon {
        code: code.to_string(),
        discount_type,
        value,
        max_usage,
        current_usage: 0,
        expires_at,
        is_active: true,
    };

    vec![
        coupon(
            "SAVE10",
            DiscountType::Percentage,
            1000,
            Some(100),
            Some(now + Duration::days(90)),
        ),
        coupon("WELCOME50", DiscountType::Fixed, 5000, None, None),
        coupon("ONCE", DiscountType::Percentage, 2500, Some(1), None),
        coupon(
            "EXPIRED5",
            DiscountType::Percentage,
            500,
            None,
            Some(now - Duration::days(1)),
        ),
    ]
}
