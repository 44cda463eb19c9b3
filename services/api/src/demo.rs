use crate::infra::LogNotifier;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use clap::Args;
use detailing_market::config::MarketConfig;
use detailing_market::error::AppError;
use detailing_market::marketplace::{
    ActorContext, CarDetails, InMemoryMarketStore, ManualClock, MarketplaceService, NewAccount,
    NewGig, NewOrder, NewPromo, NewPurchase, NewReview, NewVacancy, Plan, Profile, Role,
};
use std::sync::Arc;

type DemoService = MarketplaceService<InMemoryMarketStore, LogNotifier>;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Day the demo market opens (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) start: Option<NaiveDate>,
    /// Print every dashboard as JSON at the end of the walkthrough.
    #[arg(long)]
    pub(crate) dashboards: bool,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

fn opening(start: Option<NaiveDate>) -> DateTime<Utc> {
    start
        .and_then(|day| day.and_hms_opt(9, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or_else(Utc::now)
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let opened = opening(args.start);
    let clock = Arc::new(ManualClock::new(opened));
    let notifier = Arc::new(LogNotifier::default());
    let market = MarketplaceService::with_clock(
        Arc::new(InMemoryMarketStore::default()),
        notifier.clone(),
        MarketConfig::default(),
        clock.clone(),
    );

    println!("Detailing marketplace demo (opens {})", opened.format("%Y-%m-%d %H:%M UTC"));

    let studio = enroll_account(&market, Role::Employer, Plan::Free, "Gloss Studio")?;
    let detailer = enroll_account(&market, Role::Specialist, Plan::Free, "Ivan Petrov")?;
    let driver = enroll_account(&market, Role::Client, Plan::Free, "Olga Smirnova")?;
    let supplier = enroll_account(&market, Role::Supplier, Plan::Free, "Chem Supply")?;

    println!("\nVacancies (free plan allows 3 open)");
    let mut first_vacancy = None;
    for title in ["Detailer", "Polisher", "Wrap installer", "Ceramic coater"] {
        match market.create_vacancy(&studio, vacancy(title)) {
            Ok(vacancy) => {
                println!("- posted '{}' ({})", vacancy.title, vacancy.id);
                first_vacancy.get_or_insert(vacancy.id);
            }
            Err(err) => println!("- '{title}' refused: {err}"),
        }
    }
    if let Some(vacancy_id) = first_vacancy {
        let application = market.apply_to_vacancy(
            &detailer,
            &vacancy_id,
            "Five years of paint correction".to_string(),
        )?;
        market.accept_application(&studio, &vacancy_id, &application.id)?;
        println!("- Ivan applied and was accepted; vacancy stays open");
    }

    println!("\nUrgent gig");
    let gig = market.create_gig(
        &studio,
        NewGig {
            title: "Saturday shift".to_string(),
            city: "Moscow".to_string(),
            date: (opened + Duration::days(5)).date_naive(),
            payment: 6_000,
            description: "Two cars, full polish".to_string(),
            urgent: true,
        },
    )?;
    let first = market.respond_to_gig(&detailer, &gig.id, String::new())?;
    let repeat = market.respond_to_gig(&detailer, &gig.id, String::new())?;
    println!(
        "- first response created: {} | repeat created: {}",
        first.is_created(),
        repeat.is_created()
    );

    println!("\nClient order");
    let order = market.create_order(
        &driver,
        NewOrder {
            service: "Interior dry cleaning".to_string(),
            city: "Moscow".to_string(),
            car: CarDetails {
                make: "Skoda".to_string(),
                model: Some("Octavia".to_string()),
                body_type: Some("liftback".to_string()),
            },
            budget: Some(12_000),
            preferred_date: None,
            description: String::new(),
        },
    )?;
    let winning = market.respond_to_order(&detailer, &order.id, 9_000, "Tomorrow".to_string())?;
    market.respond_to_order(&studio, &order.id, 11_500, String::new())?;
    let bid = market.accept_order_response(&driver, &order.id, &winning.id)?;
    println!(
        "- accepted {} at {} RUB, {} other bid(s) rejected",
        bid.accepted.id,
        bid.accepted.price,
        bid.rejected.len()
    );
    let completed = market.complete_order(&driver, &order.id)?;
    println!("- order is now {:?}", completed.status);

    println!("\nCollective purchases");
    let popular = market.create_purchase(&supplier, purchase("Ceramic coating 50ml", 2, opened))?;
    let niche = market.create_purchase(&supplier, purchase("Clay bar kit", 3, opened))?;
    market.join_purchase(&studio, &popular.id, 5)?;
    market.join_purchase(&detailer, &popular.id, 1)?;
    market.join_purchase(&studio, &niche.id, 2)?;
    clock.advance(Duration::days(8));
    let summary = market.sweep_purchases()?;
    println!(
        "- after the deadline: {} completed, {} cancelled",
        summary.completed.len(),
        summary.cancelled.len()
    );

    println!("\nPromo codes");
    market.create_promo(
        &supplier,
        NewPromo {
            code: "SPRING10".to_string(),
            title: "Spring restock".to_string(),
            discount_percent: 10,
            max_uses: Some(1),
            valid_until: None,
        },
    )?;
    let redeemed = market.redeem_promo(&studio, "spring10")?;
    println!("- studio redeemed, used {} time(s)", redeemed.value().used_count);
    if let Err(err) = market.redeem_promo(&driver, "SPRING10") {
        println!("- client refused: {err}");
    }

    println!("\nTraining and reputation");
    let enrollment = market.enroll(&detailer, "Ceramic coatings".to_string())?;
    let certified = market.complete_training(&detailer, &enrollment.id)?;
    println!(
        "- certificate issued: {}",
        certified.certificate_id.as_deref().unwrap_or("none")
    );
    for (author, rating) in [(&driver, 5), (&studio, 4)] {
        market.write_review(
            author,
            NewReview {
                target_id: detailer.account_id.clone(),
                rating,
                text: String::new(),
            },
        )?;
    }
    let reputation = market.reputation(&detailer.account_id)?;
    println!(
        "- Ivan: {} review(s), average {}",
        reputation.review_count,
        reputation
            .average_rating
            .map(|average| format!("{average:.1}"))
            .unwrap_or_else(|| "n/a".to_string())
    );

    if args.dashboards {
        println!("\nDashboards");
        for ctx in [&studio, &detailer, &driver, &supplier] {
            let dashboard = market.dashboard(ctx)?;
            match serde_json::to_string_pretty(&dashboard) {
                Ok(json) => println!("{json}"),
                Err(err) => println!("  dashboard for {} unavailable: {err}", ctx.account_id),
            }
        }
    }

    println!("\n{} notice(s) published", notifier.published());
    Ok(())
}

fn enroll_account(
    market: &DemoService,
    role: Role,
    plan: Plan,
    name: &str,
) -> Result<ActorContext, AppError> {
    let slug = name.to_ascii_lowercase().replace(' ', ".");
    let employer = role == Role::Employer;
    let account = market.register(NewAccount {
        role,
        plan,
        plan_expires_at: None,
        profile: Profile {
            name: name.to_string(),
            email: format!("{slug}@example.com"),
            phone: "+7 900 555 01 01".to_string(),
            city: "Moscow".to_string(),
            company_name: employer.then(|| name.to_string()),
            tax_id: employer.then(|| "7701234567".to_string()),
            address: employer.then(|| "Leninsky pr. 12".to_string()),
            ..Profile::default()
        },
    })?;
    println!("Registered {role} '{name}' ({})", account.id);
    Ok(market.context_for(&account.id)?)
}

fn vacancy(title: &str) -> NewVacancy {
    NewVacancy {
        title: title.to_string(),
        city: "Moscow".to_string(),
        salary: "from 90 000".to_string(),
        description: String::new(),
    }
}

fn purchase(product: &str, min_participants: u32, opened: DateTime<Utc>) -> NewPurchase {
    NewPurchase {
        product: product.to_string(),
        category: "chemicals".to_string(),
        price_per_unit: 3_200,
        retail_price: Some(4_500),
        min_participants,
        deadline: opened + Duration::days(7),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_accepts_iso_days() {
        assert_eq!(
            parse_date(" 2026-05-01 "),
            Ok(NaiveDate::from_ymd_opt(2026, 5, 1).expect("valid date"))
        );
        assert!(parse_date("01/05/2026").is_err());
    }

    #[test]
    fn demo_walkthrough_completes() {
        run_demo(DemoArgs {
            start: NaiveDate::from_ymd_opt(2026, 5, 1),
            dashboards: true,
        })
        .expect("demo runs end to end");
    }
}
