//! Fills a database with a small competition to click around in.

use anyhow::{Context, Result, bail};
use argon2::Argon2;
use argon2::PasswordHasher;
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use chrono::Utc;
use clap::Parser;
use diesel::prelude::*;
use diesel::{Connection, RunQueryDsl};
use diesel_migrations::MigrationHarness;
use diveboard::MIGRATIONS;
use diveboard::competitions::dives::{fina, sheet};
use diveboard::competitions::run_order::draw_positions;
use diveboard::competitions::scores::upsert_score;
use diveboard::permission::Role;
use diveboard::schema::{
    competitions, competitors, dive_entries, events, run_orders, users,
};
use rand::SeedableRng;
use rand::seq::IteratorRandom;
use rand::{Rng, rngs::StdRng};
use uuid::Uuid;

const BOARD_HEIGHT: &str = "3m";
const NUM_JUDGES: i64 = 5;
const NUM_DIVES: i64 = 6;

const DIVERS: [(&str, &str, &str); 3] = [
    ("Ada", "Lovelace", "Harbour Divers"),
    ("Grace", "Hopper", "Northside DC"),
    ("Mary", "Somerville", "Harbour Divers"),
];

#[derive(Parser)]
struct Seed {
    #[clap(long, env = "DATABASE_URL")]
    database_url: String,
    /// Seed for the random dive sheets and run order.
    #[clap(long, default_value_t = 2025)]
    seed: u64,
    /// Fill in judges' scores for this many rounds.
    #[clap(long, default_value_t = 0)]
    scored_rounds: i64,
}

fn main() -> Result<()> {
    let args = Seed::parse();
    if args.scored_rounds > NUM_DIVES {
        bail!("there are only {NUM_DIVES} rounds");
    }

    let mut conn = diesel::SqliteConnection::establish(&args.database_url)
        .with_context(|| format!("could not open {}", args.database_url))?;

    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("migrations failed: {e}"))?;

    let mut rng = StdRng::seed_from_u64(args.seed);

    conn.transaction::<_, anyhow::Error, _>(|conn| {
        ensure_admin(conn)?;
        let event_id = create_event(conn)?;
        let competitor_ids = create_competitors(&event_id, &mut rng, conn)?;
        create_run_order(&event_id, competitor_ids.clone(), &mut rng, conn)?;
        fill_scores(&competitor_ids, args.scored_rounds, &mut rng, conn)?;

        println!("seeded event {event_id}");
        Ok(())
    })
}

fn ensure_admin(conn: &mut SqliteConnection) -> Result<()> {
    let exists = users::table
        .filter(users::username.eq("admin"))
        .count()
        .get_result::<i64>(conn)?
        > 0;

    if exists {
        println!("user `admin` already exists, leaving it alone");
        return Ok(());
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password("password".as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("could not hash password: {e}"))?
        .to_string();

    diesel::insert_into(users::table)
        .values((
            users::id.eq(Uuid::now_v7().to_string()),
            users::email.eq("admin@example.com"),
            users::username.eq("admin"),
            users::password_hash.eq(password_hash),
            users::role.eq(Role::Admin.as_str()),
            users::created_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)?;

    println!("created user `admin` with password `password`");
    Ok(())
}

fn create_event(conn: &mut SqliteConnection) -> Result<String> {
    let now = Utc::now().naive_utc();
    let competition_id = Uuid::now_v7().to_string();
    let event_id = Uuid::now_v7().to_string();

    diesel::insert_into(competitions::table)
        .values((
            competitions::id.eq(&competition_id),
            competitions::name.eq("Spring Invitational"),
            competitions::date.eq(now.format("%Y-%m-%d").to_string()),
            competitions::location.eq("City Aquatic Centre"),
            competitions::num_judges.eq(NUM_JUDGES),
            competitions::created_at.eq(now),
        ))
        .execute(conn)?;

    diesel::insert_into(events::table)
        .values((
            events::id.eq(&event_id),
            events::competition_id.eq(&competition_id),
            events::name.eq("Women's 3m Springboard"),
            events::num_dives.eq(NUM_DIVES),
            events::created_at.eq(now),
            events::updated_at.eq(now),
        ))
        .execute(conn)?;

    Ok(event_id)
}

fn create_competitors(
    event_id: &str,
    rng: &mut StdRng,
    conn: &mut SqliteConnection,
) -> Result<Vec<String>> {
    let available = fina::dives_from(BOARD_HEIGHT);
    let mut ids = vec![];

    for (first_name, last_name, club) in DIVERS {
        let competitor_id = Uuid::now_v7().to_string();
        let now = Utc::now().naive_utc();

        diesel::insert_into(competitors::table)
            .values((
                competitors::id.eq(&competitor_id),
                competitors::event_id.eq(event_id),
                competitors::first_name.eq(first_name),
                competitors::last_name.eq(last_name),
                competitors::club.eq(club),
                competitors::age_group.eq("Open"),
                competitors::created_at.eq(now),
            ))
            .execute(conn)?;

        let sheet = available
            .iter()
            .choose_multiple(rng, NUM_DIVES as usize);

        for (dive_number, (code, info)) in (1..).zip(sheet) {
            diesel::insert_into(dive_entries::table)
                .values((
                    dive_entries::id.eq(Uuid::now_v7().to_string()),
                    dive_entries::competitor_id.eq(&competitor_id),
                    dive_entries::dive_number.eq(dive_number),
                    dive_entries::fina_code.eq(*code),
                    dive_entries::board_height.eq(BOARD_HEIGHT),
                    dive_entries::difficulty.eq(info.difficulty),
                    dive_entries::description.eq(info.description),
                    dive_entries::created_at.eq(now),
                ))
                .execute(conn)?;
        }

        sheet::set_status(&competitor_id, sheet::SheetStatus::Submitted, conn)
            .map_err(|_| anyhow::anyhow!("could not submit dive sheet"))?;

        ids.push(competitor_id);
    }

    Ok(ids)
}

fn create_run_order(
    event_id: &str,
    competitor_ids: Vec<String>,
    rng: &mut StdRng,
    conn: &mut SqliteConnection,
) -> Result<()> {
    for (competitor_id, run_position) in draw_positions(competitor_ids, rng) {
        diesel::insert_into(run_orders::table)
            .values((
                run_orders::id.eq(Uuid::now_v7().to_string()),
                run_orders::event_id.eq(event_id),
                run_orders::competitor_id.eq(competitor_id),
                run_orders::run_position.eq(run_position),
            ))
            .execute(conn)?;
    }
    Ok(())
}

fn fill_scores(
    competitor_ids: &[String],
    rounds: i64,
    rng: &mut StdRng,
    conn: &mut SqliteConnection,
) -> Result<()> {
    for competitor_id in competitor_ids {
        let entry_ids = dive_entries::table
            .filter(dive_entries::competitor_id.eq(competitor_id))
            .filter(dive_entries::dive_number.le(rounds))
            .select(dive_entries::id)
            .load::<String>(conn)?;

        for entry_id in entry_ids {
            for judge_number in 1..=NUM_JUDGES {
                // 5.0 to 9.5 in half points
                let value = rng.random_range(10..=19) as f64 * 0.5;
                upsert_score(&entry_id, judge_number, value, conn)
                    .map_err(|_| anyhow::anyhow!("could not store a score"))?;
            }
        }
    }
    Ok(())
}
