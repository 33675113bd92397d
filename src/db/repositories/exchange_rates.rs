use diesel::prelude::*;
use diesel::upsert::excluded;

use crate::db::models::exchange_rate::ExchangeRate;

pub struct ExchangeRateRepo;

impl ExchangeRateRepo {
    /// Inserts or refreshes each `(base, quote)` pair.
    pub fn upsert_many(conn: &mut PgConnection, rows: &[ExchangeRate]) -> Result<usize, diesel::result::Error> {
        use crate::schema::exchange_rates::dsl::*;
        if rows.is_empty() {
            return Ok(0);
        }
        diesel::insert_into(exchange_rates)
            .values(rows)
            .on_conflict((base_currency, quote_currency))
            .do_update()
            .set((rate.eq(excluded(rate)), fetched_at.eq(excluded(fetched_at))))
            .execute(conn)
    }

    pub fn list_for_base(conn: &mut PgConnection, base: &str) -> Result<Vec<ExchangeRate>, diesel::result::Error> {
        use crate::schema::exchange_rates::dsl::*;
        exchange_rates
            .filter(base_currency.eq(base.to_ascii_uppercase()))
            .order(quote_currency.asc())
            .select(ExchangeRate::as_select())
            .load(conn)
    }
}
