use crate::config::Config;
use crate::error::ApiError;
use crate::utils::workdays::count_working_days;
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CalcDays {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-09", format = "date", value_type = String)]
    pub end_date: NaiveDate,
}

/// The configured holiday calendar, ISO dates, sorted.
#[utoipa::path(
    get,
    path = "/calendar/holidays",
    responses((status = 200, description = "Holiday dates", body = [String])),
    tag = "Calendar"
)]
pub async fn holidays(config: web::Data<Config>) -> HttpResponse {
    let mut dates: Vec<String> = config
        .holidays
        .iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect();
    dates.sort();

    HttpResponse::Ok().json(dates)
}

/// Working days in an inclusive range, weekends and holidays excluded.
/// `end < start` is 0, not an error.
#[utoipa::path(
    post,
    path = "/calendar/working_days",
    request_body = CalcDays,
    responses((status = 200, description = "Day count")),
    tag = "Calendar"
)]
pub async fn working_days(
    config: web::Data<Config>,
    payload: web::Json<CalcDays>,
) -> Result<HttpResponse, ApiError> {
    let days = count_working_days(payload.start_date, payload.end_date, &config.holidays);

    Ok(HttpResponse::Ok().json(json!({ "days": days })))
}
