use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::auth::middleware::AuthenticatedUser;
use crate::error::{ApiError, required};
use crate::handlers::client_ip;
use crate::sheets::{SheetRow, SheetsClient, SheetsError, parse_rows, serialize_responses};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendRowRequest {
    pub portfolio_title: Option<String>,
    pub company_name: Option<String>,
    pub responses: Option<Map<String, Value>>,
    pub submitted_at: Option<String>,
}

impl From<SheetsError> for ApiError {
    fn from(err: SheetsError) -> Self {
        ApiError::Internal(format!("Google Sheets request failed: {err}"))
    }
}

fn client(sheets: Option<web::Data<SheetsClient>>) -> Result<web::Data<SheetsClient>, ApiError> {
    sheets.ok_or_else(|| ApiError::Internal("Google Sheets is not configured".to_string()))
}

/// POST /api/sheets: append one row to the mirror sheet.
pub async fn append_row(
    req: HttpRequest,
    sheets: Option<web::Data<SheetsClient>>,
    body: web::Json<AppendRowRequest>,
) -> Result<HttpResponse, ApiError> {
    let sheets = client(sheets)?;
    let body = body.into_inner();

    let responses = body
        .responses
        .filter(|r| !r.is_empty())
        .ok_or_else(|| ApiError::missing("responses"))?;
    let row = SheetRow {
        submitted_at: body.submitted_at.filter(|s| !s.trim().is_empty()),
        portfolio_title: required(body.portfolio_title, "portfolioTitle")?,
        company_name: required(body.company_name, "companyName")?,
        responses: serialize_responses(&responses),
        ip_address: client_ip(&req),
    };

    sheets.append(&row).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Saved to Google Sheets",
    })))
}

/// GET /api/sheets: rows of the mirror sheet, without its header row.
pub async fn get_rows(
    user: AuthenticatedUser,
    sheets: Option<web::Data<SheetsClient>>,
) -> Result<HttpResponse, ApiError> {
    user.require_admin()?;
    let sheets = client(sheets)?;

    let (submissions, has_header) = parse_rows(sheets.read().await?);
    Ok(HttpResponse::Ok().json(json!({
        "submissions": submissions,
        "hasHeader": has_header,
    })))
}
