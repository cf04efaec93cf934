//! Public corporate partnership sign-up.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::post,
};
use tracing::instrument;

use kanak_core::Email;

use crate::db::CorporateRepository;
use crate::db::corporate::RegistrationInput;
use crate::error::{AppError, Result};
use crate::models::workflows::CorporateRegistration;
use crate::routes::validation::required;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/registrations", post(register))
}

/// POST /api/corporate/registrations
#[instrument(skip(state, input), fields(company = %input.company_name))]
async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegistrationInput>,
) -> Result<(StatusCode, Json<CorporateRegistration>)> {
    validate(&input)?;
    let registration = CorporateRepository::new(state.pool()).create(&input).await?;
    tracing::info!(registration_id = %registration.id, "Corporate registration received");
    Ok((StatusCode::CREATED, Json(registration)))
}

fn validate(input: &RegistrationInput) -> Result<()> {
    required("company_name", &input.company_name)?;
    required("contact_name", &input.contact_name)?;
    required("phone", &input.phone)?;
    Email::parse(&input.email)
        .map_err(|_| AppError::BadRequest("Invalid email address".to_string()))?;
    if input.employee_count.is_some_and(|n| n < 1) {
        return Err(AppError::BadRequest(
            "employee_count must be at least 1".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> RegistrationInput {
        RegistrationInput {
            company_name: "Infosys Pune".to_string(),
            contact_name: "Meera Kulkarni".to_string(),
            email: "hr@example.co.in".to_string(),
            phone: "+91 98200 00000".to_string(),
            employee_count: Some(250),
            gst_number: None,
            message: None,
        }
    }

    #[test]
    fn test_registration_validation() {
        assert!(validate(&input()).is_ok());
        assert!(validate(&RegistrationInput { email: "nope".to_string(), ..input() }).is_err());
        assert!(validate(&RegistrationInput { company_name: " ".to_string(), ..input() }).is_err());
        assert!(validate(&RegistrationInput { employee_count: Some(0), ..input() }).is_err());
    }
}
