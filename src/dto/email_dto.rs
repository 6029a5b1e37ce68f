use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct TestEmailRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegistrationConfirmationRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, message = "El nombre es obligatorio"))]
    pub name: String,
}
