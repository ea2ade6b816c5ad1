use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug)]
pub struct SignUpForm {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ForgotPasswordForm {
    pub email: String,
    pub callback_url: Option<String>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ResetPasswordForm {
    pub password: String,
    pub confirm_password: String,
}
