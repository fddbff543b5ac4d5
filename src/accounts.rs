//! Signup and login.

use crate::{
    auth::{hash_password, issue_token, verify_password},
    config::AppConfig,
    error::{AppError, AppResult},
    models::{LoginRequest, LoginResponse, NewUser, Role, SignupRequest, UserProfile},
    repository::{Repository, USER_EXISTS},
    validation::{self, MIN_PASSWORD_LEN},
};

/// Checks a signup request and returns the trimmed email, password and role.
/// Rules run in a fixed order and the first failure is reported.
pub fn validate_signup(req: &SignupRequest) -> AppResult<(String, String, Role)> {
    let email = req.email.trim();
    let password = req.password.trim();
    let role = req.role.trim();

    validation::require_non_empty(&[email, password, role])?;
    validation::require_sanitized(&[email, password, role])?;

    if !validation::is_valid_email(email) {
        return Err(AppError::Validation("Invalid email!".to_string()));
    }
    if validation::has_whitespace(password) {
        return Err(AppError::Validation("Password shouldn't contain space!".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(
            "Password is too short! (At least 6 character)".to_string(),
        ));
    }
    let role: Role = role.parse().map_err(|_| {
        AppError::Validation("Invalid user type (between librarian or student)!".to_string())
    })?;

    Ok((email.to_string(), password.to_string(), role))
}

/// Registers a new account. The email must not be taken.
pub async fn signup(repo: &dyn Repository, req: SignupRequest) -> AppResult<UserProfile> {
    let (email, password, role) = validate_signup(&req)?;

    if repo.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(USER_EXISTS.to_string()));
    }

    let password_hash = hash_password(password).await?;
    let user = repo
        .create_user(NewUser {
            email,
            password_hash,
            role,
        })
        .await?;

    tracing::info!(user_id = %user.id, role = %user.role, "user registered");
    Ok(user.into())
}

/// Verifies credentials and issues a token signed with the secret of the user's role.
pub async fn login(repo: &dyn Repository, config: &AppConfig, req: LoginRequest) -> AppResult<LoginResponse> {
    let email = req.email.trim();

    let user = repo
        .find_user_by_email(email)
        .await?
        .ok_or_else(|| AppError::NotFound("User Not Found!".to_string()))?;

    if !verify_password(req.password, user.password_hash.clone()).await? {
        return Err(AppError::Validation("Wrong User credentials!".to_string()));
    }

    let token = issue_token(config, user.id, &user.email, user.role)?;
    tracing::info!(user_id = %user.id, role = %user.role, "user signed in");

    Ok(LoginResponse {
        token,
        user_id: user.id,
        role: user.role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, password: &str, role: &str) -> SignupRequest {
        SignupRequest {
            email: email.into(),
            password: password.into(),
            role: role.into(),
        }
    }

    fn message(req: SignupRequest) -> String {
        validate_signup(&req).unwrap_err().to_string()
    }

    #[test]
    fn accepts_a_well_formed_request() {
        let (email, password, role) =
            validate_signup(&request("  reader@library.org ", " secret1 ", "student")).unwrap();
        assert_eq!(email, "reader@library.org");
        assert_eq!(password, "secret1");
        assert_eq!(role, Role::Student);
    }

    #[test]
    fn reports_the_first_failing_rule() {
        assert_eq!(message(request("", "secret1", "student")), "Field can't be empty!");
        assert_eq!(
            message(request("<b>x</b>@a.io", "secret1", "student")),
            "Some malicious or invalid inputs found!"
        );
        assert_eq!(message(request("nope", "secret1", "student")), "Invalid email!");
        assert_eq!(
            message(request("a@b.io", "sec ret1", "student")),
            "Password shouldn't contain space!"
        );
        assert_eq!(
            message(request("a@b.io", "abc", "student")),
            "Password is too short! (At least 6 character)"
        );
        assert_eq!(
            message(request("a@b.io", "secret1", "admin")),
            "Invalid user type (between librarian or student)!"
        );
    }

    #[test]
    fn role_is_case_sensitive() {
        assert!(validate_signup(&request("a@b.io", "secret1", "Librarian")).is_err());
    }
}
