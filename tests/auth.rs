use storefront_api::{
    error::AppError,
    middleware::auth::{AuthUser, ROLE_ADMIN, ROLE_USER, ensure_admin, issue_token, verify_token},
    services::auth_service::{validate_email, validate_password},
};

#[test]
fn password_rules() {
    assert!(validate_password("abc12345").is_ok());
    assert!(matches!(validate_password("abc1234"), Err(AppError::BadRequest(_))));
    assert!(matches!(validate_password("abcdefgh"), Err(AppError::BadRequest(_))));
    assert!(matches!(validate_password("12345678"), Err(AppError::BadRequest(_))));
}

#[test]
fn email_shape() {
    assert!(validate_email("buyer@example.com").is_ok());
    assert!(validate_email("buyer@localhost").is_err());
    assert!(validate_email("@example.com").is_err());
    assert!(validate_email("no-at-sign").is_err());
}

#[test]
fn token_round_trip() -> anyhow::Result<()> {
    let token = issue_token(42, ROLE_ADMIN, "secret")?;
    let user = verify_token(&token, "secret")?;
    assert_eq!(user.user_id, 42);
    assert!(user.is_admin());
    assert!(!user.session_id.is_empty());
    Ok(())
}

#[test]
fn every_login_gets_its_own_session() -> anyhow::Result<()> {
    let first = verify_token(&issue_token(7, ROLE_USER, "secret")?, "secret")?;
    let second = verify_token(&issue_token(7, ROLE_USER, "secret")?, "secret")?;
    assert_ne!(first.session_id, second.session_id);
    Ok(())
}

#[test]
fn token_signed_with_other_secret_is_unauthorized() -> anyhow::Result<()> {
    let token = issue_token(42, ROLE_USER, "secret")?;
    assert!(matches!(verify_token(&token, "other"), Err(AppError::Unauthorized)));
    assert!(matches!(verify_token("garbage", "secret"), Err(AppError::Unauthorized)));
    Ok(())
}

#[test]
fn only_admins_pass_admin_guard() {
    let admin = AuthUser {
        user_id: 1,
        role: ROLE_ADMIN.into(),
        session_id: "s1".into(),
    };
    let customer = AuthUser {
        user_id: 2,
        role: ROLE_USER.into(),
        session_id: "s2".into(),
    };
    assert!(ensure_admin(&admin).is_ok());
    assert!(matches!(ensure_admin(&customer), Err(AppError::Forbidden)));
}
