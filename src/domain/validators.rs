pub const ALLOWED_EMAIL_DOMAINS: &[&str] = &["gmail.com", "yahoo.com", "outlook.com", "cit.edu"];
pub const PASSWORD_SPECIAL_CHARACTERS: &str = "!@#$%^&*()_+{}[]:;<>,.?~-";

pub const EMAIL_DOMAIN_MESSAGE: &str =
    "Email must be @gmail.com, @yahoo.com, @outlook.com, or @cit.edu.";
pub const PASSWORD_POLICY_MESSAGE: &str =
    "Password must contain at least 1 uppercase letter and 1 special character.";

/// Accepts `local@domain` where the local part uses letters, digits and
/// `._%+-` and the domain is one of [`ALLOWED_EMAIL_DOMAINS`].
pub fn validate_email_domain(email: &str) -> Result<(), String> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(EMAIL_DOMAIN_MESSAGE.to_string());
    };
    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || "._%+-".contains(ch));
    if !local_ok || !ALLOWED_EMAIL_DOMAINS.contains(&domain) {
        return Err(EMAIL_DOMAIN_MESSAGE.to_string());
    }
    Ok(())
}

pub fn validate_password_policy(password: &str) -> Result<(), String> {
    let has_uppercase = password.chars().any(|ch| ch.is_ascii_uppercase());
    let has_special = password
        .chars()
        .any(|ch| PASSWORD_SPECIAL_CHARACTERS.contains(ch));
    if !has_uppercase || !has_special {
        return Err(PASSWORD_POLICY_MESSAGE.to_string());
    }
    Ok(())
}
