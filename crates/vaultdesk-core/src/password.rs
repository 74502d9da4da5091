// ── Password rules ──

pub const MIN_PASSWORD_LENGTH: usize = 8;

const SPECIAL_CHARS: &str = "`!@#$%^&*()_+-=[]{};':\"\\|,.<>/?~";

/// Every rule `password` breaks, in display order. Empty when valid.
pub fn validate_password(password: &str) -> Vec<&'static str> {
    let mut violations = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        violations.push("Use at least 8 characters");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        violations.push("Contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        violations.push("Contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        violations.push("Contain at least one numeric character");
    }
    if !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        violations.push("Contain at least one special character");
    }
    violations
}

pub fn confirm_password(password: &str, confirmation: &str) -> Vec<&'static str> {
    if password == confirmation {
        Vec::new()
    } else {
        vec!["Password do not match"]
    }
}
