//! Masking helpers for recipients and codes written to logs or returned to callers

/// Mask a phone number, keeping only the last four digits (e.g. `+******7890`)
pub fn mask_phone_number(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }

    let visible = 4;
    let masked_count = chars.len() - visible;
    let last_digits: String = chars[chars.len() - visible..].iter().collect();

    if phone.starts_with('+') {
        format!("+{}{}", "*".repeat(masked_count - 1), last_digits)
    } else {
        format!("{}{}", "*".repeat(masked_count), last_digits)
    }
}

/// Mask an email address, keeping the first character of the local part and the domain
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() => {
            let first: String = local.chars().take(1).collect();
            format!("{}***@{}", first, domain)
        }
        _ => "***".to_string(),
    }
}

/// Mask any recipient string: email addresses by domain, everything else as a phone number
pub fn mask_recipient(recipient: &str) -> String {
    if recipient.contains('@') {
        mask_email(recipient)
    } else {
        mask_phone_number(recipient)
    }
}

/// Replace every character of a code with `*`
pub fn mask_code(code: &str) -> String {
    "*".repeat(code.chars().count())
}
