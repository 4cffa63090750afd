//! Regex heuristic extraction — the strategy of last resort. Always succeeds;
//! fields it cannot find stay "N/A" and the match score stays 0 (the TF-IDF
//! pass fills scores in when it runs).

use std::sync::OnceLock;

use regex::Regex;

use crate::models::candidate::CandidateProfile;

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\+\(]?[1-9][0-9 .\-\(\)]{8,}[0-9]").expect("valid regex"))
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+").expect("valid regex")
    })
}

fn years_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\+?\s*years?").expect("valid regex"))
}

pub fn extract_profile(text: &str) -> CandidateProfile {
    let mut profile = CandidateProfile {
        name: "N/A".to_string(),
        ..CandidateProfile::default()
    };

    // First phone-looking run with more than 9 actual digits.
    if let Some(phone) = phone_re()
        .find_iter(text)
        .map(|m| m.as_str())
        .find(|p| p.chars().filter(char::is_ascii_digit).count() > 9)
    {
        profile.phone = phone.to_string();
    }

    if let Some(email) = email_re().find(text) {
        let email = email.as_str();
        profile.email = email.to_string();
        // Placeholder name from the address local part.
        profile.name = email.split('@').next().unwrap_or(email).to_string();
    }

    let max_years = years_re()
        .captures_iter(&text.to_lowercase())
        .filter_map(|c| c.get(1).and_then(|m| m.as_str().parse::<u32>().ok()))
        .max();
    if let Some(years) = max_years {
        profile.experience = format!("{years} Years");
    }

    profile
}
