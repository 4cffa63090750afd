//! CSV export of a ranked candidate list.

use anyhow::{anyhow, Result};
use chrono::NaiveDate;

use crate::models::candidate::Candidate;

const HEADER: [&str; 6] = ["Score (%)", "Name", "Phone", "Email", "Experience", "Skills"];

/// Renders candidates (already in ranked order) as CSV.
pub fn candidates_to_csv(candidates: &[Candidate]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER)?;
    for candidate in candidates {
        let profile = &candidate.profile;
        writer.write_record([
            profile.match_score.to_string(),
            profile.name.clone(),
            profile.phone.clone(),
            profile.email.clone(),
            profile.experience.clone(),
            profile.skills.clone(),
        ])?;
    }
    writer.flush()?;
    let data = writer
        .into_inner()
        .map_err(|e| anyhow!("CSV writer: {e}"))?;
    Ok(String::from_utf8(data)?)
}

pub fn export_filename(date: NaiveDate) -> String {
    format!("candidates_{}.csv", date.format("%Y%m%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    use crate::models::candidate::{Candidate, CandidateProfile, Verdict};

    fn candidate(name: &str, score: u8) -> Candidate {
        Candidate {
            profile: CandidateProfile {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                phone: "+1 415 555 0100".to_string(),
                experience: "5 Years".to_string(),
                skills: "Python, AWS".to_string(),
                match_score: score,
            },
            verdict: Verdict::from_score(score, 50, 30),
            source_filename: format!("{name}.pdf"),
            bytes: Bytes::from_static(b"%PDF-1.4"),
            extracted_text: "text".to_string(),
            received: None,
        }
    }

    #[test]
    fn test_header_row_matches_export_columns() {
        let csv = candidates_to_csv(&[]).unwrap();
        assert_eq!(csv.trim_end(), "Score (%),Name,Phone,Email,Experience,Skills");
    }

    #[test]
    fn test_score_and_name_round_trip() {
        let csv = candidates_to_csv(&[candidate("Jane", 80)]).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert!(row.starts_with("80,Jane,"));
        assert!(row.contains("jane@example.com"));
    }

    #[test]
    fn test_rows_preserve_ranked_order() {
        let csv =
            candidates_to_csv(&[candidate("First", 90), candidate("Second", 40)]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert!(lines[1].contains("First"));
        assert!(lines[2].contains("Second"));
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let csv = candidates_to_csv(&[candidate("Jane", 70)]).unwrap();
        // "Python, AWS" must survive as one field
        assert!(csv.contains("\"Python, AWS\""));
    }

    #[test]
    fn test_export_filename_format() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        assert_eq!(export_filename(date), "candidates_20240311.csv");
    }
}
