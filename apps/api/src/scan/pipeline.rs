//! Scan pipeline — harvest → extract → score → rank, driven by an explicit
//! per-request context. Records are independent, so extraction and scoring run
//! under a bounded worker pool; the final ordering is restored and then sorted
//! by score, so output is deterministic regardless of task completion order.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::extract;
use crate::harvest::{HarvestError, MailSource, RawAttachment, TimeWindow};
use crate::models::candidate::{Candidate, CandidateProfile, Verdict};
use crate::scoring::{self, tfidf, ProfileStrategy};

/// Everything one scan needs, threaded through the pipeline instead of living
/// in process-wide state.
pub struct ScanContext {
    pub window: TimeWindow,
    pub job_description: String,
    /// Ordered extraction strategies; the heuristic tail is implicit.
    pub strategies: Vec<Box<dyn ProfileStrategy>>,
    /// TF-IDF similarity scoring runs when no LLM strategy is configured.
    pub use_tfidf: bool,
    pub min_text_len: usize,
    pub concurrency: usize,
    pub interview_threshold: u8,
    pub hold_threshold: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStatus {
    Success,
    /// The provider answered but nothing usable matched. Not a failure.
    NoMatches { scanned: usize },
}

impl ScanStatus {
    pub fn message(&self) -> String {
        match self {
            ScanStatus::Success => "Success".to_string(),
            ScanStatus::NoMatches { scanned: 0 } => "No resumes found.".to_string(),
            ScanStatus::NoMatches { scanned } => {
                format!("Scanned {scanned} attachments, but found 0 readable resumes.")
            }
        }
    }
}

pub struct ScanOutcome {
    pub candidates: Vec<Candidate>,
    /// Attachments the harvester returned, before extraction filtering.
    pub harvested: usize,
    pub status: ScanStatus,
}

pub async fn run_scan(
    ctx: Arc<ScanContext>,
    source: &dyn MailSource,
) -> Result<ScanOutcome, HarvestError> {
    let attachments = source.fetch(&ctx.window).await?;
    let harvested = attachments.len();
    info!("Harvested {harvested} candidate attachments");

    if attachments.is_empty() {
        return Ok(ScanOutcome {
            candidates: Vec::new(),
            harvested,
            status: ScanStatus::NoMatches { scanned: 0 },
        });
    }

    let semaphore = Arc::new(Semaphore::new(ctx.concurrency));
    let mut tasks: JoinSet<Option<(usize, RawAttachment, String, CandidateProfile)>> =
        JoinSet::new();

    for (index, attachment) in attachments.into_iter().enumerate() {
        let ctx = Arc::clone(&ctx);
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok()?;

            let text = {
                let bytes = attachment.bytes.clone();
                let filename = attachment.filename.clone();
                tokio::task::spawn_blocking(move || extract::extract_text(&bytes, &filename))
                    .await
                    .ok()?
            };

            if text.trim().len() <= ctx.min_text_len {
                debug!(
                    "Dropping {}: extracted {} chars (minimum {})",
                    attachment.filename,
                    text.trim().len(),
                    ctx.min_text_len
                );
                return None;
            }

            let profile =
                scoring::run_strategies(&ctx.strategies, &text, &ctx.job_description).await;
            Some((index, attachment, text, profile))
        });
    }

    let mut rows = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        if let Ok(Some(row)) = joined {
            rows.push(row);
        }
    }
    // Restore harvest (newest-first) order before ranking.
    rows.sort_by_key(|(index, ..)| *index);

    if ctx.use_tfidf {
        let texts: Vec<String> = rows.iter().map(|(_, _, text, _)| text.clone()).collect();
        let scores = tfidf::score_against_jd(&ctx.job_description, &texts);
        for ((_, _, _, profile), score) in rows.iter_mut().zip(scores) {
            profile.match_score = score;
        }
    }

    let mut candidates: Vec<Candidate> = rows
        .into_iter()
        .map(|(_, attachment, text, profile)| Candidate {
            verdict: Verdict::from_score(
                profile.match_score,
                ctx.interview_threshold,
                ctx.hold_threshold,
            ),
            source_filename: attachment.filename,
            bytes: attachment.bytes,
            extracted_text: text,
            received: attachment.received,
            profile,
        })
        .collect();

    // Stable sort: equal scores keep their newest-first order.
    candidates.sort_by(|a, b| b.profile.match_score.cmp(&a.profile.match_score));

    let status = if candidates.is_empty() {
        ScanStatus::NoMatches { scanned: harvested }
    } else {
        ScanStatus::Success
    };

    Ok(ScanOutcome {
        candidates,
        harvested,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use chrono::NaiveDate;

    use crate::extract::docx::tests_support::make_docx;
    use crate::harvest::RawAttachment;

    struct FixedSource(Vec<RawAttachment>);

    #[async_trait]
    impl MailSource for FixedSource {
        async fn fetch(&self, _window: &TimeWindow) -> Result<Vec<RawAttachment>, HarvestError> {
            Ok(self.0.clone())
        }
    }

    fn test_window() -> TimeWindow {
        TimeWindow::range(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        )
    }

    fn ctx(jd: &str) -> Arc<ScanContext> {
        Arc::new(ScanContext {
            window: test_window(),
            job_description: jd.to_string(),
            strategies: Vec::new(),
            use_tfidf: true,
            min_text_len: 20,
            concurrency: 4,
            interview_threshold: 50,
            hold_threshold: 30,
        })
    }

    fn docx_attachment(filename: &str, paragraphs: &[&str]) -> RawAttachment {
        RawAttachment {
            filename: filename.to_string(),
            bytes: Bytes::from(make_docx(paragraphs)),
            sender: "sender@example.com".to_string(),
            received: None,
        }
    }

    #[tokio::test]
    async fn test_empty_mailbox_is_no_matches_not_error() {
        let outcome = run_scan(ctx("any jd"), &FixedSource(Vec::new()))
            .await
            .unwrap();
        assert!(outcome.candidates.is_empty());
        assert_eq!(outcome.status, ScanStatus::NoMatches { scanned: 0 });
        assert_eq!(outcome.status.message(), "No resumes found.");
    }

    #[tokio::test]
    async fn test_corrupt_attachment_is_dropped_silently() {
        let corrupt = RawAttachment {
            filename: "broken.pdf".to_string(),
            bytes: Bytes::from_static(b"not a pdf at all"),
            sender: "x@example.com".to_string(),
            received: None,
        };
        let outcome = run_scan(ctx("any jd"), &FixedSource(vec![corrupt]))
            .await
            .unwrap();
        assert!(outcome.candidates.is_empty());
        assert_eq!(outcome.harvested, 1);
        assert_eq!(outcome.status, ScanStatus::NoMatches { scanned: 1 });
        assert!(outcome.status.message().contains("0 readable resumes"));
    }

    #[tokio::test]
    async fn test_candidates_ranked_descending_by_score() {
        let attachments = vec![
            docx_attachment(
                "weak.docx",
                &["Pastry chef with sourdough and croissant mastery over many seasons"],
            ),
            docx_attachment(
                "strong.docx",
                &["Python AWS engineer, 5 years of Python and AWS delivery"],
            ),
        ];
        let outcome = run_scan(
            ctx("Looking for Python AWS engineer, 5 years"),
            &FixedSource(attachments),
        )
        .await
        .unwrap();

        assert_eq!(outcome.candidates.len(), 2);
        assert_eq!(outcome.candidates[0].source_filename, "strong.docx");
        assert!(
            outcome.candidates[0].profile.match_score
                > outcome.candidates[1].profile.match_score
        );
        assert_eq!(outcome.status, ScanStatus::Success);
    }

    #[tokio::test]
    async fn test_tied_scores_keep_both_candidates_in_harvest_order() {
        let text = ["Python AWS engineer, 5 years of Python and AWS delivery"];
        let attachments = vec![
            docx_attachment("first.docx", &text),
            docx_attachment("second.docx", &text),
        ];
        let outcome = run_scan(
            ctx("Looking for Python AWS engineer, 5 years"),
            &FixedSource(attachments),
        )
        .await
        .unwrap();

        assert_eq!(outcome.candidates.len(), 2);
        assert_eq!(
            outcome.candidates[0].profile.match_score,
            outcome.candidates[1].profile.match_score
        );
        assert_eq!(outcome.candidates[0].source_filename, "first.docx");
        assert_eq!(outcome.candidates[1].source_filename, "second.docx");
    }

    #[tokio::test]
    async fn test_original_bytes_survive_the_pipeline() {
        let attachment = docx_attachment(
            "resume.docx",
            &["Python AWS engineer, 5 years of Python and AWS delivery"],
        );
        let original = attachment.bytes.clone();
        let outcome = run_scan(ctx("Python AWS"), &FixedSource(vec![attachment]))
            .await
            .unwrap();
        assert_eq!(outcome.candidates[0].bytes, original);
    }

    #[tokio::test]
    async fn test_heuristic_fields_present_without_llm() {
        let attachment = docx_attachment(
            "resume.docx",
            &["5+ years Python, AWS, Docker. john@example.com, +1 415 555 0100"],
        );
        let outcome = run_scan(
            ctx("Looking for Python AWS engineer, 5 years"),
            &FixedSource(vec![attachment]),
        )
        .await
        .unwrap();

        let profile = &outcome.candidates[0].profile;
        assert_eq!(profile.email, "john@example.com");
        assert_eq!(profile.experience, "5 Years");
        assert!(profile.match_score > 0);
    }
}
