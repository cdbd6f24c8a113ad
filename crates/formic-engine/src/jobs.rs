//! Job list ingestion: an ordered JSON array of targets. URL, company and
//! title are required; `source` is an optional platform hint.

use formic_common::protocol::JobTarget;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobsError {
    #[error("failed to read jobs file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse jobs file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("job #{index}: {problem}")]
    Invalid { index: usize, problem: String },
}

pub fn load_jobs(path: &Path) -> Result<Vec<JobTarget>, JobsError> {
    let content = std::fs::read_to_string(path)?;
    let jobs: Vec<JobTarget> = serde_json::from_str(&content)?;
    validate(&jobs)?;
    Ok(jobs)
}

fn validate(jobs: &[JobTarget]) -> Result<(), JobsError> {
    for (index, job) in jobs.iter().enumerate() {
        if job.url.trim().is_empty() {
            return Err(JobsError::Invalid {
                index,
                problem: "missing url".into(),
            });
        }
        if url::Url::parse(&job.url).is_err() {
            return Err(JobsError::Invalid {
                index,
                problem: format!("invalid url: {}", job.url),
            });
        }
        if job.company.trim().is_empty() || job.title.trim().is_empty() {
            return Err(JobsError::Invalid {
                index,
                problem: "company and title are required".into(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_job_list() {
        let json = r#"[
            {"url": "https://jobs.lever.co/acme/1", "company": "Acme", "title": "Engineer"},
            {"url": "https://boards.greenhouse.io/beta/2", "company": "Beta",
             "title": "Senior Engineer", "source": "greenhouse"}
        ]"#;
        let jobs: Vec<JobTarget> = serde_json::from_str(json).unwrap();
        validate(&jobs).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[1].source.as_deref(), Some("greenhouse"));
    }

    #[test]
    fn rejects_missing_company() {
        let json = r#"[{"url": "https://jobs.lever.co/acme/1", "company": "", "title": "X"}]"#;
        let jobs: Vec<JobTarget> = serde_json::from_str(json).unwrap();
        assert!(validate(&jobs).is_err());
    }

    #[test]
    fn rejects_bad_url() {
        let json = r#"[{"url": "not a url", "company": "Acme", "title": "X"}]"#;
        let jobs: Vec<JobTarget> = serde_json::from_str(json).unwrap();
        assert!(validate(&jobs).is_err());
    }
}
