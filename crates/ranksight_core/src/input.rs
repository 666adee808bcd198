use std::fmt;

use crate::status::JobKind;

/// Job-specific trigger parameters, validated locally before any network
/// call is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobInput {
    TopicalAuthority { topic: String },
    CompetitorAnalysis { competitor_url: String },
    Freshness { article_id: String },
    Publication { article_id: String },
}

impl JobInput {
    pub fn kind(&self) -> JobKind {
        match self {
            JobInput::TopicalAuthority { .. } => JobKind::TopicalAuthority,
            JobInput::CompetitorAnalysis { .. } => JobKind::CompetitorAnalysis,
            JobInput::Freshness { .. } => JobKind::Freshness,
            JobInput::Publication { .. } => JobKind::Publication,
        }
    }

    /// Minimal constraints checked before the trigger call. Anything the
    /// backend would reject for deeper reasons still goes through.
    pub fn validate(&self) -> Result<(), InputError> {
        match self {
            JobInput::TopicalAuthority { topic } => {
                if topic.trim().chars().count() < 2 {
                    return Err(InputError::TopicTooShort);
                }
            }
            JobInput::CompetitorAnalysis { competitor_url } => {
                let parsed =
                    url::Url::parse(competitor_url).map_err(|_| InputError::InvalidCompetitorUrl)?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(InputError::InvalidCompetitorUrl);
                }
            }
            JobInput::Freshness { article_id } | JobInput::Publication { article_id } => {
                if article_id.trim().is_empty() {
                    return Err(InputError::EmptyArticleId);
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    TopicTooShort,
    InvalidCompetitorUrl,
    EmptyArticleId,
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::TopicTooShort => write!(f, "Topic must be at least 2 characters"),
            InputError::InvalidCompetitorUrl => {
                write!(f, "Competitor URL must be an absolute http(s) URL")
            }
            InputError::EmptyArticleId => write!(f, "Article id must not be empty"),
        }
    }
}
