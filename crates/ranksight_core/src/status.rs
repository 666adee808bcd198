/// Kinds of server-side jobs the client can trigger and poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum JobKind {
    TopicalAuthority,
    CompetitorAnalysis,
    Freshness,
    Publication,
}

impl JobKind {
    pub fn label(&self) -> &'static str {
        match self {
            JobKind::TopicalAuthority => "topical authority",
            JobKind::CompetitorAnalysis => "competitor analysis",
            JobKind::Freshness => "content freshness",
            JobKind::Publication => "publication status",
        }
    }
}

/// Canonical semantic phase every raw job status collapses to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    InFlight,
    Succeeded,
    Failed,
}

/// Collapses a job kind's raw status vocabulary to the canonical phases.
///
/// Each job domain reports its own vocabulary (`completed` vs `success`,
/// `analyzing` vs `processing`); this is the single place raw tokens are
/// compared. Unknown tokens are treated as in-flight so a server-side
/// vocabulary addition degrades to a soft-timeout instead of a spurious
/// failure.
pub fn normalize_status(kind: JobKind, raw: &str) -> Phase {
    match kind {
        JobKind::TopicalAuthority => match raw {
            "pending" | "processing" => Phase::InFlight,
            "completed" => Phase::Succeeded,
            "failed" => Phase::Failed,
            _ => Phase::InFlight,
        },
        JobKind::CompetitorAnalysis => match raw {
            "pending" | "analyzing" => Phase::InFlight,
            "completed" => Phase::Succeeded,
            "failed" => Phase::Failed,
            _ => Phase::InFlight,
        },
        JobKind::Freshness | JobKind::Publication => match raw {
            "pending" | "processing" => Phase::InFlight,
            "success" => Phase::Succeeded,
            "failed" => Phase::Failed,
            _ => Phase::InFlight,
        },
    }
}
