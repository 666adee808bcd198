use sha2::{Digest, Sha256};

/// Backend-issued stable identifier for one suggestion.
pub type SuggestionId = String;

/// How the backend located the anchor text when the suggestion was
/// generated. The document may have been edited since, so this also decides
/// how aggressively [`locate_anchor`] re-searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    Exact,
    CaseInsensitive,
}

/// One text-anchored link suggestion.
///
/// `position` is a character offset into the document content the backend
/// generated against. It is a hint, not ground truth: rendering must
/// re-locate the anchor via [`locate_anchor`] before trusting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub id: SuggestionId,
    pub anchor_text: String,
    pub url: String,
    pub reason: String,
    pub position: usize,
    pub match_type: MatchType,
    pub is_applied: bool,
}

/// A link already present in the document; read-only context for rendering
/// and duplicate detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingLink {
    pub anchor_text: String,
    pub url: String,
}

/// Cache key for one suggestion set. `include_external` is part of the key:
/// flipping it addresses a different backend computation, not a filter over
/// one entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SetKey {
    pub blog_id: String,
    pub article_id: String,
    pub include_external: bool,
}

/// An ordered suggestion collection as returned by the backend, partitioned
/// into internal and external link suggestions plus existing links.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SuggestionSet {
    pub internal: Vec<Suggestion>,
    pub external: Vec<Suggestion>,
    pub existing: Vec<ExistingLink>,
    /// True when the backend served a previously stored result instead of a
    /// fresh computation.
    pub cached: bool,
    /// Fingerprint of the document content the positions were generated
    /// against, when the host captured one at load time.
    pub document_fingerprint: Option<String>,
}

impl SuggestionSet {
    pub fn iter(&self) -> impl Iterator<Item = &Suggestion> {
        self.internal.iter().chain(self.external.iter())
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Suggestion> {
        self.internal.iter_mut().chain(self.external.iter_mut())
    }

    pub fn find(&self, id: &str) -> Option<&Suggestion> {
        self.iter().find(|s| s.id == id)
    }

    /// Sets the applied flag on the matching suggestion. Returns false when
    /// the id is not in this set.
    pub fn toggle(&mut self, id: &str, applied: bool) -> bool {
        match self.iter_mut().find(|s| s.id == id) {
            Some(suggestion) => {
                suggestion.is_applied = applied;
                true
            }
            None => false,
        }
    }

    /// Marks every suggestion in both lists as applied. Acts on the loaded
    /// set only; it is not a request for suggestions not yet fetched.
    /// Returns how many flags changed.
    pub fn apply_all(&mut self) -> usize {
        let mut changed = 0;
        for suggestion in self.iter_mut() {
            if !suggestion.is_applied {
                suggestion.is_applied = true;
                changed += 1;
            }
        }
        changed
    }

    pub fn applied_count(&self) -> usize {
        self.iter().filter(|s| s.is_applied).count()
    }

    pub fn len(&self) -> usize {
        self.internal.len() + self.external.len()
    }

    pub fn is_empty(&self) -> bool {
        self.internal.is_empty() && self.external.is_empty()
    }

    /// True when the suggestion's target already appears in the document's
    /// existing links (after URL normalization).
    pub fn is_duplicate_of_existing(&self, suggestion: &Suggestion) -> bool {
        let Some(target) = normalize_link_for_dedupe(&suggestion.url) else {
            return false;
        };
        self.existing
            .iter()
            .filter_map(|link| normalize_link_for_dedupe(&link.url))
            .any(|existing| existing == target)
    }
}

/// Sha-256 fingerprint of document content, used to detect that suggestion
/// positions were generated against a different document version.
pub fn document_fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Re-locates a suggestion's anchor text in the live document.
///
/// The recorded position is tried first; if the document changed since
/// generation the anchor is searched for again, case-insensitively as a
/// last resort when the suggestion allows it. Returns the character offset
/// of the anchor, or `None` when the anchor no longer exists.
pub fn locate_anchor(document: &str, suggestion: &Suggestion) -> Option<usize> {
    let anchor = suggestion.anchor_text.as_str();
    if anchor.is_empty() {
        return None;
    }

    if let Some(byte) = byte_offset_for_char(document, suggestion.position) {
        if document[byte..].starts_with(anchor) {
            return Some(suggestion.position);
        }
    }

    match suggestion.match_type {
        MatchType::Exact => find_char_offset(document, anchor),
        MatchType::CaseInsensitive => {
            find_char_offset(document, anchor).or_else(|| find_char_offset_ci(document, anchor))
        }
    }
}

fn byte_offset_for_char(document: &str, char_offset: usize) -> Option<usize> {
    if char_offset == 0 {
        return Some(0);
    }
    document.char_indices().nth(char_offset).map(|(byte, _)| byte)
}

fn find_char_offset(document: &str, anchor: &str) -> Option<usize> {
    document
        .find(anchor)
        .map(|byte| document[..byte].chars().count())
}

fn find_char_offset_ci(document: &str, anchor: &str) -> Option<usize> {
    // Offsets are computed in the lowercased text; for the rare characters
    // whose lowercase form changes length this stays a hint, which is all
    // positions ever are.
    let document_lower = document.to_lowercase();
    let anchor_lower = anchor.to_lowercase();
    document_lower
        .find(&anchor_lower)
        .map(|byte| document_lower[..byte].chars().count())
}

/// Normalizes a link target for duplicate detection: http(s) only, fragment
/// dropped, trailing slash trimmed. Scheme and host are already lowercased
/// by the URL parser.
pub fn normalize_link_for_dedupe(raw: &str) -> Option<String> {
    let mut parsed = url::Url::parse(raw).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    parsed.set_fragment(None);

    let host = parsed.host_str()?;
    let mut normalized = format!("{}://{}", parsed.scheme(), host);
    if let Some(port) = parsed.port() {
        normalized.push_str(&format!(":{port}"));
    }
    normalized.push_str(parsed.path().trim_end_matches('/'));
    if let Some(query) = parsed.query() {
        normalized.push('?');
        normalized.push_str(query);
    }
    Some(normalized)
}
