/*!
 * Cleanup of raw model output before it is written back into a chapter.
 *
 * Local models routinely echo parts of the prompt scaffolding, wrap the
 * translation in quotes, or reproduce fence markers. The sanitizer strips
 * the known artifacts; anything that survives empty is reported upstream as
 * a response-format failure.
 */

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

/// `<<<` / `>>>` fence markers the model might echo around the output.
static FENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<{2,3}\s*|\s*>{2,3}$").unwrap());

/// Leaked prompt scaffolding: everything up to and including a
/// "TEXT TO TRANSLATE:"-style marker, in the languages the prompt templates
/// have been observed to leak in.
static LEAK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)^.*(?:TEXT TO TRANSLATE|TESTO DA TRADURRE|TEXTE À TRADUIRE|TEXTO A TRADUCIR)\s*:\s*",
    )
    .unwrap()
});

/// Output longer than this multiple of the source is treated as a likely
/// context echo and logged.
const LENGTH_RATIO_LIMIT: usize = 20;

/// Clean a raw model response for the given source text.
///
/// Returns the best plain-text candidate; may be empty when the model
/// produced nothing usable, which the caller must treat as a failure.
pub fn sanitize_response(raw: &str, source_text: &str) -> String {
    let mut text = raw.trim().to_string();

    text = FENCE_RE.replace_all(&text, "").trim().to_string();

    if LEAK_RE.is_match(&text) {
        let stripped = LEAK_RE.replace(&text, "").trim().to_string();
        // A marker with nothing after it: keep the original so the report
        // shows what the model actually said.
        if !stripped.is_empty() {
            text = stripped;
        }
    }

    text = strip_wrapping_quotes(&text);

    let source_chars = source_text.chars().count();
    let result_chars = text.chars().count();
    if source_chars > 0
        && result_chars > 200
        && result_chars > source_chars * LENGTH_RATIO_LIMIT
    {
        warn!(
            "Response is {}x longer than source, possible context leak | source_len={} response_len={}",
            result_chars / source_chars.max(1),
            source_chars,
            result_chars
        );
    }

    text
}

/// Strip one layer of matching wrapping quotes
fn strip_wrapping_quotes(text: &str) -> String {
    let trimmed = text.trim();
    for (open, close) in [('"', '"'), ('\'', '\''), ('“', '”'), ('«', '»')] {
        if trimmed.chars().count() >= 2 && trimmed.starts_with(open) && trimmed.ends_with(close) {
            let mut chars = trimmed.chars();
            chars.next();
            chars.next_back();
            return chars.as_str().trim().to_string();
        }
    }
    trimmed.to_string()
}
