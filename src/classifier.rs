/// The syntactic context a parameter reference appears in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Context {
    /// Plain value; becomes a single `?`.
    Scalar,
    /// `field IN :name` or `field NOT IN :name`.
    In { negated: bool },
    /// `field LIKE_ANY :name` or `field NOT LIKE_ANY :name`.
    ///
    /// `field_start` is the byte offset where the rewrite begins.
    LikeAny {
        field_start: usize,
        field: String,
        negated: bool,
    },
}

/// Returns the token ending right before `end`, skipping trailing whitespace.
///
/// Tokens are delimited by whitespace or `(`.
fn token_before(buf: &str, end: usize) -> (usize, &str) {
    let head = buf[..end].trim_end();
    let start = head
        .char_indices()
        .rev()
        .find(|&(_, c)| c.is_whitespace() || c == '(')
        .map_or(0, |(i, c)| i + c.len_utf8());
    (start, &head[start..])
}

/// Decides how the parameter starting at `marker_start` must be rewritten by
/// looking at the keyword in front of it.
pub fn classify(buf: &str, marker_start: usize) -> Context {
    let (keyword_start, keyword) = token_before(buf, marker_start);
    let like_any = if keyword.eq_ignore_ascii_case("IN") {
        false
    } else if keyword.eq_ignore_ascii_case("LIKE_ANY") {
        true
    } else {
        return Context::Scalar;
    };

    let (mut field_start, mut field) = token_before(buf, keyword_start);
    let negated = field.eq_ignore_ascii_case("NOT");
    if negated {
        (field_start, field) = token_before(buf, field_start);
    }
    if field.is_empty() {
        return Context::Scalar;
    }

    if like_any {
        Context::LikeAny {
            field_start,
            field: field.to_owned(),
            negated,
        }
    } else {
        Context::In { negated }
    }
}
