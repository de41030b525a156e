//! HTML rendering. Every interpolated value goes through [`escape`].

use crate::recommend::RecommendationResult;

pub const LANDING_MESSAGE: &str = "Welcome to the Movie Recommender API!";

/// Which form a page belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Recommend,
    Explain,
}

impl FormKind {
    pub fn action(self) -> &'static str {
        match self {
            FormKind::Recommend => "/recommend_movies",
            FormKind::Explain => "/recommend_movies_llm",
        }
    }

    fn heading(self) -> &'static str {
        match self {
            FormKind::Recommend => "Find similar movies",
            FormKind::Explain => "Find similar movies, explained",
        }
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; max-width: 48rem; margin: 2rem auto; padding: 0 1rem; }}
textarea {{ width: 100%; }}
table {{ border-collapse: collapse; }}
td, th {{ border-bottom: 1px solid #ddd; padding: 0.3rem 0.8rem; text-align: left; }}
.error {{ color: #b00020; }}
.narrative {{ white-space: pre-wrap; }}
</style>
</head>
<body>
{body}
</body>
</html>
"#,
        title = escape(title),
        body = body
    )
}

pub fn landing() -> String {
    layout(
        "Movie Recommender",
        &format!(
            r#"<h1>{}</h1>
<ul>
<li><a href="/recommend_movies">Recommend movies</a></li>
<li><a href="/recommend_movies_llm">Recommend movies with explanations</a></li>
</ul>"#,
            LANDING_MESSAGE
        ),
    )
}

/// The input form, optionally with an error and the previous input.
pub fn form(kind: FormKind, error: Option<&str>, description: &str, count: &str) -> String {
    layout(kind.heading(), &form_body(kind, error, description, count))
}

fn form_body(kind: FormKind, error: Option<&str>, description: &str, count: &str) -> String {
    let error = error
        .map(|e| format!(r#"<p class="error">{}</p>"#, escape(e)))
        .unwrap_or_default();
    let count = if count.is_empty() { "5" } else { count };
    format!(
        r#"<h1>{heading}</h1>
{error}
<form method="post" action="{action}">
<p><label for="description">Describe your ideal movie</label></p>
<p><textarea id="description" name="description" rows="5">{description}</textarea></p>
<p><label for="num_recommendations">Number of recommendations</label>
<input id="num_recommendations" name="num_recommendations" type="number" min="1" value="{count}"></p>
<p><button type="submit">Recommend</button></p>
</form>
<p><a href="/">Home</a></p>"#,
        heading = escape(kind.heading()),
        error = error,
        action = kind.action(),
        description = escape(description),
        count = escape(count),
    )
}

fn results_table(results: &[RecommendationResult]) -> String {
    let mut rows = String::new();
    for (rank, rec) in results.iter().enumerate() {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:.4}</td></tr>\n",
            rank + 1,
            escape(&rec.movie.title),
            escape(rec.movie.release_year().unwrap_or("")),
            rec.distance
        ));
    }
    format!(
        "<table>\n<tr><th>#</th><th>Title</th><th>Year</th><th>Distance</th></tr>\n{}</table>",
        rows
    )
}

pub fn recommendations(description: &str, count: &str, results: &[RecommendationResult]) -> String {
    let body = format!(
        "<h2>Results for \u{201c}{}\u{201d}</h2>\n{}\n<hr>\n{}",
        escape(description),
        results_table(results),
        form_body(FormKind::Recommend, None, description, count)
    );
    layout("Recommendations", &body)
}

pub fn explanation(
    description: &str,
    count: &str,
    narrative: &str,
    results: &[RecommendationResult],
) -> String {
    let body = format!(
        "<h2>Recommendations for \u{201c}{}\u{201d}</h2>\n<div class=\"narrative\">{}</div>\n<h3>Retrieved movies</h3>\n{}\n<hr>\n{}",
        escape(description),
        escape(narrative),
        results_table(results),
        form_body(FormKind::Explain, None, description, count)
    );
    layout("Recommendations", &body)
}

pub fn error_page(message: &str) -> String {
    layout(
        "Error",
        &format!(
            r#"<h1>Something went wrong</h1>
<p class="error">{}</p>
<p><a href="/">Home</a></p>"#,
            escape(message)
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<script>alert("x & 'y'")</script>"#),
            "&lt;script&gt;alert(&quot;x &amp; &#39;y&#39;&quot;)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_form_keeps_input_escaped() {
        let html = form(FormKind::Explain, Some("bad <count>"), "<b>pirates</b>", "3");
        assert!(html.contains(r#"action="/recommend_movies_llm""#));
        assert!(html.contains("&lt;b&gt;pirates&lt;/b&gt;"));
        assert!(html.contains("bad &lt;count&gt;"));
        assert!(html.contains(r#"value="3""#));
    }

    #[test]
    fn test_landing_links() {
        let html = landing();
        assert!(html.contains(LANDING_MESSAGE));
        assert!(html.contains(r#"href="/recommend_movies""#));
        assert!(html.contains(r#"href="/recommend_movies_llm""#));
    }
}
