//! Standalone HTML page that draws a DOT graph in the browser.

use anyhow::{Context as _, Result};
use tera::{Context, Tera};

const GRAPH_TEMPLATE: &str = include_str!("templates/graph.html");

/// Embed `dot` into the graph page.
///
/// The DOT text is inserted as a JavaScript string literal, so quotes,
/// newlines and `</script>` sequences inside labels cannot break the page.
///
/// # Errors
///
/// Returns an error if the DOT text cannot be encoded or the template fails
/// to render.
pub fn render_html(dot: &str) -> Result<String> {
    let literal = serde_json::to_string(dot).context("Failed to encode graph as a script literal")?;

    let mut context = Context::new();
    context.insert("title", "tfvercheck dependency graph");
    context.insert("dot_literal", &literal.replace("</", "<\\/"));

    Tera::one_off(GRAPH_TEMPLATE, &context, false).context("Failed to render HTML graph page")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_is_embedded_as_string_literal() {
        let dot = "digraph G {\n\t\"a\" -> \"b\";\n}\n";
        let html = render_html(dot).unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(r#"const dot = "digraph G {\n\t\"a\" -> \"b\";\n}\n";"#));
        assert!(html.contains("renderDot(dot)"));
    }

    #[test]
    fn test_script_terminator_is_neutralised() {
        let html = render_html("digraph G { \"</script>\" }").unwrap();
        assert_eq!(html.matches("</script>").count(), 4);
        assert!(html.contains(r"<\/script>"));
    }
}
