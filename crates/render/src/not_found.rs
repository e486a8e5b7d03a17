use askama::Template;

/// Built-in 404 page, used when the project has no `404` page of its own.
#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate<'a> {
    pub path: Option<&'a str>,
    pub home: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_and_escapes_path() {
        let html = NotFoundTemplate {
            path: Some("/<script>"),
            home: "/love/",
        }
        .render()
        .unwrap();

        assert!(html.contains("404: no valentine here"));
        assert!(html.contains("&#60;script&#62;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("Back home"));
    }

    #[test]
    fn test_without_path() {
        let html = NotFoundTemplate {
            path: None,
            home: "/",
        }
        .render()
        .unwrap();
        assert!(!html.contains("Nothing is served"));
    }
}
