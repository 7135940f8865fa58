//! Error page shown when the critical fetch fails.

/// Render a complete error document for `status`.
pub fn render_error_page(status: u16, request_id: &str) -> String {
    let message = if (400..500).contains(&status) {
        "We couldn't load this page for your request."
    } else {
        "Something went wrong on our end. Please try again shortly."
    };
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Error {status} | Wicked Works</title>
</head>
<body>
<main class="error-page" data-section="error">
    <h1>{status}</h1>
    <p>{message}</p>
    <p class="error-ref">Reference: {request_id}</p>
    <a href="/">Back to home</a>
</main>
</body>
</html>
"#,
        request_id = edge_streaming::escape_html(request_id),
    )
}
