//! Newsletter sign-up form.

use edge_streaming::escape_html;

use crate::newsletter::NewsletterStatus;

/// Render the sign-up section in the given state. `email` is echoed back
/// into the field on error.
pub fn render_newsletter(status: NewsletterStatus, email: &str) -> String {
    let message = match status {
        NewsletterStatus::Idle => String::new(),
        NewsletterStatus::Success => {
            r#"<p class="newsletter-message success" role="status">&#10003; Thanks for joining! Check your inbox.</p>"#
                .to_string()
        }
        NewsletterStatus::Error => {
            r#"<p class="newsletter-message error" role="alert">Something went wrong. Please try again.</p>"#
                .to_string()
        }
    };

    // A successful sign-up clears the field.
    let value = match status {
        NewsletterStatus::Error => escape_html(email),
        _ => String::new(),
    };

    format!(
        r#"<section class="newsletter" data-section="newsletter">
    <h2>Join the Movement</h2>
    <p>Stay updated with exclusive drops, deals, and behind-the-scenes content.</p>
    <form class="newsletter-form" method="post" action="/newsletter">
        <input type="email" name="email" placeholder="Enter your email" value="{value}" required>
        <button type="submit">Sign Up</button>
    </form>
    {message}
    <p class="newsletter-note">We respect your privacy. Unsubscribe at any time.</p>
</section>
"#
    )
}
