//! Terminal rendering of a finished review

use std::io::Write;

use crate::review::Review;

const SEPARATOR_WIDTH: usize = 60;

/// Render the banner, the model's text unmodified, and a closing separator
pub fn render(review: &Review) -> String {
    let separator = "=".repeat(SEPARATOR_WIDTH);
    format!(
        "\n{sep}\n  CODE REVIEW: {file}\n  Model: {model}\n{sep}\n\n{text}\n\n{sep}\n\n",
        sep = separator,
        file = review.file_name,
        model = review.model,
        text = review.text,
    )
}

/// Write the rendered report to `out` in one call
pub fn write_report(review: &Review, out: &mut impl Write) -> std::io::Result<()> {
    out.write_all(render(review).as_bytes())?;
    out.flush()
}
