//! Turning an analysis artifact into pull request comments.
//!
//! [`render::render_artifact`] reads the JSON artifact and produces one or
//! more Markdown bodies, falling back to a fixed notice when the artifact is
//! missing or broken. [`post::post_comments`] posts them in order.

pub mod post;
pub mod render;
pub mod split;

pub use post::{post_comments, CommentSink, PullRequestThread};
pub use render::{error_comment, render_artifact, render_markdown, NO_RESULTS_COMMENT};
pub use split::{split_comment, DEFAULT_COMMENT_LIMIT};
