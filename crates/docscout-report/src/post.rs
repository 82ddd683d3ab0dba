use async_trait::async_trait;
use docscout_core::DocscoutError;
use docscout_github::GitHubClient;

/// Somewhere comment bodies can be posted.
#[async_trait]
pub trait CommentSink: Send + Sync {
    async fn post(&self, body: &str) -> Result<(), DocscoutError>;
}

/// The conversation of one pull request.
pub struct PullRequestThread<'a> {
    client: &'a GitHubClient,
    owner: String,
    repo: String,
    number: u64,
}

impl<'a> PullRequestThread<'a> {
    pub fn new(client: &'a GitHubClient, owner: &str, repo: &str, number: u64) -> Self {
        Self {
            client,
            owner: owner.to_string(),
            repo: repo.to_string(),
            number,
        }
    }
}

#[async_trait]
impl CommentSink for PullRequestThread<'_> {
    async fn post(&self, body: &str) -> Result<(), DocscoutError> {
        self.client
            .post_comment(&self.owner, &self.repo, self.number, body)
            .await
    }
}

/// Post `bodies` in order, stopping at the first failure.
///
/// Nothing is retried. Returns the number of comments posted.
///
/// # Errors
///
/// Returns the sink's error for the first comment that could not be posted.
pub async fn post_comments(sink: &dyn CommentSink, bodies: &[String]) -> Result<usize, DocscoutError> {
    let total = bodies.len();
    for (i, body) in bodies.iter().enumerate() {
        tracing::info!(part = i + 1, total, chars = body.chars().count(), "posting comment");
        sink.post(body).await?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        posted: Mutex<Vec<String>>,
        fail_on: Option<usize>,
    }

    #[async_trait]
    impl CommentSink for Recorder {
        async fn post(&self, body: &str) -> Result<(), DocscoutError> {
            let mut posted = self.posted.lock().unwrap();
            if self.fail_on == Some(posted.len()) {
                return Err(DocscoutError::GitHub("403 Resource not accessible".into()));
            }
            posted.push(body.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn posts_in_order() {
        let sink = Recorder::default();
        let bodies = vec!["one".to_string(), "**Part 2/2**\n\ntwo".to_string()];
        let count = post_comments(&sink, &bodies).await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(*sink.posted.lock().unwrap(), bodies);
    }

    #[tokio::test]
    async fn stops_at_first_failure() {
        let sink = Recorder {
            fail_on: Some(1),
            ..Recorder::default()
        };
        let bodies = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let err = post_comments(&sink, &bodies).await.unwrap_err();
        assert!(matches!(err, DocscoutError::GitHub(_)));
        assert_eq!(*sink.posted.lock().unwrap(), vec!["a".to_string()]);
    }
}
