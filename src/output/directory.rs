//! Archive directory publisher
//!
//! Writes every published post to disk: one directory per post under
//! `{archive_dir}/{channel_id}/`, holding `message.md` and, for oversized
//! posts, the attached body file. Every publish gets a new directory, the
//! same way a chat channel gets a new thread.

use crate::output::traits::{
    ForumTag, PublishError, PublishPayload, PublishRequest, PublishResult, Publisher,
    ThreadHandle,
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Name of the message file inside each post directory
pub const MESSAGE_FILE: &str = "message.md";

/// Publisher that archives posts to a local directory
pub struct DirectoryPublisher {
    root: PathBuf,
    tags: Vec<ForumTag>,
}

impl DirectoryPublisher {
    /// Creates a publisher writing below `root`
    ///
    /// # Arguments
    ///
    /// * `root` - Archive root directory, created on first publish
    /// * `tag_names` - Tag vocabulary offered for every channel; ids are
    ///   assigned from 1 in list order
    pub fn new(root: impl Into<PathBuf>, tag_names: &[String]) -> Self {
        let tags = tag_names
            .iter()
            .enumerate()
            .map(|(i, name)| ForumTag::new(i as u64 + 1, name.clone()))
            .collect();

        Self {
            root: root.into(),
            tags,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates a fresh directory for one post
    ///
    /// Names are not unique: two threads with the same title both have a
    /// `Gossip 3樓`. An existing directory is never reused, the next free
    /// `name (n)` is taken instead.
    async fn claim_post_dir(&self, channel_id: u64, name: &str) -> std::io::Result<PathBuf> {
        let channel_dir = self.root.join(channel_id.to_string());
        tokio::fs::create_dir_all(&channel_dir).await?;

        let base = sanitize_file_name(name);
        let mut attempt = 1u32;
        loop {
            let dir = if attempt == 1 {
                channel_dir.join(&base)
            } else {
                channel_dir.join(format!("{} ({})", base, attempt))
            };

            match tokio::fs::create_dir(&dir).await {
                Ok(()) => return Ok(dir),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl Publisher for DirectoryPublisher {
    async fn available_tags(&self, _channel_id: u64) -> PublishResult<Vec<ForumTag>> {
        Ok(self.tags.clone())
    }

    async fn publish(
        &self,
        channel_id: u64,
        request: PublishRequest,
    ) -> PublishResult<ThreadHandle> {
        if request.name.trim().is_empty() {
            return Err(PublishError::Rejected("empty thread name".to_string()));
        }

        let dir = self.claim_post_dir(channel_id, &request.name).await?;

        let message = format_message(&request);
        tokio::fs::write(dir.join(MESSAGE_FILE), message).await?;

        if let PublishPayload::Attached {
            file_name,
            file_body,
            ..
        } = &request.payload
        {
            tokio::fs::write(dir.join(sanitize_file_name(file_name)), file_body).await?;
        }

        tracing::debug!("Archived '{}' to {}", request.name, dir.display());
        Ok(ThreadHandle(dir.display().to_string()))
    }
}

/// Formats the message file of a published post
fn format_message(request: &PublishRequest) -> String {
    let mut md = String::new();

    md.push_str(&format!("# {}\n\n", request.name));

    if !request.applied_tags.is_empty() {
        let names: Vec<&str> = request
            .applied_tags
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        md.push_str(&format!("Tags: {}\n\n", names.join(", ")));
    }

    match &request.payload {
        PublishPayload::Inline { text } => md.push_str(text),
        PublishPayload::Attached {
            summary, file_name, ..
        } => {
            md.push_str(summary);
            md.push_str(&format!("\n\nAttachment: {}", file_name));
        }
    }
    md.push('\n');

    md
}

/// Replaces characters that are not allowed in file names
fn sanitize_file_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}
