//! Turns accepted posts into publish requests

use crate::crawler::PostRecord;
use crate::output::traits::{ForumTag, PublishPayload, PublishRequest};

/// Largest combined footer and body length sent as a single message
pub const INLINE_LIMIT: usize = 2000;

/// Most tags a published thread can carry
pub const MAX_APPLIED_TAGS: usize = 5;

/// Line between the info footer and the body of an inline message
pub const SEPARATOR: &str = "\n-----------------------------------------\n";

/// File name of the attachment used for oversized posts
pub const ATTACHMENT_NAME: &str = "content.txt";

/// Builds the publish request for one post
///
/// # Arguments
///
/// * `post` - The accepted post, its title already resolved
/// * `vocabulary` - Tags the destination channel offers
pub fn package_post(post: &PostRecord, vocabulary: &[ForumTag]) -> PublishRequest {
    PublishRequest {
        name: thread_name(post),
        payload: build_payload(post),
        applied_tags: match_tags(vocabulary, &post.hashtags),
    }
}

/// `"{title} {floor}樓"`
pub fn thread_name(post: &PostRecord) -> String {
    format!("{} {}樓", post.title, post.floor)
}

/// Title, floor, author and permalink of a post
pub fn info_footer(post: &PostRecord) -> String {
    format!(
        "{} #{}\nAuthor: {}({})\n{}",
        post.title, post.floor, post.author.display_name, post.author.user_id, post.permalink
    )
}

/// Chooses between an inline message and an attachment
///
/// Lengths are counted in characters, not bytes. The separator does not
/// count toward the limit. Oversized bodies go out whole as a file.
pub fn build_payload(post: &PostRecord) -> PublishPayload {
    let footer = info_footer(post);
    let length = footer.chars().count() + post.body.chars().count();

    if length <= INLINE_LIMIT {
        PublishPayload::Inline {
            text: format!("{}{}{}", footer, SEPARATOR, post.body),
        }
    } else {
        PublishPayload::Attached {
            summary: footer,
            file_name: ATTACHMENT_NAME.to_string(),
            file_body: post.body.clone(),
        }
    }
}

/// Vocabulary tags named by any hashtag, in vocabulary order, at most five
pub fn match_tags(vocabulary: &[ForumTag], hashtags: &[String]) -> Vec<ForumTag> {
    vocabulary
        .iter()
        .filter(|tag| hashtags.iter().any(|h| *h == tag.name))
        .take(MAX_APPLIED_TAGS)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::Author;

    fn create_test_post(body: &str) -> PostRecord {
        PostRecord {
            floor: 7,
            title: "Gossip".to_string(),
            author: Author {
                display_name: "Alice".to_string(),
                user_id: "alice01".to_string(),
            },
            permalink: "https://forum.gamer.com.tw/Co.php?bsn=1&sn=7".to_string(),
            body: body.to_string(),
            hashtags: Vec::new(),
            approval_score: 0,
            disapproval_score: 0,
        }
    }

    /// Post whose footer plus body is exactly `total` characters long
    fn post_of_length(total: usize) -> PostRecord {
        let footer_len = info_footer(&create_test_post("")).chars().count();
        create_test_post(&"字".repeat(total - footer_len))
    }

    #[test]
    fn test_footer_and_name() {
        let post = create_test_post("body");
        assert_eq!(
            info_footer(&post),
            "Gossip #7\nAuthor: Alice(alice01)\nhttps://forum.gamer.com.tw/Co.php?bsn=1&sn=7"
        );
        assert_eq!(thread_name(&post), "Gossip 7樓");
    }

    #[test]
    fn test_inline_payload() {
        let post = create_test_post("short body");
        match build_payload(&post) {
            PublishPayload::Inline { text } => {
                assert!(text.starts_with("Gossip #7\n"));
                assert!(text.ends_with(&format!("{}short body", SEPARATOR)));
            }
            other => panic!("expected inline payload, got {:?}", other),
        }
    }

    #[test]
    fn test_limit_is_inclusive() {
        let post = post_of_length(INLINE_LIMIT);
        assert!(matches!(build_payload(&post), PublishPayload::Inline { .. }));
    }

    #[test]
    fn test_over_limit_is_attached_untruncated() {
        let post = post_of_length(INLINE_LIMIT + 1);
        match build_payload(&post) {
            PublishPayload::Attached {
                summary,
                file_name,
                file_body,
            } => {
                assert_eq!(summary, info_footer(&post));
                assert_eq!(file_name, ATTACHMENT_NAME);
                assert_eq!(file_body, post.body);
            }
            other => panic!("expected attachment, got {:?}", other),
        }
    }

    #[test]
    fn test_match_tags_vocabulary_order() {
        let vocabulary = vec![
            ForumTag::new(1, "news"),
            ForumTag::new(2, "VTuber"),
            ForumTag::new(3, "collab"),
        ];
        let hashtags = vec!["collab".to_string(), "VTuber".to_string(), "collab".to_string()];

        let tags = match_tags(&vocabulary, &hashtags);
        assert_eq!(tags, vec![ForumTag::new(2, "VTuber"), ForumTag::new(3, "collab")]);
    }

    #[test]
    fn test_match_tags_capped() {
        let vocabulary: Vec<ForumTag> = (0..8).map(|i| ForumTag::new(i, format!("t{}", i))).collect();
        let hashtags: Vec<String> = (0..8).rev().map(|i| format!("t{}", i)).collect();

        let tags = match_tags(&vocabulary, &hashtags);
        assert_eq!(tags.len(), MAX_APPLIED_TAGS);
        assert_eq!(tags[0].name, "t0");
        assert_eq!(tags[4].name, "t4");
    }

    #[test]
    fn test_package_post() {
        let mut post = create_test_post("#VTuber night");
        post.hashtags = vec!["VTuber".to_string()];
        let request = package_post(&post, &[ForumTag::new(9, "VTuber")]);

        assert_eq!(request.name, "Gossip 7樓");
        assert_eq!(request.applied_tags, vec![ForumTag::new(9, "VTuber")]);
    }
}
