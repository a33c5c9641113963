//! "Posts you might like" selection.

use rand::{Rng, seq::SliceRandom};

use crate::domain::{posts::Post, types::RelatedPostsStrategy};

/// Select up to `count` posts related to the one at `current_slug`.
///
/// The current post never appears in the result. The tag-overlap strategy
/// falls back to a random sample when nothing shares a tag.
pub fn select_related<R>(
    strategy: RelatedPostsStrategy,
    posts: &[Post],
    current_slug: &str,
    target_tags: &[String],
    count: usize,
    rng: &mut R,
) -> Vec<Post>
where
    R: Rng + ?Sized,
{
    match strategy {
        RelatedPostsStrategy::TagOverlap => {
            let ranked = select_by_tag_overlap(posts, current_slug, target_tags, count);
            if ranked.is_empty() {
                sample_random(posts, current_slug, count, rng)
            } else {
                ranked
            }
        }
        RelatedPostsStrategy::Random => sample_random(posts, current_slug, count, rng),
    }
}

/// Posts sharing at least one tag with `target_tags`, most shared first.
/// Ties keep input order.
pub fn select_by_tag_overlap(
    posts: &[Post],
    current_slug: &str,
    target_tags: &[String],
    count: usize,
) -> Vec<Post> {
    let mut scored: Vec<(usize, &Post)> = posts
        .iter()
        .filter(|post| post.slug != current_slug)
        .map(|post| (overlap(post, target_tags), post))
        .filter(|(score, _)| *score > 0)
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
        .into_iter()
        .take(count)
        .map(|(_, post)| post.clone())
        .collect()
}

fn overlap(post: &Post, target_tags: &[String]) -> usize {
    target_tags.iter().filter(|tag| post.has_tag(tag)).count()
}

pub fn sample_random<R>(posts: &[Post], current_slug: &str, count: usize, rng: &mut R) -> Vec<Post>
where
    R: Rng + ?Sized,
{
    let candidates: Vec<&Post> = posts
        .iter()
        .filter(|post| post.slug != current_slug)
        .collect();

    candidates
        .choose_multiple(rng, count)
        .map(|post| (*post).clone())
        .collect()
}
