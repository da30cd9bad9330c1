use chrono::{DateTime, Duration, Utc};
use subscrape_core::{CoreError, PostRecord, UNKNOWN_AUTHOR};
use tracing::{debug, info};

use crate::api::{RedditApiClient, RedditListingChild, RedditPostData};

/// Hard cap on how much of the top listing is ever examined. Subreddits
/// whose all-time top is mostly older than the recency window will
/// undercount; the cap is a cost bound, not a completeness guarantee.
pub const CANDIDATE_SCAN_LIMIT: usize = 300;

/// At most this many records are kept per run.
pub const RESULT_LIMIT: usize = 100;

/// Posts older than this many days are dropped.
pub const RECENCY_WINDOW_DAYS: i64 = 180;

// Reddit serves at most 100 listing entries per request.
const PAGE_SIZE: usize = 100;

pub fn recency_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(RECENCY_WINDOW_DAYS)
}

/// Reddit reports creation time as fractional epoch seconds.
pub fn post_created_at(created_utc: f64) -> DateTime<Utc> {
    DateTime::from_timestamp(created_utc as i64, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

impl From<RedditPostData> for PostRecord {
    fn from(data: RedditPostData) -> Self {
        Self {
            created_at: post_created_at(data.created_utc),
            id: data.id,
            title: data.title,
            author: data.author.unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            body: data.selftext,
            score: data.score,
            comment_count: data.num_comments,
            url: data.url,
        }
    }
}

/// Collect the top posts of a subreddit created within the recency window.
///
/// Pages through the all-time top listing in rank order, examining at most
/// [`CANDIDATE_SCAN_LIMIT`] candidates, and stops as soon as
/// [`RESULT_LIMIT`] records have been kept or the listing runs out. The
/// reference time is a parameter so runs are reproducible.
pub async fn collect_top_posts(
    api: &RedditApiClient,
    access_token: &str,
    subreddit: &str,
    now: DateTime<Utc>,
) -> Result<Vec<PostRecord>, CoreError> {
    let cutoff = recency_cutoff(now);
    let mut records = Vec::with_capacity(RESULT_LIMIT);
    let mut seen = 0usize;
    let mut after: Option<String> = None;

    while seen < CANDIDATE_SCAN_LIMIT && records.len() < RESULT_LIMIT {
        let page_size = PAGE_SIZE.min(CANDIDATE_SCAN_LIMIT - seen) as u32;
        let listing = api
            .get_top_posts(access_token, subreddit, page_size, after.as_deref())
            .await?;

        let page = listing.data;
        if page.children.is_empty() {
            break;
        }

        // The server may return more entries than requested; never let a
        // page push the scan past the candidate cap.
        let mut children = page.children;
        children.truncate(CANDIDATE_SCAN_LIMIT - seen);

        seen += scan_page(children, cutoff, &mut records);
        debug!("Scanned {} candidates, kept {} so far", seen, records.len());

        after = page.after;
        if after.is_none() {
            break;
        }
    }

    info!(
        "Collected {} posts from r/{} within the last {} days",
        records.len(),
        subreddit,
        RECENCY_WINDOW_DAYS
    );
    Ok(records)
}

/// Walk one listing page in rank order, keeping entries created at or after
/// the cutoff until the result limit is hit. Returns how many entries were
/// examined.
pub fn scan_page(
    children: Vec<RedditListingChild<RedditPostData>>,
    cutoff: DateTime<Utc>,
    records: &mut Vec<PostRecord>,
) -> usize {
    let mut examined = 0;
    for child in children {
        if records.len() >= RESULT_LIMIT {
            break;
        }
        examined += 1;
        if post_created_at(child.data.created_utc) >= cutoff {
            records.push(PostRecord::from(child.data));
        }
    }
    examined
}
