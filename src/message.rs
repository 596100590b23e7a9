// src/message.rs
use crate::categorize::{Bucket, Buckets};

pub const BANNER: &str = "🚨 **AI Tech Updates**";

/// Build the message body, or `None` when there is nothing to report.
///
/// Non-empty buckets appear in display order as header + lines + one blank
/// spacer; the final spacer is dropped.
pub fn assemble(buckets: &Buckets) -> Option<String> {
    let mut blocks: Vec<&str> = Vec::new();
    for bucket in Bucket::DISPLAY_ORDER {
        let lines = buckets.get(bucket);
        if lines.is_empty() {
            continue;
        }
        blocks.push(bucket.header());
        blocks.extend(lines.iter().map(String::as_str));
        blocks.push("");
    }

    if blocks.last() == Some(&"") {
        blocks.pop();
    }
    if blocks.is_empty() {
        return None;
    }

    Some(format!("{BANNER}\n\n{}", blocks.join("\n")))
}
