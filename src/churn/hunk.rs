use crate::error::{FleetError, Result};

/// One side of a hunk header. `count` defaults to 1 when the header
/// omits it, as in `@@ -1 +1,2 @@`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkRange {
    pub start: u64,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkHeader {
    pub old: HunkRange,
    pub new: HunkRange,
}

impl HunkHeader {
    /// Net size change of the hunk as `(added, deleted)`; at most one side
    /// is non-zero. A hunk that both adds and removes lines only counts
    /// the difference.
    pub fn net_delta(&self) -> (u64, u64) {
        if self.new.count > self.old.count {
            (self.new.count - self.old.count, 0)
        } else {
            (0, self.old.count - self.new.count)
        }
    }
}

pub fn parse_hunk_header(line: &str) -> Result<HunkHeader> {
    let malformed = || FleetError::HunkHeader(line.to_string());

    let rest = line.strip_prefix("@@ ").ok_or_else(malformed)?;
    let mut parts = rest.split(' ');
    let old = parts
        .next()
        .and_then(|p| p.strip_prefix('-'))
        .and_then(parse_range)
        .ok_or_else(malformed)?;
    let new = parts
        .next()
        .and_then(|p| p.strip_prefix('+'))
        .and_then(parse_range)
        .ok_or_else(malformed)?;
    if parts.next() != Some("@@") {
        return Err(malformed());
    }

    Ok(HunkHeader { old, new })
}

fn parse_range(range: &str) -> Option<HunkRange> {
    let (start, count) = match range.split_once(',') {
        Some((start, count)) => (start, count.parse().ok()?),
        None => (range, 1),
    };
    Some(HunkRange {
        start: start.parse().ok()?,
        count,
    })
}

/// Sums the net deltas of every hunk between two revisions.
pub fn pair_churn<S: AsRef<str>>(headers: &[S]) -> Result<(u64, u64)> {
    let mut added = 0;
    let mut deleted = 0;
    for header in headers {
        let (a, d) = parse_hunk_header(header.as_ref())?.net_delta();
        added += a;
        deleted += d;
    }
    Ok((added, deleted))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growing_hunk_counts_as_added() {
        let header = parse_hunk_header("@@ -1,5 +1,8 @@").unwrap();
        assert_eq!(header.net_delta(), (3, 0));
    }

    #[test]
    fn omitted_counts_default_to_one() {
        let header = parse_hunk_header("@@ -1 +1,2 @@").unwrap();
        assert_eq!(header.old, HunkRange { start: 1, count: 1 });
        assert_eq!(header.net_delta(), (1, 0));
    }

    #[test]
    fn shrinking_hunk_counts_as_deleted() {
        let header = parse_hunk_header("@@ -10,4 +10 @@").unwrap();
        assert_eq!(header.net_delta(), (0, 3));
    }

    #[test]
    fn section_heading_after_header_is_ignored() {
        let header = parse_hunk_header("@@ -3,2 +3,6 @@ fn main() {").unwrap();
        assert_eq!(header.net_delta(), (4, 0));
    }

    #[test]
    fn balanced_rewrite_is_approximated_as_no_churn() {
        let header = parse_hunk_header("@@ -1,4 +1,4 @@").unwrap();
        assert_eq!(header.net_delta(), (0, 0));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_hunk_header("diff --git a/x b/x").is_err());
        assert!(parse_hunk_header("@@ -a,b +1 @@").is_err());
        assert!(parse_hunk_header("@@ -1,2 +1,3").is_err());
    }

    #[test]
    fn pair_churn_sums_every_hunk() {
        let headers = ["@@ -0,0 +1,3 @@", "@@ -5,6 +8,2 @@", "@@ -20 +16,3 @@"];
        assert_eq!(pair_churn(&headers).unwrap(), (5, 4));
    }
}
