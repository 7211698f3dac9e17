// src/ingest/filter.rs
//! Keyword relevance filter. Plain case-sensitive substring matching on titles,
//! no tokenization or folding.

use crate::model::{Announcement, KeywordSet};

/// Union of the global list and a target's own list. Blank entries are dropped.
pub fn merge_keywords<'a, G, T>(global: G, target: T) -> KeywordSet
where
    G: IntoIterator<Item = &'a String>,
    T: IntoIterator<Item = &'a String>,
{
    global
        .into_iter()
        .chain(target)
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Keywords from `keywords` that occur in `title`.
pub fn matched_keywords(title: &str, keywords: &KeywordSet) -> Vec<String> {
    keywords
        .iter()
        .filter(|kw| title.contains(kw.as_str()))
        .cloned()
        .collect()
}

/// Keep items whose title contains at least one keyword and attach the matches.
/// An empty keyword set lets everything through untouched.
pub fn filter(items: Vec<Announcement>, keywords: &KeywordSet) -> Vec<Announcement> {
    if keywords.is_empty() {
        return items;
    }
    items
        .into_iter()
        .filter_map(|mut a| {
            let hits = matched_keywords(&a.title, keywords);
            if hits.is_empty() {
                None
            } else {
                a.matched_keywords = hits;
                Some(a)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kws(list: &[&str]) -> KeywordSet {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn item(title: &str) -> Announcement {
        Announcement::new(title, format!("http://x/{title}"), "2024-01-01")
    }

    #[test]
    fn empty_keyword_set_passes_everything_unchanged() {
        let items = vec![item("小麦收购通知"), item("anything")];
        let out = filter(items.clone(), &KeywordSet::new());
        assert_eq!(out, items);
    }

    #[test]
    fn substring_match_attaches_keyword() {
        let out = filter(
            vec![item("国家粮食交易中心发布进口大豆竞价公告")],
            &kws(&["进口大豆"]),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].matched_keywords, vec!["进口大豆".to_string()]);
    }

    #[test]
    fn non_matching_title_is_excluded() {
        let out = filter(vec![item("小麦收购通知")], &kws(&["进口大豆"]));
        assert!(out.is_empty());
    }

    #[test]
    fn matching_is_case_sensitive() {
        let out = filter(vec![item("Soybean auction")], &kws(&["soybean"]));
        assert!(out.is_empty());
    }

    #[test]
    fn all_matching_keywords_are_reported() {
        let out = filter(vec![item("进口大豆竞价销售")], &kws(&["大豆", "竞价销售", "玉米"]));
        assert_eq!(out[0].matched_keywords, vec!["大豆", "竞价销售"]);
    }

    #[test]
    fn merge_is_a_set_union() {
        let global = vec!["进口大豆".to_string(), " ".to_string()];
        let target = vec!["大豆".to_string(), "进口大豆".to_string()];
        let merged = merge_keywords(&global, &target);
        assert_eq!(merged, kws(&["进口大豆", "大豆"]));
    }
}
