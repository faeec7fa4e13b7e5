//! Reading a cached body window by window reproduces it exactly.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use mailvault_core::cache::CacheLedger;
use mailvault_core::content::ContentStore;
use mailvault_core::{BodyFormat, BodySource, Email};
use proptest::prelude::*;

fn store(root: &std::path::Path) -> ContentStore {
    let ledger = Arc::new(CacheLedger::open(root.join("cache_metadata.yaml"), u64::MAX).unwrap());
    ContentStore::new(root.join("emails"), ledger)
}

fn read_all(store: &ContentStore, id: &str, format: BodyFormat, limit: u64) -> (String, BodySource) {
    let mut offset = 0;
    let mut out = String::new();
    loop {
        let chunk = store.read_chunk(id, format, offset, limit).unwrap();
        out.push_str(&chunk.content);
        offset += chunk.length;
        if chunk.is_complete {
            assert_eq!(offset, chunk.total_size);
            return (out, chunk.source);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn text_body_reassembles(body in "[a-zé€ \n]{1,400}", limit in 1u64..64) {
        let root = tempfile::tempdir().unwrap();
        let store = store(root.path());
        let email = Email {
            message_id: "<p@example.com>".into(),
            from: "a@example.com".into(),
            body: body.clone(),
            ..Email::default()
        };
        store.save(&email, "Work").unwrap();

        let (text, source) = read_all(&store, "<p@example.com>", BodyFormat::Text, limit);
        prop_assert_eq!(text, body);
        prop_assert_eq!(source, BodySource::TextBody);
    }
}

#[test]
fn html_only_message_reads_as_converted_text() {
    let root = tempfile::tempdir().unwrap();
    let store = store(root.path());
    let html = "<h1>Quarterly update</h1><p>Revenue is <b>up</b>.</p>";
    let email = Email {
        message_id: "<h@example.com>".into(),
        from: "a@example.com".into(),
        html_body: html.into(),
        ..Email::default()
    };
    store.save(&email, "Work").unwrap();

    let (text, source) = read_all(&store, "<h@example.com>", BodyFormat::Text, 7);
    assert_eq!(source, BodySource::HtmlConverted);
    assert!(text.contains("Quarterly update"), "{text}");
    assert!(!text.contains("<p>"), "{text}");

    let (raw, source) = read_all(&store, "<h@example.com>", BodyFormat::RawHtml, 5);
    assert_eq!(source, BodySource::HtmlBody);
    assert_eq!(raw, html);
}
