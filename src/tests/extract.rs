use crate::api::models::RecordId;
use crate::error::DnsError;
use crate::session::extract::*;
use std::fs;
use tempfile::TempDir;

fn page(scripts: &[&str]) -> String {
    let mut html = String::from("<html><head><title>mydomain.io</title></head><body>\n");
    for script in scripts {
        html.push_str("<script type=\"text/javascript\">\n");
        html.push_str(script);
        html.push_str("\n</script>\n");
    }
    html.push_str("<table class=\"table\"></table></body></html>\n");
    html
}

fn extractor() -> (TempDir, RecordExtractor) {
    let dir = TempDir::new().unwrap();
    let extractor = RecordExtractor::new(dir.path().join("dump.html"));
    (dir, extractor)
}

#[test]
fn test_simple_block() {
    let (_dir, extractor) = extractor();
    let html = page(&[
        r#"    var records = [{"id":1,"type":"A","name":"myrecord","content":"1.2.3.4","ttl":10800},{"id":2,"type":"MX","name":"@","content":"mx.mydomain.io","ttl":3600,"prio":10}];"#,
    ]);

    let records = extractor.extract(&html).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name, "myrecord");
    assert_eq!(records[0].id, RecordId::Number(1));
    assert_eq!(records[1].record_type, "MX");
    assert_eq!(records[1].extra.get("prio"), Some(&serde_json::json!(10)));
    assert!(records.iter().all(|r| r.name != "no_domain"));
}

#[test]
fn test_no_semicolon() {
    let (_dir, extractor) = extractor();
    let html = page(&[
        r#"var records = [{"id":1,"type":"A","name":"myrecord","content":"1.2.3.4","ttl":10800}]"#,
    ]);

    let records = extractor.extract(&html).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "myrecord");
}

#[test]
fn test_spaces_after_semicolon() {
    let (_dir, extractor) = extractor();
    let html = page(&[
        "var records = [{\"id\":1,\"type\":\"A\",\"name\":\"myrecord\",\"content\":\"1.2.3.4\",\"ttl\":10800}];    \t",
    ]);

    let records = extractor.extract(&html).unwrap();
    assert_eq!(records[0].name, "myrecord");
}

#[test]
fn test_dkim_with_semicolons() {
    let (_dir, extractor) = extractor();
    let html = page(&[
        r#"var records = [{"id":1,"type":"TXT","name":"myrecord","content":"v=DKIM1; k=rsa; p=MIGfMA0GCSqGSIb3DQEBAQUAA4GNADCBiQKBgQC","ttl":10800}];"#,
    ]);

    let records = extractor.extract(&html).unwrap();
    assert_eq!(records[0].content, "v=DKIM1; k=rsa; p=MIGfMA0GCSqGSIb3DQEBAQUAA4GNADCBiQKBgQC");
}

#[test]
fn test_dkim_with_slashes() {
    let (_dir, extractor) = extractor();
    let html = page(&[
        r#"var records = [{"id":1,"type":"TXT","name":"myrecord","content":"v=DKIM1; p=ab\/cd","ttl":10800}];"#,
    ]);

    let records = extractor.extract(&html).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "myrecord");
    assert_eq!(records[0].content, "v=DKIM1; p=ab/cd");
}

#[test]
fn test_stray_backslashes_are_kept() {
    let (_dir, extractor) = extractor();
    let html = page(&[
        r#"  var records = [{"id":"abc","type":"TXT","name":"myrecord","content":"p=ab\+cd\;ef/gh","ttl":300}]   "#,
    ]);

    let records = extractor.extract(&html).unwrap();
    assert_eq!(records[0].id, RecordId::Text("abc".to_string()));
    assert_eq!(records[0].content, r"p=ab\+cd\;ef/gh");
}

#[test]
fn test_multiple_blocks_in_document_order() {
    let (_dir, extractor) = extractor();
    let html = page(&[
        r#"var records = [{"id":1,"type":"A","name":"simple","content":"1.2.3.4","ttl":10800}];"#,
        "var unrelated = 42;",
        r#"var records = [{"id":2,"type":"TXT","name":"complex","content":"v=DKIM1; p=a\/b\=","ttl":10800}]"#,
    ]);

    let records = extractor.extract(&html).unwrap();
    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["simple", "complex"]);
}

#[test]
fn test_partially_broken_blocks() {
    let (dir, extractor) = extractor();
    let html = page(&[
        r#"var records = [{"id":1,"type":"A","name":"broken","content":"1.2.3.4",ttl:}];"#,
        r#"var records = [{"id":2,"type":"A","name":"valid_record","content":"1.2.3.4","ttl":10800}];"#,
    ]);

    let records = extractor.extract(&html).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "valid_record");
    assert!(!dir.path().join("dump.html").exists());
}

#[test]
fn test_block_with_one_bad_record_is_dropped_whole() {
    let (_dir, extractor) = extractor();
    let html = page(&[
        r#"var records = [{"id":1,"type":"A","name":"first","content":"1.2.3.4","ttl":10800},{"id":2,"name":"no_type","ttl":1}];"#,
        r#"var records = [{"id":3,"type":"A","name":"simple","content":"1.2.3.4","ttl":10800}];"#,
    ]);

    let records = extractor.extract(&html).unwrap();
    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["simple"]);
}

#[test]
fn test_completely_broken_writes_dump() {
    let (dir, extractor) = extractor();
    let html = page(&[r#"var records = [{"id":1,"type":"A","name":"broken",}, oops;"#]);

    match extractor.extract(&html) {
        Err(DnsError::ExtractionFailed {
            dump_path: Some(dump_path),
        }) => {
            assert_eq!(dump_path, dir.path().join("dump.html"));
            assert_eq!(fs::read_to_string(dump_path).unwrap(), html);
        }
        other => panic!("expected ExtractionFailed, got {:?}", other),
    }
}

#[test]
fn test_unwritable_dump_still_fails_extraction() {
    let dir = TempDir::new().unwrap();
    let extractor = RecordExtractor::new(dir.path().join("missing").join("dump.html"));
    let html = page(&[r#"var records = [{"id":1,,}];"#]);

    let result = extractor.extract(&html);
    assert!(matches!(
        result,
        Err(DnsError::ExtractionFailed { dump_path: None })
    ));
    let message = result.unwrap_err().to_string();
    assert!(message.contains("saving the page for debugging failed"));
}

#[test]
fn test_inline_declaration_after_other_statement() {
    let (_dir, extractor) = extractor();
    let html = r#"<html><body><script>window.domain = "x.io"; var records = [{"id":1,"type":"A","name":"inline","content":"1.2.3.4","ttl":10800}];</script></body></html>"#;

    let records = extractor.extract(html).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "inline");
}

#[test]
fn test_statement_after_array_on_same_line() {
    let (_dir, extractor) = extractor();
    let html = page(&[
        r#"var records = [{"id":1,"type":"TXT","name":"myrecord","content":"v=DKIM1; k=rsa; p=a]b[c\/d","ttl":10800}]; render(records);"#,
    ]);

    let records = extractor.extract(&html).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].content, "v=DKIM1; k=rsa; p=a]b[c/d");
}

#[test]
fn test_multiline_array_literal() {
    let (_dir, extractor) = extractor();
    let html = page(&[
        r#"var records = [
  {"id":1,"type":"A","name":"www","content":"1.2.3.4","ttl":300},
  {"id":2,"type":"A","name":"api","content":"1.2.3.5","ttl":300}
];"#,
    ]);

    let names: Vec<String> = extractor
        .extract(&html)
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["www", "api"]);
}

#[test]
fn test_no_records_block_is_empty_not_error() {
    let (dir, extractor) = extractor();
    let html = page(&["var other = [1, 2, 3];", "console.log('records = none');"]);

    let records = extractor.extract(&html).unwrap();
    assert!(records.is_empty());
    assert!(!dir.path().join("dump.html").exists());
}

#[test]
fn test_declaration_outside_script_is_ignored() {
    let (_dir, extractor) = extractor();
    let html = r#"<html><body><pre>var records = [{"id":1}];</pre></body></html>"#;
    assert!(extractor.extract(html).unwrap().is_empty());
}

#[test]
fn test_locate_segments_strips_declaration() {
    let html = page(&[
        "let records = [];   ",
        "  const records=[{\"id\":1}]",
        "init(); var records = [[1], \"]\"]; done();",
    ]);
    assert_eq!(
        locate_segments(&html),
        vec!["[]", "[{\"id\":1}]", "[[1], \"]\"]"]
    );
}

#[test]
fn test_parse_segment_outcomes() {
    assert_eq!(parse_segment("[]"), BlockOutcome::Parsed(vec![]));
    assert_eq!(parse_segment("{\"a\":1}"), BlockOutcome::NotAList);
    assert!(matches!(parse_segment("[{"), BlockOutcome::Failed(_)));
}

#[test]
fn test_normalize_escapes() {
    assert_eq!(normalize_escapes(r#"a\/b"#), r#"a\/b"#);
    assert_eq!(normalize_escapes(r#"a\"b\\c\n"#), r#"a\"b\\c\n"#);
    assert_eq!(normalize_escapes(r#"é"#), r#"é"#);
    assert_eq!(normalize_escapes(r#"\u00g9"#), r#"\\u00g9"#);
    assert_eq!(normalize_escapes(r#"a\;b\"#), r#"a\\;b\\"#);
}
