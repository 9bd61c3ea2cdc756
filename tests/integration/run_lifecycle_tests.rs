/*!
 * Full run lifecycle tests: load, translate, aggregate, decide, persist.
 */

use std::path::Path;

use epubtrans::app_controller::Controller;
use epubtrans::epub;
use epubtrans::providers::mock::MockTranslator;

fn read_report(path: &Path) -> serde_json::Value {
    let raw = std::fs::read_to_string(path).expect("report should exist");
    serde_json::from_str(&raw).expect("report should be valid JSON")
}

#[tokio::test]
async fn test_run_commit_shouldWriteOutputAndReport() {
    crate::common::init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let input = crate::common::write_test_epub(
        dir.path(),
        &[
            ("ch1.xhtml", "<p>Hello</p><p>World</p>"),
            ("ch2.xhtml", "<p>Hello</p>"),
        ],
    );
    let output = dir.path().join("out.epub");
    let report_path = dir.path().join("out.epub.report.json");

    let translator = MockTranslator::with_dictionary(&[("Hello", "Bonjour"), ("World", "Monde")]);
    let controller = Controller::with_config(crate::common::test_config()).unwrap();
    let summary = controller
        .run_with_translator(&translator, &input, &output, &report_path)
        .await
        .unwrap();

    assert!(summary.output_written);
    assert_eq!(summary.failures, 0);
    assert_eq!(summary.exit_code, 0);
    assert!(output.is_file());

    let report = read_report(&report_path);
    assert_eq!(report["output_written"], true);
    assert_eq!(report["totals"]["chapters"], 2);
    assert_eq!(report["totals"]["nodes_changed"], 3);
    assert_eq!(report["totals"]["nodes_failed"], 0);

    // The transformed book still loads, and its prose is translated.
    let book = epub::load(&output).unwrap();
    let chapter =
        String::from_utf8(book.item("OEBPS/ch1.xhtml").unwrap().to_vec()).unwrap();
    assert!(chapter.contains("<p>Bonjour</p><p>Monde</p>"));
}

#[tokio::test]
async fn test_run_abortOnErrorWithFailures_shouldSuppressOutput() {
    let dir = tempfile::tempdir().unwrap();
    let input = crate::common::write_test_epub(dir.path(), &[("ch1.xhtml", "<p>Hello</p>")]);
    let output = dir.path().join("out.epub");
    let report_path = dir.path().join("report.json");

    let mut config = crate::common::test_config();
    config.abort_on_error = true;

    let translator = MockTranslator::failing_transient();
    let controller = Controller::with_config(config).unwrap();
    let summary = controller
        .run_with_translator(&translator, &input, &output, &report_path)
        .await
        .unwrap();

    assert!(!summary.output_written);
    assert_eq!(summary.exit_code, 2);
    assert_eq!(summary.failures, 1);
    assert!(!output.exists());

    // The report is still written, with output_written = false.
    let report = read_report(&report_path);
    assert_eq!(report["output_written"], false);
    assert_eq!(report["totals"]["nodes_failed"], 1);
}

#[tokio::test]
async fn test_run_failuresWithoutAbortFlag_shouldStillCommit() {
    let dir = tempfile::tempdir().unwrap();
    let input = crate::common::write_test_epub(dir.path(), &[("ch1.xhtml", "<p>Hello</p>")]);
    let output = dir.path().join("out.epub");
    let report_path = dir.path().join("report.json");

    let translator = MockTranslator::failing_transient();
    let controller = Controller::with_config(crate::common::test_config()).unwrap();
    let summary = controller
        .run_with_translator(&translator, &input, &output, &report_path)
        .await
        .unwrap();

    assert!(summary.output_written);
    assert_eq!(summary.exit_code, 0);
    assert_eq!(summary.failures, 1);
    assert!(output.is_file());

    // Failed node keeps its original text in the output.
    let book = epub::load(&output).unwrap();
    let chapter =
        String::from_utf8(book.item("OEBPS/ch1.xhtml").unwrap().to_vec()).unwrap();
    assert!(chapter.contains("<p>Hello</p>"));
}

#[tokio::test]
async fn test_run_retryBound_shouldAppearInReport() {
    let dir = tempfile::tempdir().unwrap();
    let input = crate::common::write_test_epub(dir.path(), &[("ch1.xhtml", "<p>Hello</p>")]);
    let output = dir.path().join("out.epub");
    let report_path = dir.path().join("report.json");

    let mut config = crate::common::test_config();
    config.translation.retries = 2;

    let translator = MockTranslator::failing_transient();
    let controller = Controller::with_config(config).unwrap();
    controller
        .run_with_translator(&translator, &input, &output, &report_path)
        .await
        .unwrap();

    let report = read_report(&report_path);
    let failure = &report["chapters"][0]["failures"][0];
    assert_eq!(failure["error_kind"], "transient");
    assert_eq!(failure["attempts"], 3);
    assert_eq!(translator.call_count(), 3);
}

#[tokio::test]
async fn test_run_noTranslatableNodes_shouldBeIdempotentAndCommit() {
    let dir = tempfile::tempdir().unwrap();
    let input = crate::common::write_test_epub(
        dir.path(),
        &[("ch1.xhtml", "<pre>code only</pre><p>12345</p>")],
    );
    let output = dir.path().join("out.epub");
    let report_path = dir.path().join("report.json");

    let translator = MockTranslator::working();
    let controller = Controller::with_config(crate::common::test_config()).unwrap();
    let summary = controller
        .run_with_translator(&translator, &input, &output, &report_path)
        .await
        .unwrap();

    assert!(summary.output_written);
    assert_eq!(summary.exit_code, 0);
    assert_eq!(translator.call_count(), 0);

    let report = read_report(&report_path);
    assert_eq!(report["totals"]["nodes_changed"], 0);
    assert_eq!(report["totals"]["nodes_failed"], 0);

    let book = epub::load(&output).unwrap();
    let chapter =
        String::from_utf8(book.item("OEBPS/ch1.xhtml").unwrap().to_vec()).unwrap();
    assert!(chapter.contains("<pre>code only</pre>"));
    assert!(chapter.contains("<p>12345</p>"));
}

#[tokio::test]
async fn test_run_protectedContent_shouldSurviveFullRoundTrip() {
    let dir = tempfile::tempdir().unwrap();
    let code_body = "<p>Translate me</p><pre><code>fn main() { let x = 1; }</code></pre>";
    let input = crate::common::write_test_epub(dir.path(), &[("ch1.xhtml", code_body)]);
    let output = dir.path().join("out.epub");
    let report_path = dir.path().join("report.json");

    let translator = MockTranslator::working();
    let controller = Controller::with_config(crate::common::test_config()).unwrap();
    controller
        .run_with_translator(&translator, &input, &output, &report_path)
        .await
        .unwrap();

    let book = epub::load(&output).unwrap();
    let chapter =
        String::from_utf8(book.item("OEBPS/ch1.xhtml").unwrap().to_vec()).unwrap();
    assert!(chapter.contains("<pre><code>fn main() { let x = 1; }</code></pre>"));
    assert!(!chapter.contains("<p>Translate me</p>"));
}

#[tokio::test]
async fn test_run_malformedChapter_shouldFailBeforeAnyTranslation() {
    let dir = tempfile::tempdir().unwrap();
    // Bypass the helper: one chapter is structurally broken.
    let input = {
        use std::io::Write;
        use zip::ZipWriter;
        use zip::write::SimpleFileOptions;

        let path = dir.path().join("broken.epub");
        let file = std::fs::File::create(&path).unwrap();
        let mut zip = ZipWriter::new(file);
        let stored =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        let deflated =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        zip.start_file("mimetype", stored).unwrap();
        zip.write_all(b"application/epub+zip").unwrap();
        zip.start_file("OEBPS/ch1.xhtml", deflated).unwrap();
        zip.write_all(b"<html><body><p>never closed</body></html>")
            .unwrap();
        zip.finish().unwrap();
        path
    };
    let output = dir.path().join("out.epub");
    let report_path = dir.path().join("report.json");

    let translator = MockTranslator::working();
    let controller = Controller::with_config(crate::common::test_config()).unwrap();
    let result = controller
        .run_with_translator(&translator, &input, &output, &report_path)
        .await;

    assert!(result.is_err());
    assert_eq!(translator.call_count(), 0);
    assert!(!output.exists());
}

#[tokio::test]
async fn test_run_reportOrder_shouldFollowSpineRegardlessOfWorkers() {
    let dir = tempfile::tempdir().unwrap();
    let chapters: Vec<(String, String)> = (0..6)
        .map(|i| (format!("ch{}.xhtml", i), format!("<p>Paragraph {}</p>", i)))
        .collect();
    let chapter_refs: Vec<(&str, &str)> = chapters
        .iter()
        .map(|(n, b)| (n.as_str(), b.as_str()))
        .collect();
    let input = crate::common::write_test_epub(dir.path(), &chapter_refs);
    let output = dir.path().join("out.epub");
    let report_path = dir.path().join("report.json");

    let mut config = crate::common::test_config();
    config.translation.workers = 4;

    let translator = MockTranslator::working();
    let controller = Controller::with_config(config).unwrap();
    controller
        .run_with_translator(&translator, &input, &output, &report_path)
        .await
        .unwrap();

    let report = read_report(&report_path);
    let ids: Vec<String> = report["chapters"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["chapter_id"].as_str().unwrap().to_string())
        .collect();
    let expected: Vec<String> = (0..6).map(|i| format!("OEBPS/ch{}.xhtml", i)).collect();
    assert_eq!(ids, expected);
}
